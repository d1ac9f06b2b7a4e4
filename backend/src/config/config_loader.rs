use anyhow::{Ok, Result};

use super::config_model::{BackendServer, Database, DotEnvyConfig, NowPayments, Supabase};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let supabase = Supabase {
        jwt_secret: std::env::var("SUPABASE_JWT_SECRET").expect("SUPABASE_JWT_SECRET is invalid"),
    };

    let nowpayments = NowPayments {
        api_base_url: std::env::var("NOWPAYMENTS_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.nowpayments.io".to_string()),
        api_key: std::env::var("NOWPAYMENTS_API_KEY").expect("NOWPAYMENTS_API_KEY is invalid"),
        ipn_secret: std::env::var("NOWPAYMENTS_IPN_SECRET")
            .expect("NOWPAYMENTS_IPN_SECRET is invalid"),
        success_url: std::env::var("CHECKOUT_SUCCESS_URL")
            .expect("CHECKOUT_SUCCESS_URL is invalid"),
        cancel_url: std::env::var("CHECKOUT_CANCEL_URL").expect("CHECKOUT_CANCEL_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        nowpayments,
    })
}
