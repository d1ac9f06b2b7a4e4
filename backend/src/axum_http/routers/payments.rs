use crate::{
    axum_http::auth::AuthUser,
    config::config_model::DotEnvyConfig,
    usecases::payments::{PaymentGateway, PaymentUseCase, ReconcileOutcome},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tradebook::{
    domain::{
        clock::{Clock, SystemClock},
        repositories::{app_users::UserRepository, plan_records::PlanRecordRepository},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{app_users::UserPostgres, plan_records::PlanRecordPostgres},
    },
    payments::nowpayments_client::NowPaymentsClient,
};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    plan: String,
    duration: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub invoice_url: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: &DotEnvyConfig) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let plan_record_repository = PlanRecordPostgres::new(Arc::clone(&db_pool));
    let gateway = NowPaymentsClient::new(
        config.nowpayments.api_base_url.clone(),
        config.nowpayments.api_key.clone(),
        config.nowpayments.ipn_secret.clone(),
        config.nowpayments.success_url.clone(),
        config.nowpayments.cancel_url.clone(),
    );
    let usecase = PaymentUseCase::new(
        Arc::new(user_repository),
        Arc::new(plan_record_repository),
        Arc::new(gateway),
        Arc::new(SystemClock),
    );

    Router::new()
        .route(
            "/ipn",
            post(handle_ipn::<UserPostgres, PlanRecordPostgres, NowPaymentsClient, SystemClock>),
        )
        .route(
            "/checkout",
            post(
                create_checkout::<UserPostgres, PlanRecordPostgres, NowPaymentsClient, SystemClock>,
            ),
        )
        .with_state(Arc::new(usecase))
}

pub async fn handle_ipn<U, P, G, C>(
    State(usecase): State<Arc<PaymentUseCase<U, P, G, C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    C: Clock + 'static,
{
    let signature = match headers
        .get("x-nowpayments-sig")
        .and_then(|value| value.to_str().ok())
    {
        Some(signature) => signature,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                "Missing IPN signature header".to_string(),
            )
                .into_response();
        }
    };

    match usecase.handle_ipn(&body, signature).await {
        Ok(ReconcileOutcome::Applied { .. }) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "applied" })),
        )
            .into_response(),
        Ok(ReconcileOutcome::Ignored) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ignored" })),
        )
            .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = %err, "payments: IPN reconciliation failed");
            }
            (status, err.to_string()).into_response()
        }
    }
}

pub async fn create_checkout<U, P, G, C>(
    State(usecase): State<Arc<PaymentUseCase<U, P, G, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    C: Clock + 'static,
{
    match usecase
        .create_checkout_invoice(user_id, &request.plan, request.duration.as_deref())
        .await
    {
        Ok(invoice_url) => (StatusCode::OK, Json(CheckoutResponse { invoice_url })).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = %err, %user_id, "payments: checkout invoice creation failed");
            }
            (status, err.to_string()).into_response()
        }
    }
}
