use anyhow::{Context, Result, anyhow, bail};
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tracing::error;

type HmacSha512 = Hmac<Sha512>;

/// Minimal NOWPayments client built on reqwest.
pub struct NowPaymentsClient {
    http: reqwest::Client,
    api_base_url: String,
    api_key: String,
    ipn_secret: String,
    success_url: String,
    cancel_url: String,
}

/// Inbound instant-payment-notification payload. Transient: validated, then
/// either applied to plan state or discarded — never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct IpnEvent {
    pub payment_status: String,
    pub price_amount: Option<IpnAmount>,
    pub customer_email: Option<String>,
    pub order_id: Option<String>,
}

/// The gateway sends amounts as either a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IpnAmount {
    Number(f64),
    Text(String),
}

impl IpnAmount {
    /// Normalizes the amount to minor units (cents).
    pub fn as_minor(&self) -> Option<i64> {
        let value = match self {
            IpnAmount::Number(value) => *value,
            IpnAmount::Text(value) => value.trim().parse::<f64>().ok()?,
        };

        if !value.is_finite() || value < 0.0 {
            return None;
        }

        Some((value * 100.0).round() as i64)
    }
}

#[derive(Debug, Serialize)]
struct CreateInvoiceBody<'a> {
    price_amount: f64,
    price_currency: &'a str,
    order_id: &'a str,
    order_description: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateInvoiceResponse {
    invoice_url: String,
}

impl NowPaymentsClient {
    pub fn new(
        api_base_url: String,
        api_key: String,
        ipn_secret: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url,
            api_key,
            ipn_secret,
            success_url,
            cancel_url,
        }
    }

    /// Creates a hosted invoice and returns its checkout URL.
    pub async fn create_invoice(
        &self,
        amount_minor: i64,
        order_id: &str,
        description: &str,
    ) -> Result<String> {
        let body = CreateInvoiceBody {
            price_amount: amount_minor as f64 / 100.0,
            price_currency: "usd",
            order_id,
            order_description: description,
            success_url: &self.success_url,
            cancel_url: &self.cancel_url,
        };

        let resp = self
            .http
            .post(format!(
                "{}/v1/invoice",
                self.api_base_url.trim_end_matches('/')
            ))
            .header("x-api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create_invoice").await?;

        let invoice: CreateInvoiceResponse = resp
            .json()
            .await
            .context("invalid invoice creation response")?;

        Ok(invoice.invoice_url)
    }

    /// Checks the IPN HMAC-SHA512 signature and parses the event. The gateway
    /// signs the JSON document with its keys sorted; re-serializing through
    /// serde_json's ordered maps reproduces that canonical form.
    pub fn verify_ipn_signature(&self, payload: &[u8], signature: &str) -> Result<IpnEvent> {
        let value: serde_json::Value =
            serde_json::from_slice(payload).context("IPN payload is not valid JSON")?;
        let canonical = serde_json::to_vec(&value)?;

        let mut mac = HmacSha512::new_from_slice(self.ipn_secret.as_bytes())
            .map_err(|_| anyhow!("invalid IPN secret"))?;
        mac.update(&canonical);

        let expected = hex::decode(signature).context("IPN signature is not valid hex")?;
        mac.verify_slice(&expected)
            .map_err(|_| anyhow!("IPN signature mismatch"))?;

        let event: IpnEvent =
            serde_json::from_value(value).context("IPN payload shape is invalid")?;

        Ok(event)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            body = %body,
            "nowpayments {context} request failed"
        );

        bail!("NOWPayments {context} request failed with status {status}")
    }
}
