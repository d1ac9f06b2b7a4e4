use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use tradebook::{
    domain::{
        clock::Clock,
        entities::plan_records::UpsertPlanRecordEntity,
        repositories::{app_users::UserRepository, plan_records::PlanRecordRepository},
        value_objects::{
            enums::{plan_durations::PlanDuration, plan_tiers::PlanTier},
            plans,
        },
    },
    payments::nowpayments_client::{IpnEvent, NowPaymentsClient},
};

/// Payment statuses that confirm money actually arrived. Everything else is
/// an in-flight notification and must not touch plan state.
const ACCEPTED_STATUSES: [&str; 2] = ["finished", "confirmed"];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_invoice(
        &self,
        amount_minor: i64,
        order_id: &str,
        description: &str,
    ) -> AnyResult<String>;

    fn verify_ipn_signature(&self, payload: &[u8], signature: &str) -> AnyResult<IpnEvent>;
}

#[async_trait]
impl PaymentGateway for NowPaymentsClient {
    async fn create_invoice(
        &self,
        amount_minor: i64,
        order_id: &str,
        description: &str,
    ) -> AnyResult<String> {
        self.create_invoice(amount_minor, order_id, description)
            .await
    }

    fn verify_ipn_signature(&self, payload: &[u8], signature: &str) -> AnyResult<IpnEvent> {
        self.verify_ipn_signature(payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("payment event has no customer email")]
    MissingIdentity,
    #[error("no user matches the payment customer email")]
    UserNotFound,
    #[error("invalid payment payload: {0}")]
    InvalidPayload(String),
    #[error("invalid payment combination: {0}")]
    InvalidCombination(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReconcileError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ReconcileError::MissingIdentity
            | ReconcileError::InvalidPayload(_)
            | ReconcileError::InvalidCombination(_) => StatusCode::BAD_REQUEST,
            // Terminal for the gateway: 4xx is not retried, 5xx would be.
            ReconcileError::UserNotFound => StatusCode::NOT_FOUND,
            ReconcileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

/// What a reconciliation attempt did with the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Plan state was upserted to the given tier and expiry.
    Applied {
        plan: PlanTier,
        expires_at: Option<DateTime<Utc>>,
    },
    /// The event carried a non-final payment status; nothing was mutated.
    Ignored,
}

/// Sole authorized mutator of plan state in response to gateway payment
/// notifications. One atomic upsert per successful reconciliation; repeated
/// delivery of the same confirmed event converges to the same record.
pub struct PaymentUseCase<U, P, G, C>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    C: Clock + 'static,
{
    user_repository: Arc<U>,
    plan_record_repository: Arc<P>,
    gateway: Arc<G>,
    clock: Arc<C>,
}

impl<U, P, G, C> PaymentUseCase<U, P, G, C>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(
        user_repository: Arc<U>,
        plan_record_repository: Arc<P>,
        gateway: Arc<G>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            user_repository,
            plan_record_repository,
            gateway,
            clock,
        }
    }

    /// Verifies and applies one raw IPN delivery.
    pub async fn handle_ipn(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> ReconcileResult<ReconcileOutcome> {
        let event = self
            .gateway
            .verify_ipn_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "payments: IPN signature verification failed");
                ReconcileError::InvalidPayload("signature verification failed".to_string())
            })?;

        self.reconcile(event).await
    }

    /// Applies a validated payment event to plan state.
    pub async fn reconcile(&self, event: IpnEvent) -> ReconcileResult<ReconcileOutcome> {
        let status = event.payment_status.to_lowercase();
        if !ACCEPTED_STATUSES.contains(&status.as_str()) {
            info!(
                payment_status = %status,
                order_id = ?event.order_id,
                "payments: non-final payment status, ignoring event"
            );
            return Ok(ReconcileOutcome::Ignored);
        }

        let email = match event.customer_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => {
                let err = ReconcileError::MissingIdentity;
                warn!(
                    order_id = ?event.order_id,
                    status = err.status_code().as_u16(),
                    "payments: confirmed event without customer email"
                );
                return Err(err);
            }
        };

        // Users are owned by the identity provider; a payment event never
        // creates one.
        let user = self
            .user_repository
            .find_by_email(&email)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "payments: failed to look up user by email");
                ReconcileError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = ReconcileError::UserNotFound;
                warn!(
                    customer_email = %email,
                    order_id = ?event.order_id,
                    status = err.status_code().as_u16(),
                    "payments: no user for confirmed payment, dropping event"
                );
                err
            })?;

        let amount_minor = event
            .price_amount
            .as_ref()
            .and_then(|amount| amount.as_minor())
            .ok_or_else(|| {
                let err = ReconcileError::InvalidPayload("unparsable price_amount".to_string());
                warn!(
                    user_id = %user.id,
                    order_id = ?event.order_id,
                    status = err.status_code().as_u16(),
                    "payments: confirmed event with unparsable amount"
                );
                err
            })?;

        let (tier, duration) = plans::resolve_amount_minor(amount_minor);
        if !tier.is_paid() {
            warn!(
                user_id = %user.id,
                amount_minor,
                "payments: unrecognized amount grants no entitlement"
            );
        }

        let expires_at = plans::plan_expiry(self.clock.now(), tier, duration)?;

        self.plan_record_repository
            .upsert(UpsertPlanRecordEntity {
                user_id: user.id,
                plan: tier.to_string(),
                expires_at,
            })
            .await
            .map_err(|err| {
                error!(
                    user_id = %user.id,
                    db_error = ?err,
                    "payments: failed to upsert plan record"
                );
                ReconcileError::Internal(err)
            })?;

        info!(
            user_id = %user.id,
            tier = %tier,
            duration = %duration,
            expires_at = ?expires_at,
            "payments: reconciled confirmed payment"
        );

        Ok(ReconcileOutcome::Applied {
            plan: tier,
            expires_at,
        })
    }

    /// Creates a hosted checkout invoice at the gateway. Grants nothing by
    /// itself: entitlement only changes when the confirmation comes back
    /// through `reconcile`.
    pub async fn create_checkout_invoice(
        &self,
        user_id: Uuid,
        plan: &str,
        duration: Option<&str>,
    ) -> ReconcileResult<String> {
        let tier = PlanTier::from_str(plan).ok_or_else(|| {
            let err = ReconcileError::InvalidCombination(format!("unknown plan tier: {plan}"));
            warn!(
                %user_id,
                plan,
                status = err.status_code().as_u16(),
                "payments: checkout requested with unknown tier"
            );
            err
        })?;
        let duration = duration.map(PlanDuration::from_str).unwrap_or_default();

        let amount_minor = plans::amount_minor_for(tier, duration).ok_or_else(|| {
            let err = ReconcileError::InvalidCombination(
                "free plan does not require checkout".to_string(),
            );
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "payments: free plan checkout attempted"
            );
            err
        })?;

        let order_id = format!("{user_id}:{tier}:{duration}");
        let description = format!("{tier} plan ({duration})");

        info!(
            %user_id,
            tier = %tier,
            duration = %duration,
            amount_minor,
            "payments: creating checkout invoice"
        );

        let invoice_url = self
            .gateway
            .create_invoice(amount_minor, &order_id, &description)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    error = ?err,
                    "payments: gateway invoice creation failed"
                );
                ReconcileError::Internal(err)
            })?;

        Ok(invoice_url)
    }
}
