use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use tradebook::domain::{
    clock::Clock,
    entities::{app_users::InsertAppUserEntity, plan_records::UpsertPlanRecordEntity},
    repositories::{app_users::UserRepository, plan_records::PlanRecordRepository},
    value_objects::{
        enums::{plan_durations::PlanDuration, plan_tiers::PlanTier},
        plans::{self, EffectivePlanDto},
    },
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unknown plan tier: {0}")]
    InvalidPlan(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlanError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PlanError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
            PlanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// Serves every read of a user's plan plus the redirect-confirm upgrade path.
/// Reads observe expiration before returning: an expired paid plan is
/// downgraded to the free tier and persisted before any caller sees it.
pub struct PlanUseCase<U, P, C>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    user_repository: Arc<U>,
    plan_record_repository: Arc<P>,
    clock: Arc<C>,
}

impl<U, P, C> PlanUseCase<U, P, C>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRecordRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(user_repository: Arc<U>, plan_record_repository: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            user_repository,
            plan_record_repository,
            clock,
        }
    }

    pub async fn get_effective_plan(
        &self,
        user_id: Uuid,
        email: Option<String>,
    ) -> PlanResult<EffectivePlanDto> {
        self.ensure_user(user_id, email).await?;

        let record = self
            .plan_record_repository
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "plans: failed to load plan record");
                PlanError::Internal(err)
            })?;

        let record = match record {
            Some(record) => record,
            None => {
                info!(%user_id, "plans: no plan record, creating free default");
                return self.apply_free(user_id).await;
            }
        };

        // A null expiry on a paid tier means "never expires" and is left alone.
        if let Some(expires_at) = record.expires_at {
            if expires_at < self.clock.now() {
                info!(
                    %user_id,
                    plan = %record.plan,
                    %expires_at,
                    "plans: plan expired, downgrading to free"
                );
                return self.apply_free(user_id).await;
            }
        }

        Ok(EffectivePlanDto::from(record))
    }

    /// User-initiated plan change. Trusts the caller's tier selection: this
    /// is the "confirm what was already paid for via redirect" path, not
    /// payment authorization.
    pub async fn upgrade_plan(
        &self,
        user_id: Uuid,
        email: Option<String>,
        plan: &str,
        duration: Option<&str>,
    ) -> PlanResult<EffectivePlanDto> {
        let tier = PlanTier::from_str(plan).ok_or_else(|| {
            let err = PlanError::InvalidPlan(plan.to_string());
            warn!(
                %user_id,
                plan,
                status = err.status_code().as_u16(),
                "plans: upgrade requested with unknown tier"
            );
            err
        })?;
        let duration = duration.map(PlanDuration::from_str).unwrap_or_default();

        self.ensure_user(user_id, email).await?;

        let expires_at =
            plans::plan_expiry(self.clock.now(), tier, duration).map_err(PlanError::Internal)?;

        info!(
            %user_id,
            tier = %tier,
            duration = %duration,
            expires_at = ?expires_at,
            "plans: applying user-initiated plan change"
        );

        let record = self
            .plan_record_repository
            .upsert(UpsertPlanRecordEntity {
                user_id,
                plan: tier.to_string(),
                expires_at,
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "plans: failed to upsert plan record");
                PlanError::Internal(err)
            })?;

        Ok(EffectivePlanDto::from(record))
    }

    async fn ensure_user(&self, user_id: Uuid, email: Option<String>) -> PlanResult<()> {
        self.user_repository
            .ensure_user(InsertAppUserEntity { id: user_id, email })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "plans: failed to ensure user record");
                PlanError::Internal(err)
            })
    }

    async fn apply_free(&self, user_id: Uuid) -> PlanResult<EffectivePlanDto> {
        let record = self
            .plan_record_repository
            .upsert(UpsertPlanRecordEntity {
                user_id,
                plan: PlanTier::Free.to_string(),
                expires_at: None,
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "plans: failed to persist free plan");
                PlanError::Internal(err)
            })?;

        Ok(EffectivePlanDto::from(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tradebook::domain::{
        entities::plan_records::PlanRecordEntity,
        repositories::{app_users::MockUserRepository, plan_records::MockPlanRecordRepository},
    };

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(user_id: Uuid, plan: &str, expires_at: Option<DateTime<Utc>>) -> PlanRecordEntity {
        PlanRecordEntity {
            user_id,
            plan: plan.to_string(),
            expires_at,
            updated_at: reference(),
        }
    }

    fn accepting_user_repo() -> MockUserRepository {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_ensure_user()
            .returning(|_| Box::pin(async { Ok(()) }));
        user_repo
    }

    fn usecase(
        user_repo: MockUserRepository,
        plan_repo: MockPlanRecordRepository,
    ) -> PlanUseCase<MockUserRepository, MockPlanRecordRepository, FixedClock> {
        PlanUseCase::new(
            Arc::new(user_repo),
            Arc::new(plan_repo),
            Arc::new(FixedClock(reference())),
        )
    }

    #[tokio::test]
    async fn expired_paid_plan_is_downgraded_on_read() {
        let user_id = Uuid::new_v4();
        let expired_at = reference() - Duration::seconds(1);

        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo
            .expect_find_by_user_id()
            .returning(move |user_id| {
                let stored = record(user_id, "PRO", Some(expired_at));
                Box::pin(async move { Ok(Some(stored)) })
            });
        plan_repo
            .expect_upsert()
            .withf(|entity| entity.plan == "FREE" && entity.expires_at.is_none())
            .times(1)
            .returning(|entity| {
                let stored = record(entity.user_id, "FREE", None);
                Box::pin(async move { Ok(stored) })
            });

        let plan = usecase(accepting_user_repo(), plan_repo)
            .get_effective_plan(user_id, None)
            .await
            .unwrap();

        assert_eq!(plan.plan, PlanTier::Free);
        assert_eq!(plan.expires_at, None);
    }

    #[tokio::test]
    async fn active_paid_plan_is_returned_without_a_write() {
        let user_id = Uuid::new_v4();
        let expires_at = reference() + Duration::hours(1);

        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo
            .expect_find_by_user_id()
            .returning(move |user_id| {
                let stored = record(user_id, "NORMAL", Some(expires_at));
                Box::pin(async move { Ok(Some(stored)) })
            });
        plan_repo.expect_upsert().times(0);

        let plan = usecase(accepting_user_repo(), plan_repo)
            .get_effective_plan(user_id, None)
            .await
            .unwrap();

        assert_eq!(plan.plan, PlanTier::Normal);
        assert_eq!(plan.expires_at, Some(expires_at));
    }

    #[tokio::test]
    async fn paid_plan_without_expiry_never_expires() {
        let user_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo
            .expect_find_by_user_id()
            .returning(move |user_id| {
                let stored = record(user_id, "PRO", None);
                Box::pin(async move { Ok(Some(stored)) })
            });
        plan_repo.expect_upsert().times(0);

        let plan = usecase(accepting_user_repo(), plan_repo)
            .get_effective_plan(user_id, None)
            .await
            .unwrap();

        assert_eq!(plan.plan, PlanTier::Pro);
        assert_eq!(plan.expires_at, None);
    }

    #[tokio::test]
    async fn missing_record_creates_free_default() {
        let user_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        plan_repo
            .expect_upsert()
            .withf(|entity| entity.plan == "FREE" && entity.expires_at.is_none())
            .times(1)
            .returning(|entity| {
                let stored = record(entity.user_id, "FREE", None);
                Box::pin(async move { Ok(stored) })
            });

        let plan = usecase(accepting_user_repo(), plan_repo)
            .get_effective_plan(user_id, None)
            .await
            .unwrap();

        assert_eq!(plan.plan, PlanTier::Free);
    }

    #[tokio::test]
    async fn upgrade_with_unknown_tier_mutates_nothing() {
        let user_id = Uuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_ensure_user().times(0);
        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo.expect_upsert().times(0);

        let result = usecase(user_repo, plan_repo)
            .upgrade_plan(user_id, None, "PLATINUM", None)
            .await;

        assert!(matches!(result, Err(PlanError::InvalidPlan(_))));
    }

    #[tokio::test]
    async fn free_upgrade_forces_null_expiry_regardless_of_duration() {
        let user_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo
            .expect_upsert()
            .withf(|entity| entity.plan == "FREE" && entity.expires_at.is_none())
            .times(1)
            .returning(|entity| {
                let stored = record(entity.user_id, "FREE", None);
                Box::pin(async move { Ok(stored) })
            });

        let plan = usecase(accepting_user_repo(), plan_repo)
            .upgrade_plan(user_id, None, "FREE", Some("year"))
            .await
            .unwrap();

        assert_eq!(plan.plan, PlanTier::Free);
        assert_eq!(plan.expires_at, None);
    }

    #[tokio::test]
    async fn normal_month_upgrade_expires_three_months_out() {
        let user_id = Uuid::new_v4();
        let expected = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();

        let mut plan_repo = MockPlanRecordRepository::new();
        plan_repo
            .expect_upsert()
            .withf(move |entity| {
                entity.plan == "NORMAL" && entity.expires_at == Some(expected)
            })
            .times(1)
            .returning(move |entity| {
                let stored = record(entity.user_id, "NORMAL", entity.expires_at);
                Box::pin(async move { Ok(stored) })
            });

        let plan = usecase(accepting_user_repo(), plan_repo)
            .upgrade_plan(user_id, Some("trader@example.com".to_string()), "NORMAL", None)
            .await
            .unwrap();

        assert_eq!(plan.plan, PlanTier::Normal);
        assert_eq!(plan.expires_at, Some(expected));
    }
}
