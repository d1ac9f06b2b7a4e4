use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use tradebook::domain::{
    clock::Clock,
    repositories::admin_reports::AdminReportRepository,
    value_objects::admin_reports::{ActivityLogEntry, AdminReportDto, AdminReportSnapshot},
};

/// How long one computed report stays valid.
const REPORT_TTL_SECS: i64 = 300;

/// How many recent activity entries a report carries.
const RECENT_ACTIVITY_LIMIT: i64 = 10;

struct CachedReport {
    snapshot: AdminReportSnapshot,
    computed_at: DateTime<Utc>,
}

/// Single-slot, time-boxed cache over the expensive platform aggregates.
/// Constructed once at startup and shared by every admin request. The slot
/// mutex is held across recomputation, so concurrent misses coalesce into one
/// query run; waiters then observe the fresh slot. Writes elsewhere never
/// invalidate the slot — staleness up to the TTL is accepted.
pub struct AdminReportUseCase<R, C>
where
    R: AdminReportRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    repository: Arc<R>,
    clock: Arc<C>,
    ttl: Duration,
    slot: Mutex<Option<CachedReport>>,
}

impl<R, C> AdminReportUseCase<R, C>
where
    R: AdminReportRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            ttl: Duration::seconds(REPORT_TTL_SECS),
            slot: Mutex::new(None),
        }
    }

    pub async fn get_report(&self) -> Result<AdminReportDto> {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(cached) = slot.as_ref() {
            if now - cached.computed_at < self.ttl {
                debug!(
                    computed_at = %cached.computed_at,
                    "admin_reports: serving cached report"
                );
                return Ok(Self::to_dto(&cached.snapshot, cached.computed_at, true));
            }
        }

        info!("admin_reports: cache miss, recomputing aggregates");
        let snapshot = self.compute_snapshot(now).await?;
        let dto = Self::to_dto(&snapshot, now, false);
        *slot = Some(CachedReport {
            snapshot,
            computed_at: now,
        });

        Ok(dto)
    }

    /// Drops the cached slot; the next read recomputes.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
        info!("admin_reports: cache invalidated");
    }

    async fn compute_snapshot(&self, now: DateTime<Utc>) -> Result<AdminReportSnapshot> {
        let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();

        let total_users = self.repository.count_users().await?;
        let total_journals = self.repository.count_journals().await?;
        let active_today = self.repository.count_users_active_since(day_start).await?;
        let logs = self
            .repository
            .recent_activity(RECENT_ACTIVITY_LIMIT)
            .await?
            .into_iter()
            .map(ActivityLogEntry::from)
            .collect();

        Ok(AdminReportSnapshot {
            total_users,
            total_journals,
            active_today,
            logs,
            generated_at: now,
        })
    }

    fn to_dto(
        snapshot: &AdminReportSnapshot,
        computed_at: DateTime<Utc>,
        cached: bool,
    ) -> AdminReportDto {
        AdminReportDto {
            total_users: snapshot.total_users,
            total_journals: snapshot.total_journals,
            active_today: snapshot.active_today,
            logs: snapshot.logs.clone(),
            cached,
            last_updated: computed_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tradebook::domain::{
        entities::activity_logs::ActivityLogEntity,
        repositories::admin_reports::MockAdminReportRepository,
    };
    use uuid::Uuid;

    struct StepClock {
        now: std::sync::Mutex<DateTime<Utc>>,
    }

    impl StepClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: std::sync::Mutex::new(start),
            }
        }

        fn advance(&self, delta: Duration) {
            *self.now.lock().unwrap() += delta;
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_log() -> ActivityLogEntity {
        ActivityLogEntity {
            id: Uuid::new_v4(),
            user_email: "trader@example.com".to_string(),
            action: "EURUSD long".to_string(),
            status: "Success".to_string(),
            created_at: reference(),
        }
    }

    fn repo_expecting(times: usize) -> MockAdminReportRepository {
        let mut repository = MockAdminReportRepository::new();
        repository
            .expect_count_users()
            .times(times)
            .returning(|| Box::pin(async { Ok(42) }));
        repository
            .expect_count_journals()
            .times(times)
            .returning(|| Box::pin(async { Ok(7) }));
        repository
            .expect_count_users_active_since()
            .times(times)
            .returning(|_| Box::pin(async { Ok(3) }));
        repository
            .expect_recent_activity()
            .times(times)
            .returning(|_| {
                let logs = vec![sample_log()];
                Box::pin(async move { Ok(logs) })
            });
        repository
    }

    #[tokio::test]
    async fn second_read_within_ttl_is_served_from_cache() {
        let clock = Arc::new(StepClock::new(reference()));
        let usecase = AdminReportUseCase::new(Arc::new(repo_expecting(1)), Arc::clone(&clock));

        let first = usecase.get_report().await.unwrap();
        clock.advance(Duration::seconds(60));
        let second = usecase.get_report().await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.total_users, second.total_users);
        assert_eq!(first.total_journals, second.total_journals);
        assert_eq!(first.active_today, second.active_today);
        assert_eq!(first.last_updated, second.last_updated);
    }

    #[tokio::test]
    async fn read_after_ttl_expiry_recomputes() {
        let clock = Arc::new(StepClock::new(reference()));
        let usecase = AdminReportUseCase::new(Arc::new(repo_expecting(2)), Arc::clone(&clock));

        let first = usecase.get_report().await.unwrap();
        clock.advance(Duration::seconds(301));
        let second = usecase.get_report().await.unwrap();

        assert!(!first.cached);
        assert!(!second.cached);
        assert_ne!(first.last_updated, second.last_updated);
    }

    #[tokio::test]
    async fn invalidate_forces_recomputation() {
        let clock = Arc::new(StepClock::new(reference()));
        let usecase = AdminReportUseCase::new(Arc::new(repo_expecting(2)), Arc::clone(&clock));

        let first = usecase.get_report().await.unwrap();
        usecase.invalidate().await;
        let second = usecase.get_report().await.unwrap();

        assert!(!first.cached);
        assert!(!second.cached);
    }

    #[tokio::test]
    async fn concurrent_misses_coalesce_into_one_recomputation() {
        let clock = Arc::new(StepClock::new(reference()));
        let usecase = Arc::new(AdminReportUseCase::new(
            Arc::new(repo_expecting(1)),
            Arc::clone(&clock),
        ));

        let (first, second) = tokio::join!(usecase.get_report(), usecase.get_report());
        let (first, second) = (first.unwrap(), second.unwrap());

        // Exactly one of the two paid for the recomputation.
        assert_ne!(first.cached, second.cached);
        assert_eq!(first.total_users, second.total_users);
    }

    #[tokio::test]
    async fn report_carries_recent_activity_entries() {
        let clock = Arc::new(StepClock::new(reference()));
        let usecase = AdminReportUseCase::new(Arc::new(repo_expecting(1)), Arc::clone(&clock));

        let report = usecase.get_report().await.unwrap();

        assert_eq!(report.logs.len(), 1);
        assert_eq!(report.logs[0].user, "trader@example.com");
        assert_eq!(report.logs[0].status, "Success");
    }
}
