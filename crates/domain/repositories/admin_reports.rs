use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::entities::activity_logs::ActivityLogEntity;

#[async_trait]
#[automock]
pub trait AdminReportRepository {
    async fn count_users(&self) -> Result<i64>;

    async fn count_journals(&self) -> Result<i64>;

    /// Distinct users with at least one activity entry since `since`.
    async fn count_users_active_since(&self, since: DateTime<Utc>) -> Result<i64>;

    async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityLogEntity>>;
}
