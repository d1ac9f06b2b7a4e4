use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plan_records::{PlanRecordEntity, UpsertPlanRecordEntity};

#[async_trait]
#[automock]
pub trait PlanRecordRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<PlanRecordEntity>>;

    /// Single-statement insert-or-overwrite keyed on the unique user id.
    /// Concurrent upserts for the same user race safely: last write wins.
    async fn upsert(
        &self,
        upsert_plan_record_entity: UpsertPlanRecordEntity,
    ) -> Result<PlanRecordEntity>;
}
