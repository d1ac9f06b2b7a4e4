use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::plan_records;

/// One plan row per user. A null `expires_at` on a paid tier means the plan
/// never expires; the read-path guard keeps `FREE` rows at null.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plan_records)]
#[diesel(primary_key(user_id))]
pub struct PlanRecordEntity {
    pub user_id: Uuid,
    pub plan: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = plan_records)]
pub struct UpsertPlanRecordEntity {
    pub user_id: Uuid,
    pub plan: String,
    pub expires_at: Option<DateTime<Utc>>,
}
