use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::activity_logs;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = activity_logs)]
pub struct ActivityLogEntity {
    pub id: Uuid,
    pub user_email: String,
    pub action: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
