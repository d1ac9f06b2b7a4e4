use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::activity_logs::ActivityLogEntity;

/// Aggregates produced by one admin-report recomputation. Cached as a whole;
/// the `cached` flag is attached per response, not stored here.
#[derive(Debug, Clone)]
pub struct AdminReportSnapshot {
    pub total_users: i64,
    pub total_journals: i64,
    pub active_today: i64,
    pub logs: Vec<ActivityLogEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLogEntry {
    pub time: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub status: String,
}

impl From<ActivityLogEntity> for ActivityLogEntry {
    fn from(value: ActivityLogEntity) -> Self {
        Self {
            time: value.created_at,
            user: value.user_email,
            action: value.action,
            status: value.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReportDto {
    pub total_users: i64,
    pub total_journals: i64,
    pub active_today: i64,
    pub logs: Vec<ActivityLogEntry>,
    pub cached: bool,
    pub last_updated: String,
}
