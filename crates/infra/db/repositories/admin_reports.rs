use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, dsl::count_distinct, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::activity_logs::ActivityLogEntity,
        repositories::admin_reports::AdminReportRepository,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{activity_logs, app_users, journals},
    },
};

pub struct AdminReportPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AdminReportPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AdminReportRepository for AdminReportPostgres {
    async fn count_users(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = app_users::table.count().get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn count_journals(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = journals::table.count().get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn count_users_active_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = activity_logs::table
            .filter(activity_logs::created_at.ge(since))
            .select(count_distinct(activity_logs::user_email))
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityLogEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = activity_logs::table
            .order(activity_logs::created_at.desc())
            .limit(limit)
            .select(ActivityLogEntity::as_select())
            .load::<ActivityLogEntity>(&mut conn)?;

        Ok(results)
    }
}
