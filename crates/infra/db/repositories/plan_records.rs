use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, upsert::excluded};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::plan_records::{PlanRecordEntity, UpsertPlanRecordEntity},
        repositories::plan_records::PlanRecordRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::plan_records},
};

pub struct PlanRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRecordRepository for PlanRecordPostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<PlanRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = plan_records::table
            .find(user_id)
            .select(PlanRecordEntity::as_select())
            .first::<PlanRecordEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert(
        &self,
        upsert_plan_record_entity: UpsertPlanRecordEntity,
    ) -> Result<PlanRecordEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // One atomic statement; the unique user_id key is the only
        // concurrency-control primitive the plan store relies on.
        let result = insert_into(plan_records::table)
            .values(&upsert_plan_record_entity)
            .on_conflict(plan_records::user_id)
            .do_update()
            .set((
                plan_records::plan.eq(excluded(plan_records::plan)),
                plan_records::expires_at.eq(excluded(plan_records::expires_at)),
                plan_records::updated_at.eq(Utc::now()),
            ))
            .returning(PlanRecordEntity::as_returning())
            .get_result::<PlanRecordEntity>(&mut conn)?;

        Ok(result)
    }
}
