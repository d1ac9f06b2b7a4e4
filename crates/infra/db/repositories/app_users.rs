use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::app_users::{AppUserEntity, InsertAppUserEntity},
        repositories::app_users::UserRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::app_users},
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_by_email(&self, email: &str) -> Result<Option<AppUserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = app_users::table
            .filter(app_users::email.eq(email))
            .select(AppUserEntity::as_select())
            .first::<AppUserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn ensure_user(&self, insert_app_user_entity: InsertAppUserEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(app_users::table)
            .values(&insert_app_user_entity)
            .on_conflict(app_users::id)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }
}
