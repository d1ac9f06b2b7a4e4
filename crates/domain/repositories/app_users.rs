use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::app_users::{AppUserEntity, InsertAppUserEntity};

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AppUserEntity>>;

    /// Create-if-absent keyed on the identity-provider id; an existing row is
    /// left untouched.
    async fn ensure_user(&self, insert_app_user_entity: InsertAppUserEntity) -> Result<()>;
}
