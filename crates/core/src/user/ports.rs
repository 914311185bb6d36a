//! Port interfaces for user persistence

use async_trait::async_trait;
use kimai_domain::query::Visibility;
use kimai_domain::{Result, User};

/// Trait for user persistence and retrieval
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// `Visible` lists enabled users, `Hidden` disabled ones.
    async fn list(&self, visibility: Visibility) -> Result<Vec<User>>;

    /// Insert a user; the returned copy carries the new id.
    async fn create(&self, user: User) -> Result<User>;

    async fn update(&self, user: &User) -> Result<()>;
}
