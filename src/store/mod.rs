//! Persistence for users, news items and integrations.
//!
//! Services talk to the repository traits below; `Store` bundles one
//! implementation of each. MongoDB is the production backend, the memory
//! backend serves local development (`STORAGE_BACKEND=memory`) and tests.

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    error::Result,
    models::{Integration, NewUser, NewsItem, Provider, User},
};

pub mod memory;
pub mod mongo;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Fails with `Error::Duplicate` when the username is taken.
    async fn insert(&self, new_user: NewUser) -> Result<User>;
    async fn set_password_hash(&self, id: ObjectId, password_hash: &str) -> Result<()>;
    async fn touch_last_login(&self, id: ObjectId, at: i64) -> Result<()>;
}

#[async_trait]
pub trait NewsRepository: Send + Sync {
    async fn exists_by_url(&self, url: &str) -> Result<bool>;
    /// Fails with `Error::Duplicate` when the url is already stored.
    async fn insert(&self, item: &NewsItem) -> Result<()>;
    /// Most recent first.
    async fn latest(&self, limit: usize) -> Result<Vec<NewsItem>>;
}

#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    async fn list_for_user(&self, user_id: ObjectId) -> Result<Vec<Integration>>;
    async fn get_for_user(&self, id: ObjectId, user_id: ObjectId) -> Result<Option<Integration>>;
    async fn find_by_provider(&self, user_id: ObjectId, provider: Provider) -> Result<Option<Integration>>;
    /// Fails with `Error::Duplicate` when the user already has this provider.
    async fn insert(&self, integration: &Integration) -> Result<()>;
    /// Replaces provider/username/key_name/verified/updated_at of an owned record.
    async fn update(&self, integration: &Integration) -> Result<()>;
    async fn set_verified(&self, id: ObjectId, user_id: ObjectId, verified: bool, updated_at: i64) -> Result<()>;
    /// True when a record other than `except_id` files its secret under `key_name`.
    async fn key_in_use(&self, key_name: &str, except_id: ObjectId) -> Result<bool>;
    /// Returns false when nothing owned by `user_id` matched.
    async fn delete_for_user(&self, id: ObjectId, user_id: ObjectId) -> Result<bool>;
}

#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub integrations: Arc<dyn IntegrationRepository>,
    db: Option<mongodb::Database>,
}

impl Store {
    pub fn mongo(db: mongodb::Database) -> Self {
        Self {
            users: Arc::new(mongo::MongoUsers::new(&db)),
            news: Arc::new(mongo::MongoNews::new(&db)),
            integrations: Arc::new(mongo::MongoIntegrations::new(&db)),
            db: Some(db),
        }
    }

    pub fn memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUsers::default()),
            news: Arc::new(memory::MemoryNews::default()),
            integrations: Arc::new(memory::MemoryIntegrations::default()),
            db: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.db.is_some() { "mongo" } else { "memory" }
    }

    pub async fn ping(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.run_command(mongodb::bson::doc! { "ping": 1 }, None).await?;
        }
        Ok(())
    }
}
