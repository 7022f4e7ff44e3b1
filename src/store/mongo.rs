use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    error::{ErrorKind, WriteFailure},
    options::FindOptions,
    Collection, Database,
};

use crate::{
    error::{Error, Result},
    models::{Integration, NewUser, NewsItem, Provider, User},
};

use super::{IntegrationRepository, NewsRepository, UserRepository};

pub const USERS: &str = "users";
pub const NEWS_ITEMS: &str = "news_items";
pub const INTEGRATIONS: &str = "integrations";

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        _ => err.to_string().contains("E11000"),
    }
}

fn map_write_err(err: mongodb::error::Error, what: &str) -> Error {
    if is_duplicate_key(&err) {
        Error::Duplicate(what.to_string())
    } else {
        Error::Database(err)
    }
}

pub struct MongoUsers {
    col: Collection<User>,
}

impl MongoUsers {
    pub fn new(db: &Database) -> Self {
        Self { col: db.collection::<User>(USERS) }
    }
}

#[async_trait]
impl UserRepository for MongoUsers {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        Ok(self.col.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.col.find_one(doc! { "username": username }, None).await?)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: ObjectId::new(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_premium: false,
            is_active: true,
            date_joined: chrono::Utc::now().timestamp(),
            last_login: None,
        };

        self.col
            .insert_one(&user, None)
            .await
            .map_err(|e| map_write_err(e, "user"))?;

        Ok(user)
    }

    async fn set_password_hash(&self, id: ObjectId, password_hash: &str) -> Result<()> {
        self.col
            .update_one(doc! { "_id": id }, doc! { "$set": { "password_hash": password_hash } }, None)
            .await?;
        Ok(())
    }

    async fn touch_last_login(&self, id: ObjectId, at: i64) -> Result<()> {
        self.col
            .update_one(doc! { "_id": id }, doc! { "$set": { "last_login": at } }, None)
            .await?;
        Ok(())
    }
}

pub struct MongoNews {
    col: Collection<NewsItem>,
}

impl MongoNews {
    pub fn new(db: &Database) -> Self {
        Self { col: db.collection::<NewsItem>(NEWS_ITEMS) }
    }
}

#[async_trait]
impl NewsRepository for MongoNews {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let n = self.col.count_documents(doc! { "url": url }, None).await?;
        Ok(n > 0)
    }

    async fn insert(&self, item: &NewsItem) -> Result<()> {
        self.col
            .insert_one(item, None)
            .await
            .map_err(|e| map_write_err(e, "news item"))?;
        Ok(())
    }

    async fn latest(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let opts = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .limit(limit as i64)
            .build();

        let cursor = self.col.find(doc! {}, opts).await?;
        Ok(cursor.try_collect().await?)
    }
}

pub struct MongoIntegrations {
    col: Collection<Integration>,
}

impl MongoIntegrations {
    pub fn new(db: &Database) -> Self {
        Self { col: db.collection::<Integration>(INTEGRATIONS) }
    }
}

#[async_trait]
impl IntegrationRepository for MongoIntegrations {
    async fn list_for_user(&self, user_id: ObjectId) -> Result<Vec<Integration>> {
        let opts = FindOptions::builder().sort(doc! { "provider": 1 }).build();
        let cursor = self.col.find(doc! { "user_id": user_id }, opts).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_for_user(&self, id: ObjectId, user_id: ObjectId) -> Result<Option<Integration>> {
        Ok(self
            .col
            .find_one(doc! { "_id": id, "user_id": user_id }, None)
            .await?)
    }

    async fn find_by_provider(&self, user_id: ObjectId, provider: Provider) -> Result<Option<Integration>> {
        Ok(self
            .col
            .find_one(doc! { "user_id": user_id, "provider": provider.as_str() }, None)
            .await?)
    }

    async fn insert(&self, integration: &Integration) -> Result<()> {
        self.col
            .insert_one(integration, None)
            .await
            .map_err(|e| map_write_err(e, "integration"))?;
        Ok(())
    }

    async fn update(&self, integration: &Integration) -> Result<()> {
        let res = self
            .col
            .update_one(
                doc! { "_id": integration.id, "user_id": integration.user_id },
                doc! {
                    "$set": {
                        "provider": integration.provider.as_str(),
                        "username": &integration.username,
                        "key_name": &integration.key_name,
                        "verified": integration.verified,
                        "updated_at": integration.updated_at,
                    }
                },
                None,
            )
            .await
            .map_err(|e| map_write_err(e, "integration"))?;

        if res.matched_count == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn set_verified(&self, id: ObjectId, user_id: ObjectId, verified: bool, updated_at: i64) -> Result<()> {
        self.col
            .update_one(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": { "verified": verified, "updated_at": updated_at } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn key_in_use(&self, key_name: &str, except_id: ObjectId) -> Result<bool> {
        let n = self
            .col
            .count_documents(doc! { "key_name": key_name, "_id": { "$ne": except_id } }, None)
            .await?;
        Ok(n > 0)
    }

    async fn delete_for_user(&self, id: ObjectId, user_id: ObjectId) -> Result<bool> {
        let res = self
            .col
            .delete_one(doc! { "_id": id, "user_id": user_id }, None)
            .await?;
        Ok(res.deleted_count > 0)
    }
}
