use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::{
    error::{Error, Result},
    models::{Integration, NewUser, NewsItem, Provider, User},
};

use super::{IntegrationRepository, NewsRepository, UserRepository};

#[derive(Default)]
pub struct MemoryUsers {
    rows: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        Ok(self.rows.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| u.username == new_user.username) {
            return Err(Error::Duplicate("user".into()));
        }

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
        rows.push(user.clone());
        Ok(user)
    }

    async fn set_password_hash(&self, id: ObjectId, password_hash: &str) -> Result<()> {
        let mut rows = self.rows.write().await;
        let user = rows.iter_mut().find(|u| u.id == id).ok_or(Error::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn touch_last_login(&self, id: ObjectId, at: i64) -> Result<()> {
        let mut rows = self.rows.write().await;
        if let Some(user) = rows.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNews {
    rows: RwLock<Vec<NewsItem>>,
}

#[async_trait]
impl NewsRepository for MemoryNews {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        Ok(self.rows.read().await.iter().any(|n| n.url == url))
    }

    async fn insert(&self, item: &NewsItem) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|n| n.url == item.url) {
            return Err(Error::Duplicate("news item".into()));
        }
        rows.push(item.clone());
        Ok(())
    }

    async fn latest(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let mut items = self.rows.read().await.clone();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(limit);
        Ok(items)
    }
}

#[derive(Default)]
pub struct MemoryIntegrations {
    rows: RwLock<Vec<Integration>>,
}

#[async_trait]
impl IntegrationRepository for MemoryIntegrations {
    async fn list_for_user(&self, user_id: ObjectId) -> Result<Vec<Integration>> {
        let mut items: Vec<_> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.provider.as_str());
        Ok(items)
    }

    async fn get_for_user(&self, id: ObjectId, user_id: ObjectId) -> Result<Option<Integration>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|i| i.id == id && i.user_id == user_id)
            .cloned())
    }

    async fn find_by_provider(&self, user_id: ObjectId, provider: Provider) -> Result<Option<Integration>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|i| i.user_id == user_id && i.provider == provider)
            .cloned())
    }

    async fn insert(&self, integration: &Integration) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|i| i.user_id == integration.user_id && i.provider == integration.provider)
        {
            return Err(Error::Duplicate("integration".into()));
        }
        rows.push(integration.clone());
        Ok(())
    }

    async fn update(&self, integration: &Integration) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|i| {
            i.id != integration.id
                && i.user_id == integration.user_id
                && i.provider == integration.provider
        }) {
            return Err(Error::Duplicate("integration".into()));
        }

        let row = rows
            .iter_mut()
            .find(|i| i.id == integration.id && i.user_id == integration.user_id)
            .ok_or(Error::NotFound)?;
        *row = integration.clone();
        Ok(())
    }

    async fn set_verified(&self, id: ObjectId, user_id: ObjectId, verified: bool, updated_at: i64) -> Result<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|i| i.id == id && i.user_id == user_id) {
            row.verified = verified;
            row.updated_at = updated_at;
        }
        Ok(())
    }

    async fn key_in_use(&self, key_name: &str, except_id: ObjectId) -> Result<bool> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .any(|i| i.id != except_id && i.key_name == key_name))
    }

    async fn delete_for_user(&self, id: ObjectId, user_id: ObjectId) -> Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|i| !(i.id == id && i.user_id == user_id));
        Ok(rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_integration_for_same_provider_is_rejected() {
        let repo = MemoryIntegrations::default();
        let owner = ObjectId::new();

        let first = Integration::new(owner, Provider::Webull, "alice", 1);
        repo.insert(&first).await.unwrap();

        let second = Integration::new(owner, Provider::Webull, "alice-2", 2);
        let err = repo.insert(&second).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate(_)));

        // another user may link the same provider
        let other = Integration::new(ObjectId::new(), Provider::Webull, "alice", 3);
        repo.insert(&other).await.unwrap();

        assert_eq!(repo.list_for_user(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_cannot_move_onto_an_existing_provider() {
        let repo = MemoryIntegrations::default();
        let owner = ObjectId::new();

        let webull = Integration::new(owner, Provider::Webull, "a", 1);
        let mut fidelity = Integration::new(owner, Provider::Fidelity, "b", 1);
        repo.insert(&webull).await.unwrap();
        repo.insert(&fidelity).await.unwrap();

        fidelity.provider = Provider::Webull;
        let err = repo.update(&fidelity).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate(_)));
    }

    #[tokio::test]
    async fn records_are_scoped_to_their_owner() {
        let repo = MemoryIntegrations::default();
        let owner = ObjectId::new();
        let stranger = ObjectId::new();

        let inst = Integration::new(owner, Provider::Robinhood, "carol", 1);
        repo.insert(&inst).await.unwrap();

        assert!(repo.get_for_user(inst.id, stranger).await.unwrap().is_none());
        assert!(!repo.delete_for_user(inst.id, stranger).await.unwrap());
        assert!(repo.delete_for_user(inst.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn key_in_use_ignores_the_leaving_record() {
        let repo = MemoryIntegrations::default();
        let mine = Integration::new(ObjectId::new(), Provider::Webull, "shared", 1);
        repo.insert(&mine).await.unwrap();

        assert!(!repo.key_in_use("webull:shared", mine.id).await.unwrap());

        let theirs = Integration::new(ObjectId::new(), Provider::Webull, "shared", 1);
        repo.insert(&theirs).await.unwrap();
        assert!(repo.key_in_use("webull:shared", mine.id).await.unwrap());
    }

    #[tokio::test]
    async fn news_latest_is_newest_first() {
        let repo = MemoryNews::default();
        for (i, ts) in [30, 10, 20].into_iter().enumerate() {
            let item = NewsItem::new(&format!("h{i}"), &format!("https://n.example/{i}"), ts, "n.example");
            repo.insert(&item).await.unwrap();
        }

        let latest = repo.latest(2).await.unwrap();
        let stamps: Vec<_> = latest.iter().map(|n| n.timestamp).collect();
        assert_eq!(stamps, vec![30, 20]);
    }
}
