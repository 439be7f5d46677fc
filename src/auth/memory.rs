use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::password::hash_password;
use super::repo::UserStore;
use super::repo_types::{NewUser, Role, User};

/// In-process store for tests. Counts lookups so tests can assert none happened.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
    lookups: AtomicUsize,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Inserts a user with a freshly hashed password and returns it.
    pub async fn seed(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: hash_password(password).expect("hash seed password"),
            role,
            is_active: true,
            last_login_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.write().await.push(user.clone());
        user
    }

    pub async fn remove(&self, id: Uuid) {
        self.users.write().await.retain(|u| u.id != id);
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id).await)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            last_login_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        if let Some(u) = self.users.write().await.iter_mut().find(|u| u.id == id) {
            u.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        if let Some(u) = self.users.write().await.iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.is_active = is_active;
            u.clone()
        }))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }
}

/// Store whose every call fails, for exercising the server-error path.
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused (os error 111)")
    }
    async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused (os error 111)")
    }
    async fn create(&self, _user: NewUser) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused (os error 111)")
    }
    async fn touch_last_login(&self, _id: Uuid, _at: OffsetDateTime) -> anyhow::Result<()> {
        anyhow::bail!("connection refused (os error 111)")
    }
    async fn update_password_hash(&self, _id: Uuid, _hash: &str) -> anyhow::Result<()> {
        anyhow::bail!("connection refused (os error 111)")
    }
    async fn set_active(&self, _id: Uuid, _active: bool) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused (os error 111)")
    }
    async fn list(&self) -> anyhow::Result<Vec<User>> {
        anyhow::bail!("connection refused (os error 111)")
    }
}
