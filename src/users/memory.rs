use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

/// In-process user store. Email uniqueness is checked under the write lock,
/// so concurrent writers cannot both claim the same address.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> StoreError {
        StoreError::Backend(anyhow::anyhow!("user store lock poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        inner.last_id += 1;
        let stored = User {
            id: inner.last_id,
            name: user.name,
            email: user.email,
            age: user.age,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::lock_err())?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::lock_err())?;
        Ok(inner.users.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;

        if !inner.users.contains_key(&user.id) {
            return Err(StoreError::Missing(user.id));
        }
        if inner
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail(user.email.clone()));
        }

        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::Missing(user.id))?;
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.age = user.age;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::lock_err())?;
        inner.users.remove(&id);
        Ok(())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::lock_err())?;
        Ok(inner.users.values().any(|u| u.email == email))
    }
}
