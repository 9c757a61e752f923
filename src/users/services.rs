use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::dto::UserResponse;
use super::mapper::{to_response, update_entity};
use super::repo::UserStore;
use super::repo_types::{NewUser, UserPatch};
use crate::error::ServiceError;

/// Owns the user lifecycle rules on top of a [`UserStore`].
///
/// Every method is a single unit of work. Email uniqueness is checked here
/// first and enforced again by the store, which closes the window between the
/// check and the write.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserResponse, ServiceError> {
        if self.store.exists_by_email(&new_user.email).await? {
            warn!("email already registered");
            return Err(ServiceError::DuplicateEmail(new_user.email));
        }

        let user = self.store.save(new_user).await?;
        info!(user_id = user.id, "user created");
        Ok(to_response(&user))
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: i64) -> Result<UserResponse, ServiceError> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        Ok(to_response(&user))
    }

    #[instrument(skip(self))]
    pub async fn get_all_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.store.find_all().await?;
        Ok(users.iter().map(to_response).collect())
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<UserResponse, ServiceError> {
        let mut user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        if let Some(email) = patch.email.as_deref() {
            if email != user.email && self.store.exists_by_email(email).await? {
                warn!(%email, "email already registered");
                return Err(ServiceError::DuplicateEmail(email.to_string()));
            }
        }

        update_entity(&patch, &mut user);
        self.store.update(&user).await?;
        info!(user_id = user.id, "user updated");
        Ok(to_response(&user))
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound(id));
        }
        self.store.delete(id).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}
