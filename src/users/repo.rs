use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already in use: {0}")]
    DuplicateEmail(String),
    #[error("no user with id {0}")]
    Missing(i64),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence gateway for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user, assigning its id and creation timestamp.
    async fn save(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// All users, ascending by id.
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
    /// Writes name, email and age for `user.id`. Fails with `Missing` if the row is gone.
    async fn update(&self, user: &User) -> Result<(), StoreError>;
    /// Removes the user. Absent ids are not an error.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Unique violations on `users.email` become `DuplicateEmail`.
fn map_write_error(e: sqlx::Error, email: &str, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateEmail(email.to_string());
        }
    }
    StoreError::Backend(anyhow::Error::new(e).context(what))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, age)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, age, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, &user.email, "insert user"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, age, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, age, created_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET name = $2, email = $3, age = $4
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_error(e, &user.email, "update user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(user.id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db)
                .await
                .context("check email")?;
        Ok(exists)
    }
}
