use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::users::model::{NewUser, User};

/// Persistence for user records. Email uniqueness is the implementation's job.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A taken email fails with [`AppError::Conflict`].
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    /// Look up by an already-normalised email.
    async fn find_by_email(
        &self,
        email: &str,
        include_password_hash: bool,
    ) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

pub struct PgUserRepository {
    pub db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn find_by_email(
        &self,
        email: &str,
        include_password_hash: bool,
    ) -> Result<Option<User>, AppError> {
        let sql = if include_password_hash {
            r#"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#
        } else {
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#
        };
        let user = sqlx::query_as::<_, User>(sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

/// In-process repository for tests and database-less runs.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        // keyed by normalised email; one lock covers the uniqueness check and the insert
        users: Mutex<HashMap<String, User>>,
    }

    impl InMemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        #[cfg(test)]
        pub(crate) fn len(&self) -> usize {
            self.users.lock().map(|u| u.len()).unwrap_or(0)
        }
    }

    fn poisoned() -> AppError {
        AppError::Infrastructure(anyhow::anyhow!("user map lock poisoned"))
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn insert(&self, user: NewUser) -> Result<User, AppError> {
            let mut users = self.users.lock().map_err(|_| poisoned())?;
            if users.contains_key(&user.email) {
                return Err(AppError::Conflict);
            }
            let now = OffsetDateTime::now_utc();
            let stored = User {
                id: Uuid::new_v4(),
                email: user.email.clone(),
                name: user.name,
                password_hash: Some(user.password_hash),
                created_at: now,
                updated_at: now,
            };
            users.insert(user.email, stored.clone());
            Ok(stored.without_password_hash())
        }

        async fn find_by_email(
            &self,
            email: &str,
            include_password_hash: bool,
        ) -> Result<Option<User>, AppError> {
            let users = self.users.lock().map_err(|_| poisoned())?;
            Ok(users.get(email).cloned().map(|u| {
                if include_password_hash {
                    u
                } else {
                    u.without_password_hash()
                }
            }))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
            let users = self.users.lock().map_err(|_| poisoned())?;
            Ok(users
                .values()
                .find(|u| u.id == id)
                .cloned()
                .map(User::without_password_hash))
        }
    }
}
