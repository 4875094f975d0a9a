use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::error::AppError;
use crate::users::model::{normalize_email, validate_registration, NewUser, User};
use crate::users::repo::UserRepository;

/// Validating front of the user repository. The only place a password is hashed.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Validate, normalise, hash, then persist. Returns the user without its hash.
    #[instrument(skip(self, email, raw_password))]
    pub async fn create(&self, email: &str, name: &str, raw_password: &str) -> Result<User, AppError> {
        let email = validate_registration(email, name, raw_password)?;

        let password_hash = self.hasher.hash_blocking(raw_password.to_owned()).await?;
        debug!(cost = self.hasher.cost(), "password hashed");

        let user = self
            .repo
            .insert(NewUser {
                email,
                name: name.to_owned(),
                password_hash,
            })
            .await?;
        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user.without_password_hash())
    }

    /// The hash is only returned when `include_password_hash` is set.
    pub async fn find_by_email(&self, email: &str, include_password_hash: bool) -> Result<User, AppError> {
        let email = normalize_email(email);
        self.repo
            .find_by_email(&email, include_password_hash)
            .await?
            .map(|u| if include_password_hash { u } else { u.without_password_hash() })
            .ok_or(AppError::NotFound)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .map(User::without_password_hash)
            .ok_or(AppError::NotFound)
    }
}
