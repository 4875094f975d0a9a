use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::AppError;
use crate::users::{CredentialStore, User};

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

/// Result of a successful sign-up or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}

/// Sign-up / login orchestration. Holds no per-request state.
#[derive(Clone)]
pub struct AuthService {
    store: CredentialStore,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: CredentialStore, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, email, raw_password))]
    pub async fn sign_up(&self, email: &str, name: &str, raw_password: &str) -> Result<AuthSession, AppError> {
        let user = self.store.create(email, name, raw_password).await?;
        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(AuthSession {
            user: user.into(),
            token,
        })
    }

    #[instrument(skip(self, email, raw_password))]
    pub async fn login(&self, email: &str, raw_password: &str) -> Result<AuthSession, AppError> {
        if email.trim().is_empty() || raw_password.is_empty() {
            return Err(AppError::validation("email and password are required"));
        }
        let hasher = self.store.hasher();

        let user = match self.store.find_by_email(email, true).await {
            Ok(u) => u,
            Err(AppError::NotFound) => {
                hasher.verify_decoy_blocking(raw_password.to_owned()).await;
                warn!("login unknown email");
                return Err(AppError::Authentication);
            }
            Err(e) => return Err(e),
        };

        let hash = user.password_hash.clone().ok_or_else(|| {
            AppError::Infrastructure(anyhow::anyhow!("password hash missing for user {}", user.id))
        })?;
        if !hasher.verify_blocking(raw_password.to_owned(), hash).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Authentication);
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(AuthSession {
            user: user.into(),
            token,
        })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<PublicUser, AppError> {
        self.store.find_by_id(user_id).await.map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHasher;
    use crate::config::AppConfig;
    use crate::users::{InMemoryUserRepository, NewUser, UserRepository};
    use std::sync::Arc;

    fn service() -> AuthService {
        let cfg = AppConfig::for_tests();
        let store = CredentialStore::new(
            Arc::new(InMemoryUserRepository::new()),
            PasswordHasher::new(cfg.password_hash_cost).unwrap(),
        );
        AuthService::new(store, JwtKeys::from_config(&cfg.jwt))
    }

    #[tokio::test]
    async fn sign_up_issues_token_for_new_user() {
        let svc = service();
        let session = svc.sign_up("Foo@Bar.com", "Foo", "secret1").await.unwrap();
        assert_eq!(session.user.email, "foo@bar.com");
        assert_eq!(session.user.name, "Foo");
        let claims = svc.keys().verify(&session.token).unwrap();
        assert_eq!(claims.sub, session.user.id);
    }

    #[tokio::test]
    async fn sign_up_propagates_conflict_and_validation() {
        let svc = service();
        svc.sign_up("foo@bar.com", "Foo", "secret1").await.unwrap();
        assert!(matches!(
            svc.sign_up("FOO@bar.com", "Foo", "secret1").await.unwrap_err(),
            AppError::Conflict
        ));
        assert!(matches!(
            svc.sign_up("other@bar.com", "Foo", "12345").await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn login_with_correct_password() {
        let svc = service();
        let signed_up = svc.sign_up("foo@bar.com", "Foo", "secret1").await.unwrap();
        let session = svc.login(" FOO@bar.com", "secret1").await.unwrap();
        assert_eq!(session.user, signed_up.user);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_identically() {
        let svc = service();
        svc.sign_up("foo@bar.com", "Foo", "secret1").await.unwrap();

        let wrong = svc.login("foo@bar.com", "secret2").await.unwrap_err();
        let unknown = svc.login("nobody@bar.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong, AppError::Authentication));
        assert!(matches!(unknown, AppError::Authentication));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_requires_fields() {
        let svc = service();
        assert!(matches!(
            svc.login("", "secret1").await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            svc.login("foo@bar.com", "").await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn me_resolves_session_owner() {
        let svc = service();
        let session = svc.sign_up("foo@bar.com", "Foo", "secret1").await.unwrap();
        let me = svc.me(session.user.id).await.unwrap();
        assert_eq!(me, session.user);
        assert!(matches!(svc.me(Uuid::new_v4()).await.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_infrastructure_not_bad_credentials() {
        let cfg = AppConfig::for_tests();
        let repo = Arc::new(InMemoryUserRepository::new());
        repo.insert(NewUser {
            email: "foo@bar.com".into(),
            name: "Foo".into(),
            password_hash: "garbage".into(),
        })
        .await
        .unwrap();
        let store = CredentialStore::new(repo, PasswordHasher::new(cfg.password_hash_cost).unwrap());
        let svc = AuthService::new(store, JwtKeys::from_config(&cfg.jwt));

        let err = svc.login("foo@bar.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Infrastructure(_)), "got {err:?}");
    }
}
