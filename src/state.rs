use crate::auth::{jwt::JwtKeys, password::PasswordHasher, AuthService};
use crate::config::AppConfig;
use crate::db;
use crate::users::{CredentialStore, InMemoryUserRepository, PgUserRepository, UserRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Connects to Postgres and applies migrations. Any failure aborts startup.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;
        Self::from_parts(config, Arc::new(PgUserRepository::new(pool)))
    }

    pub fn from_parts(config: AppConfig, repo: Arc<dyn UserRepository>) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(config.password_hash_cost)?;
        let keys = JwtKeys::from_config(&config.jwt);
        let auth = AuthService::new(CredentialStore::new(repo, hasher), keys);
        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
        })
    }

    /// State backed by an in-memory repository; nothing leaves the process.
    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        Self::from_parts(config, Arc::new(InMemoryUserRepository::new()))
    }
}
