use argon2::{
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    InvalidInput,
    #[error("invalid hashing parameters: {0}")]
    Config(String),
    #[error("hashing failed: {0}")]
    Hash(String),
    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),
}

/// Salted Argon2id hashing with a fixed time cost.
///
/// Hashes are PHC strings, so `verify` reads the salt and parameters back out
/// of the stored value and keeps working after the cost is retuned.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    // Hash of a throwaway secret, verified against when the account is unknown.
    decoy: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| PasswordError::Config(e.to_string()))?;
        let mut hasher = Self {
            params,
            decoy: String::new(),
        };
        hasher.decoy = hasher.hash("decoy-password-never-issued")?;
        Ok(hasher)
    }

    pub fn cost(&self) -> u32 {
        self.params.t_cost()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        if plain.is_empty() {
            return Err(PasswordError::InvalidInput);
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hash(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::MalformedHash(e.to_string())
        })?;
        match self.argon2().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(PasswordError::MalformedHash(e.to_string()))
            }
        }
    }

    /// Burns the same work as a real verification and always fails.
    pub fn verify_decoy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.decoy);
        false
    }

    pub async fn hash_blocking(&self, plain: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
    }

    pub async fn verify_blocking(&self, plain: String, hash: String) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
    }

    pub async fn verify_decoy_blocking(&self, plain: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&plain))
            .await
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1).expect("params are valid")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let h = hasher();
        let password = "Secur3P@ssw0rd!";
        let hash = h.hash(password).expect("hashing should succeed");
        assert_ne!(hash, password);
        assert!(h.verify(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let h = hasher();
        let hash = h.hash("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!h.verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = hasher().verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash(_)));
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(hasher().hash(""), Err(PasswordError::InvalidInput)));
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let h = hasher();
        let a = h.hash("secret1").unwrap();
        let b = h.hash("secret1").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("secret1", &a).unwrap());
        assert!(h.verify("secret1", &b).unwrap());
    }

    #[test]
    fn hash_embeds_cost_and_old_hashes_survive_retuning() {
        let cheap = hasher();
        let hash = cheap.hash("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("t=1"));

        let pricier = PasswordHasher::new(2).unwrap();
        assert!(pricier.verify("secret1", &hash).unwrap());
    }

    #[test]
    fn zero_cost_is_a_config_error() {
        assert!(matches!(PasswordHasher::new(0), Err(PasswordError::Config(_))));
    }

    #[test]
    fn decoy_never_matches() {
        let h = hasher();
        assert!(!h.verify_decoy("decoy-password-never-issued"));
        assert!(!h.verify_decoy("secret1"));
    }

    #[tokio::test]
    async fn blocking_wrappers_roundtrip() {
        let h = hasher();
        let hash = h.hash_blocking("secret1".into()).await.unwrap();
        assert!(h.verify_blocking("secret1".into(), hash.clone()).await.unwrap());
        assert!(!h.verify_blocking("secret2".into(), hash).await.unwrap());
    }
}
