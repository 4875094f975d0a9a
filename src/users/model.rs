use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

pub const MIN_PASSWORD_CHARS: usize = 6;

/// User record in the database.
///
/// `password_hash` is only populated when a read explicitly asks for it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    #[sqlx(default)]
    pub password_hash: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn without_password_hash(mut self) -> Self {
        self.password_hash = None;
        self
    }
}

/// A validated, normalised user ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Checks sign-up input. Returns the normalised email on success.
pub fn validate_registration(email: &str, name: &str, password: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::validation("email is required"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("invalid email"));
    }
    // stricter than a bare presence check: whitespace-only names are refused too
    if name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Foo@Bar.COM \n"), "foo@bar.com");
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("foo@bar.com"));
        assert!(is_valid_email("first.last+tag@sub.example.io"));
        assert!(!is_valid_email("foo@bar"));
        assert!(!is_valid_email("foo bar@baz.com"));
        assert!(!is_valid_email("@bar.com"));
        assert!(!is_valid_email("foo@bar.c"));
    }

    #[test]
    fn registration_returns_normalized_email() {
        let email = validate_registration(" Foo@Bar.com ", "Foo", "secret1").unwrap();
        assert_eq!(email, "foo@bar.com");
    }

    #[test]
    fn registration_rejects_bad_input() {
        for (email, name, password) in [
            ("", "Foo", "secret1"),
            ("not-an-email", "Foo", "secret1"),
            ("foo@bar.com", "  ", "secret1"),
            ("foo@bar.com", "Foo", ""),
            ("foo@bar.com", "Foo", "12345"),
        ] {
            let err = validate_registration(email, name, password).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{email:?} {name:?}");
        }
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // five characters, ten bytes
        assert!(validate_registration("foo@bar.com", "Foo", "ééééé").is_err());
        assert!(validate_registration("foo@bar.com", "Foo", "éééééé").is_ok());
    }

    #[test]
    fn serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            name: "Test".into(),
            password_hash: Some("$argon2id$secret".into()),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
    }
}
