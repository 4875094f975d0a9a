use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// Validates the session token, returning the user ID.
///
/// The session cookie wins; an `Authorization: Bearer` header is accepted for
/// non-browser clients.
pub struct SessionUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let from_cookie = jar
            .get(&state.config.cookie.name)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty());

        let token = match from_cookie {
            Some(t) => t,
            None => parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
                .map(str::to_owned)
                .ok_or(AppError::Authentication)?,
        };

        let claims = state.auth.keys().verify(&token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Authentication
        })?;
        Ok(SessionUser(claims.sub))
    }
}
