use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::CookieConfig;

pub fn session_cookie(cfg: &CookieConfig, token: String, ttl: std::time::Duration) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(ttl.as_secs() as i64))
        .build()
}

pub fn removal_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), "")).path("/").build()
}
