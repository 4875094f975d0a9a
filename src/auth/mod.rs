use crate::state::AppState;
use axum::Router;

pub mod cookie;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod service;

pub use service::{AuthService, AuthSession, PublicUser};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
