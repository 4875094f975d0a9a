//! User sign-up and login over HTTP, backed by Postgres.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod users;

pub use error::AppError;
pub use state::AppState;
