pub mod model;
pub mod repo;
pub mod store;

pub use model::{NewUser, User};
pub use repo::{memory::InMemoryUserRepository, PgUserRepository, UserRepository};
pub use store::CredentialStore;
