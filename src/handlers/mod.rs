pub mod auth;
pub mod commerce;
pub mod common;
pub mod health;
pub mod transactions;
pub mod users;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
