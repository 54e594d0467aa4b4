//! API endpoint handlers.
//!
//! Each module corresponds to a screen of the browser client.
//! Handlers stay thin and delegate to `CoreState`.

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod health;
