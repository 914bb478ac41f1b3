//! ProjectDesk backend: order tracking, payment verification and invoicing
//! for student IoT/ML projects.

pub mod api;
pub mod auth;
#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod invoicing;
pub mod payments;
pub mod state;

pub use error::{AppError, AppResult};
pub use state::{AppState, Stores};
