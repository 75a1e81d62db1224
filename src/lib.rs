//! Shelfmark book catalog
//!
//! Keeps books, their ordered authors and editors, and their publisher
//! consistent when edits arrive as flat forms, and serves the catalog as a
//! sorted, filtered, paginated view that can locate any row after a write.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
