//! Shelfmark Library Catalog Server
//!
//! Tracks books, users and lends, and exposes a REST JSON API for catalog
//! maintenance, lending with consistent stock, and bulk CSV import.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod repository;
pub mod services;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
