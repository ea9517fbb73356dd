//! Curator Server Library
//!
//! Music curation backend: like/dislike orchestration over the Spotify Web
//! API, with a guard policy, an action audit trail, and a periodic exporter.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{ActionService, GuardService, SessionService};
pub use state::AppState;
