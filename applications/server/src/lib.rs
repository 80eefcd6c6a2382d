//! Encore Server Library
//!
//! HTTP API for the Encore music catalog: albums, artists, tracks and
//! concerts served through one generic resource contract, with hypermedia
//! links and version-tag preconditions.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod conditional;
pub mod config;
pub mod error;
pub mod links;
pub mod middleware;
pub mod resources;
pub mod routes;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use routes::create_router;
pub use state::AppState;
