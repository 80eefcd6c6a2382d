//! Encore Storage
//!
//! `SQLite` persistence for the Encore music catalog.
//!
//! # Architecture
//!
//! - **Adapter**: [`Database`] owns the pool and exposes `execute`, `fetch_one`,
//!   `fetch_many` and `begin` with positional parameters
//! - **Schema**: applied on connect; version tags are maintained by triggers
//! - **Vertical Slicing**: each entity owns its own queries and row decoding
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_core::types::CreateAlbum;
//! use encore_storage::{albums, Database};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite::memory:", 1).await?;
//!
//! let album = albums::create(
//!     &db,
//!     &CreateAlbum {
//!         title: "OK Computer".to_string(),
//!         genre: "Rock".to_string(),
//!         release_year: 1997,
//!     },
//! )
//! .await?;
//! assert_eq!(album.etag.len(), 16);
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
pub mod schema;

// Vertical slices
pub mod albums;
pub mod artists;
pub mod concerts;
pub mod tracks;

pub use database::{Database, ExecOutcome, SqlValue, Transaction};
pub use error::{Result, StorageError};
