//! Encore Core
//!
//! Domain types and field validation for the Encore music catalog.
//!
//! This crate has no I/O. It defines:
//! - **Domain Types**: `Album`, `Artist`, `Track`, `Concert` and their creation payloads
//! - **Validation**: `FieldValidator`, which collects every problem in a JSON body
//!   instead of stopping at the first one
//! - **Error Handling**: `ValidationErrors`
//!
//! # Example
//!
//! ```rust
//! use encore_core::types::CreateAlbum;
//! use serde_json::json;
//!
//! let album = CreateAlbum::from_json(&json!({
//!     "title": "OK Computer",
//!     "genre": "Rock",
//!     "releaseYear": 1997
//! }))
//! .unwrap();
//! assert_eq!(album.release_year, 1997);
//!
//! let errors = CreateAlbum::from_json(&json!({})).unwrap_err();
//! assert_eq!(errors.len(), 3);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod types;
pub mod validation;

pub use error::ValidationErrors;
pub use validation::FieldValidator;

pub use types::{
    normalize_start_time, Album, AlbumId, Artist, ArtistId, Concert, ConcertArtist,
    ConcertArtistRole, ConcertId, CreateAlbum, CreateArtist, CreateConcert, CreateTrack,
    LineupEntry, SocialMediaLinks, Track, TrackId,
};
