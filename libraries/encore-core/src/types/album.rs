//! Album types

use crate::{error::ValidationErrors, validation::FieldValidator};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type AlbumId = i64;

/// Earliest release year accepted for an album
pub const FIRST_RELEASE_YEAR: i32 = 1900;

/// An album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub genre: String,
    pub release_year: i32,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating (or fully replacing) an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbum {
    pub title: String,
    pub genre: String,
    pub release_year: i32,
}

impl CreateAlbum {
    /// Validate an untyped request body.
    ///
    /// The release year must fall between 1900 and the current year.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let current_year = i64::from(chrono::Utc::now().year());
        let mut validator = FieldValidator::new(body);

        let title = validator.required_text("title", "Title is required");
        let genre = validator.required_text("genre", "Genre is required");
        let release_year = validator.integer_in(
            "releaseYear",
            i64::from(FIRST_RELEASE_YEAR)..=current_year,
            "Release year is required",
            "Invalid release year",
        );

        validator.finish(|| {
            Some(Self {
                title: title?,
                genre: genre?,
                release_year: i32::try_from(release_year?).ok()?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_album() {
        let album = CreateAlbum::from_json(&json!({
            "title": " OK Computer ",
            "genre": "Rock",
            "releaseYear": 1997
        }))
        .unwrap();

        assert_eq!(
            album,
            CreateAlbum {
                title: "OK Computer".to_string(),
                genre: "Rock".to_string(),
                release_year: 1997,
            }
        );
    }

    #[test]
    fn reports_every_problem() {
        let errors = CreateAlbum::from_json(&json!({ "releaseYear": "1997" })).unwrap_err();

        assert_eq!(
            errors.to_string(),
            "Title is required, Genre is required, Invalid release year"
        );
    }

    #[test]
    fn future_year_is_invalid() {
        let next_year = chrono::Utc::now().year() + 1;
        let errors = CreateAlbum::from_json(&json!({
            "title": "Tomorrow",
            "genre": "Pop",
            "releaseYear": next_year
        }))
        .unwrap_err();

        assert_eq!(errors.messages(), &["Invalid release year"]);
    }

    #[test]
    fn serializes_camel_case() {
        let album = Album {
            id: 1,
            title: "OK Computer".to_string(),
            genre: "Rock".to_string(),
            release_year: 1997,
            etag: "abc".to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
            updated_at: "2024-01-01 00:00:00".to_string(),
        };

        let value = serde_json::to_value(&album).unwrap();
        assert_eq!(value["releaseYear"], 1997);
        assert_eq!(value["createdAt"], "2024-01-01 00:00:00");
    }
}
