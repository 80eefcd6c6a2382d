//! Track types

use super::{AlbumId, ArtistId};
use crate::{error::ValidationErrors, validation::FieldValidator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type TrackId = i64;

/// A track on an album, performed by one artist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub track_number: i64,
    pub duration_seconds: i64,
    pub album_id: AlbumId,
    pub artist_id: ArtistId,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating (or fully replacing) a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrack {
    pub title: String,
    pub track_number: i64,
    pub duration_seconds: i64,
    pub album_id: AlbumId,
    pub artist_id: ArtistId,
}

impl CreateTrack {
    /// Field checks only; whether the album and artist exist is decided by
    /// the caller, which has access to storage.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let mut validator = FieldValidator::new(body);

        let title = validator.required_text("title", "Title is required");
        let track_number =
            validator.positive_integer("trackNumber", "Valid track number is required");
        let duration_seconds = validator
            .positive_integer("durationSeconds", "Valid duration in seconds is required");
        let album_id = validator.positive_integer("albumId", "Album ID is required");
        let artist_id = validator.positive_integer("artistId", "Artist ID is required");

        validator.finish(|| {
            Some(Self {
                title: title?,
                track_number: track_number?,
                duration_seconds: duration_seconds?,
                album_id: album_id?,
                artist_id: artist_id?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_track() {
        let track = CreateTrack::from_json(&json!({
            "title": "Airbag",
            "trackNumber": 1,
            "durationSeconds": 284,
            "albumId": 1,
            "artistId": 2
        }))
        .unwrap();

        assert_eq!(track.title, "Airbag");
        assert_eq!(track.artist_id, 2);
    }

    #[test]
    fn zero_and_negative_numbers_rejected() {
        let errors = CreateTrack::from_json(&json!({
            "title": "Airbag",
            "trackNumber": 0,
            "durationSeconds": -5,
            "albumId": 1,
            "artistId": 1
        }))
        .unwrap_err();

        assert_eq!(
            errors.messages(),
            &[
                "Valid track number is required",
                "Valid duration in seconds is required"
            ]
        );
    }
}
