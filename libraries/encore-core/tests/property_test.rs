//! Property-based tests for request body validation
//!
//! Uses proptest to check the validation rules across many random payloads.

use chrono::Datelike;
use encore_core::{normalize_start_time, CreateAlbum, CreateTrack};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    /// Property: an album is accepted exactly when its year is in 1900..=now
    #[test]
    fn album_year_bounds(year in 1000i64..3000) {
        let current_year = i64::from(chrono::Utc::now().year());
        let result = CreateAlbum::from_json(&json!({
            "title": "Title",
            "genre": "Genre",
            "releaseYear": year
        }));

        prop_assert_eq!(result.is_ok(), (1900..=current_year).contains(&year));
    }

    /// Property: accepted titles never carry surrounding whitespace
    #[test]
    fn album_title_is_trimmed(title in "[ ]{0,3}[A-Za-z0-9]{1,20}[ ]{0,3}") {
        let album = CreateAlbum::from_json(&json!({
            "title": title,
            "genre": "Rock",
            "releaseYear": 2000
        }))
        .unwrap();

        prop_assert_eq!(album.title.trim(), album.title.as_str());
        prop_assert!(!album.title.is_empty());
    }

    /// Property: track numbers and durations below one are always rejected
    #[test]
    fn track_numbers_must_be_positive(track_number in -100i64..100, duration in -100i64..100) {
        let result = CreateTrack::from_json(&json!({
            "title": "Song",
            "trackNumber": track_number,
            "durationSeconds": duration,
            "albumId": 1,
            "artistId": 1
        }));

        prop_assert_eq!(result.is_ok(), track_number > 0 && duration > 0);
    }

    /// Property: normalized start times sort the same way as the instants they denote
    #[test]
    fn normalized_start_times_sort_chronologically(
        a in 0i64..4_000_000_000,
        b in 0i64..4_000_000_000,
    ) {
        let render = |secs: i64| {
            chrono::DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.to_rfc3339())
                .and_then(|raw| normalize_start_time(&raw))
        };
        let (Some(left), Some(right)) = (render(a), render(b)) else {
            return Err(TestCaseError::fail("timestamp out of range"));
        };

        prop_assert_eq!(left.cmp(&right), a.cmp(&b));
    }
}
