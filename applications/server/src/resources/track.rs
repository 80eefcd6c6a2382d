//! Tracks

use super::{item_url, reference_id, AlbumResource, ArtistResource, Resource};
use crate::links::{BaseUrl, Link, Links};
use async_trait::async_trait;
use encore_core::types::{CreateTrack, Track};
use encore_core::ValidationErrors;
use encore_storage::{albums, artists, tracks, Database, StorageError};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;

pub struct TrackResource;

#[async_trait]
impl Resource for TrackResource {
    const PATH: &'static str = "tracks";
    const TABLE: &'static str = "tracks";
    const NAME: &'static str = "Track";

    type Entity = Track;
    type Create = CreateTrack;

    fn from_row(row: &SqliteRow) -> Result<Track, StorageError> {
        tracks::from_row(row)
    }

    fn id_of(track: &Track) -> i64 {
        track.id
    }

    fn etag_of(track: &Track) -> &str {
        &track.etag
    }

    fn parse(body: &Value) -> Result<CreateTrack, ValidationErrors> {
        CreateTrack::from_json(body)
    }

    /// Both the album and the artist must already exist
    async fn check_references(db: &Database, body: &Value) -> Result<Vec<String>, StorageError> {
        let mut missing = Vec::new();

        if let Some(album_id) = reference_id(body, "albumId") {
            if !albums::exists(db, album_id).await? {
                missing.push("Album not found".to_string());
            }
        }
        if let Some(artist_id) = reference_id(body, "artistId") {
            if !artists::exists(db, artist_id).await? {
                missing.push("Artist not found".to_string());
            }
        }

        Ok(missing)
    }

    async fn perform_create(db: &Database, payload: CreateTrack) -> Result<Track, StorageError> {
        tracks::create(db, &payload).await
    }

    async fn perform_update(
        db: &Database,
        id: i64,
        payload: CreateTrack,
        expected_etag: Option<&str>,
    ) -> Result<Option<Track>, StorageError> {
        tracks::update(db, id, &payload, expected_etag).await
    }

    fn relation_links(base: &BaseUrl, track: &Track, links: &mut Links) {
        links.insert(
            "album",
            Link::new(item_url::<AlbumResource>(base, track.album_id), "album").method("GET"),
        );
        links.insert(
            "artist",
            Link::new(item_url::<ArtistResource>(base, track.artist_id), "artist").method("GET"),
        );
    }
}
