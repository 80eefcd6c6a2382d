use crate::database::Database;
use crate::error::{Result, StorageError};
use encore_core::types::*;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub fn from_row(row: &SqliteRow) -> Result<Track> {
    Ok(Track {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        track_number: row.try_get("track_number")?,
        duration_seconds: row.try_get("duration_seconds")?,
        album_id: row.try_get("album_id")?,
        artist_id: row.try_get("artist_id")?,
        etag: row.try_get("etag")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_all(db: &Database) -> Result<Vec<Track>> {
    db.fetch_many("SELECT * FROM tracks ORDER BY id", &[])
        .await?
        .iter()
        .map(from_row)
        .collect()
}

pub async fn get_by_id(db: &Database, id: TrackId) -> Result<Option<Track>> {
    db.fetch_one("SELECT * FROM tracks WHERE id = ?", &[id.into()])
        .await?
        .as_ref()
        .map(from_row)
        .transpose()
}

/// Tracks of an album in running order
pub async fn get_by_album(db: &Database, album_id: AlbumId) -> Result<Vec<Track>> {
    db.fetch_many(
        "SELECT * FROM tracks WHERE album_id = ? ORDER BY track_number, id",
        &[album_id.into()],
    )
    .await?
    .iter()
    .map(from_row)
    .collect()
}

pub async fn get_by_artist(db: &Database, artist_id: ArtistId) -> Result<Vec<Track>> {
    db.fetch_many(
        "SELECT * FROM tracks WHERE artist_id = ? ORDER BY album_id, track_number, id",
        &[artist_id.into()],
    )
    .await?
    .iter()
    .map(from_row)
    .collect()
}

/// Which of the track's references are missing, as client-facing messages
async fn missing_references(db: &Database, track: &CreateTrack) -> Result<StorageError> {
    let mut missing = Vec::new();
    if !crate::albums::exists(db, track.album_id).await? {
        missing.push("Album not found".to_string());
    }
    if !crate::artists::exists(db, track.artist_id).await? {
        missing.push("Artist not found".to_string());
    }
    Ok(StorageError::InvalidReference(missing))
}

/// Insert a track.
///
/// A dangling album or artist reference fails with
/// [`StorageError::InvalidReference`].
pub async fn create(db: &Database, track: &CreateTrack) -> Result<Track> {
    let inserted = db
        .execute(
            "INSERT INTO tracks (title, track_number, duration_seconds, album_id, artist_id)
             VALUES (?, ?, ?, ?, ?)",
            &[
                track.title.as_str().into(),
                track.track_number.into(),
                track.duration_seconds.into(),
                track.album_id.into(),
                track.artist_id.into(),
            ],
        )
        .await;

    let outcome = match inserted {
        Ok(outcome) => outcome,
        Err(e) if e.is_foreign_key_violation() => {
            return Err(missing_references(db, track).await?);
        }
        Err(e) => return Err(e),
    };

    get_by_id(db, outcome.inserted_id)
        .await?
        .ok_or_else(|| StorageError::not_found("Track", outcome.inserted_id))
}

/// Replace every mutable field, optionally only while the track still
/// carries `expected_etag`. Returns `None` when no row was written.
pub async fn update(
    db: &Database,
    id: TrackId,
    track: &CreateTrack,
    expected_etag: Option<&str>,
) -> Result<Option<Track>> {
    let updated = db
        .execute(
            "UPDATE tracks
             SET title = ?, track_number = ?, duration_seconds = ?, album_id = ?, artist_id = ?
             WHERE id = ? AND (? IS NULL OR etag = ?)",
            &[
                track.title.as_str().into(),
                track.track_number.into(),
                track.duration_seconds.into(),
                track.album_id.into(),
                track.artist_id.into(),
                id.into(),
                expected_etag.into(),
                expected_etag.into(),
            ],
        )
        .await;

    let outcome = match updated {
        Ok(outcome) => outcome,
        Err(e) if e.is_foreign_key_violation() => {
            return Err(missing_references(db, track).await?);
        }
        Err(e) => return Err(e),
    };

    if outcome.rows_affected == 0 {
        return Ok(None);
    }
    get_by_id(db, id).await
}
