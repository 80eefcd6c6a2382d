use crate::database::Database;
use crate::error::{Result, StorageError};
use encore_core::types::*;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub fn from_row(row: &SqliteRow) -> Result<Artist> {
    let links: String = row.try_get("social_media_links")?;

    Ok(Artist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        biography: row.try_get("biography")?,
        social_media_links: serde_json::from_str(&links)?,
        etag: row.try_get("etag")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_all(db: &Database) -> Result<Vec<Artist>> {
    db.fetch_many("SELECT * FROM artists ORDER BY id", &[])
        .await?
        .iter()
        .map(from_row)
        .collect()
}

pub async fn get_by_id(db: &Database, id: ArtistId) -> Result<Option<Artist>> {
    db.fetch_one("SELECT * FROM artists WHERE id = ?", &[id.into()])
        .await?
        .as_ref()
        .map(from_row)
        .transpose()
}

pub async fn exists(db: &Database, id: ArtistId) -> Result<bool> {
    Ok(db
        .fetch_one("SELECT 1 FROM artists WHERE id = ?", &[id.into()])
        .await?
        .is_some())
}

pub async fn create(db: &Database, artist: &CreateArtist) -> Result<Artist> {
    let links = serde_json::to_string(&artist.social_media_links)?;

    let outcome = db
        .execute(
            "INSERT INTO artists (name, biography, social_media_links) VALUES (?, ?, ?)",
            &[
                artist.name.as_str().into(),
                artist.biography.as_str().into(),
                links.into(),
            ],
        )
        .await?;

    get_by_id(db, outcome.inserted_id)
        .await?
        .ok_or_else(|| StorageError::not_found("Artist", outcome.inserted_id))
}

/// Replace every mutable field, optionally only while the artist still
/// carries `expected_etag`. Returns `None` when no row was written.
pub async fn update(
    db: &Database,
    id: ArtistId,
    artist: &CreateArtist,
    expected_etag: Option<&str>,
) -> Result<Option<Artist>> {
    let links = serde_json::to_string(&artist.social_media_links)?;

    let outcome = db
        .execute(
            "UPDATE artists SET name = ?, biography = ?, social_media_links = ?
             WHERE id = ? AND (? IS NULL OR etag = ?)",
            &[
                artist.name.as_str().into(),
                artist.biography.as_str().into(),
                links.into(),
                id.into(),
                expected_etag.into(),
                expected_etag.into(),
            ],
        )
        .await?;

    if outcome.rows_affected == 0 {
        return Ok(None);
    }
    get_by_id(db, id).await
}
