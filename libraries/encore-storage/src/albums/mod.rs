use crate::database::{Database, SqlValue};
use crate::error::{Result, StorageError};
use encore_core::types::*;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub fn from_row(row: &SqliteRow) -> Result<Album> {
    Ok(Album {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        genre: row.try_get("genre")?,
        release_year: row.try_get("release_year")?,
        etag: row.try_get("etag")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_all(db: &Database) -> Result<Vec<Album>> {
    db.fetch_many("SELECT * FROM albums ORDER BY id", &[])
        .await?
        .iter()
        .map(from_row)
        .collect()
}

pub async fn get_by_id(db: &Database, id: AlbumId) -> Result<Option<Album>> {
    db.fetch_one("SELECT * FROM albums WHERE id = ?", &[id.into()])
        .await?
        .as_ref()
        .map(from_row)
        .transpose()
}

pub async fn exists(db: &Database, id: AlbumId) -> Result<bool> {
    Ok(db
        .fetch_one("SELECT 1 FROM albums WHERE id = ?", &[id.into()])
        .await?
        .is_some())
}

pub async fn create(db: &Database, album: &CreateAlbum) -> Result<Album> {
    let outcome = db
        .execute(
            "INSERT INTO albums (title, genre, release_year) VALUES (?, ?, ?)",
            &[
                album.title.as_str().into(),
                album.genre.as_str().into(),
                album.release_year.into(),
            ],
        )
        .await?;

    get_by_id(db, outcome.inserted_id)
        .await?
        .ok_or_else(|| StorageError::not_found("Album", outcome.inserted_id))
}

/// Replace every mutable field.
///
/// With `expected_etag` the write only happens while the album still carries
/// that version tag. Returns `None` when no row was written.
pub async fn update(
    db: &Database,
    id: AlbumId,
    album: &CreateAlbum,
    expected_etag: Option<&str>,
) -> Result<Option<Album>> {
    let outcome = db
        .execute(
            "UPDATE albums SET title = ?, genre = ?, release_year = ?
             WHERE id = ? AND (? IS NULL OR etag = ?)",
            &[
                album.title.as_str().into(),
                album.genre.as_str().into(),
                album.release_year.into(),
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

/// Delete an album and its tracks in one transaction.
///
/// Returns `false` (and changes nothing) when the album does not exist or,
/// with `expected_etag`, no longer carries that version tag.
pub async fn delete_with_tracks(
    db: &Database,
    id: AlbumId,
    expected_etag: Option<&str>,
) -> Result<bool> {
    let mut tx = db.begin().await?;

    let tracks = tx
        .execute("DELETE FROM tracks WHERE album_id = ?", &[SqlValue::from(id)])
        .await?;
    let albums = tx
        .execute(
            "DELETE FROM albums WHERE id = ? AND (? IS NULL OR etag = ?)",
            &[SqlValue::from(id), expected_etag.into(), expected_etag.into()],
        )
        .await?;

    if albums.rows_affected == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    tx.commit().await?;
    tracing::debug!(
        album_id = id,
        tracks_removed = tracks.rows_affected,
        "Album deleted"
    );
    Ok(true)
}
