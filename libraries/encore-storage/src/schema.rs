//! Schema bootstrap
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so the schema can be
//! applied on each start against a fresh or an existing database.

use crate::error::{Result, StorageError};
use sqlx::SqlitePool;

/// Fresh 16-hex-digit version tag
macro_rules! new_etag {
    () => {
        "lower(hex(randomblob(8)))"
    };
}

const TABLES: &[&str] = &[
    concat!(
        "CREATE TABLE IF NOT EXISTS albums (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            genre TEXT NOT NULL,
            release_year INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            etag TEXT NOT NULL DEFAULT (",
        new_etag!(),
        "))"
    ),
    concat!(
        "CREATE TABLE IF NOT EXISTS artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            biography TEXT NOT NULL,
            social_media_links TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            etag TEXT NOT NULL DEFAULT (",
        new_etag!(),
        "))"
    ),
    concat!(
        "CREATE TABLE IF NOT EXISTS tracks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            track_number INTEGER NOT NULL CHECK (track_number > 0),
            duration_seconds INTEGER NOT NULL CHECK (duration_seconds > 0),
            album_id INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            etag TEXT NOT NULL DEFAULT (",
        new_etag!(),
        "))"
    ),
    concat!(
        "CREATE TABLE IF NOT EXISTS concerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time TEXT NOT NULL,
            duration_minutes REAL NOT NULL CHECK (duration_minutes > 0),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            etag TEXT NOT NULL DEFAULT (",
        new_etag!(),
        "))"
    ),
    "CREATE TABLE IF NOT EXISTS concert_artists (
        concert_id INTEGER NOT NULL REFERENCES concerts(id) ON DELETE CASCADE,
        artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('primary', 'support', 'opening_act')),
        PRIMARY KEY (concert_id, artist_id)
    )",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album_id, track_number)",
    "CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks(artist_id)",
    "CREATE INDEX IF NOT EXISTS idx_concerts_start ON concerts(start_time)",
    "CREATE INDEX IF NOT EXISTS idx_concert_artists_artist ON concert_artists(artist_id)",
];

// A version tag changes only when a significant field does. Recursive
// triggers are off by default, so the inner UPDATE does not re-fire.
const TRIGGERS: &[&str] = &[
    concat!(
        "CREATE TRIGGER IF NOT EXISTS albums_etag_update AFTER UPDATE ON albums
        WHEN NEW.title IS NOT OLD.title
          OR NEW.genre IS NOT OLD.genre
          OR NEW.release_year IS NOT OLD.release_year
        BEGIN
            UPDATE albums SET etag = ",
        new_etag!(),
        ", updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
        END"
    ),
    concat!(
        "CREATE TRIGGER IF NOT EXISTS artists_etag_update AFTER UPDATE ON artists
        WHEN NEW.name IS NOT OLD.name
          OR NEW.biography IS NOT OLD.biography
          OR NEW.social_media_links IS NOT OLD.social_media_links
        BEGIN
            UPDATE artists SET etag = ",
        new_etag!(),
        ", updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
        END"
    ),
    concat!(
        "CREATE TRIGGER IF NOT EXISTS tracks_etag_update AFTER UPDATE ON tracks
        WHEN NEW.title IS NOT OLD.title
          OR NEW.track_number IS NOT OLD.track_number
          OR NEW.duration_seconds IS NOT OLD.duration_seconds
          OR NEW.album_id IS NOT OLD.album_id
          OR NEW.artist_id IS NOT OLD.artist_id
        BEGIN
            UPDATE tracks SET etag = ",
        new_etag!(),
        ", updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
        END"
    ),
    concat!(
        "CREATE TRIGGER IF NOT EXISTS concerts_etag_update AFTER UPDATE ON concerts
        WHEN NEW.start_time IS NOT OLD.start_time
          OR NEW.duration_minutes IS NOT OLD.duration_minutes
        BEGIN
            UPDATE concerts SET etag = ",
        new_etag!(),
        ", updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
        END"
    ),
    // The lineup is part of a concert's representation
    concat!(
        "CREATE TRIGGER IF NOT EXISTS concert_lineup_insert AFTER INSERT ON concert_artists
        BEGIN
            UPDATE concerts SET etag = ",
        new_etag!(),
        ", updated_at = CURRENT_TIMESTAMP WHERE id = NEW.concert_id;
        END"
    ),
    concat!(
        "CREATE TRIGGER IF NOT EXISTS concert_lineup_delete AFTER DELETE ON concert_artists
        BEGIN
            UPDATE concerts SET etag = ",
        new_etag!(),
        ", updated_at = CURRENT_TIMESTAMP WHERE id = OLD.concert_id;
        END"
    ),
];

/// Every schema statement in application order
pub fn statements() -> impl Iterator<Item = &'static str> {
    TABLES
        .iter()
        .chain(INDEXES.iter())
        .chain(TRIGGERS.iter())
        .copied()
}

/// Apply the schema
///
/// # Errors
///
/// Returns `StorageError::Migration` naming the statement that failed
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    for (position, statement) in statements().enumerate() {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            StorageError::Migration(format!("schema statement {position} failed: {e}"))
        })?;
    }

    tracing::debug!("Schema applied");
    Ok(())
}
