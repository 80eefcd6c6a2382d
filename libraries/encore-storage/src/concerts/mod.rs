use crate::database::{Database, SqlValue};
use crate::error::{Result, StorageError};
use encore_core::types::*;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Decode a concert row. The lineup is loaded separately and starts empty.
pub fn from_row(row: &SqliteRow) -> Result<Concert> {
    Ok(Concert {
        id: row.try_get("id")?,
        start_time: row.try_get("start_time")?,
        duration_minutes: row.try_get("duration_minutes")?,
        artists: Vec::new(),
        etag: row.try_get("etag")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn lineup_from_row(row: &SqliteRow) -> Result<ConcertArtist> {
    let role: String = row.try_get("role")?;

    Ok(ConcertArtist {
        artist_id: row.try_get("artist_id")?,
        artist_name: row.try_get("artist_name")?,
        role: ConcertArtistRole::parse(&role).ok_or_else(|| {
            StorageError::SerializationError(format!("unknown concert role: {role}"))
        })?,
    })
}

/// Lineup of a concert, primary acts first
pub async fn lineup(db: &Database, concert_id: ConcertId) -> Result<Vec<ConcertArtist>> {
    db.fetch_many(
        "SELECT ca.artist_id, a.name AS artist_name, ca.role
         FROM concert_artists ca
         JOIN artists a ON a.id = ca.artist_id
         WHERE ca.concert_id = ?
         ORDER BY CASE ca.role
             WHEN 'primary' THEN 0
             WHEN 'support' THEN 1
             ELSE 2
         END, ca.artist_id",
        &[concert_id.into()],
    )
    .await?
    .iter()
    .map(lineup_from_row)
    .collect()
}

async fn with_lineups(db: &Database, rows: Vec<SqliteRow>) -> Result<Vec<Concert>> {
    let mut concerts = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut concert = from_row(row)?;
        concert.artists = lineup(db, concert.id).await?;
        concerts.push(concert);
    }
    Ok(concerts)
}

pub async fn get_all(db: &Database) -> Result<Vec<Concert>> {
    let rows = db
        .fetch_many("SELECT * FROM concerts ORDER BY id", &[])
        .await?;
    with_lineups(db, rows).await
}

pub async fn get_by_id(db: &Database, id: ConcertId) -> Result<Option<Concert>> {
    let Some(row) = db
        .fetch_one("SELECT * FROM concerts WHERE id = ?", &[id.into()])
        .await?
    else {
        return Ok(None);
    };

    let mut concert = from_row(&row)?;
    concert.artists = lineup(db, id).await?;
    Ok(Some(concert))
}

pub async fn exists(db: &Database, id: ConcertId) -> Result<bool> {
    Ok(db
        .fetch_one("SELECT 1 FROM concerts WHERE id = ?", &[id.into()])
        .await?
        .is_some())
}

/// Concerts starting inside `[start, end]`, earliest first.
///
/// Both bounds must already be normalized start times so that the lexical
/// comparison SQLite performs is a chronological one.
pub async fn get_by_time_range(db: &Database, start: &str, end: &str) -> Result<Vec<Concert>> {
    let rows = db
        .fetch_many(
            "SELECT * FROM concerts WHERE start_time BETWEEN ? AND ? ORDER BY start_time, id",
            &[start.into(), end.into()],
        )
        .await?;
    with_lineups(db, rows).await
}

/// Concerts an artist plays at, earliest first
pub async fn get_by_artist(db: &Database, artist_id: ArtistId) -> Result<Vec<Concert>> {
    let rows = db
        .fetch_many(
            "SELECT c.* FROM concerts c
             JOIN concert_artists ca ON ca.concert_id = c.id
             WHERE ca.artist_id = ?
             ORDER BY c.start_time, c.id",
            &[artist_id.into()],
        )
        .await?;
    with_lineups(db, rows).await
}

/// Artists on a submitted lineup that do not exist
async fn missing_lineup_artists(db: &Database, concert: &CreateConcert) -> Result<StorageError> {
    let mut missing = Vec::new();
    for entry in &concert.artists {
        if !crate::artists::exists(db, entry.artist_id).await? {
            missing.push(format!("Artist {} not found", entry.artist_id));
        }
    }
    Ok(StorageError::InvalidReference(missing))
}

/// Insert a concert together with its lineup.
///
/// Nothing is written when any lineup artist does not exist; that case
/// fails with [`StorageError::InvalidReference`].
pub async fn create(db: &Database, concert: &CreateConcert) -> Result<Concert> {
    let mut tx = db.begin().await?;

    let outcome = tx
        .execute(
            "INSERT INTO concerts (start_time, duration_minutes) VALUES (?, ?)",
            &[
                concert.start_time.as_str().into(),
                concert.duration_minutes.into(),
            ],
        )
        .await?;
    let concert_id = outcome.inserted_id;

    for entry in &concert.artists {
        let inserted = tx
            .execute(
                "INSERT INTO concert_artists (concert_id, artist_id, role) VALUES (?, ?, ?)",
                &[
                    concert_id.into(),
                    entry.artist_id.into(),
                    entry.role.as_str().into(),
                ],
            )
            .await;

        if let Err(e) = inserted {
            // Release the connection before looking up what was missing
            tx.rollback().await?;
            if e.is_foreign_key_violation() {
                return Err(missing_lineup_artists(db, concert).await?);
            }
            return Err(e);
        }
    }

    tx.commit().await?;

    get_by_id(db, concert_id)
        .await?
        .ok_or_else(|| StorageError::not_found("Concert", concert_id))
}

/// Update schedule fields, optionally only while the concert still carries
/// `expected_etag`. The lineup is managed through [`add_artist`] and
/// [`remove_artist`]. Returns `None` when no row was written.
pub async fn update(
    db: &Database,
    id: ConcertId,
    concert: &CreateConcert,
    expected_etag: Option<&str>,
) -> Result<Option<Concert>> {
    let outcome = db
        .execute(
            "UPDATE concerts SET start_time = ?, duration_minutes = ?
             WHERE id = ? AND (? IS NULL OR etag = ?)",
            &[
                concert.start_time.as_str().into(),
                concert.duration_minutes.into(),
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

/// Add an artist to the lineup.
///
/// Returns `false` when the artist is already on it.
pub async fn add_artist(
    db: &Database,
    concert_id: ConcertId,
    artist_id: ArtistId,
    role: ConcertArtistRole,
) -> Result<bool> {
    let outcome = db
        .execute(
            "INSERT OR IGNORE INTO concert_artists (concert_id, artist_id, role) VALUES (?, ?, ?)",
            &[
                SqlValue::from(concert_id),
                artist_id.into(),
                role.as_str().into(),
            ],
        )
        .await?;

    Ok(outcome.rows_affected > 0)
}

/// Remove an artist from the lineup.
///
/// Returns `false` when the artist was not on it.
pub async fn remove_artist(
    db: &Database,
    concert_id: ConcertId,
    artist_id: ArtistId,
) -> Result<bool> {
    let outcome = db
        .execute(
            "DELETE FROM concert_artists WHERE concert_id = ? AND artist_id = ?",
            &[concert_id.into(), artist_id.into()],
        )
        .await?;

    Ok(outcome.rows_affected > 0)
}
