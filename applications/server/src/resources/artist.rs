//! Artists, with their tracks and concerts

use super::{collection_url, item_url, not_found, parse_id, Resource};
use crate::{
    error::Result,
    links::{BaseUrl, Envelope, Link, Links},
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use encore_core::types::{Artist, Concert, CreateArtist, Track};
use encore_core::ValidationErrors;
use encore_storage::{artists, concerts, tracks, Database, StorageError};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;

pub struct ArtistResource;

#[async_trait]
impl Resource for ArtistResource {
    const PATH: &'static str = "artists";
    const TABLE: &'static str = "artists";
    const NAME: &'static str = "Artist";

    type Entity = Artist;
    type Create = CreateArtist;

    fn from_row(row: &SqliteRow) -> std::result::Result<Artist, StorageError> {
        artists::from_row(row)
    }

    fn id_of(artist: &Artist) -> i64 {
        artist.id
    }

    fn etag_of(artist: &Artist) -> &str {
        &artist.etag
    }

    fn parse(body: &Value) -> std::result::Result<CreateArtist, ValidationErrors> {
        CreateArtist::from_json(body)
    }

    async fn perform_create(
        db: &Database,
        payload: CreateArtist,
    ) -> std::result::Result<Artist, StorageError> {
        artists::create(db, &payload).await
    }

    async fn perform_update(
        db: &Database,
        id: i64,
        payload: CreateArtist,
        expected_etag: Option<&str>,
    ) -> std::result::Result<Option<Artist>, StorageError> {
        artists::update(db, id, &payload, expected_etag).await
    }

    fn relation_links(base: &BaseUrl, artist: &Artist, links: &mut Links) {
        let url = item_url::<Self>(base, artist.id);
        links.insert(
            "tracks",
            Link::new(format!("{url}/tracks"), "tracks").method("GET"),
        );
        links.insert(
            "concerts",
            Link::new(format!("{url}/concerts"), "concerts").method("GET"),
        );
    }

    fn extend_routes(router: Router<AppState>) -> Router<AppState> {
        router
            .route("/:id/tracks", get(list_artist_tracks))
            .route("/:id/concerts", get(list_artist_concerts))
    }
}

fn nested_links(base: &BaseUrl, artist_id: i64, nested: &str) -> Links {
    let artist_url = item_url::<ArtistResource>(base, artist_id);

    Links::new()
        .with("self", Link::new(format!("{artist_url}/{nested}"), "self"))
        .with("artist", Link::new(artist_url, "artist").method("GET"))
        .with(
            "collection",
            Link::new(collection_url::<ArtistResource>(base), "collection"),
        )
}

async fn existing_artist(app_state: &AppState, id: &str) -> Result<i64> {
    let artist_id = parse_id(id)?;
    if !artists::exists(&app_state.db, artist_id).await? {
        return Err(not_found::<ArtistResource>());
    }
    Ok(artist_id)
}

/// GET /artists/:id/tracks
pub async fn list_artist_tracks(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
) -> Result<Json<Envelope<Vec<Track>>>> {
    let artist_id = existing_artist(&app_state, &id).await?;
    let tracks = tracks::get_by_artist(&app_state.db, artist_id).await?;

    Ok(Json(Envelope::data(
        tracks,
        nested_links(&base, artist_id, "tracks"),
    )))
}

/// GET /artists/:id/concerts
/// Concerts the artist plays at, earliest first
pub async fn list_artist_concerts(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
) -> Result<Json<Envelope<Vec<Concert>>>> {
    let artist_id = existing_artist(&app_state, &id).await?;
    let concerts = concerts::get_by_artist(&app_state.db, artist_id).await?;

    Ok(Json(Envelope::data(
        concerts,
        nested_links(&base, artist_id, "concerts"),
    )))
}
