//! Albums and their nested track collection

use super::{
    collection_url, created_response, item_url, not_found, parse_id, validate, JsonBody,
    Resource, TrackResource,
};
use crate::{
    error::{Result, ServerError},
    links::{BaseUrl, Envelope, Link, Links},
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};
use encore_core::types::{Album, CreateAlbum, Track};
use encore_core::ValidationErrors;
use encore_storage::{albums, tracks, Database, StorageError};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;

pub struct AlbumResource;

#[async_trait]
impl Resource for AlbumResource {
    const PATH: &'static str = "albums";
    const TABLE: &'static str = "albums";
    const NAME: &'static str = "Album";

    type Entity = Album;
    type Create = CreateAlbum;

    fn from_row(row: &SqliteRow) -> std::result::Result<Album, StorageError> {
        albums::from_row(row)
    }

    fn id_of(album: &Album) -> i64 {
        album.id
    }

    fn etag_of(album: &Album) -> &str {
        &album.etag
    }

    fn parse(body: &Value) -> std::result::Result<CreateAlbum, ValidationErrors> {
        CreateAlbum::from_json(body)
    }

    async fn perform_create(
        db: &Database,
        payload: CreateAlbum,
    ) -> std::result::Result<Album, StorageError> {
        albums::create(db, &payload).await
    }

    async fn perform_update(
        db: &Database,
        id: i64,
        payload: CreateAlbum,
        expected_etag: Option<&str>,
    ) -> std::result::Result<Option<Album>, StorageError> {
        albums::update(db, id, &payload, expected_etag).await
    }

    /// Tracks go with their album, in one transaction
    async fn perform_delete(
        db: &Database,
        id: i64,
        expected_etag: Option<&str>,
    ) -> std::result::Result<bool, StorageError> {
        albums::delete_with_tracks(db, id, expected_etag).await
    }

    fn relation_links(base: &BaseUrl, album: &Album, links: &mut Links) {
        let tracks_url = format!("{}/tracks", item_url::<Self>(base, album.id));
        links.insert("tracks", Link::new(tracks_url.clone(), "tracks").method("GET"));
        links.insert("addTrack", Link::new(tracks_url, "create").method("POST"));
    }

    fn extend_routes(router: Router<AppState>) -> Router<AppState> {
        router.route("/:id/tracks", get(list_album_tracks).post(add_album_track))
    }
}

fn album_tracks_links(base: &BaseUrl, album_id: i64) -> Links {
    let album_url = item_url::<AlbumResource>(base, album_id);
    let tracks_url = format!("{album_url}/tracks");

    Links::new()
        .with("self", Link::new(tracks_url.clone(), "self"))
        .with("album", Link::new(album_url, "album").method("GET"))
        .with("addTrack", Link::new(tracks_url, "create").method("POST"))
        .with(
            "collection",
            Link::new(collection_url::<AlbumResource>(base), "collection"),
        )
}

/// GET /albums/:id/tracks
/// Tracks of the album in running order
pub async fn list_album_tracks(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
) -> Result<Json<Envelope<Vec<Track>>>> {
    let album_id = parse_id(&id)?;
    if !albums::exists(&app_state.db, album_id).await? {
        return Err(not_found::<AlbumResource>());
    }

    let tracks = tracks::get_by_album(&app_state.db, album_id).await?;
    Ok(Json(Envelope::data(tracks, album_tracks_links(&base, album_id))))
}

/// POST /albums/:id/tracks
/// Create a track on this album; any `albumId` in the body is overridden
pub async fn add_album_track(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let album_id = parse_id(&id)?;
    if !albums::exists(&app_state.db, album_id).await? {
        return Err(not_found::<AlbumResource>());
    }

    let Value::Object(mut fields) = body else {
        return Err(ServerError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };
    fields.insert("albumId".to_string(), Value::from(album_id));
    let body = Value::Object(fields);

    let payload = validate::<TrackResource>(&app_state.db, &body).await?;
    let track = tracks::create(&app_state.db, &payload).await?;

    tracing::info!(album_id, track_id = track.id, "Track added to album");
    Ok(created_response::<TrackResource>(&base, track))
}
