//! Concerts, their lineup and the time-range query

use super::{
    collection_url, entity_response, item_url, not_found, parse_id, reference_id, JsonBody,
    Resource,
};
use crate::{
    error::{Result, ServerError},
    links::{BaseUrl, Envelope, Link, Links},
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use encore_core::types::{
    normalize_start_time, Concert, ConcertArtist, ConcertArtistRole, CreateConcert,
};
use encore_core::ValidationErrors;
use encore_storage::{artists, concerts, Database, StorageError};
use serde::Deserialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;

pub struct ConcertResource;

#[async_trait]
impl Resource for ConcertResource {
    const PATH: &'static str = "concerts";
    const TABLE: &'static str = "concerts";
    const NAME: &'static str = "Concert";
    /// The lineup is managed through `/concerts/{id}/artists`
    const UPDATE_IGNORED: &'static [&'static str] = &["artists"];

    type Entity = Concert;
    type Create = CreateConcert;

    fn from_row(row: &SqliteRow) -> std::result::Result<Concert, StorageError> {
        concerts::from_row(row)
    }

    fn id_of(concert: &Concert) -> i64 {
        concert.id
    }

    fn etag_of(concert: &Concert) -> &str {
        &concert.etag
    }

    fn parse(body: &Value) -> std::result::Result<CreateConcert, ValidationErrors> {
        CreateConcert::from_json(body)
    }

    /// Every artist on the submitted lineup must exist
    async fn check_references(
        db: &Database,
        body: &Value,
    ) -> std::result::Result<Vec<String>, StorageError> {
        let Some(entries) = body.get("artists").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let mut missing = Vec::new();
        for artist_id in entries.iter().filter_map(|entry| reference_id(entry, "artistId")) {
            if !artists::exists(db, artist_id).await? {
                missing.push(format!("Artist {artist_id} not found"));
            }
        }
        Ok(missing)
    }

    async fn perform_create(
        db: &Database,
        payload: CreateConcert,
    ) -> std::result::Result<Concert, StorageError> {
        concerts::create(db, &payload).await
    }

    /// Schedule fields only; the lineup has its own sub-resource
    async fn perform_update(
        db: &Database,
        id: i64,
        payload: CreateConcert,
        expected_etag: Option<&str>,
    ) -> std::result::Result<Option<Concert>, StorageError> {
        concerts::update(db, id, &payload, expected_etag).await
    }

    async fn load_all(db: &Database) -> std::result::Result<Vec<Concert>, StorageError> {
        concerts::get_all(db).await
    }

    async fn load(db: &Database, id: i64) -> std::result::Result<Option<Concert>, StorageError> {
        concerts::get_by_id(db, id).await
    }

    fn relation_links(base: &BaseUrl, concert: &Concert, links: &mut Links) {
        let artists_url = format!("{}/artists", item_url::<Self>(base, concert.id));
        links.insert(
            "artists",
            Link::new(artists_url.clone(), "artists").method("GET"),
        );
        links.insert("addArtist", Link::new(artists_url, "create").method("POST"));
    }

    fn extend_routes(router: Router<AppState>) -> Router<AppState> {
        router
            .route("/byTimeRange", get(list_by_time_range))
            .route(
                "/:id/artists",
                get(list_concert_artists).post(add_concert_artist),
            )
            .route("/:id/artists/:artist_id", delete(remove_concert_artist))
    }
}

#[derive(Debug, Deserialize)]
pub struct TimeRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// GET /concerts/byTimeRange?start=...&end=...
/// Concerts starting inside the inclusive range, earliest first
pub async fn list_by_time_range(
    State(app_state): State<AppState>,
    Query(query): Query<TimeRangeQuery>,
    base: BaseUrl,
) -> Result<Json<Envelope<Vec<Concert>>>> {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let (Some(start), Some(end)) = (non_blank(query.start), non_blank(query.end)) else {
        return Err(ServerError::BadRequest(
            "Both start and end times are required".to_string(),
        ));
    };

    let start = normalize_start_time(&start)
        .ok_or_else(|| ServerError::BadRequest("Invalid start time format".to_string()))?;
    let end = normalize_start_time(&end)
        .ok_or_else(|| ServerError::BadRequest("Invalid end time format".to_string()))?;

    let concerts = concerts::get_by_time_range(&app_state.db, &start, &end).await?;
    tracing::debug!(%start, %end, found = concerts.len(), "Time range query");

    let collection = collection_url::<ConcertResource>(&base);
    let links = Links::new()
        .with(
            "self",
            Link::new(
                format!("{collection}/byTimeRange?start={start}&end={end}"),
                "self",
            ),
        )
        .with("collection", Link::new(collection, "collection"));

    Ok(Json(Envelope::data(concerts, links)))
}

fn lineup_links(base: &BaseUrl, concert_id: i64) -> Links {
    let concert_url = item_url::<ConcertResource>(base, concert_id);
    let artists_url = format!("{concert_url}/artists");

    Links::new()
        .with("self", Link::new(artists_url.clone(), "self"))
        .with("concert", Link::new(concert_url, "concert").method("GET"))
        .with("addArtist", Link::new(artists_url, "create").method("POST"))
}

async fn existing_concert(app_state: &AppState, id: &str) -> Result<i64> {
    let concert_id = parse_id(id)?;
    if !concerts::exists(&app_state.db, concert_id).await? {
        return Err(not_found::<ConcertResource>());
    }
    Ok(concert_id)
}

async fn reload(app_state: &AppState, concert_id: i64) -> Result<Concert> {
    concerts::get_by_id(&app_state.db, concert_id)
        .await?
        .ok_or_else(not_found::<ConcertResource>)
}

/// GET /concerts/:id/artists
pub async fn list_concert_artists(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
) -> Result<Json<Envelope<Vec<ConcertArtist>>>> {
    let concert_id = existing_concert(&app_state, &id).await?;
    let lineup = concerts::lineup(&app_state.db, concert_id).await?;

    Ok(Json(Envelope::data(lineup, lineup_links(&base, concert_id))))
}

/// POST /concerts/:id/artists
/// Body: `{ "artistId": 9, "role": "support" }`
pub async fn add_concert_artist(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let artist_id = reference_id(&body, "artistId");
    let role = body.get("role").and_then(Value::as_str);
    let (Some(artist_id), Some(role)) = (artist_id, role) else {
        return Err(ServerError::BadRequest(
            "Artist ID and role are required".to_string(),
        ));
    };
    let role = ConcertArtistRole::parse(role)
        .ok_or_else(|| ServerError::BadRequest(format!("Invalid artist role: {role}")))?;

    let concert_id = existing_concert(&app_state, &id).await?;
    if !artists::exists(&app_state.db, artist_id).await? {
        return Err(ServerError::NotFound("Artist not found".to_string()));
    }

    if !concerts::add_artist(&app_state.db, concert_id, artist_id, role).await? {
        return Err(ServerError::BadRequest(
            "Artist is already in this concert".to_string(),
        ));
    }

    tracing::info!(concert_id, artist_id, %role, "Artist added to concert");
    let concert = reload(&app_state, concert_id).await?;
    Ok(entity_response::<ConcertResource>(
        StatusCode::CREATED,
        &base,
        concert,
    ))
}

/// DELETE /concerts/:id/artists/:artist_id
/// Responds with the concert as it is after the removal
pub async fn remove_concert_artist(
    State(app_state): State<AppState>,
    Path((id, artist_id)): Path<(String, String)>,
    base: BaseUrl,
) -> Result<Response> {
    let concert_id = existing_concert(&app_state, &id).await?;
    let artist_id = parse_id(&artist_id)?;

    if !concerts::remove_artist(&app_state.db, concert_id, artist_id).await? {
        return Err(ServerError::NotFound(
            "Artist not found in this concert".to_string(),
        ));
    }

    tracing::info!(concert_id, artist_id, "Artist removed from concert");
    let concert = reload(&app_state, concert_id).await?;
    Ok(entity_response::<ConcertResource>(StatusCode::OK, &base, concert))
}
