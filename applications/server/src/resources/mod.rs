//! Resource base contract
//!
//! Every catalog entity is served by the same set of generic handlers
//! (list, get, create, replace, patch, delete, OPTIONS). A concrete
//! resource implements [`Resource`] to supply its validation rules, its
//! insert/update statements and its relation links, and may mount extra
//! sub-routes through [`Resource::extend_routes`].
//!
//! Request flow is always validate, perform, respond. Any error becomes a
//! [`ServerError`] and is turned into an envelope by the error responder.

pub mod album;
pub mod artist;
pub mod concert;
pub mod track;

pub use album::AlbumResource;
pub use artist::ArtistResource;
pub use concert::ConcertResource;
pub use track::TrackResource;

use crate::{
    conditional,
    error::{Result, ServerError},
    links::{BaseUrl, Envelope, Link, Links},
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use encore_core::ValidationErrors;
use encore_storage::{Database, StorageError};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;

/// Methods allowed on a collection
pub const COLLECTION_METHODS: &[&str] = &["GET", "POST", "OPTIONS"];

/// Methods allowed on a single entity
pub const ITEM_METHODS: &[&str] = &["GET", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Server-maintained fields a PATCH body cannot change
const READ_ONLY_FIELDS: &[&str] = &["id", "etag", "createdAt", "updatedAt"];

type StorageResult<T> = std::result::Result<T, StorageError>;

/// A catalog entity served over HTTP
#[async_trait]
pub trait Resource: Sized + Send + Sync + 'static {
    /// URL path segment, e.g. `albums`
    const PATH: &'static str;
    /// Backing table
    const TABLE: &'static str;
    /// Singular display name used in messages
    const NAME: &'static str;
    /// Body fields that PUT and PATCH do not apply
    const UPDATE_IGNORED: &'static [&'static str] = &[];

    type Entity: Serialize + Send + Sync;
    type Create: Send + Sync;

    fn from_row(row: &SqliteRow) -> StorageResult<Self::Entity>;

    fn id_of(entity: &Self::Entity) -> i64;

    fn etag_of(entity: &Self::Entity) -> &str;

    /// Field validation of an untyped body
    fn parse(body: &Value) -> std::result::Result<Self::Create, ValidationErrors>;

    /// Messages for referenced entities that do not exist
    async fn check_references(_db: &Database, _body: &Value) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn perform_create(db: &Database, payload: Self::Create) -> StorageResult<Self::Entity>;

    /// Write only while the entity still carries `expected_etag` (when
    /// given). Returns `None` when nothing was written.
    async fn perform_update(
        db: &Database,
        id: i64,
        payload: Self::Create,
        expected_etag: Option<&str>,
    ) -> StorageResult<Option<Self::Entity>>;

    /// Returns `false` when nothing was deleted
    async fn perform_delete(
        db: &Database,
        id: i64,
        expected_etag: Option<&str>,
    ) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND (? IS NULL OR etag = ?)",
            Self::TABLE
        );
        let outcome = db
            .execute(&sql, &[id.into(), expected_etag.into(), expected_etag.into()])
            .await?;
        Ok(outcome.rows_affected > 0)
    }

    async fn load_all(db: &Database) -> StorageResult<Vec<Self::Entity>> {
        let sql = format!("SELECT * FROM {} ORDER BY id", Self::TABLE);
        db.fetch_many(&sql, &[])
            .await?
            .iter()
            .map(Self::from_row)
            .collect()
    }

    async fn load(db: &Database, id: i64) -> StorageResult<Option<Self::Entity>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", Self::TABLE);
        db.fetch_one(&sql, &[id.into()])
            .await?
            .as_ref()
            .map(Self::from_row)
            .transpose()
    }

    /// Links to related resources, added to every item link set
    fn relation_links(_base: &BaseUrl, _entity: &Self::Entity, _links: &mut Links) {}

    /// Mount resource-specific sub-routes
    fn extend_routes(router: Router<AppState>) -> Router<AppState> {
        router
    }
}

/// Router for one resource, to be nested under `/{PATH}`
pub fn routes<R: Resource>() -> Router<AppState> {
    R::extend_routes(Router::new())
        .route(
            "/",
            get(list_entities::<R>)
                .post(create_entity::<R>)
                .options(collection_options::<R>),
        )
        .route(
            "/:id",
            get(get_entity::<R>)
                .put(replace_entity::<R>)
                .patch(patch_entity::<R>)
                .delete(delete_entity::<R>)
                .options(item_options::<R>),
        )
}

// ============================================================================
// Shared helpers
// ============================================================================

/// JSON body whose parse failures become 400 envelopes
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[axum::async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ServerError::BadRequest(rejection.body_text())),
        }
    }
}

/// Parse a path identifier. Only positive integers are valid.
pub fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::BadRequest("Invalid id".to_string()))
}

/// A positive integer id read from a raw body field, if present
pub fn reference_id(body: &Value, field: &str) -> Option<i64> {
    body.get(field).and_then(Value::as_i64).filter(|id| *id > 0)
}

pub fn not_found<R: Resource>() -> ServerError {
    ServerError::NotFound(format!("{} not found", R::NAME))
}

pub fn collection_url<R: Resource>(base: &BaseUrl) -> String {
    base.join(&format!("/{}", R::PATH))
}

pub fn item_url<R: Resource>(base: &BaseUrl, id: i64) -> String {
    base.join(&format!("/{}/{id}", R::PATH))
}

pub fn collection_links<R: Resource>(base: &BaseUrl) -> Links {
    let url = collection_url::<R>(base);
    Links::new()
        .with("self", Link::new(url.clone(), "self"))
        .with("create", Link::new(url.clone(), "create").method("POST"))
        .with(
            "item",
            Link::new(format!("{url}/{{id}}"), "item")
                .method("GET")
                .templated(),
        )
}

pub fn item_links<R: Resource>(base: &BaseUrl, entity: &R::Entity) -> Links {
    let url = item_url::<R>(base, R::id_of(entity));
    let mut links = Links::new()
        .with("self", Link::new(url.clone(), "self"))
        .with("update", Link::new(url.clone(), "update").method("PUT"))
        .with("delete", Link::new(url, "delete").method("DELETE"))
        .with(
            "collection",
            Link::new(collection_url::<R>(base), "collection"),
        );
    R::relation_links(base, entity, &mut links);
    links
}

/// Entity envelope with its version tag
pub fn entity_response<R: Resource>(
    status: StatusCode,
    base: &BaseUrl,
    entity: R::Entity,
) -> Response {
    let etag = R::etag_of(&entity).to_string();
    let links = item_links::<R>(base, &entity);
    conditional::with_etag((status, Json(Envelope::data(entity, links))).into_response(), &etag)
}

/// 201 with `Location` pointing at the new entity
pub fn created_response<R: Resource>(base: &BaseUrl, entity: R::Entity) -> Response {
    let location = item_url::<R>(base, R::id_of(&entity));
    let mut response = entity_response::<R>(StatusCode::CREATED, base, entity);
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

/// Field validation followed by the reference check. Both sets of
/// problems are reported together.
pub async fn validate<R: Resource>(db: &Database, body: &Value) -> Result<R::Create> {
    let parsed = R::parse(body);
    let missing = R::check_references(db, body).await?;

    match parsed {
        Ok(payload) if missing.is_empty() => Ok(payload),
        Ok(_) => Err(ValidationErrors::from(missing).into()),
        Err(mut errors) => {
            errors.extend(missing);
            Err(errors.into())
        }
    }
}

/// Error for a conditional write that changed nothing: the entity is gone,
/// or its version tag moved on after the precondition was checked
async fn unwritten<R: Resource>(db: &Database, id: i64) -> ServerError {
    match R::load(db, id).await {
        Ok(Some(_)) => ServerError::PreconditionFailed,
        Ok(None) => not_found::<R>(),
        Err(e) => e.into(),
    }
}

fn applies_on_update<R: Resource>(field: &str) -> bool {
    !READ_ONLY_FIELDS.contains(&field) && !R::UPDATE_IGNORED.contains(&field)
}

fn without_ignored<R: Resource>(mut body: Value) -> Value {
    if let Value::Object(fields) = &mut body {
        for name in R::UPDATE_IGNORED {
            fields.remove(*name);
        }
    }
    body
}

fn allow_response(methods: &[&str], body: OptionsBody) -> Response {
    let allow = methods.join(", ");
    let mut response = Json(body).into_response();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

#[derive(Debug, Serialize)]
pub struct OptionsBody {
    pub methods: Vec<String>,
    pub links: Links,
    pub description: String,
}

// ============================================================================
// Generic handlers
// ============================================================================

/// GET /{resource}
pub async fn list_entities<R: Resource>(
    State(app_state): State<AppState>,
    base: BaseUrl,
) -> Result<Json<Envelope<Vec<R::Entity>>>> {
    let entities = R::load_all(&app_state.db).await?;
    Ok(Json(Envelope::data(entities, collection_links::<R>(&base))))
}

/// GET /{resource}/:id
/// Honors `If-Match` (412) and `If-None-Match` (304)
pub async fn get_entity<R: Resource>(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
    headers: HeaderMap,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let entity = R::load(&app_state.db, id)
        .await?
        .ok_or_else(not_found::<R>)?;

    let etag = R::etag_of(&entity);
    conditional::check_if_match(&headers, etag)?;
    if conditional::is_not_modified(&headers, etag) {
        return Ok(conditional::with_etag(
            StatusCode::NOT_MODIFIED.into_response(),
            etag,
        ));
    }

    Ok(entity_response::<R>(StatusCode::OK, &base, entity))
}

/// POST /{resource}
pub async fn create_entity<R: Resource>(
    State(app_state): State<AppState>,
    base: BaseUrl,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let payload = validate::<R>(&app_state.db, &body).await?;
    let entity = R::perform_create(&app_state.db, payload).await?;

    tracing::info!(resource = R::PATH, id = R::id_of(&entity), "Created");
    Ok(created_response::<R>(&base, entity))
}

/// PUT /{resource}/:id
/// Full replacement; the body must be a complete creation payload
pub async fn replace_entity<R: Resource>(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
    headers: HeaderMap,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let current = R::load(&app_state.db, id)
        .await?
        .ok_or_else(not_found::<R>)?;
    let etag = R::etag_of(&current);
    conditional::check_if_match(&headers, etag)?;

    let body = without_ignored::<R>(body);
    let payload = validate::<R>(&app_state.db, &body).await?;
    let expected = conditional::expected_etag(&headers, etag);
    let Some(entity) = R::perform_update(&app_state.db, id, payload, expected).await? else {
        return Err(unwritten::<R>(&app_state.db, id).await);
    };

    tracing::info!(resource = R::PATH, id, "Replaced");
    Ok(entity_response::<R>(StatusCode::OK, &base, entity))
}

/// PATCH /{resource}/:id
/// Partial update: the given fields are laid over the current entity and
/// the result is validated like a creation payload
pub async fn patch_entity<R: Resource>(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    base: BaseUrl,
    headers: HeaderMap,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let Value::Object(changes) = body else {
        return Err(ServerError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };
    let changes: Map<String, Value> = changes
        .into_iter()
        .filter(|(key, _)| applies_on_update::<R>(key))
        .collect();
    if changes.is_empty() {
        return Err(ServerError::BadRequest(
            "At least one field must be provided for update".to_string(),
        ));
    }

    let current = R::load(&app_state.db, id)
        .await?
        .ok_or_else(not_found::<R>)?;
    let etag = R::etag_of(&current);
    conditional::check_if_match(&headers, etag)?;

    let mut merged =
        serde_json::to_value(&current).map_err(|e| ServerError::Internal(e.to_string()))?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(changes);
    }
    let merged = without_ignored::<R>(merged);

    let payload = validate::<R>(&app_state.db, &merged).await?;
    let expected = conditional::expected_etag(&headers, etag);
    let Some(entity) = R::perform_update(&app_state.db, id, payload, expected).await? else {
        return Err(unwritten::<R>(&app_state.db, id).await);
    };

    tracing::info!(resource = R::PATH, id, "Patched");
    Ok(entity_response::<R>(StatusCode::OK, &base, entity))
}

/// DELETE /{resource}/:id
pub async fn delete_entity<R: Resource>(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;

    let mut expected = None;
    if headers.contains_key(header::IF_MATCH) {
        let current = R::load(&app_state.db, id)
            .await?
            .ok_or_else(not_found::<R>)?;
        let etag = R::etag_of(&current);
        conditional::check_if_match(&headers, etag)?;
        expected = conditional::expected_etag(&headers, etag).map(str::to_string);
    }

    if !R::perform_delete(&app_state.db, id, expected.as_deref()).await? {
        return Err(unwritten::<R>(&app_state.db, id).await);
    }

    tracing::info!(resource = R::PATH, id, "Deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// OPTIONS /{resource}
pub async fn collection_options<R: Resource>(base: BaseUrl) -> Response {
    allow_response(
        COLLECTION_METHODS,
        OptionsBody {
            methods: COLLECTION_METHODS.iter().map(ToString::to_string).collect(),
            links: collection_links::<R>(&base),
            description: format!(
                "Retrieve and create {path}. Use /{path}/{{id}} for a single entry.",
                path = R::PATH
            ),
        },
    )
}

/// OPTIONS /{resource}/:id
pub async fn item_options<R: Resource>(
    Path(id): Path<String>,
    base: BaseUrl,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let url = item_url::<R>(&base, id);

    let links = Links::new()
        .with("self", Link::new(url.clone(), "self"))
        .with("update", Link::new(url.clone(), "update").method("PUT"))
        .with("patch", Link::new(url.clone(), "update").method("PATCH"))
        .with("delete", Link::new(url, "delete").method("DELETE"))
        .with(
            "collection",
            Link::new(collection_url::<R>(&base), "collection"),
        );

    Ok(allow_response(
        ITEM_METHODS,
        OptionsBody {
            methods: ITEM_METHODS.iter().map(ToString::to_string).collect(),
            links,
            description: format!(
                "Retrieve, replace, update or delete the {} with id {id}.",
                R::NAME.to_lowercase()
            ),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("7").unwrap(), 7);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("1.5").is_err());
    }

    #[test]
    fn collection_link_set() {
        let base = BaseUrl::new("http", "localhost:3000");
        let links = collection_links::<AlbumResource>(&base);

        assert_eq!(links.get("self").unwrap().href, "http://localhost:3000/albums");
        assert_eq!(links.get("create").unwrap().method.as_deref(), Some("POST"));
        let item = links.get("item").unwrap();
        assert_eq!(item.href, "http://localhost:3000/albums/{id}");
        assert_eq!(item.templated, Some(true));
    }
}
