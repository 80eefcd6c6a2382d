/// Common test utilities and fixtures
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use encore_server::{create_router, state::AppState};
use encore_storage::Database;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Build the full router over a fresh in-memory database
pub async fn create_test_app() -> Router {
    create_test_app_with_db().await.0
}

/// Like [`create_test_app`], also handing out the database behind it
pub async fn create_test_app_with_db() -> (Router, Arc<Database>) {
    let db = Arc::new(
        Database::connect("sqlite::memory:", 1)
            .await
            .expect("Failed to open test database"),
    );
    (create_router(AppState::new(Arc::clone(&db))), db)
}

/// A response with its body decoded as JSON (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn etag(&self) -> String {
        self.header(header::ETAG)
            .expect("response should carry an ETag")
            .to_string()
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Send one request through the router
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None, &[]).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> TestResponse {
    send(app, Method::POST, uri, Some(body), &[]).await
}

/// Fixtures that go through the public API
pub mod fixtures {
    use super::*;

    pub async fn create_album(app: &Router, title: &str, release_year: i64) -> Value {
        let response = post(
            app,
            "/albums",
            json!({ "title": title, "genre": "Rock", "releaseYear": release_year }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }

    pub async fn create_artist(app: &Router, name: &str) -> Value {
        let response = post(
            app,
            "/artists",
            json!({ "name": name, "biography": format!("About {name}") }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }

    pub async fn create_track(
        app: &Router,
        title: &str,
        track_number: i64,
        album_id: i64,
        artist_id: i64,
    ) -> Value {
        let response = post(
            app,
            "/tracks",
            json!({
                "title": title,
                "trackNumber": track_number,
                "durationSeconds": 200,
                "albumId": album_id,
                "artistId": artist_id
            }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }

    pub async fn create_concert(app: &Router, start_time: &str) -> Value {
        let response = post(
            app,
            "/concerts",
            json!({ "startTime": start_time, "durationMinutes": 120 }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }
}
