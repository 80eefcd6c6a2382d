/// API entry point and unmatched routes
use crate::{
    error::ServerError,
    links::{BaseUrl, Envelope, Link, Links},
    resources::{collection_url, AlbumResource, ArtistResource, ConcertResource, TrackResource},
};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiIndex {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// GET / - Lists the catalog collections
pub async fn index(base: BaseUrl) -> Json<Envelope<ApiIndex>> {
    let links = Links::new()
        .with("self", Link::new(base.join("/"), "self"))
        .with(
            "albums",
            Link::new(collection_url::<AlbumResource>(&base), "collection").method("GET"),
        )
        .with(
            "artists",
            Link::new(collection_url::<ArtistResource>(&base), "collection").method("GET"),
        )
        .with(
            "tracks",
            Link::new(collection_url::<TrackResource>(&base), "collection").method("GET"),
        )
        .with(
            "concerts",
            Link::new(collection_url::<ConcertResource>(&base), "collection").method("GET"),
        )
        .with(
            "health",
            Link::new(base.join("/health"), "status").method("GET"),
        );

    Json(Envelope::data(
        ApiIndex {
            name: "encore".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Music catalog of albums, artists, tracks and concerts. \
                          Send OPTIONS to any collection for the methods it supports."
                .to_string(),
        },
        links,
    ))
}

/// Any route not matched above
pub async fn fallback() -> ServerError {
    ServerError::NotFound("Resource not found".to_string())
}
