/// Router assembly
use crate::{
    api, middleware,
    resources::{self, AlbumResource, ArtistResource, ConcertResource, TrackResource},
    state::AppState,
};
use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the full application router
pub fn create_router(app_state: AppState) -> Router {
    let app = Router::new()
        .route("/", get(api::index::index))
        .route("/health", get(api::health::health))
        .nest("/albums", resources::routes::<AlbumResource>())
        .nest("/artists", resources::routes::<ArtistResource>())
        .nest("/tracks", resources::routes::<TrackResource>())
        .nest("/concerts", resources::routes::<ConcertResource>())
        .fallback(api::index::fallback)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum_middleware::from_fn(middleware::envelope_errors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(app_state);

    let with_cors = app.clone().layer(CorsLayer::permissive());
    app.layer(axum_middleware::from_fn_with_state(
        with_cors,
        middleware::cors,
    ))
}
