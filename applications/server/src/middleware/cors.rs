/// Cross-origin access
use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
    Router,
};
use tower::ServiceExt;

/// Send requests through `with_cors`, the same router wrapped in a
/// `CorsLayer`.
///
/// `CorsLayer` answers every OPTIONS request as a preflight. A plain OPTIONS
/// request (no `Access-Control-Request-Method`) asks for the resource's own
/// `Allow` description instead, so it goes straight to the router.
pub async fn cors(State(with_cors): State<Router>, request: Request, next: Next) -> Response {
    let plain_options = request.method() == Method::OPTIONS
        && !request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);
    if plain_options {
        return next.run(request).await;
    }

    match with_cors.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
