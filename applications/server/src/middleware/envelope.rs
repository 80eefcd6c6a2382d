/// Error envelope middleware
use crate::{
    error::{ErrorMessage, ServerError},
    links::{BaseUrl, Envelope, Link, Links},
};
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;

/// Rewrites every 4xx/5xx response as an error envelope whose `self` link
/// is the request URL and whose `collection` link is the first path segment.
///
/// Handlers report their message through the [`ErrorMessage`] extension;
/// responses produced elsewhere (unmatched methods, extractor rejections)
/// fall back to the status reason phrase.
pub async fn envelope_errors(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let base = BaseUrl::from_parts(&parts);
    let self_url = base.join(parts.uri.path_and_query().map_or("/", |pq| pq.as_str()));
    let collection = parts
        .uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let response = next.run(Request::from_parts(parts, body)).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let message = response
        .extensions()
        .get::<ErrorMessage>()
        .map(|message| message.0.clone())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    let links = Links::new()
        .with("self", Link::new(self_url, "self"))
        .with(
            "collection",
            Link::new(base.join(&format!("/{collection}")), "collection"),
        );

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    match serde_json::to_vec(&Envelope::<()>::error(message, links)) {
        Ok(bytes) => Response::from_parts(parts, Body::from(bytes)),
        Err(e) => {
            tracing::error!("Failed to encode error envelope: {}", e);
            Response::from_parts(parts, Body::empty())
        }
    }
}

/// Panic handler for `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    ServerError::Internal(format!("handler panicked: {detail}")).into_response()
}
