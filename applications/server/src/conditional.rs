//! Conditional request handling (`ETag`, `If-Match`, `If-None-Match`)

use crate::error::{Result, ServerError};
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};

/// Strip the weak prefix and quotes from an entity tag
fn normalize(tag: &str) -> &str {
    let tag = tag.trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    tag.trim_matches('"')
}

/// Whether a comma-separated tag list names `current` (or is `*`)
pub fn tag_matches(header_value: &str, current: &str) -> bool {
    header_value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || normalize(candidate) == current)
}

/// Reject the request with 412 when `If-Match` is present and does not
/// name the current version tag.
pub fn check_if_match(headers: &HeaderMap, current: &str) -> Result<()> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(());
    };

    match value.to_str() {
        Ok(value) if tag_matches(value, current) => Ok(()),
        _ => {
            tracing::debug!(current, "If-Match precondition failed");
            Err(ServerError::PreconditionFailed)
        }
    }
}

/// Version tag a write must still find when it runs, so that a precondition
/// checked earlier cannot be overtaken by a concurrent write. `None` when
/// the request is unconditional or `If-Match: *` accepts any version.
pub fn expected_etag<'a>(headers: &HeaderMap, current: &'a str) -> Option<&'a str> {
    let value = headers.get(header::IF_MATCH)?.to_str().ok()?;
    let any_version = value.split(',').any(|candidate| candidate.trim() == "*");
    (!any_version).then_some(current)
}

/// `If-None-Match` names the current version tag
pub fn is_not_modified(headers: &HeaderMap, current: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| tag_matches(value, current))
}

/// Attach a strong `ETag` header
pub fn with_etag(mut response: Response, etag: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(&format!("\"{etag}\"")) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(name: header::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn tag_forms() {
        assert!(tag_matches("\"abc\"", "abc"));
        assert!(tag_matches("W/\"abc\"", "abc"));
        assert!(tag_matches("abc", "abc"));
        assert!(tag_matches("\"x\", \"abc\"", "abc"));
        assert!(tag_matches("*", "anything"));
        assert!(!tag_matches("\"abd\"", "abc"));
    }

    #[test]
    fn missing_if_match_passes() {
        assert!(check_if_match(&HeaderMap::new(), "abc").is_ok());
    }

    #[test]
    fn stale_if_match_fails() {
        let result = check_if_match(&headers(header::IF_MATCH, "\"old\""), "new");
        assert!(matches!(result, Err(ServerError::PreconditionFailed)));
    }

    #[test]
    fn writes_pin_the_checked_tag() {
        assert_eq!(expected_etag(&headers(header::IF_MATCH, "\"abc\""), "abc"), Some("abc"));
        assert_eq!(expected_etag(&headers(header::IF_MATCH, "*"), "abc"), None);
        assert_eq!(expected_etag(&HeaderMap::new(), "abc"), None);
    }

    #[test]
    fn if_none_match() {
        assert!(is_not_modified(&headers(header::IF_NONE_MATCH, "\"abc\""), "abc"));
        assert!(!is_not_modified(&headers(header::IF_NONE_MATCH, "\"abc\""), "xyz"));
        assert!(!is_not_modified(&HeaderMap::new(), "abc"));
    }
}
