//! Hypermedia links and the response envelope
//!
//! Every response body has the shape `{ data?, error?, links }`. Link hrefs
//! are built from the scheme and host of the incoming request, so the same
//! server works behind any hostname.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            method: None,
            templated: None,
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    /// Mark the href as a URI template (`{id}` placeholders)
    pub fn templated(mut self) -> Self {
        self.templated = Some(true);
        self
    }
}

/// Link set keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Link>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, link: Link) -> Self {
        self.insert(name, link);
        self
    }

    pub fn insert(&mut self, name: &str, link: Link) {
        self.0.insert(name.to_string(), link);
    }

    pub fn get(&self, name: &str) -> Option<&Link> {
        self.0.get(name)
    }
}

/// Uniform response body
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub links: Links,
}

impl<T> Envelope<T> {
    pub fn data(data: T, links: Links) -> Self {
        Self {
            data: Some(data),
            error: None,
            links,
        }
    }

    pub fn error(message: impl Into<String>, links: Links) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
            links,
        }
    }
}

/// `scheme://host` of the current request
///
/// The scheme comes from `X-Forwarded-Proto` when a proxy set it, the host
/// from the `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self(format!("{scheme}://{host}"))
    }

    pub fn from_parts(parts: &Parts) -> Self {
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http");

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| parts.uri.authority().map(|authority| authority.as_str()))
            .unwrap_or("localhost");

        Self::new(scheme, host)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for a path starting with `/`
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
