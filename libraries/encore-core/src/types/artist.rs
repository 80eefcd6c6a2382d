//! Artist types

use crate::{error::ValidationErrors, validation::FieldValidator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type ArtistId = i64;

/// Platform name -> profile URL
pub type SocialMediaLinks = BTreeMap<String, String>;

/// An artist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub biography: String,
    pub social_media_links: SocialMediaLinks,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating (or fully replacing) an artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtist {
    pub name: String,
    pub biography: String,
    #[serde(default)]
    pub social_media_links: SocialMediaLinks,
}

impl CreateArtist {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let mut validator = FieldValidator::new(body);

        let name = validator.required_text("name", "Name is required");
        let biography = validator.required_text("biography", "Biography is required");

        let mut social_media_links = SocialMediaLinks::new();
        match validator.field("socialMediaLinks") {
            None => {}
            Some(Value::Object(links)) => {
                for (platform, url) in links {
                    match url.as_str() {
                        Some(url) if is_web_url(url) => {
                            social_media_links.insert(platform.clone(), url.to_string());
                        }
                        _ => validator.push(format!("Invalid URL for {platform}")),
                    }
                }
            }
            Some(_) => validator.push("Social media links must be provided as an object"),
        }

        validator.finish(|| {
            Some(Self {
                name: name?,
                biography: biography?,
                social_media_links,
            })
        })
    }
}

fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
