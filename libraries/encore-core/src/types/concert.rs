//! Concert types

use super::ArtistId;
use crate::{error::ValidationErrors, validation::FieldValidator};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

pub type ConcertId = i64;

/// Storage format for start times. Lexical order equals chronological order.
const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// What an artist does at a concert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcertArtistRole {
    Primary,
    Support,
    OpeningAct,
}

impl ConcertArtistRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConcertArtistRole::Primary => "primary",
            ConcertArtistRole::Support => "support",
            ConcertArtistRole::OpeningAct => "opening_act",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(ConcertArtistRole::Primary),
            "support" => Some(ConcertArtistRole::Support),
            "opening_act" => Some(ConcertArtistRole::OpeningAct),
            _ => None,
        }
    }
}

impl fmt::Display for ConcertArtistRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An artist on a concert's lineup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcertArtist {
    pub artist_id: ArtistId,
    pub artist_name: String,
    pub role: ConcertArtistRole,
}

/// A concert with its lineup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concert {
    pub id: ConcertId,
    pub start_time: String,
    #[serde(serialize_with = "serialize_minutes")]
    pub duration_minutes: f64,
    pub artists: Vec<ConcertArtist>,
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Lineup entry in a creation payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupEntry {
    pub artist_id: ArtistId,
    pub role: ConcertArtistRole,
}

/// Data for creating a concert. `start_time` is already normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConcert {
    pub start_time: String,
    pub duration_minutes: f64,
    #[serde(default)]
    pub artists: Vec<LineupEntry>,
}

impl CreateConcert {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let mut validator = FieldValidator::new(body);

        let start_time = match validator.field("startTime") {
            None => {
                validator.push("Start time is required");
                None
            }
            Some(raw) => {
                let normalized = raw.as_str().and_then(normalize_start_time);
                if normalized.is_none() {
                    validator.push("Invalid start time format");
                }
                normalized
            }
        };

        let duration_minutes =
            validator.positive_number("durationMinutes", "Duration must be a positive number");

        let artists = match validator.field("artists") {
            None => Vec::new(),
            Some(Value::Array(entries)) => parse_lineup(entries, &mut validator),
            Some(_) => {
                validator.push("Artists must be an array");
                Vec::new()
            }
        };

        validator.finish(|| {
            Some(Self {
                start_time: start_time?,
                duration_minutes: duration_minutes?,
                artists,
            })
        })
    }
}

fn parse_lineup(entries: &[Value], validator: &mut FieldValidator<'_>) -> Vec<LineupEntry> {
    let mut lineup = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for entry in entries {
        let artist_id = entry
            .get("artistId")
            .and_then(Value::as_i64)
            .filter(|id| *id > 0);
        if artist_id.is_none() {
            validator.push("Each artist must have a valid artistId");
        }

        let role = match entry.get("role") {
            Some(Value::String(role)) => {
                let parsed = ConcertArtistRole::parse(role);
                if parsed.is_none() {
                    validator.push(format!("Invalid artist role: {role}"));
                }
                parsed
            }
            Some(other) => {
                validator.push(format!("Invalid artist role: {other}"));
                None
            }
            None => {
                validator.push("Each artist must have a role");
                None
            }
        };

        if let (Some(artist_id), Some(role)) = (artist_id, role) {
            if seen.insert(artist_id) {
                lineup.push(LineupEntry { artist_id, role });
            } else {
                validator.push(format!("Artist {artist_id} is listed more than once"));
            }
        }
    }

    lineup
}

/// Whole minutes are written as JSON integers (`90`, not `90.0`)
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn serialize_minutes<S: Serializer>(minutes: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if minutes.fract() == 0.0 && minutes.abs() < 9.0e15 {
        serializer.serialize_i64(*minutes as i64)
    } else {
        serializer.serialize_f64(*minutes)
    }
}

/// Parse a user-supplied date-time and render it in the storage format.
///
/// Accepts RFC 3339 (any offset, converted to UTC), naive date-times
/// (taken as UTC) and bare dates (midnight UTC).
pub fn normalize_start_time(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;

    Some(parsed.format(START_TIME_FORMAT).to_string())
}
