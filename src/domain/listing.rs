// src/domain/listing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a persisted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    New,
    Updated,
    Inactive,
    /// Set only by a curator. The sync pipeline never writes it and never leaves it.
    Imported,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::New,
        ListingStatus::Updated,
        ListingStatus::Inactive,
        ListingStatus::Imported,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::New => "new",
            ListingStatus::Updated => "updated",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Imported => "imported",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(ListingStatus::New),
            "updated" => Ok(ListingStatus::Updated),
            "inactive" => Ok(ListingStatus::Inactive),
            "imported" => Ok(ListingStatus::Imported),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

/// A listing exactly as a source connector observed it.
///
/// `title` and `source_url` are optional here because connectors are allowed to
/// emit incomplete records; reconciliation drops them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawListing {
    pub title: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub source_name: String,
    pub source_url: Option<String>,
}

impl RawListing {
    /// The natural key, if the record has a usable one.
    pub fn key(&self) -> Option<&str> {
        non_blank(self.source_url.as_deref())
    }

    pub fn has_title(&self) -> bool {
        non_blank(self.title.as_deref()).is_some()
    }
}

/// The persisted entity, keyed naturally by `source_url`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub date_time: Option<DateTime<Utc>>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub source_name: String,
    pub source_url: String,
    pub last_scraped_at: DateTime<Utc>,
    pub status: ListingStatus,
    pub imported_at: Option<DateTime<Utc>>,
    pub imported_by: Option<i64>,
    pub import_notes: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
