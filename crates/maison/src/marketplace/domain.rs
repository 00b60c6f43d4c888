use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogItemId(pub String);

impl fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog row. `title` is the upsert key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub title: String,
    pub brand: Option<String>,
    pub price_cents: u64,
    pub image_url: Option<String>,
    pub source_url: String,
    pub category: String,
    pub featured: bool,
    pub updated_at: DateTime<Utc>,
}

/// One listing card pulled out of a category page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedItem {
    pub title: String,
    pub brand: Option<String>,
    pub price_cents: u64,
    pub image_url: Option<String>,
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Scrape, parse and upsert.
    Sync,
    /// Scrape and parse only.
    Preview,
}

impl SyncMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sync" => Some(Self::Sync),
            "preview" => Some(Self::Preview),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Parsed,
    /// The page was fetched but no pattern matched anything.
    NoMatches,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOutcome {
    pub category: String,
    pub status: CategoryStatus,
    pub items_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub mode: SyncMode,
    /// False when any category page could not be fetched.
    pub success: bool,
    pub items_found: usize,
    pub inserted: usize,
    pub updated: usize,
    pub categories: Vec<CategoryOutcome>,
    /// Parsed items, only filled in preview mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ScrapedItem>,
}
