//! Scrape-and-sync job feeding the luxury goods catalog.

pub mod domain;
pub mod parser;
pub mod repository;
pub mod router;
pub mod scrape;
pub mod sync;

pub use domain::{
    CatalogItem, CatalogItemId, CategoryOutcome, CategoryStatus, ScrapedItem, SyncMode,
    SyncSummary,
};
pub use parser::ListingParser;
pub use repository::CatalogRepository;
pub use router::marketplace_router;
pub use scrape::{ScrapeClient, ScrapeError};
pub use sync::{CatalogSyncJob, SyncError};
