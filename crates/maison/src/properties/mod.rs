//! Property listings merged from the local table and the external IDX feed.

pub mod aggregator;
pub mod domain;
pub mod feed;
pub mod import;
pub mod repository;
pub mod router;

pub use aggregator::{
    interleave, AggregatedListings, AggregationError, PropertyAggregator, SourceFailure,
};
pub use domain::{Location, Property, PropertyFilters, PropertyId, PropertyQuery, PropertySource};
pub use feed::{FeedError, IdxFeed};
pub use import::{PropertyImportError, PropertyImporter};
pub use repository::PropertyRepository;
pub use router::property_router;
