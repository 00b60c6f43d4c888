use async_trait::async_trait;

use super::domain::{Property, PropertyFilters, PropertyId};

/// External property-listing feed.
#[async_trait]
pub trait IdxFeed: Send + Sync {
    async fn search_properties(&self, filters: &PropertyFilters)
        -> Result<Vec<Property>, FeedError>;
    async fn get_property_by_id(&self, id: &PropertyId) -> Result<Option<Property>, FeedError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("idx feed request failed: {0}")]
    Transport(String),
    #[error("idx feed returned an unexpected payload: {0}")]
    Payload(String),
}
