use super::domain::{Property, PropertyFilters, PropertyId};
use crate::store::RepositoryError;

/// The local property table.
pub trait PropertyRepository: Send + Sync {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// Matching rows in insertion order, truncated to `filters.limit`.
    fn search_properties(&self, filters: &PropertyFilters)
        -> Result<Vec<Property>, RepositoryError>;
}
