use super::domain::CatalogItem;
use crate::store::RepositoryError;

pub trait CatalogRepository: Send + Sync {
    /// Exact, case-sensitive title match.
    fn find_by_title(&self, title: &str) -> Result<Option<CatalogItem>, RepositoryError>;
    fn insert_item(&self, item: CatalogItem) -> Result<CatalogItem, RepositoryError>;
    fn update_item(&self, item: CatalogItem) -> Result<(), RepositoryError>;
    /// Items in `category` (all items when `None`), most recently updated first.
    fn list_items(&self, category: Option<&str>) -> Result<Vec<CatalogItem>, RepositoryError>;
}
