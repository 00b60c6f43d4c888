use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    CatalogItem, CatalogItemId, CategoryOutcome, CategoryStatus, ScrapedItem, SyncMode,
    SyncSummary,
};
use super::parser::ListingParser;
use super::repository::CatalogRepository;
use super::scrape::ScrapeClient;
use crate::config::MarketplaceConfig;
use crate::store::RepositoryError;

static ITEM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_item_id() -> CatalogItemId {
    let id = ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CatalogItemId(format!("item-{id:06}"))
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("listing patterns failed to compile: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("unsupported action '{0}', expected 'sync' or 'preview'")]
    UnknownAction(String),
    #[error("only admins may run the marketplace sync")]
    Forbidden,
}

/// Serial scrape, parse and upsert over marketplace category pages.
pub struct CatalogSyncJob<C: ?Sized, R> {
    scraper: Arc<C>,
    repository: Arc<R>,
    parser: ListingParser,
    config: MarketplaceConfig,
}

impl<C, R> CatalogSyncJob<C, R>
where
    C: ScrapeClient + ?Sized + 'static,
    R: CatalogRepository + 'static,
{
    pub fn new(
        scraper: Arc<C>,
        repository: Arc<R>,
        config: MarketplaceConfig,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            parser: ListingParser::new(config.source_base_url.clone())?,
            scraper,
            repository,
            config,
        })
    }

    pub fn category_url(&self, category: &str) -> String {
        let path = match category {
            "watches" => "/jewelry/watches/".to_string(),
            "jewelry" => "/jewelry/".to_string(),
            "handbags" => "/fashion/handbags-purses/".to_string(),
            other => format!("/{}/", other.trim_matches('/')),
        };
        format!("{}{}", self.config.source_base_url, path)
    }

    /// Runs `categories` (or the configured defaults when empty) one at a time.
    pub async fn run(
        &self,
        mode: SyncMode,
        categories: &[String],
    ) -> Result<SyncSummary, SyncError> {
        let categories = if categories.is_empty() {
            self.config.default_categories.as_slice()
        } else {
            categories
        };

        let mut summary = SyncSummary {
            mode,
            success: true,
            items_found: 0,
            inserted: 0,
            updated: 0,
            categories: Vec::with_capacity(categories.len()),
            items: Vec::new(),
        };

        for (index, category) in categories.iter().enumerate() {
            if index > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            let url = self.category_url(category);
            let markdown = match self.scraper.scrape_markdown(&url).await {
                Ok(markdown) => markdown,
                Err(err) => {
                    warn!(%category, error = %err, "marketplace category fetch failed");
                    summary.success = false;
                    summary.categories.push(CategoryOutcome {
                        category: category.clone(),
                        status: CategoryStatus::FetchFailed,
                        items_found: 0,
                        error: Some(err.to_string()),
                    });
                    continue;
                }
            };

            let items = self.parser.parse(&markdown);
            if items.is_empty() {
                warn!(%category, %url, "no listings matched on marketplace page");
                summary.categories.push(CategoryOutcome {
                    category: category.clone(),
                    status: CategoryStatus::NoMatches,
                    items_found: 0,
                    error: None,
                });
                continue;
            }

            info!(%category, count = items.len(), "parsed marketplace listings");
            summary.items_found += items.len();
            summary.categories.push(CategoryOutcome {
                category: category.clone(),
                status: CategoryStatus::Parsed,
                items_found: items.len(),
                error: None,
            });

            match mode {
                SyncMode::Preview => summary.items.extend(items),
                SyncMode::Sync => {
                    for item in items {
                        if self.upsert(category, item)? {
                            summary.inserted += 1;
                        } else {
                            summary.updated += 1;
                        }
                    }
                }
            }
        }

        info!(
            success = summary.success,
            found = summary.items_found,
            inserted = summary.inserted,
            updated = summary.updated,
            "marketplace sync finished"
        );
        Ok(summary)
    }

    pub fn items(&self, category: Option<&str>) -> Result<Vec<CatalogItem>, SyncError> {
        Ok(self.repository.list_items(category)?)
    }

    /// Returns `true` when a new row was inserted.
    fn upsert(&self, category: &str, item: ScrapedItem) -> Result<bool, SyncError> {
        let featured = item.price_cents >= self.config.featured_threshold_cents;
        let existing = self.repository.find_by_title(&item.title)?;
        let inserted = existing.is_none();

        let row = CatalogItem {
            id: existing.map_or_else(next_item_id, |row| row.id),
            title: item.title,
            brand: item.brand,
            price_cents: item.price_cents,
            image_url: item.image_url,
            source_url: item.source_url,
            category: category.to_string(),
            featured,
            updated_at: Utc::now(),
        };

        if inserted {
            self.repository.insert_item(row)?;
        } else {
            self.repository.update_item(row)?;
        }
        Ok(inserted)
    }
}
