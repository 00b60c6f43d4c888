use async_trait::async_trait;

/// Fetches a page rendered as markdown.
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    async fn scrape_markdown(&self, url: &str) -> Result<String, ScrapeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("scrape request for {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("scrape of {url} returned no markdown")]
    EmptyPage { url: String },
}
