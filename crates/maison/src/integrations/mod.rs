//! Third-party adapters. Each concern has one trait with a mock and a live
//! implementation; [`Integrations::from_config`] picks the set once at startup.

pub mod chat;
pub mod crm;
mod http;
pub mod idx;
pub mod notifier;
pub mod scrape;

use std::sync::Arc;

use tracing::info;

use crate::config::{EndpointConfig, IntegrationConfig, IntegrationMode};
use crate::marketplace::ScrapeClient;
use crate::properties::IdxFeed;

pub use chat::{ConciergeChannel, HttpConciergeChannel, MockConciergeChannel};
pub use crm::{CrmClient, HttpCrmClient, MockCrmClient};
pub use idx::{HttpIdxFeed, MockIdxFeed};
pub use notifier::IntegrationNotifier;
pub use scrape::{FirecrawlScrapeClient, FixtureScrapeClient};

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} endpoint is not configured")]
    NotConfigured(&'static str),
    #[error("{0}")]
    Rejected(String),
}

pub type ConciergeNotifier = IntegrationNotifier<dyn CrmClient, dyn ConciergeChannel>;

/// The adapter set the service runs with.
#[derive(Clone)]
pub struct Integrations {
    pub mode: IntegrationMode,
    pub crm: Arc<dyn CrmClient>,
    pub chat: Arc<dyn ConciergeChannel>,
    pub idx: Arc<dyn IdxFeed>,
    pub scrape: Arc<dyn ScrapeClient>,
}

impl Integrations {
    /// Mock adapters; the scrape fixtures are keyed under `marketplace_base_url`.
    pub fn mock(marketplace_base_url: &str) -> Self {
        Self {
            mode: IntegrationMode::Mock,
            crm: Arc::new(MockCrmClient::default()),
            chat: Arc::new(MockConciergeChannel::default()),
            idx: Arc::new(MockIdxFeed::sample()),
            scrape: Arc::new(FixtureScrapeClient::sample(marketplace_base_url)),
        }
    }

    pub fn from_config(
        config: &IntegrationConfig,
        marketplace_base_url: &str,
    ) -> Result<Self, IntegrationError> {
        let integrations = match config.mode {
            IntegrationMode::Mock => Self::mock(marketplace_base_url),
            IntegrationMode::Live => Self {
                mode: IntegrationMode::Live,
                crm: Arc::new(HttpCrmClient::new(endpoint(&config.crm, "crm")?)?),
                chat: Arc::new(HttpConciergeChannel::new(endpoint(&config.chat, "chat")?)?),
                idx: Arc::new(HttpIdxFeed::new(endpoint(&config.idx, "idx")?)?),
                scrape: Arc::new(FirecrawlScrapeClient::new(endpoint(
                    &config.scrape,
                    "scrape",
                )?)?),
            },
        };

        info!(mode = ?integrations.mode, "integration adapters selected");
        Ok(integrations)
    }

    pub fn notifier(&self) -> ConciergeNotifier {
        IntegrationNotifier::new(Arc::clone(&self.crm), Arc::clone(&self.chat))
    }
}

fn endpoint<'a>(
    endpoint: &'a Option<EndpointConfig>,
    name: &'static str,
) -> Result<&'a EndpointConfig, IntegrationError> {
    endpoint.as_ref().ok_or(IntegrationError::NotConfigured(name))
}
