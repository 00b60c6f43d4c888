use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use super::IntegrationError;
use crate::config::EndpointConfig;
use crate::marketplace::{ScrapeClient, ScrapeError};

/// Firecrawl-compatible `POST /v1/scrape` client returning markdown.
pub struct FirecrawlScrapeClient {
    api: ApiClient,
}

impl FirecrawlScrapeClient {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            api: ApiClient::new("scraping api", endpoint)?,
        })
    }
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

#[async_trait]
impl ScrapeClient for FirecrawlScrapeClient {
    async fn scrape_markdown(&self, url: &str) -> Result<String, ScrapeError> {
        let request = self
            .api
            .request(Method::POST, "v1/scrape")
            .json(&ScrapeRequest {
                url,
                formats: ["markdown"],
            });
        let response: ScrapeResponse =
            self.api
                .json(request)
                .await
                .map_err(|err| ScrapeError::Transport {
                    url: url.to_string(),
                    reason: err.to_string(),
                })?;

        if !response.success {
            return Err(ScrapeError::Transport {
                url: url.to_string(),
                reason: response
                    .error
                    .unwrap_or_else(|| "scrape reported failure".to_string()),
            });
        }

        response
            .data
            .and_then(|data| data.markdown)
            .filter(|markdown| !markdown.trim().is_empty())
            .ok_or_else(|| ScrapeError::EmptyPage {
                url: url.to_string(),
            })
    }
}

/// Canned markdown pages keyed by URL. Unknown URLs render an empty results page.
pub struct FixtureScrapeClient {
    pages: HashMap<String, String>,
}

impl FixtureScrapeClient {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self { pages }
    }

    pub fn sample(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let pages = [
            (
                format!("{base}/jewelry/watches/"),
                "\
[![Royal Oak](https://a.1stdibscdn.com/royal-oak.jpg)](/jewelry/watches/wrist-watches/audemars-royal-oak/id-j_101/)
**Audemars Piguet Royal Oak 15500ST**
by Audemars Piguet
$48,500

[![Tank](https://a.1stdibscdn.com/tank.jpg)](/jewelry/watches/wrist-watches/cartier-tank/id-j_102/)
**Cartier Tank Louis 18k Gold**
$7,900
",
            ),
            (
                format!("{base}/jewelry/"),
                "\
[![Riviera](https://a.1stdibscdn.com/riviera.jpg)](/jewelry/necklaces/diamond-riviera/id-j_201/)
**Diamond Riviera Necklace, 25 Carats**
by Graff
$210,000
",
            ),
            (
                format!("{base}/fashion/handbags-purses/"),
                "\
Editors' pick: [Hermès Kelly 28 Togo](/fashion/handbags-purses/hermes-kelly/id-v_301/) $16,750
",
            ),
        ];

        Self::new(
            pages
                .into_iter()
                .map(|(url, body)| (url, body.to_string()))
                .collect(),
        )
    }
}

#[async_trait]
impl ScrapeClient for FixtureScrapeClient {
    async fn scrape_markdown(&self, url: &str) -> Result<String, ScrapeError> {
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "# Results\n\nNo items match your search.".to_string()))
    }
}
