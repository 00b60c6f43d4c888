use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Selects which adapter implementation backs every third-party integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMode {
    Mock,
    Live,
}

impl IntegrationMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "mock" => Ok(Self::Mock),
            "live" => Ok(Self::Live),
            other => Err(ConfigError::InvalidIntegrationMode(other.to_string())),
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub integrations: IntegrationConfig,
    pub marketplace: MarketplaceConfig,
    pub properties: PropertyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            integrations: IntegrationConfig::from_env()?,
            marketplace: MarketplaceConfig::from_env()?,
            properties: PropertyConfig::from_env()?,
        })
    }

    /// Development defaults with mock integrations, ignoring the process environment.
    pub fn local() -> Self {
        Self {
            environment: AppEnvironment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                ansi: true,
            },
            integrations: IntegrationConfig::mock(),
            marketplace: MarketplaceConfig::default(),
            properties: PropertyConfig::default(),
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output, only wanted on developer terminals.
    pub ansi: bool,
}

/// Base URL and credential for one live adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Adapter selection plus the endpoints live adapters talk to.
///
/// In mock mode the endpoints are optional and ignored. In live mode every
/// endpoint must be present, which `from_env` enforces.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub mode: IntegrationMode,
    pub crm: Option<EndpointConfig>,
    pub chat: Option<EndpointConfig>,
    pub idx: Option<EndpointConfig>,
    pub scrape: Option<EndpointConfig>,
}

impl IntegrationConfig {
    pub fn mock() -> Self {
        Self {
            mode: IntegrationMode::Mock,
            crm: None,
            chat: None,
            idx: None,
            scrape: None,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let mode = IntegrationMode::parse(
            &env::var("APP_INTEGRATION_MODE").unwrap_or_else(|_| "mock".to_string()),
        )?;

        let crm = endpoint_from_env("APP_CRM_BASE_URL", "APP_CRM_API_KEY", None);
        let chat = endpoint_from_env("APP_CHAT_BASE_URL", "APP_CHAT_API_KEY", None);
        let idx = endpoint_from_env("APP_IDX_BASE_URL", "APP_IDX_API_KEY", None);
        let scrape = endpoint_from_env(
            "APP_SCRAPE_BASE_URL",
            "APP_SCRAPE_API_KEY",
            Some("https://api.firecrawl.dev"),
        );

        if mode == IntegrationMode::Live {
            require(&crm, "APP_CRM_BASE_URL/APP_CRM_API_KEY")?;
            require(&chat, "APP_CHAT_BASE_URL/APP_CHAT_API_KEY")?;
            require(&idx, "APP_IDX_BASE_URL/APP_IDX_API_KEY")?;
            require(&scrape, "APP_SCRAPE_API_KEY")?;
        }

        Ok(Self {
            mode,
            crm,
            chat,
            idx,
            scrape,
        })
    }
}

fn endpoint_from_env(
    url_var: &str,
    key_var: &str,
    default_url: Option<&str>,
) -> Option<EndpointConfig> {
    let base_url = env::var(url_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| default_url.map(str::to_string))?;
    let api_key = env::var(key_var)
        .ok()
        .filter(|value| !value.trim().is_empty())?;

    Some(EndpointConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key,
    })
}

fn require(endpoint: &Option<EndpointConfig>, name: &'static str) -> Result<(), ConfigError> {
    match endpoint {
        Some(_) => Ok(()),
        None => Err(ConfigError::MissingSetting(name)),
    }
}

/// Scrape-and-sync job settings.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub source_base_url: String,
    pub default_categories: Vec<String>,
    pub request_delay: Duration,
    pub featured_threshold_cents: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            source_base_url: "https://www.1stdibs.com".to_string(),
            default_categories: vec![
                "watches".to_string(),
                "jewelry".to_string(),
                "handbags".to_string(),
            ],
            request_delay: Duration::from_millis(1500),
            featured_threshold_cents: 1_000_000,
        }
    }
}

impl MarketplaceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let source_base_url = env::var("APP_MARKETPLACE_SOURCE_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or(defaults.source_base_url);

        let default_categories = match env::var("APP_MARKETPLACE_CATEGORIES") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => defaults.default_categories,
        };

        let request_delay = match env::var("APP_MARKETPLACE_DELAY_MS") {
            Ok(raw) => Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidNumber("APP_MARKETPLACE_DELAY_MS"))?,
            ),
            Err(_) => defaults.request_delay,
        };

        let featured_threshold_cents = match env::var("APP_MARKETPLACE_FEATURED_CENTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber("APP_MARKETPLACE_FEATURED_CENTS"))?,
            Err(_) => defaults.featured_threshold_cents,
        };

        Ok(Self {
            source_base_url,
            default_categories,
            request_delay,
            featured_threshold_cents,
        })
    }
}

/// City segments and page size used by the property aggregator.
#[derive(Debug, Clone)]
pub struct PropertyConfig {
    pub local_city: String,
    pub feed_city: String,
    pub limit: usize,
}

impl Default for PropertyConfig {
    fn default() -> Self {
        Self {
            local_city: "Miami".to_string(),
            feed_city: "Palm Beach".to_string(),
            limit: 12,
        }
    }
}

impl PropertyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let limit = match env::var("APP_PROPERTY_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber("APP_PROPERTY_LIMIT"))?,
            Err(_) => defaults.limit,
        };

        Ok(Self {
            local_city: env::var("APP_PROPERTY_LOCAL_CITY").unwrap_or(defaults.local_city),
            feed_city: env::var("APP_PROPERTY_FEED_CITY").unwrap_or(defaults.feed_city),
            limit,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidIntegrationMode(String),
    InvalidNumber(&'static str),
    MissingSetting(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidIntegrationMode(value) => write!(
                f,
                "APP_INTEGRATION_MODE must be 'mock' or 'live' (found '{value}')"
            ),
            ConfigError::InvalidNumber(name) => write!(f, "{name} must be a positive integer"),
            ConfigError::MissingSetting(name) => {
                write!(f, "{name} is required when APP_INTEGRATION_MODE=live")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
