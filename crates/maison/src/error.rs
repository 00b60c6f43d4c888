use crate::config::ConfigError;
use crate::integrations::IntegrationError;
use crate::marketplace::SyncError;
use crate::membership::MembershipError;
use crate::properties::{AggregationError, PropertyImportError};
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Integration(IntegrationError),
    Import(PropertyImportError),
    Listings(AggregationError),
    Sync(SyncError),
    Store(RepositoryError),
    Membership(MembershipError),
    Serialization(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Integration(err) => write!(f, "integration error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Listings(err) => write!(f, "listing error: {}", err),
            AppError::Sync(err) => write!(f, "marketplace sync error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Membership(err) => write!(f, "membership error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Integration(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Listings(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Membership(err) => Some(err),
            AppError::Serialization(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Integration(_) | AppError::Listings(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Sync(_)
            | AppError::Store(_)
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Membership(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<IntegrationError> for AppError {
    fn from(value: IntegrationError) -> Self {
        Self::Integration(value)
    }
}

impl From<PropertyImportError> for AppError {
    fn from(value: PropertyImportError) -> Self {
        Self::Import(value)
    }
}

impl From<AggregationError> for AppError {
    fn from(value: AggregationError) -> Self {
        Self::Listings(value)
    }
}

impl From<SyncError> for AppError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Store(value)
    }
}

impl From<MembershipError> for AppError {
    fn from(value: MembershipError) -> Self {
        Self::Membership(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
