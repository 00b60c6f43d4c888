use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::IntegrationError;
use crate::config::EndpointConfig;

/// Bearer-authenticated JSON client shared by the live adapters.
pub(crate) struct ApiClient {
    service: &'static str,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub(crate) fn new(
        service: &'static str,
        endpoint: &EndpointConfig,
    ) -> Result<Self, IntegrationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| IntegrationError::Transport { service, source })?;

        Ok(Self {
            service,
            client,
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
        })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client.request(method, url).bearer_auth(&self.api_key)
    }

    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, IntegrationError> {
        let response = self.checked(request).await?;
        response.json().await.map_err(|source| self.transport(source))
    }

    /// Like [`ApiClient::json`] but maps 404 to `None`.
    pub(crate) async fn json_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, IntegrationError> {
        let response = request.send().await.map_err(|source| self.transport(source))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.ensure_success(response).await?;
        response
            .json()
            .await
            .map(Some)
            .map_err(|source| self.transport(source))
    }

    /// Sends and discards the body.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<(), IntegrationError> {
        self.checked(request).await.map(|_| ())
    }

    async fn checked(&self, request: RequestBuilder) -> Result<Response, IntegrationError> {
        let response = request.send().await.map_err(|source| self.transport(source))?;
        self.ensure_success(response).await
    }

    async fn ensure_success(&self, response: Response) -> Result<Response, IntegrationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(IntegrationError::Status {
            service: self.service,
            status: status.as_u16(),
            body,
        })
    }

    fn transport(&self, source: reqwest::Error) -> IntegrationError {
        IntegrationError::Transport {
            service: self.service,
            source,
        }
    }
}
