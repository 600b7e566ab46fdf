//! Thin typed client over the Comercia backend REST surface.
//!
//! `ApiClient` owns the HTTP transport (base URL, bearer token, timeout);
//! per-resource modules (`orders`, `products`, `parties`) build on it and
//! run every response through the envelope parsers in [`envelope`].

pub mod envelope;
pub mod orders;
pub mod parties;
pub mod products;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;
use crate::errors::{ErrorBody, ServiceError};

pub use orders::OrdersApi;
pub use parties::PartiesApi;
pub use products::ProductsApi;

/// Shared HTTP transport for all resource APIs. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::from_parts(
            &config.api_base_url,
            config.api_token.clone(),
            config.request_timeout(),
        )
    }

    pub fn from_parts(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::Config(format!("invalid api_base_url: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ServiceError::Config("api_base_url cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ServiceError> {
        let request = self.http.get(self.url(path)?).query(query);
        self.execute(request).await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ServiceError> {
        let request = self.http.request(method, self.url(path)?).json(body);
        self.execute(request).await
    }

    pub(crate) async fn send_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ServiceError> {
        let request = self.http.post(self.url(path)?).multipart(form);
        self.execute(request).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value, ServiceError> {
        let request = self.http.delete(self.url(path)?);
        self.execute(request).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, ServiceError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(Self::error_for(status, &bytes));
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn error_for(status: StatusCode, bytes: &[u8]) -> ServiceError {
        let message = serde_json::from_slice::<ErrorBody>(bytes)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| String::from_utf8_lossy(bytes).trim().to_string());
        if status == StatusCode::NOT_FOUND {
            ServiceError::NotFound(message)
        } else {
            ServiceError::ApiError {
                status: status.as_u16(),
                message,
            }
        }
    }
}
