use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use shared::protocol::{ConversionRequest, ConversionResponse};
use tracing::{debug, warn};
use url::Url;

use crate::error::TransportError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResponse, TransportError>;
}

/// Posts requests to the `/exec` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResponse, TransportError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| TransportError::Request(format!("failed to encode request: {err}")))?;
        debug!(
            endpoint = %self.endpoint,
            from = %request.from,
            to = %request.to,
            bytes = body.len(),
            "submitting conversion request"
        );

        // The service reports refusals (bad input, rate limits) as 4xx with an
        // `{error}` envelope, so the status code is not checked here.
        let res = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "conversion request failed");
                TransportError::from(err)
            })?;

        let status = res.status();
        let bytes = res.bytes().await.map_err(TransportError::from)?;
        serde_json::from_slice::<ConversionResponse>(&bytes).map_err(|err| {
            warn!(%status, error = %err, "conversion response is not a JSON envelope");
            TransportError::InvalidBody(err.to_string())
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
