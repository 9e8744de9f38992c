//! HTTP client for the backend print relay.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::Relay;
use super::payload::{RelayRequest, RelayResponse};
use crate::error::{PrintError, PrintResult};

/// Relay reached over HTTP at `{base}/api/printer/print` and
/// `{base}/api/printer/test`.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRelay {
    pub fn new(base_url: &str) -> PrintResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(PrintError::InvalidConfig("relay URL is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("posprint/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PrintError::InvalidConfig(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }

    pub fn endpoint(&self, action: &str) -> String {
        format!("{}/api/printer/{}", self.base_url, action)
    }

    async fn post(&self, action: &str, request: &RelayRequest) -> PrintResult<RelayResponse> {
        let url = self.endpoint(action);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| PrintError::RelayFailure(format!("{}: {}", url, e)))?;

        let status = response.status();
        debug!(%status, "relay answered");
        let body: Option<RelayResponse> = response.json().await.ok();

        match body {
            Some(body) if status.is_success() => Ok(body),
            Some(RelayResponse {
                message: Some(message),
                ..
            }) => Err(PrintError::RelayFailure(format!("{}: {}", status, message))),
            _ => Err(PrintError::RelayFailure(format!("{} returned {}", url, status))),
        }
    }
}

#[async_trait]
impl Relay for HttpRelay {
    #[instrument(skip(self, request), fields(profile = %request.profile.id))]
    async fn print(&self, request: &RelayRequest) -> PrintResult<RelayResponse> {
        self.post("print", request).await
    }

    #[instrument(skip(self, request), fields(profile = %request.profile.id))]
    async fn test(&self, request: &RelayRequest) -> PrintResult<RelayResponse> {
        self.post("test", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let relay = HttpRelay::new("http://pos.local:8080/").unwrap();
        assert_eq!(relay.endpoint("print"), "http://pos.local:8080/api/printer/print");
        assert_eq!(relay.endpoint("test"), "http://pos.local:8080/api/printer/test");
        assert!(HttpRelay::new(" ").is_err());
    }
}
