//! HTTP client for the extraction service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::domain::build::{ExtractionClient, ExtractionRequest, ExtractionResponse};
use crate::error::{Error, Result};

/// Longest slice of an error body carried into the failure message
const ERROR_BODY_PREVIEW: usize = 200;

/// Posts build requests to `{base_url}/build`
pub struct HttpExtractionClient {
    client: Client,
    base_url: String,
}

impl HttpExtractionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    fn build_url(&self) -> String {
        format!("{}/build", self.base_url)
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse> {
        let url = self.build_url();
        debug!(url = %url, session_id = %request.session_id, "Calling extraction service");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            warn!(status = %status, session_id = %request.session_id, "Extraction service error");
            return Err(Error::ExtractionFailed(format!(
                "extraction service returned {}: {}",
                status, preview
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::ExtractionFailed(format!("malformed extraction response: {}", e)))
    }
}
