//! API client for a remote calculator server

use anyhow::{Context, Result};
use perf_lib::{EngineParameters, InputMode, InputRequest, PredictionResult};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the calculator server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("{} ({})", err.describe(), status),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }

    /// Run a calculation on the server
    pub async fn calculate(&self, request: &InputRequest) -> Result<CalculationResponse> {
        self.post("api/v1/calculate", request).await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub mode: InputMode,
    pub parameters: EngineParameters,
    pub prediction: PredictionResult,
    #[serde(default)]
    pub manual_discarded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub fields: Vec<serde_json::Value>,
}

impl ErrorResponse {
    fn describe(&self) -> String {
        format!("{}: {}", self.code, self.error)
    }
}
