//! HTTP client for the Calamari microservice.
//!
//! Issues the description fetch and the scheduler ping, classifying outcomes
//! into [`ProviderError`]s. No retries happen here.

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, Response};
use tracing::debug;

use crate::api::{DescriptionResponse, PING_REQUEST_MAPPING};
use crate::error::{ProviderError, ProviderResult};

/// Client bound to one resolved base URL.
#[derive(Clone, Debug)]
pub struct MsaClient {
    client: Client,
    base_url: String,
}

impl MsaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a request mapping.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch and decode the capability description at `path`.
    pub async fn fetch_description(&self, path: &str) -> ProviderResult<DescriptionResponse> {
        let url = self.url(path);
        debug!("Fetching description: {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let response = check_status(response)?;
        let body = response.text().await?;
        let description: DescriptionResponse = serde_json::from_str(&body)?;

        Ok(description)
    }

    /// Ping the scheduler. The response body is ignored.
    pub async fn ping(&self) -> ProviderResult<()> {
        let response = self.client.get(self.url(PING_REQUEST_MAPPING)).send().await?;
        check_status(response)?;
        Ok(())
    }
}

/// Turn 4xx/5xx responses into errors, pass everything else through.
fn check_status(response: Response) -> ProviderResult<Response> {
    match ProviderError::from_status(response.status(), response.headers().clone()) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}
