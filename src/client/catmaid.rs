//! HTTP client for the CATMAID skeleton endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::models::{CompactSkeletonDetail, NeuronNameResponse};
use super::SkeletonApi;
use crate::cache::SkeletonId;
use crate::config::CacheSettings;

/// Header carrying the CATMAID API token.
const AUTHORIZATION_HEADER: &str = "X-Authorization";

/// HTTP client for a CATMAID server's skeleton endpoints.
///
/// Both endpoints are project-scoped; the project ID is fixed at
/// construction.
pub struct CatmaidClient {
    client: reqwest::Client,
    base_url: String,
    project_id: i64,
    api_token: Option<String>,
}

impl CatmaidClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the CATMAID server (e.g. "https://catmaid.example.org")
    /// * `project_id` - Project whose skeletons are queried
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, project_id: i64, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            client,
            base_url,
            project_id,
            api_token: None,
        }
    }

    /// Create a client from resolved settings.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let mut client = Self::new(
            settings.base_url.clone(),
            settings.project_id,
            settings.request_timeout_secs,
        );
        client.api_token = settings.api_token.clone();
        client
    }

    /// Authenticate requests with an API token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Get the base URL of the CATMAID server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the project ID requests are scoped to.
    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.api_token {
            Some(token) => request.header(AUTHORIZATION_HEADER, format!("Token {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl SkeletonApi for CatmaidClient {
    async fn compact_detail(&self, skeleton_id: SkeletonId) -> Result<CompactSkeletonDetail> {
        let url = format!(
            "{}/{}/skeletons/{}/compact-detail",
            self.base_url, self.project_id, skeleton_id
        );
        let response = self
            .get(&url)
            .query(&[("with_connectors", "true")])
            .send()
            .await
            .context("Failed to connect to CATMAID server")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch detail for skeleton {}: status {}",
                skeleton_id,
                response.status()
            );
        }

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to read skeleton detail response")?;

        CompactSkeletonDetail::from_response(&json)
            .with_context(|| format!("Failed to parse detail for skeleton {}", skeleton_id))
    }

    async fn neuron_name(&self, skeleton_id: SkeletonId) -> Result<String> {
        let url = format!(
            "{}/{}/skeleton/{}/neuronname",
            self.base_url, self.project_id, skeleton_id
        );
        let response = self
            .get(&url)
            .send()
            .await
            .context("Failed to connect to CATMAID server")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch name for skeleton {}: status {}",
                skeleton_id,
                response.status()
            );
        }

        let parsed: NeuronNameResponse = response
            .json()
            .await
            .context("Failed to parse neuron name response")?;

        Ok(parsed.neuronname)
    }
}
