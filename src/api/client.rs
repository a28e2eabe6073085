//! HTTP client for the sheet endpoint.
//!
//! The backend is a single Apps-Script-style query endpoint: GET with a
//! `sheet` parameter naming the dataset, returning a JSON array of flat row
//! objects, oldest row first. The endpoint is slow (often seconds), which is
//! the whole reason the cache coordinator exists.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::cache::DataSource;
use crate::models::Dataset;

use super::ApiError;

/// HTTP request timeout in seconds.
/// Bounds how long a cache-miss resolve can hang on the network path.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the sheet endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    script_url: String,
}

impl SheetClient {
    pub fn new(script_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, script_url })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Fetch all rows of one sheet.
    pub async fn fetch(&self, sheet: &str) -> Result<Dataset> {
        // .query() percent-encodes, so sheet names with spaces or slashes work
        let response = self
            .client
            .get(&self.script_url)
            .query(&[("sheet", sheet)])
            .send()
            .await
            .with_context(|| format!("Failed to request sheet {}", sheet))?;

        let response = Self::check_response(response).await?;

        let records: Dataset = response
            .json()
            .await
            .with_context(|| format!("Failed to parse sheet {} as a JSON row array", sheet))?;

        debug!(sheet, rows = records.len(), "Sheet fetched");
        Ok(records)
    }
}

#[async_trait]
impl DataSource for SheetClient {
    async fn fetch_sheet(&self, sheet: &str) -> Result<Dataset> {
        self.fetch(sheet).await
    }
}
