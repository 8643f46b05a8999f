use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Client for the backup_restore challenge endpoints.
///
/// Both calls authenticate with the access token as a query parameter; there
/// are no retries — a failed call fails the run.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid service URL")?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .context("failed to build challenge URL")?;
        url.query_pairs_mut()
            .append_pair("access_token", &self.token);
        Ok(url)
    }

    /// Fetch the encoded dump from the problem endpoint.
    pub async fn fetch_problem(&self) -> Result<ProblemResponse> {
        let url = self.url("/challenges/backup_restore/problem")?;
        tracing::info!(endpoint = %url.path(), "Fetching dump from challenge service");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("problem request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("problem request failed ({status}): {body}");
        }

        serde_json::from_str(&body).context("problem response is not the expected JSON shape")
    }

    /// Submit the solution payload; returns the raw response text on success.
    pub async fn submit_solution(&self, solution: &Solution) -> Result<String> {
        let mut url = self.url("/challenges/backup_restore/solve")?;
        url.query_pairs_mut().append_pair("playground", "1");
        tracing::info!(endpoint = %url.path(), "Submitting solution");

        let response = self
            .http
            .post(url)
            .json(solution)
            .send()
            .await
            .context("solve request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("solve request failed ({status}): {body}");
        }

        Ok(body)
    }
}

/// Problem endpoint response.
#[derive(Debug, Deserialize)]
pub struct ProblemResponse {
    /// Base64-wrapped gzip of the SQL dump.
    pub dump: String,
}

/// Solution payload: SSNs of rows with status 'alive', in server row order.
#[derive(Debug, Serialize)]
pub struct Solution {
    pub alive_ssns: Vec<String>,
}
