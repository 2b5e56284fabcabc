//! Scoring API client.

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, error};

use crate::error::{ScoringError, ScoringResult};
use crate::models::{Account, ScoreResult, ScoringJob, StatusTransition};

/// Scoring API configuration.
#[derive(Debug, Clone)]
pub struct ScoringApiConfig {
    /// Scoring API base URL, without a trailing slash.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Account key resolved at startup.
    pub account_key: String,
}

impl ScoringApiConfig {
    /// Create a new scoring API configuration.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        account_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            account_key: account_key.into(),
        }
    }
}

/// Bearer-auth JSON client for the scoring API.
pub struct ScoringApiClient {
    config: ScoringApiConfig,
    client: Client,
}

impl ScoringApiClient {
    /// Create a new scoring API client.
    pub fn new(config: ScoringApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// The account key this client was configured with.
    pub fn account_key(&self) -> &str {
        &self.config.account_key
    }

    /// Resolve an account by its key.
    pub async fn resolve_account(&self, account_key: &str) -> ScoringResult<Account> {
        let url = format!("{}/accounts/by-key/{}", self.config.base_url, account_key);
        debug!(url = %url, "Resolving account");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScoringError::AccountNotFound(account_key.to_string()));
        }
        let response = Self::ensure_success(response, "resolve account").await?;
        Ok(response.json().await?)
    }

    /// Fetch a scoring job by id.
    pub async fn fetch_job(&self, scoring_job_id: &str) -> ScoringResult<ScoringJob> {
        let url = format!("{}/scoring-jobs/{}", self.config.base_url, scoring_job_id);
        debug!(url = %url, "Fetching scoring job");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScoringError::JobNotFound(scoring_job_id.to_string()));
        }
        let response = Self::ensure_success(response, "fetch job").await?;
        Ok(response.json().await?)
    }

    /// Apply a status transition to a scoring job.
    pub async fn update_status(
        &self,
        scoring_job_id: &str,
        transition: StatusTransition,
    ) -> ScoringResult<()> {
        let url = format!("{}/scoring-jobs/{}", self.config.base_url, scoring_job_id);
        debug!(scoring_job_id = %scoring_job_id, transition = ?transition, "Updating job status");

        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&transition)
            .send()
            .await?;

        Self::ensure_success(response, "update status").await?;
        Ok(())
    }

    /// Run scoring for a job and return the raw result.
    pub async fn execute(&self, scoring_job_id: &str, account_id: &str) -> ScoringResult<ScoreResult> {
        let url = format!("{}/scoring-jobs/{}/score", self.config.base_url, scoring_job_id);
        debug!(scoring_job_id = %scoring_job_id, "Executing scoring");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&json!({ "accountId": account_id }))
            .send()
            .await?;

        let response = Self::ensure_success(response, "execute scoring").await?;
        Ok(response.json().await?)
    }

    /// Turn a non-success response into an API error carrying the body text.
    async fn ensure_success(
        response: reqwest::Response,
        context: &str,
    ) -> ScoringResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            context = %context,
            error = %message,
            "Scoring API call failed"
        );
        Err(ScoringError::Api { status, message })
    }
}
