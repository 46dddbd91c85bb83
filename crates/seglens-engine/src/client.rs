//! HTTP client for the analysis engine's job API.
//!
//! Wraps `reqwest` with the engine's error conventions: a transport failure
//! surfaces as [`EngineError::Unreachable`], a response with a failure status
//! as [`EngineError::Api`] (the body's `detail` field is used as the message
//! when present).

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use seglens_core::job::HistoryQuery;
use seglens_core::mapping::ColumnMapping;
use seglens_core::result::AnalysisResult;

use crate::error::EngineError;
use crate::types::{CsvPreview, EngineJob, JobAck, JobPage, SubmitOptions};

/// Client for the remote analysis engine.
///
/// Use [`EngineClient::new`] for production or point `base_url` at a mock
/// server in tests. Every request carries the configured bearer token and the
/// client-wide timeout; a timeout counts as a connectivity failure.
pub struct EngineClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl EngineClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `base_url` is not a valid URL or
    /// the underlying `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("seglens/0.1 (customer-segmentation)")
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        // Ensure the base URL ends with exactly one slash so joins append to
        // the path rather than replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| EngineError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Submits a file and mapping for analysis.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unreachable`] on transport failure (the caller's cue to
    /// fall back to demo mode), [`EngineError::Api`] when the engine rejects
    /// the submission, [`EngineError::Deserialize`] on an unexpected body.
    pub async fn submit_job(
        &self,
        filename: &str,
        file_bytes: Vec<u8>,
        mapping: &ColumnMapping,
        options: &SubmitOptions,
    ) -> Result<JobAck, EngineError> {
        let url = self.endpoint("jobs/upload/with-mapping")?;

        let file_part = reqwest::multipart::Part::bytes(file_bytes).file_name(filename.to_string());
        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text(
                "customer_id_col",
                mapping.customer_id.clone().unwrap_or_default(),
            )
            .text(
                "invoice_date_col",
                mapping.invoice_date.clone().unwrap_or_default(),
            )
            .text(
                "invoice_id_col",
                mapping.invoice_id.clone().unwrap_or_default(),
            )
            .text("amount_col", mapping.amount.clone().unwrap_or_default())
            .text("clustering_method", options.clustering_method.clone())
            .text(
                "include_comparison",
                options.include_comparison.to_string(),
            );
        if let Some(product) = &mapping.product {
            form = form.text("product_col", product.clone());
        }
        if let Some(category) = &mapping.category {
            form = form.text("category_col", category.clone());
        }

        let request = self.authorize(self.client.post(url.clone()).multipart(form));
        self.execute_json(request, &url).await
    }

    /// Requests a column preview for an uploaded file.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`EngineClient::submit_job`].
    pub async fn preview(
        &self,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<CsvPreview, EngineError> {
        let url = self.endpoint("jobs/upload/preview")?;
        let file_part = reqwest::multipart::Part::bytes(file_bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", file_part);
        let request = self.authorize(self.client.post(url.clone()).multipart(form));
        self.execute_json(request, &url).await
    }

    /// Fetches the current status of a remote job.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`EngineClient::submit_job`]; connectivity failures
    /// here are NOT fallback triggers, the caller surfaces them upstream.
    pub async fn job_status(&self, job_id: &str) -> Result<EngineJob, EngineError> {
        let url = self.endpoint(&format!("jobs/status/{job_id}"))?;
        let request = self.authorize(self.client.get(url.clone()));
        self.execute_json(request, &url).await
    }

    /// Fetches the results of a completed remote job.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`EngineClient::submit_job`].
    pub async fn job_results(&self, job_id: &str) -> Result<AnalysisResult, EngineError> {
        let url = self.endpoint(&format!("jobs/results/{job_id}"))?;
        let request = self.authorize(self.client.get(url.clone()));
        self.execute_json(request, &url).await
    }

    /// Requests cancellation of a remote job. Cooperative: the engine may
    /// have already finished.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`EngineClient::submit_job`].
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), EngineError> {
        let url = self.endpoint(&format!("jobs/{job_id}/cancel"))?;
        let request = self.authorize(self.client.post(url.clone()));
        self.execute_empty(request, &url).await
    }

    /// Deletes a remote job and its stored results.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`EngineClient::submit_job`].
    pub async fn delete_job(&self, job_id: &str) -> Result<(), EngineError> {
        let url = self.endpoint(&format!("jobs/{job_id}"))?;
        let request = self.authorize(self.client.delete(url.clone()));
        self.execute_empty(request, &url).await
    }

    /// Lists the caller's jobs with the given filters forwarded verbatim.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`EngineClient::submit_job`].
    pub async fn list_jobs(&self, query: &HistoryQuery) -> Result<JobPage, EngineError> {
        let mut url = self.endpoint("jobs/")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("per_page", &query.per_page.to_string());
            if let Some(status) = query.status {
                pairs.append_pair("status", &status.to_string());
            }
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
        }
        let request = self.authorize(self.client.get(url.clone()));
        self.execute_json(request, &url).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
        self.base_url
            .join(path)
            .map_err(|e| EngineError::Config(format!("invalid endpoint path '{path}': {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and parses a JSON body, classifying failures.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, EngineError> {
        let body = self.execute_text(request, url).await?;
        serde_json::from_str(&body).map_err(|e| EngineError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Sends the request, discarding any success body.
    async fn execute_empty(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<(), EngineError> {
        self.execute_text(request, url).await.map(|_| ())
    }

    async fn execute_text(&self, request: RequestBuilder, url: &Url) -> Result<String, EngineError> {
        let response = request.send().await.map_err(EngineError::Unreachable)?;
        let status = response.status();
        let body = response.text().await.map_err(EngineError::Unreachable)?;

        if status.is_success() {
            Ok(body)
        } else {
            tracing::warn!(status = %status, url = %url, "analysis engine returned an error");
            Err(EngineError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            })
        }
    }
}

/// Extract a human-readable message from an error body: the engine reports
/// failures as `{"detail": "..."}`, but be tolerant of plain-text bodies.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(String::from)))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        })
}
