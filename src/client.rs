//! HTTP client for the registry's document creation endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::document::Document;
use crate::error::{CrptError, Result};
use crate::ratelimit::RateGate;

/// Path of the document creation endpoint, relative to the API base URL.
pub const DOCUMENTS_CREATE_PATH: &str = "/api/v3/lk/documents/create";

/// Raw registry response, returned for every delivered request.
///
/// The registry signals application-level failures through the status
/// code and body; the client hands both back untouched instead of
/// mapping them to errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as received
    pub body: String,
}

impl ApiResponse {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Rate-limited submitter for goods-introduction documents.
///
/// Every submission first passes the shared [`RateGate`], so a
/// `DocumentSubmitter` behind an `Arc` can be driven from any number of
/// tasks without exceeding the configured request rate.
pub struct DocumentSubmitter {
    /// HTTP client, connection pooling included
    client: Client,
    /// Fully resolved endpoint URL
    url: String,
    /// Admission gate, shared with whoever constructed it
    gate: Arc<RateGate>,
}

impl DocumentSubmitter {
    /// Build a submitter around an existing admission gate.
    ///
    /// The gate is created once at startup and handed to every component
    /// that needs admission control; closing it releases submissions
    /// still waiting for a slot.
    pub fn new(gate: Arc<RateGate>, api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}{}",
                api.base_url.trim_end_matches('/'),
                DOCUMENTS_CREATE_PATH
            ),
            gate,
        })
    }

    /// Submit a document for creation, waiting for rate limit admission
    /// first.
    ///
    /// Suspends while the current rate window is exhausted. Once admitted
    /// the document is POSTed as JSON with the access token as a bearer
    /// credential. Any response from the registry, success or not, comes
    /// back as `Ok`; only an undelivered request or an unreadable
    /// response is an error. If the gate closes during the wait the
    /// submission fails with [`CrptError::Cancelled`] and no request is
    /// sent.
    pub async fn submit(&self, token: &str, document: &Document) -> Result<ApiResponse> {
        debug!(doc_id = %document.doc_id, "requested to create document");
        self.gate.acquire().await.map_err(|e| {
            warn!(doc_id = %document.doc_id, "submission abandoned while waiting for admission");
            CrptError::Cancelled(e)
        })?;

        let body = serde_json::to_string(document)?;

        info!(url = %self.url, doc_id = %document.doc_id, "sending document to registry");
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "request to registry failed");
                CrptError::Transport(e)
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "failed to read registry response");
            CrptError::Transport(e)
        })?;

        info!(status, "registry responded");
        Ok(ApiResponse { status, body })
    }
}
