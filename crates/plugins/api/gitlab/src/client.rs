//! GitLab API client implementation.

use std::sync::Arc;

use glreview_core::config::DEFAULT_GITLAB_URL;
use glreview_core::{Error, MergeRequest, Note, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// Page size used when walking merge request notes.
pub const NOTES_PER_PAGE: u32 = 100;

/// Header GitLab uses to announce the following page.
const NEXT_PAGE_HEADER: &str = "X-Next-Page";

/// Header carrying the access token.
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// GitLab API client.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct GitLabClient {
    base_url: String,
    token: String,
    transport: Arc<dyn HttpTransport>,
}

impl GitLabClient {
    /// Create a client for gitlab.com.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GITLAB_URL, token)
    }

    /// Create a client for a self-hosted instance.
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_transport(base_url, token, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(
        base_url: impl Into<String>,
        token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            transport,
        }
    }

    /// Get the project API URL for a given endpoint.
    fn project_url(&self, project_id: &str, endpoint: &str) -> String {
        format!(
            "{}/api/v4/projects/{}{}",
            self.base_url,
            urlencoding::encode(project_id),
            endpoint
        )
    }

    /// Make an authenticated GET request, returning the successful response.
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url = url, "GitLab GET request");

        let response = self
            .transport
            .get(url, &[(TOKEN_HEADER, self.token.as_str())])
            .await?;

        if response.status != 200 {
            warn!(
                status = response.status,
                body = response.body.as_str(),
                "GitLab API error response"
            );
            return Err(Error::Api {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }

    /// Decode a response body.
    fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
        Ok(serde_json::from_str(&response.body)?)
    }

    /// List merge requests whose source branch is `branch`.
    pub async fn list_merge_requests_by_source_branch(
        &self,
        project_id: &str,
        branch: &str,
    ) -> Result<Vec<MergeRequest>> {
        let url = format!(
            "{}?source_branch={}",
            self.project_url(project_id, "/merge_requests"),
            urlencoding::encode(branch)
        );

        let response = self.get(&url).await?;
        let mrs: Vec<MergeRequest> = Self::decode(&response)?;

        debug!(branch = branch, count = mrs.len(), "Fetched merge requests");
        Ok(mrs)
    }

    /// List every note on a merge request, following `X-Next-Page`.
    ///
    /// Pages are requested one after another until the header is missing or
    /// empty. There is no page cap, so a server that always advertises a next
    /// page keeps this loop running. Any failing page fails the whole call.
    pub async fn list_merge_request_notes(&self, project_id: &str, iid: u64) -> Result<Vec<Note>> {
        let endpoint = format!("/merge_requests/{}/notes", iid);
        let mut notes = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = format!(
                "{}?per_page={}&page={}",
                self.project_url(project_id, &endpoint),
                NOTES_PER_PAGE,
                page
            );

            let response = self.get(&url).await?;
            let batch: Vec<Note> = Self::decode(&response)?;
            debug!(iid = iid, page = page, count = batch.len(), "Fetched notes page");
            notes.extend(batch);

            let next = response
                .header(NEXT_PAGE_HEADER)
                .map(str::trim)
                .unwrap_or_default();
            if next.is_empty() {
                break;
            }
            page += 1;
        }

        Ok(notes)
    }
}

// =============================================================================
// Tests
// =============================================================================
