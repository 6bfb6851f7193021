//! Shared test doubles.

use std::sync::Arc;

use async_trait::async_trait;
use glreview_core::{BranchDetector, Result};
use glreview_gitlab::GitLabClient;
use httpmock::MockServer;
use mockall::mock;

mock! {
    pub Branch {}

    #[async_trait]
    impl BranchDetector for Branch {
        async fn current_branch(&self) -> Result<String>;
    }
}

/// GitLab client pointed at a mock server.
pub fn client_for(server: &MockServer) -> Arc<GitLabClient> {
    Arc::new(GitLabClient::with_base_url(server.base_url(), "test-token"))
}
