//! Tool handlers for MCP server.
//!
//! Each tool runs a short pipeline (detect branch, query GitLab, group,
//! render). The first failing step ends the call and its error message
//! becomes the tool's error result.

use std::sync::Arc;

use glreview_core::{BranchDetector, Error, Result};
use glreview_gitlab::GitLabClient;
use glreview_pipeline::{
    group_notes, render_flat_listing, render_merge_request_summary, render_summary_header,
    render_threads,
};
use serde_json::Value;

use crate::protocol::{ToolCallResult, ToolDefinition};

pub const GET_CURRENT_BRANCH: &str = "get_current_branch";
pub const GET_MERGE_REQUEST_INFO: &str = "get_merge_request_info";
pub const GET_MERGE_REQUEST_COMMENTS: &str = "get_merge_request_comments";
pub const GET_BRANCH_COMMENTS: &str = "get_branch_comments";

/// Argument name of the merge request IID.
const IID_ARG: &str = "mergeRequestIID";

/// Header item preceding per-file comment threads.
const COMMENTS_HEADER: &str = "Comments for Merge Request:";

/// Tool handler that executes tools against GitLab.
///
/// Holds only shared, immutable collaborators; concurrent `execute` calls
/// do not interact.
pub struct ToolHandler {
    client: Arc<GitLabClient>,
    branch: Arc<dyn BranchDetector>,
    project_id: String,
}

impl ToolHandler {
    /// Create a handler for one GitLab project.
    pub fn new(
        client: Arc<GitLabClient>,
        branch: Arc<dyn BranchDetector>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            branch,
            project_id: project_id.into(),
        }
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        let no_params = serde_json::json!({
            "type": "object",
            "properties": {}
        });

        vec![
            ToolDefinition {
                name: GET_CURRENT_BRANCH.to_string(),
                description: "Get the current Git branch".to_string(),
                input_schema: no_params.clone(),
            },
            ToolDefinition {
                name: GET_MERGE_REQUEST_INFO.to_string(),
                description:
                    "Get general information for merge requests from the currently checked out branch"
                        .to_string(),
                input_schema: no_params.clone(),
            },
            ToolDefinition {
                name: GET_MERGE_REQUEST_COMMENTS.to_string(),
                description:
                    "Get review comments for a merge request, grouped into threads by file and line"
                        .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        IID_ARG: {
                            "type": "number",
                            "description": "IID of the merge request"
                        }
                    },
                    "required": [IID_ARG]
                }),
            },
            ToolDefinition {
                name: GET_BRANCH_COMMENTS.to_string(),
                description:
                    "List review comments of every merge request from the currently checked out branch"
                        .to_string(),
                input_schema: no_params,
            },
        ]
    }

    /// Execute a tool by name with arguments.
    ///
    /// Never fails at the protocol level: errors are returned as
    /// error-flagged results.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let outcome = match name {
            GET_CURRENT_BRANCH => self.handle_current_branch().await,
            GET_MERGE_REQUEST_INFO => self.handle_merge_request_info().await,
            GET_MERGE_REQUEST_COMMENTS => self.handle_merge_request_comments(arguments).await,
            GET_BRANCH_COMMENTS => self.handle_branch_comments().await,
            _ => return ToolCallResult::error(format!("Unknown tool: {}", name)),
        };

        match outcome {
            Ok(items) => ToolCallResult::texts(items),
            Err(e) => {
                tracing::warn!(tool = name, "Tool failed: {}", e);
                ToolCallResult::error(e.to_string())
            }
        }
    }

    /// Handle get_current_branch tool call.
    async fn handle_current_branch(&self) -> Result<Vec<String>> {
        let branch = self.branch.current_branch().await?;
        Ok(vec![format!("Current branch is: {}", branch)])
    }

    /// Handle get_merge_request_info tool call.
    async fn handle_merge_request_info(&self) -> Result<Vec<String>> {
        let branch = self.branch.current_branch().await?;
        let mrs = self
            .client
            .list_merge_requests_by_source_branch(&self.project_id, &branch)
            .await?;

        if mrs.is_empty() {
            return Ok(vec![no_merge_requests(&branch)]);
        }

        let mut items = Vec::with_capacity(mrs.len() + 1);
        items.push(render_summary_header(mrs.len(), &branch));
        items.extend(mrs.iter().map(render_merge_request_summary));
        Ok(items)
    }

    /// Handle get_merge_request_comments tool call.
    async fn handle_merge_request_comments(&self, arguments: Option<Value>) -> Result<Vec<String>> {
        let iid = parse_iid(arguments.as_ref())?;

        let notes = self
            .client
            .list_merge_request_notes(&self.project_id, iid)
            .await?;
        let threads = group_notes(&notes);
        tracing::debug!(iid = iid, files = threads.len(), "Rendering comment threads");

        let mut items = vec![COMMENTS_HEADER.to_string()];
        items.extend(render_threads(&threads));
        Ok(items)
    }

    /// Handle get_branch_comments tool call.
    async fn handle_branch_comments(&self) -> Result<Vec<String>> {
        let branch = self.branch.current_branch().await?;
        let mrs = self
            .client
            .list_merge_requests_by_source_branch(&self.project_id, &branch)
            .await?;

        if mrs.is_empty() {
            return Ok(vec![no_merge_requests(&branch)]);
        }

        let mut entries = Vec::with_capacity(mrs.len());
        for mr in mrs {
            let notes = self
                .client
                .list_merge_request_notes(&self.project_id, mr.iid)
                .await?;
            entries.push((mr, notes));
        }

        Ok(vec![render_flat_listing(&entries)])
    }
}

fn no_merge_requests(branch: &str) -> String {
    format!("No merge requests found for the source branch ({})", branch)
}

/// Extract the merge request IID from tool arguments.
///
/// Accepts a JSON number with no fractional part or a numeric string.
fn parse_iid(arguments: Option<&Value>) -> Result<u64> {
    let value = arguments
        .and_then(|args| args.get(IID_ARG))
        .filter(|v| !v.is_null())
        .ok_or_else(|| Error::InvalidInput("Merge request ID is required".to_string()))?;

    let iid = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    iid.filter(|iid| *iid > 0).ok_or_else(|| {
        Error::InvalidInput("Merge request ID must be a positive integer".to_string())
    })
}
