//! MCP (Model Context Protocol) server for glreview.
//!
//! Exposes the current Git branch and the review state of its GitLab merge
//! requests as tools for AI assistants.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod transport;

#[cfg(test)]
mod testing;

pub use handlers::ToolHandler;
pub use server::McpServer;
