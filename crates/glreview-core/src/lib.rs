//! Core types, configuration, and error handling for glreview.
//!
//! This crate provides the foundational abstractions shared by the GitLab
//! client, the threading pipeline, and the MCP server.

pub mod config;
pub mod error;
pub mod git;
pub mod types;

pub use config::{Config, GitLabConfig, Settings};
pub use error::{Error, Result};
pub use git::{BranchDetector, GitBranchDetector};
pub use types::{LinePoint, LineRange, MergeRequest, MergeRequestAuthor, Note, NoteAuthor, Position};
