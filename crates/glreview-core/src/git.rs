//! Current branch detection.
//!
//! Tool handlers only see the [`BranchDetector`] trait, so tests can supply
//! a fixed branch instead of shelling out to `git`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

/// Source of the branch name the user currently has checked out.
#[async_trait]
pub trait BranchDetector: Send + Sync {
    /// Return the current branch name.
    async fn current_branch(&self) -> Result<String>;
}

/// Detects the branch by running `git rev-parse --abbrev-ref HEAD`.
#[derive(Debug, Clone, Default)]
pub struct GitBranchDetector {
    workdir: Option<PathBuf>,
}

impl GitBranchDetector {
    /// Detector that runs `git` in the process working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector that runs `git` in `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl BranchDetector for GitBranchDetector {
    async fn current_branch(&self) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-parse", "--abbrev-ref", "HEAD"]);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| Error::Branch(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("git rev-parse failed: {}", output.status)
            } else {
                stderr
            };
            return Err(Error::Branch(message));
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(branch = %branch, "Detected current branch");
        Ok(branch)
    }
}
