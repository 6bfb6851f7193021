//! GitLab merge request and note types.
//!
//! These mirror the JSON returned by GitLab REST API v4 closely enough to be
//! decoded directly. Optional nested objects are named structs wrapped in
//! `Option` so that `null` and a missing key mean the same thing.

use serde::{Deserialize, Serialize};

// =============================================================================
// Merge Request
// =============================================================================

/// Author as embedded in a merge request. GitLab may send `username: null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeRequestAuthor {
    #[serde(default)]
    pub username: Option<String>,
}

/// A merge request, identified externally by its `iid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub web_url: String,
    pub source_branch: String,
    pub target_branch: String,
    pub state: String,
    #[serde(default)]
    pub author: Option<MergeRequestAuthor>,
}

impl MergeRequest {
    /// Description text, or `None` when it is null or empty.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Author username if both the author and the username are present.
    pub fn author_username(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.username.as_deref())
    }
}

// =============================================================================
// Notes
// =============================================================================

/// Author of a note. Always present on notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteAuthor {
    pub username: String,
}

/// One endpoint of a diff line range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    #[serde(default)]
    pub line_code: Option<String>,
}

/// Line range a multi-line diff comment covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineRange {
    #[serde(default)]
    pub start: Option<LinePoint>,
}

/// Where a note attaches in the diff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub new_line: Option<u32>,
    #[serde(default)]
    pub line_range: Option<LineRange>,
}

impl Position {
    /// Line code of the range start, ignoring empty strings.
    pub fn line_code(&self) -> Option<&str> {
        self.line_range
            .as_ref()
            .and_then(|r| r.start.as_ref())
            .and_then(|s| s.line_code.as_deref())
            .filter(|code| !code.is_empty())
    }
}

/// A note (comment) on a merge request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub body: String,
    pub author: NoteAuthor,
    #[serde(default)]
    pub system: bool,
    pub created_at: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub position: Option<Position>,
}

impl Note {
    /// Position of a note worth showing to a reviewer.
    ///
    /// System notes and notes without a position carry nothing to review
    /// and yield `None`.
    pub fn review_position(&self) -> Option<&Position> {
        if self.system {
            return None;
        }
        self.position.as_ref()
    }
}
