//! Grouping of review notes into per-file, per-line threads.

use std::collections::BTreeMap;

use glreview_core::{Note, Position};
use tracing::debug;

/// Path used when a positioned note has no `new_path`.
pub const UNKNOWN_PATH: &str = "Unknown";

/// Group key for notes on a file as a whole.
pub const GENERAL_GROUP: &str = "general";

/// File path → group key → notes in API order.
///
/// Both levels iterate in sorted key order.
pub type CommentThreads = BTreeMap<String, BTreeMap<String, Vec<Note>>>;

/// Group key for a position: line code, then `line_<N>`, then `general`.
pub fn group_key(position: &Position) -> String {
    if let Some(code) = position.line_code() {
        code.to_string()
    } else if let Some(line) = position.new_line {
        format!("line_{}", line)
    } else {
        GENERAL_GROUP.to_string()
    }
}

/// Group reviewable notes into threads.
///
/// System notes and notes without a position are dropped. Never fails.
pub fn group_notes(notes: &[Note]) -> CommentThreads {
    let mut threads = CommentThreads::new();

    for note in notes {
        let Some(position) = note.review_position() else {
            continue;
        };

        let path = position
            .new_path
            .clone()
            .unwrap_or_else(|| UNKNOWN_PATH.to_string());

        threads
            .entry(path)
            .or_default()
            .entry(group_key(position))
            .or_default()
            .push(note.clone());
    }

    debug!(notes = notes.len(), files = threads.len(), "Grouped notes into threads");
    threads
}
