//! Comment threading and text rendering for glreview.
//!
//! Turns raw merge request data into text an LLM (or a human) can read:
//!
//! - **Threads**: group review notes by file and diff line
//! - **Render**: flat note listings, per-file thread blocks, MR summaries
//!
//! # Example
//!
//! ```ignore
//! use glreview_pipeline::{group_notes, render_threads};
//!
//! let threads = group_notes(&notes);
//! for block in render_threads(&threads) {
//!     println!("{}", block);
//! }
//! ```

pub mod render;
pub mod threads;

pub use render::{
    render_flat_listing, render_merge_request_summary, render_summary_header, render_threads,
};
pub use threads::{group_key, group_notes, CommentThreads, GENERAL_GROUP, UNKNOWN_PATH};
