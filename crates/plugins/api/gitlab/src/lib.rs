//! GitLab client for glreview.
//!
//! Read-only access to the two endpoints the review tools need: merge
//! requests by source branch and the (paginated) notes of a merge request.

mod client;
mod transport;

pub use client::{GitLabClient, NOTES_PER_PAGE};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
