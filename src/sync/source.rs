//! The content-source capability consumed by the sync pipeline.
//!
//! Each service adapter (Audible, Kindle) implements [`ContentSource`]: it
//! can list the remote library as cheap metadata snapshots and fetch the
//! full content for one item on demand. The planner and writer are written
//! against this trait, never against a specific service.

use thiserror::Error;

/// One item as seen in the remote listing.
///
/// An immutable snapshot for the duration of a sync pass. The `fingerprint`
/// is any value that changes whenever the underlying content changes; the
/// adapters use a content hash of the item's remote metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Stable identity assigned by the source service (e.g. an ASIN).
    pub id: String,
    /// Display title, used for progress output and failure reports.
    pub title: String,
    /// Change-detection value; compared against the indexed fingerprint.
    pub fingerprint: String,
}

/// Fully fetched and rendered content for one item.
#[derive(Debug, Clone)]
pub struct ContentPayload {
    /// Output file name relative to the export target directory.
    pub file_name: String,
    /// Rendered Markdown content.
    pub content: String,
}

/// Errors surfaced by a content source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Authentication or session failure. Fatal for the run: nothing can be
    /// fetched without a session, so this is surfaced immediately instead of
    /// being retried per item.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Failure to retrieve one item's content (transient network error,
    /// not-found, unparseable response). Isolated to that item.
    #[error("{0}")]
    Fetch(String),
}

/// A service that can enumerate remote items and fetch their content.
///
/// Listing may require prior authentication; how a session is established is
/// the adapter's concern. Implementations take `&mut self` because the
/// underlying HTTP sessions are stateful.
pub trait ContentSource {
    /// Short service name for logs and summaries (e.g. `"audible"`).
    fn label(&self) -> &'static str;

    /// List the remote library as metadata snapshots.
    ///
    /// # Errors
    ///
    /// `SourceError::Auth` if the session is invalid; `SourceError::Fetch`
    /// if the listing itself cannot be retrieved (also fatal for the run,
    /// since no plan can be built without it).
    fn list_items(&mut self) -> Result<Vec<RemoteItem>, SourceError>;

    /// Fetch and render the full content for one item.
    ///
    /// # Errors
    ///
    /// `SourceError::Fetch` for per-item failures; `SourceError::Auth` if
    /// the session died mid-run.
    fn fetch_content(&mut self, item: &RemoteItem) -> Result<ContentPayload, SourceError>;
}
