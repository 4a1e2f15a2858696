//! Incremental export synchronization.
//!
//! The mechanism shared by the Audible and Kindle exports: given the current
//! remote listing and a persisted per-target index, decide for each item
//! whether to skip it (already exported, unchanged), update it (stale or
//! forced), or create it fresh, then execute those decisions one item at a
//! time, checkpointing the index after every successful write.
//!
//! # Pipeline
//!
//! 1. An adapter implementing [`ContentSource`] lists the remote library.
//! 2. [`planner::plan`] turns (listing, [`ExportIndex`], force) into ordered
//!    [`PlannedAction`]s. Pure, no I/O.
//! 3. [`Writer`] executes each action: fetch, atomic write, index record,
//!    checkpoint persist. Per-item failures are aggregated, never fatal.
//!
//! # Index format
//!
//! `index.toml` in the export target directory, one table per item identity
//! holding the last-exported fingerprint, output path, and timestamp.

pub mod file;
pub mod hash;
pub mod index;
pub mod planner;
pub mod source;
pub mod writer;

pub use hash::content_hash;
pub use index::{ExportIndex, IndexEntry, INDEX_FILE_NAME};
pub use planner::{plan, PlannedAction};
pub use source::{ContentPayload, ContentSource, RemoteItem, SourceError};
pub use writer::{ItemFailure, RunReport, Writer};
