//! The writer: executes a plan against a content source.
//!
//! One item is fully processed (fetch, write, index update, checkpoint)
//! before the next begins. The adapters talk to rate-limited, stateful
//! remote sessions, so the pipeline is deliberately sequential.
//!
//! The index is checkpoint-persisted after every successful write, so an
//! interrupted run resumes cleanly: the next invocation re-plans and skips
//! everything that already completed.

use std::fs;
use std::path::Path;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sync::file::atomic_write;
use crate::sync::index::{ExportIndex, IndexEntry};
use crate::sync::planner::PlannedAction;
use crate::sync::source::{ContentSource, RemoteItem, SourceError};

/// One item's failure, aggregated into the end-of-run report.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub id: String,
    pub title: String,
    pub cause: String,
}

/// Aggregate outcome of one export run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    /// Total number of planned items this run covered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.skipped + self.created + self.updated + self.failures.len()
    }

    /// Whether every planned item succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Executes planned actions for one export target.
pub struct Writer<'a> {
    source: &'a mut dyn ContentSource,
    index: &'a mut ExportIndex,
    target_dir: &'a Path,
}

impl<'a> Writer<'a> {
    pub fn new(
        source: &'a mut dyn ContentSource,
        index: &'a mut ExportIndex,
        target_dir: &'a Path,
    ) -> Self {
        Self {
            source,
            index,
            target_dir,
        }
    }

    /// Execute every action in the plan, in order.
    ///
    /// Per-item fetch and write failures are caught at this boundary,
    /// recorded, and do not stop the run. Authentication failures and index
    /// persistence failures are fatal and abort immediately.
    ///
    /// # Errors
    ///
    /// `Error::AdapterAuth` if the source session dies; `Error::Io` (or a
    /// serialization error) if a checkpoint persist fails.
    pub fn run(&mut self, actions: Vec<PlannedAction>) -> Result<RunReport> {
        fs::create_dir_all(self.target_dir)?;

        let mut report = RunReport::default();

        for action in actions {
            match action {
                PlannedAction::Skip(item) => {
                    debug!(service = self.source.label(), title = %item.title, "skip (unchanged)");
                    report.skipped += 1;
                }
                PlannedAction::Create(item) => {
                    match self.export_item(&item, None)? {
                        Ok(()) => {
                            info!(service = self.source.label(), title = %item.title, "created");
                            report.created += 1;
                        }
                        Err(failure) => {
                            warn!(title = %failure.title, cause = %failure.cause, "item failed");
                            report.failures.push(failure);
                        }
                    }
                }
                PlannedAction::Update { item, prev } => {
                    match self.export_item(&item, Some(&prev))? {
                        Ok(()) => {
                            info!(service = self.source.label(), title = %item.title, "updated");
                            report.updated += 1;
                        }
                        Err(failure) => {
                            warn!(title = %failure.title, cause = %failure.cause, "item failed");
                            report.failures.push(failure);
                        }
                    }
                }
            }
        }

        // Final persist covers the only-skips case where no checkpoint ran
        // (e.g. a fresh target with an empty listing).
        self.index.persist(self.target_dir)?;

        Ok(report)
    }

    /// Process one Create/Update action.
    ///
    /// The outer `Result` is fatal (auth, index persistence); the inner one
    /// is the per-item outcome that feeds the aggregate report. The index is
    /// only touched after the output file is durably on disk.
    fn export_item(
        &mut self,
        item: &RemoteItem,
        prev: Option<&IndexEntry>,
    ) -> Result<std::result::Result<(), ItemFailure>> {
        let payload = match self.source.fetch_content(item) {
            Ok(payload) => payload,
            Err(SourceError::Auth(msg)) => return Err(Error::AdapterAuth(msg)),
            Err(SourceError::Fetch(msg)) => return Ok(Err(self.failure(item, msg))),
        };

        let new_path = self.target_dir.join(&payload.file_name);

        // Rename collision: the newly derived output path belongs to some
        // unrelated existing file. Fail closed rather than overwrite.
        let stale_path = prev
            .filter(|p| p.path != payload.file_name)
            .map(|p| self.target_dir.join(&p.path));
        if stale_path.is_some() && new_path.exists() {
            return Ok(Err(self.failure(
                item,
                format!(
                    "output path '{}' already exists and is not this item's previous export",
                    payload.file_name
                ),
            )));
        }

        if let Err(e) = atomic_write(&new_path, &payload.content) {
            return Ok(Err(self.failure(item, format!("write failed: {e}"))));
        }

        // The old output goes away only after the new one is safely written.
        if let Some(old_path) = stale_path {
            if let Err(e) = fs::remove_file(&old_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %old_path.display(), "failed to remove stale output: {e}");
                }
            }
        }

        self.index.record(
            item.id.clone(),
            IndexEntry {
                fingerprint: item.fingerprint.clone(),
                path: payload.file_name,
                exported_at: Local::now().to_rfc2822(),
            },
        );

        // Checkpoint so an interrupted run keeps this item's progress.
        self.index.persist(self.target_dir)?;

        Ok(Ok(()))
    }

    fn failure(&self, item: &RemoteItem, cause: String) -> ItemFailure {
        ItemFailure {
            id: item.id.clone(),
            title: item.title.clone(),
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::planner::plan;
    use crate::sync::source::ContentPayload;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Scripted source: fixed listing, per-item payloads or failures.
    struct StubSource {
        listing: Vec<RemoteItem>,
        payloads: HashMap<String, ContentPayload>,
        failing: Vec<String>,
        fetch_calls: usize,
    }

    impl StubSource {
        fn new(items: &[(&str, &str)]) -> Self {
            let listing: Vec<RemoteItem> = items
                .iter()
                .map(|(id, fingerprint)| RemoteItem {
                    id: (*id).to_string(),
                    title: format!("Title {id}"),
                    fingerprint: (*fingerprint).to_string(),
                })
                .collect();
            let payloads = listing
                .iter()
                .map(|item| {
                    (
                        item.id.clone(),
                        ContentPayload {
                            file_name: format!("{}.md", item.title),
                            content: format!("# {}\n", item.title),
                        },
                    )
                })
                .collect();
            Self {
                listing,
                payloads,
                failing: Vec::new(),
                fetch_calls: 0,
            }
        }

        fn fail_item(mut self, id: &str) -> Self {
            self.failing.push(id.to_string());
            self
        }

        fn rename_item(mut self, id: &str, file_name: &str) -> Self {
            let payload = self.payloads.get_mut(id).unwrap();
            payload.file_name = file_name.to_string();
            self
        }
    }

    impl ContentSource for StubSource {
        fn label(&self) -> &'static str {
            "stub"
        }

        fn list_items(&mut self) -> std::result::Result<Vec<RemoteItem>, SourceError> {
            Ok(self.listing.clone())
        }

        fn fetch_content(
            &mut self,
            item: &RemoteItem,
        ) -> std::result::Result<ContentPayload, SourceError> {
            self.fetch_calls += 1;
            if self.failing.contains(&item.id) {
                return Err(SourceError::Fetch("network timeout".into()));
            }
            Ok(self.payloads[&item.id].clone())
        }
    }

    fn run_once(source: &mut StubSource, target: &Path, force: bool) -> RunReport {
        let mut index = ExportIndex::load(target).unwrap();
        let listing = source.list_items().unwrap();
        let actions = plan(listing, &index, force);
        Writer::new(source, &mut index, target).run(actions).unwrap()
    }

    #[test]
    fn test_fresh_run_creates_everything() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1"), ("B", "f2")]);

        let report = run_once(&mut source, temp_dir.path(), false);

        assert_eq!(report.created, 2);
        assert!(report.is_success());
        assert!(temp_dir.path().join("Title A.md").exists());
        assert!(temp_dir.path().join("Title B.md").exists());
        assert!(temp_dir.path().join(crate::sync::index::INDEX_FILE_NAME).exists());
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1"), ("B", "f2")]);

        run_once(&mut source, temp_dir.path(), false);
        let calls_after_first = source.fetch_calls;
        let report = run_once(&mut source, temp_dir.path(), false);

        assert_eq!(report.skipped, 2);
        assert_eq!(report.created + report.updated, 0);
        // No redundant fetches for unchanged items.
        assert_eq!(source.fetch_calls, calls_after_first);
    }

    #[test]
    fn test_force_refetches_unchanged_items() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1")]);

        run_once(&mut source, temp_dir.path(), false);
        let report = run_once(&mut source, temp_dir.path(), true);

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_partial_failure_isolation() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1"), ("B", "f2"), ("C", "f3")]).fail_item("B");

        let report = run_once(&mut source, temp_dir.path(), false);

        // A and C are written and indexed; B fails and leaves no trace.
        assert_eq!(report.created, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "B");
        assert!(temp_dir.path().join("Title A.md").exists());
        assert!(!temp_dir.path().join("Title B.md").exists());
        assert!(temp_dir.path().join("Title C.md").exists());

        let index = ExportIndex::load(temp_dir.path()).unwrap();
        assert!(index.lookup("A").is_some());
        assert!(index.lookup("B").is_none());
        assert!(index.lookup("C").is_some());
    }

    #[test]
    fn test_failed_item_keeps_prior_entry() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1")]);
        run_once(&mut source, temp_dir.path(), false);

        // Remote changes, but the fetch now fails: the old entry survives.
        let mut source = StubSource::new(&[("A", "f2")]).fail_item("A");
        let report = run_once(&mut source, temp_dir.path(), false);

        assert_eq!(report.failures.len(), 1);
        let index = ExportIndex::load(temp_dir.path()).unwrap();
        assert_eq!(index.lookup("A").unwrap().fingerprint, "f1");
    }

    #[test]
    fn test_crash_resumption_via_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1"), ("B", "f2")]);

        // Simulate a crash after A: execute only the first planned action.
        {
            let mut index = ExportIndex::load(temp_dir.path()).unwrap();
            let listing = source.list_items().unwrap();
            let mut actions = plan(listing, &index, false);
            actions.truncate(1);
            Writer::new(&mut source, &mut index, temp_dir.path())
                .run(actions)
                .unwrap();
            // index dropped here without any end-of-run persistence beyond
            // the per-item checkpoint
        }

        // A fresh run plans Skip for A and Create for B.
        let index = ExportIndex::load(temp_dir.path()).unwrap();
        let actions = plan(source.list_items().unwrap(), &index, false);
        assert!(matches!(actions[0], PlannedAction::Skip(_)));
        assert!(matches!(actions[1], PlannedAction::Create(_)));
    }

    #[test]
    fn test_rename_removes_old_output_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1")]);
        run_once(&mut source, temp_dir.path(), false);

        // The item's title-derived file name changes on the next pass.
        let mut source =
            StubSource::new(&[("A", "f2")]).rename_item("A", "Renamed Title.md");
        let report = run_once(&mut source, temp_dir.path(), false);

        assert_eq!(report.updated, 1);
        assert!(temp_dir.path().join("Renamed Title.md").exists());
        assert!(!temp_dir.path().join("Title A.md").exists());

        let index = ExportIndex::load(temp_dir.path()).unwrap();
        assert_eq!(index.lookup("A").unwrap().path, "Renamed Title.md");
    }

    #[test]
    fn test_rename_collision_fails_closed() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = StubSource::new(&[("A", "f1")]);
        run_once(&mut source, temp_dir.path(), false);

        // An unrelated file occupies the new output path.
        fs::write(temp_dir.path().join("Taken.md"), "not ours").unwrap();

        let mut source = StubSource::new(&[("A", "f2")]).rename_item("A", "Taken.md");
        let report = run_once(&mut source, temp_dir.path(), false);

        assert_eq!(report.failures.len(), 1);
        // Nothing overwritten, nothing removed, index untouched.
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Taken.md")).unwrap(),
            "not ours"
        );
        assert!(temp_dir.path().join("Title A.md").exists());
        let index = ExportIndex::load(temp_dir.path()).unwrap();
        assert_eq!(index.lookup("A").unwrap().fingerprint, "f1");
    }
}
