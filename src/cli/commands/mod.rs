//! Command implementations.

pub mod audible;
pub mod completions;
pub mod kindle;
pub mod notion;
pub mod version;
pub mod youtube;

use std::path::Path;

use colored::Colorize;

use crate::error::{Error, Result};
use crate::sync::{plan, ContentSource, ExportIndex, RunReport, Writer};

/// Run one incremental export: list, plan, execute, report.
///
/// Shared by the Audible and Kindle commands. A run with per-item failures
/// still finishes the remaining items; the failures are then surfaced as
/// `Error::ItemFailures` so the exit code reflects them.
pub(crate) fn run_export(
    source: &mut dyn ContentSource,
    target: &Path,
    force: bool,
    quiet: bool,
) -> Result<()> {
    let label = source.label();

    // Index problems are local and fatal; surface them before touching
    // the network.
    let mut index = ExportIndex::load(target)?;
    let listing = source.list_items().map_err(Error::from)?;
    let actions = plan(listing, &index, force);

    let report = Writer::new(source, &mut index, target).run(actions)?;

    if !quiet {
        print_report(label, &report);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(Error::ItemFailures {
            count: report.failures.len(),
        })
    }
}

fn print_report(label: &str, report: &RunReport) {
    if report.total() == 0 {
        println!("{label}: library is empty, nothing to export.");
        return;
    }

    println!(
        "{label}: {} of {} items exported ({} skipped, {} created, {} updated)",
        (report.created + report.updated).to_string().green(),
        report.total(),
        report.skipped,
        report.created,
        report.updated,
    );

    if !report.failures.is_empty() {
        println!("{}", format!("{} failed:", report.failures.len()).red());
        for failure in &report.failures {
            println!("  {} {}: {}", "✗".red(), failure.title.bold(), failure.cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ContentPayload, RemoteItem, SourceError, INDEX_FILE_NAME};
    use std::fs;
    use tempfile::TempDir;

    /// Records whether the remote listing was ever requested.
    struct TracingSource {
        listed: bool,
    }

    impl ContentSource for TracingSource {
        fn label(&self) -> &'static str {
            "tracing"
        }

        fn list_items(&mut self) -> std::result::Result<Vec<RemoteItem>, SourceError> {
            self.listed = true;
            Ok(Vec::new())
        }

        fn fetch_content(
            &mut self,
            _item: &RemoteItem,
        ) -> std::result::Result<ContentPayload, SourceError> {
            Err(SourceError::Fetch("nothing listed".into()))
        }
    }

    #[test]
    fn test_corrupt_index_is_reported_before_listing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(INDEX_FILE_NAME), "not [valid toml").unwrap();

        let mut source = TracingSource { listed: false };
        let result = run_export(&mut source, temp_dir.path(), false, true);

        assert!(matches!(result, Err(Error::IndexCorrupt { .. })));
        assert!(!source.listed);
    }
}
