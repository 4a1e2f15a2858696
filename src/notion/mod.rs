//! Notion workspace export transformer.
//!
//! Takes the zip Notion produces for a full workspace export and turns it
//! into a clean directory tree: readable file names derived from page
//! headings, intra-workspace links rewritten to the new names, database
//! pages prefixed with their database ID, and a per-directory index file.

pub mod archive;
pub mod entry;
pub mod export;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// Options for the export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Replace an existing target directory instead of refusing to run.
    pub force: bool,
    /// Remove the source archive after a successful export.
    pub clean: bool,
}

/// Transform a workspace export archive into `target`.
///
/// # Errors
///
/// `Error::InvalidSource` for a malformed archive or an existing target
/// without `force`, `Error::Io` for filesystem failures.
pub fn export(source: &Path, target: &Path, options: ExportOptions) -> Result<()> {
    let extracted = archive::extract(source)?;

    let mut root = export::scan_directory(&extracted.data_dir, None)?;
    let mut targets = BTreeMap::new();
    entry::assign_suffixes(&mut root, &mut targets)?;
    info!(entries = targets.len(), "scanned notion export");

    if target.exists() {
        if !options.force {
            return Err(Error::InvalidSource(format!(
                "target path {} already exists; pass --force to replace it",
                target.display()
            )));
        }
        info!(target = %target.display(), "removing existing target");
        if target.is_dir() {
            fs::remove_dir_all(target)?;
        } else {
            fs::remove_file(target)?;
        }
    }

    info!(target = %target.display(), "exporting notion data");
    export::build_target(target, &extracted.uid, &root, &targets)?;

    extracted.cleanup()?;

    if options.clean {
        info!(source = %source.display(), "removing source archive");
        fs::remove_file(source)?;
    }

    Ok(())
}
