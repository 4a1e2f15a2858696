//! Validation and extraction of Notion workspace export archives.
//!
//! A full workspace export is a zip named
//! `<uuid36>_Export-<uuid36>.zip` that contains one or more part zips named
//! `Export-<uuid36>-Part-<n>.zip`. All parts share the export uid and
//! extract into a common `Export-<uuid36>/` directory.

use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};

const UUID_36: &str = "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{UUID_36}_Export-{UUID_36}\\.zip$")).unwrap());
static PART_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^Export-({UUID_36})-Part-[0-9]+\\.zip$")).unwrap());

/// An export extracted into a scratch directory.
pub struct ExtractedExport {
    /// Export uid with the dashes removed, matching the 32-char uids used
    /// in entry file names.
    pub uid: String,
    /// Scratch directory holding everything, removed by [`Self::cleanup`].
    scratch_dir: PathBuf,
    /// Directory with the actual exported tree.
    pub data_dir: PathBuf,
}

impl ExtractedExport {
    /// Remove the scratch directory.
    ///
    /// # Errors
    ///
    /// `Error::Io` if the removal fails.
    pub fn cleanup(self) -> Result<()> {
        debug!(dir = %self.scratch_dir.display(), "removing scratch directory");
        fs::remove_dir_all(&self.scratch_dir)?;
        Ok(())
    }
}

/// Validate the source archive and extract all of its parts.
///
/// # Errors
///
/// `Error::InvalidSource` when the archive or its parts do not follow the
/// export naming scheme, `Error::Io` on extraction failures.
pub fn extract(source: &Path) -> Result<ExtractedExport> {
    if !source.exists() {
        return Err(Error::InvalidSource(format!(
            "source path {} does not exist",
            source.display()
        )));
    }
    let source_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !FULL_NAME_RE.is_match(source_name) {
        return Err(Error::InvalidSource(format!(
            "'{source_name}' is not a notion workspace export archive"
        )));
    }

    let scratch_dir = scratch_dir_path();
    if scratch_dir.exists() {
        info!(dir = %scratch_dir.display(), "removing stale scratch directory");
        fs::remove_dir_all(&scratch_dir)?;
    }
    fs::create_dir_all(&scratch_dir)?;

    unpack_zip(source, &scratch_dir)?;

    // The outer zip must only contain part zips.
    let mut part_paths = Vec::new();
    for child in fs::read_dir(&scratch_dir)? {
        let path = child?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "zip") {
            return Err(Error::InvalidSource(format!(
                "found unexpected non-zip content in export: {}",
                path.display()
            )));
        }
        part_paths.push(path);
    }
    if part_paths.is_empty() {
        return Err(Error::InvalidSource(
            "export archive contains no part zips".to_string(),
        ));
    }

    let mut export_uid: Option<String> = None;
    for part in &part_paths {
        let part_name = part
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let uid = PART_NAME_RE
            .captures(part_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                Error::InvalidSource(format!(
                    "part zip '{part_name}' does not follow the export naming scheme"
                ))
            })?;

        match &export_uid {
            Some(prev) if *prev != uid => {
                return Err(Error::InvalidSource(format!(
                    "inconsistent export uid across parts: {prev} vs {uid}"
                )));
            }
            Some(_) => {}
            None => export_uid = Some(uid),
        }

        info!(part = part_name, "extracting export part");
        unpack_zip(part, &scratch_dir)?;
    }

    // part_paths is non-empty, so the uid is set.
    let Some(export_uid) = export_uid else {
        return Err(Error::InvalidSource("export uid missing".to_string()));
    };

    let data_dir = scratch_dir.join(format!("Export-{export_uid}"));
    if !data_dir.exists() {
        return Err(Error::InvalidSource(format!(
            "extracted parts did not produce {}",
            data_dir.display()
        )));
    }

    // Rename to the dashless uid form used by entry file names.
    let uid = export_uid.replace('-', "");
    let renamed_data_dir = scratch_dir.join(format!("Export {uid}"));
    fs::rename(&data_dir, &renamed_data_dir)?;

    Ok(ExtractedExport {
        uid,
        scratch_dir,
        data_dir: renamed_data_dir,
    })
}

fn scratch_dir_path() -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    std::env::temp_dir()
        .join("ncli")
        .join(format!("notion-export-{stamp}"))
}

fn unpack_zip(archive_path: &Path, target: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| Error::InvalidSource(format!("{}: {e}", archive_path.display())))?;
    archive
        .extract(target)
        .map_err(|e| Error::InvalidSource(format!("{}: {e}", archive_path.display())))?;
    Ok(())
}
