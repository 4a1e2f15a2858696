//! Transformation of an extracted Notion export into the target tree.
//!
//! Three passes: scan the extracted tree into a [`Directory`] model, assign
//! duplicate-name suffixes while collecting link targets, then build the
//! target directory with rewritten links and a per-directory index file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::sync::file::atomic_write;

use super::entry::{
    self, Asset, Directory, Entry, EntryKind, LinkTarget, parse_item_name,
};

/// Name of the per-directory index written into the target tree.
pub const INDEX_FILE_NAME: &str = "index.toml";

/// A link to another entry starts a Markdown link (`[..](`), a plain
/// parenthesized reference (` (`), or continues a path (`/`), followed by
/// the entry name with `%20` escapes and its 32-char uid.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[.+\]\(| \(|/)([^/\n\x00]+)%20([0-9a-f]{32})").unwrap());

/// Scan an extracted export directory into the entry model.
///
/// `parent_db` carries the ID column info of the enclosing database view
/// when scanning a database's page directory.
///
/// # Errors
///
/// `Error::InvalidSource` for files that break the export conventions.
pub fn scan_directory(
    path: &Path,
    parent_db: Option<(bool, Option<&str>)>,
) -> Result<Directory> {
    let mut directory = Directory::default();
    // (uid, name, path) of subdirectories, attached after all files are in.
    let mut subdirs = Vec::new();

    for child in fs::read_dir(path)? {
        let child_path = child?.path();
        let file_name = child_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let Some(item) = parse_item_name(&file_name) else {
            directory.assets.push(Asset {
                name: file_name,
                path: child_path,
            });
            continue;
        };

        let name = item.name.to_string();
        let uid = item.uid.to_string();

        match item.extension {
            None => subdirs.push((uid, name, child_path)),
            Some("md") => {
                // Notion truncates long file names; the heading is the real
                // page name.
                let content = read_page(&child_path)?;
                let heading = entry::find_heading(&content).map_err(|e| {
                    Error::InvalidSource(format!("{}: {e}", child_path.display()))
                })?;

                let kind = match parent_db {
                    None => EntryKind::Page,
                    Some((false, _)) => EntryKind::DatabasePage { db_id: None },
                    Some((true, id_prefix)) => {
                        // Rows of a database with an ID column must name
                        // their ID; titles alone are not unique.
                        let db_id = entry::database_id_from_page(&content, id_prefix)
                            .ok_or_else(|| {
                                Error::InvalidSource(format!(
                                    "unable to find a database id with prefix {:?} in {}",
                                    id_prefix,
                                    child_path.display()
                                ))
                            })?;
                        EntryKind::DatabasePage { db_id: Some(db_id) }
                    }
                };

                directory.entries.insert(
                    uid.clone(),
                    Entry {
                        uid,
                        name: heading,
                        name_ori: Some(name),
                        name_suffix: None,
                        path: child_path,
                        kind,
                        subdir: None,
                    },
                );
            }
            Some("csv") => {
                // A database can export two CSVs for the same view; the
                // `_all` one (full, unfiltered) wins.
                if directory.entries.contains_key(&uid) && !item.is_all {
                    continue;
                }

                let (has_id_column, id_prefix) = if item.is_all {
                    let content = read_page(&child_path)?;
                    entry::database_id_info(&content)
                } else {
                    (false, None)
                };

                directory.entries.insert(
                    uid.clone(),
                    Entry {
                        uid,
                        name,
                        name_ori: None,
                        name_suffix: None,
                        path: child_path,
                        kind: EntryKind::DatabaseView {
                            is_all: item.is_all,
                            has_id_column,
                            id_prefix,
                        },
                        subdir: None,
                    },
                );
            }
            Some(other) => {
                return Err(Error::InvalidSource(format!(
                    "unexpected file extension '{other}' on {}",
                    child_path.display()
                )));
            }
        }
    }

    for (uid, name, subdir_path) in subdirs {
        let Some(parent_entry) = directory.entries.get(&uid) else {
            return Err(Error::InvalidSource(format!(
                "no entry found for directory {}",
                subdir_path.display()
            )));
        };
        if name != parent_entry.original_name() {
            return Err(Error::InvalidSource(format!(
                "directory name '{name}' does not match entry name '{}' for {}",
                parent_entry.name,
                subdir_path.display()
            )));
        }

        let child_db = match &parent_entry.kind {
            EntryKind::DatabaseView {
                has_id_column,
                id_prefix,
                ..
            } => Some((*has_id_column, id_prefix.as_deref())),
            _ => None,
        };
        let subdir = scan_directory(&subdir_path, child_db)?;

        if let Some(parent_entry) = directory.entries.get_mut(&uid) {
            parent_entry.subdir = Some(subdir);
        }
    }

    Ok(directory)
}

/// Build the target tree from a scanned directory.
///
/// # Errors
///
/// `Error::Io` on copy/write failures, `Error::InvalidSource` for link
/// inconsistencies.
pub fn build_target(
    target: &Path,
    uid: &str,
    directory: &Directory,
    targets: &BTreeMap<String, LinkTarget>,
) -> Result<()> {
    fs::create_dir_all(target)?;
    let mut index = IndexDir {
        uid: uid.to_string(),
        ..IndexDir::default()
    };

    // Asset names are guaranteed unique by the export format.
    for asset in &directory.assets {
        index.assets.push(IndexAsset {
            name: asset.name.clone(),
        });
        fs::copy(&asset.path, target.join(&asset.name))?;
    }

    for entry in directory.entries.values() {
        let exported_name = entry.exported_name();

        match &entry.kind {
            EntryKind::Page | EntryKind::DatabasePage { .. } => {
                let file_name = format!("{exported_name}.md");
                let target_path = target.join(&file_name);
                index.pages.push(IndexItem {
                    uid: entry.uid.clone(),
                    name: file_name,
                });

                let content = read_page(&entry.path)?;
                let mut rewritten = rewrite_links(&content, targets)
                    .map_err(|e| Error::InvalidSource(format!("{}: {e}", entry.path.display())))?;

                // Database pages with an ID get the same prefix on their
                // heading as on their file name.
                if let EntryKind::DatabasePage { db_id: Some(db_id) } = &entry.kind {
                    rewritten = replace_heading(
                        &rewritten,
                        &format!("{db_id}{} {}", entry::DATABASE_ID_SEPARATOR, entry.name),
                    );
                }

                atomic_write(&target_path, &rewritten)?;
            }
            EntryKind::DatabaseView { .. } => {
                let file_name = format!("{exported_name}.csv");
                index.databases.push(IndexItem {
                    uid: entry.uid.clone(),
                    name: file_name.clone(),
                });
                fs::copy(&entry.path, target.join(&file_name))?;
            }
        }

        if let Some(subdir) = &entry.subdir {
            let subdir_target = target.join(&exported_name);
            debug!(dir = %subdir_target.display(), "building subdirectory");
            build_target(&subdir_target, &entry.uid, subdir, targets)?;
        }
    }

    let index_content = toml::to_string(&index)?;
    atomic_write(&target.join(INDEX_FILE_NAME), &index_content)?;
    Ok(())
}

/// Rewrite entry links to their exported names.
///
/// A link whose uid is unknown keeps its name and drops the uid; this
/// happens for database views that were not part of the export (Notion only
/// exports the current or default view).
///
/// # Errors
///
/// `Error::InvalidSource` if a link's name does not match the entry it
/// points to.
pub fn rewrite_links(
    content: &str,
    targets: &BTreeMap<String, LinkTarget>,
) -> Result<String> {
    let mut failure: Option<Error> = None;

    let rewritten = LINK_RE.replace_all(content, |caps: &Captures<'_>| {
        let prefix = &caps[1];
        let name = &caps[2];
        let uid = &caps[3];

        let Some(target) = targets.get(uid) else {
            warn!(uid, name, "link points to an entry missing from the export");
            return format!("{prefix}{name}");
        };

        if name != target.original_name.replace(' ', "%20") {
            if failure.is_none() {
                failure = Some(Error::InvalidSource(format!(
                    "inconsistent link name for entry {uid}: expected '{}', found '{name}'",
                    target.original_name
                )));
            }
            return caps[0].to_string();
        }

        format!("{prefix}{}", target.exported_name.replace(' ', "%20"))
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(rewritten.into_owned()),
    }
}

fn replace_heading(content: &str, heading: &str) -> String {
    match content.split_once('\n') {
        Some((_, rest)) => format!("# {heading}\n{rest}"),
        None => format!("# {heading}\n"),
    }
}

/// Notion sometimes emits pages in legacy encodings; anything that is not
/// UTF-8 is converted lossily rather than failing the export.
fn read_page(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ── Per-directory index ───────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct IndexDir {
    uid: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assets: Vec<IndexAsset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    databases: Vec<IndexItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pages: Vec<IndexItem>,
}

#[derive(Debug, Serialize)]
struct IndexAsset {
    name: String,
}

#[derive(Debug, Serialize)]
struct IndexItem {
    uid: String,
    name: String,
}
