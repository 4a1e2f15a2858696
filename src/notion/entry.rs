//! Entry model for a Notion workspace export.
//!
//! Notion names every exported file and directory `<name> <uid32>` with an
//! optional `_all` marker and `.md`/`.csv` extension. Anything that does not
//! match that shape is an asset (images and other attachments).

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::util::sanitize_file_stem;

/// Page names longer than this are cut off. Measured before any database-ID
/// prefix or duplicate-name suffix.
pub const MAX_PAGE_NAME_LENGTH: usize = 128;

/// Separator between a database ID prefix and the page name.
pub const DATABASE_ID_SEPARATOR: char = '.';

/// Column that holds the unique ID of a database, when the database has one.
pub const DATABASE_ID_COLUMN: &str = "ID";

static ITEM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) ([0-9a-f]{32})(_all)?(?:\.(md|csv))?$").unwrap());

/// IDs follow the Notion app rules: an optional uppercase prefix ending in a
/// dash, then digits. "XYZ-123" has prefix "XYZ-".
static DATABASE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z0-9\-]*-)?[0-9]+$").unwrap());

/// A parsed `<name> <uid32>[_all][.ext]` file name.
#[derive(Debug, PartialEq, Eq)]
pub struct ItemName<'a> {
    pub name: &'a str,
    pub uid: &'a str,
    pub is_all: bool,
    pub extension: Option<&'a str>,
}

/// Split an exported file name into its parts, or `None` for assets.
#[must_use]
pub fn parse_item_name(file_name: &str) -> Option<ItemName<'_>> {
    let caps = ITEM_NAME_RE.captures(file_name)?;
    Some(ItemName {
        name: caps.get(1)?.as_str(),
        uid: caps.get(2)?.as_str(),
        is_all: caps.get(3).is_some(),
        extension: caps.get(4).map(|m| m.as_str()),
    })
}

#[derive(Debug)]
pub enum EntryKind {
    /// A Markdown page.
    Page,
    /// A database view (CSV).
    DatabaseView {
        /// Whether this is the full unfiltered view (`_all` file). Only
        /// those carry ID column information.
        is_all: bool,
        has_id_column: bool,
        id_prefix: Option<String>,
    },
    /// A page that is a row of a database.
    DatabasePage { db_id: Option<String> },
}

pub struct Entry {
    pub uid: String,
    /// Display name; for pages this is the Markdown heading, not the
    /// (possibly truncated) name Notion put in the file name.
    pub name: String,
    /// Name as it appears in the source file name, when it differs from
    /// `name`. Links in other pages reference this.
    pub name_ori: Option<String>,
    /// Suffix like " (1)" assigned when several entries in one directory
    /// share a name.
    pub name_suffix: Option<String>,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub subdir: Option<Directory>,
}

impl Entry {
    /// Name before output sanitization, so links can be matched against it.
    #[must_use]
    pub fn original_name(&self) -> &str {
        self.name_ori.as_deref().unwrap_or(&self.name)
    }

    /// The output file stem, without extension.
    #[must_use]
    pub fn exported_name(&self) -> String {
        let mut name = sanitize_file_stem(&self.name);

        if name.chars().count() > MAX_PAGE_NAME_LENGTH {
            name = name.chars().take(MAX_PAGE_NAME_LENGTH).collect();
        }
        if let Some(suffix) = &self.name_suffix {
            name.push_str(suffix);
        }

        if let EntryKind::DatabasePage { db_id: Some(db_id) } = &self.kind {
            format!("{db_id}{DATABASE_ID_SEPARATOR} {name}")
        } else {
            name
        }
    }
}

pub struct Asset {
    pub name: String,
    pub path: PathBuf,
}

/// One directory of the export tree. Entries are keyed by uid; the map
/// ordering doubles as the deterministic processing order.
#[derive(Default)]
pub struct Directory {
    pub entries: BTreeMap<String, Entry>,
    pub assets: Vec<Asset>,
}

/// A link target: how pages refer to an entry and what to rewrite it to.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    pub original_name: String,
    pub exported_name: String,
}

/// Assign duplicate-name suffixes and collect every entry of the tree into
/// a uid → link-target map.
///
/// Suffixes go by uid order, which is stable per export but not
/// timestamp-ordered; database pages with an ID skip deduplication since the
/// ID prefix already makes them unique.
///
/// # Errors
///
/// `Error::InvalidSource` if two entries share a uid.
pub fn assign_suffixes(
    directory: &mut Directory,
    targets: &mut BTreeMap<String, LinkTarget>,
) -> Result<()> {
    let mut name_counts: HashMap<String, usize> = HashMap::new();

    for entry in directory.entries.values_mut() {
        let has_db_id = matches!(&entry.kind, EntryKind::DatabasePage { db_id: Some(_) });
        if !has_db_id {
            let count = name_counts.entry(entry.name.clone()).or_insert(0);
            if *count > 0 {
                entry.name_suffix = Some(format!(" ({count})"));
            }
            *count += 1;
        }

        let target = LinkTarget {
            original_name: entry.original_name().to_string(),
            exported_name: entry.exported_name(),
        };
        if targets.insert(entry.uid.clone(), target).is_some() {
            return Err(Error::InvalidSource(format!(
                "found two entries with the same uid {} ({})",
                entry.uid,
                entry.path.display()
            )));
        }

        if let Some(subdir) = &mut entry.subdir {
            assign_suffixes(subdir, targets)?;
        }
    }

    Ok(())
}

/// Extract the page name from a Markdown page's first line.
///
/// Notion truncates file names, so the `# ` heading is the authoritative
/// page name.
///
/// # Errors
///
/// `Error::InvalidSource` if the file does not start with a heading.
pub fn find_heading(content: &str) -> Result<String> {
    let first_line = content.lines().next().unwrap_or_default().trim_end();
    first_line.strip_prefix("# ").map_or_else(
        || {
            Err(Error::InvalidSource(format!(
                "page does not start with a heading, first line: '{first_line}'"
            )))
        },
        |heading| Ok(heading.to_string()),
    )
}

/// Inspect a database CSV for a usable ID column.
///
/// The column must be named "ID", all values must be non-empty and follow
/// the ID pattern; otherwise it is treated as an ordinary column (someone
/// may name a plain text column "ID"). Returns the detection flag and the
/// shared prefix taken from the first row.
#[must_use]
pub fn database_id_info(csv: &str) -> (bool, Option<String>) {
    let mut rows = parse_csv(csv).into_iter();
    let Some(header) = rows.next() else {
        return (false, None);
    };
    let Some(id_col) = header.iter().position(|col| col == DATABASE_ID_COLUMN) else {
        return (false, None);
    };

    let mut prefix = None;
    let mut seen_rows = false;
    for row in rows {
        let Some(value) = row.get(id_col) else {
            return (false, None);
        };
        let Some(caps) = DATABASE_ID_RE.captures(value) else {
            return (false, None);
        };
        if !seen_rows {
            prefix = caps.get(1).map(|m| m.as_str().to_string());
            seen_rows = true;
        }
    }

    // An empty database cannot vouch for its ID column.
    if seen_rows { (true, prefix) } else { (false, None) }
}

/// Find the database ID of a page from its `ID: ...` property line.
///
/// The page must start with a heading and a blank line; property lines
/// follow. When the parent database IDs share a prefix, only values with
/// that prefix count.
#[must_use]
pub fn database_id_from_page(content: &str, id_prefix: Option<&str>) -> Option<String> {
    let column_prefix = format!("{DATABASE_ID_COLUMN}: ");
    let expected_prefix = match id_prefix {
        Some(prefix) => format!("{column_prefix}{prefix}"),
        None => column_prefix.clone(),
    };

    for line in content.lines().skip(2) {
        if !line.starts_with(&expected_prefix) {
            continue;
        }
        let id = line[column_prefix.len()..].trim();
        if DATABASE_ID_RE.is_match(id) {
            return Some(id.to_string());
        }
    }

    None
}

/// Minimal quote-aware CSV reader, enough for the ID column check. Handles
/// quoted fields, escaped quotes, and newlines inside quotes.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(ch),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID_A: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_parse_item_name() {
        let name = format!("My Page {UID_A}.md");
        let parsed = parse_item_name(&name).unwrap();
        assert_eq!(parsed.name, "My Page");
        assert_eq!(parsed.uid, UID_A);
        assert!(!parsed.is_all);
        assert_eq!(parsed.extension, Some("md"));

        let name = format!("Tasks {UID_A}_all.csv");
        let parsed = parse_item_name(&name).unwrap();
        assert!(parsed.is_all);
        assert_eq!(parsed.extension, Some("csv"));

        let name = format!("Tasks {UID_A}");
        let parsed = parse_item_name(&name).unwrap();
        assert_eq!(parsed.extension, None);

        // Assets do not match.
        assert!(parse_item_name("diagram.png").is_none());
    }

    #[test]
    fn test_exported_name_with_suffix_and_db_id() {
        let mut entry = Entry {
            uid: UID_A.into(),
            name: "Plan: 2023".into(),
            name_ori: None,
            name_suffix: Some(" (1)".into()),
            path: PathBuf::new(),
            kind: EntryKind::Page,
            subdir: None,
        };
        assert_eq!(entry.exported_name(), "Plan - 2023 (1)");

        entry.name_suffix = None;
        entry.kind = EntryKind::DatabasePage {
            db_id: Some("TASK-12".into()),
        };
        assert_eq!(entry.exported_name(), "TASK-12. Plan - 2023");
    }

    #[test]
    fn test_exported_name_truncates_long_names() {
        let entry = Entry {
            uid: UID_A.into(),
            name: "x".repeat(200),
            name_ori: None,
            name_suffix: None,
            path: PathBuf::new(),
            kind: EntryKind::Page,
            subdir: None,
        };
        assert_eq!(entry.exported_name().len(), MAX_PAGE_NAME_LENGTH);
    }

    #[test]
    fn test_assign_suffixes_deduplicates_by_uid_order() {
        let mut dir = Directory::default();
        for (i, uid) in ["a".repeat(32), "b".repeat(32), "c".repeat(32)]
            .into_iter()
            .enumerate()
        {
            dir.entries.insert(
                uid.clone(),
                Entry {
                    uid,
                    name: "Notes".into(),
                    name_ori: None,
                    name_suffix: None,
                    path: PathBuf::from(format!("Notes {i}")),
                    kind: EntryKind::Page,
                    subdir: None,
                },
            );
        }

        let mut targets = BTreeMap::new();
        assign_suffixes(&mut dir, &mut targets).unwrap();

        let names: Vec<String> = dir.entries.values().map(Entry::exported_name).collect();
        assert_eq!(names, vec!["Notes", "Notes (1)", "Notes (2)"]);
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn test_find_heading() {
        assert_eq!(find_heading("# My Page\n\nBody").unwrap(), "My Page");
        assert!(find_heading("No heading here").is_err());
    }

    #[test]
    fn test_database_id_info_detects_prefix() {
        let csv = "Name,ID,Status\nTask one,TASK-1,Open\n\"Two, quoted\",TASK-2,Done\n";
        assert_eq!(database_id_info(csv), (true, Some("TASK-".into())));
    }

    #[test]
    fn test_database_id_info_rejects_invalid_columns() {
        // Not every "ID" column is an ID column.
        let csv = "Name,ID\nTask,not-an-id\n";
        assert_eq!(database_id_info(csv), (false, None));

        // No prefix is fine.
        let csv = "Name,ID\nTask,7\n";
        assert_eq!(database_id_info(csv), (true, None));

        // Empty databases cannot be checked.
        let csv = "Name,ID\n";
        assert_eq!(database_id_info(csv), (false, None));
    }

    #[test]
    fn test_database_id_from_page() {
        let content = "# Task one\n\nStatus: Open\nID: TASK-1\n";
        assert_eq!(
            database_id_from_page(content, Some("TASK-")),
            Some("TASK-1".into())
        );
        // Prefix mismatch means no ID.
        assert_eq!(database_id_from_page(content, Some("BUG-")), None);
        assert_eq!(database_id_from_page("# T\n\nBody\n", None), None);
    }
}
