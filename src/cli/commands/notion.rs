//! Notion export command.

use std::path::Path;

use crate::error::Result;
use crate::notion::{self, ExportOptions};

/// Execute `ncli notion export`.
///
/// # Errors
///
/// `Error::InvalidSource` for unrecognized archives or an existing target
/// without `--force`.
pub fn execute(source: &Path, target: &Path, force: bool, clean: bool, quiet: bool) -> Result<()> {
    notion::export(source, target, ExportOptions { force, clean })?;

    if !quiet {
        println!("Exported {} to {}", source.display(), target.display());
    }
    Ok(())
}
