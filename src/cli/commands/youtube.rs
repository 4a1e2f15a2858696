//! YouTube export command.

use std::env;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::youtube;

/// Execute `ncli youtube export`.
///
/// The target defaults to the current directory.
pub fn execute(
    config: &Config,
    url: &str,
    target: Option<&PathBuf>,
    transcript: bool,
    summarize: bool,
) -> Result<()> {
    let target = match target {
        Some(path) => path.clone(),
        None => env::current_dir().map_err(Error::Io)?,
    };

    youtube::export(config, url, &target, transcript, summarize)
}
