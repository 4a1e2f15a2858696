//! Kindle export command.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::kindle::KindleSource;

use super::run_export;

/// Execute `ncli kindle export`.
pub fn execute(config: &Config, target: &Path, force: bool, quiet: bool) -> Result<()> {
    let mut source = KindleSource::new(config)?;
    run_export(&mut source, target, force, quiet)
}
