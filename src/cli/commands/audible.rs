//! Audible export command.

use std::path::Path;

use crate::audible::AudibleSource;
use crate::config::Config;
use crate::error::Result;

use super::run_export;

/// Execute `ncli audible export`.
///
/// # Errors
///
/// Auth errors from the stored session, plus any export run failures.
pub fn execute(config: &Config, target: &Path, force: bool, quiet: bool) -> Result<()> {
    let mut source = AudibleSource::new(config)?;
    run_export(&mut source, target, force, quiet)
}
