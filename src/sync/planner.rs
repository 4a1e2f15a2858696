//! The sync planner.
//!
//! A pure function from (remote listing, export index, force flag) to an
//! ordered sequence of planned actions. No network, no filesystem: the whole
//! skip/create/update policy is testable in isolation.

use crate::sync::index::{ExportIndex, IndexEntry};
use crate::sync::source::RemoteItem;

/// The planner's decision for one remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// Already exported and unchanged; nothing to do.
    Skip(RemoteItem),
    /// Never exported before; fetch and write fresh.
    Create(RemoteItem),
    /// Exported before but stale (or re-export forced); fetch and overwrite.
    /// Carries the previous entry so the writer can clean up a renamed
    /// output file.
    Update {
        item: RemoteItem,
        prev: IndexEntry,
    },
}

impl PlannedAction {
    /// The item this action covers.
    #[must_use]
    pub fn item(&self) -> &RemoteItem {
        match self {
            Self::Skip(item) | Self::Create(item) | Self::Update { item, .. } => item,
        }
    }
}

/// Compute the plan for one sync pass.
///
/// Exactly one action per listed item, in listing order (deterministic
/// progress output and predictable resumption). Index entries for items not
/// in the listing are left untouched; the index is archival.
///
/// Policy per item:
/// - no index entry → `Create`
/// - entry exists and `force` → `Update` (recovery path for partial or
///   incorrect prior exports)
/// - entry exists and fingerprints differ → `Update`
/// - otherwise → `Skip`
#[must_use]
pub fn plan(listing: Vec<RemoteItem>, index: &ExportIndex, force: bool) -> Vec<PlannedAction> {
    listing
        .into_iter()
        .map(|item| match index.lookup(&item.id) {
            None => PlannedAction::Create(item),
            Some(prev) if force || prev.fingerprint != item.fingerprint => {
                PlannedAction::Update {
                    prev: prev.clone(),
                    item,
                }
            }
            Some(_) => PlannedAction::Skip(item),
        })
        .collect()
}
