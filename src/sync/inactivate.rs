use crate::sync::store::{ListingStore, StoreError};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Retires listings that the current run no longer found at their source.
///
/// Only sources named in `source_names` are touched, and only after every
/// connector of the run has been reconciled: `seen` must be the run-wide set.
pub fn mark_inactive<S: ListingStore>(
    store: &S,
    source_names: &BTreeSet<String>,
    seen: &HashSet<String>,
) -> Result<usize, StoreError> {
    let mut total = 0;
    for source_name in source_names {
        let retired = store.mark_inactive(source_name, seen)?;
        if retired > 0 {
            info!(source = %source_name, retired, "marked listings inactive");
        }
        total += retired;
    }
    Ok(total)
}
