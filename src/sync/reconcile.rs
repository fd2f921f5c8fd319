use crate::domain::changes::{changed_fields, has_changed};
use crate::domain::{ListingStatus, RawListing};
use crate::sync::store::{ListingStore, ListingUpdate, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Per-batch counters. Dropped records appear in none of them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: usize,
}

impl SyncStats {
    pub fn absorb(&mut self, other: &SyncStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.errors += other.errors;
    }

    fn count(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Dropped => {}
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Unchanged => self.unchanged += 1,
            RecordOutcome::Failed(_) => self.errors += 1,
        }
    }
}

/// What happened to one scraped record.
#[derive(Debug)]
pub enum RecordOutcome {
    /// Missing title or source url; never reached the store.
    Dropped,
    Created,
    Updated,
    Unchanged,
    Failed(StoreError),
}

#[derive(Debug, Default)]
pub struct ReconcileResult {
    pub stats: SyncStats,
    /// Natural keys of every record that passed the drop rule, including ones
    /// whose write later failed.
    pub seen_keys: HashSet<String>,
}

/// Merges one source's batch into the store, one record at a time.
///
/// Records are processed in batch order, so a key repeated within the batch
/// ends up with whatever its last occurrence wrote. A failing record is
/// counted in `errors` and never stops the batch.
pub fn reconcile<S: ListingStore>(store: &S, batch: &[RawListing]) -> ReconcileResult {
    let outcomes: Vec<(Option<String>, RecordOutcome)> = batch
        .iter()
        .map(|scraped| reconcile_one(store, scraped, Utc::now()))
        .collect();

    let mut result = ReconcileResult::default();
    for (key, outcome) in &outcomes {
        if let Some(key) = key {
            result.seen_keys.insert(key.clone());
        }
        result.stats.count(outcome);
    }
    result
}

fn reconcile_one<S: ListingStore>(
    store: &S,
    scraped: &RawListing,
    now: DateTime<Utc>,
) -> (Option<String>, RecordOutcome) {
    let key = match scraped.key() {
        Some(key) if scraped.has_title() => key,
        _ => return (None, RecordOutcome::Dropped),
    };

    let outcome = match apply(store, key, scraped, now) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(source_url = key, error = %e, "failed to reconcile listing");
            RecordOutcome::Failed(e)
        }
    };

    (Some(key.to_string()), outcome)
}

fn apply<S: ListingStore>(
    store: &S,
    key: &str,
    scraped: &RawListing,
    now: DateTime<Utc>,
) -> Result<RecordOutcome, StoreError> {
    let Some(existing) = store.find_by_key(key)? else {
        store.create(scraped, now)?;
        return Ok(RecordOutcome::Created);
    };

    if existing.status == ListingStatus::Imported {
        store.update_fields(existing.id, ListingUpdate::Seen { at: now })?;
        return Ok(RecordOutcome::Unchanged);
    }

    if has_changed(&existing, scraped) {
        debug!(
            source_url = key,
            fields = ?changed_fields(&existing, scraped),
            "listing changed"
        );
        store.update_fields(existing.id, ListingUpdate::Changed { scraped, at: now })?;
        Ok(RecordOutcome::Updated)
    } else {
        store.update_fields(existing.id, ListingUpdate::Seen { at: now })?;
        Ok(RecordOutcome::Unchanged)
    }
}
