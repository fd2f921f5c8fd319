use crate::domain::{Listing, RawListing};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store itself cannot be reached. Fatal to a sync run.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("listing {0} not found")]
    NotFound(i64),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// What reconciliation writes to an existing listing.
#[derive(Debug, Clone, Copy)]
pub enum ListingUpdate<'a> {
    /// Only `last_scraped_at` advances.
    Seen { at: DateTime<Utc> },
    /// Tracked fields and `category` are overwritten from the scraped record and
    /// the status becomes `updated`.
    Changed {
        scraped: &'a RawListing,
        at: DateTime<Utc>,
    },
}

/// The persisted-listing operations the sync engine depends on.
///
/// Implementations must treat each call as its own transaction; the engine
/// never asks for atomicity across calls.
pub trait ListingStore {
    /// Cheap reachability check made before a run touches anything.
    fn ping(&self) -> Result<(), StoreError>;

    fn find_by_key(&self, source_url: &str) -> Result<Option<Listing>, StoreError>;

    /// Inserts a first sighting with `status = new`. Returns the new id.
    fn create(&self, scraped: &RawListing, at: DateTime<Utc>) -> Result<i64, StoreError>;

    fn update_fields(&self, id: i64, update: ListingUpdate<'_>) -> Result<(), StoreError>;

    /// Moves every listing of `source_name` whose key is not in `seen` and whose
    /// status is neither `inactive` nor `imported` to `inactive`. Returns the
    /// number of listings modified.
    fn mark_inactive(&self, source_name: &str, seen: &HashSet<String>)
        -> Result<usize, StoreError>;
}

impl<S: ListingStore + ?Sized> ListingStore for &S {
    fn ping(&self) -> Result<(), StoreError> {
        (**self).ping()
    }

    fn find_by_key(&self, source_url: &str) -> Result<Option<Listing>, StoreError> {
        (**self).find_by_key(source_url)
    }

    fn create(&self, scraped: &RawListing, at: DateTime<Utc>) -> Result<i64, StoreError> {
        (**self).create(scraped, at)
    }

    fn update_fields(&self, id: i64, update: ListingUpdate<'_>) -> Result<(), StoreError> {
        (**self).update_fields(id, update)
    }

    fn mark_inactive(
        &self,
        source_name: &str,
        seen: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        (**self).mark_inactive(source_name, seen)
    }
}
