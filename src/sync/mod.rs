//! Reconciles freshly scraped listings against what the store already holds.

pub mod inactivate;
pub mod orchestrator;
pub mod reconcile;
pub mod store;

pub use orchestrator::{Orchestrator, Summary, SyncError};
pub use reconcile::reconcile;
pub use store::{ListingStore, ListingUpdate, StoreError};
