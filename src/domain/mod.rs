pub mod changes;
pub mod listing;

pub use listing::{Listing, ListingStatus, RawListing};
