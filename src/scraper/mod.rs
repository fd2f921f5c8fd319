mod client;
mod extract;
mod scraper_error;

pub mod eventbrite;
pub mod ticketek;
pub mod whats_on;

pub use client::{FetchSettings, PoliteClient};
pub use scraper_error::ScraperError;

use crate::domain::RawListing;

/// One external listing source.
///
/// `fetch` returns the source's whole current batch, deduplicated by source
/// url. Partial page failures are absorbed; an `Err` means the source was
/// unusable for this run.
pub trait SourceConnector: Send {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<Vec<RawListing>, ScraperError>;
}

/// The production connectors, in the order a run invokes them.
pub fn default_connectors(
    settings: &FetchSettings,
) -> Result<Vec<Box<dyn SourceConnector>>, ScraperError> {
    Ok(vec![
        Box::new(eventbrite::Eventbrite::new(PoliteClient::new(settings.clone())?)),
        Box::new(whats_on::WhatsOnSydney::new(PoliteClient::new(settings.clone())?)),
        Box::new(ticketek::Ticketek::new(PoliteClient::new(settings.clone())?)),
    ])
}
