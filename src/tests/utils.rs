use crate::db::connection::{init_db, Database};
use crate::domain::{Listing, ListingStatus, RawListing};
use crate::scraper::{ScraperError, SourceConnector};
use crate::sync::{ListingStore, ListingUpdate, StoreError};
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use tempfile::TempDir;

/// Initialize a fresh test DB using the production schema.
/// Keep the `TempDir` alive for as long as the database is used.
pub fn init_test_db() -> (TempDir, Database) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("test_db.sqlite");
    let db = Database::new(path.to_string_lossy().to_string());

    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    (dir, db)
}

/// A complete scraped record with only the identifying fields filled in.
pub fn raw(source_name: &str, source_url: &str, title: &str) -> RawListing {
    RawListing {
        title: Some(title.to_string()),
        city: "Sydney".to_string(),
        source_name: source_name.to_string(),
        source_url: Some(source_url.to_string()),
        ..Default::default()
    }
}

/// In-memory `ListingStore` with injectable failures.
#[derive(Default)]
pub struct MemoryStore {
    listings: RefCell<Vec<Listing>>,
    /// Keys whose lookup fails as a record-level error.
    pub failing_keys: RefCell<HashSet<String>>,
    /// When set, every call fails as if the store were gone.
    pub unavailable: Cell<bool>,
}

impl MemoryStore {
    pub fn listings(&self) -> Vec<Listing> {
        self.listings.borrow().clone()
    }

    pub fn get(&self, source_url: &str) -> Option<Listing> {
        self.listings
            .borrow()
            .iter()
            .find(|l| l.source_url == source_url)
            .cloned()
    }

    pub fn fail_on(&self, source_url: &str) {
        self.failing_keys.borrow_mut().insert(source_url.to_string());
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.get() {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

impl ListingStore for MemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    fn find_by_key(&self, source_url: &str) -> Result<Option<Listing>, StoreError> {
        self.check()?;
        if self.failing_keys.borrow().contains(source_url) {
            return Err(StoreError::Validation(format!("injected failure for {source_url}")));
        }
        Ok(self.get(source_url))
    }

    fn create(&self, scraped: &RawListing, at: DateTime<Utc>) -> Result<i64, StoreError> {
        self.check()?;
        let mut listings = self.listings.borrow_mut();
        let id = listings.len() as i64 + 1;
        listings.push(Listing {
            id,
            title: scraped.title.clone().unwrap_or_default(),
            date_time: scraped.date_time,
            venue_name: scraped.venue_name.clone(),
            address: scraped.address.clone(),
            city: Some(scraped.city.clone()),
            description: scraped.description.clone(),
            category: scraped.category.clone(),
            image_url: scraped.image_url.clone(),
            source_name: scraped.source_name.clone(),
            source_url: scraped.source_url.clone().unwrap_or_default(),
            last_scraped_at: at,
            status: ListingStatus::New,
            imported_at: None,
            imported_by: None,
            import_notes: None,
        });
        Ok(id)
    }

    fn update_fields(&self, id: i64, update: ListingUpdate<'_>) -> Result<(), StoreError> {
        self.check()?;
        let mut listings = self.listings.borrow_mut();
        let listing = listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::NotFound(id))?;

        match update {
            ListingUpdate::Seen { at } => listing.last_scraped_at = at,
            ListingUpdate::Changed { scraped, at } => {
                listing.title = scraped.title.clone().unwrap_or_default();
                listing.date_time = scraped.date_time;
                listing.venue_name = scraped.venue_name.clone();
                listing.address = scraped.address.clone();
                listing.description = scraped.description.clone();
                listing.image_url = scraped.image_url.clone();
                listing.category = scraped.category.clone();
                listing.last_scraped_at = at;
                listing.status = ListingStatus::Updated;
            }
        }
        Ok(())
    }

    fn mark_inactive(
        &self,
        source_name: &str,
        seen: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        self.check()?;
        let mut retired = 0;
        for listing in self.listings.borrow_mut().iter_mut() {
            if listing.source_name == source_name
                && !seen.contains(&listing.source_url)
                && !matches!(
                    listing.status,
                    ListingStatus::Inactive | ListingStatus::Imported
                )
            {
                listing.status = ListingStatus::Inactive;
                retired += 1;
            }
        }
        Ok(retired)
    }
}

/// Connector returning a fixed batch, or failing outright when `batch` is `None`.
pub struct StubConnector {
    pub name: String,
    pub batch: Option<Vec<RawListing>>,
}

impl StubConnector {
    pub fn ok(name: &str, batch: Vec<RawListing>) -> Box<dyn SourceConnector> {
        Box::new(Self {
            name: name.to_string(),
            batch: Some(batch),
        })
    }

    pub fn failing(name: &str) -> Box<dyn SourceConnector> {
        Box::new(Self {
            name: name.to_string(),
            batch: None,
        })
    }
}

impl SourceConnector for StubConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<RawListing>, ScraperError> {
        self.batch.clone().ok_or_else(|| ScraperError::Unavailable {
            source_name: self.name.clone(),
            attempted: 3,
        })
    }
}
