// src/domain/changes.rs

use crate::domain::listing::{Listing, RawListing};
use chrono::{DateTime, Utc};

/// A field whose difference marks a listing as updated.
///
/// `category` is deliberately absent: it is overwritten alongside these fields
/// but never triggers an update on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedField {
    Title,
    DateTime,
    VenueName,
    Address,
    Description,
    ImageUrl,
}

impl TrackedField {
    pub const ALL: [TrackedField; 6] = [
        TrackedField::Title,
        TrackedField::DateTime,
        TrackedField::VenueName,
        TrackedField::Address,
        TrackedField::Description,
        TrackedField::ImageUrl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrackedField::Title => "title",
            TrackedField::DateTime => "date_time",
            TrackedField::VenueName => "venue_name",
            TrackedField::Address => "address",
            TrackedField::Description => "description",
            TrackedField::ImageUrl => "image_url",
        }
    }

    fn differs(&self, existing: &Listing, scraped: &RawListing) -> bool {
        match self {
            TrackedField::Title => !text_eq(Some(existing.title.as_str()), scraped.title.as_deref()),
            TrackedField::DateTime => !instant_eq(existing.date_time, scraped.date_time),
            TrackedField::VenueName => {
                !text_eq(existing.venue_name.as_deref(), scraped.venue_name.as_deref())
            }
            TrackedField::Address => !text_eq(existing.address.as_deref(), scraped.address.as_deref()),
            TrackedField::Description => !text_eq(
                existing.description.as_deref(),
                scraped.description.as_deref(),
            ),
            TrackedField::ImageUrl => {
                !text_eq(existing.image_url.as_deref(), scraped.image_url.as_deref())
            }
        }
    }
}

/// Returns true when the scraped record differs from the stored listing on any
/// tracked field.
pub fn has_changed(existing: &Listing, scraped: &RawListing) -> bool {
    TrackedField::ALL
        .iter()
        .any(|field| field.differs(existing, scraped))
}

/// Names of every tracked field that differs, in `TrackedField::ALL` order.
/// Used for debug logging; `has_changed` stops at the first difference.
pub fn changed_fields(existing: &Listing, scraped: &RawListing) -> Vec<&'static str> {
    TrackedField::ALL
        .iter()
        .filter(|field| field.differs(existing, scraped))
        .map(TrackedField::name)
        .collect()
}

/// Trimmed text equality. Absent and empty are the same value.
fn text_eq(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or("").trim() == b.unwrap_or("").trim()
}

/// Instants compare at millisecond precision; one side absent is a difference.
fn instant_eq(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.timestamp_millis() == b.timestamp_millis(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::ListingStatus;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn stored() -> Listing {
        Listing {
            id: 1,
            title: "Jazz Night".to_string(),
            date_time: Some(Utc.with_ymd_and_hms(2026, 11, 20, 9, 0, 0).unwrap()),
            venue_name: Some("Town Hall".to_string()),
            address: Some("483 George St".to_string()),
            city: Some("Sydney".to_string()),
            description: None,
            category: Some("Music".to_string()),
            image_url: None,
            source_name: "Eventbrite".to_string(),
            source_url: "https://example.com/e/1".to_string(),
            last_scraped_at: Utc::now(),
            status: ListingStatus::New,
            imported_at: None,
            imported_by: None,
            import_notes: None,
        }
    }

    fn scraped_copy(listing: &Listing) -> RawListing {
        RawListing {
            title: Some(listing.title.clone()),
            date_time: listing.date_time,
            venue_name: listing.venue_name.clone(),
            address: listing.address.clone(),
            city: "Sydney".to_string(),
            description: listing.description.clone(),
            category: listing.category.clone(),
            image_url: listing.image_url.clone(),
            source_name: listing.source_name.clone(),
            source_url: Some(listing.source_url.clone()),
        }
    }

    #[test]
    fn identical_record_is_unchanged() {
        let listing = stored();
        assert!(!has_changed(&listing, &scraped_copy(&listing)));
    }

    #[test]
    fn venue_change_is_detected() {
        let listing = stored();
        let mut scraped = scraped_copy(&listing);
        scraped.venue_name = Some("Opera House".to_string());

        assert!(has_changed(&listing, &scraped));
        assert_eq!(changed_fields(&listing, &scraped), vec!["venue_name"]);
    }

    #[test]
    fn whitespace_and_empty_text_do_not_count() {
        let listing = stored();
        let mut scraped = scraped_copy(&listing);
        scraped.title = Some("  Jazz Night\n".to_string());
        scraped.description = Some("".to_string());
        scraped.image_url = Some("   ".to_string());

        assert!(!has_changed(&listing, &scraped));
    }

    #[test]
    fn same_instant_in_another_offset_is_unchanged() {
        let listing = stored();
        let mut scraped = scraped_copy(&listing);
        let sydney = FixedOffset::east_opt(11 * 3600).unwrap();
        let local: DateTime<FixedOffset> = sydney.with_ymd_and_hms(2026, 11, 20, 20, 0, 0).unwrap();
        scraped.date_time = Some(local.with_timezone(&Utc));

        assert!(!has_changed(&listing, &scraped));
    }

    #[test]
    fn date_appearing_or_vanishing_is_a_change() {
        let listing = stored();
        let mut scraped = scraped_copy(&listing);
        scraped.date_time = None;
        assert_eq!(changed_fields(&listing, &scraped), vec!["date_time"]);

        let mut undated = stored();
        undated.date_time = None;
        let scraped = scraped_copy(&stored());
        assert!(has_changed(&undated, &scraped));
    }

    #[test]
    fn category_only_change_is_ignored() {
        let listing = stored();
        let mut scraped = scraped_copy(&listing);
        scraped.category = Some("Comedy".to_string());

        assert!(!has_changed(&listing, &scraped));
    }

    #[test]
    fn each_tracked_field_on_its_own_triggers_an_update() {
        let listing = stored();
        for field in TrackedField::ALL {
            let mut scraped = scraped_copy(&listing);
            match field {
                TrackedField::Title => scraped.title = Some("Other".to_string()),
                TrackedField::DateTime => scraped.date_time = None,
                TrackedField::VenueName => scraped.venue_name = Some("Other".to_string()),
                TrackedField::Address => scraped.address = Some("Other".to_string()),
                TrackedField::Description => scraped.description = Some("Other".to_string()),
                TrackedField::ImageUrl => scraped.image_url = Some("Other".to_string()),
            }
            assert_eq!(changed_fields(&listing, &scraped), vec![field.name()]);
        }
    }

    #[test]
    fn every_difference_is_reported() {
        let listing = stored();
        let mut scraped = scraped_copy(&listing);
        scraped.title = Some("Jazz Night II".to_string());
        scraped.address = None;
        scraped.image_url = Some("https://img.example.com/a.png".to_string());

        assert_eq!(
            changed_fields(&listing, &scraped),
            vec!["title", "address", "image_url"]
        );
    }
}
