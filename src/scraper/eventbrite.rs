use crate::domain::RawListing;
use crate::scraper::client::PoliteClient;
use crate::scraper::extract::{dedup_by_source_url, extract_cards, CardProfile};
use crate::scraper::{ScraperError, SourceConnector};

pub const SOURCE_NAME: &str = "Eventbrite";

const BASE_URL: &str = "https://www.eventbrite.com.au";

const PAGES: [&str; 3] = [
    "https://www.eventbrite.com.au/d/australia--sydney/events/",
    "https://www.eventbrite.com.au/d/australia--sydney/music/",
    "https://www.eventbrite.com.au/d/australia--sydney/food-and-drink/",
];

const CARDS: CardProfile<'static> = CardProfile {
    source_name: SOURCE_NAME,
    base_url: BASE_URL,
    card: r#"[data-testid="event-card"]"#,
    link: &["a"],
    title: &[r#"[data-testid="event-card-title"]"#, "h3"],
    date: &[r#"[data-testid="event-card-date"]"#, "time", r#"[class*="date"]"#],
    venue: &[
        r#"[data-testid="event-card-venue"]"#,
        r#"[class*="venue"]"#,
        r#"[class*="location"]"#,
    ],
    description: &[],
    default_venue: "Sydney",
    category: "General",
    min_title_len: 1,
    link_must_contain: None,
};

/// Older markup without test ids.
const FALLBACK_CARDS: CardProfile<'static> = CardProfile {
    source_name: SOURCE_NAME,
    base_url: BASE_URL,
    card: r#"article, .eds-event-card-content, [class*="EventCard"], li[class*="event"]"#,
    link: &[r#"a[href*="/e/"]"#],
    title: &["h2", "h3"],
    date: &["time", r#"[class*="date"]"#],
    venue: &[],
    description: &[],
    default_venue: "Sydney",
    category: "General",
    min_title_len: 1,
    link_must_contain: None,
};

pub struct Eventbrite {
    client: PoliteClient,
}

impl Eventbrite {
    pub fn new(client: PoliteClient) -> Self {
        Self { client }
    }
}

/// Primary card layout first; the fallback only when it finds nothing.
pub fn parse_page(html: &str, city: &str) -> Result<Vec<RawListing>, ScraperError> {
    let listings = extract_cards(html, &CARDS, city)?;
    if !listings.is_empty() {
        return Ok(listings);
    }
    extract_cards(html, &FALLBACK_CARDS, city)
}

impl SourceConnector for Eventbrite {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch(&self) -> Result<Vec<RawListing>, ScraperError> {
        let city = self.client.settings().default_city.clone();
        let listings = self
            .client
            .collect_pages(SOURCE_NAME, &PAGES, |_, html| parse_page(html, &city))?;
        Ok(dedup_by_source_url(listings))
    }
}
