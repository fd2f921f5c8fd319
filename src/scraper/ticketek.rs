use crate::domain::RawListing;
use crate::scraper::client::PoliteClient;
use crate::scraper::extract::{dedup_by_source_url, extract_cards, CardProfile};
use crate::scraper::{ScraperError, SourceConnector};

pub const SOURCE_NAME: &str = "Ticketek";

/// Genre pages and the category each one implies.
const GENRES: [(&str, &str); 3] = [
    ("https://premier.ticketek.com.au/shows/genre.aspx?c=2048", "Music"),
    ("https://premier.ticketek.com.au/shows/genre.aspx?c=2049", "Arts & Theatre"),
    ("https://premier.ticketek.com.au/shows/genre.aspx?c=2050", "Sport"),
];

pub struct Ticketek {
    client: PoliteClient,
}

impl Ticketek {
    pub fn new(client: PoliteClient) -> Self {
        Self { client }
    }
}

pub fn parse_page(html: &str, category: &str, city: &str) -> Result<Vec<RawListing>, ScraperError> {
    let profile = CardProfile {
        source_name: SOURCE_NAME,
        base_url: "https://premier.ticketek.com.au",
        card: r#".show-item, .event-card, [class*="ShowItem"], li[class*="event"]"#,
        link: &["a"],
        title: &["h2", "h3", r#"[class*="title"]"#, r#"[class*="name"]"#],
        date: &["time", r#"[class*="date"]"#],
        venue: &[r#"[class*="venue"]"#, r#"[class*="location"]"#],
        description: &[],
        default_venue: "Sydney",
        category,
        min_title_len: 3,
        link_must_contain: None,
    };
    extract_cards(html, &profile, city)
}

impl SourceConnector for Ticketek {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch(&self) -> Result<Vec<RawListing>, ScraperError> {
        let city = self.client.settings().default_city.clone();
        let urls: Vec<&str> = GENRES.iter().map(|(url, _)| *url).collect();
        let listings = self.client.collect_pages(SOURCE_NAME, &urls, |url, html| {
            let category = GENRES
                .iter()
                .find(|(u, _)| *u == url)
                .map(|(_, c)| *c)
                .unwrap_or("General");
            parse_page(html, category, &city)
        })?;
        Ok(dedup_by_source_url(listings))
    }
}
