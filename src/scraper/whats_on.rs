use crate::domain::RawListing;
use crate::scraper::client::PoliteClient;
use crate::scraper::extract::{dedup_by_source_url, extract_cards, CardProfile};
use crate::scraper::{ScraperError, SourceConnector};

pub const SOURCE_NAME: &str = "What's On Sydney";
pub const SYDNEY_COM: &str = "Sydney.com";

const WHATS_ON_URL: &str = "https://whatson.cityofsydney.nsw.gov.au/events";
const SYDNEY_COM_URL: &str = "https://www.sydney.com/events";

const WHATS_ON_CARDS: CardProfile<'static> = CardProfile {
    source_name: SOURCE_NAME,
    base_url: "https://whatson.cityofsydney.nsw.gov.au",
    card: r#"article, .event-card, [class*="EventCard"], [class*="event-item"], .card"#,
    link: &["a"],
    title: &["h2", "h3", r#"[class*="title"]"#, r#"[class*="heading"]"#],
    date: &["time", r#"[class*="date"]"#],
    venue: &[r#"[class*="venue"]"#, r#"[class*="location"]"#],
    description: &[r#"[class*="description"]"#, r#"[class*="excerpt"]"#, "p"],
    default_venue: "Sydney CBD",
    category: "Arts & Culture",
    min_title_len: 3,
    link_must_contain: None,
};

const SYDNEY_COM_CARDS: CardProfile<'static> = CardProfile {
    source_name: SYDNEY_COM,
    base_url: "https://www.sydney.com",
    card: r#"[class*="card"], [class*="listing"], article, .event"#,
    link: &[r#"a[href*="/event"]"#, "a"],
    title: &["h2", "h3", r#"[class*="title"]"#],
    date: &["time", r#"[class*="date"]"#],
    venue: &[r#"[class*="venue"]"#, r#"[class*="location"]"#],
    description: &["p", r#"[class*="description"]"#],
    default_venue: "Sydney",
    category: "Tourism",
    min_title_len: 3,
    link_must_contain: Some("sydney"),
};

/// City of Sydney's guide plus Sydney.com. Each keeps its own source name, so
/// one batch from this connector spans two sources.
pub struct WhatsOnSydney {
    client: PoliteClient,
}

impl WhatsOnSydney {
    pub fn new(client: PoliteClient) -> Self {
        Self { client }
    }
}

pub fn parse_page(url: &str, html: &str, city: &str) -> Result<Vec<RawListing>, ScraperError> {
    let profile = if url == SYDNEY_COM_URL {
        &SYDNEY_COM_CARDS
    } else {
        &WHATS_ON_CARDS
    };
    extract_cards(html, profile, city)
}

impl SourceConnector for WhatsOnSydney {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch(&self) -> Result<Vec<RawListing>, ScraperError> {
        let city = self.client.settings().default_city.clone();
        let listings = self.client.collect_pages(
            SOURCE_NAME,
            &[WHATS_ON_URL, SYDNEY_COM_URL],
            |url, html| parse_page(url, html, &city),
        )?;
        Ok(dedup_by_source_url(listings))
    }
}
