//! Turns listing cards in an HTML page into `RawListing`s.

use crate::domain::RawListing;
use crate::scraper::ScraperError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Where to find each field inside one card.
///
/// Field selectors are alternatives tried in order; the first one yielding
/// non-empty text wins.
#[derive(Debug, Clone)]
pub struct CardProfile<'a> {
    pub source_name: &'a str,
    /// Relative links are resolved against this.
    pub base_url: &'a str,
    pub card: &'a str,
    pub link: &'a [&'a str],
    pub title: &'a [&'a str],
    pub date: &'a [&'a str],
    pub venue: &'a [&'a str],
    pub description: &'a [&'a str],
    pub default_venue: &'a str,
    pub category: &'a str,
    pub min_title_len: usize,
    /// Resolved links not containing this are skipped.
    pub link_must_contain: Option<&'a str>,
}

pub fn extract_cards(
    html: &str,
    profile: &CardProfile<'_>,
    city: &str,
) -> Result<Vec<RawListing>, ScraperError> {
    let document = Html::parse_document(html);
    let base = Url::parse(profile.base_url)?;

    let card_sel = parse_selector(profile.card)?;
    let link_sel = parse_all(profile.link)?;
    let title_sel = parse_all(profile.title)?;
    let date_sel = parse_all(profile.date)?;
    let venue_sel = parse_all(profile.venue)?;
    let description_sel = parse_all(profile.description)?;
    let img_sel = parse_selector("img")?;
    let datetime_sel = parse_selector("[datetime]")?;

    let mut out = Vec::new();
    for el in document.select(&card_sel) {
        let Some(anchor) = link_sel.iter().find_map(|s| el.select(s).next()) else {
            continue;
        };
        let Some(href) = anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty())
        else {
            continue;
        };
        let Ok(source_url) = base.join(href) else {
            continue;
        };
        let source_url = source_url.to_string();
        if let Some(needle) = profile.link_must_contain {
            if !source_url.contains(needle) {
                continue;
            }
        }

        let title = first_text(el, &title_sel).unwrap_or_else(|| element_text(anchor));
        if title.is_empty() || title.chars().count() < profile.min_title_len {
            continue;
        }

        let image_url = el
            .select(&img_sel)
            .next()
            .and_then(|i| i.value().attr("src").or_else(|| i.value().attr("data-src")))
            .map(str::to_string)
            .filter(|s| !s.is_empty());

        let date_time = el
            .select(&datetime_sel)
            .next()
            .and_then(|d| d.value().attr("datetime"))
            .and_then(parse_date_text)
            .or_else(|| first_text(el, &date_sel).as_deref().and_then(parse_date_text));

        let venue_text = first_text(el, &venue_sel);
        let description = first_text(el, &description_sel).unwrap_or_else(|| title.clone());

        out.push(RawListing {
            title: Some(title),
            date_time,
            venue_name: Some(
                venue_text
                    .clone()
                    .unwrap_or_else(|| profile.default_venue.to_string()),
            ),
            address: venue_text,
            city: city.to_string(),
            description: Some(description),
            category: Some(profile.category.to_string()),
            image_url,
            source_name: profile.source_name.to_string(),
            source_url: Some(source_url),
        });
    }

    Ok(out)
}

/// Keeps the first record for each source url. Records without one pass
/// through untouched.
pub fn dedup_by_source_url(listings: Vec<RawListing>) -> Vec<RawListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|l| match l.key() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        })
        .collect()
}

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%a, %b %d, %Y %I:%M %p",
    "%A, %B %d, %Y %I:%M %p",
    "%d %B %Y %I:%M %p",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%a %d %b %Y"];

/// Best-effort date parsing. Times without an offset are read as UTC.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|_| ScraperError::Selector(css.to_string()))
}

fn parse_all(css: &[&str]) -> Result<Vec<Selector>, ScraperError> {
    css.iter().map(|s| parse_selector(s)).collect()
}

fn first_text(el: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|s| {
        el.select(s)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    })
}

/// Element text with runs of whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
