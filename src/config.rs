use crate::scraper::FetchSettings;
use clap::{Parser, Subcommand};
use std::time::Duration;

const MAX_INTERVAL_MINUTES: u64 = 525_600;

/// Aggregates event listings from several sites into one SQLite database.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "events.sqlite3")]
    pub database_path: String,

    /// Address the admin HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: String,

    /// Minutes between scheduled scrape runs (at most a year); 0 disables the scheduler
    #[arg(
        long,
        env = "SCRAPE_INTERVAL_MINUTES",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(0..=MAX_INTERVAL_MINUTES)
    )]
    pub scrape_interval_minutes: u64,

    /// Seconds to wait before the first scheduled run
    #[arg(long, env = "STARTUP_DELAY_SECS", default_value_t = 3)]
    pub startup_delay_secs: u64,

    /// Timeout for a single page fetch, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 15)]
    pub http_timeout_secs: u64,

    /// Pause between requests to the same source, in milliseconds
    #[arg(long, env = "PAGE_DELAY_MS", default_value_t = 1500)]
    pub page_delay_ms: u64,

    /// Attempts per page before it is given up
    #[arg(long, env = "FETCH_ATTEMPTS", default_value_t = 2)]
    pub fetch_attempts: u32,

    /// City stamped on listings whose source does not say
    #[arg(long, env = "DEFAULT_CITY", default_value = "Sydney")]
    pub default_city: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the admin API and run scrapes on a schedule (default)
    Serve,
    /// Run a single scrape in the foreground and print the summary
    ScrapeOnce,
}

impl Config {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.http_timeout_secs),
            page_delay: Duration::from_millis(self.page_delay_ms),
            attempts: self.fetch_attempts,
            default_city: self.default_city.clone(),
        }
    }

    pub fn scrape_interval(&self) -> Option<Duration> {
        match self.scrape_interval_minutes {
            0 => None,
            m => Some(Duration::from_secs(m.min(MAX_INTERVAL_MINUTES) * 60)),
        }
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hourly_schedule() {
        let config = Config::parse_from(["events_scraper"]);
        assert_eq!(config.command, None);
        assert_eq!(config.scrape_interval(), Some(Duration::from_secs(3600)));
        assert_eq!(config.fetch_settings().page_delay, Duration::from_millis(1500));
        assert_eq!(config.fetch_settings().default_city, "Sydney");
    }

    #[test]
    fn zero_interval_disables_scheduler() {
        let config = Config::parse_from([
            "events_scraper",
            "--scrape-interval-minutes",
            "0",
            "scrape-once",
        ]);
        assert_eq!(config.scrape_interval(), None);
        assert_eq!(config.command, Some(Command::ScrapeOnce));
    }

    #[test]
    fn interval_is_capped_at_one_year() {
        let config = Config::parse_from(["events_scraper", "--scrape-interval-minutes", "525600"]);
        assert_eq!(config.scrape_interval(), Some(Duration::from_secs(525_600 * 60)));

        for too_long in ["525601", "18446744073709551615"] {
            let result =
                Config::try_parse_from(["events_scraper", "--scrape-interval-minutes", too_long]);
            assert!(result.is_err(), "{too_long} minutes should be rejected");
        }
    }
}
