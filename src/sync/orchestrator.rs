use crate::scraper::SourceConnector;
use crate::sync::inactivate::mark_inactive;
use crate::sync::reconcile::{reconcile, SyncStats};
use crate::sync::store::{ListingStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("listing store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

/// How one connector fared during a run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub connector: String,
    pub fetched: usize,
    pub stats: Option<SyncStats>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Distinct natural keys seen across every source.
    pub total_scraped: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub marked_inactive: usize,
    pub errors: usize,
    pub sources: Vec<SourceReport>,
}

impl Summary {
    pub fn duration_label(&self) -> String {
        format!("{:.1}s", self.duration.as_secs_f64())
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:.1}s", duration.as_secs_f64()))
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "duration        {}", self.duration_label())?;
        writeln!(f, "totalScraped    {}", self.total_scraped)?;
        writeln!(f, "created         {}", self.created)?;
        writeln!(f, "updated         {}", self.updated)?;
        writeln!(f, "unchanged       {}", self.unchanged)?;
        writeln!(f, "markedInactive  {}", self.marked_inactive)?;
        write!(f, "errors          {}", self.errors)?;
        for source in &self.sources {
            match &source.error {
                Some(e) => write!(f, "\n  {:<16} failed: {e}", source.connector)?,
                None => write!(f, "\n  {:<16} {} fetched", source.connector, source.fetched)?,
            }
        }
        Ok(())
    }
}

/// Runs every connector against one store and retires what disappeared.
pub struct Orchestrator<S> {
    connectors: Vec<Box<dyn SourceConnector>>,
    store: S,
}

impl<S: ListingStore> Orchestrator<S> {
    pub fn new(connectors: Vec<Box<dyn SourceConnector>>, store: S) -> Self {
        Self { connectors, store }
    }

    /// One full sync run.
    ///
    /// Connector and record failures are absorbed into the summary. The only
    /// error returned is a store that cannot be reached at all.
    pub fn run_all(&self) -> Result<Summary, SyncError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(connectors = self.connectors.len(), "starting scrape run");

        self.store.ping().map_err(SyncError::StoreUnavailable)?;

        let mut totals = SyncStats::default();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut source_names: BTreeSet<String> = BTreeSet::new();
        let mut sources = Vec::with_capacity(self.connectors.len());

        for connector in &self.connectors {
            let name = connector.name().to_string();
            info!(connector = %name, "scraping");

            let batch = match connector.fetch() {
                Ok(batch) => batch,
                Err(e) => {
                    error!(connector = %name, error = %e, "connector failed");
                    sources.push(SourceReport {
                        connector: name,
                        fetched: 0,
                        stats: None,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            info!(connector = %name, found = batch.len(), "connector finished");
            if batch.is_empty() {
                sources.push(SourceReport {
                    connector: name,
                    fetched: 0,
                    stats: None,
                    error: None,
                });
                continue;
            }

            let result = reconcile(&self.store, &batch);
            if result.stats.errors > 0 {
                warn!(connector = %name, errors = result.stats.errors, "some listings failed to save");
                // Record errors are tolerated; a store that went away is not.
                self.store.ping().map_err(SyncError::StoreUnavailable)?;
            }

            totals.absorb(&result.stats);
            seen_keys.extend(result.seen_keys);
            source_names.extend(
                batch
                    .iter()
                    .map(|r| r.source_name.trim())
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            );

            sources.push(SourceReport {
                connector: name,
                fetched: batch.len(),
                stats: Some(result.stats),
                error: None,
            });
        }

        // With nothing seen, every listing would look vanished.
        let marked_inactive = if !seen_keys.is_empty() && !source_names.is_empty() {
            mark_inactive(&self.store, &source_names, &seen_keys)
                .map_err(SyncError::StoreUnavailable)?
        } else {
            warn!("nothing scraped this run, skipping inactivation");
            0
        };

        let summary = Summary {
            started_at,
            duration: clock.elapsed(),
            total_scraped: seen_keys.len(),
            created: totals.created,
            updated: totals.updated,
            unchanged: totals.unchanged,
            marked_inactive,
            errors: totals.errors,
            sources,
        };

        info!(
            duration = %summary.duration_label(),
            total_scraped = summary.total_scraped,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            marked_inactive = summary.marked_inactive,
            errors = summary.errors,
            "scrape run complete"
        );

        Ok(summary)
    }
}
