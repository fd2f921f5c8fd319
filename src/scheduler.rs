use crate::config::Config;
use crate::db::scrapes::{fail_scrape_run, finish_scrape_run, start_scrape_run};
use crate::db::{Database, SqliteStore};
use crate::scraper::default_connectors;
use crate::sync::{ListingStore, Orchestrator, Summary, SyncError};
use chrono::Utc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// Why a run started. Stored with the run record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Scheduled,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::Scheduled => "scheduled",
            Trigger::Manual => "manual",
        }
    }
}

/// Starts runs without waiting for them.
pub trait RunLauncher: Send + Sync {
    fn launch(&self, trigger: Trigger);
}

/// Launches each run on its own thread against the production connectors.
///
/// Nothing stops a manual run from overlapping a scheduled one.
pub struct ThreadLauncher {
    config: Arc<Config>,
    db: Database,
}

impl ThreadLauncher {
    pub fn new(config: Arc<Config>, db: Database) -> Self {
        Self { config, db }
    }
}

impl RunLauncher for ThreadLauncher {
    fn launch(&self, trigger: Trigger) {
        let config = self.config.clone();
        let db = self.db.clone();
        std::thread::spawn(move || {
            let _ = run_once(&config, &db, trigger);
        });
    }
}

/// Builds the production orchestrator and performs one recorded run.
pub fn run_once(config: &Config, db: &Database, trigger: Trigger) -> Result<Summary, SyncError> {
    let connectors = match default_connectors(&config.fetch_settings()) {
        Ok(connectors) => connectors,
        Err(e) => {
            // Treated like every connector failing: nothing fetched, nothing retired.
            error!(error = %e, "could not build connectors");
            Vec::new()
        }
    };

    let orchestrator = Orchestrator::new(connectors, SqliteStore::new(db.clone()));
    run_and_record(db, trigger, &orchestrator)
}

/// Runs the orchestrator and keeps a `scrape_runs` row in step with it.
/// Failing to write the run record never fails the run.
pub fn run_and_record<S: ListingStore>(
    db: &Database,
    trigger: Trigger,
    orchestrator: &Orchestrator<S>,
) -> Result<Summary, SyncError> {
    let run_id = match start_scrape_run(db, trigger.as_str(), Utc::now()) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "could not record run start");
            None
        }
    };

    let result = orchestrator.run_all();

    if let Some(run_id) = run_id {
        let recorded = match &result {
            Ok(summary) => finish_scrape_run(db, run_id, summary),
            Err(e) => fail_scrape_run(db, run_id, &e.to_string()),
        };
        if let Err(e) = recorded {
            warn!(run_id, error = %e, "could not record run result");
        }
    }

    if let Err(e) = &result {
        error!(trigger = trigger.as_str(), error = %e, "scrape run failed");
    }
    result
}

/// Spawns the background schedule: one run after the startup delay, then one
/// per interval. Returns `None` when scheduling is disabled.
pub fn start_scheduler(config: Arc<Config>, db: Database) -> Option<JoinHandle<()>> {
    let interval = config.scrape_interval()?;

    Some(std::thread::spawn(move || {
        std::thread::sleep(config.startup_delay());
        info!("running initial scrape");
        let _ = run_once(&config, &db, Trigger::Startup);

        loop {
            std::thread::sleep(interval);
            info!("running scheduled scrape");
            let _ = run_once(&config, &db, Trigger::Scheduled);
        }
    }))
}
