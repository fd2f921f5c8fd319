use crate::config::{Command, Config};
use crate::db::{init_db, Database};
use crate::router::{respond, App};
use crate::scheduler::{run_once, start_scheduler, ThreadLauncher, Trigger};
use anyhow::Context;
use astra::Server;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod domain;
mod errors;
mod responses;
mod router;
mod scheduler;
mod scraper;
mod sync;
mod templates;

#[cfg(test)]
mod tests;

fn main() -> anyhow::Result<()> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,events_scraper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Arc::new(Config::parse());

    let db = Database::new(config.database_path.clone());
    init_db(&db).context("database initialization failed")?;

    match config.command.clone().unwrap_or(Command::Serve) {
        Command::ScrapeOnce => {
            let summary = run_once(&config, &db, Trigger::Manual)?;
            println!("=== Scrape Summary ===\n{summary}");
            Ok(())
        }
        Command::Serve => serve(config, db),
    }
}

fn serve(config: Arc<Config>, db: Database) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind_addr))?;

    if start_scheduler(config.clone(), db.clone()).is_none() {
        info!("scheduler disabled");
    }

    let app = App {
        launcher: Arc::new(ThreadLauncher::new(config.clone(), db.clone())),
        db,
    };

    info!(%addr, "starting server");
    let server = Server::bind(&addr).max_workers(8);

    if let Err(e) = server.serve(move |req, _info| respond(req, &app)) {
        error!(error = %e, "server ended with error");
        return Err(e.into());
    }

    info!("server shut down cleanly");
    Ok(())
}
