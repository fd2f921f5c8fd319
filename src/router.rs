use crate::db::scrapes::recent_scrape_runs;
use crate::db::{Database, ListingFilter, SqliteStore};
use crate::domain::ListingStatus;
use crate::errors::ServerError;
use crate::responses::{
    error_to_response, html_response, json_response, redirect_response, ResultResp,
};
use crate::scheduler::{RunLauncher, Trigger};
use crate::templates::pages::{admin_page, AdminVm};
use astra::{Request, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::io::Read;
use std::sync::Arc;
use tracing::info;
use url::form_urlencoded;

const RECENT_RUNS: usize = 20;
const DEFAULT_LISTING_LIMIT: usize = 50;
const MAX_LISTING_LIMIT: usize = 200;

/// What every request handler can reach.
#[derive(Clone)]
pub struct App {
    pub db: Database,
    pub launcher: Arc<dyn RunLauncher>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusOverride {
    status: String,
    imported_by: Option<i64>,
    notes: Option<String>,
}

/// Entry point for the server: never fails, errors become responses.
pub fn respond(req: Request, app: &App) -> Response {
    let wants_json = req.uri().path() != "/admin";
    match handle(req, app) {
        Ok(resp) => resp,
        Err(err) => error_to_response(&err, wants_json),
    }
}

pub fn handle(mut req: Request, app: &App) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "health"]) => {
            json_response(200, &json!({ "status": "ok", "timestamp": Utc::now() }))
        }
        ("GET", ["admin"]) => admin_dashboard(app),
        ("POST", ["admin", "scrape"]) => {
            info!("manual scrape requested");
            app.launcher.launch(Trigger::Manual);
            if is_form_post(&req) {
                redirect_response("/admin")
            } else {
                json_response(202, &json!({ "message": "Scrape started. Check logs for progress." }))
            }
        }
        ("GET", ["admin", "listings"]) => {
            let filter = listing_filter(req.uri().query().unwrap_or(""))?;
            let listings = SqliteStore::new(app.db.clone()).list_listings(&filter)?;
            json_response(200, &json!({ "count": listings.len(), "listings": listings }))
        }
        ("POST", ["admin", "listings", id, "status"]) => {
            let id: i64 = id
                .parse()
                .map_err(|_| ServerError::BadRequest(format!("invalid listing id '{id}'")))?;
            let body = read_body(&mut req)?;
            override_status(app, id, &body)
        }
        _ => Err(ServerError::NotFound),
    }
}

fn admin_dashboard(app: &App) -> ResultResp {
    let store = SqliteStore::new(app.db.clone());
    let vm = AdminVm {
        status_counts: store.status_counts()?,
        scrapes: recent_scrape_runs(&app.db, RECENT_RUNS)?,
    };
    html_response(admin_page(&vm))
}

/// Curator override. The sync pipeline leaves whatever is set here alone
/// when it is `imported`.
fn override_status(app: &App, id: i64, body: &str) -> ResultResp {
    let payload: StatusOverride = serde_json::from_str(body)
        .map_err(|e| ServerError::BadRequest(format!("invalid body: {e}")))?;
    let status: ListingStatus = payload.status.parse().map_err(ServerError::BadRequest)?;

    let store = SqliteStore::new(app.db.clone());
    let listing = store.set_status(
        id,
        status,
        payload.imported_by,
        payload.notes.as_deref(),
        Utc::now(),
    )?;

    info!(listing_id = id, status = %status, "listing status overridden");
    json_response(200, &listing)
}

/// The admin page's own forms, as opposed to API clients.
fn is_form_post(req: &Request) -> bool {
    req.headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// `?status=&source=&limit=`; blank values are ignored.
fn listing_filter(query: &str) -> Result<ListingFilter, ServerError> {
    let mut filter = ListingFilter {
        limit: DEFAULT_LISTING_LIMIT,
        ..Default::default()
    };

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match &*key {
            "status" => filter.status = Some(value.parse().map_err(ServerError::BadRequest)?),
            "source" => filter.source_name = Some(value.to_string()),
            "limit" => {
                let limit: usize = value
                    .parse()
                    .map_err(|_| ServerError::BadRequest(format!("invalid limit '{value}'")))?;
                filter.limit = limit.clamp(1, MAX_LISTING_LIMIT);
            }
            _ => {}
        }
    }

    Ok(filter)
}

fn read_body(req: &mut Request) -> Result<String, ServerError> {
    let mut body = String::new();
    req.body_mut()
        .reader()
        .read_to_string(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;
    Ok(body)
}
