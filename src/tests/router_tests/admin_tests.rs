use crate::db::scrapes::{finish_scrape_run, start_scrape_run};
use crate::db::{Database, SqliteStore};
use crate::domain::ListingStatus;
use crate::router::{handle, respond, App};
use crate::scheduler::{RunLauncher, Trigger};
use crate::sync::{ListingStore, Summary};
use crate::tests::utils::{init_test_db, raw};
use astra::Body;
use chrono::Utc;
use http::{Method, Request};
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingLauncher {
    launched: Mutex<Vec<Trigger>>,
}

impl RunLauncher for RecordingLauncher {
    fn launch(&self, trigger: Trigger) {
        self.launched.lock().unwrap().push(trigger);
    }
}

fn test_app(db: Database) -> (App, Arc<RecordingLauncher>) {
    let launcher = Arc::new(RecordingLauncher::default());
    let app = App {
        db,
        launcher: launcher.clone(),
    };
    (app, launcher)
}

fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn body_string(resp: astra::Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

#[test]
fn health_reports_ok() {
    let (_dir, db) = init_test_db();
    let (app, _) = test_app(db);

    let resp = handle(request(Method::GET, "/api/health", ""), &app).expect("Handler failed");
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["status"], "ok");
}

#[test]
fn admin_page_shows_counts_and_runs() {
    let (_dir, db) = init_test_db();
    let store = SqliteStore::new(db.clone());
    store.create(&raw("X", "u1", "Gig"), Utc::now()).unwrap();

    let run_id = start_scrape_run(&db, "scheduled", Utc::now()).unwrap();
    let summary = Summary {
        started_at: Utc::now(),
        duration: Duration::from_secs(2),
        total_scraped: 1,
        created: 1,
        updated: 0,
        unchanged: 0,
        marked_inactive: 0,
        errors: 0,
        sources: Vec::new(),
    };
    finish_scrape_run(&db, run_id, &summary).unwrap();

    let (app, _) = test_app(db);
    let resp = handle(request(Method::GET, "/admin", ""), &app).expect("Handler failed");
    assert_eq!(resp.status(), 200, "Admin page should load");

    let body = body_string(resp);
    assert!(body.contains("Admin Dashboard"));
    assert!(body.contains("imported"));
    assert!(body.contains("scheduled"));
}

#[test]
fn manual_scrape_is_fire_and_forget() {
    let (_dir, db) = init_test_db();
    let (app, launcher) = test_app(db);

    let resp = handle(request(Method::POST, "/admin/scrape", ""), &app).expect("Handler failed");

    assert_eq!(resp.status(), 202);
    assert_eq!(*launcher.launched.lock().unwrap(), vec![Trigger::Manual]);
}

#[test]
fn scrape_button_redirects_back_to_admin() {
    let (_dir, db) = init_test_db();
    let (app, launcher) = test_app(db);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/admin/scrape")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::empty())
        .unwrap();
    let resp = handle(req, &app).expect("Handler failed");

    assert_eq!(resp.status(), 303, "Should redirect after starting a run");
    assert_eq!(
        resp.headers().get("Location").unwrap().to_str().unwrap(),
        "/admin"
    );
    assert_eq!(*launcher.launched.lock().unwrap(), vec![Trigger::Manual]);
}

#[test]
fn curator_can_look_up_listings_by_status_and_source() {
    let (_dir, db) = init_test_db();
    let store = SqliteStore::new(db.clone());
    let now = Utc::now();
    store.create(&raw("Eventbrite", "u1", "Jazz Night"), now).unwrap();
    store.create(&raw("Ticketek", "u2", "Hamilton"), now).unwrap();
    let imported = store.create(&raw("Eventbrite", "u3", "Harbour Run"), now).unwrap();
    store
        .set_status(imported, ListingStatus::Imported, Some(1), None, now)
        .unwrap();
    let (app, _) = test_app(db);

    let resp = handle(
        request(Method::GET, "/admin/listings?status=new&source=eventbrite", ""),
        &app,
    )
    .expect("Handler failed");
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["listings"][0]["title"], "Jazz Night");
    assert_eq!(json["listings"][0]["source_url"], "u1");
    assert!(json["listings"][0]["id"].as_i64().is_some());

    let resp = handle(request(Method::GET, "/admin/listings", ""), &app).expect("Handler failed");
    let json: serde_json::Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["count"], 3);

    let resp = respond(request(Method::GET, "/admin/listings?status=archived", ""), &app);
    assert_eq!(resp.status(), 400);

    let resp = respond(request(Method::GET, "/admin/listings?limit=lots", ""), &app);
    assert_eq!(resp.status(), 400);
}

#[test]
fn curator_can_import_a_listing() {
    let (_dir, db) = init_test_db();
    let store = SqliteStore::new(db.clone());
    let id = store.create(&raw("X", "u1", "Gig"), Utc::now()).unwrap();
    let (app, _) = test_app(db);

    let uri = format!("/admin/listings/{id}/status");
    let body = r#"{"status": "imported", "importedBy": 9, "notes": "front page"}"#;
    let resp = handle(request(Method::POST, &uri, body), &app).expect("Handler failed");
    assert_eq!(resp.status(), 200);

    let listing = store.find_by_key("u1").unwrap().unwrap();
    assert_eq!(listing.status, ListingStatus::Imported);
    assert_eq!(listing.imported_by, Some(9));
    assert_eq!(listing.import_notes.as_deref(), Some("front page"));
}

#[test]
fn status_override_rejects_bad_input() {
    let (_dir, db) = init_test_db();
    let store = SqliteStore::new(db.clone());
    let id = store.create(&raw("X", "u1", "Gig"), Utc::now()).unwrap();
    let (app, _) = test_app(db);

    let uri = format!("/admin/listings/{id}/status");
    let resp = respond(request(Method::POST, &uri, r#"{"status": "archived"}"#), &app);
    assert_eq!(resp.status(), 400);

    let resp = respond(request(Method::POST, &uri, "not json"), &app);
    assert_eq!(resp.status(), 400);

    let resp = respond(
        request(Method::POST, "/admin/listings/abc/status", r#"{"status": "new"}"#),
        &app,
    );
    assert_eq!(resp.status(), 400);

    let resp = respond(
        request(Method::POST, "/admin/listings/999/status", r#"{"status": "new"}"#),
        &app,
    );
    assert_eq!(resp.status(), 404);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["error"], "Not Found");
}

#[test]
fn unknown_route_is_not_found() {
    let (_dir, db) = init_test_db();
    let (app, _) = test_app(db);

    let resp = respond(request(Method::GET, "/nope", ""), &app);
    assert_eq!(resp.status(), 404);
}
