use crate::db::connection::Database;
use crate::sync::{StoreError, Summary};
use chrono::{DateTime, Utc};
use rusqlite::params;

#[derive(Debug)]
pub struct ScrapeRun {
    pub id: i64,
    pub trigger: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_scraped: Option<i64>,
    pub created: Option<i64>,
    pub updated: Option<i64>,
    pub unchanged: Option<i64>,
    pub marked_inactive: Option<i64>,
    pub errors: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_scrape_run(
    db: &Database,
    trigger: &str,
    started_at: DateTime<Utc>,
) -> Result<i64, StoreError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO scrape_runs (trigger, started_at, success) VALUES (?1, ?2, 0)",
            params![trigger, started_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn finish_scrape_run(db: &Database, run_id: i64, summary: &Summary) -> Result<(), StoreError> {
    let summary_json = serde_json::to_string(summary).ok();

    db.with_conn(|conn| {
        conn.execute(
            r#"
            UPDATE scrape_runs SET
                finished_at = ?1, total_scraped = ?2, created = ?3, updated = ?4,
                unchanged = ?5, marked_inactive = ?6, errors = ?7,
                success = 1, summary_json = ?8
            WHERE id = ?9
            "#,
            params![
                Utc::now(),
                summary.total_scraped as i64,
                summary.created as i64,
                summary.updated as i64,
                summary.unchanged as i64,
                summary.marked_inactive as i64,
                summary.errors as i64,
                summary_json,
                run_id,
            ],
        )?;
        Ok(())
    })
}

pub fn fail_scrape_run(db: &Database, run_id: i64, error: &str) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE scrape_runs SET finished_at = ?1, success = 0, error_message = ?2 WHERE id = ?3",
            params![Utc::now(), error, run_id],
        )?;
        Ok(())
    })
}

pub fn recent_scrape_runs(db: &Database, limit: usize) -> Result<Vec<ScrapeRun>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, trigger, started_at, finished_at, total_scraped, created, updated,
                   unchanged, marked_inactive, errors, success, error_message
            FROM scrape_runs
            ORDER BY started_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ScrapeRun {
                id: row.get(0)?,
                trigger: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                total_scraped: row.get(4)?,
                created: row.get(5)?,
                updated: row.get(6)?,
                unchanged: row.get(7)?,
                marked_inactive: row.get(8)?,
                errors: row.get(9)?,
                success: row.get(10)?,
                error_message: row.get(11)?,
            })
        })?;

        let mut runs = Vec::new();
        for r in rows {
            runs.push(r?);
        }
        Ok(runs)
    })
}
