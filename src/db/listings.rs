use crate::db::connection::Database;
use crate::domain::{Listing, ListingStatus, RawListing};
use crate::sync::{ListingStore, ListingUpdate, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashSet;

const LISTING_COLUMNS: &str = r#"
    id, title, date_time, venue_name, address, city, description, category,
    image_url, source_name, source_url, last_scraped_at, status,
    imported_at, imported_by, import_notes
"#;

impl ToSql for ListingStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ListingStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        title: row.get(1)?,
        date_time: row.get(2)?,
        venue_name: row.get(3)?,
        address: row.get(4)?,
        city: row.get(5)?,
        description: row.get(6)?,
        category: row.get(7)?,
        image_url: row.get(8)?,
        source_name: row.get(9)?,
        source_url: row.get(10)?,
        last_scraped_at: row.get(11)?,
        status: row.get(12)?,
        imported_at: row.get(13)?,
        imported_by: row.get(14)?,
        import_notes: row.get(15)?,
    })
}

/// Stored text is trimmed; blank becomes NULL.
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required(value: Option<&str>, field: &str) -> Result<String, StoreError> {
    clean(value).ok_or_else(|| StoreError::Validation(format!("{field} is required")))
}

/// Curator lookup. Unset fields don't filter; `source_name` matches any
/// source containing it, ignoring ASCII case.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub source_name: Option<String>,
    pub limit: usize,
}

/// `ListingStore` backed by the `listings` table.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get_listing(&self, id: i64) -> Result<Option<Listing>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1");
            Ok(conn.query_row(&sql, params![id], listing_from_row).optional()?)
        })
    }

    /// Most recently scraped first.
    pub fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError> {
        let source_name = clean(filter.source_name.as_deref());
        self.db.with_conn(|conn| {
            let sql = format!(
                r#"
                SELECT {LISTING_COLUMNS} FROM listings
                WHERE (?1 IS NULL OR status = ?1)
                  AND (?2 IS NULL OR source_name LIKE '%' || ?2 || '%')
                ORDER BY last_scraped_at DESC, id DESC
                LIMIT ?3
                "#
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![filter.status, source_name, filter.limit as i64],
                listing_from_row,
            )?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    /// Manual status override. Moving a listing to `imported` stamps the
    /// import metadata; any other status leaves it as it was.
    pub fn set_status(
        &self,
        id: i64,
        status: ListingStatus,
        imported_by: Option<i64>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Listing, StoreError> {
        let changed = self.db.with_conn(|conn| {
            let changed = if status == ListingStatus::Imported {
                conn.execute(
                    r#"
                    UPDATE listings SET
                        status = ?1, imported_at = ?2, imported_by = ?3,
                        import_notes = ?4, updated_at = ?2
                    WHERE id = ?5
                    "#,
                    params![status, now, imported_by, clean(notes), id],
                )?
            } else {
                conn.execute(
                    "UPDATE listings SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status, now, id],
                )?
            };
            Ok(changed)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.get_listing(id)?.ok_or(StoreError::NotFound(id))
    }

    /// Listing count per status, in lifecycle order, zeros included.
    pub fn status_counts(&self) -> Result<Vec<(ListingStatus, i64)>, StoreError> {
        let found: Vec<(ListingStatus, i64)> = self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT status, COUNT(*) FROM listings GROUP BY status")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })?;

        Ok(ListingStatus::ALL
            .iter()
            .map(|status| {
                let n = found
                    .iter()
                    .find(|(s, _)| s == status)
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                (*status, n)
            })
            .collect())
    }
}

impl ListingStore for SqliteStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.db.ping()
    }

    fn find_by_key(&self, source_url: &str) -> Result<Option<Listing>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE source_url = ?1");
            Ok(conn
                .query_row(&sql, params![source_url.trim()], listing_from_row)
                .optional()?)
        })
    }

    fn create(&self, scraped: &RawListing, at: DateTime<Utc>) -> Result<i64, StoreError> {
        let title = required(scraped.title.as_deref(), "title")?;
        let source_url = required(scraped.source_url.as_deref(), "source_url")?;
        let source_name = required(Some(scraped.source_name.as_str()), "source_name")?;

        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO listings (
                    title, date_time, venue_name, address, city, description,
                    category, image_url, source_name, source_url,
                    last_scraped_at, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?11, ?11)
                "#,
                params![
                    title,
                    scraped.date_time,
                    clean(scraped.venue_name.as_deref()),
                    clean(scraped.address.as_deref()),
                    clean(Some(scraped.city.as_str())),
                    clean(scraped.description.as_deref()),
                    clean(scraped.category.as_deref()),
                    clean(scraped.image_url.as_deref()),
                    source_name,
                    source_url,
                    at,
                    ListingStatus::New,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update_fields(&self, id: i64, update: ListingUpdate<'_>) -> Result<(), StoreError> {
        let changed = match update {
            ListingUpdate::Seen { at } => self.db.with_conn(|conn| {
                Ok(conn.execute(
                    "UPDATE listings SET last_scraped_at = ?1 WHERE id = ?2",
                    params![at, id],
                )?)
            })?,
            ListingUpdate::Changed { scraped, at } => {
                let title = required(scraped.title.as_deref(), "title")?;
                self.db.with_conn(|conn| {
                    Ok(conn.execute(
                        r#"
                        UPDATE listings SET
                            title = ?1, date_time = ?2, venue_name = ?3, address = ?4,
                            description = ?5, image_url = ?6, category = ?7,
                            last_scraped_at = ?8, status = ?9, updated_at = ?8
                        WHERE id = ?10
                        "#,
                        params![
                            title,
                            scraped.date_time,
                            clean(scraped.venue_name.as_deref()),
                            clean(scraped.address.as_deref()),
                            clean(scraped.description.as_deref()),
                            clean(scraped.image_url.as_deref()),
                            clean(scraped.category.as_deref()),
                            at,
                            ListingStatus::Updated,
                            id,
                        ],
                    )?)
                })?
            }
        };

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn mark_inactive(
        &self,
        source_name: &str,
        seen: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        let now = Utc::now();
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                r#"
                CREATE TEMP TABLE IF NOT EXISTS seen_keys (source_url TEXT PRIMARY KEY);
                DELETE FROM temp.seen_keys;
                "#,
            )?;
            {
                let mut insert =
                    tx.prepare("INSERT OR IGNORE INTO temp.seen_keys (source_url) VALUES (?1)")?;
                for key in seen {
                    insert.execute(params![key])?;
                }
            }

            let retired = tx.execute(
                r#"
                UPDATE listings SET status = ?1, updated_at = ?2
                WHERE source_name = ?3
                  AND status NOT IN ('inactive', 'imported')
                  AND source_url NOT IN (SELECT source_url FROM temp.seen_keys)
                "#,
                params![ListingStatus::Inactive, now, source_name],
            )?;

            tx.execute("DELETE FROM temp.seen_keys", [])?;
            tx.commit()?;
            Ok(retired)
        })
    }
}
