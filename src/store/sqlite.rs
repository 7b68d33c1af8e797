//! SQLite-backed URL store.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::{ScopeFilter, ScopeParam, UniquenessCheck, UpsertOutcome, UrlStore};
use crate::error::StoreError;
use crate::record::{UrlRecord, UrlStatus};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS url_record (
    seo_path_hash INTEGER NOT NULL,
    std_path_hash INTEGER NOT NULL,
    locale        TEXT    NOT NULL,
    route_name    TEXT    NOT NULL,
    entity_id     INTEGER NOT NULL,
    seo_url       TEXT    NOT NULL,
    std_url       TEXT    NOT NULL,
    status        INTEGER NOT NULL,
    timestamp     TEXT    NOT NULL,
    PRIMARY KEY (seo_path_hash, std_path_hash)
);
CREATE INDEX IF NOT EXISTS idx_url_record_std_hash ON url_record (std_path_hash);
";

const COLUMNS: &str =
    "seo_path_hash, std_path_hash, locale, route_name, entity_id, seo_url, std_url, status, timestamp";

/// Synchronous store. The engine is request-scoped, so a single connection
/// behind a mutex is enough write concurrency; SQLite's constraints provide
/// the uniqueness guarantee under racing creates.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
    let status_raw: i64 = row.get("status")?;
    let status = UrlStatus::from_i64(status_raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Integer, Box::new(err))
    })?;
    Ok(UrlRecord {
        seo_path_hash: row.get::<_, i64>("seo_path_hash")? as u32,
        std_path_hash: row.get::<_, i64>("std_path_hash")? as u32,
        locale: row.get("locale")?,
        route_name: row.get("route_name")?,
        entity_id: row.get::<_, i64>("entity_id")? as u32,
        seo_url: row.get("seo_url")?,
        std_url: row.get("std_url")?,
        status,
        timestamp: row.get::<_, DateTime<Utc>>("timestamp")?,
    })
}

impl UrlStore for SqliteStore {
    fn find_by_seo_hash(
        &self,
        seo_hash: u32,
        locale: &str,
    ) -> Result<Option<UrlRecord>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM url_record \
             WHERE seo_path_hash = ? AND locale = ? \
             ORDER BY status ASC LIMIT 1"
        );
        let record = conn
            .query_row(&sql, params![i64::from(seo_hash), locale], record_from_row)
            .optional()?;
        Ok(record)
    }

    fn find_by_std_hash(&self, std_hash: u32) -> Result<Option<UrlRecord>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM url_record \
             WHERE std_path_hash = ? AND status = ? LIMIT 1"
        );
        let record = conn
            .query_row(
                &sql,
                params![i64::from(std_hash), UrlStatus::Ok.as_i64()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn find_active(
        &self,
        route_name: &str,
        entity_id: u32,
        locale: &str,
    ) -> Result<Option<UrlRecord>, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM url_record \
             WHERE route_name = ? AND entity_id = ? AND locale = ? AND status = ? LIMIT 1"
        );
        let record = conn
            .query_row(
                &sql,
                params![
                    route_name,
                    i64::from(entity_id),
                    locale,
                    UrlStatus::Ok.as_i64()
                ],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn find_alternates(
        &self,
        route_name: &str,
        entity_id: u32,
        exclude_locale: &str,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT locale, seo_url FROM url_record \
             WHERE route_name = ? AND entity_id = ? AND status = ? AND locale <> ?",
        )?;
        let rows = stmt.query_map(
            params![
                route_name,
                i64::from(entity_id),
                UrlStatus::Ok.as_i64(),
                exclude_locale
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let mut alternates = Vec::new();
        for row in rows {
            alternates.push(row?);
        }
        Ok(alternates)
    }

    fn check_unique(&self, candidate: &UrlRecord) -> Result<UniquenessCheck, StoreError> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {COLUMNS} FROM url_record \
             WHERE seo_path_hash = ? AND status = ? AND locale = ? AND seo_url = ? LIMIT 1"
        );
        let existing = conn
            .query_row(
                &sql,
                params![
                    i64::from(candidate.seo_path_hash),
                    UrlStatus::Ok.as_i64(),
                    candidate.locale,
                    candidate.seo_url
                ],
                record_from_row,
            )
            .optional()?;

        Ok(match existing {
            None => UniquenessCheck::Unique,
            Some(row) if row.identity_matches(candidate) => UniquenessCheck::SameIdentity(row),
            Some(row) => UniquenessCheck::Collision(row),
        })
    }

    fn upsert(&self, record: &UrlRecord) -> Result<UpsertOutcome, StoreError> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM url_record WHERE seo_path_hash = ? AND std_path_hash = ?",
                params![
                    i64::from(record.seo_path_hash),
                    i64::from(record.std_path_hash)
                ],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = if exists.is_some() {
            // Revival: a previously invalidated slug became active again.
            // Only status and timestamp move.
            tx.execute(
                "UPDATE url_record SET status = ?, timestamp = ? \
                 WHERE seo_path_hash = ? AND std_path_hash = ?",
                params![
                    UrlStatus::Ok.as_i64(),
                    Utc::now(),
                    i64::from(record.seo_path_hash),
                    i64::from(record.std_path_hash)
                ],
            )?;
            UpsertOutcome::Revived
        } else {
            tx.execute(
                &format!(
                    "INSERT INTO url_record ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    i64::from(record.seo_path_hash),
                    i64::from(record.std_path_hash),
                    record.locale,
                    record.route_name,
                    i64::from(record.entity_id),
                    record.seo_url,
                    record.std_url,
                    record.status.as_i64(),
                    record.timestamp
                ],
            )?;
            UpsertOutcome::Inserted
        };
        tx.commit()?;

        tracing::debug!(
            route = %record.route_name,
            seo_url = %record.seo_url,
            outcome = ?outcome,
            "url record persisted"
        );
        Ok(outcome)
    }

    fn repair_duplicate(&self, record: &UrlRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE url_record \
             SET std_path_hash = ?, std_url = ?, status = ?, timestamp = ? \
             WHERE seo_path_hash = ? AND route_name = ? AND entity_id = ? AND locale = ?",
            params![
                i64::from(record.std_path_hash),
                record.std_url,
                UrlStatus::Ok.as_i64(),
                Utc::now(),
                i64::from(record.seo_path_hash),
                record.route_name,
                i64::from(record.entity_id),
                record.locale
            ],
        )?;
        Ok(())
    }

    fn transition_status(
        &self,
        routes: &[String],
        locale: Option<&str>,
        scope: &ScopeFilter,
        to: UrlStatus,
    ) -> Result<usize, StoreError> {
        if routes.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; routes.len()].join(", ");
        let mut sql = format!(
            "UPDATE url_record SET status = ?, timestamp = ? \
             WHERE status = ? AND route_name IN ({placeholders})"
        );

        let mut values: Vec<Value> = vec![
            Value::Integer(to.as_i64()),
            Value::Text(Utc::now().to_rfc3339()),
            Value::Integer(UrlStatus::Ok.as_i64()),
        ];
        values.extend(routes.iter().map(|r| Value::Text(r.clone())));

        if let Some(locale) = locale {
            sql.push_str(" AND locale = ?");
            values.push(Value::Text(locale.to_string()));
        }
        if let Some(clause) = &scope.clause {
            sql.push_str(" AND ");
            sql.push_str(clause);
            values.extend(scope.params.iter().map(|p| match p {
                ScopeParam::Int(i) => Value::Integer(*i),
                ScopeParam::Text(t) => Value::Text(t.clone()),
            }));
        }

        let conn = self.conn.lock();
        let touched = conn.execute(&sql, params_from_iter(values))?;
        tracing::debug!(routes = ?routes, to = to.name(), touched, "status transition");
        Ok(touched)
    }
}
