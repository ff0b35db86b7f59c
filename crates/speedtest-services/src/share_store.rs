//! Shared report storage.
//!
//! Reports are opaque JSON documents kept for a fixed retention window.
//! Expired rows are swept opportunistically whenever a report is read
//! (see [`fetch_live`]) and by the daemon's periodic purge loop.
//!
//! Two backends:
//! - `SqliteShareStore` — durable, one SQLite file.
//! - `MemoryShareStore` — process-local `DashMap`, lost on restart.

use std::path::Path;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone, PartialEq)]
pub struct SharedReport {
    pub share_id: String,
    pub report_data: serde_json::Value,
    /// Unix ms.
    pub created_at_ms: i64,
    /// Unix ms.
    pub expires_at_ms: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareStoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored report {0} is not valid JSON: {1}")]
    CorruptPayload(String, serde_json::Error),
    #[error("failed to create store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("share store lock poisoned")]
    Poisoned,
}

pub trait ShareStore: Send + Sync {
    fn put(
        &self,
        share_id: &str,
        report_data: &serde_json::Value,
        created_at_ms: i64,
        expires_at_ms: i64,
    ) -> Result<(), ShareStoreError>;

    fn get(&self, share_id: &str) -> Result<Option<SharedReport>, ShareStoreError>;

    fn delete(&self, share_id: &str) -> Result<(), ShareStoreError>;

    /// Drop every report whose expiry is before `now_ms`. Returns the count removed.
    fn purge_expired(&self, now_ms: i64) -> Result<usize, ShareStoreError>;
}

/// Outcome of a read through [`fetch_live`].
#[derive(Debug, Clone, PartialEq)]
pub enum ShareLookup {
    Found(SharedReport),
    Missing,
    Expired,
}

/// Read a report the way the HTTP edge does: sweep expired rows, look the id
/// up, and delete it if it lapsed between the sweep and now.
pub fn fetch_live(
    store: &dyn ShareStore,
    share_id: &str,
    now_ms: i64,
) -> Result<ShareLookup, ShareStoreError> {
    let purged = store.purge_expired(now_ms)?;
    if purged > 0 {
        tracing::debug!(purged, "expired shared reports removed");
    }

    match store.get(share_id)? {
        None => Ok(ShareLookup::Missing),
        Some(report) if now_ms > report.expires_at_ms => {
            store.delete(share_id)?;
            Ok(ShareLookup::Expired)
        }
        Some(report) => Ok(ShareLookup::Found(report)),
    }
}

/// 12 lowercase hex characters.
pub fn new_share_id() -> String {
    let mut raw = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut raw);
    hex::encode(raw)
}

// ── SQLite ────────────────────────────────────────────────────────────────────

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS shared_reports (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        share_id    TEXT UNIQUE NOT NULL,
        report_data TEXT NOT NULL,
        created_at  INTEGER NOT NULL,
        expires_at  INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_share_id ON shared_reports (share_id);
    CREATE INDEX IF NOT EXISTS idx_expires_at ON shared_reports (expires_at);
";

#[derive(Clone)]
pub struct SqliteShareStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteShareStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ShareStoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, ShareStoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ShareStoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, ShareStoreError>,
    ) -> Result<T, ShareStoreError> {
        let conn = self.conn.lock().map_err(|_| ShareStoreError::Poisoned)?;
        f(&conn)
    }
}

impl ShareStore for SqliteShareStore {
    fn put(
        &self,
        share_id: &str,
        report_data: &serde_json::Value,
        created_at_ms: i64,
        expires_at_ms: i64,
    ) -> Result<(), ShareStoreError> {
        let text = report_data.to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO shared_reports (share_id, report_data, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![share_id, text, created_at_ms, expires_at_ms],
            )?;
            Ok(())
        })
    }

    fn get(&self, share_id: &str) -> Result<Option<SharedReport>, ShareStoreError> {
        let row = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT report_data, created_at, expires_at
                     FROM shared_reports WHERE share_id = ?1",
                    params![share_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .optional()?)
        })?;

        let Some((text, created_at_ms, expires_at_ms)) = row else {
            return Ok(None);
        };
        let report_data = serde_json::from_str(&text)
            .map_err(|e| ShareStoreError::CorruptPayload(share_id.to_string(), e))?;
        Ok(Some(SharedReport {
            share_id: share_id.to_string(),
            report_data,
            created_at_ms,
            expires_at_ms,
        }))
    }

    fn delete(&self, share_id: &str) -> Result<(), ShareStoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM shared_reports WHERE share_id = ?1",
                params![share_id],
            )?;
            Ok(())
        })
    }

    fn purge_expired(&self, now_ms: i64) -> Result<usize, ShareStoreError> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM shared_reports WHERE expires_at < ?1",
                params![now_ms],
            )?)
        })
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryShareStore {
    reports: Arc<DashMap<String, SharedReport>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl ShareStore for MemoryShareStore {
    fn put(
        &self,
        share_id: &str,
        report_data: &serde_json::Value,
        created_at_ms: i64,
        expires_at_ms: i64,
    ) -> Result<(), ShareStoreError> {
        self.reports.insert(
            share_id.to_string(),
            SharedReport {
                share_id: share_id.to_string(),
                report_data: report_data.clone(),
                created_at_ms,
                expires_at_ms,
            },
        );
        Ok(())
    }

    fn get(&self, share_id: &str) -> Result<Option<SharedReport>, ShareStoreError> {
        Ok(self.reports.get(share_id).map(|r| r.clone()))
    }

    fn delete(&self, share_id: &str) -> Result<(), ShareStoreError> {
        self.reports.remove(share_id);
        Ok(())
    }

    fn purge_expired(&self, now_ms: i64) -> Result<usize, ShareStoreError> {
        let before = self.reports.len();
        self.reports.retain(|_, r| r.expires_at_ms >= now_ms);
        Ok(before.saturating_sub(self.reports.len()))
    }
}
