// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Durable, append-only event log backed by SQLite

use chrono::{Local, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{lock_or_abort, StoreError};

/// A persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Auto-incrementing row id
    pub id: i64,
    /// Category ("Motion", "Sensor", "CRITICAL ALERT", "System", ...)
    pub event_type: String,
    /// Free-form text
    pub description: String,
    /// Seconds since the Unix epoch; never decreases across inserts
    pub timestamp: f64,
}

impl Event {
    /// Local wall-clock rendering for display
    pub fn formatted_time(&self) -> String {
        let secs = self.timestamp.floor() as i64;
        let nanos = ((self.timestamp - self.timestamp.floor()) * 1e9) as u32;
        Local
            .timestamp_opt(secs, nanos)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            event_type: row.get(1)?,
            description: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }
}

struct StoreInner {
    conn: Connection,
    last_timestamp: f64,
}

/// Thread-safe event store.
///
/// A single lock serializes every statement, so readers never observe a
/// half-committed insert and timestamps are assigned in insertion order.
pub struct EventStore {
    inner: Mutex<StoreInner>,
    path: Option<PathBuf>,
}

impl EventStore {
    /// Open or create the database described by `config`
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Self::open_path(&config.path)
    }

    /// Open or create a database file
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;

        let store = Self::with_connection(conn, Some(path.to_path_buf()))?;
        info!("Event store opened at {:?}", path);
        Ok(store)
    }

    /// Volatile store, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                description TEXT NOT NULL,
                timestamp REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
            "#,
        )?;

        // Resume the clock from the newest stored row so ordering survives restarts.
        let last_timestamp: f64 = conn.query_row(
            "SELECT COALESCE(MAX(timestamp), 0.0) FROM events",
            [],
            |row| row.get(0),
        )?;

        Ok(Self {
            inner: Mutex::new(StoreInner { conn, last_timestamp }),
            path,
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        lock_or_abort(&self.inner, "event store")
    }

    /// Location of the database file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an event stamped with the current time
    pub fn append(&self, event_type: &str, description: &str) -> Result<Event, StoreError> {
        let mut inner = self.lock();

        let timestamp = now_seconds().max(inner.last_timestamp);
        inner.conn.execute(
            "INSERT INTO events (event_type, description, timestamp) VALUES (?1, ?2, ?3)",
            params![event_type, description, timestamp],
        )?;
        let id = inner.conn.last_insert_rowid();
        inner.last_timestamp = timestamp;

        debug!("Stored event #{} [{}] {}", id, event_type, description);
        Ok(Event {
            id,
            event_type: event_type.to_string(),
            description: description.to_string(),
            timestamp,
        })
    }

    /// Newest events first
    pub fn query_events(&self, limit: usize) -> Result<Vec<Event>, StoreError> {
        let inner = self.lock();
        let mut stmt = inner.conn.prepare(
            "SELECT id, event_type, description, timestamp FROM events
             ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Event::from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Newest events of one category first
    pub fn query_events_by_type(
        &self,
        event_type: &str,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError> {
        let inner = self.lock();
        let mut stmt = inner.conn.prepare(
            "SELECT id, event_type, description, timestamp FROM events
             WHERE event_type = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![event_type, limit as i64], Event::from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Total number of stored events
    pub fn count(&self) -> Result<usize, StoreError> {
        let inner = self.lock();
        let count: i64 = inner.conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete events older than the retention window
    pub fn cleanup(&self, retention_days: u32) -> Result<usize, StoreError> {
        let inner = self.lock();

        let cutoff = now_seconds() - f64::from(retention_days) * 86_400.0;
        let deleted = inner
            .conn
            .execute("DELETE FROM events WHERE timestamp < ?1", params![cutoff])?;

        // Vacuum to reclaim space
        inner.conn.execute("VACUUM", [])?;

        info!("Cleaned up {} events older than {} days", deleted, retention_days);
        Ok(deleted)
    }

    /// Drop the events table so every later statement fails
    #[cfg(test)]
    pub(crate) fn break_schema(&self) {
        self.lock().conn.execute_batch("DROP TABLE events").unwrap();
    }
}

fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
