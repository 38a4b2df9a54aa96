// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use tokio_rusqlite::Connection;
use tracing::debug;
use vitrine_core::VitrineError;

/// Schema for the cache table. One row per (namespace, key); `ttl_ms` NULL
/// means the entry never expires.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    namespace     TEXT NOT NULL,
    key           TEXT NOT NULL,
    value         TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL,
    ttl_ms        INTEGER,
    PRIMARY KEY (namespace, key)
);
";

/// Map a tokio-rusqlite error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> VitrineError {
    VitrineError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the cache database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the cache database at `path` and apply the schema.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, VitrineError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| VitrineError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        // tokio-rusqlite's open surfaces the underlying rusqlite error.
        let conn = Connection::open(path).await.map_err(|e| VitrineError::Storage {
            source: Box::new(e),
        })?;
        conn.call(move |conn| {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
            }
            conn.execute_batch("PRAGMA foreign_keys=ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "cache database opened");
        Ok(Self { conn })
    }

    /// Open an ephemeral in-memory database.
    pub async fn open_in_memory() -> Result<Self, VitrineError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| VitrineError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Access the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), VitrineError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
