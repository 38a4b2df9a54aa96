// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Namespaced key-value cache with per-entry TTL.
//!
//! The public API never returns errors: the cache is an availability aid,
//! so a failing read behaves as a miss and a failing write reports `false`.
//! Failures are logged and the system continues with live data.

use std::time::Duration;

use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use vitrine_core::{now_ms, VitrineError};

use crate::database::{map_tr_err, Database};

/// A view of the cache scoped to one namespace. Cheap to clone.
#[derive(Clone)]
pub struct CacheStore {
    db: Database,
    namespace: String,
}

impl CacheStore {
    pub fn new(db: Database, namespace: &str) -> Self {
        Self {
            db,
            namespace: namespace.to_string(),
        }
    }

    /// Store `value` under `key`. `ttl` of `None` means the entry never
    /// expires and is only removed by an explicit write or remove.
    ///
    /// Returns whether the write succeeded. On failure the expired rows are
    /// swept and the write is retried once before giving up.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "cache put: serialization failed");
                return false;
            }
        };

        match self.put_raw(key, &json, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "cache put failed, sweeping and retrying");
                let _ = self.sweep_expired().await;
                match self.put_raw(key, &json, ttl).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(namespace = %self.namespace, key, error = %e, "cache put failed after retry");
                        false
                    }
                }
            }
        }
    }

    /// Read `key`, returning `None` on miss, expiry, or malformed content.
    ///
    /// An entry found expired is deleted before returning, as is an entry
    /// whose JSON no longer deserializes into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_raw(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "cache get failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "cache entry malformed, deleting");
                self.remove(key).await;
                None
            }
        }
    }

    /// Delete `key` if present. A failing delete is logged and ignored.
    pub async fn remove(&self, key: &str) {
        let namespace = self.namespace.clone();
        let key_owned = key.to_string();
        let result = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM cache_entries WHERE namespace = ?1 AND key = ?2",
                    params![namespace, key_owned],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        if let Err(e) = result {
            warn!(namespace = %self.namespace, key, error = %e, "cache remove failed");
        }
    }

    /// Delete every entry in this namespace.
    pub async fn clear(&self) {
        let namespace = self.namespace.clone();
        let result = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM cache_entries WHERE namespace = ?1",
                    params![namespace],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        if let Err(e) = result {
            warn!(namespace = %self.namespace, error = %e, "cache clear failed");
        }
    }

    /// Delete all expired entries in this namespace. Returns how many rows
    /// were removed.
    pub async fn sweep_expired(&self) -> usize {
        let namespace = self.namespace.clone();
        let now = now_ms();
        let result = self
            .db
            .connection()
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM cache_entries
                     WHERE namespace = ?1 AND ttl_ms IS NOT NULL AND created_at_ms + ttl_ms <= ?2",
                    params![namespace, now],
                )?;
                Ok(n)
            })
            .await
            .map_err(map_tr_err);
        match result {
            Ok(n) => {
                if n > 0 {
                    debug!(removed = n, "swept expired cache entries");
                }
                n
            }
            Err(e) => {
                warn!(error = %e, "cache sweep failed");
                0
            }
        }
    }

    async fn put_raw(
        &self,
        key: &str,
        json: &str,
        ttl: Option<Duration>,
    ) -> Result<(), VitrineError> {
        let namespace = self.namespace.clone();
        let key = key.to_string();
        let json = json.to_string();
        let created_at = now_ms();
        let ttl_ms = ttl.map(|d| d.as_millis() as i64);
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cache_entries (namespace, key, value, created_at_ms, ttl_ms)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (namespace, key)
                     DO UPDATE SET value = ?3, created_at_ms = ?4, ttl_ms = ?5",
                    params![namespace, key, json, created_at, ttl_ms],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, VitrineError> {
        let namespace = self.namespace.clone();
        let key_owned = key.to_string();
        let now = now_ms();
        let row = self
            .db
            .connection()
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT value, created_at_ms, ttl_ms FROM cache_entries
                     WHERE namespace = ?1 AND key = ?2",
                    params![namespace, key_owned],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, Option<i64>>(2)?,
                        ))
                    },
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)?;

        let Some((value, created_at, ttl_ms)) = row else {
            return Ok(None);
        };

        if let Some(ttl_ms) = ttl_ms {
            if created_at + ttl_ms <= now {
                debug!(namespace = %self.namespace, key, "cache entry expired, deleting");
                self.remove(key).await;
                return Ok(None);
            }
        }

        Ok(Some(value))
    }
}
