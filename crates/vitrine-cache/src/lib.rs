// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed local cache for the Vitrine display client.
//!
//! A small namespaced key-value store with per-entry TTL. Reads that hit
//! an expired or malformed entry behave as misses, and the expired row is
//! removed eagerly. Storage failures degrade to "no cache" so the rest of
//! the client keeps working from live data.

pub mod database;
pub mod keys;
pub mod store;

pub use database::Database;
pub use store::CacheStore;
