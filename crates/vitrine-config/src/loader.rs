// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vitrine.toml` > `~/.config/vitrine/vitrine.toml` > `/etc/vitrine/vitrine.toml`
//! with environment variable overrides via `VITRINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VitrineConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vitrine/vitrine.toml` (system-wide)
/// 3. `~/.config/vitrine/vitrine.toml` (user XDG config)
/// 4. `./vitrine.toml` (local directory)
/// 5. `VITRINE_*` environment variables
pub fn load_config() -> Result<VitrineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VitrineConfig::default()))
        .merge(Toml::file("/etc/vitrine/vitrine.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vitrine/vitrine.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vitrine.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<VitrineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VitrineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VitrineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VitrineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `VITRINE_SYNC_POLL_INTERVAL_SECS`
/// must map to `sync.poll_interval_secs`, not `sync.poll.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("VITRINE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: VITRINE_SERVER_HTTP_BASE_URL -> "server_http_base_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("display_", "display.", 1)
            .replacen("sync_", "sync.", 1)
            .replacen("channel_", "channel.", 1)
            .replacen("cache_", "cache.", 1);
        mapped.into()
    })
}
