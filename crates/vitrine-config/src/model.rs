// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vitrine display client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Vitrine configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VitrineConfig {
    /// Backend gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Profile set and logging settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Data synchronization settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Push channel settings.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Backend gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Primary backend base URL for HTTP requests.
    #[serde(default = "default_http_base_url")]
    pub http_base_url: String,

    /// WebSocket URL for the push channel.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Fallback hosts tried in order when the primary host is unreachable.
    /// Each entry replaces the host portion of `http_base_url`.
    #[serde(default)]
    pub fallback_hosts: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_base_url: default_http_base_url(),
            ws_url: default_ws_url(),
            fallback_hosts: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_http_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:3000/ws".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Profile set and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Profile used when neither cache nor backend yields a valid one.
    #[serde(default = "default_profile")]
    pub default_profile: String,

    /// The set of profile identifiers this deployment recognizes.
    #[serde(default = "default_known_profiles")]
    pub known_profiles: Vec<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable verbose diagnostics.
    #[serde(default)]
    pub debug: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_profile: default_profile(),
            known_profiles: default_known_profiles(),
            log_level: default_log_level(),
            debug: false,
        }
    }
}

fn default_profile() -> String {
    "briefing".to_string()
}

fn default_known_profiles() -> Vec<String> {
    vec![
        "briefing".to_string(),
        "minimal".to_string(),
        "ambient".to_string(),
        "focus".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Data synchronization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Polling interval in seconds, used only while the push channel is down.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Time-to-live for cached dashboard snapshots, in seconds.
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_snapshot_ttl_secs() -> u64 {
    60
}

/// Push channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Heartbeat ping interval in seconds.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Initial reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,

    /// Upper bound on the reconnect delay, in seconds.
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,

    /// Exponential backoff multiplier applied per failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_heartbeat_interval_secs() -> u64 {
    25
}

fn default_reconnect_initial_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_secs() -> u64 {
    30
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Local cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Path to the SQLite cache database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vitrine").join("cache.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("cache.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}
