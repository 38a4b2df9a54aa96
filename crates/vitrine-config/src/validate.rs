// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation run after the config is structurally loaded.
//!
//! Figment and serde catch unknown keys and type mismatches; this module
//! catches values that parse fine but cannot work at runtime.

use url::Url;
use vitrine_core::VitrineError;

use crate::model::VitrineConfig;

/// Validate cross-field constraints on a loaded configuration.
pub fn validate(config: &VitrineConfig) -> Result<(), VitrineError> {
    let http = Url::parse(&config.server.http_base_url).map_err(|e| {
        VitrineError::Config(format!("server.http_base_url is not a valid URL: {e}"))
    })?;
    if http.host_str().is_none() {
        return Err(VitrineError::Config(
            "server.http_base_url must include a host".to_string(),
        ));
    }

    let ws = Url::parse(&config.server.ws_url)
        .map_err(|e| VitrineError::Config(format!("server.ws_url is not a valid URL: {e}")))?;
    if !matches!(ws.scheme(), "ws" | "wss") {
        return Err(VitrineError::Config(format!(
            "server.ws_url must use the ws or wss scheme, got '{}'",
            ws.scheme()
        )));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(VitrineError::Config(
            "server.request_timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.display.known_profiles.is_empty() {
        return Err(VitrineError::Config(
            "display.known_profiles must not be empty".to_string(),
        ));
    }

    if !config
        .display
        .known_profiles
        .contains(&config.display.default_profile)
    {
        return Err(VitrineError::Config(format!(
            "display.default_profile '{}' is not listed in display.known_profiles",
            config.display.default_profile
        )));
    }

    if config.channel.heartbeat_interval_secs == 0 {
        return Err(VitrineError::Config(
            "channel.heartbeat_interval_secs must be at least 1".to_string(),
        ));
    }

    if config.channel.reconnect_initial_delay_ms == 0 {
        return Err(VitrineError::Config(
            "channel.reconnect_initial_delay_ms must be at least 1".to_string(),
        ));
    }

    if config.channel.reconnect_max_delay_secs * 1_000 < config.channel.reconnect_initial_delay_ms
    {
        return Err(VitrineError::Config(
            "channel.reconnect_max_delay_secs must be >= channel.reconnect_initial_delay_ms"
                .to_string(),
        ));
    }

    if config.channel.backoff_multiplier < 1.0 {
        return Err(VitrineError::Config(
            "channel.backoff_multiplier must be >= 1.0".to_string(),
        ));
    }

    Ok(())
}
