// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the Vitrine display client.
//!
//! Config is merged from compiled defaults, TOML files on the XDG
//! hierarchy, and `VITRINE_*` environment variables, then validated
//! for semantic consistency before anything starts.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    CacheConfig, ChannelConfig, DisplayConfig, ServerConfig, SyncConfig, VitrineConfig,
};
pub use validate::validate;
