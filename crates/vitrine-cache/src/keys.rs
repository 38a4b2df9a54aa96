// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Well-known cache namespaces and keys.

/// Namespace for dashboard snapshot storage.
pub const NS_DASHBOARD: &str = "dashboard";

/// Current snapshot for the active profile, stored with the configured TTL.
pub const KEY_DATA: &str = "data";

/// Most recent successfully fetched snapshot, stored without expiry.
/// Used as a last-resort fallback when both network and fresh cache fail.
pub const KEY_LAST_KNOWN_GOOD: &str = "last-known-good";

/// Namespace for profile state.
pub const NS_PROFILE: &str = "profile";

/// The active profile identifier, stored without expiry.
pub const KEY_CURRENT: &str = "current";

/// Bounded history of profile changes, most recent first.
pub const KEY_HISTORY: &str = "history";
