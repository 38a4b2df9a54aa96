// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Vitrine data-sync core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Opaque identifier naming a display configuration (e.g. "briefing").
///
/// A `ProfileId` is only ever constructed from a value that belongs to the
/// configured known set; unknown values are rejected at the boundary and the
/// caller falls back to the next candidate source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

impl ProfileId {
    /// Validate `raw` against the known profile set.
    pub fn validate(raw: &str, known: &[String]) -> Result<Self, crate::VitrineError> {
        if known.iter().any(|k| k == raw) {
            Ok(ProfileId(raw.to_string()))
        } else {
            Err(crate::VitrineError::Validation(format!(
                "unsupported profile identifier: {raw}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One payload of dashboard data for a profile.
///
/// The named sections (weather, transit, events, tasks, artwork, ...) are
/// kept as a flattened JSON map so a new backend section never requires a
/// client change. A snapshot is immutable once received: a full snapshot
/// replaces the previous one wholesale, a `partial` one overlays recognized
/// fields via [`DashboardSnapshot::merge_partial`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Operating mode identifier, matching the profile at fetch time.
    #[serde(default)]
    pub mode: String,

    /// Server-assigned timestamp (epoch milliseconds). Partial merges stamp
    /// a fresh local timestamp instead.
    #[serde(default)]
    pub timestamp: i64,

    /// Marks a partial payload: recognized fields overlay the previous
    /// snapshot, unspecified fields remain.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,

    /// Named data sections keyed by section name.
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl DashboardSnapshot {
    /// Shallow-merge a partial update onto this snapshot.
    ///
    /// Fields present in `update` replace the corresponding section wholesale;
    /// everything else is retained from `self`. The result carries the given
    /// local timestamp and is no longer marked partial. Merging the same
    /// partial twice yields the same result as merging it once.
    pub fn merge_partial(&self, update: &DashboardSnapshot, timestamp: i64) -> DashboardSnapshot {
        let mut sections = self.sections.clone();
        for (key, value) in &update.sections {
            sections.insert(key.clone(), value.clone());
        }
        DashboardSnapshot {
            mode: if update.mode.is_empty() {
                self.mode.clone()
            } else {
                update.mode.clone()
            },
            timestamp,
            partial: false,
            sections,
        }
    }

    /// Age of this snapshot in milliseconds relative to `now`.
    pub fn age_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }
}

/// Connection state of the push channel. Exactly one value at a time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Payload of the synthetic local `state:change` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    #[serde(rename = "oldState")]
    pub old: ConnectionState,
    #[serde(rename = "newState")]
    pub new: ConnectionState,
}

/// One entry in the bounded profile-change history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileHistoryEntry {
    pub profile: ProfileId,
    pub timestamp: i64,
}

/// Maximum retained profile history entries, most-recent-first.
pub const PROFILE_HISTORY_CAP: usize = 10;

/// User-visible data freshness, derived from channel state and snapshot age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Channel connected and data within the freshness threshold.
    Fresh,
    /// Data present but older than the freshness threshold.
    Stale,
    /// Channel down and no recent data.
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(mode: &str, ts: i64, sections: Value) -> DashboardSnapshot {
        let mut snap: DashboardSnapshot = serde_json::from_value(sections).unwrap();
        snap.mode = mode.to_string();
        snap.timestamp = ts;
        snap
    }

    #[test]
    fn profile_id_validates_against_known_set() {
        let known = vec!["briefing".to_string(), "minimal".to_string()];
        assert!(ProfileId::validate("briefing", &known).is_ok());
        assert!(ProfileId::validate("bogus", &known).is_err());
    }

    #[test]
    fn snapshot_roundtrips_flattened_sections() {
        let raw = json!({
            "mode": "morning",
            "timestamp": 1700000000000_i64,
            "weather": {"temp": 42},
            "events": [{"title": "standup"}]
        });
        let snap: DashboardSnapshot = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(snap.mode, "morning");
        assert_eq!(snap.sections["weather"]["temp"], 42);

        let back = serde_json::to_value(&snap).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn merge_partial_overlays_only_named_sections() {
        let base = snapshot(
            "morning",
            1000,
            json!({"weather": {"temp": 42}, "events": ["a"], "tasks": ["old"]}),
        );
        let update = snapshot("", 0, json!({"partial": true, "tasks": ["new", "newer"]}));

        let merged = base.merge_partial(&update, 2000);
        assert_eq!(merged.sections["weather"]["temp"], 42);
        assert_eq!(merged.sections["events"], json!(["a"]));
        assert_eq!(merged.sections["tasks"], json!(["new", "newer"]));
        assert_eq!(merged.timestamp, 2000);
        assert_eq!(merged.mode, "morning");
        assert!(!merged.partial);
    }

    #[test]
    fn merge_partial_is_idempotent() {
        let base = snapshot("m", 1000, json!({"weather": {"temp": 1}, "tasks": ["x"]}));
        let update = snapshot("", 0, json!({"partial": true, "tasks": ["y"]}));

        let once = base.merge_partial(&update, 2000);
        let twice = once.merge_partial(&update, 2000);
        assert_eq!(once, twice);
    }

    #[test]
    fn connection_state_display_roundtrip() {
        use std::str::FromStr;
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Error,
        ] {
            let s = state.to_string();
            assert_eq!(ConnectionState::from_str(&s).unwrap(), state);
        }
    }

    #[test]
    fn state_change_serializes_with_wire_field_names() {
        let change = StateChange {
            old: ConnectionState::Connecting,
            new: ConnectionState::Connected,
        };
        let v = serde_json::to_value(change).unwrap();
        assert_eq!(v["oldState"], "connecting");
        assert_eq!(v["newState"], "connected");
    }
}
