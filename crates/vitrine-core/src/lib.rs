// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vitrine display client.
//!
//! This crate provides the shared error taxonomy and data model used
//! throughout the Vitrine workspace: dashboard snapshots, profile
//! identifiers, and connection state.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VitrineError;
pub use types::{
    ConnectionState, DashboardSnapshot, Freshness, ProfileHistoryEntry, ProfileId, StateChange,
    now_ms, PROFILE_HISTORY_CAP,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitrine_error_has_all_variants() {
        // Verify all 9 error variants exist and can be constructed.
        let _config = VitrineError::Config("test".into());
        let _network = VitrineError::Network {
            message: "test".into(),
            source: None,
        };
        let _http = VitrineError::Http {
            status: 404,
            body: "not found".into(),
        };
        let _parse = VitrineError::Parse {
            message: "test".into(),
        };
        let _validation = VitrineError::Validation("test".into());
        let _storage = VitrineError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = VitrineError::Channel {
            message: "test".into(),
            source: None,
        };
        let _timeout = VitrineError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = VitrineError::Internal("test".into());
    }

    #[test]
    fn connection_state_serialization() {
        let state = ConnectionState::Connected;
        let json = serde_json::to_string(&state).expect("should serialize");
        let parsed: ConnectionState = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(state, parsed);
        assert_eq!(json, "\"connected\"");
    }
}
