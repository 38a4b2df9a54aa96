// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilient WebSocket push channel for the Vitrine display client.
//!
//! Wraps a WebSocket connection in a supervisor that reconnects forever
//! with exponential backoff, runs an application-level heartbeat, and
//! fans incoming `{event, data}` frames out to explicit subscribers.

pub mod backoff;
pub mod client;
pub mod events;

pub use backoff::ReconnectBackoff;
pub use client::PushChannel;
pub use events::{
    HandlerRegistry, SubscriptionId, WireFrame, EVENT_CONNECTION, EVENT_DASHBOARD_UPDATE,
    EVENT_PING, EVENT_PONG, EVENT_PROFILE_CHANGED, EVENT_STATE_CHANGE,
};
