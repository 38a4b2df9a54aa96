// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Vitrine display client.
//!
//! Thin typed wrapper over the backend's REST endpoints with ordered
//! multi-host fallback for connection failures.

pub mod client;

pub use client::Gateway;
