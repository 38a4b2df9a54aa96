// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard data synchronization for the Vitrine display client.
//!
//! Two coordinators live here. The [`Synchronizer`] keeps the in-memory
//! dashboard snapshot current through pushed updates and polling, backed
//! by the persistent cache for offline fallback. The
//! [`ProfileCoordinator`] resolves and switches the active display
//! profile, keeping the backend, the cache, and other displays in
//! agreement.

pub mod profile;
pub mod synchronizer;

pub use profile::{ProfileCoordinator, ProfilePhase};
pub use synchronizer::{SyncState, Synchronizer};
