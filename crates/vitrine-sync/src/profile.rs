// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile coordinator: resolution, validated switching, history.
//!
//! The active profile is resolved once at startup (cache, then backend,
//! then configured default) and changed afterwards either locally through
//! [`ProfileCoordinator::set_profile`] or by an authoritative pushed
//! `profile:changed` event. Local changes commit optimistically and roll
//! back if the backend rejects them.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use vitrine_cache::{keys, CacheStore};
use vitrine_channel::{PushChannel, EVENT_PROFILE_CHANGED};
use vitrine_config::DisplayConfig;
use vitrine_core::{now_ms, ProfileHistoryEntry, ProfileId, VitrineError, PROFILE_HISTORY_CAP};
use vitrine_gateway::Gateway;

/// Lifecycle of the coordinator's knowledge of the active profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilePhase {
    /// Startup; nothing resolved yet.
    Unresolved,
    /// Resolution in progress.
    Resolving,
    /// A profile is active.
    Resolved,
}

/// Handle to the profile coordinator. Cheap to clone.
#[derive(Clone)]
pub struct ProfileCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    gateway: Gateway,
    cache: CacheStore,
    channel: PushChannel,
    known_profiles: Vec<String>,
    default_profile: String,
    current: RwLock<Option<ProfileId>>,
    phase: RwLock<ProfilePhase>,
}

impl ProfileCoordinator {
    pub fn new(
        gateway: Gateway,
        cache: CacheStore,
        channel: PushChannel,
        config: &DisplayConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                gateway,
                cache,
                channel,
                known_profiles: config.known_profiles.clone(),
                default_profile: config.default_profile.clone(),
                current: RwLock::new(None),
                phase: RwLock::new(ProfilePhase::Unresolved),
            }),
        }
    }

    pub fn phase(&self) -> ProfilePhase {
        *self
            .inner
            .phase
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The active profile, if resolution has completed.
    pub fn current(&self) -> Option<ProfileId> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve the active profile: persisted value, then the backend's
    /// answer, then the configured default. Invalid identifiers from any
    /// source are rejected and the next source tried.
    pub async fn resolve(&self) -> ProfileId {
        self.set_phase(ProfilePhase::Resolving);

        let resolved = match self.cached_profile().await {
            Some(profile) => {
                debug!(profile = %profile, "profile resolved from cache");
                profile
            }
            None => match self.backend_profile().await {
                Some(profile) => {
                    debug!(profile = %profile, "profile resolved from backend");
                    profile
                }
                None => {
                    // Config validation guarantees the default is known.
                    info!(profile = %self.inner.default_profile, "profile resolved from default");
                    ProfileId(self.inner.default_profile.clone())
                }
            },
        };

        self.store_current(&resolved).await;
        self.set_phase(ProfilePhase::Resolved);
        resolved
    }

    /// Switch the active profile. Unknown identifiers are rejected before
    /// anything changes.
    ///
    /// The change applies optimistically (memory, cache, history) before
    /// the backend confirms, so the display reacts instantly. A backend
    /// rejection rolls everything back and surfaces the error. A confirmed
    /// change is broadcast over the push channel best-effort.
    pub async fn set_profile(&self, raw: &str) -> Result<ProfileId, VitrineError> {
        let profile = ProfileId::validate(raw, &self.inner.known_profiles)?;
        let prior = self.current();
        if prior.as_ref() == Some(&profile) {
            debug!(profile = %profile, "profile unchanged");
            return Ok(profile);
        }

        // Optimistic commit.
        self.store_current(&profile).await;
        self.append_history(&profile).await;

        if let Err(e) = self.inner.gateway.set_profile(&profile).await {
            warn!(profile = %profile, error = %e, "backend rejected profile change, rolling back");
            self.rollback(prior, &profile).await;
            return Err(e);
        }

        info!(profile = %profile, "profile changed");
        if let Err(e) = self
            .inner
            .channel
            .send(EVENT_PROFILE_CHANGED, json!({ "profile": profile.as_str() }))
        {
            // Broadcast is best-effort; the committed change stands.
            debug!(error = %e, "profile change broadcast skipped");
        }
        Ok(profile)
    }

    /// Adopt a pushed `profile:changed` event. The backend is
    /// authoritative here: no confirmation round-trip, no rollback.
    /// Returns the adopted profile when it differed from the current one.
    pub async fn handle_profile_changed(&self, data: &Value) -> Option<ProfileId> {
        let raw = match data {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("profile").and_then(Value::as_str)?,
            _ => {
                warn!("ignoring malformed profile change event");
                return None;
            }
        };
        let profile = match ProfileId::validate(raw, &self.inner.known_profiles) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(profile = raw, error = %e, "ignoring pushed unknown profile");
                return None;
            }
        };
        if self.current().as_ref() == Some(&profile) {
            return None;
        }

        info!(profile = %profile, "adopting pushed profile change");
        self.store_current(&profile).await;
        self.append_history(&profile).await;
        Some(profile)
    }

    /// Wire pushed profile changes to this coordinator. `on_change` runs
    /// after each adopted change so collaborators can reload data.
    pub fn attach<F>(&self, on_change: F)
    where
        F: Fn(ProfileId) + Send + Sync + 'static,
    {
        let coordinator = self.clone();
        let on_change = Arc::new(on_change);
        self.inner
            .channel
            .subscribe(EVENT_PROFILE_CHANGED, move |data| {
                let coordinator = coordinator.clone();
                let on_change = Arc::clone(&on_change);
                let data = data.clone();
                tokio::spawn(async move {
                    if let Some(profile) = coordinator.handle_profile_changed(&data).await {
                        on_change(profile);
                    }
                });
            });
    }

    /// Profile change history, most recent first, capped at
    /// [`PROFILE_HISTORY_CAP`] entries.
    pub async fn history(&self) -> Vec<ProfileHistoryEntry> {
        self.inner
            .cache
            .get(keys::KEY_HISTORY)
            .await
            .unwrap_or_default()
    }

    async fn cached_profile(&self) -> Option<ProfileId> {
        let raw: String = self.inner.cache.get(keys::KEY_CURRENT).await?;
        match ProfileId::validate(&raw, &self.inner.known_profiles) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(profile = %raw, error = %e, "cached profile invalid, trying backend");
                None
            }
        }
    }

    async fn backend_profile(&self) -> Option<ProfileId> {
        let raw = match self.inner.gateway.current_profile().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "backend profile unavailable, using default");
                return None;
            }
        };
        match ProfileId::validate(&raw, &self.inner.known_profiles) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(profile = %raw, error = %e, "backend profile invalid, using default");
                None
            }
        }
    }

    async fn store_current(&self, profile: &ProfileId) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(profile.clone());
        self.inner
            .cache
            .put(keys::KEY_CURRENT, &profile.as_str(), None)
            .await;
    }

    async fn rollback(&self, prior: Option<ProfileId>, attempted: &ProfileId) {
        self.remove_history_head(attempted).await;
        match prior {
            Some(prior) => self.store_current(&prior).await,
            None => {
                *self
                    .inner
                    .current
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = None;
                self.inner.cache.remove(keys::KEY_CURRENT).await;
            }
        }
    }

    async fn append_history(&self, profile: &ProfileId) {
        let mut history = self.history().await;
        history.insert(
            0,
            ProfileHistoryEntry {
                profile: profile.clone(),
                timestamp: now_ms(),
            },
        );
        history.truncate(PROFILE_HISTORY_CAP);
        self.inner.cache.put(keys::KEY_HISTORY, &history, None).await;
    }

    async fn remove_history_head(&self, profile: &ProfileId) {
        let mut history = self.history().await;
        if history.first().is_some_and(|entry| &entry.profile == profile) {
            history.remove(0);
            self.inner.cache.put(keys::KEY_HISTORY, &history, None).await;
        }
    }

    fn set_phase(&self, phase: ProfilePhase) {
        *self
            .inner
            .phase
            .write()
            .unwrap_or_else(PoisonError::into_inner) = phase;
    }
}
