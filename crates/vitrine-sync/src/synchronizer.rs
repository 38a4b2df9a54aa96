// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard data synchronizer.
//!
//! Owns the current [`DashboardSnapshot`] and keeps it current from two
//! mutually exclusive acquisition paths: pushed `dashboard:update` frames
//! while the channel is connected, and a polling loop while it is not.
//! A single in-flight guard makes "at most one fetch at a time"
//! structural; redundant triggers are dropped, never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vitrine_cache::{keys, CacheStore};
use vitrine_channel::{PushChannel, EVENT_DASHBOARD_UPDATE, EVENT_STATE_CHANGE};
use vitrine_config::SyncConfig;
use vitrine_core::{
    now_ms, ConnectionState, DashboardSnapshot, Freshness, ProfileId, StateChange,
};
use vitrine_gateway::Gateway;

/// Observable synchronizer state, read by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Current snapshot, if any data has ever been acquired.
    pub snapshot: Option<DashboardSnapshot>,
    /// True while an initial or profile-change load is underway.
    pub loading: bool,
    /// Last acquisition error, cleared by the next success.
    pub last_error: Option<String>,
    /// When the snapshot last changed (epoch milliseconds).
    pub last_updated: Option<i64>,
}

/// Handle to the synchronizer. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    gateway: Gateway,
    cache: CacheStore,
    channel: PushChannel,
    profile: RwLock<ProfileId>,
    state: RwLock<SyncState>,
    fetch_in_flight: AtomicBool,
    snapshot_ttl: Duration,
    poll_interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Synchronizer {
    pub fn new(
        gateway: Gateway,
        cache: CacheStore,
        channel: PushChannel,
        profile: ProfileId,
        config: &SyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                gateway,
                cache,
                channel,
                profile: RwLock::new(profile),
                state: RwLock::new(SyncState::default()),
                fetch_in_flight: AtomicBool::new(false),
                snapshot_ttl: Duration::from_secs(config.snapshot_ttl_secs),
                poll_interval: Duration::from_secs(config.poll_interval_secs),
                poller: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the observable state.
    pub fn state(&self) -> SyncState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The profile whose data this synchronizer fetches.
    pub fn active_profile(&self) -> ProfileId {
        self.inner
            .profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch the profile used for future fetches. The caller follows up
    /// with [`Synchronizer::load`] to replace the displayed data.
    pub fn set_active_profile(&self, profile: ProfileId) {
        *self
            .inner
            .profile
            .write()
            .unwrap_or_else(PoisonError::into_inner) = profile;
    }

    /// Derived data freshness for the presentation layer.
    pub fn freshness(&self) -> Freshness {
        let state = self.state();
        match &state.snapshot {
            None => Freshness::Disconnected,
            Some(snapshot) => {
                let age = snapshot.age_ms(now_ms());
                if age <= self.inner.snapshot_ttl.as_millis() as i64 {
                    Freshness::Fresh
                } else if self.inner.channel.is_connected() {
                    Freshness::Stale
                } else {
                    Freshness::Disconnected
                }
            }
        }
    }

    /// Full load sequence, used at startup and after a profile change.
    ///
    /// 1. Surface an unexpired cached snapshot for the active profile
    ///    immediately, so the display paints without waiting on the network.
    /// 2. Fetch from the gateway; success replaces state and refreshes both
    ///    cache entries.
    /// 3. On fetch failure fall back: bounded cache, then last-known-good,
    ///    then an error state with no data. `loading` always ends false.
    pub async fn load(&self) {
        self.set_loading(true);
        let profile = self.active_profile();

        if let Some(cached) = self.inner.cache.get::<DashboardSnapshot>(keys::KEY_DATA).await {
            if cached.mode == profile.as_str() {
                debug!(profile = %profile, "surfacing cached snapshot while fetching");
                self.publish(cached, None, true);
            } else {
                debug!(
                    cached_mode = %cached.mode,
                    profile = %profile,
                    "cached snapshot is for another profile, not surfacing"
                );
            }
        }

        self.fetch_and_publish().await;
    }

    /// Force-refresh: drop the bounded cache entry, ask the backend to
    /// rebuild its data (failure tolerated), then fetch.
    pub async fn refresh(&self) {
        self.inner.cache.remove(keys::KEY_DATA).await;
        if let Err(e) = self.inner.gateway.request_refresh().await {
            warn!(error = %e, "backend refresh request failed, fetching anyway");
        }
        self.set_loading(true);
        self.fetch_and_publish().await;
    }

    /// Wire this synchronizer to the push channel: pushed updates while
    /// connected, polling otherwise. Called once at startup.
    pub fn attach(&self) {
        let sync = self.clone();
        self.inner.channel.subscribe(EVENT_DASHBOARD_UPDATE, move |data| {
            let sync = sync.clone();
            let data = data.clone();
            tokio::spawn(async move {
                sync.handle_dashboard_update(&data).await;
            });
        });

        let sync = self.clone();
        self.inner.channel.subscribe(EVENT_STATE_CHANGE, move |data| {
            let Ok(change) = serde_json::from_value::<StateChange>(data.clone()) else {
                return;
            };
            let sync = sync.clone();
            tokio::spawn(async move {
                sync.handle_state_change(change).await;
            });
        });

        // The channel starts disconnected, so polling owns acquisition
        // until the first successful connect.
        self.start_polling();
    }

    /// Stop background work. Used during shutdown.
    pub fn detach(&self) {
        self.stop_polling();
    }

    /// Apply a pushed `dashboard:update` frame.
    ///
    /// Partial payloads shallow-merge onto the current snapshot in memory
    /// only; the cache keeps the last full snapshot. Full payloads behave
    /// exactly like a successful fetch.
    pub async fn handle_dashboard_update(&self, data: &Value) {
        let update: DashboardSnapshot = match serde_json::from_value(data.clone()) {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "ignoring malformed dashboard update");
                return;
            }
        };

        if update.partial {
            let base = self
                .state()
                .snapshot
                .unwrap_or_else(|| DashboardSnapshot {
                    mode: self.active_profile().as_str().to_string(),
                    timestamp: 0,
                    partial: false,
                    sections: Default::default(),
                });
            let merged = base.merge_partial(&update, now_ms());
            debug!(sections = update.sections.len(), "applied partial update in memory");
            self.publish(merged, None, false);
        } else {
            info!("applying full pushed snapshot");
            self.apply_snapshot(update).await;
        }
    }

    async fn handle_state_change(&self, change: StateChange) {
        match change.new {
            ConnectionState::Connected => {
                // Push takes over; resync once to cover anything missed.
                self.stop_polling();
                self.fetch_and_publish().await;
            }
            ConnectionState::Disconnected | ConnectionState::Error => {
                self.start_polling();
            }
            ConnectionState::Connecting => {}
        }
    }

    /// One guarded fetch. Returns without fetching if another fetch is
    /// already in flight. The guard is held until the result has been
    /// written to state and cache, and is released on drop, so an aborted
    /// fetch (poller cancellation mid-await) can never leak it.
    async fn fetch_and_publish(&self) {
        let Some(_guard) = FetchGuard::acquire(&self.inner.fetch_in_flight) else {
            debug!("fetch already in flight, dropping trigger");
            return;
        };

        let profile = self.active_profile();
        let result = self.inner.gateway.fetch_dashboard(&profile).await;

        match result {
            Ok(snapshot) => {
                debug!(profile = %profile, "fetch succeeded");
                self.apply_snapshot(snapshot).await;
            }
            Err(e) => {
                warn!(profile = %profile, error = %e, "fetch failed, falling back to cache");
                self.fall_back(e.to_string()).await;
            }
        }
    }

    /// Replace state with a fresh full snapshot and persist it under both
    /// the bounded key and the never-expiring last-known-good key.
    async fn apply_snapshot(&self, snapshot: DashboardSnapshot) {
        self.inner
            .cache
            .put(keys::KEY_DATA, &snapshot, Some(self.inner.snapshot_ttl))
            .await;
        self.inner
            .cache
            .put(keys::KEY_LAST_KNOWN_GOOD, &snapshot, None)
            .await;
        self.publish(snapshot, None, false);
    }

    async fn fall_back(&self, error: String) {
        if let Some(cached) = self.inner.cache.get::<DashboardSnapshot>(keys::KEY_DATA).await {
            info!("serving bounded cache entry after fetch failure");
            self.publish(cached, Some(error), false);
            return;
        }
        if let Some(lkg) = self
            .inner
            .cache
            .get::<DashboardSnapshot>(keys::KEY_LAST_KNOWN_GOOD)
            .await
        {
            info!("serving last-known-good snapshot after fetch failure");
            self.publish(lkg, Some(error), false);
            return;
        }
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.loading = false;
        state.last_error = Some(error);
    }

    fn publish(&self, snapshot: DashboardSnapshot, error: Option<String>, still_loading: bool) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.snapshot = Some(snapshot);
        state.last_updated = Some(now_ms());
        state.last_error = error;
        state.loading = still_loading;
    }

    fn set_loading(&self, loading: bool) {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .loading = loading;
    }

    fn start_polling(&self) {
        let mut guard = lock(&self.inner.poller);
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }
        let sync = self.clone();
        *guard = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(sync.inner.poll_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tick.tick().await;
            loop {
                tick.tick().await;
                // The channel may have come back between ticks.
                if sync.inner.channel.is_connected() {
                    continue;
                }
                sync.fetch_and_publish().await;
            }
        }));
        info!("polling started");
    }

    fn stop_polling(&self) {
        if let Some(handle) = lock(&self.inner.poller).take() {
            handle.abort();
            info!("polling stopped");
        }
    }

    /// Whether the polling loop is currently running.
    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ownership of the in-flight flag. Dropping releases it, which also
/// covers the owning task being aborted while the fetch is awaited.
struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FetchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then_some(Self { flag })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use vitrine_cache::Database;
    use vitrine_config::{ChannelConfig, ServerConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_cache(dir: &tempfile::TempDir) -> CacheStore {
        let path = dir.path().join("cache.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        CacheStore::new(db, keys::NS_DASHBOARD)
    }

    fn test_channel() -> PushChannel {
        // Never connected; used only for is_connected checks.
        PushChannel::new("ws://127.0.0.1:9/ws", &ChannelConfig::default())
    }

    fn test_gateway(base: &str) -> Gateway {
        Gateway::new(&ServerConfig {
            http_base_url: base.to_string(),
            request_timeout_secs: 2,
            ..ServerConfig::default()
        })
        .unwrap()
    }

    fn make_synchronizer(base: &str, cache: CacheStore) -> Synchronizer {
        Synchronizer::new(
            test_gateway(base),
            cache,
            test_channel(),
            ProfileId("briefing".into()),
            &SyncConfig::default(),
        )
    }

    fn snapshot_json(mode: &str, marker: u32) -> Value {
        json!({
            "mode": mode,
            "timestamp": 1700000000000_i64,
            "weather": {"marker": marker}
        })
    }

    async fn mount_dashboard(server: &MockServer, mode: &str, marker: u32) {
        Mock::given(method("GET"))
            .and(path("/api/dashboard/data"))
            .and(query_param("profile", mode))
            .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_json(mode, marker)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn load_fetches_and_persists_both_cache_keys() {
        let server = MockServer::start().await;
        mount_dashboard(&server, "briefing", 1).await;
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer(&server.uri(), cache.clone());

        sync.load().await;

        let state = sync.state();
        assert!(!state.loading);
        assert!(state.last_error.is_none());
        assert_eq!(state.snapshot.unwrap().sections["weather"]["marker"], 1);

        let data: DashboardSnapshot = cache.get(keys::KEY_DATA).await.unwrap();
        let lkg: DashboardSnapshot = cache.get(keys::KEY_LAST_KNOWN_GOOD).await.unwrap();
        assert_eq!(data.sections["weather"]["marker"], 1);
        assert_eq!(lkg.sections["weather"]["marker"], 1);
    }

    #[tokio::test]
    async fn load_surfaces_matching_cached_snapshot_before_fetch() {
        let server = MockServer::start().await;
        mount_dashboard(&server, "briefing", 2).await;
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let stale: DashboardSnapshot =
            serde_json::from_value(snapshot_json("briefing", 1)).unwrap();
        cache
            .put(keys::KEY_DATA, &stale, Some(Duration::from_secs(3600)))
            .await;

        let sync = make_synchronizer(&server.uri(), cache);
        sync.load().await;

        // Final state reflects the network payload, not the cached one.
        let state = sync.state();
        assert_eq!(state.snapshot.unwrap().sections["weather"]["marker"], 2);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn load_ignores_cached_snapshot_for_another_profile() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let other: DashboardSnapshot = serde_json::from_value(snapshot_json("focus", 9)).unwrap();
        cache
            .put(keys::KEY_DATA, &other, Some(Duration::from_secs(3600)))
            .await;

        // Dead gateway: step 1 must not surface the wrong-profile entry.
        // The fallback still serves it as stale-but-valid data.
        let sync = make_synchronizer("http://127.0.0.1:9", cache);
        sync.load().await;

        let state = sync.state();
        assert!(state.last_error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_last_known_good() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let lkg: DashboardSnapshot =
            serde_json::from_value(snapshot_json("briefing", 7)).unwrap();
        cache.put(keys::KEY_LAST_KNOWN_GOOD, &lkg, None).await;

        let sync = make_synchronizer("http://127.0.0.1:9", cache);
        sync.load().await;

        let state = sync.state();
        assert!(!state.loading);
        assert!(state.last_error.is_some(), "error flag must be set");
        assert_eq!(
            state.snapshot.unwrap().sections["weather"]["marker"],
            7,
            "stale data still shown"
        );
    }

    #[tokio::test]
    async fn fetch_failure_with_empty_cache_ends_in_error_state() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer("http://127.0.0.1:9", cache);

        sync.load().await;

        let state = sync.state();
        assert!(!state.loading, "never stuck loading");
        assert!(state.last_error.is_some());
        assert!(state.snapshot.is_none());
    }

    #[tokio::test]
    async fn partial_update_merges_in_memory_without_touching_cache() {
        let server = MockServer::start().await;
        mount_dashboard(&server, "briefing", 1).await;
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer(&server.uri(), cache.clone());
        sync.load().await;

        sync.handle_dashboard_update(&json!({
            "partial": true,
            "tasks": [{"title": "water plants"}]
        }))
        .await;

        let state = sync.state();
        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.sections["weather"]["marker"], 1, "untouched section kept");
        assert_eq!(snapshot.sections["tasks"][0]["title"], "water plants");

        // The cache still holds the last full snapshot.
        let cached: DashboardSnapshot = cache.get(keys::KEY_DATA).await.unwrap();
        assert!(!cached.sections.contains_key("tasks"));
    }

    #[tokio::test]
    async fn full_pushed_update_persists_like_a_fetch() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer("http://127.0.0.1:9", cache.clone());

        sync.handle_dashboard_update(&snapshot_json("briefing", 5))
            .await;

        let state = sync.state();
        assert_eq!(state.snapshot.unwrap().sections["weather"]["marker"], 5);
        let cached: DashboardSnapshot = cache.get(keys::KEY_DATA).await.unwrap();
        assert_eq!(cached.sections["weather"]["marker"], 5);
    }

    #[tokio::test]
    async fn malformed_pushed_update_is_ignored() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer("http://127.0.0.1:9", cache);

        sync.handle_dashboard_update(&json!("not an object")).await;
        assert!(sync.state().snapshot.is_none());
    }

    #[tokio::test]
    async fn overlapping_fetch_triggers_are_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(snapshot_json("briefing", 1))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer(&server.uri(), cache);

        let a = sync.clone();
        let b = sync.clone();
        let first = tokio::spawn(async move { a.fetch_and_publish().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = tokio::spawn(async move { b.fetch_and_publish().await });

        first.await.unwrap();
        second.await.unwrap();
        // wiremock verifies expect(1) on drop: only one request went out.
        assert!(sync.state().snapshot.is_some());
    }

    #[tokio::test]
    async fn refresh_clears_bounded_entry_and_refetches() {
        let server = MockServer::start().await;
        mount_dashboard(&server, "briefing", 3).await;
        Mock::given(method("POST"))
            .and(path("/api/dashboard/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let stale: DashboardSnapshot =
            serde_json::from_value(snapshot_json("briefing", 1)).unwrap();
        cache
            .put(keys::KEY_DATA, &stale, Some(Duration::from_secs(3600)))
            .await;

        let sync = make_synchronizer(&server.uri(), cache);
        sync.refresh().await;

        let state = sync.state();
        assert_eq!(state.snapshot.unwrap().sections["weather"]["marker"], 3);
    }

    #[tokio::test]
    async fn attach_starts_polling_while_channel_is_down() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = make_synchronizer("http://127.0.0.1:9", cache);

        assert!(!sync.is_polling());
        sync.attach();
        assert!(sync.is_polling(), "disconnected channel means polling owns acquisition");
        sync.detach();
        assert!(!sync.is_polling());
    }

    #[tokio::test]
    async fn reconnect_during_poll_fetch_does_not_block_future_fetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboard/data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(snapshot_json("briefing", 8))
                    .set_delay(Duration::from_secs(1)),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = Synchronizer::new(
            test_gateway(&server.uri()),
            cache,
            test_channel(),
            ProfileId("briefing".into()),
            &SyncConfig {
                poll_interval_secs: 1,
                snapshot_ttl_secs: 60,
            },
        );

        sync.handle_state_change(StateChange {
            old: ConnectionState::Connected,
            new: ConnectionState::Disconnected,
        })
        .await;

        // Let a poll tick start a fetch, then reconnect while it is still
        // awaiting the slow backend. The transition aborts the poller
        // mid-fetch; the in-flight flag must be released with it so the
        // resync fetch is not dropped.
        tokio::time::sleep(Duration::from_millis(1300)).await;
        sync.handle_state_change(StateChange {
            old: ConnectionState::Connecting,
            new: ConnectionState::Connected,
        })
        .await;

        let state = sync.state();
        assert_eq!(
            state.snapshot.unwrap().sections["weather"]["marker"],
            8,
            "resync after the aborted poll fetch must land"
        );

        // And every later trigger keeps working too.
        sync.load().await;
        assert!(!sync.state().loading);
        sync.detach();
    }

    #[tokio::test]
    async fn poll_fetch_happens_within_one_interval_of_disconnect() {
        let server = MockServer::start().await;
        mount_dashboard(&server, "briefing", 6).await;
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let sync = Synchronizer::new(
            test_gateway(&server.uri()),
            cache,
            test_channel(),
            ProfileId("briefing".into()),
            &SyncConfig {
                poll_interval_secs: 1,
                snapshot_ttl_secs: 60,
            },
        );

        sync.handle_state_change(StateChange {
            old: ConnectionState::Connected,
            new: ConnectionState::Disconnected,
        })
        .await;
        assert!(sync.state().snapshot.is_none());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            sync.state().snapshot.unwrap().sections["weather"]["marker"],
            6,
            "a poll tick fetched within one interval"
        );
        sync.detach();
    }

    #[tokio::test]
    async fn connected_transition_stops_polling() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let server = MockServer::start().await;
        mount_dashboard(&server, "briefing", 4).await;
        let sync = make_synchronizer(&server.uri(), cache);
        sync.attach();
        assert!(sync.is_polling());

        sync.handle_state_change(StateChange {
            old: ConnectionState::Connecting,
            new: ConnectionState::Connected,
        })
        .await;
        assert!(!sync.is_polling(), "push path owns acquisition when connected");
        // The transition also resynced once.
        assert!(sync.state().snapshot.is_some());

        sync.handle_state_change(StateChange {
            old: ConnectionState::Connected,
            new: ConnectionState::Disconnected,
        })
        .await;
        assert!(sync.is_polling(), "poll path resumes on disconnect");
        sync.detach();
    }
}
