// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vitrine run` command implementation.
//!
//! Wires the cache, HTTP gateway, push channel, profile coordinator, and
//! synchronizer together, then runs until interrupted. The push channel
//! reconnects on its own; losing the backend never stops the client.

use tracing::{info, warn};
use vitrine_cache::{keys, CacheStore, Database};
use vitrine_channel::PushChannel;
use vitrine_config::VitrineConfig;
use vitrine_core::VitrineError;
use vitrine_gateway::Gateway;
use vitrine_sync::{ProfileCoordinator, Synchronizer};

/// Runs the display client until SIGINT.
pub async fn run(config: VitrineConfig) -> Result<(), VitrineError> {
    init_tracing(&config.display.log_level);
    info!("starting vitrine");

    let db = Database::open(&config.cache.database_path, config.cache.wal_mode).await?;
    let dashboard_store = CacheStore::new(db.clone(), keys::NS_DASHBOARD);
    let profile_store = CacheStore::new(db.clone(), keys::NS_PROFILE);

    let swept = dashboard_store.sweep_expired().await + profile_store.sweep_expired().await;
    if swept > 0 {
        info!(swept, "removed expired cache entries");
    }

    let gateway = Gateway::new(&config.server)?;
    let channel = PushChannel::new(&config.server.ws_url, &config.channel);

    let coordinator = ProfileCoordinator::new(
        gateway.clone(),
        profile_store,
        channel.clone(),
        &config.display,
    );
    let profile = coordinator.resolve().await;
    info!(profile = %profile, "active profile resolved");

    let sync = Synchronizer::new(
        gateway,
        dashboard_store,
        channel.clone(),
        profile,
        &config.sync,
    );
    sync.attach();
    {
        let sync = sync.clone();
        coordinator.attach(move |profile| {
            sync.set_active_profile(profile);
            let sync = sync.clone();
            tokio::spawn(async move { sync.load().await });
        });
    }

    // A failed first attempt is fine: the supervisor keeps retrying and
    // the synchronizer polls in the meantime.
    if let Err(e) = channel.connect().await {
        warn!(error = %e, "push channel unavailable, falling back to polling");
    }

    sync.load().await;
    info!("vitrine running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| VitrineError::Internal(format!("signal handler failed: {e}")))?;
    info!("shutting down");

    channel.disconnect().await;
    sync.detach();
    db.close().await?;
    info!("vitrine shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vitrine={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
