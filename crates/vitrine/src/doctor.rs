// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vitrine doctor` command implementation.
//!
//! Runs diagnostic checks against the Vitrine environment: configuration,
//! backend reachability, and the local cache database.

use std::time::Instant;

use vitrine_cache::{CacheStore, Database};
use vitrine_config::VitrineConfig;
use vitrine_core::VitrineError;
use vitrine_gateway::Gateway;

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Pass,
    Fail,
}

/// Result of a single diagnostic check.
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    message: String,
    duration_ms: u128,
}

fn check(name: &'static str, started: Instant, outcome: Result<String, String>) -> CheckResult {
    let (status, message) = match outcome {
        Ok(message) => (CheckStatus::Pass, message),
        Err(message) => (CheckStatus::Fail, message),
    };
    CheckResult {
        name,
        status,
        message,
        duration_ms: started.elapsed().as_millis(),
    }
}

/// Run the `vitrine doctor` command.
pub async fn run_doctor(config: &VitrineConfig) -> Result<(), VitrineError> {
    let mut results = Vec::new();
    results.push(check_config(config));
    results.push(check_backend(config).await);
    results.push(check_cache(config).await);

    println!();
    println!("  vitrine doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Fail => {
                fail_count += 1;
                "[FAIL]"
            }
        };
        println!(
            "    {tag} {:<12} {} ({}ms)",
            result.name, result.message, result.duration_ms
        );
    }
    println!();

    if fail_count > 0 {
        return Err(VitrineError::Internal(format!(
            "{fail_count} diagnostic check(s) failed"
        )));
    }
    println!("  All checks passed.");
    Ok(())
}

fn check_config(config: &VitrineConfig) -> CheckResult {
    let started = Instant::now();
    // Config already passed validation to get here; report the essentials.
    let message = format!(
        "server={} profile={} poll={}s",
        config.server.http_base_url, config.display.default_profile, config.sync.poll_interval_secs
    );
    check("config", started, Ok(message))
}

async fn check_backend(config: &VitrineConfig) -> CheckResult {
    let started = Instant::now();
    let outcome = match Gateway::new(&config.server) {
        Ok(gateway) => match gateway.health().await {
            Ok(_) => Ok(format!("reachable ({} host(s) configured)", gateway.bases().len())),
            Err(e) => Err(format!("unreachable: {e}")),
        },
        Err(e) => Err(format!("bad server config: {e}")),
    };
    check("backend", started, outcome)
}

async fn check_cache(config: &VitrineConfig) -> CheckResult {
    let started = Instant::now();
    let outcome = match Database::open(&config.cache.database_path, config.cache.wal_mode).await {
        Ok(db) => {
            let store = CacheStore::new(db.clone(), "doctor");
            let ok = store.put("probe", &"ok", None).await
                && store.get::<String>("probe").await.as_deref() == Some("ok");
            store.remove("probe").await;
            let _ = db.close().await;
            if ok {
                Ok(format!("writable at {}", config.cache.database_path))
            } else {
                Err("write/read probe failed".to_string())
            }
        }
        Err(e) => Err(format!("cannot open: {e}")),
    };
    check("cache", started, outcome)
}
