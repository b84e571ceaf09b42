// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end run orchestration.
//!
//! Probe barrier first, then one measurement session per target, run
//! concurrently. Each session owns its own browser process, so the sessions
//! share no mutable state and need no locking. A session that fails to
//! launch degrades to a null result; only the probe barrier aborts the run.

use crate::browser::BrowserSession;
use crate::error::Result;
use crate::{navigation, pageload, probe};
use routebench_core::{AppResult, AppTarget, HarnessConfig, PersistedReport};
use std::time::Instant;
use tracing::{info, warn};

/// Execute the full measurement pipeline and assemble the report.
pub async fn run(config: &HarnessConfig) -> Result<PersistedReport> {
    config.validate()?;
    let started = Instant::now();
    info!(
        targets = config.targets.len(),
        iterations = config.iterations,
        "starting benchmark run"
    );

    probe::wait_for_all(config).await?;

    let results = futures::future::join_all(
        config
            .targets
            .iter()
            .map(|target| measure_target(target, config)),
    )
    .await;

    let report = PersistedReport::assemble(
        config.iterations,
        started.elapsed().as_millis() as u64,
        results,
    );
    info!(
        duration_ms = report.test_duration_ms,
        load_time_winner = report.comparison.load_time_winner.as_deref().unwrap_or("none"),
        "benchmark run complete"
    );
    Ok(report)
}

/// Measure one target inside its own browser session.
async fn measure_target(target: &AppTarget, config: &HarnessConfig) -> (String, AppResult) {
    let session = match BrowserSession::launch(&config.timeouts).await {
        Ok(session) => session,
        Err(err) => {
            warn!(app = %target.name, error = %err, "browser launch failed, target skipped");
            return (target.name.clone(), AppResult::default());
        }
    };

    let metrics = pageload::measure_page_load(&session, target, config).await;
    let navigation_time_ms = navigation::measure_navigation(&session, target, config).await;

    if let Err(err) = session.close().await {
        warn!(app = %target.name, error = %err, "browser did not close cleanly");
    }

    (
        target.name.clone(),
        AppResult {
            metrics,
            navigation_time_ms,
        },
    )
}
