// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Server readiness prober.
//!
//! Measurement only makes sense once every application under test has an
//! HTTP listener up, so the probes fan out in parallel and join before any
//! browser launches. Any response counts as ready, whatever its status code:
//! the probe detects a listener, not a healthy application.

use crate::error::{HarnessError, Result};
use reqwest::Client;
use routebench_core::{AppTarget, HarnessConfig};
use std::time::Duration;
use tracing::{debug, info};

/// Probe every configured target and wait for all of them.
///
/// The first target to exhaust its attempt budget fails the whole barrier
/// with [`HarnessError::ServerNotReady`].
pub async fn wait_for_all(config: &HarnessConfig) -> Result<()> {
    let client = Client::builder()
        .timeout(config.timeouts.probe_request())
        .build()?;
    futures::future::try_join_all(config.targets.iter().map(|target| {
        wait_until_ready(
            &client,
            target,
            config.probe_max_attempts,
            config.probe_delay(),
        )
    }))
    .await?;
    info!(targets = config.targets.len(), "all targets ready");
    Ok(())
}

/// Poll one target's base URL until it answers.
pub async fn wait_until_ready(
    client: &Client,
    target: &AppTarget,
    max_attempts: u32,
    delay: Duration,
) -> Result<()> {
    for attempt in 1..=max_attempts {
        match client.get(&target.base_url).send().await {
            Ok(response) => {
                debug!(
                    app = %target.name,
                    status = %response.status(),
                    attempt,
                    "target ready"
                );
                return Ok(());
            }
            Err(err) => {
                debug!(app = %target.name, attempt, error = %err, "probe attempt failed");
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(HarnessError::ServerNotReady {
        url: target.base_url.clone(),
        attempts: max_attempts,
    })
}
