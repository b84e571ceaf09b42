// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-trial route-transition timing.
//!
//! Unlike the page-load measurer this times a client-side transition: load
//! the root page once, click the configured in-app link, and watch the
//! page's resource entries until they stop growing. The elapsed time runs
//! from the click to the last observed network activity, so the quiet
//! window used to confirm settlement is not billed to the transition.

use crate::browser::{self, BrowserSession};
use crate::error::{HarnessError, Result};
use chromiumoxide::page::Page;
use routebench_core::{AppTarget, HarnessConfig, Timeouts};
use std::time::Instant;
use tracing::{info, warn};

const RESOURCE_COUNT_SCRIPT: &str = "performance.getEntriesByType('resource').length";

/// Measure one route transition for the target.
///
/// Returns `None` when the link never appears or the transition never
/// settles; the target is then simply absent from the navigation verdict.
pub async fn measure_navigation(
    session: &BrowserSession,
    target: &AppTarget,
    config: &HarnessConfig,
) -> Option<f64> {
    match transition_time(session, target, config).await {
        Ok(Some(elapsed_ms)) => {
            info!(app = %target.name, elapsed_ms, "navigation measured");
            Some(elapsed_ms)
        }
        Ok(None) => {
            warn!(app = %target.name, "navigation never settled, measurement dropped");
            None
        }
        Err(err) => {
            warn!(app = %target.name, error = %err, "navigation measurement dropped");
            None
        }
    }
}

async fn transition_time(
    session: &BrowserSession,
    target: &AppTarget,
    config: &HarnessConfig,
) -> Result<Option<f64>> {
    let timeouts = &config.timeouts;
    let page = session.new_page().await?;

    // The page is closed on every exit path, so the fallible steps run in
    // this block and their result is surfaced after teardown.
    let settled = async {
        let navigated = tokio::time::timeout(timeouts.navigation(), async {
            page.goto(target.base_url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<_, HarnessError>(())
        })
        .await;
        match navigated {
            Ok(result) => result?,
            Err(_) => {
                return Err(HarnessError::NavigationTimeout {
                    url: target.base_url.clone(),
                })
            }
        }

        browser::wait_for_visible(
            &page,
            &target.nav_link_selector,
            timeouts.selector(),
            timeouts.poll_interval(),
        )
        .await?;

        let link = page.find_element(target.nav_link_selector.as_str()).await?;
        let clicked = Instant::now();
        link.click().await?;

        settle_after_click(&page, clicked, timeouts).await
    }
    .await;

    if let Err(err) = page.close().await {
        warn!(app = %target.name, error = %err, "failed to close navigation page");
    }
    settled
}

/// Wait for the post-click network activity to go quiet.
///
/// The resource-entry count is sampled on the poll interval; once it holds
/// steady for the quiet window the transition counts as settled and the
/// reported time is click → last observed change. Exhausting the idle
/// budget yields `Ok(None)`.
async fn settle_after_click(
    page: &Page,
    clicked: Instant,
    timeouts: &Timeouts,
) -> Result<Option<f64>> {
    let mut last_count = resource_count(page).await.unwrap_or(0);
    let mut last_activity = Instant::now();

    loop {
        if clicked.elapsed() >= timeouts.network_idle() {
            return Ok(None);
        }
        tokio::time::sleep(timeouts.poll_interval()).await;

        let count = resource_count(page).await.unwrap_or(last_count);
        if count != last_count {
            last_count = count;
            last_activity = Instant::now();
        } else if last_activity.elapsed() >= timeouts.network_quiet_window() {
            let elapsed = last_activity.saturating_duration_since(clicked);
            return Ok(Some(elapsed.as_secs_f64() * 1_000.0));
        }
    }
}

async fn resource_count(page: &Page) -> Result<u64> {
    let count = page
        .evaluate(RESOURCE_COUNT_SCRIPT)
        .await?
        .into_value::<u64>()
        .unwrap_or(0);
    Ok(count)
}
