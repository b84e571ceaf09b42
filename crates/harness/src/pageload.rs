// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Repeated page-load trials for one target.
//!
//! Every trial gets a fresh page, a fresh network accumulator, and explicit
//! timeouts on each wait. The accumulator is created inside the trial scope
//! and snapshotted by value before the page closes; it must never be shared
//! across trials, or request counts and byte totals inflate run over run.
//!
//! Trial errors drop that trial and measurement continues. The target only
//! comes back `None` when every trial failed.

use crate::browser::{self, BrowserSession};
use crate::error::{HarnessError, Result};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::page::Page;
use futures::StreamExt;
use routebench_core::{AggregatedMetrics, AppTarget, HarnessConfig, RunMetrics};
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{info, warn};

/// Navigation-timing record read from the page after load.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NavTimingRecord {
    duration: f64,
    start_time: f64,
    dom_content_loaded_event_end: f64,
    dom_interactive: f64,
    load_event_end: f64,
}

/// Paint metrics resolved by the in-page observer race.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct PaintRecord {
    fcp: f64,
    lcp: f64,
}

/// Per-trial network totals, bucketed by MIME type.
#[derive(Debug, Clone, Default)]
struct NetworkTotals {
    request_count: u32,
    total_bytes: f64,
    js_bytes: f64,
    css_bytes: f64,
}

impl NetworkTotals {
    fn record(&mut self, mime_type: &str, encoded_data_length: f64) {
        self.request_count += 1;
        let bytes = encoded_data_length.max(0.0);
        self.total_bytes += bytes;
        let mime = mime_type.to_ascii_lowercase();
        if mime.contains("javascript") || mime.contains("ecmascript") {
            self.js_bytes += bytes;
        } else if mime.contains("css") {
            self.css_bytes += bytes;
        }
    }
}

const NAV_TIMING_SCRIPT: &str = r#"
(() => {
    const entries = performance.getEntriesByType('navigation');
    if (!entries.length) return null;
    const nav = entries[0];
    return {
        duration: nav.duration || 0,
        startTime: nav.startTime || 0,
        domContentLoadedEventEnd: nav.domContentLoadedEventEnd || 0,
        domInteractive: nav.domInteractive || 0,
        loadEventEnd: nav.loadEventEnd || 0
    };
})()
"#;

/// Build the FCP/LCP probe: buffered observers racing a fixed timeout.
///
/// LCP keeps updating until user interaction, so the promise resolves as
/// soon as both metrics are seen and otherwise settles at the timeout with
/// whatever was captured. Missing values stay zero.
fn paint_metrics_script(timeout_ms: u64) -> String {
    format!(
        r#"
(() => new Promise(resolve => {{
    const result = {{ fcp: 0, lcp: 0 }};
    let settled = false;
    function finish() {{
        if (!settled) {{ settled = true; resolve(result); }}
    }}
    function maybeFinish() {{
        if (result.fcp > 0 && result.lcp > 0) finish();
    }}
    try {{
        new PerformanceObserver(list => {{
            for (const entry of list.getEntries()) {{
                if (entry.name === 'first-contentful-paint') result.fcp = entry.startTime;
            }}
            maybeFinish();
        }}).observe({{ type: 'paint', buffered: true }});
        new PerformanceObserver(list => {{
            const entries = list.getEntries();
            if (entries.length) {{
                const last = entries[entries.length - 1];
                result.lcp = last.renderTime || last.loadTime || 0;
            }}
            maybeFinish();
        }}).observe({{ type: 'largest-contentful-paint', buffered: true }});
    }} catch (error) {{
        finish();
    }}
    setTimeout(finish, {timeout_ms});
}}))()
"#
    )
}

/// Run N sequential page-load trials and aggregate the survivors.
pub async fn measure_page_load(
    session: &BrowserSession,
    target: &AppTarget,
    config: &HarnessConfig,
) -> Option<AggregatedMetrics> {
    let mut successful = Vec::new();
    for trial in 1..=config.iterations {
        match run_trial(session, target, config).await {
            Ok(metrics) => {
                info!(
                    app = %target.name,
                    trial,
                    load_ms = metrics.total_load_time_ms,
                    requests = metrics.network_request_count,
                    "trial complete"
                );
                successful.push(metrics);
            }
            Err(err) => {
                warn!(app = %target.name, trial, error = %err, "trial dropped");
            }
        }
    }
    if successful.is_empty() {
        warn!(app = %target.name, "every page-load trial failed");
    }
    AggregatedMetrics::from_trials(successful)
}

async fn run_trial(
    session: &BrowserSession,
    target: &AppTarget,
    config: &HarnessConfig,
) -> Result<RunMetrics> {
    let timeouts = &config.timeouts;
    let page = session.new_page().await?;

    // Fresh accumulator per trial, snapshotted by value below. The listener
    // is attached before navigation so no response goes uncounted.
    let totals = Arc::new(Mutex::new(NetworkTotals::default()));
    let mut responses = page.event_listener::<EventResponseReceived>().await?;
    let listener = {
        let totals = Arc::clone(&totals);
        tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                let mut totals = totals.lock().unwrap_or_else(PoisonError::into_inner);
                totals.record(&event.response.mime_type, event.response.encoded_data_length);
            }
        })
    };

    // Everything that can fail mid-trial runs in this block so that the
    // listener and the page are torn down on every exit path.
    let outcome: Result<(Option<NavTimingRecord>, PaintRecord, f64)> = async {
        let stopwatch = Instant::now();
        let navigated = tokio::time::timeout(timeouts.navigation(), async {
            page.goto(target.page_url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<_, HarnessError>(())
        })
        .await;
        match navigated {
            Ok(result) => result?,
            Err(_) => {
                return Err(HarnessError::NavigationTimeout {
                    url: target.page_url.clone(),
                })
            }
        }
        let stopwatch_ms = stopwatch.elapsed().as_secs_f64() * 1_000.0;

        if let Err(err) = browser::wait_for_visible(
            &page,
            &target.content_ready_selector,
            timeouts.selector(),
            timeouts.poll_interval(),
        )
        .await
        {
            warn!(
                app = %target.name,
                error = %err,
                grace_ms = timeouts.selector_grace_ms,
                "content-ready selector missing, applying grace delay"
            );
            tokio::time::sleep(timeouts.selector_grace()).await;
        }

        let paint = match page
            .evaluate(paint_metrics_script(timeouts.paint_ms))
            .await
            .ok()
            .and_then(|value| value.into_value::<PaintRecord>().ok())
        {
            Some(paint) => {
                if paint.fcp <= 0.0 || paint.lcp <= 0.0 {
                    warn!(app = %target.name, fcp = paint.fcp, lcp = paint.lcp, "paint metrics incomplete");
                }
                paint
            }
            None => {
                warn!(app = %target.name, "paint metrics unavailable");
                PaintRecord::default()
            }
        };

        let timing = page
            .evaluate(NAV_TIMING_SCRIPT)
            .await
            .ok()
            .and_then(|value| value.into_value::<Option<NavTimingRecord>>().ok())
            .flatten();
        if timing.is_none() {
            warn!(app = %target.name, "navigation-timing entry missing, using stopwatch");
        }

        Ok((timing, paint, stopwatch_ms))
    }
    .await;

    let snapshot = totals
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    listener.abort();
    if let Err(err) = page.close().await {
        warn!(app = %target.name, error = %err, "failed to close trial page");
    }

    let (timing, paint, stopwatch_ms) = outcome?;
    Ok(build_run_metrics(
        timing.as_ref(),
        paint,
        &snapshot,
        stopwatch_ms,
    ))
}

/// Assemble one trial's metrics from whatever was captured.
fn build_run_metrics(
    timing: Option<&NavTimingRecord>,
    paint: PaintRecord,
    totals: &NetworkTotals,
    stopwatch_ms: f64,
) -> RunMetrics {
    RunMetrics {
        dom_content_loaded_ms: timing
            .map(|t| positive_or_zero(t.dom_content_loaded_event_end - t.start_time))
            .unwrap_or(0.0),
        dom_interactive_ms: timing
            .map(|t| positive_or_zero(t.dom_interactive - t.start_time))
            .unwrap_or(0.0),
        total_load_time_ms: resolve_total_load_ms(timing, stopwatch_ms),
        first_contentful_paint_ms: positive_or_zero(paint.fcp),
        largest_contentful_paint_ms: positive_or_zero(paint.lcp),
        network_request_count: totals.request_count,
        total_transfer_bytes: totals.total_bytes,
        js_bytes: totals.js_bytes,
        css_bytes: totals.css_bytes,
    }
}

/// Total load time with the documented fallback chain.
///
/// Navigation-timing durations can come back zero or negative on some
/// loads; each step falls through to the next best approximation, ending at
/// the harness stopwatch, which always exists.
fn resolve_total_load_ms(timing: Option<&NavTimingRecord>, stopwatch_ms: f64) -> f64 {
    if let Some(t) = timing {
        if t.duration > 0.0 {
            return t.duration;
        }
        let load = t.load_event_end - t.start_time;
        if load > 0.0 {
            return load;
        }
        let dcl = t.dom_content_loaded_event_end - t.start_time;
        if dcl > 0.0 {
            return dcl;
        }
    }
    stopwatch_ms
}

fn positive_or_zero(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_totals_bucket_by_mime() {
        let mut totals = NetworkTotals::default();
        totals.record("application/javascript", 1_000.0);
        totals.record("text/javascript; charset=utf-8", 500.0);
        totals.record("text/css", 300.0);
        totals.record("text/html", 200.0);
        totals.record("image/png", 100.0);

        assert_eq!(totals.request_count, 5);
        assert!((totals.total_bytes - 2_100.0).abs() < f64::EPSILON);
        assert!((totals.js_bytes - 1_500.0).abs() < f64::EPSILON);
        assert!((totals.css_bytes - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_network_totals_ignore_negative_lengths() {
        let mut totals = NetworkTotals::default();
        totals.record("text/html", -1.0);
        assert_eq!(totals.request_count, 1);
        assert_eq!(totals.total_bytes, 0.0);
    }

    #[test]
    fn test_fresh_accumulators_per_trial() {
        // Two trials, two accumulators. A leaked accumulator would make the
        // second trial start from the first trial's totals.
        let mut first = NetworkTotals::default();
        for _ in 0..10 {
            first.record("text/html", 512.0);
        }
        let mut second = NetworkTotals::default();
        for _ in 0..20 {
            second.record("text/html", 512.0);
        }
        assert_eq!(first.request_count, 10);
        assert_eq!(second.request_count, 20);
    }

    #[test]
    fn test_fallback_prefers_navigation_duration() {
        let timing = NavTimingRecord {
            duration: 1_234.0,
            load_event_end: 2_000.0,
            dom_content_loaded_event_end: 1_500.0,
            ..NavTimingRecord::default()
        };
        assert_eq!(resolve_total_load_ms(Some(&timing), 9_999.0), 1_234.0);
    }

    #[test]
    fn test_fallback_uses_load_event_when_duration_invalid() {
        let timing = NavTimingRecord {
            duration: 0.0,
            start_time: 100.0,
            load_event_end: 2_100.0,
            dom_content_loaded_event_end: 1_600.0,
            ..NavTimingRecord::default()
        };
        assert_eq!(resolve_total_load_ms(Some(&timing), 9_999.0), 2_000.0);
    }

    #[test]
    fn test_fallback_uses_dcl_when_load_event_missing() {
        let timing = NavTimingRecord {
            duration: 0.0,
            start_time: 100.0,
            load_event_end: 0.0,
            dom_content_loaded_event_end: 1_600.0,
            ..NavTimingRecord::default()
        };
        assert_eq!(resolve_total_load_ms(Some(&timing), 9_999.0), 1_500.0);
    }

    #[test]
    fn test_fallback_ends_at_stopwatch() {
        let timing = NavTimingRecord::default();
        assert_eq!(resolve_total_load_ms(Some(&timing), 4_321.0), 4_321.0);
        assert_eq!(resolve_total_load_ms(None, 4_321.0), 4_321.0);
    }

    #[test]
    fn test_build_run_metrics_treats_missing_paint_as_zero() {
        let metrics = build_run_metrics(
            None,
            PaintRecord { fcp: 0.0, lcp: -5.0 },
            &NetworkTotals::default(),
            100.0,
        );
        assert_eq!(metrics.first_contentful_paint_ms, 0.0);
        assert_eq!(metrics.largest_contentful_paint_ms, 0.0);
        assert_eq!(metrics.total_load_time_ms, 100.0);
    }

    #[test]
    fn test_build_run_metrics_carries_network_totals() {
        let mut totals = NetworkTotals::default();
        totals.record("application/javascript", 2_048.0);
        totals.record("text/css", 1_024.0);
        let metrics = build_run_metrics(None, PaintRecord::default(), &totals, 50.0);
        assert_eq!(metrics.network_request_count, 2);
        assert!((metrics.total_transfer_bytes - 3_072.0).abs() < f64::EPSILON);
        assert!((metrics.js_bytes - 2_048.0).abs() < f64::EPSILON);
        assert!((metrics.css_bytes - 1_024.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_paint_script_embeds_timeout() {
        let script = paint_metrics_script(15_000);
        assert!(script.contains("setTimeout(finish, 15000)"));
        assert!(script.contains("largest-contentful-paint"));
    }
}
