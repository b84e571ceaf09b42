// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-trial metrics and trial aggregation.
//!
//! A [`RunMetrics`] is one browser page-load trial's raw measurements,
//! immutable after capture. [`AggregatedMetrics`] is the unweighted
//! arithmetic mean over the successful trials of one target; trials that
//! errored never reach the aggregator.

use serde::{Deserialize, Serialize};

/// Raw measurements from a single page-load trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    /// DOMContentLoaded relative to navigation start, in milliseconds.
    pub dom_content_loaded_ms: f64,
    /// domInteractive relative to navigation start, in milliseconds.
    pub dom_interactive_ms: f64,
    /// Total load time after the fallback chain, in milliseconds.
    pub total_load_time_ms: f64,
    /// First Contentful Paint, in milliseconds (zero when not observed).
    pub first_contentful_paint_ms: f64,
    /// Largest Contentful Paint, in milliseconds (zero when not observed).
    pub largest_contentful_paint_ms: f64,
    /// Number of network responses observed during the trial.
    pub network_request_count: u32,
    /// Total encoded transfer size across all responses, in bytes.
    pub total_transfer_bytes: f64,
    /// Transfer size of JavaScript responses, in bytes.
    pub js_bytes: f64,
    /// Transfer size of CSS responses, in bytes.
    pub css_bytes: f64,
}

/// Mean of N successful trials for one target, plus the raw trials for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    /// Mean DOMContentLoaded, in milliseconds.
    pub dom_content_loaded_ms: f64,
    /// Mean domInteractive, in milliseconds.
    pub dom_interactive_ms: f64,
    /// Mean total load time, in milliseconds.
    pub total_load_time_ms: f64,
    /// Mean First Contentful Paint, in milliseconds.
    pub first_contentful_paint_ms: f64,
    /// Mean Largest Contentful Paint, in milliseconds.
    pub largest_contentful_paint_ms: f64,
    /// Mean network response count.
    pub network_request_count: f64,
    /// Mean total transfer size, in bytes.
    pub total_transfer_bytes: f64,
    /// Mean JavaScript transfer size, in bytes.
    pub js_bytes: f64,
    /// Mean CSS transfer size, in bytes.
    pub css_bytes: f64,
    /// Number of successful trials the means were computed from.
    pub iterations: u32,
    /// The raw trials, kept for audit.
    pub runs: Vec<RunMetrics>,
}

impl AggregatedMetrics {
    /// Aggregate the successful trials of one target.
    ///
    /// Returns `None` when no trial succeeded; the caller propagates that as
    /// a missing comparison entry rather than an error.
    pub fn from_trials(runs: Vec<RunMetrics>) -> Option<Self> {
        if runs.is_empty() {
            return None;
        }
        let n = runs.len() as f64;
        let mean_of = |field: fn(&RunMetrics) -> f64| -> f64 {
            runs.iter().map(field).sum::<f64>() / n
        };
        Some(Self {
            dom_content_loaded_ms: mean_of(|r| r.dom_content_loaded_ms),
            dom_interactive_ms: mean_of(|r| r.dom_interactive_ms),
            total_load_time_ms: mean_of(|r| r.total_load_time_ms),
            first_contentful_paint_ms: mean_of(|r| r.first_contentful_paint_ms),
            largest_contentful_paint_ms: mean_of(|r| r.largest_contentful_paint_ms),
            network_request_count: mean_of(|r| f64::from(r.network_request_count)),
            total_transfer_bytes: mean_of(|r| r.total_transfer_bytes),
            js_bytes: mean_of(|r| r.js_bytes),
            css_bytes: mean_of(|r| r.css_bytes),
            iterations: runs.len() as u32,
            runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(load_ms: f64, requests: u32, bytes: f64) -> RunMetrics {
        RunMetrics {
            total_load_time_ms: load_ms,
            network_request_count: requests,
            total_transfer_bytes: bytes,
            ..RunMetrics::default()
        }
    }

    #[test]
    fn test_mean_is_exact_arithmetic_mean() {
        let runs = vec![trial(100.0, 1, 10.0), trial(200.0, 2, 20.0), trial(300.0, 3, 30.0)];
        let agg = AggregatedMetrics::from_trials(runs).unwrap();
        assert!((agg.total_load_time_ms - 200.0).abs() < f64::EPSILON);
        assert!((agg.network_request_count - 2.0).abs() < f64::EPSILON);
        assert!((agg.total_transfer_bytes - 20.0).abs() < f64::EPSILON);
        assert_eq!(agg.iterations, 3);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let runs = vec![trial(123.4, 7, 5120.0), trial(567.8, 9, 2048.0)];
        let first = AggregatedMetrics::from_trials(runs.clone()).unwrap();
        let second = AggregatedMetrics::from_trials(runs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_trials_yield_none() {
        assert!(AggregatedMetrics::from_trials(Vec::new()).is_none());
    }

    #[test]
    fn test_per_trial_accumulators_do_not_leak() {
        // Trial 1 sees 10 requests / 5 KB, trial 2 sees 20 requests / 10 KB.
        // A leaked accumulator would report trial 2 as 30 requests / 15 KB
        // and the mean as 20 / 10 KB; the correct mean is 15 / 7.5 KB.
        let runs = vec![trial(0.0, 10, 5_120.0), trial(0.0, 20, 10_240.0)];
        let agg = AggregatedMetrics::from_trials(runs).unwrap();
        assert!((agg.network_request_count - 15.0).abs() < f64::EPSILON);
        assert!((agg.total_transfer_bytes - 7_680.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dropped_trial_not_counted() {
        // Three trials attempted, one dropped before aggregation.
        let survivors = vec![trial(100.0, 1, 1.0), trial(300.0, 1, 1.0)];
        let agg = AggregatedMetrics::from_trials(survivors).unwrap();
        assert_eq!(agg.iterations, 2);
        assert!((agg.total_load_time_ms - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_metrics_serialize_camel_case() {
        let json = serde_json::to_value(RunMetrics::default()).unwrap();
        assert!(json.get("totalLoadTimeMs").is_some());
        assert!(json.get("networkRequestCount").is_some());
        assert!(json.get("jsBytes").is_some());
    }
}
