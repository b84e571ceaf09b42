// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The persisted report schema.
//!
//! A [`PersistedReport`] is the only durable artifact of a run: written to a
//! fixed-name "latest" file (overwritten each run) and to an append-only
//! history directory. `None` fields mark measurements that degraded or were
//! skipped, distinguishable from real zeros.

use crate::compare::ComparisonResult;
use crate::metrics::AggregatedMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything measured for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppResult {
    /// Aggregated page-load metrics; `None` when every trial failed.
    pub metrics: Option<AggregatedMetrics>,
    /// Route-transition latency; `None` when the measurement was dropped.
    pub navigation_time_ms: Option<f64>,
}

/// One run's durable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedReport {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run completed, ISO-8601 UTC.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock duration of the whole run, in milliseconds.
    pub test_duration_ms: u64,
    /// Page-load trials requested per target.
    pub iterations: u32,
    /// Per-target results, keyed by target name.
    pub per_app_results: BTreeMap<String, AppResult>,
    /// Verdicts derived from the per-target results.
    pub comparison: ComparisonResult,
}

impl PersistedReport {
    /// Assemble a report from per-target results in configuration order.
    ///
    /// The comparison is derived here so that a report can never carry a
    /// verdict inconsistent with its own aggregates.
    pub fn assemble(
        iterations: u32,
        test_duration_ms: u64,
        results: Vec<(String, AppResult)>,
    ) -> Self {
        let comparison =
            ComparisonResult::derive(results.iter().map(|(name, result)| (name.as_str(), result)));
        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            test_duration_ms,
            iterations,
            per_app_results: results.into_iter().collect(),
            comparison,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RunMetrics;

    fn sample_report() -> PersistedReport {
        let metrics = AggregatedMetrics::from_trials(vec![RunMetrics {
            total_load_time_ms: 4_934.0,
            total_transfer_bytes: 1_024.0,
            network_request_count: 10,
            ..RunMetrics::default()
        }]);
        let fast = AppResult {
            metrics,
            navigation_time_ms: Some(85.0),
        };
        let slow = AppResult {
            metrics: AggregatedMetrics::from_trials(vec![RunMetrics {
                total_load_time_ms: 5_627.0,
                total_transfer_bytes: 2_048.0,
                network_request_count: 14,
                ..RunMetrics::default()
            }]),
            navigation_time_ms: None,
        };
        PersistedReport::assemble(
            3,
            12_345,
            vec![("fast".to_string(), fast), ("slow".to_string(), slow)],
        )
    }

    #[test]
    fn test_assemble_derives_comparison() {
        let report = sample_report();
        assert_eq!(report.comparison.load_time_winner.as_deref(), Some("fast"));
        assert!(report.comparison.navigation_winner.is_none());
        assert_eq!(report.per_app_results.len(), 2);
    }

    #[test]
    fn test_json_round_trip_is_structurally_identical() {
        let report = sample_report();
        let json = serde_json::to_string_pretty(&report).unwrap();
        let restored: PersistedReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, report);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let report = sample_report();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("perAppResults").is_some());
        assert!(value.get("testDurationMs").is_some());
        assert!(value.get("runId").is_some());
        let app = &value["perAppResults"]["fast"];
        assert!(app.get("navigationTimeMs").is_some());
    }

    #[test]
    fn test_null_fields_survive_round_trip() {
        let report = PersistedReport::assemble(
            1,
            10,
            vec![("ghost".to_string(), AppResult::default())],
        );
        let json = serde_json::to_string(&report).unwrap();
        let restored: PersistedReport = serde_json::from_str(&json).unwrap();
        assert!(restored.per_app_results["ghost"].metrics.is_none());
        assert!(restored.comparison.load_time_winner.is_none());
    }
}
