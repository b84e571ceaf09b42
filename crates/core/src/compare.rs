// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Winner/difference derivation between measured targets.
//!
//! All metrics in this pipeline are lower-is-better. A sub-comparison needs
//! at least two non-null participants; anything less yields a null winner and
//! difference instead of an error. Exact ties go to the target listed first
//! in configuration order.

use crate::report::AppResult;
use serde::{Deserialize, Serialize};

/// Derived verdicts between the measured targets.
///
/// Recomputed fresh each run; never persisted independently of the
/// aggregates it was derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Target with the lowest mean total load time.
    pub load_time_winner: Option<String>,
    /// Runner-up mean load time minus the winner's, in milliseconds.
    pub load_time_difference_ms: Option<f64>,
    /// Target with the lowest mean total transfer size.
    pub transfer_size_winner: Option<String>,
    /// Runner-up mean transfer size minus the winner's, in bytes.
    pub transfer_size_difference_bytes: Option<f64>,
    /// Target with the lowest route-transition time.
    pub navigation_winner: Option<String>,
}

impl ComparisonResult {
    /// Derive the verdicts from per-target results in configuration order.
    ///
    /// Order matters only for tie-breaking: a strict `<` scan keeps the first
    /// minimum, so the earlier target wins exact ties.
    pub fn derive<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a AppResult)>,
    {
        let entries: Vec<(&str, &AppResult)> = entries.into_iter().collect();

        let load: Vec<(&str, f64)> = entries
            .iter()
            .filter_map(|(name, result)| {
                result.metrics.as_ref().map(|m| (*name, m.total_load_time_ms))
            })
            .collect();
        let transfer: Vec<(&str, f64)> = entries
            .iter()
            .filter_map(|(name, result)| {
                result.metrics.as_ref().map(|m| (*name, m.total_transfer_bytes))
            })
            .collect();
        let navigation: Vec<(&str, f64)> = entries
            .iter()
            .filter_map(|(name, result)| result.navigation_time_ms.map(|v| (*name, v)))
            .collect();

        let (load_time_winner, load_time_difference_ms) = split(winner_and_margin(&load));
        let (transfer_size_winner, transfer_size_difference_bytes) =
            split(winner_and_margin(&transfer));
        let (navigation_winner, _) = split(winner_and_margin(&navigation));

        Self {
            load_time_winner,
            load_time_difference_ms,
            transfer_size_winner,
            transfer_size_difference_bytes,
            navigation_winner,
        }
    }
}

/// Lowest value wins; the margin is runner-up minus winner.
///
/// Returns `None` with fewer than two participants: a lone measurement is a
/// data point, not a comparison.
fn winner_and_margin(values: &[(&str, f64)]) -> Option<(String, f64)> {
    if values.len() < 2 {
        return None;
    }
    let mut winner = 0;
    for index in 1..values.len() {
        if values[index].1 < values[winner].1 {
            winner = index;
        }
    }
    let runner_up = values
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != winner)
        .map(|(_, value)| value.1)
        .fold(f64::INFINITY, f64::min);
    Some((values[winner].0.to_string(), runner_up - values[winner].1))
}

fn split(pair: Option<(String, f64)>) -> (Option<String>, Option<f64>) {
    match pair {
        Some((winner, margin)) => (Some(winner), Some(margin)),
        None => (None, None),
    }
}
