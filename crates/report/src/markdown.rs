//! Markdown summary generation for persisted reports.

use routebench_core::{AppResult, PersistedReport};
use std::fmt::Write;

/// Generate a markdown summary from a persisted report.
pub fn generate_summary(report: &PersistedReport) -> String {
    let mut output = String::new();

    writeln!(output, "# Routing Benchmark Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Run: {}", report.run_id).unwrap();
    writeln!(output, "Completed: {}", report.timestamp.to_rfc3339()).unwrap();
    writeln!(
        output,
        "Duration: {:.1}s over {} iteration(s) per target",
        report.test_duration_ms as f64 / 1_000.0,
        report.iterations
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Results").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "| Target | Load (ms) | FCP (ms) | LCP (ms) | Requests | Transfer (KB) | Navigation (ms) |"
    )
    .unwrap();
    writeln!(
        output,
        "|--------|-----------|----------|----------|----------|---------------|-----------------|"
    )
    .unwrap();

    for (name, result) in &report.per_app_results {
        writeln!(output, "| {} | {} |", name, format_row(result)).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "## Verdicts").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "- Fastest load: {}",
        format_winner(
            report.comparison.load_time_winner.as_deref(),
            report.comparison.load_time_difference_ms,
            "ms ahead"
        )
    )
    .unwrap();
    writeln!(
        output,
        "- Smallest transfer: {}",
        format_winner(
            report.comparison.transfer_size_winner.as_deref(),
            report.comparison.transfer_size_difference_bytes,
            "bytes lighter"
        )
    )
    .unwrap();
    writeln!(
        output,
        "- Fastest navigation: {}",
        report
            .comparison
            .navigation_winner
            .as_deref()
            .unwrap_or("n/a")
    )
    .unwrap();

    output
}

fn format_row(result: &AppResult) -> String {
    let nav = result
        .navigation_time_ms
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "n/a".to_string());
    match &result.metrics {
        Some(m) => format!(
            "{:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {}",
            m.total_load_time_ms,
            m.first_contentful_paint_ms,
            m.largest_contentful_paint_ms,
            m.network_request_count,
            m.total_transfer_bytes / 1_024.0,
            nav
        ),
        None => format!("n/a | n/a | n/a | n/a | n/a | {nav}"),
    }
}

fn format_winner(winner: Option<&str>, margin: Option<f64>, unit: &str) -> String {
    match (winner, margin) {
        (Some(name), Some(margin)) => format!("{name} ({margin:.1} {unit})"),
        (Some(name), None) => name.to_string(),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routebench_core::{AggregatedMetrics, RunMetrics};

    fn sample_report() -> PersistedReport {
        let fast = AppResult {
            metrics: AggregatedMetrics::from_trials(vec![RunMetrics {
                total_load_time_ms: 4_934.0,
                total_transfer_bytes: 512_000.0,
                network_request_count: 12,
                ..RunMetrics::default()
            }]),
            navigation_time_ms: Some(85.0),
        };
        let slow = AppResult {
            metrics: AggregatedMetrics::from_trials(vec![RunMetrics {
                total_load_time_ms: 5_627.0,
                total_transfer_bytes: 640_000.0,
                network_request_count: 18,
                ..RunMetrics::default()
            }]),
            navigation_time_ms: Some(120.0),
        };
        PersistedReport::assemble(
            3,
            60_000,
            vec![("alpha".to_string(), fast), ("beta".to_string(), slow)],
        )
    }

    #[test]
    fn test_summary_contains_targets_and_winners() {
        let summary = generate_summary(&sample_report());
        assert!(summary.contains("| alpha |"));
        assert!(summary.contains("| beta |"));
        assert!(summary.contains("Fastest load: alpha (693.0 ms ahead)"));
        assert!(summary.contains("Fastest navigation: alpha"));
    }

    #[test]
    fn test_summary_marks_missing_measurements() {
        let report = PersistedReport::assemble(
            1,
            1_000,
            vec![("ghost".to_string(), AppResult::default())],
        );
        let summary = generate_summary(&report);
        assert!(summary.contains("| ghost | n/a"));
        assert!(summary.contains("Fastest load: n/a"));
    }
}
