//! CLI for routebench.
//!
//! This crate provides the command-line interface for the routing benchmark
//! harness: the `run` subcommand drives the full measurement pipeline, and
//! `report` re-renders the most recent persisted result.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use routebench_core::{HarnessConfig, PersistedReport};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Routing benchmark CLI.
#[derive(Parser, Debug)]
#[command(name = "routebench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the targets, run all measurements, and persist the report.
    ///
    /// The run completes with exit code 0 even when individual targets
    /// degrade to null measurements; only an unreachable target (readiness
    /// probe exhausted) fails the run.
    Run {
        /// Path to a TOML config file (defaults to the built-in target table).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the number of page-load trials per target.
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Override the output directory for latest.json and history files.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the most recent persisted report as markdown.
    Report {
        /// Directory holding latest.json (defaults to the configured one).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the resolved target table and run settings.
    Targets {
        /// Path to a TOML config file (defaults to the built-in target table).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Run the CLI with the given arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            iterations,
            output,
        } => run_benchmark(config, iterations, output),
        Commands::Report { output } => show_report(output),
        Commands::Targets { config } => show_targets(config),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let directives = format!(
        "routebench_cli={level},routebench_core={level},routebench_harness={level},routebench_report={level}"
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_path(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

fn apply_overrides(
    mut config: HarnessConfig,
    iterations: Option<u32>,
    output: Option<PathBuf>,
) -> HarnessConfig {
    if let Some(iterations) = iterations {
        config.iterations = iterations;
    }
    if let Some(output) = output {
        config.output_dir = output;
    }
    config
}

fn run_benchmark(
    config_path: Option<PathBuf>,
    iterations: Option<u32>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = apply_overrides(load_config(config_path)?, iterations, output);
    config.validate()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!(
        "measuring {} target(s), {} trial(s) each",
        config.targets.len(),
        config.iterations
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(routebench_harness::run(&config));
    spinner.finish_and_clear();
    let report = outcome?;

    let paths = routebench_report::write_report(&report, &config.output_dir)?;
    print_summary(&report);
    println!();
    println!("Report written to {}", paths.latest.display());
    println!("History entry: {}", paths.history.display());
    Ok(())
}

fn show_report(output: Option<PathBuf>) -> anyhow::Result<()> {
    let output_dir = output.unwrap_or_else(|| HarnessConfig::default().output_dir);
    let report = routebench_report::read_latest(&output_dir)
        .with_context(|| format!("no persisted report under {}", output_dir.display()))?;
    print!("{}", routebench_report::markdown::generate_summary(&report));
    Ok(())
}

fn show_targets(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    println!("{}", "Configured targets".bold());
    for target in &config.targets {
        println!("  {:<18} {}", target.name, target.page_url);
        println!(
            "  {:<18} nav {:?}  ready {:?}",
            "", target.nav_link_selector, target.content_ready_selector
        );
    }
    println!();
    println!(
        "{} trial(s) per target, probe budget {} x {} ms, output {}",
        config.iterations,
        config.probe_max_attempts,
        config.probe_delay_ms,
        config.output_dir.display()
    );
    Ok(())
}

fn print_summary(report: &PersistedReport) {
    println!();
    println!("{}", "Benchmark results".bold());
    for (name, result) in &report.per_app_results {
        let nav = result
            .navigation_time_ms
            .map(|v| format!("{v:.1} ms"))
            .unwrap_or_else(|| "n/a".to_string());
        match &result.metrics {
            Some(m) => println!(
                "  {:<18} load {:>8.1} ms   fcp {:>8.1} ms   lcp {:>8.1} ms   {:>5.1} req   {:>8.1} KB   nav {}",
                name,
                m.total_load_time_ms,
                m.first_contentful_paint_ms,
                m.largest_contentful_paint_ms,
                m.network_request_count,
                m.total_transfer_bytes / 1_024.0,
                nav
            ),
            None => println!("  {:<18} {}", name, "no successful trials".yellow()),
        }
    }

    println!();
    match (
        report.comparison.load_time_winner.as_deref(),
        report.comparison.load_time_difference_ms,
    ) {
        (Some(winner), Some(margin)) => println!(
            "  Fastest load:       {} ({:.0} ms ahead)",
            winner.green().bold(),
            margin
        ),
        _ => println!("  Fastest load:       {}", "n/a".dimmed()),
    }
    match (
        report.comparison.transfer_size_winner.as_deref(),
        report.comparison.transfer_size_difference_bytes,
    ) {
        (Some(winner), Some(margin)) => println!(
            "  Smallest transfer:  {} ({:.1} KB lighter)",
            winner.green().bold(),
            margin / 1_024.0
        ),
        _ => println!("  Smallest transfer:  {}", "n/a".dimmed()),
    }
    match report.comparison.navigation_winner.as_deref() {
        Some(winner) => println!("  Fastest navigation: {}", winner.green().bold()),
        None => println!("  Fastest navigation: {}", "n/a".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_fields() {
        let config = apply_overrides(
            HarnessConfig::default(),
            Some(7),
            Some(PathBuf::from("/tmp/out")),
        );
        assert_eq!(config.iterations, 7);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_no_overrides_keep_defaults() {
        let config = apply_overrides(HarnessConfig::default(), None, None);
        assert_eq!(config, HarnessConfig::default());
    }
}
