// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Static harness configuration.
//!
//! The target table identifies the applications under test; it is loaded once
//! at startup and never mutated. Every timeout the pipeline uses is explicit
//! here so that no navigation, selector wait, or probe can hang a run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One application under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTarget {
    /// Unique name used in reports and comparisons.
    pub name: String,
    /// Root URL probed for readiness and loaded by the navigation measurer.
    pub base_url: String,
    /// Data-display route measured by the page load measurer.
    pub page_url: String,
    /// CSS selector of the in-app link clicked by the navigation measurer.
    pub nav_link_selector: String,
    /// CSS selector that appears once the page's data fetch has rendered.
    pub content_ready_selector: String,
}

/// Per-operation timeouts, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Timeout for a single readiness probe request.
    pub probe_request_ms: u64,
    /// Timeout for a page navigation to complete.
    pub navigation_ms: u64,
    /// Timeout for a selector to become visible.
    pub selector_ms: u64,
    /// Grace delay applied when the content-ready selector never shows.
    pub selector_grace_ms: u64,
    /// In-page budget for the FCP/LCP observers to report.
    pub paint_ms: u64,
    /// Budget for the post-click network activity to go quiet.
    pub network_idle_ms: u64,
    /// Window with no new network activity that counts as "settled".
    pub network_quiet_window_ms: u64,
    /// Interval between selector and network-idle polls.
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe_request_ms: 2_000,
            navigation_ms: 30_000,
            selector_ms: 10_000,
            selector_grace_ms: 2_000,
            paint_ms: 15_000,
            network_idle_ms: 10_000,
            network_quiet_window_ms: 500,
            poll_interval_ms: 100,
        }
    }
}

impl Timeouts {
    /// Probe request timeout as a [`Duration`].
    pub fn probe_request(&self) -> Duration {
        Duration::from_millis(self.probe_request_ms)
    }

    /// Navigation timeout as a [`Duration`].
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Selector timeout as a [`Duration`].
    pub fn selector(&self) -> Duration {
        Duration::from_millis(self.selector_ms)
    }

    /// Selector grace delay as a [`Duration`].
    pub fn selector_grace(&self) -> Duration {
        Duration::from_millis(self.selector_grace_ms)
    }

    /// Network-idle budget as a [`Duration`].
    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    /// Network quiet window as a [`Duration`].
    pub fn network_quiet_window(&self) -> Duration {
        Duration::from_millis(self.network_quiet_window_ms)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Full harness configuration: run settings plus the target table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Number of page-load trials per target.
    pub iterations: u32,
    /// Maximum readiness probe attempts per target.
    pub probe_max_attempts: u32,
    /// Fixed delay between probe attempts, in milliseconds.
    pub probe_delay_ms: u64,
    /// Directory receiving `latest.json` and the `history/` files.
    pub output_dir: PathBuf,
    /// Per-operation timeouts.
    pub timeouts: Timeouts,
    /// Applications under test, in comparison (tie-break) order.
    pub targets: Vec<AppTarget>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            probe_max_attempts: 30,
            probe_delay_ms: 1_000,
            output_dir: PathBuf::from("benchmark-results"),
            timeouts: Timeouts::default(),
            targets: default_targets(),
        }
    }
}

impl HarnessConfig {
    /// Load a configuration from a TOML file.
    ///
    /// Missing keys fall back to the defaults, so a config file may override
    /// only the target table, only the iteration count, and so on.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Probe retry delay as a [`Duration`].
    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    /// Directory receiving the append-only history files.
    pub fn history_dir(&self) -> PathBuf {
        self.output_dir.join("history")
    }

    /// Check the semantic invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::invalid_config("iterations must be at least 1"));
        }
        if self.probe_max_attempts == 0 {
            return Err(Error::invalid_config("probe_max_attempts must be at least 1"));
        }
        if self.targets.is_empty() {
            return Err(Error::invalid_config("at least one target is required"));
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.is_empty() {
                return Err(Error::invalid_config("target names must not be empty"));
            }
            if !seen.insert(target.name.as_str()) {
                return Err(Error::invalid_config(format!(
                    "duplicate target name: {}",
                    target.name
                )));
            }
            if !target.base_url.starts_with("http://") && !target.base_url.starts_with("https://") {
                return Err(Error::invalid_config(format!(
                    "target {} base_url must be an http(s) URL",
                    target.name
                )));
            }
        }
        Ok(())
    }
}

/// The built-in target table: the three router demo apps on localhost.
pub fn default_targets() -> Vec<AppTarget> {
    vec![
        AppTarget {
            name: "react-router".to_string(),
            base_url: "http://localhost:3000".to_string(),
            page_url: "http://localhost:3000/posts".to_string(),
            nav_link_selector: "a[href='/posts']".to_string(),
            content_ready_selector: ".post-list".to_string(),
        },
        AppTarget {
            name: "tanstack-router".to_string(),
            base_url: "http://localhost:3001".to_string(),
            page_url: "http://localhost:3001/posts".to_string(),
            nav_link_selector: "a[href='/posts']".to_string(),
            content_ready_selector: ".post-list".to_string(),
        },
        AppTarget {
            name: "nextjs".to_string(),
            base_url: "http://localhost:3002".to_string(),
            page_url: "http://localhost:3002/posts".to_string(),
            nav_link_selector: "a[href='/posts']".to_string(),
            content_ready_selector: ".post-list".to_string(),
        },
    ]
}
