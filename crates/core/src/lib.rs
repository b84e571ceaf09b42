// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model, configuration, and statistics for routebench.
//!
//! This crate holds everything the measurement pipeline shares: the static
//! target configuration, the raw and aggregated metric types, the comparison
//! derivation, and the persisted report schema.
//!
//! # Modules
//!
//! - [`config`] - Target table, timeouts, and TOML configuration loading
//! - [`metrics`] - Per-trial metrics and trial aggregation
//! - [`compare`] - Winner/difference derivation between targets
//! - [`report`] - The persisted report schema
//! - [`error`] - Crate error type

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;

pub use compare::ComparisonResult;
pub use config::{AppTarget, HarnessConfig, Timeouts};
pub use error::{Error, Result};
pub use metrics::{AggregatedMetrics, RunMetrics};
pub use report::{AppResult, PersistedReport};
