// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement pipeline for routebench.
//!
//! The pipeline runs in four phases: probe every target until its HTTP
//! listener answers, measure page loads and route transitions per target in
//! a dedicated headless browser, aggregate the trials, and hand the
//! assembled report back to the caller for persistence.
//!
//! Targets are measured concurrently; trials within one target run strictly
//! sequentially so they do not contend with each other. Only the readiness
//! barrier can fail a run — every later error degrades to a dropped trial or
//! a null measurement.
//!
//! # Modules
//!
//! - [`probe`] - Server readiness prober with a join barrier
//! - [`browser`] - Browser session lifecycle and selector waits
//! - [`pageload`] - Repeated page-load trials per target
//! - [`navigation`] - Single-trial route-transition timing
//! - [`runner`] - End-to-end orchestration
//! - [`error`] - Harness error type

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod browser;
pub mod error;
pub mod navigation;
pub mod pageload;
pub mod probe;
pub mod runner;

pub use browser::BrowserSession;
pub use error::{HarnessError, Result};
pub use runner::run;
