// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error type for the measurement pipeline.
//!
//! Only [`HarnessError::ServerNotReady`] aborts a run; everything else is
//! caught at trial or metric scope and converted into dropped data.

use thiserror::Error;

/// Errors produced while probing or measuring targets.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A target never answered its readiness probe. Fatal.
    #[error("server at {url} did not become ready after {attempts} attempts")]
    ServerNotReady {
        /// Base URL that was probed.
        url: String,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// The probe HTTP client could not be constructed.
    #[error("failed to build probe client: {0}")]
    Http(#[from] reqwest::Error),

    /// The browser or the DevTools connection failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// A navigation did not complete within its budget.
    #[error("navigation to {url} timed out")]
    NavigationTimeout {
        /// URL that was being loaded.
        url: String,
    },

    /// A selector never became visible within its budget.
    #[error("selector {selector:?} did not become visible in time")]
    SelectorTimeout {
        /// Selector that was awaited.
        selector: String,
    },

    /// Configuration rejected by the core crate.
    #[error(transparent)]
    Core(#[from] routebench_core::Error),
}

impl From<chromiumoxide::error::CdpError> for HarnessError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        HarnessError::Browser(err.to_string())
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
