// Copyright 2025 Routebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error type for the core crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is structurally valid but semantically wrong.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file could not be parsed as TOML.
    #[error("failed to parse config file: {0}")]
    ParseConfig(#[from] toml::de::Error),
}

impl Error {
    /// Create an [`Error::InvalidConfig`] from any message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
