// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading and validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration file loaded.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use arma_dllexport::observability::messages::validation::ConfigLoaded;
///
/// let msg = ConfigLoaded {
///     path: "arma-dllexport.yaml",
///     format: "yaml",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub format: &'a str,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded {} configuration from {}", self.format, self.path)
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, format = self.format, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("config", span_name = name, path = self.path)
    }
}

/// A tool directory was taken from the environment.
///
/// # Log Level
/// `debug!` - Step detail
pub struct ToolDirectoryFromEnvironment<'a> {
    pub tool: &'a str,
    pub env_var: &'a str,
    pub directory: &'a str,
}

impl Display for ToolDirectoryFromEnvironment<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Using {} directory {} from {}",
            self.tool, self.directory, self.env_var
        )
    }
}

impl StructuredLog for ToolDirectoryFromEnvironment<'_> {
    fn log(&self) {
        tracing::debug!(
            tool = self.tool,
            env_var = self.env_var,
            directory = self.directory,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("tool_directory", span_name = name, tool = self.tool)
    }
}

/// Configuration rejected by validation.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ConfigRejected<'a> {
    pub errors: &'a [ValidationError],
}

impl Display for ConfigRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration rejected with {} error(s): {}",
            self.errors.len(),
            self.errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        )
    }
}

impl StructuredLog for ConfigRejected<'_> {
    fn log(&self) {
        tracing::error!(error_count = self.errors.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "config_rejected",
            name = name,
            error_count = self.errors.len(),
        )
    }
}
