// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors found while validating a loaded configuration.
///
/// Validation accumulates every problem it finds so a build author can fix the
/// configuration in one pass instead of one error at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A wrapper name was configured as an empty string
    EmptyName {
        /// The configuration field that is empty
        field: &'static str,
    },
    /// A wrapper name contains characters that cannot appear in an IL identifier
    InvalidIdentifier {
        /// The configuration field holding the bad value
        field: &'static str,
        /// The rejected value
        value: String,
    },
    /// Neither the configuration nor the environment names a directory for a tool
    MissingToolDirectory {
        /// Which tool is missing ("assembler" or "disassembler")
        tool: &'static str,
        /// The environment variable that could have supplied the directory
        env_var: &'static str,
    },
    /// A tool executable name was configured as an empty string
    EmptyToolName {
        /// Which tool has the empty name
        tool: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName { field } => {
                write!(f, "Wrapper setting '{}' must not be empty", field)
            }
            ValidationError::InvalidIdentifier { field, value } => {
                write!(
                    f,
                    "Wrapper setting '{}' has invalid value '{}': only letters, digits and '_' are allowed{}",
                    field,
                    value,
                    if *field == "namespace" {
                        " (segments separated by '.')"
                    } else {
                        ""
                    }
                )
            }
            ValidationError::MissingToolDirectory { tool, env_var } => {
                write!(
                    f,
                    "No {} directory configured: set toolchain.{}_dir or the {} environment variable",
                    tool, tool, env_var
                )
            }
            ValidationError::EmptyToolName { tool } => {
                write!(f, "The {} executable name must not be empty", tool)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while reading a configuration file from disk.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the configuration schema.
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file is not valid TOML for the configuration schema.
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension does not select a known format.
    #[error("Unsupported config format '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    /// The configuration parsed but failed validation.
    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
