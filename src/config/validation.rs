// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Every check runs and every failure is collected, so one pass reports all
//! problems with a configuration:
//!
//! 1. **Wrapper names**: the namespace is a dotted identifier, the type and
//!    method names are plain identifiers. They end up verbatim in the
//!    synthesized declaration and in the native export table.
//! 2. **Toolchain**: both tool directories are known and the executable names
//!    are not empty.
//!
//! # Examples
//!
//! ```rust
//! use arma_dllexport::config::{validate_config, Config};
//! use arma_dllexport::errors::ValidationError;
//!
//! let config = Config::default();
//!
//! let errors = validate_config(&config).unwrap_err();
//! assert!(errors.iter().all(|e| matches!(e, ValidationError::MissingToolDirectory { .. })));
//! ```

use crate::config::consts::{ASSEMBLER_DIR_ENV, DISASSEMBLER_DIR_ENV};
use crate::config::{Config, ToolchainConfig, WrapperSpec};
use crate::errors::ValidationError;
use crate::il::syntax::is_identifier;

/// Validates a configuration, returning every problem found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_wrapper(&config.wrapper);
    errors.extend(validate_toolchain(&config.toolchain));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_wrapper(wrapper: &WrapperSpec) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if wrapper.namespace.is_empty() {
        errors.push(ValidationError::EmptyName { field: "namespace" });
    } else if !wrapper.namespace.split('.').all(is_identifier) {
        errors.push(ValidationError::InvalidIdentifier {
            field: "namespace",
            value: wrapper.namespace.clone(),
        });
    }

    for (field, value) in [
        ("type_name", &wrapper.type_name),
        ("method_name", &wrapper.method_name),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::EmptyName { field });
        } else if !is_identifier(value) {
            errors.push(ValidationError::InvalidIdentifier {
                field,
                value: value.clone(),
            });
        }
    }

    errors
}

fn validate_toolchain(toolchain: &ToolchainConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if toolchain.assembler_dir.is_none() {
        errors.push(ValidationError::MissingToolDirectory {
            tool: "assembler",
            env_var: ASSEMBLER_DIR_ENV,
        });
    }
    if toolchain.disassembler_dir.is_none() {
        errors.push(ValidationError::MissingToolDirectory {
            tool: "disassembler",
            env_var: DISASSEMBLER_DIR_ENV,
        });
    }
    if toolchain.assembler.trim().is_empty() {
        errors.push(ValidationError::EmptyToolName { tool: "assembler" });
    }
    if toolchain.disassembler.trim().is_empty() {
        errors.push(ValidationError::EmptyToolName {
            tool: "disassembler",
        });
    }

    errors
}
