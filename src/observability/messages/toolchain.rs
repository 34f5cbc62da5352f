// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for external tool invocations and the textual patch stage.
//!
//! This module contains message types for logging events related to:
//! * Disassembler and assembler invocations
//! * Corflags and export directive patching
//! * Removal of intermediate files

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// An external tool is about to run.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use arma_dllexport::observability::messages::toolchain::ToolStarted;
///
/// let msg = ToolStarted {
///     stage: "Disassembling",
///     tool: "ildasm.exe",
///     input: "bin/MyExtension.dll",
///     output: "bin/MyExtension.dll.il",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ToolStarted<'a> {
    pub stage: &'a str,
    pub tool: &'a str,
    pub input: &'a str,
    pub output: &'a str,
}

impl Display for ToolStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} -> {} with {}",
            self.stage, self.input, self.output, self.tool
        )
    }
}

impl StructuredLog for ToolStarted<'_> {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            tool = self.tool,
            input = self.input,
            output = self.output,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "tool",
            span_name = name,
            stage = self.stage,
            tool = self.tool,
        )
    }
}

/// An external tool exited successfully.
///
/// # Log Level
/// `debug!` - Step detail
pub struct ToolCompleted<'a> {
    pub tool: &'a str,
    pub duration: Duration,
}

impl Display for ToolCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} completed in {:?}", self.tool, self.duration)
    }
}

impl StructuredLog for ToolCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            tool = self.tool,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("tool_completed", span_name = name, tool = self.tool)
    }
}

/// An external tool exited abnormally.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ToolExitedAbnormally<'a> {
    pub tool: &'a str,
    pub status: &'a str,
    pub output: &'a str,
}

impl Display for ToolExitedAbnormally<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} exited with {}", self.tool, self.status)
    }
}

impl StructuredLog for ToolExitedAbnormally<'_> {
    fn log(&self) {
        tracing::error!(
            tool = self.tool,
            status = self.status,
            output = self.output,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "tool_failed",
            span_name = name,
            tool = self.tool,
            status = self.status,
        )
    }
}

/// Disassembly patched with corflags and the export directive.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use arma_dllexport::observability::messages::toolchain::ProgramPatched;
///
/// let msg = ProgramPatched {
///     path: "bin/MyExtension.dll.il",
///     cor_flags: 0x0,
///     alias: "RVExtension",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProgramPatched<'a> {
    pub path: &'a str,
    pub cor_flags: u32,
    pub alias: &'a str,
}

impl Display for ProgramPatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Patched {}: .corflags 0x{:08X}, export {}",
            self.path, self.cor_flags, self.alias
        )
    }
}

impl StructuredLog for ProgramPatched<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            cor_flags = self.cor_flags,
            alias = self.alias,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("patch", span_name = name, path = self.path, alias = self.alias)
    }
}

/// Intermediate files are being removed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CleaningUp<'a> {
    pub paths: &'a [String],
}

impl Display for CleaningUp<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cleaning up {}", self.paths.join(", "))
    }
}

impl StructuredLog for CleaningUp<'_> {
    fn log(&self) {
        tracing::info!(file_count = self.paths.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("cleanup", span_name = name, file_count = self.paths.len())
    }
}

/// An intermediate file could not be removed; the run continues.
///
/// # Log Level
/// `debug!` - Non-fatal detail
pub struct CleanupFailed<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CleanupFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Could not remove {}: {}", self.path, self.error)
    }
}

impl StructuredLog for CleanupFailed<'_> {
    fn log(&self) {
        tracing::debug!(path = self.path, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("cleanup_failed", span_name = name, path = self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_patched_formats_flags() {
        let msg = ProgramPatched {
            path: "a.dll.il",
            cor_flags: 0x2,
            alias: "_RVExtension@12",
        };

        assert_eq!(
            msg.to_string(),
            "Patched a.dll.il: .corflags 0x00000002, export _RVExtension@12"
        );
    }

    #[test]
    fn test_cleaning_up_lists_paths() {
        let paths = vec!["a.dll.il".to_string(), "a.dll.res".to_string()];
        let msg = CleaningUp { paths: &paths };

        assert_eq!(msg.to_string(), "Cleaning up a.dll.il, a.dll.res");
    }
}
