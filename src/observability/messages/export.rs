// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the export run lifecycle.
//!
//! This module contains message types for logging events related to:
//! * Target platform detection
//! * Candidate discovery
//! * Wrapper injection and module rewriting
//! * Run completion and failure

use crate::image::{Machine, TargetPlatform};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Target platform classified from the image headers.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use arma_dllexport::image::{Machine, TargetPlatform};
/// use arma_dllexport::observability::messages::export::PlatformDetected;
///
/// let msg = PlatformDetected {
///     target: "bin/MyExtension.dll",
///     machine: Machine::Amd64,
///     platform: TargetPlatform::X64,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PlatformDetected<'a> {
    pub target: &'a str,
    pub machine: Machine,
    pub platform: TargetPlatform,
}

impl Display for PlatformDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Detected {} platform for {} (machine {})",
            self.platform, self.target, self.machine
        )
    }
}

impl StructuredLog for PlatformDetected<'_> {
    fn log(&self) {
        tracing::info!(
            target_path = self.target,
            machine = %self.machine,
            platform = %self.platform,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "export",
            span_name = name,
            target_path = self.target,
            platform = %self.platform,
        )
    }
}

/// The single marked method was found.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CandidateFound<'a> {
    pub method: &'a str,
}

impl Display for CandidateFound<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Found export candidate {}", self.method)
    }
}

impl StructuredLog for CandidateFound<'_> {
    fn log(&self) {
        tracing::info!(method = self.method, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("candidate", span_name = name, method = self.method)
    }
}

/// No method carries the marker; the run is a successful no-op.
///
/// # Log Level
/// `info!` - Important operational event
pub struct NothingToExport<'a> {
    pub target: &'a str,
    pub attribute: &'a str,
}

impl Display for NothingToExport<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No method in {} is marked with {}; nothing to export",
            self.target, self.attribute
        )
    }
}

impl StructuredLog for NothingToExport<'_> {
    fn log(&self) {
        tracing::info!(
            target_path = self.target,
            attribute = self.attribute,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("nothing_to_export", span_name = name, target_path = self.target)
    }
}

/// Wrapper type and method are being added to the module.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use arma_dllexport::observability::messages::export::InjectingWrapper;
///
/// let msg = InjectingWrapper {
///     wrapper: "Maca134.Arma.DllExport.DllExportWrapper::RVExtension",
///     candidate: "MyExtension.Entry::Invoke",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct InjectingWrapper<'a> {
    pub wrapper: &'a str,
    pub candidate: &'a str,
}

impl Display for InjectingWrapper<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Injecting wrapper {} forwarding to {}",
            self.wrapper, self.candidate
        )
    }
}

impl StructuredLog for InjectingWrapper<'_> {
    fn log(&self) {
        tracing::info!(
            wrapper = self.wrapper,
            candidate = self.candidate,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "inject",
            span_name = name,
            wrapper = self.wrapper,
            candidate = self.candidate,
        )
    }
}

/// Rewritten module written back over the target.
///
/// # Log Level
/// `debug!` - Step detail
pub struct ModuleWritten<'a> {
    pub target: &'a str,
    pub line_count: usize,
}

impl Display for ModuleWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wrote rewritten module to {} ({} lines of IL)",
            self.target, self.line_count
        )
    }
}

impl StructuredLog for ModuleWritten<'_> {
    fn log(&self) {
        tracing::debug!(
            target_path = self.target,
            line_count = self.line_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("write_module", span_name = name, target_path = self.target)
    }
}

/// Export finished; the alias is now in the native export table.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExportCompleted<'a> {
    pub target: &'a str,
    pub alias: &'a str,
    pub duration: Duration,
}

impl Display for ExportCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Exported {} from {} in {:?}",
            self.alias, self.target, self.duration
        )
    }
}

impl StructuredLog for ExportCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            target_path = self.target,
            alias = self.alias,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "export_completed",
            span_name = name,
            target_path = self.target,
            alias = self.alias,
            duration = ?self.duration,
        )
    }
}

/// Export aborted.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use arma_dllexport::observability::messages::export::ExportFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "ilasm exited with 1");
/// let msg = ExportFailed {
///     target: "bin/MyExtension.dll",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ExportFailed<'a> {
    pub target: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExportFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Export of {} failed: {}", self.target, self.error)
    }
}

impl StructuredLog for ExportFailed<'_> {
    fn log(&self) {
        tracing::error!(
            target_path = self.target,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "export_failed",
            span_name = name,
            target_path = self.target,
            error = %self.error,
        )
    }
}
