// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with structured fields at the
//! level the event warrants.
//!
//! # Organization
//!
//! * `export` - engine run lifecycle: platform, candidate, wrapper, outcome
//! * `toolchain` - disassembler/assembler invocations, patching and cleanup
//! * `validation` - configuration validation and defaults
//!
//! # Usage Pattern
//!
//! ```rust
//! use arma_dllexport::observability::messages::StructuredLog;
//! use arma_dllexport::observability::messages::export::CandidateFound;
//!
//! let msg = CandidateFound {
//!     method: "MyExtension.Entry::Invoke",
//! };
//!
//! tracing::info!("{}", msg);
//! msg.log();
//! ```

use tracing::Span;

pub mod export;
pub mod toolchain;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emits the event at the message's level.
    fn log(&self);

    /// Opens a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
