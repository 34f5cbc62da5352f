// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! This module provides the message types for every diagnostic and progress
//! event the exporter reports. Message types follow a struct-based pattern
//! with `Display` for the human-readable line and
//! [`messages::StructuredLog`] for emission with structured fields, which
//! keeps magic strings out of the engine and gives every event a stable shape.
//!
//! The library only emits through the `tracing` facade; the binary decides
//! where events go by installing a subscriber.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::export` - run lifecycle from platform detection to completion
//! * `messages::toolchain` - external tool invocations, patching and cleanup
//! * `messages::validation` - configuration loading and validation
//!
//! # Usage
//!
//! ```rust
//! use arma_dllexport::observability::messages::export::ExportFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = ExportFailed {
//!     target: "MyExtension.dll",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
