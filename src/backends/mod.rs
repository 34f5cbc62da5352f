// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Toolchain backend implementations.
//!
//! The engine never runs a tool itself; it hands requests to a
//! [`Toolchain`](crate::traits::Toolchain) backend.
//!
//! # Available Backends
//!
//! ## SDK Backend
//! The .NET SDK's `ildasm` and `ilasm`, run as subprocesses:
//! - **Presence check**: a missing executable fails before anything is spawned
//! - **Failure reporting**: a non-zero exit carries the tool's combined output
//! - **Use Case**: every real export run
//!
//! ## Stub Backend (Test-Only)
//! An in-process stand-in that round-trips IL text through synthetic images:
//! - **StubToolchain**: records every request, optionally fails a chosen call
//! - **Module helpers**: build and read stub modules for fixtures
//! - **Note**: NOT available in production builds
//!
//! # Examples
//!
//! ```rust,no_run
//! use arma_dllexport::backends::sdk::SdkToolchain;
//! use arma_dllexport::config::ToolchainConfig;
//!
//! let config = ToolchainConfig::default().with_env_defaults();
//! let toolchain = SdkToolchain::from_config(&config);
//! ```

pub mod sdk;
#[cfg(test)]
pub mod stub;
