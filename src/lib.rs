// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // toolchain backends
pub mod config;     // config + runtime builder
pub mod engine;     // export engine
pub mod errors;     // error handling
pub mod il;         // disassembly text and module model
pub mod image;      // PE/CLI header inspection
pub mod observability;
pub mod traits;     // toolchain abstraction
