// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod toolchain;

pub use toolchain::{resource_sibling, AssembleRequest, DisassembleRequest, Toolchain};
