// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    finalize_config, load_and_validate_config, load_config, Config, ToolchainConfig, WrapperSpec,
};
pub use runtime::RuntimeBuilder;
pub use validation::validate_config;
