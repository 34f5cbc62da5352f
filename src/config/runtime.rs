// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::Path;
use std::sync::Arc;

use crate::backends::sdk::SdkToolchain;
use crate::config::{Config, WrapperSpec};
use crate::engine::DllExporter;
use crate::errors::ExportResult;
use crate::traits::Toolchain;

/// Export runtime builder - turns a configuration into a ready exporter.
///
/// The `RuntimeBuilder` keeps callers away from backend selection: the
/// configuration names the tool directories, the builder produces the SDK
/// toolchain for them and hands it to the engine together with the wrapper
/// settings.
///
/// # Examples
///
/// ```
/// use arma_dllexport::config::{Config, RuntimeBuilder};
///
/// let config = Config::default();
/// let (toolchain, wrapper) = RuntimeBuilder::from_config(&config);
///
/// assert_eq!(toolchain.name(), "sdk");
/// assert_eq!(wrapper.method_name, "RVExtension");
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the toolchain and wrapper settings from configuration.
    ///
    /// Tool paths are taken as they are; environment defaults must already
    /// have been applied (see [`crate::config::finalize_config`]).
    pub fn from_config(cfg: &Config) -> (Arc<dyn Toolchain>, WrapperSpec) {
        let toolchain: Arc<dyn Toolchain> = Arc::new(SdkToolchain::from_config(&cfg.toolchain));
        (toolchain, cfg.wrapper.clone())
    }

    /// Open an exporter for `target` with the configured toolchain.
    pub async fn open(cfg: &Config, target: &Path) -> ExportResult<DllExporter> {
        let (toolchain, wrapper) = Self::from_config(cfg);
        DllExporter::open(target, wrapper, toolchain).await
    }
}
