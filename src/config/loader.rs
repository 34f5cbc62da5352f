// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    ASSEMBLER_DIR_ENV, DEFAULT_ASSEMBLER, DEFAULT_DISASSEMBLER, DEFAULT_WRAPPER_METHOD,
    DEFAULT_WRAPPER_NAMESPACE, DEFAULT_WRAPPER_TYPE, DISASSEMBLER_DIR_ENV,
};
use crate::config::validate_config;
use crate::errors::ConfigError;
use crate::il::syntax::quote_type_name;
use crate::observability::messages::validation::{
    ConfigLoaded, ConfigRejected, ToolDirectoryFromEnvironment,
};
use crate::observability::messages::StructuredLog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration for one export run.
///
/// Everything is optional: the target usually comes from the command line,
/// tool directories from the environment and the wrapper names from their
/// defaults.
///
/// # Fields
/// * `target` - Path of the module to rewrite (the command line wins when both are given)
/// * `toolchain` - Where the disassembler and assembler live
/// * `wrapper` - Names of the synthesized wrapper and the keep-intermediates flag
///
/// # Example
/// ```yaml
/// target: bin/Release/MyExtension.dll
/// toolchain:
///   assembler_dir: C:\Windows\Microsoft.NET\Framework64\v4.0.30319
///   disassembler_dir: C:\Program Files (x86)\Microsoft SDKs\Windows\v10.0A\bin\NETFX 4.8 Tools
/// wrapper:
///   method_name: RVExtension
///   keep_il: true
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    pub target: Option<PathBuf>,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    #[serde(default)]
    pub wrapper: WrapperSpec,
}

/// Location of the external disassembler and assembler.
///
/// Directories and executable names are kept apart so a directory can be
/// supplied by the environment while the executable name keeps its default.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolchainConfig {
    pub assembler_dir: Option<PathBuf>,
    pub disassembler_dir: Option<PathBuf>,
    #[serde(default = "default_assembler")]
    pub assembler: String,
    #[serde(default = "default_disassembler")]
    pub disassembler: String,
}

fn default_assembler() -> String {
    DEFAULT_ASSEMBLER.to_string()
}

fn default_disassembler() -> String {
    DEFAULT_DISASSEMBLER.to_string()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            assembler_dir: None,
            disassembler_dir: None,
            assembler: default_assembler(),
            disassembler: default_disassembler(),
        }
    }
}

impl ToolchainConfig {
    /// Fills missing tool directories from `ARMA_DLLEXPORT_ILASM_DIR` and
    /// `ARMA_DLLEXPORT_ILDASM_DIR`.
    pub fn with_env_defaults(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Fills missing tool directories using `lookup` to read variables.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |tool: &str, env_var: &str| {
            lookup(env_var).filter(|v| !v.trim().is_empty()).map(|v| {
                ToolDirectoryFromEnvironment {
                    tool,
                    env_var,
                    directory: &v,
                }
                .log();
                PathBuf::from(v)
            })
        };
        if self.assembler_dir.is_none() {
            self.assembler_dir = from_env("assembler", ASSEMBLER_DIR_ENV);
        }
        if self.disassembler_dir.is_none() {
            self.disassembler_dir = from_env("disassembler", DISASSEMBLER_DIR_ENV);
        }
        self
    }

    pub fn assembler_path(&self) -> Option<PathBuf> {
        self.assembler_dir.as_ref().map(|dir| dir.join(&self.assembler))
    }

    pub fn disassembler_path(&self) -> Option<PathBuf> {
        self.disassembler_dir
            .as_ref()
            .map(|dir| dir.join(&self.disassembler))
    }
}

/// Names of the synthesized wrapper, fixed for the whole run.
///
/// # Fields
/// * `namespace` - Namespace of the wrapper type (defaults to `Maca134.Arma.DllExport`)
/// * `type_name` - Wrapper type name (defaults to `DllExportWrapper`)
/// * `method_name` - Wrapper method and export name (defaults to `RVExtension`)
/// * `keep_il` - Keep the intermediate `.il`/`.res` files next to the target
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct WrapperSpec {
    pub namespace: String,
    pub type_name: String,
    pub method_name: String,
    pub keep_il: bool,
}

impl Default for WrapperSpec {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_WRAPPER_NAMESPACE.to_string(),
            type_name: DEFAULT_WRAPPER_TYPE.to_string(),
            method_name: DEFAULT_WRAPPER_METHOD.to_string(),
            keep_il: false,
        }
    }
}

impl WrapperSpec {
    /// `Namespace.Type`
    pub fn full_type_name(&self) -> String {
        format!("{}.{}", self.namespace, self.type_name)
    }

    /// The type name as it appears in disassembly, e.g. `'Maca134.Arma.DllExport'.'DllExportWrapper'`
    pub fn quoted_type_name(&self) -> String {
        quote_type_name(&self.namespace, &self.type_name)
    }
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !matches!(format.as_str(), "yaml" | "yml" | "toml") {
        return Err(ConfigError::UnsupportedFormat(format));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = if format == "toml" {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    ConfigLoaded {
        path: &path.display().to_string(),
        format: &format,
    }
    .log();
    Ok(cfg)
}

/// Fill environment defaults into a config and validate it.
pub fn finalize_config(mut cfg: Config) -> Result<Config, ConfigError> {
    cfg.toolchain = cfg.toolchain.with_env_defaults();
    if let Err(errors) = validate_config(&cfg) {
        ConfigRejected { errors: &errors }.log();
        return Err(ConfigError::Invalid(errors));
    }
    Ok(cfg)
}

/// Load a config file, fill environment defaults and validate it.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    finalize_config(load_config(path)?)
}
