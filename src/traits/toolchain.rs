// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::ExportResult;
use crate::image::TargetPlatform;

/// Disassemble `module` into the IL file `output`.
///
/// The disassembler writes embedded resources to the `.res` sibling of
/// `output` when the module has any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembleRequest {
    pub module: PathBuf,
    pub output: PathBuf,
    /// Emit source line information (only meaningful when the module has debug info)
    pub line_numbers: bool,
}

/// Assemble the IL file `source` into the DLL `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Compiled resource file to embed, passed only when it exists
    pub resource: Option<PathBuf>,
    /// Produce debug information instead of an optimized image
    pub debug: bool,
    pub platform: TargetPlatform,
}

/// External IL toolchain: a disassembler and an assembler.
#[async_trait]
pub trait Toolchain: Send + Sync {
    async fn disassemble(&self, request: &DisassembleRequest) -> ExportResult<()>;

    async fn assemble(&self, request: &AssembleRequest) -> ExportResult<()>;

    fn name(&self) -> &'static str;
}

/// The `.res` file the disassembler writes next to an IL file.
pub fn resource_sibling(il_path: &Path) -> PathBuf {
    il_path.with_extension("res")
}
