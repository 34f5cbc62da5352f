// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Moving the module between the binary on disk and its in-memory model.
//!
//! Loading disassembles the target into a private scratch directory and parses
//! the listing. Writing renders the model back into the same directory and
//! assembles it over the target, embedding the resources the disassembler
//! extracted on load.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::errors::{ExportError, ExportResult};
use crate::il::{parse_module, IlProgram, LineEnding, Module};
use crate::image::TargetPlatform;
use crate::observability::messages::export::ModuleWritten;
use crate::observability::messages::StructuredLog;
use crate::traits::{resource_sibling, AssembleRequest, DisassembleRequest, Toolchain};

const SCRATCH_PREFIX: &str = "arma-dllexport-";
const SCRATCH_LISTING: &str = "module.il";

/// Private working directory, removed when dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> ExportResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| ExportError::io(std::env::temp_dir(), e))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn listing(&self) -> PathBuf {
        self.dir.path().join(SCRATCH_LISTING)
    }

    pub fn resource(&self) -> PathBuf {
        resource_sibling(&self.listing())
    }
}

/// A loaded module plus what is needed to write it back faithfully.
#[derive(Debug)]
pub struct LoadedModule {
    pub module: Module,
    pub line_ending: LineEnding,
}

/// Disassembles `target` into `scratch` and parses the listing.
///
/// `line_numbers` keeps the `.line` directives of a debug build, so the
/// rebuilt PDB still maps to the original sources.
pub async fn load_module(
    toolchain: &dyn Toolchain,
    target: &Path,
    scratch: &Scratch,
    line_numbers: bool,
) -> ExportResult<LoadedModule> {
    let listing = scratch.listing();
    toolchain
        .disassemble(&DisassembleRequest {
            module: target.to_path_buf(),
            output: listing.clone(),
            line_numbers,
        })
        .await?;

    let program = IlProgram::read(&listing).await?;
    let module = parse_module(&program)?;
    Ok(LoadedModule {
        module,
        line_ending: program.line_ending(),
    })
}

/// Options the assembler needs to rebuild the target.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub platform: TargetPlatform,
    pub debug: bool,
}

/// Renders `loaded` into `scratch` and assembles it over `target`.
pub async fn write_module(
    toolchain: &dyn Toolchain,
    loaded: &LoadedModule,
    scratch: &Scratch,
    target: &Path,
    options: BuildOptions,
) -> ExportResult<()> {
    let listing = scratch.listing();
    let program = loaded.module.render(loaded.line_ending);
    program.write(&listing).await?;

    let resource = existing(scratch.resource()).await;
    toolchain
        .assemble(&AssembleRequest {
            source: listing,
            output: target.to_path_buf(),
            resource,
            debug: options.debug,
            platform: options.platform,
        })
        .await?;

    ModuleWritten {
        target: &target.display().to_string(),
        line_count: program.len(),
    }
    .log();
    Ok(())
}

/// `Some(path)` if the file exists.
pub async fn existing(path: PathBuf) -> Option<PathBuf> {
    match tokio::fs::try_exists(&path).await {
        Ok(true) => Some(path),
        _ => None,
    }
}
