// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The .NET SDK toolchain: `ildasm` and `ilasm` run as subprocesses.
//!
//! Each invocation first checks that the configured executable exists, then
//! runs it to completion. A non-zero exit becomes [`ExportError::ToolFailed`]
//! carrying whatever the tool printed.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;

use crate::config::ToolchainConfig;
use crate::errors::{ExportError, ExportResult};
use crate::observability::messages::toolchain::{
    ToolCompleted, ToolExitedAbnormally, ToolStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{AssembleRequest, DisassembleRequest, Toolchain};

const ASSEMBLER: &str = "ilasm";
const DISASSEMBLER: &str = "ildasm";

/// Runs the SDK's disassembler and assembler.
#[derive(Debug, Clone, Default)]
pub struct SdkToolchain {
    assembler: Option<PathBuf>,
    disassembler: Option<PathBuf>,
}

impl SdkToolchain {
    pub fn new(assembler: Option<PathBuf>, disassembler: Option<PathBuf>) -> Self {
        Self {
            assembler,
            disassembler,
        }
    }

    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self::new(config.assembler_path(), config.disassembler_path())
    }

    async fn run(
        &self,
        tool: &'static str,
        executable: Option<&Path>,
        stage: &str,
        args: Vec<OsString>,
        input: &Path,
        output: &Path,
    ) -> ExportResult<()> {
        let executable = executable.ok_or(ExportError::ToolNotConfigured { tool })?;
        if !tokio::fs::try_exists(executable).await.unwrap_or(false) {
            return Err(ExportError::ToolNotFound {
                tool,
                path: executable.to_path_buf(),
            });
        }

        ToolStarted {
            stage,
            tool,
            input: &input.display().to_string(),
            output: &output.display().to_string(),
        }
        .log();

        let mut command = Command::new(executable);
        command.args(&args);

        let started = Instant::now();
        let result = command.output().await.map_err(|e| ExportError::ToolFailed {
            tool,
            status: "could not be started".to_string(),
            output: e.to_string(),
        })?;

        if !result.status.success() {
            let status = result.status.to_string();
            let output = combined_output(&result.stdout, &result.stderr);
            ToolExitedAbnormally {
                tool,
                status: &status,
                output: &output,
            }
            .log();
            return Err(ExportError::ToolFailed {
                tool,
                status,
                output,
            });
        }

        ToolCompleted {
            tool,
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }
}

#[async_trait]
impl Toolchain for SdkToolchain {
    async fn disassemble(&self, request: &DisassembleRequest) -> ExportResult<()> {
        self.run(
            DISASSEMBLER,
            self.disassembler.as_deref(),
            "Disassembling",
            disassembler_args(request),
            &request.module,
            &request.output,
        )
        .await
    }

    async fn assemble(&self, request: &AssembleRequest) -> ExportResult<()> {
        self.run(
            ASSEMBLER,
            self.assembler.as_deref(),
            "Assembling",
            assembler_args(request),
            &request.source,
            &request.output,
        )
        .await
    }

    fn name(&self) -> &'static str {
        "sdk"
    }
}

/// `/quoteallnames /utf8 /nobar [/linenum] /out:<il> <module>`
pub fn disassembler_args(request: &DisassembleRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["/quoteallnames".into(), "/utf8".into(), "/nobar".into()];
    if request.line_numbers {
        args.push("/linenum".into());
    }
    args.push(prefixed("/out:", &request.output));
    args.push(request.module.clone().into_os_string());
    args
}

/// `/nologo /out:<dll> /DLL /debug|/optimize [/X64] [/resource=<res>] <il>`
pub fn assembler_args(request: &AssembleRequest) -> Vec<OsString> {
    let kind = request
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("dll")
        .to_ascii_uppercase();

    let mut args: Vec<OsString> = vec!["/nologo".into(), prefixed("/out:", &request.output)];
    args.push(format!("/{}", kind).into());
    let build = if request.debug { "/debug" } else { "/optimize" };
    args.push(build.into());
    if request.platform.is_64bit() {
        args.push("/X64".into());
    }
    if let Some(resource) = &request.resource {
        args.push(prefixed("/resource=", resource));
    }
    args.push(request.source.clone().into_os_string());
    args
}

fn prefixed(prefix: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(path.as_os_str());
    arg
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    [stdout.trim(), stderr.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}
