// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process toolchain for tests.
//!
//! A stub module is a synthetic PE header followed by the module's IL text.
//! Disassembling copies the text out; assembling checks that the text parses
//! and writes a fresh header for the requested platform in front of it, taking
//! the CLI flags from the program's `.corflags` directive like the real
//! assembler does.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use crate::errors::{ExportError, ExportResult};
use crate::il::{parse_module, IlProgram};
use crate::image::pe::{build_test_image, TestImage, COMIMAGE_FLAGS_ILONLY};
use crate::image::{Machine, TargetPlatform};
use crate::traits::{resource_sibling, AssembleRequest, DisassembleRequest, Toolchain};

const HEADER_SIZE: usize = 0x400;

/// A recorded tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Disassemble(DisassembleRequest),
    Assemble(AssembleRequest),
}

/// Toolchain double that works on stub modules.
#[derive(Default)]
pub struct StubToolchain {
    invocations: Mutex<Vec<Invocation>>,
    resource: Option<Vec<u8>>,
    fail_disassemble: bool,
    /// 1-based index of the assemble call that fails
    fail_assemble_call: Option<usize>,
}

impl StubToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disassembly also emits a resource file with these bytes.
    pub fn with_resource(mut self, bytes: &[u8]) -> Self {
        self.resource = Some(bytes.to_vec());
        self
    }

    pub fn failing_disassemble(mut self) -> Self {
        self.fail_disassemble = true;
        self
    }

    pub fn failing_assemble(mut self, call: usize) -> Self {
        self.fail_assemble_call = Some(call);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn assemble_requests(&self) -> Vec<AssembleRequest> {
        self.invocations()
            .into_iter()
            .filter_map(|i| match i {
                Invocation::Assemble(request) => Some(request),
                Invocation::Disassemble(_) => None,
            })
            .collect()
    }

    fn record(&self, invocation: Invocation) -> usize {
        let mut invocations = self.invocations.lock().unwrap();
        invocations.push(invocation);
        invocations
            .iter()
            .filter(|i| matches!(i, Invocation::Assemble(_)))
            .count()
    }
}

fn simulated_failure(tool: &'static str) -> ExportError {
    ExportError::ToolFailed {
        tool,
        status: "exit status: 1".to_string(),
        output: "simulated failure".to_string(),
    }
}

#[async_trait]
impl Toolchain for StubToolchain {
    async fn disassemble(&self, request: &DisassembleRequest) -> ExportResult<()> {
        self.record(Invocation::Disassemble(request.clone()));
        if self.fail_disassemble {
            return Err(simulated_failure("ildasm"));
        }

        let bytes = tokio::fs::read(&request.module)
            .await
            .map_err(|e| ExportError::io(&request.module, e))?;
        let text = bytes.get(HEADER_SIZE..).unwrap_or_default();
        tokio::fs::write(&request.output, text)
            .await
            .map_err(|e| ExportError::io(&request.output, e))?;

        if let Some(resource) = &self.resource {
            let path = resource_sibling(&request.output);
            tokio::fs::write(&path, resource)
                .await
                .map_err(|e| ExportError::io(&path, e))?;
        }
        Ok(())
    }

    async fn assemble(&self, request: &AssembleRequest) -> ExportResult<()> {
        let call = self.record(Invocation::Assemble(request.clone()));
        if self.fail_assemble_call == Some(call) {
            return Err(simulated_failure("ilasm"));
        }

        let program = IlProgram::read(&request.source).await?;
        parse_module(&program).map_err(|e| ExportError::ToolFailed {
            tool: "ilasm",
            status: "exit status: 1".to_string(),
            output: e.to_string(),
        })?;

        let image = TestImage {
            machine: match request.platform {
                TargetPlatform::X86 => Machine::I386,
                _ => Machine::Amd64,
            },
            cli_flags: declared_cor_flags(&program).unwrap_or(COMIMAGE_FLAGS_ILONLY),
            dll: true,
            debug: request.debug,
            pe32_plus: request.platform.is_64bit(),
        };
        write_module(&request.output, image, &program.to_text()).await
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn declared_cor_flags(program: &IlProgram) -> Option<u32> {
    program.lines().iter().find_map(|line| {
        let value = line.trim_start().strip_prefix(".corflags ")?;
        let hex = value.split_whitespace().next()?.trim_start_matches("0x");
        u32::from_str_radix(hex, 16).ok()
    })
}

/// Bytes of a stub module with the given header and IL text.
pub fn module_bytes(image: TestImage, il: &str) -> Vec<u8> {
    let mut bytes = build_test_image(image);
    bytes.resize(HEADER_SIZE, 0);
    bytes.extend_from_slice(il.as_bytes());
    bytes
}

/// The IL text carried by a stub module.
pub fn module_il(bytes: &[u8]) -> String {
    let program = IlProgram::decode(bytes.get(HEADER_SIZE..).unwrap_or_default()).unwrap();
    program.to_text()
}

pub async fn write_module(path: &Path, image: TestImage, il: &str) -> ExportResult<()> {
    tokio::fs::write(path, module_bytes(image, il))
        .await
        .map_err(|e| ExportError::io(path, e))
}
