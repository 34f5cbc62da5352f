// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Textual patch of the re-disassembled program.
//!
//! Two edits turn the rewritten library into one with a native export:
//!
//! 1. The `.corflags` directive is replaced with the platform's value.
//! 2. Inside the wrapper method, right after its opening brace:
//!
//! ```text
//!     .vtentry 1 : 1
//!     .export [1] as RVExtension
//! ```
//!
//! The disassembler may print a class twice, once as an empty shell in the
//! structure section and once with its members. Shells are skipped; the first
//! declaration of the wrapper that contains a method is patched.

use std::path::Path;

use crate::config::consts::EXPORT_SLOT;
use crate::errors::{ExportError, ExportResult};
use crate::il::syntax::{brace_balance, is_directive, strip_comment, tokens};
use crate::il::IlProgram;
use crate::observability::messages::toolchain::ProgramPatched;
use crate::observability::messages::StructuredLog;

const COR_FLAGS: &str = ".corflags";

/// The edits for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPatch {
    pub cor_flags: u32,
    /// Wrapper type as the disassembler quotes it
    pub wrapper_type: String,
    pub alias: String,
}

impl ExportPatch {
    /// Applies both edits to `program`.
    pub fn apply(&self, program: &mut IlProgram) -> ExportResult<()> {
        patch_cor_flags(program, self.cor_flags)?;
        insert_export_directives(program, &self.wrapper_type, &self.alias)
    }
}

/// The value of the first `.corflags` directive, if any.
pub fn read_cor_flags(program: &IlProgram) -> Option<u32> {
    program.lines().iter().find_map(|line| {
        let code = strip_comment(line).trim();
        if !is_directive(code, COR_FLAGS) {
            return None;
        }
        let value = code[COR_FLAGS.len()..].trim();
        let hex = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))?;
        u32::from_str_radix(hex, 16).ok()
    })
}

/// Replaces the first `.corflags` line with `.corflags 0xNNNNNNNN`.
pub fn patch_cor_flags(program: &mut IlProgram, flags: u32) -> ExportResult<()> {
    let line = program
        .lines_mut()
        .iter_mut()
        .find(|line| is_directive(line.trim_start(), COR_FLAGS))
        .ok_or_else(|| ExportError::PatchTargetMissing("no .corflags directive".to_string()))?;
    *line = format!("{} 0x{:08X}", COR_FLAGS, flags);
    Ok(())
}

/// Inserts the vtable entry and export directives into the wrapper method.
pub fn insert_export_directives(
    program: &mut IlProgram,
    wrapper_type: &str,
    alias: &str,
) -> ExportResult<()> {
    let position = find_method_body(program.lines(), wrapper_type).ok_or_else(|| {
        ExportError::PatchTargetMissing(format!("no method declared in class {}", wrapper_type))
    })?;

    let lines = program.lines_mut();
    lines.insert(position, format!("    .export [{}] as {}", EXPORT_SLOT, alias));
    lines.insert(position, format!("    .vtentry {} : {}", EXPORT_SLOT, EXPORT_SLOT));
    Ok(())
}

/// Index of the line after the opening brace of the first method in the
/// first non-empty declaration of `wrapper_type`.
fn find_method_body(lines: &[String], wrapper_type: &str) -> Option<usize> {
    let mut index = 0;
    while index < lines.len() {
        if declares_class(&lines[index], wrapper_type) {
            match scan_class(lines, index + 1) {
                ClassScan::Method(position) => return Some(position),
                ClassScan::Shell(end) => index = end,
                ClassScan::Unterminated => return None,
            }
        }
        index += 1;
    }
    None
}

fn declares_class(line: &str, wrapper_type: &str) -> bool {
    let code = strip_comment(line).trim();
    if !is_directive(code, ".class") {
        return false;
    }
    let parts = tokens(code);
    parts
        .iter()
        .take_while(|t| **t != "extends" && **t != "implements")
        .any(|t| *t == wrapper_type)
        && parts.get(1) != Some(&"extern")
}

enum ClassScan {
    /// Insertion point inside the first method
    Method(usize),
    /// The class closed without a method; index of its closing line
    Shell(usize),
    Unterminated,
}

fn scan_class(lines: &[String], start: usize) -> ClassScan {
    let Some(open) = (start..lines.len())
        .find(|&i| strip_comment(&lines[i]).trim_start().starts_with('{'))
    else {
        return ClassScan::Unterminated;
    };

    let mut depth = brace_balance(&lines[open]);
    let mut in_method = false;
    for (i, line) in lines.iter().enumerate().skip(open + 1) {
        let code = strip_comment(line).trim();
        if depth == 1 && is_directive(code, ".method") {
            in_method = true;
        } else if in_method && depth == 1 && code.starts_with('{') {
            return ClassScan::Method(i + 1);
        }
        depth += brace_balance(line);
        if depth <= 0 {
            return ClassScan::Shell(i);
        }
    }
    ClassScan::Unterminated
}

/// Reads `path`, applies `patch` and writes the program back.
pub async fn patch_file(path: &Path, patch: &ExportPatch) -> ExportResult<()> {
    let mut program = IlProgram::read(path).await?;
    patch.apply(&mut program)?;
    program.write(path).await?;

    ProgramPatched {
        path: &path.display().to_string(),
        cor_flags: patch.cor_flags,
        alias: &patch.alias,
    }
    .log();
    Ok(())
}
