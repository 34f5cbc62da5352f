// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The single fatal error type surfaced by the export engine.
//!
//! Every failure that stops a run ends up as an [`ExportError`]. The variants
//! fall into four groups:
//!
//! * **Configuration** - unsupported platform, non-DLL module, missing tool paths
//! * **Candidate shape** - ambiguous or malformed export method
//! * **Tooling** - the disassembler or assembler is missing or fails
//! * **I/O** - reading the module or writing intermediates
//!
//! Cleanup failures never become an `ExportError`; they are logged and dropped.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::il::IlError;
use crate::image::{ImageError, Machine};

/// Reasons an export candidate's shape is rejected.
///
/// The checks run in declaration order and the first failure wins, so each
/// variant identifies exactly one problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The method does not return `string`.
    #[error("The method must return a string (found '{found}')")]
    ReturnType { found: String },

    /// The parameter list is not exactly `(string, int32)`.
    #[error("The method must have the signature: Method(string, int) (found ({found}))")]
    Parameters { found: String },

    /// The declaring type is not publicly visible.
    #[error("The class where the export method resides must be public ('{type_name}' is not)")]
    DeclaringTypeNotPublic { type_name: String },

    /// The method is an instance method.
    #[error("The export method must be static")]
    NotStatic,

    /// The method is not public.
    #[error("The export method must be public")]
    NotPublic,
}

/// Fatal failure of an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The target file is not a readable managed PE image.
    #[error("Invalid module image: {0}")]
    Image(#[from] ImageError),

    /// The disassembly could not be parsed into a module model.
    #[error("Malformed disassembly: {0}")]
    Il(#[from] IlError),

    /// Only DLL modules can carry the export table the host expects.
    #[error("Only DLL modules are supported: {} is not a DLL", .0.display())]
    NotADll(PathBuf),

    /// The module targets AnyCPU (or an architecture other than x86/x64).
    #[error("AnyCpu modules are not supported (machine {machine}, cli flags 0x{cli_flags:08X}): build the module for x86 or x64")]
    UnsupportedPlatform { machine: Machine, cli_flags: u32 },

    /// More than one method carries the marker attribute.
    #[error("You can only have 1 method with the attribute {attribute}, found {}: {}", .methods.len(), .methods.join(", "))]
    AmbiguousCandidates {
        attribute: &'static str,
        methods: Vec<String>,
    },

    /// The marked method does not have the shape the wrapper requires.
    #[error("Invalid export method '{method}': {source}")]
    InvalidCandidate {
        method: String,
        #[source]
        source: SignatureError,
    },

    /// The configured wrapper type name is already taken in the module.
    #[error("Cannot inject wrapper: a type named '{0}' already exists in the module")]
    WrapperTypeExists(String),

    /// The module references no core library to resolve framework types against.
    #[error("The module does not reference a core library (mscorlib, netstandard or System.Runtime)")]
    MissingCoreLibrary,

    /// No directory is configured for a required tool.
    #[error("{tool} path is not configured, please set the {tool} directory in the toolchain configuration")]
    ToolNotConfigured { tool: &'static str },

    /// The tool executable does not exist where the configuration says it is.
    #[error("{tool} not found at {}, please check the toolchain configuration", .path.display())]
    ToolNotFound { tool: &'static str, path: PathBuf },

    /// The tool could not be started or exited unsuccessfully.
    #[error("{tool} failed ({status}){}", format_tool_output(.output))]
    ToolFailed {
        tool: &'static str,
        status: String,
        output: String,
    },

    /// The disassembly lacks a construct the export patch needs.
    #[error("Could not patch disassembly: {0}")]
    PatchTargetMissing(String),

    /// `export()` was invoked a second time on the same engine instance.
    #[error("You can only inject into a dll once per exporter instance")]
    AlreadyExported,

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

fn format_tool_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {}", output)
    }
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_candidates_names_every_method() {
        let error = ExportError::AmbiguousCandidates {
            attribute: "ArmaDllExportAttribute",
            methods: vec!["A.B::One".to_string(), "A.C::Two".to_string()],
        };

        let message = error.to_string();
        assert!(message.contains("found 2"));
        assert!(message.contains("A.B::One, A.C::Two"));
    }

    #[test]
    fn test_tool_failed_without_output() {
        let error = ExportError::ToolFailed {
            tool: "ilasm",
            status: "exit status: 1".to_string(),
            output: String::new(),
        };

        assert_eq!(error.to_string(), "ilasm failed (exit status: 1)");
    }

    #[test]
    fn test_signature_errors_are_distinct() {
        let reasons = [
            SignatureError::ReturnType {
                found: "void".to_string(),
            }
            .to_string(),
            SignatureError::Parameters {
                found: "string".to_string(),
            }
            .to_string(),
            SignatureError::DeclaringTypeNotPublic {
                type_name: "A.B".to_string(),
            }
            .to_string(),
            SignatureError::NotStatic.to_string(),
            SignatureError::NotPublic.to_string(),
        ];

        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
