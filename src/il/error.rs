// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while decoding or parsing a disassembled program.
///
/// Line numbers are 1-based and refer to the disassembly text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IlError {
    /// The text is neither UTF-8 nor BOM-marked UTF-16.
    #[error("Unsupported text encoding: {0}")]
    Encoding(String),

    /// A block opened by a directive never closes.
    #[error("Unterminated {kind} block starting at line {line}")]
    UnterminatedBlock { kind: &'static str, line: usize },

    /// A closing brace appears with no open block.
    #[error("Unbalanced closing brace at line {line}")]
    UnbalancedBrace { line: usize },

    /// A declaration header could not be understood.
    #[error("Malformed declaration at line {line}: {reason}")]
    MalformedHeader { line: usize, reason: String },
}
