// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Line-oriented textual program.
//!
//! An [`IlProgram`] is the disassembled module as an ordered list of lines. It
//! has no identity beyond one run: the disassembler produces it, the patcher
//! edits it in place and the assembler consumes it.
//!
//! The disassembler may write UTF-8 or UTF-16 (with a byte order mark); the
//! program is always written back as UTF-8 with a BOM, which the assembler
//! reads unambiguously. The original line ending style is preserved.

use std::path::Path;

use crate::errors::{ExportError, ExportResult};
use crate::il::IlError;

const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];
const UTF16LE_BOM: &[u8] = &[0xff, 0xfe];
const UTF16BE_BOM: &[u8] = &[0xfe, 0xff];

/// Line terminator used when writing the program back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// The disassembled module as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlProgram {
    lines: Vec<String>,
    line_ending: LineEnding,
}

impl IlProgram {
    pub fn from_text(text: &str) -> Self {
        let line_ending = if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        Self {
            lines: text.lines().map(str::to_string).collect(),
            line_ending,
        }
    }

    pub fn from_lines(lines: Vec<String>, line_ending: LineEnding) -> Self {
        Self { lines, line_ending }
    }

    /// Decodes raw disassembler output, honoring a UTF-8 or UTF-16 BOM.
    pub fn decode(bytes: &[u8]) -> Result<Self, IlError> {
        if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
            return Self::decode_utf8(rest);
        }
        if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
            return Self::decode_utf16(rest, u16::from_le_bytes);
        }
        if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
            return Self::decode_utf16(rest, u16::from_be_bytes);
        }
        Self::decode_utf8(bytes)
    }

    fn decode_utf8(bytes: &[u8]) -> Result<Self, IlError> {
        let text = std::str::from_utf8(bytes).map_err(|e| IlError::Encoding(e.to_string()))?;
        Ok(Self::from_text(text))
    }

    fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<Self, IlError> {
        if bytes.len() % 2 != 0 {
            return Err(IlError::Encoding("odd byte count in UTF-16 text".to_string()));
        }
        let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
        let text = String::from_utf16(&units).map_err(|e| IlError::Encoding(e.to_string()))?;
        Ok(Self::from_text(&text))
    }

    /// Encodes the program as UTF-8 with a byte order mark.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(self.to_text().as_bytes());
        bytes
    }

    pub fn to_text(&self) -> String {
        let ending = self.line_ending.as_str();
        let mut text = self.lines.join(ending);
        text.push_str(ending);
        text
    }

    pub async fn read<P: AsRef<Path>>(path: P) -> ExportResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExportError::io(path, e))?;
        Ok(Self::decode(&bytes)?)
    }

    pub async fn write<P: AsRef<Path>>(&self, path: P) -> ExportResult<()> {
        let path = path.as_ref();
        tokio::fs::write(path, self.encode())
            .await
            .map_err(|e| ExportError::io(path, e))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
