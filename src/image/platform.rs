// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Target platform classification.
//!
//! The platform is derived once from the image's machine type and its
//! 32-bit-required flag. It then decides three things later in the run:
//!
//! * the `.corflags` value written into the patched disassembly
//! * whether the assembler is asked for a 64-bit image
//! * the decoration of the exported alias

use serde::Serialize;
use std::fmt;

use crate::config::consts::WRAPPER_ARGUMENT_BYTES;
use crate::image::pe::{ImageInfo, Machine};

/// Platform a module is compiled for, as far as native export is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    /// 32-bit x86 image with the 32-bit-required flag set
    X86,
    /// 64-bit x64 image
    X64,
    /// AnyCPU or a machine the host cannot load
    Unsupported,
}

impl TargetPlatform {
    /// Classifies a machine type and 32-bit-required flag.
    ///
    /// ```
    /// use arma_dllexport::image::{Machine, TargetPlatform};
    ///
    /// assert_eq!(TargetPlatform::classify(Machine::Amd64, false), TargetPlatform::X64);
    /// assert_eq!(TargetPlatform::classify(Machine::I386, true), TargetPlatform::X86);
    /// assert_eq!(TargetPlatform::classify(Machine::I386, false), TargetPlatform::Unsupported);
    /// ```
    pub fn classify(machine: Machine, requires_32bit: bool) -> Self {
        match (machine, requires_32bit) {
            (Machine::Amd64, _) => TargetPlatform::X64,
            (Machine::I386, true) => TargetPlatform::X86,
            _ => TargetPlatform::Unsupported,
        }
    }

    pub fn from_image(info: &ImageInfo) -> Self {
        Self::classify(info.machine, info.requires_32bit())
    }

    /// Value written to the `.corflags` directive of the patched program.
    ///
    /// The two platforms need opposite values of the 32-bit bit; this is the
    /// mapping the host loader was verified against.
    pub fn cor_flags(self) -> Option<u32> {
        match self {
            TargetPlatform::X86 => Some(0x0000_0002),
            TargetPlatform::X64 => Some(0x0000_0000),
            TargetPlatform::Unsupported => None,
        }
    }

    /// Name the wrapper is exported under.
    ///
    /// x86 uses the stdcall-decorated form `_Name@12`, x64 the bare name.
    pub fn export_alias(self, method_name: &str) -> Option<String> {
        match self {
            TargetPlatform::X86 => Some(format!("_{}@{}", method_name, WRAPPER_ARGUMENT_BYTES)),
            TargetPlatform::X64 => Some(method_name.to_string()),
            TargetPlatform::Unsupported => None,
        }
    }

    /// Returns true if the assembler must produce a 64-bit image
    #[inline]
    pub fn is_64bit(self) -> bool {
        matches!(self, Self::X64)
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetPlatform::X86 => write!(f, "x86"),
            TargetPlatform::X64 => write!(f, "x64"),
            TargetPlatform::Unsupported => write!(f, "AnyCPU"),
        }
    }
}
