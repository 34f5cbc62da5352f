// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! PE/COFF and CLI header facts
//!
//! The image is opened with `dotscope::File`, which parses the PE layer only.
//! From it the engine takes the COFF machine type, the DLL characteristic,
//! the presence of a debug directory and the flags recorded in the CLI
//! (COR20) header. The metadata tables are left to the disassembler.

use dotscope::metadata::cor20header::Cor20Header;
use dotscope::DataDirectoryType;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// `IMAGE_FILE_DLL` COFF characteristic.
pub const IMAGE_FILE_DLL: u16 = 0x2000;
/// `COMIMAGE_FLAGS_ILONLY` CLI header flag.
pub const COMIMAGE_FLAGS_ILONLY: u32 = 0x0000_0001;
/// `COMIMAGE_FLAGS_32BITREQUIRED` CLI header flag.
pub const COMIMAGE_FLAGS_32BITREQUIRED: u32 = 0x0000_0002;

/// Errors raised while reading an image header.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The PE layer could not be parsed.
    #[error("Unreadable PE image: {0}")]
    Header(#[from] dotscope::Error),

    /// The image has no CLI header, so it is not a managed module.
    #[error("Image has no CLI header (not a managed module)")]
    NotManaged,

    /// File I/O error while reading the image.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// COFF machine type recorded in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    /// `IMAGE_FILE_MACHINE_I386`
    I386,
    /// `IMAGE_FILE_MACHINE_AMD64`
    Amd64,
    /// `IMAGE_FILE_MACHINE_ARM64`
    Arm64,
    /// `IMAGE_FILE_MACHINE_ARMNT`
    ArmNt,
    /// Anything else, kept raw for diagnostics
    Other(u16),
}

impl Machine {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0x014c => Machine::I386,
            0x8664 => Machine::Amd64,
            0xaa64 => Machine::Arm64,
            0x01c4 => Machine::ArmNt,
            other => Machine::Other(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            Machine::I386 => 0x014c,
            Machine::Amd64 => 0x8664,
            Machine::Arm64 => 0xaa64,
            Machine::ArmNt => 0x01c4,
            Machine::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Machine::I386 => write!(f, "I386"),
            Machine::Amd64 => write!(f, "AMD64"),
            Machine::Arm64 => write!(f, "ARM64"),
            Machine::ArmNt => write!(f, "ARMNT"),
            Machine::Other(raw) => write!(f, "0x{:04X}", raw),
        }
    }
}

/// Header facts about a managed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub machine: Machine,
    /// Flags word of the CLI header (`COMIMAGE_FLAGS_*`)
    pub cli_flags: u32,
    pub is_dll: bool,
    /// True when the image has a debug directory
    pub has_debug_info: bool,
}

impl ImageInfo {
    /// Returns true if the CLI header demands a 32-bit process
    #[inline]
    pub fn requires_32bit(&self) -> bool {
        self.cli_flags & COMIMAGE_FLAGS_32BITREQUIRED != 0
    }
}

/// Reads the header facts of a managed PE image held in memory.
///
/// # Errors
/// Returns an error if:
/// - The bytes are not a PE image, or a header is truncated
/// - The image has no CLI header
pub fn read_image_info(bytes: &[u8]) -> Result<ImageInfo, ImageError> {
    let file = dotscope::File::from_mem(bytes.to_vec())?;

    let Some(clr) = file.pe().get_clr_runtime_header() else {
        return Err(ImageError::NotManaged);
    };
    let clr_offset = file.rva_to_offset(clr.virtual_address as usize)?;
    let cor20 = Cor20Header::read(file.data().get(clr_offset..).unwrap_or_default())?;

    let header = file.header();
    let has_debug_info = file
        .pe()
        .get_data_directory(DataDirectoryType::Debug)
        .is_some_and(|debug| debug.size != 0);

    Ok(ImageInfo {
        machine: Machine::from_raw(header.machine),
        cli_flags: cor20.flags,
        is_dll: header.characteristics & IMAGE_FILE_DLL != 0,
        has_debug_info,
    })
}

/// Reads the header facts of a managed PE image on disk.
pub async fn load_image_info<P: AsRef<Path>>(path: P) -> Result<ImageInfo, ImageError> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    read_image_info(&bytes)
}

/// Options for [`build_test_image`].
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct TestImage {
    pub machine: Machine,
    pub cli_flags: u32,
    pub dll: bool,
    pub debug: bool,
    pub pe32_plus: bool,
}

#[cfg(test)]
impl TestImage {
    pub fn x64() -> Self {
        Self {
            machine: Machine::Amd64,
            cli_flags: COMIMAGE_FLAGS_ILONLY,
            dll: true,
            debug: false,
            pe32_plus: true,
        }
    }

    pub fn x86() -> Self {
        Self {
            machine: Machine::I386,
            cli_flags: COMIMAGE_FLAGS_ILONLY | COMIMAGE_FLAGS_32BITREQUIRED,
            dll: true,
            debug: false,
            pe32_plus: false,
        }
    }

    pub fn any_cpu() -> Self {
        Self {
            cli_flags: COMIMAGE_FLAGS_ILONLY,
            ..Self::x86()
        }
    }
}

#[cfg(test)]
const TEST_DIRECTORY_DEBUG: usize = 6;
#[cfg(test)]
const TEST_DIRECTORY_CLR: usize = 14;

/// Offset of the CLR data directory entry in a [`build_test_image`] image.
#[cfg(test)]
pub(crate) fn test_clr_directory_offset(options: TestImage) -> usize {
    let directories = if options.pe32_plus { 112 } else { 96 };
    0x84 + 20 + directories + TEST_DIRECTORY_CLR * 8
}

/// Builds a minimal managed image: one `.text` section holding the CLI
/// header, an empty debug directory when asked for, and a metadata range.
#[cfg(test)]
pub(crate) fn build_test_image(options: TestImage) -> Vec<u8> {
    fn put_u16(buf: &mut [u8], at: usize, value: u16) {
        buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }
    fn put_u32(buf: &mut [u8], at: usize, value: u32) {
        buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    let mut image = vec![0u8; 0x400];
    image[0..2].copy_from_slice(b"MZ");
    put_u32(&mut image, 0x3c, 0x80);
    image[0x80..0x84].copy_from_slice(b"PE\0\0");

    let coff = 0x84;
    let optional = coff + 20;
    let (magic, count_offset, directories_offset) = if options.pe32_plus {
        (0x20b_u16, 108, 112)
    } else {
        (0x10b_u16, 92, 96)
    };
    let optional_size = directories_offset + 16 * 8;
    put_u16(&mut image, coff, options.machine.raw());
    put_u16(&mut image, coff + 2, 1);
    put_u16(&mut image, coff + 16, optional_size as u16);
    let characteristics = 0x0002 | if options.dll { IMAGE_FILE_DLL } else { 0 };
    put_u16(&mut image, coff + 18, characteristics);

    put_u16(&mut image, optional, magic);
    // Section and file alignment, image and header sizes
    put_u32(&mut image, optional + 32, 0x2000);
    put_u32(&mut image, optional + 36, 0x200);
    put_u32(&mut image, optional + 56, 0x4000);
    put_u32(&mut image, optional + 60, 0x200);
    put_u32(&mut image, optional + count_offset, 16);
    let directories = optional + directories_offset;
    put_u32(&mut image, directories + TEST_DIRECTORY_CLR * 8, 0x2000);
    put_u32(&mut image, directories + TEST_DIRECTORY_CLR * 8 + 4, 72);
    if options.debug {
        put_u32(&mut image, directories + TEST_DIRECTORY_DEBUG * 8, 0x2048);
        put_u32(&mut image, directories + TEST_DIRECTORY_DEBUG * 8 + 4, 28);
    }

    let section = optional + optional_size;
    image[section..section + 5].copy_from_slice(b".text");
    put_u32(&mut image, section + 8, 0x200);
    put_u32(&mut image, section + 12, 0x2000);
    put_u32(&mut image, section + 16, 0x200);
    put_u32(&mut image, section + 20, 0x200);
    put_u32(&mut image, section + 36, 0x6000_0020);

    let cli = 0x200;
    put_u32(&mut image, cli, 72);
    put_u16(&mut image, cli + 4, 2);
    put_u16(&mut image, cli + 6, 5);
    put_u32(&mut image, cli + 8, 0x2080);
    put_u32(&mut image, cli + 12, 0x20);
    put_u32(&mut image, cli + 16, options.cli_flags);

    // Metadata root signature, so the range is not blank
    image[0x280..0x284].copy_from_slice(&0x424A_5342_u32.to_le_bytes());

    image
}
