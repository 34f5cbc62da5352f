// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Simple name of the marker attribute, matched by name regardless of its assembly version
pub const MARKER_ATTRIBUTE_NAME: &str = "ArmaDllExportAttribute";
/// Assembly defining the marker attribute; the reference is dropped after injection
pub const MARKER_ASSEMBLY_NAME: &str = "Maca134.Arma.DllExport";

pub const DEFAULT_WRAPPER_NAMESPACE: &str = "Maca134.Arma.DllExport";
pub const DEFAULT_WRAPPER_TYPE: &str = "DllExportWrapper";
/// The entry point name the host looks up
pub const DEFAULT_WRAPPER_METHOD: &str = "RVExtension";

pub const DEFAULT_ASSEMBLER: &str = "ilasm.exe";
pub const DEFAULT_DISASSEMBLER: &str = "ildasm.exe";
pub const ASSEMBLER_DIR_ENV: &str = "ARMA_DLLEXPORT_ILASM_DIR";
pub const DISASSEMBLER_DIR_ENV: &str = "ARMA_DLLEXPORT_ILDASM_DIR";

/// Stack bytes of the wrapper's three 4-byte arguments, used in the x86 stdcall decoration
pub const WRAPPER_ARGUMENT_BYTES: u32 = 12;
/// Core libraries framework types can be resolved against, in order of preference
pub const CORE_LIBRARIES: &[&str] = &["mscorlib", "netstandard", "System.Runtime"];
/// Vtable fixup slot and export ordinal of the wrapper
pub const EXPORT_SLOT: u32 = 1;
