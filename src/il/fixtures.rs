// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Disassembly text builders for tests, laid out the way the disassembler prints.

pub(crate) const MARKER_CUSTOM: &str = "    .custom instance void ['Maca134.Arma.DllExport']'Maca134.Arma.DllExport'.'ArmaDllExportAttribute'::.ctor() = ( 01 00 00 00 ) ";

/// Builder for a complete module listing.
pub(crate) struct IlFixture {
    references: Vec<String>,
    corflags: u32,
    classes: Vec<(String, Vec<String>)>,
}

impl IlFixture {
    pub(crate) fn new() -> Self {
        Self {
            references: vec!["mscorlib".to_string()],
            corflags: 0x0000_0001,
            classes: Vec::new(),
        }
    }

    /// Replaces the `.assembly extern` list.
    pub(crate) fn references(mut self, names: &[&str]) -> Self {
        self.references = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub(crate) fn with_marker_reference(mut self) -> Self {
        self.references.push("Maca134.Arma.DllExport".to_string());
        self
    }

    pub(crate) fn corflags(mut self, flags: u32) -> Self {
        self.corflags = flags;
        self
    }

    pub(crate) fn class<S: AsRef<str>>(mut self, header: &str, members: &[S]) -> Self {
        self.classes.push((
            header.to_string(),
            members.iter().map(|m| m.as_ref().to_string()).collect(),
        ));
        self
    }

    pub(crate) fn build(&self) -> String {
        let mut lines = vec![
            "//  Microsoft (R) .NET Framework IL Disassembler.  Version 4.8.3928.0".to_string(),
            "//  Copyright (c) Microsoft Corporation.  All rights reserved.".to_string(),
            String::new(),
            String::new(),
            String::new(),
            "// Metadata version: v4.0.30319".to_string(),
        ];
        for name in &self.references {
            lines.push(format!(".assembly extern '{}'", name));
            lines.push("{".to_string());
            if name == "mscorlib" {
                lines.push(
                    "  .publickeytoken = (B7 7A 5C 56 19 34 E0 89 )                         // .z\\V.4.."
                        .to_string(),
                );
                lines.push("  .ver 4:0:0:0".to_string());
            } else {
                lines.push("  .ver 1:0:0:0".to_string());
            }
            lines.push("}".to_string());
        }
        lines.extend(
            [
                ".assembly 'MyExtension'",
                "{",
                "  .custom instance void ['mscorlib']'System.Runtime.CompilerServices'.'CompilationRelaxationsAttribute'::.ctor(int32) = ( 01 00 08 00 00 00 00 00 ) ",
                "  .hash algorithm 0x00008004",
                "  .ver 1:0:0:0",
                "}",
                ".module 'MyExtension.dll'",
                "// MVID: {0C5C1F6B-6A4B-4F0C-9B53-3C6E1B0E3B8D}",
                ".imagebase 0x10000000",
                ".file alignment 0x00000200",
                ".stackreserve 0x00100000",
                ".subsystem 0x0003       // WINDOWS_CUI",
            ]
            .iter()
            .map(|l| l.to_string()),
        );
        lines.push(format!(".corflags 0x{:08x}    //  ILONLY", self.corflags));
        lines.push("// Image base: 0x00F80000".to_string());
        lines.push(String::new());
        lines.push(String::new());
        lines.push("// =============== CLASS MEMBERS DECLARATION ===================".to_string());
        lines.push(String::new());
        for (header, members) in &self.classes {
            lines.push(header.clone());
            lines.push("       extends ['mscorlib']'System'.'Object'".to_string());
            lines.push("{".to_string());
            lines.extend(members.iter().cloned());
            lines.push("} // end of class".to_string());
            lines.push(String::new());
        }
        lines.push(String::new());
        lines.push("// =============================================================".to_string());
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// A method with a trivial body; `declaration` is everything between `.method` and `cil managed`.
pub(crate) fn method(declaration: &str, marked: bool) -> Vec<String> {
    let mut lines = vec![
        format!("  .method {} cil managed", declaration),
        "  {".to_string(),
    ];
    if marked {
        lines.push(MARKER_CUSTOM.to_string());
    }
    lines.extend(
        [
            "    // Code size       2 (0x2)",
            "    .maxstack  8",
            "    IL_0000:  ldnull",
            "    IL_0001:  ret",
            "  } // end of method",
            "",
        ]
        .iter()
        .map(|l| l.to_string()),
    );
    lines
}

/// A marked handler with the expected shape.
pub(crate) fn handler(name: &str) -> Vec<String> {
    method(
        &format!(
            "public hidebysig static string '{}'(string 'input', int32 'maxSize')",
            name
        ),
        true,
    )
}

pub(crate) fn class_header(namespace: &str, name: &str) -> String {
    format!(
        ".class public auto ansi beforefieldinit '{}'.'{}'",
        namespace, name
    )
}

/// The usual extension: one marked handler plus a constructor.
pub(crate) fn extension_module() -> String {
    IlFixture::new()
        .with_marker_reference()
        .class(
            &class_header("MyExtension", "Entry"),
            &[
                "  .method public hidebysig static string ",
                "          'Invoke'(string 'input',",
                "                   int32 'maxSize') cil managed",
                "  {",
                MARKER_CUSTOM,
                "    // Code size       7 (0x7)",
                "    .maxstack  8",
                "    IL_0000:  nop",
                "    IL_0001:  ldstr      \"{0}\"",
                "    IL_0006:  ret",
                "  } // end of method Entry::Invoke",
                "",
                "  .method public hidebysig specialname rtspecialname ",
                "          instance void  .ctor() cil managed",
                "  {",
                "    // Code size       8 (0x8)",
                "    .maxstack  8",
                "    IL_0000:  ldarg.0",
                "    IL_0001:  call       instance void ['mscorlib']'System'.'Object'::.ctor()",
                "    IL_0006:  nop",
                "    IL_0007:  ret",
                "  } // end of method Entry::.ctor",
                "",
            ],
        )
        .build()
}
