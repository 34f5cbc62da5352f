// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Builds a [`Module`] from disassembly text.
//!
//! Only top-level `.class` and `.assembly extern` blocks are interpreted. Inside
//! a class, `.method` declarations at member level are parsed into
//! [`MethodDef`]s; nested types, properties, events and fields stay raw. Inside
//! a method, `.custom` attributes applied to the method itself are lifted out;
//! attributes following a `.param` directive belong to that parameter and stay
//! raw. Every input line lands in exactly one place, so rendering an untouched
//! module yields the original text.

use crate::il::error::IlError;
use crate::il::model::{
    AssemblyRef, BodyItem, CustomAttribute, Item, Member, MethodAccess, MethodDef, Module,
    ParamDef, TypeDef,
};
use crate::il::program::IlProgram;
use crate::il::syntax::{
    brace_balance, canonical_type, is_directive, name_segments, paren_balance, split_call,
    split_top_level, split_type_name, strip_comment, strip_generic_suffix, strip_scope, tokens,
};

/// Method flag and calling convention keywords that precede the return type.
const METHOD_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "family",
    "assembly",
    "famandassem",
    "famorassem",
    "privatescope",
    "compilercontrolled",
    "hidebysig",
    "static",
    "instance",
    "explicit",
    "default",
    "vararg",
    "virtual",
    "final",
    "newslot",
    "strict",
    "abstract",
    "specialname",
    "rtspecialname",
    "reqsecobj",
    "unmanaged",
    "cdecl",
    "stdcall",
    "thiscall",
    "fastcall",
];

/// Parses a disassembled program into a structured module.
pub fn parse_module(program: &IlProgram) -> Result<Module, IlError> {
    Parser::new(program.lines()).parse()
}

struct Parser<'a> {
    lines: &'a [String],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(lines: &'a [String]) -> Self {
        Self { lines, position: 0 }
    }

    fn parse(mut self) -> Result<Module, IlError> {
        let mut items = Vec::new();
        let mut depth = 0;
        while self.position < self.lines.len() {
            let line = &self.lines[self.position];
            let code = strip_comment(line).trim();

            if depth == 0 && is_directive(code, ".assembly") && second_token(code) == Some("extern") {
                items.push(Item::AssemblyRef(self.parse_assembly_ref()?));
                continue;
            }
            if depth == 0 && is_directive(code, ".class") && second_token(code) != Some("extern") {
                items.push(Item::Type(self.parse_type()?));
                continue;
            }

            depth += brace_balance(line);
            if depth < 0 {
                return Err(IlError::UnbalancedBrace {
                    line: self.position + 1,
                });
            }
            items.push(Item::Line(line.clone()));
            self.position += 1;
        }
        Ok(Module { items })
    }

    fn parse_assembly_ref(&mut self) -> Result<AssemblyRef, IlError> {
        let start = self.position;
        let header = strip_comment(&self.lines[start]).trim();
        let parts = tokens(header);
        let name_token = match parts.iter().position(|t| *t == "as") {
            Some(alias) if alias > 0 => parts[alias - 1],
            _ => parts.last().copied().unwrap_or_default(),
        };
        let name = name_segments(name_token).join(".");
        if name.is_empty() || name_token == "extern" {
            return Err(IlError::MalformedHeader {
                line: start + 1,
                reason: "assembly reference without a name".to_string(),
            });
        }

        let end = self.block_end(start, "assembly reference")?;
        self.position = end;
        Ok(AssemblyRef {
            name,
            lines: self.lines[start..end].to_vec(),
        })
    }

    /// Returns the index one past the line closing the block that starts at `start`.
    fn block_end(&self, start: usize, kind: &'static str) -> Result<usize, IlError> {
        let mut depth = 0;
        let mut opened = false;
        for (offset, line) in self.lines[start..].iter().enumerate() {
            depth += brace_balance(line);
            if depth > 0 {
                opened = true;
            }
            if opened && depth <= 0 {
                return Ok(start + offset + 1);
            }
        }
        Err(IlError::UnterminatedBlock {
            kind,
            line: start + 1,
        })
    }

    /// Collects declaration lines up to and including the opening brace.
    fn header(&mut self, kind: &'static str) -> Result<(Vec<String>, String), IlError> {
        let start = self.position;
        let mut header = Vec::new();
        while self.position < self.lines.len() {
            let line = &self.lines[self.position];
            self.position += 1;
            if strip_comment(line).trim_start().starts_with('{') {
                return Ok((header, line.clone()));
            }
            header.push(line.clone());
        }
        Err(IlError::UnterminatedBlock {
            kind,
            line: start + 1,
        })
    }

    fn parse_type(&mut self) -> Result<TypeDef, IlError> {
        let start = self.position;
        let (header, open) = self.header("class")?;

        let declaration = join_code(&header);
        let parts = tokens(&declaration);
        let end = parts
            .iter()
            .position(|t| *t == "extends" || *t == "implements")
            .unwrap_or(parts.len());
        let flags = parts.get(1..end).unwrap_or_default();
        let (name_token, flags) = flags.split_last().ok_or_else(|| IlError::MalformedHeader {
            line: start + 1,
            reason: "class declaration without a name".to_string(),
        })?;
        let (namespace, name) = split_type_name(strip_generic_suffix(name_token));

        let mut members = Vec::new();
        let mut depth = brace_balance(&open);
        loop {
            let Some(line) = self.lines.get(self.position) else {
                return Err(IlError::UnterminatedBlock {
                    kind: "class",
                    line: start + 1,
                });
            };
            let code = strip_comment(line).trim();
            if depth == 1 && is_directive(code, ".method") {
                members.push(Member::Method(self.parse_method()?));
                continue;
            }

            depth += brace_balance(line);
            self.position += 1;
            if depth <= 0 {
                return Ok(TypeDef {
                    namespace,
                    name,
                    is_public: flags.contains(&"public"),
                    is_sealed: flags.contains(&"sealed"),
                    header,
                    open,
                    members,
                    close: line.clone(),
                });
            }
            members.push(Member::Line(line.clone()));
        }
    }

    fn parse_method(&mut self) -> Result<MethodDef, IlError> {
        let start = self.position;
        let (header, open) = self.header("method")?;
        let signature = parse_method_signature(&join_code(&header), start + 1)?;

        let mut body = Vec::new();
        let mut depth = brace_balance(&open);
        let mut in_param_section = false;
        loop {
            let Some(line) = self.lines.get(self.position) else {
                return Err(IlError::UnterminatedBlock {
                    kind: "method",
                    line: start + 1,
                });
            };
            let code = strip_comment(line).trim();

            if depth == 1 && is_directive(code, ".custom") {
                let lines = self.custom_lines()?;
                match (in_param_section, attribute_type(&lines)) {
                    (false, Some((namespace, type_name))) => {
                        body.push(BodyItem::Attribute(CustomAttribute {
                            type_name,
                            namespace,
                            lines,
                        }))
                    }
                    _ => body.extend(lines.into_iter().map(BodyItem::Line)),
                }
                continue;
            }
            if !code.is_empty() {
                in_param_section = depth == 1 && is_directive(code, ".param");
            }

            depth += brace_balance(line);
            self.position += 1;
            if depth <= 0 {
                return Ok(MethodDef {
                    name: signature.name,
                    access: signature.access,
                    is_static: signature.is_static,
                    return_type: signature.return_type,
                    params: signature.params,
                    header,
                    open,
                    body,
                    close: line.clone(),
                });
            }
            body.push(BodyItem::Line(line.clone()));
        }
    }

    /// Collects a `.custom` directive whose blob may span several lines.
    fn custom_lines(&mut self) -> Result<Vec<String>, IlError> {
        let start = self.position;
        let mut balance = 0;
        let mut lines = Vec::new();
        while let Some(line) = self.lines.get(self.position) {
            balance += paren_balance(line);
            lines.push(line.clone());
            self.position += 1;
            if balance <= 0 {
                return Ok(lines);
            }
        }
        Err(IlError::UnterminatedBlock {
            kind: "custom attribute",
            line: start + 1,
        })
    }
}

struct MethodSignature {
    name: String,
    access: MethodAccess,
    is_static: bool,
    return_type: String,
    params: Vec<ParamDef>,
}

fn parse_method_signature(declaration: &str, line: usize) -> Result<MethodSignature, IlError> {
    let malformed = |reason: &str| IlError::MalformedHeader {
        line,
        reason: reason.to_string(),
    };

    let parts = tokens(declaration);
    let name_index = parts
        .iter()
        .rposition(|t| split_call(t).is_some() && !is_modifier_group(t))
        .ok_or_else(|| malformed("method declaration without a parameter list"))?;
    let (callee, params_text) =
        split_call(parts[name_index]).ok_or_else(|| malformed("unreadable parameter list"))?;
    let name = name_segments(strip_generic_suffix(callee)).join(".");
    if name.is_empty() {
        return Err(malformed("method declaration without a name"));
    }

    let prefix = parts.get(1..name_index).unwrap_or_default();
    let return_start = prefix
        .iter()
        .position(|t| !METHOD_KEYWORDS.contains(t) && !t.starts_with("pinvokeimpl("))
        .unwrap_or(prefix.len());
    let (flags, return_tokens) = prefix.split_at(return_start);
    if return_tokens.is_empty() {
        return Err(malformed("method declaration without a return type"));
    }

    Ok(MethodSignature {
        name,
        access: flags
            .iter()
            .find_map(|t| MethodAccess::from_keyword(t))
            .unwrap_or(MethodAccess::PrivateScope),
        is_static: flags.contains(&"static"),
        return_type: canonical_type(&return_tokens.join(" ")),
        params: parse_params(params_text),
    })
}

fn is_modifier_group(token: &str) -> bool {
    ["marshal(", "modopt(", "modreq(", "pinvokeimpl("]
        .iter()
        .any(|prefix| token.starts_with(prefix))
}

fn parse_params(text: &str) -> Vec<ParamDef> {
    split_top_level(text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "...")
        .map(parse_param)
        .collect()
}

fn parse_param(text: &str) -> ParamDef {
    let parts: Vec<&str> = tokens(text)
        .into_iter()
        .filter(|t| !matches!(*t, "[in]" | "[out]" | "[opt]"))
        .collect();

    match parts.as_slice() {
        [rest @ .., before, last] if is_parameter_name(before, last) => {
            let mut type_tokens = rest.to_vec();
            type_tokens.push(*before);
            ParamDef {
                type_name: canonical_type(&type_tokens.join(" ")),
                name: Some(name_segments(last).join(".")),
            }
        }
        _ => ParamDef {
            type_name: canonical_type(&parts.join(" ")),
            name: None,
        },
    }
}

fn is_parameter_name(before: &str, last: &str) -> bool {
    !is_modifier_group(last)
        && !matches!(before, "class" | "valuetype")
        && !last.starts_with('[')
        && !last.ends_with(']')
        && !last.ends_with('&')
        && !last.ends_with('*')
}

/// Extracts `(namespace, simple name)` of the attribute type from a `.custom` directive.
fn attribute_type(lines: &[String]) -> Option<(String, String)> {
    let first = strip_comment(lines.first()?);
    let constructor = first.find("::.ctor")?;
    let owner = *tokens(&first[..constructor]).last()?;
    let (namespace, name) = split_type_name(strip_scope(strip_generic_suffix(owner)));
    if name.is_empty() {
        None
    } else {
        Some((namespace, name))
    }
}

fn second_token(code: &str) -> Option<&str> {
    code.split_whitespace().nth(1)
}

fn join_code(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| strip_comment(l).trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::il::fixtures::{extension_module, IlFixture};
    use crate::il::program::LineEnding;

    #[test]
    fn test_round_trip_is_lossless() {
        let program = IlProgram::from_text(&extension_module());
        let module = parse_module(&program).unwrap();

        assert_eq!(module.render(LineEnding::Lf).to_text(), program.to_text());
    }

    #[test]
    fn test_parses_types_and_methods() {
        let program = IlProgram::from_text(&extension_module());
        let module = parse_module(&program).unwrap();

        let ty = module.find_type("MyExtension", "Entry").unwrap();
        assert!(ty.is_public);
        assert!(!ty.is_sealed);

        let names: Vec<&str> = ty.methods().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Invoke", ".ctor"]);

        let invoke = ty.methods().next().unwrap();
        assert_eq!(invoke.access, MethodAccess::Public);
        assert!(invoke.is_static);
        assert_eq!(invoke.return_type, "string");
        assert_eq!(
            invoke.params,
            vec![
                ParamDef {
                    type_name: "string".to_string(),
                    name: Some("input".to_string())
                },
                ParamDef {
                    type_name: "int32".to_string(),
                    name: Some("maxSize".to_string())
                },
            ]
        );
        assert!(invoke.has_attribute("ArmaDllExportAttribute"));

        let ctor = ty.methods().nth(1).unwrap();
        assert!(!ctor.is_static);
        assert_eq!(ctor.return_type, "void");
        assert!(ctor.params.is_empty());
    }

    #[test]
    fn test_parses_assembly_refs() {
        let program = IlProgram::from_text(&extension_module());
        let module = parse_module(&program).unwrap();

        let names: Vec<&str> = module.assembly_refs().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["mscorlib", "Maca134.Arma.DllExport"]);
        assert_eq!(module.core_library(), Some("mscorlib"));
    }

    #[test]
    fn test_attribute_on_parameter_is_not_lifted() {
        let text = IlFixture::new()
            .class(
                ".class public auto ansi 'A'.'B'",
                &[
                    "  .method public hidebysig static string 'Run'(string 'a') cil managed",
                    "  {",
                    "    .param [1]",
                    "    .custom instance void ['Maca134.Arma.DllExport']'Maca134.Arma.DllExport'.'ArmaDllExportAttribute'::.ctor() = ( 01 00 00 00 )",
                    "    .maxstack  8",
                    "    IL_0000:  ldarg.0",
                    "    IL_0001:  ret",
                    "  } // end of method B::Run",
                ],
            )
            .build();
        let module = parse_module(&IlProgram::from_text(&text)).unwrap();

        let method = module.find_type("A", "B").unwrap().methods().next().unwrap();
        assert!(!method.has_attribute("ArmaDllExportAttribute"));
    }

    #[test]
    fn test_multi_line_custom_attribute() {
        let text = IlFixture::new()
            .class(
                ".class public auto ansi 'A'.'B'",
                &[
                    "  .method public hidebysig static string 'Run'(string 'a', int32 'b') cil managed",
                    "  {",
                    "    .custom instance void ['Other']'Other'.'NoteAttribute'::.ctor(string) = ( 01 00 0B 4D 79 45 78 74 65 6E 73 69 6F 6E   // ...MyExtension",
                    "                                                                               00 00 )",
                    "    .custom instance void ['Maca134.Arma.DllExport']'Maca134.Arma.DllExport'.'ArmaDllExportAttribute'::.ctor() = ( 01 00 00 00 ) ",
                    "    IL_0000:  ret",
                    "  }",
                ],
            )
            .build();
        let module = parse_module(&IlProgram::from_text(&text)).unwrap();

        let method = module.find_type("A", "B").unwrap().methods().next().unwrap();
        let attributes: Vec<&CustomAttribute> = method.attributes().collect();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].type_name, "NoteAttribute");
        assert_eq!(attributes[0].namespace, "Other");
        assert_eq!(attributes[0].lines.len(), 2);
        assert_eq!(attributes[1].type_name, "ArmaDllExportAttribute");
        assert_eq!(attributes[1].namespace, "Maca134.Arma.DllExport");
    }

    #[test]
    fn test_nested_types_stay_raw() {
        let text = IlFixture::new()
            .class(
                ".class public auto ansi 'A'.'Outer'",
                &[
                    "  .class nested public auto ansi 'Inner'",
                    "         extends ['mscorlib']'System'.'Object'",
                    "  {",
                    "    .method public hidebysig static string 'Hidden'(string 'a', int32 'b') cil managed",
                    "    {",
                    "      IL_0000:  ret",
                    "    }",
                    "  }",
                ],
            )
            .build();
        let module = parse_module(&IlProgram::from_text(&text)).unwrap();

        let outer = module.find_type("A", "Outer").unwrap();
        assert_eq!(outer.methods().count(), 0);
        assert_eq!(module.types().count(), 1);
    }

    #[test]
    fn test_multi_line_method_header() {
        let text = IlFixture::new()
            .class(
                ".class public auto ansi sealed 'A'.'B'",
                &[
                    "  .method public hidebysig static void modopt(['mscorlib']'System.Runtime.CompilerServices'.'CallConvStdcall') ",
                    "          'RVExtension'(class ['mscorlib']'System.Text'.'StringBuilder' 'output',",
                    "                        int32 'outputSize',",
                    "                        string  marshal( lpstr) 'function') cil managed",
                    "  {",
                    "    IL_0000:  ret",
                    "  }",
                ],
            )
            .build();
        let module = parse_module(&IlProgram::from_text(&text)).unwrap();

        let ty = module.find_type("A", "B").unwrap();
        assert!(ty.is_sealed);
        let method = ty.methods().next().unwrap();
        assert_eq!(method.name, "RVExtension");
        assert_eq!(method.return_type, "void");
        let types: Vec<&str> = method.params.iter().map(|p| p.type_name.as_str()).collect();
        assert_eq!(types, vec!["System.Text.StringBuilder", "int32", "string"]);
        assert_eq!(method.params[2].name.as_deref(), Some("function"));
    }

    #[test]
    fn test_unnamed_parameters() {
        let params = parse_params("string, int32, class ['mscorlib']'System'.'Object'");
        let types: Vec<&str> = params.iter().map(|p| p.type_name.as_str()).collect();

        assert_eq!(types, vec!["string", "int32", "object"]);
        assert!(params.iter().all(|p| p.name.is_none()));
    }

    #[test]
    fn test_access_defaults_to_privatescope() {
        let signature = parse_method_signature(".method static string 'Run'()", 1).unwrap();

        assert_eq!(signature.access, MethodAccess::PrivateScope);
        assert!(signature.is_static);
    }

    #[test]
    fn test_unterminated_class() {
        let program = IlProgram::from_text(".class public 'A'.'B'\n{\n  .method public static void 'X'() cil managed\n  {\n");
        let result = parse_module(&program);

        assert!(matches!(
            result,
            Err(IlError::UnterminatedBlock { kind: "method", line: 3 })
        ));
    }

    #[test]
    fn test_unbalanced_brace() {
        let program = IlProgram::from_text(".module 'a.dll'\n}\n");

        assert_eq!(
            parse_module(&program),
            Err(IlError::UnbalancedBrace { line: 2 })
        );
    }

    #[test]
    fn test_class_extern_forwarder_stays_raw() {
        let program = IlProgram::from_text(
            ".class extern forwarder 'System'.'Thing'\n{\n  .assembly extern 'Other'\n}\n",
        );
        let module = parse_module(&program).unwrap();

        assert_eq!(module.types().count(), 0);
        assert_eq!(module.assembly_refs().count(), 0);
        assert_eq!(module.items.len(), 4);
    }
}
