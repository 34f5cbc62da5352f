// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wrapper synthesis.
//!
//! The host calls `void RVExtension(char* output, int outputSize, const char* function)`
//! with stdcall. The synthesized method has exactly that shape and forwards to
//! the candidate:
//!
//! ```text
//! output.Append(Candidate(function, outputSize));
//! ```
//!
//! Output capacity is passed through but never enforced here; truncation is the
//! candidate's business.

use crate::config::WrapperSpec;
use crate::engine::candidate::ExportCandidate;
use crate::il::syntax::{quote, quote_type_name};
use crate::il::{
    BodyItem, Instruction, Member, MethodAccess, MethodBody, MethodDef, ParamDef, TypeDef,
};

const STRING_BUILDER_NAMESPACE: &str = "System.Text";
const STRING_BUILDER: &str = "StringBuilder";

fn framework_type(core_library: &str, namespace: &str, name: &str) -> String {
    format!(
        "[{}]{}",
        quote(core_library),
        quote_type_name(namespace, name)
    )
}

/// Builds the wrapper class for `candidate`, resolving framework types against
/// `core_library`.
pub fn synthesize_wrapper(
    spec: &WrapperSpec,
    candidate: &ExportCandidate,
    core_library: &str,
) -> TypeDef {
    let object = framework_type(core_library, "System", "Object");
    let header = vec![
        format!(".class public auto ansi sealed {}", spec.quoted_type_name()),
        format!("       extends {}", object),
    ];

    TypeDef {
        namespace: spec.namespace.clone(),
        name: spec.type_name.clone(),
        is_public: true,
        is_sealed: true,
        header,
        open: "{".to_string(),
        members: vec![
            Member::Method(wrapper_method(spec, candidate, core_library)),
            Member::Line(String::new()),
        ],
        close: format!("}} // end of class {}", spec.full_type_name()),
    }
}

fn wrapper_method(spec: &WrapperSpec, candidate: &ExportCandidate, core_library: &str) -> MethodDef {
    let string_builder = framework_type(core_library, STRING_BUILDER_NAMESPACE, STRING_BUILDER);
    let stdcall = framework_type(
        core_library,
        "System.Runtime.CompilerServices",
        "CallConvStdcall",
    );

    let name = quote(&spec.method_name);
    let indent = " ".repeat(10 + name.len() + 1);
    let header = vec![
        format!(
            "  .method public hidebysig static void modopt({}) ",
            stdcall
        ),
        format!("          {}(class {} 'output',", name, string_builder),
        format!("{}int32 'outputSize',", indent),
        format!("{}string  marshal( lpstr) 'input') cil managed", indent),
    ];

    let target = format!(
        "string {}::{}(string, int32)",
        quote_type_name(&candidate.type_namespace, &candidate.type_name),
        quote(&candidate.method_name)
    );
    let append = format!(
        "instance class {sb} {sb}::'Append'(string)",
        sb = string_builder
    );
    let body = MethodBody {
        max_stack: 8,
        instructions: vec![
            Instruction::Nop,
            Instruction::Ldarg(0),
            Instruction::Ldarg(2),
            Instruction::Ldarg(1),
            Instruction::Call(target),
            Instruction::Callvirt(append),
            Instruction::Pop,
            Instruction::Ret,
        ],
    };

    MethodDef {
        name: spec.method_name.clone(),
        access: MethodAccess::Public,
        is_static: true,
        return_type: "void".to_string(),
        params: vec![
            ParamDef {
                type_name: format!("{}.{}", STRING_BUILDER_NAMESPACE, STRING_BUILDER),
                name: Some("output".to_string()),
            },
            ParamDef {
                type_name: "int32".to_string(),
                name: Some("outputSize".to_string()),
            },
            ParamDef {
                type_name: "string".to_string(),
                name: Some("input".to_string()),
            },
        ],
        header,
        open: "  {".to_string(),
        body: body.render("    ").into_iter().map(BodyItem::Line).collect(),
        close: format!(
            "  }} // end of method {}::{}",
            spec.type_name, spec.method_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::il::{parse_module, IlProgram, LineEnding, Module};
    use crate::il::{Item, MethodLocation};

    fn candidate() -> ExportCandidate {
        ExportCandidate {
            location: MethodLocation {
                type_index: 0,
                method_index: 0,
            },
            type_namespace: "MyExtension".to_string(),
            type_name: "Entry".to_string(),
            method_name: "Handler".to_string(),
            type_is_public: true,
            is_public: true,
            is_static: true,
            return_type: "string".to_string(),
            parameter_types: vec!["string".to_string(), "int32".to_string()],
        }
    }

    fn rendered(ty: TypeDef) -> Vec<String> {
        Module {
            items: vec![Item::Type(ty)],
        }
        .render(LineEnding::Lf)
        .lines()
        .to_vec()
    }

    #[test]
    fn test_wrapper_layout() {
        let lines = rendered(synthesize_wrapper(
            &WrapperSpec::default(),
            &candidate(),
            "mscorlib",
        ));

        assert_eq!(
            lines[0],
            ".class public auto ansi sealed 'Maca134.Arma.DllExport'.'DllExportWrapper'"
        );
        assert_eq!(lines[1], "       extends ['mscorlib']'System'.'Object'");
        assert!(lines.contains(&"  .method public hidebysig static void modopt(['mscorlib']'System.Runtime.CompilerServices'.'CallConvStdcall') ".to_string()));
        assert!(lines.contains(
            &"          'RVExtension'(class ['mscorlib']'System.Text'.'StringBuilder' 'output',"
                .to_string()
        ));
        assert!(lines.contains(&"    // Code size       16 (0x10)".to_string()));
        assert!(lines.contains(
            &"    IL_0004:  call       string 'MyExtension'.'Entry'::'Handler'(string, int32)"
                .to_string()
        ));
        assert!(lines.contains(&"    IL_000f:  ret".to_string()));
    }

    #[test]
    fn test_wrapper_reparses_with_expected_signature() {
        let mut module = parse_module(&IlProgram::from_text(
            &crate::il::fixtures::extension_module(),
        ))
        .unwrap();
        module.add_type(synthesize_wrapper(
            &WrapperSpec::default(),
            &candidate(),
            "netstandard",
        ));

        let reparsed = parse_module(&module.render(LineEnding::Lf)).unwrap();
        let wrapper = reparsed
            .find_type("Maca134.Arma.DllExport", "DllExportWrapper")
            .unwrap();
        let method = wrapper.methods().next().unwrap();

        assert!(wrapper.is_public && wrapper.is_sealed);
        assert_eq!(method.name, "RVExtension");
        assert!(method.is_public() && method.is_static);
        assert_eq!(method.return_type, "void");
        let params: Vec<&str> = method.params.iter().map(|p| p.type_name.as_str()).collect();
        assert_eq!(params, vec!["System.Text.StringBuilder", "int32", "string"]);
        assert_eq!(reparsed, module);
    }

    #[test]
    fn test_custom_names_and_global_namespace_candidate() {
        let spec = WrapperSpec {
            namespace: "Custom.Bridge".to_string(),
            type_name: "Exports".to_string(),
            method_name: "Call".to_string(),
            keep_il: false,
        };
        let global = ExportCandidate {
            type_namespace: String::new(),
            type_name: "Plugin".to_string(),
            ..candidate()
        };

        let lines = rendered(synthesize_wrapper(&spec, &global, "System.Runtime"));
        assert_eq!(lines[0], ".class public auto ansi sealed 'Custom.Bridge'.'Exports'");
        assert!(lines
            .iter()
            .any(|l| l.ends_with("call       string 'Plugin'::'Handler'(string, int32)")));
        assert!(lines
            .iter()
            .any(|l| l.contains("['System.Runtime']'System.Text'.'StringBuilder'::'Append'(string)")));
        assert_eq!(lines.last().unwrap(), "} // end of class Custom.Bridge.Exports");
    }
}
