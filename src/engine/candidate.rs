// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Candidate resolution: finding the one method marked for export.
//!
//! The marker is matched by the attribute's simple type name. Its defining
//! assembly may be any version of `Maca134.Arma.DllExport` (or a local copy of
//! the attribute), so identity matching would reject valid modules.

use serde::Serialize;

use crate::config::consts::MARKER_ATTRIBUTE_NAME;
use crate::errors::{ExportError, ExportResult};
use crate::il::{MethodDef, MethodLocation, Module, TypeDef};

/// The method selected for export, with the facts the validator checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportCandidate {
    #[serde(skip)]
    pub location: MethodLocation,
    pub type_namespace: String,
    pub type_name: String,
    pub method_name: String,
    pub type_is_public: bool,
    pub is_public: bool,
    pub is_static: bool,
    pub return_type: String,
    pub parameter_types: Vec<String>,
}

impl ExportCandidate {
    fn new(location: MethodLocation, ty: &TypeDef, method: &MethodDef) -> Self {
        Self {
            location,
            type_namespace: ty.namespace.clone(),
            type_name: ty.name.clone(),
            method_name: method.name.clone(),
            type_is_public: ty.is_public,
            is_public: method.is_public(),
            is_static: method.is_static,
            return_type: method.return_type.clone(),
            parameter_types: method.params.iter().map(|p| p.type_name.clone()).collect(),
        }
    }

    /// `Namespace.Type::Method`
    pub fn qualified_name(&self) -> String {
        if self.type_namespace.is_empty() {
            format!("{}::{}", self.type_name, self.method_name)
        } else {
            format!(
                "{}.{}::{}",
                self.type_namespace, self.type_name, self.method_name
            )
        }
    }
}

/// Every marked method among the module's top-level types, in declaration order.
pub fn find_candidates(module: &Module) -> Vec<ExportCandidate> {
    module
        .types()
        .enumerate()
        .flat_map(|(type_index, ty)| {
            ty.methods()
                .enumerate()
                .filter(|(_, method)| method.has_attribute(MARKER_ATTRIBUTE_NAME))
                .map(move |(method_index, method)| {
                    let location = MethodLocation {
                        type_index,
                        method_index,
                    };
                    ExportCandidate::new(location, ty, method)
                })
        })
        .collect()
}

/// Resolves the single export candidate.
///
/// Returns `Ok(None)` when nothing is marked and fails when more than one
/// method is, whether they share a type or not.
pub fn resolve_candidate(module: &Module) -> ExportResult<Option<ExportCandidate>> {
    let mut candidates = find_candidates(module);
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => Err(ExportError::AmbiguousCandidates {
            attribute: MARKER_ATTRIBUTE_NAME,
            methods: candidates.iter().map(|c| c.qualified_name()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::il::fixtures::{class_header, extension_module, handler, method, IlFixture};
    use crate::il::{parse_module, IlProgram};

    fn module(text: &str) -> Module {
        parse_module(&IlProgram::from_text(text)).unwrap()
    }

    #[test]
    fn test_single_candidate() {
        let candidate = resolve_candidate(&module(&extension_module()))
            .unwrap()
            .unwrap();

        assert_eq!(candidate.qualified_name(), "MyExtension.Entry::Invoke");
        assert_eq!(
            candidate.location,
            MethodLocation {
                type_index: 0,
                method_index: 0
            }
        );
        assert_eq!(candidate.return_type, "string");
        assert_eq!(candidate.parameter_types, vec!["string", "int32"]);
        assert!(candidate.type_is_public && candidate.is_public && candidate.is_static);
    }

    #[test]
    fn test_no_candidate() {
        let text = IlFixture::new()
            .class(
                &class_header("A", "B"),
                &method("public hidebysig static string 'Run'(string 'a', int32 'b')", false),
            )
            .build();

        assert_eq!(resolve_candidate(&module(&text)).unwrap(), None);
    }

    #[test]
    fn test_two_candidates_in_one_type() {
        let members: Vec<String> = handler("One").into_iter().chain(handler("Two")).collect();
        let text = IlFixture::new()
            .with_marker_reference()
            .class(&class_header("A", "B"), &members)
            .build();

        match resolve_candidate(&module(&text)) {
            Err(ExportError::AmbiguousCandidates { methods, .. }) => {
                assert_eq!(methods, vec!["A.B::One", "A.B::Two"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_candidates_across_types() {
        let text = IlFixture::new()
            .with_marker_reference()
            .class(&class_header("A", "First"), &handler("One"))
            .class(&class_header("A", "Second"), &handler("Two"))
            .build();

        match resolve_candidate(&module(&text)) {
            Err(ExportError::AmbiguousCandidates { methods, .. }) => {
                assert_eq!(methods, vec!["A.First::One", "A.Second::Two"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_locations_index_methods_not_members() {
        let members: Vec<String> = method("public static void 'Other'()", false)
            .into_iter()
            .chain(std::iter::once("  .field private int32 'count'".to_string()))
            .chain(handler("Target"))
            .collect();
        let text = IlFixture::new()
            .class(&class_header("A", "Plain"), &method("public static void 'X'()", false))
            .class(&class_header("A", "B"), &members)
            .build();

        let candidate = resolve_candidate(&module(&text)).unwrap().unwrap();
        assert_eq!(
            candidate.location,
            MethodLocation {
                type_index: 1,
                method_index: 1
            }
        );
    }
}
