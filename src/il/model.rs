// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured module model.
//!
//! The [`Module`] is the in-memory representation of everything the engine
//! needs to reason about: top-level types, their methods, the custom attributes
//! on those methods and the module's external assembly references. Everything
//! the engine does not interpret (fields, properties, nested types, method
//! bodies, manifest directives) is carried verbatim so that rendering an
//! untouched module reproduces the disassembly line for line.

use crate::config::consts::CORE_LIBRARIES;
use crate::il::program::{IlProgram, LineEnding};

/// Position of a method inside a module: index among top-level types, then
/// index among that type's methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodLocation {
    pub type_index: usize,
    pub method_index: usize,
}

/// A disassembled module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub items: Vec<Item>,
}

/// Top-level element of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A line the model does not interpret
    Line(String),
    /// `.assembly extern` block
    AssemblyRef(AssemblyRef),
    /// `.class` block
    Type(TypeDef),
}

/// An `.assembly extern` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyRef {
    pub name: String,
    /// Every line of the block, header through closing brace
    pub lines: Vec<String>,
}

/// Visibility of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAccess {
    Public,
    Private,
    Family,
    Assembly,
    FamilyAndAssembly,
    FamilyOrAssembly,
    PrivateScope,
}

impl MethodAccess {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(MethodAccess::Public),
            "private" => Some(MethodAccess::Private),
            "family" => Some(MethodAccess::Family),
            "assembly" => Some(MethodAccess::Assembly),
            "famandassem" => Some(MethodAccess::FamilyAndAssembly),
            "famorassem" => Some(MethodAccess::FamilyOrAssembly),
            "privatescope" | "compilercontrolled" => Some(MethodAccess::PrivateScope),
            _ => None,
        }
    }
}

/// A top-level `.class` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub namespace: String,
    pub name: String,
    pub is_public: bool,
    pub is_sealed: bool,
    /// Declaration lines before the opening brace
    pub header: Vec<String>,
    pub open: String,
    pub members: Vec<Member>,
    pub close: String,
}

/// Element of a type body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Line(String),
    Method(MethodDef),
}

/// A parameter of a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Type exactly as declared (quotes and marshaling included)
    pub type_name: String,
    pub name: Option<String>,
}

/// A `.method` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub access: MethodAccess,
    pub is_static: bool,
    pub return_type: String,
    pub params: Vec<ParamDef>,
    pub header: Vec<String>,
    pub open: String,
    pub body: Vec<BodyItem>,
    pub close: String,
}

/// Element of a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Line(String),
    /// A custom attribute applied to the method itself
    Attribute(CustomAttribute),
}

/// A `.custom` attribute usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttribute {
    /// Simple type name of the attribute, e.g. `ArmaDllExportAttribute`
    pub type_name: String,
    /// Namespace of the attribute type
    pub namespace: String,
    pub lines: Vec<String>,
}

impl Module {
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Type(ty) => Some(ty),
            _ => None,
        })
    }

    pub fn types_mut(&mut self) -> impl Iterator<Item = &mut TypeDef> {
        self.items.iter_mut().filter_map(|item| match item {
            Item::Type(ty) => Some(ty),
            _ => None,
        })
    }

    pub fn type_at(&self, index: usize) -> Option<&TypeDef> {
        self.types().nth(index)
    }

    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&TypeDef> {
        self.types()
            .find(|ty| ty.namespace == namespace && ty.name == name)
    }

    pub fn method(&self, location: MethodLocation) -> Option<(&TypeDef, &MethodDef)> {
        let ty = self.type_at(location.type_index)?;
        let method = ty.methods().nth(location.method_index)?;
        Some((ty, method))
    }

    pub fn method_mut(&mut self, location: MethodLocation) -> Option<&mut MethodDef> {
        self.types_mut()
            .nth(location.type_index)?
            .methods_mut()
            .nth(location.method_index)
    }

    pub fn assembly_refs(&self) -> impl Iterator<Item = &AssemblyRef> {
        self.items.iter().filter_map(|item| match item {
            Item::AssemblyRef(reference) => Some(reference),
            _ => None,
        })
    }

    pub fn has_assembly_ref(&self, name: &str) -> bool {
        self.assembly_refs().any(|r| r.name == name)
    }

    /// Removes the first `.assembly extern` with the given name.
    ///
    /// Returns false if the module has no such reference.
    pub fn remove_assembly_ref(&mut self, name: &str) -> bool {
        let position = self
            .items
            .iter()
            .position(|item| matches!(item, Item::AssemblyRef(r) if r.name == name));
        match position {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// The referenced core library framework types resolve against.
    pub fn core_library(&self) -> Option<&str> {
        CORE_LIBRARIES
            .iter()
            .find(|name| self.has_assembly_ref(name))
            .copied()
    }

    /// Appends a type after the last existing type declaration.
    pub fn add_type(&mut self, ty: TypeDef) {
        let position = self
            .items
            .iter()
            .rposition(|item| matches!(item, Item::Type(_)))
            .map(|i| i + 1)
            .unwrap_or(self.items.len());
        self.items.insert(position, Item::Type(ty));
    }

    /// Renders the module back to disassembly text.
    pub fn render(&self, line_ending: LineEnding) -> IlProgram {
        let mut lines = Vec::new();
        for item in &self.items {
            match item {
                Item::Line(line) => lines.push(line.clone()),
                Item::AssemblyRef(reference) => lines.extend(reference.lines.iter().cloned()),
                Item::Type(ty) => ty.render_into(&mut lines),
            }
        }
        IlProgram::from_lines(lines, line_ending)
    }
}

impl TypeDef {
    /// `Namespace.Name`, or just `Name` in the global namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            Member::Line(_) => None,
        })
    }

    pub fn methods_mut(&mut self) -> impl Iterator<Item = &mut MethodDef> {
        self.members.iter_mut().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            Member::Line(_) => None,
        })
    }

    fn render_into(&self, lines: &mut Vec<String>) {
        lines.extend(self.header.iter().cloned());
        lines.push(self.open.clone());
        for member in &self.members {
            match member {
                Member::Line(line) => lines.push(line.clone()),
                Member::Method(method) => method.render_into(lines),
            }
        }
        lines.push(self.close.clone());
    }
}

impl MethodDef {
    #[inline]
    pub fn is_public(&self) -> bool {
        self.access == MethodAccess::Public
    }

    pub fn attributes(&self) -> impl Iterator<Item = &CustomAttribute> {
        self.body.iter().filter_map(|item| match item {
            BodyItem::Attribute(attribute) => Some(attribute),
            BodyItem::Line(_) => None,
        })
    }

    /// Returns true if an attribute with this simple type name is applied.
    pub fn has_attribute(&self, type_name: &str) -> bool {
        self.attributes().any(|a| a.type_name == type_name)
    }

    /// Removes the first attribute with this simple type name.
    ///
    /// Returns false if the attribute is not applied.
    pub fn remove_attribute(&mut self, type_name: &str) -> bool {
        let position = self
            .body
            .iter()
            .position(|item| matches!(item, BodyItem::Attribute(a) if a.type_name == type_name));
        match position {
            Some(index) => {
                self.body.remove(index);
                true
            }
            None => false,
        }
    }

    fn render_into(&self, lines: &mut Vec<String>) {
        lines.extend(self.header.iter().cloned());
        lines.push(self.open.clone());
        for item in &self.body {
            match item {
                BodyItem::Line(line) => lines.push(line.clone()),
                BodyItem::Attribute(attribute) => lines.extend(attribute.lines.iter().cloned()),
            }
        }
        lines.push(self.close.clone());
    }
}
