// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Textual IL: the disassembled program, its structured model and the parser
//! between the two.

pub mod emit;
pub mod error;
pub mod model;
pub mod parser;
pub mod program;
pub mod syntax;

#[cfg(test)]
pub(crate) mod fixtures;

pub use emit::{Instruction, MethodBody};
pub use error::IlError;
pub use model::{
    AssemblyRef, BodyItem, CustomAttribute, Item, Member, MethodAccess, MethodDef, MethodLocation,
    Module, ParamDef, TypeDef,
};
pub use parser::parse_module;
pub use program::{IlProgram, LineEnding};
