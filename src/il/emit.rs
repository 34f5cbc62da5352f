// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Method body emission in disassembler layout.

use std::fmt;

/// The instructions the engine emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Ldarg(u16),
    /// `call` with a fully spelled method reference
    Call(String),
    /// `callvirt` with a fully spelled method reference
    Callvirt(String),
    Pop,
    Ret,
}

impl Instruction {
    /// Encoded size in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Instruction::Nop | Instruction::Pop | Instruction::Ret => 1,
            Instruction::Ldarg(0..=3) => 1,
            Instruction::Ldarg(4..=255) => 2,
            Instruction::Ldarg(_) => 4,
            Instruction::Call(_) | Instruction::Callvirt(_) => 5,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Nop => write!(f, "nop"),
            Instruction::Ldarg(index @ 0..=3) => write!(f, "ldarg.{}", index),
            Instruction::Ldarg(index @ 4..=255) => write!(f, "ldarg.s    {}", index),
            Instruction::Ldarg(index) => write!(f, "ldarg      {}", index),
            Instruction::Call(target) => write!(f, "call       {}", target),
            Instruction::Callvirt(target) => write!(f, "callvirt   {}", target),
            Instruction::Pop => write!(f, "pop"),
            Instruction::Ret => write!(f, "ret"),
        }
    }
}

/// A straight-line method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub max_stack: u16,
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    pub fn code_size(&self) -> u32 {
        self.instructions.iter().map(Instruction::size).sum()
    }

    /// Renders the body with `IL_xxxx` offsets, each line prefixed by `indent`.
    pub fn render(&self, indent: &str) -> Vec<String> {
        let code_size = self.code_size();
        let mut lines = vec![
            format!("{}// Code size       {} (0x{:x})", indent, code_size, code_size),
            format!("{}.maxstack  {}", indent, self.max_stack),
        ];
        let mut offset = 0;
        for instruction in &self.instructions {
            lines.push(format!("{}IL_{:04x}:  {}", indent, offset, instruction));
            offset += instruction.size();
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_instruction_sizes() {
        let body = MethodBody {
            max_stack: 8,
            instructions: vec![
                Instruction::Nop,
                Instruction::Ldarg(0),
                Instruction::Call("string 'A'::'B'(string)".to_string()),
                Instruction::Pop,
                Instruction::Ret,
            ],
        };

        assert_eq!(body.code_size(), 9);
        assert_eq!(
            body.render("    "),
            vec![
                "    // Code size       9 (0x9)",
                "    .maxstack  8",
                "    IL_0000:  nop",
                "    IL_0001:  ldarg.0",
                "    IL_0002:  call       string 'A'::'B'(string)",
                "    IL_0007:  pop",
                "    IL_0008:  ret",
            ]
        );
    }

    #[test]
    fn test_ldarg_forms() {
        assert_eq!(Instruction::Ldarg(3).to_string(), "ldarg.3");
        assert_eq!(Instruction::Ldarg(4).to_string(), "ldarg.s    4");
        assert_eq!(Instruction::Ldarg(4).size(), 2);
        assert_eq!(Instruction::Ldarg(300).to_string(), "ldarg      300");
        assert_eq!(Instruction::Ldarg(300).size(), 4);
    }
}
