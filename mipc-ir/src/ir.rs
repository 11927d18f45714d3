//! IR instruction model

use mipc_common::{BinOp, SourceLocation, TempId};
use std::fmt;
use std::ops::Range;

/// A value reference: a literal, a named variable or a temporary
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i32),
    Float(f32),
    Var(String),
    Temp(TempId),
}

impl Operand {
    pub fn var(name: &str) -> Self {
        Operand::Var(name.to_string())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Int(_) | Operand::Float(_))
    }

    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            Operand::Temp(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{}", v),
            // Debug formatting keeps the decimal point: 3.0 rather than 3
            Operand::Float(v) => write!(f, "{:?}", v),
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Temp(id) => write!(f, "{}", id),
        }
    }
}

/// Destination of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    Var(String),
    Temp(TempId),
}

impl Place {
    pub fn var(name: &str) -> Self {
        Place::Var(name.to_string())
    }

    pub fn to_operand(&self) -> Operand {
        match self {
            Place::Var(name) => Operand::Var(name.clone()),
            Place::Temp(id) => Operand::Temp(*id),
        }
    }

    /// The place an operand names, if it is not a literal
    pub fn of_operand(op: &Operand) -> Option<Place> {
        match op {
            Operand::Var(name) => Some(Place::Var(name.clone())),
            Operand::Temp(id) => Some(Place::Temp(*id)),
            _ => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Var(name) => write!(f, "{}", name),
            Place::Temp(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// result = lhs op rhs
    Binary {
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
        result: TempId,
    },
    Assign {
        src: Operand,
        dest: Place,
    },
    Declare {
        name: String,
    },
    ArrayDeclare {
        name: String,
        size: u32,
    },
    /// result = array[index]
    ArrayRead {
        array: String,
        index: Operand,
        result: TempId,
    },
    /// array[index] = value
    ArrayWrite {
        array: String,
        index: Operand,
        value: Operand,
    },
    Print {
        value: Operand,
    },
    FunctionDef {
        name: String,
    },
    /// Consumes the last `argc` argument instructions
    Call {
        function: String,
        argc: usize,
        result: TempId,
    },
    Param {
        name: String,
    },
    Arg {
        value: Operand,
    },
    Return {
        value: Option<Operand>,
    },
    Nop,
}

impl Instruction {
    /// Operands this instruction reads
    pub fn uses(&self) -> Vec<&Operand> {
        match self {
            Instruction::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::Assign { src, .. } => vec![src],
            Instruction::ArrayRead { index, .. } => vec![index],
            Instruction::ArrayWrite { index, value, .. } => vec![index, value],
            Instruction::Print { value } | Instruction::Arg { value } => vec![value],
            Instruction::Return { value: Some(value) } => vec![value],
            _ => Vec::new(),
        }
    }

    /// Temporary produced by this instruction
    pub fn defined_temp(&self) -> Option<TempId> {
        match self {
            Instruction::Binary { result, .. }
            | Instruction::ArrayRead { result, .. }
            | Instruction::Call { result, .. } => Some(*result),
            Instruction::Assign {
                dest: Place::Temp(id),
                ..
            } => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { op, lhs, rhs, result } => write!(f, "{} = {} {} {}", result, lhs, op, rhs),
            Instruction::Assign { src, dest } => write!(f, "{} = {}", dest, src),
            Instruction::Declare { name } => write!(f, "DECL {}", name),
            Instruction::ArrayDeclare { name, size } => write!(f, "ARRAY_DECL {}[{}]", name, size),
            Instruction::ArrayRead { array, index, result } => write!(f, "{} = {}[{}]", result, array, index),
            Instruction::ArrayWrite { array, index, value } => write!(f, "{}[{}] = {}", array, index, value),
            Instruction::Print { value } => write!(f, "PRINT {}", value),
            Instruction::FunctionDef { name } => write!(f, "FUNCTION {}:", name),
            Instruction::Call { function, argc, result } => write!(f, "{} = CALL {}, {}", result, function, argc),
            Instruction::Param { name } => write!(f, "PARAM {}", name),
            Instruction::Arg { value } => write!(f, "ARG {}", value),
            Instruction::Return { value: Some(value) } => write!(f, "RETURN {}", value),
            Instruction::Return { value: None } => write!(f, "RETURN"),
            Instruction::Nop => write!(f, "NOP"),
        }
    }
}

/// An owned instruction list with the source location each instruction came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrProgram {
    instructions: Vec<Instruction>,
    locations: Vec<SourceLocation>,
}

impl IrProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from bare instructions; every location is a dummy
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        let locations = vec![SourceLocation::dummy(); instructions.len()];
        Self {
            instructions,
            locations,
        }
    }

    pub fn push(&mut self, inst: Instruction, location: SourceLocation) {
        self.instructions.push(inst);
        self.locations.push(location);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn location(&self, index: usize) -> SourceLocation {
        self.locations.get(index).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Instruction, &SourceLocation)> {
        self.instructions.iter().zip(self.locations.iter())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// (function name, index range) for each function, in program order.
    /// A range starts at the `FunctionDef` instruction.
    pub fn functions(&self) -> Vec<(String, Range<usize>)> {
        let mut out: Vec<(String, Range<usize>)> = Vec::new();
        for (idx, inst) in self.instructions.iter().enumerate() {
            if let Instruction::FunctionDef { name } = inst {
                if let Some(last) = out.last_mut() {
                    last.1.end = idx;
                }
                out.push((name.clone(), idx..self.instructions.len()));
            }
        }
        out
    }

    /// Text dump, one instruction per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for inst in &self.instructions {
            match inst {
                Instruction::FunctionDef { .. } => out.push_str(&format!("{}\n", inst)),
                _ => out.push_str(&format!("    {}\n", inst)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instruction_display() {
        let cases = vec![
            (
                Instruction::Binary {
                    op: BinOp::Add,
                    lhs: Operand::Int(2),
                    rhs: Operand::var("x"),
                    result: TempId(0),
                },
                "t0 = 2 + x",
            ),
            (
                Instruction::Assign {
                    src: Operand::Float(3.0),
                    dest: Place::var("y"),
                },
                "y = 3.0",
            ),
            (
                Instruction::ArrayWrite {
                    array: "a".to_string(),
                    index: Operand::Int(2),
                    value: Operand::Int(7),
                },
                "a[2] = 7",
            ),
            (
                Instruction::Call {
                    function: "f".to_string(),
                    argc: 2,
                    result: TempId(4),
                },
                "t4 = CALL f, 2",
            ),
            (Instruction::Return { value: None }, "RETURN"),
        ];
        for (inst, text) in cases {
            assert_eq!(inst.to_string(), text);
        }
    }

    #[test]
    fn test_function_ranges() {
        let program = IrProgram::from_instructions(vec![
            Instruction::FunctionDef { name: "f".to_string() },
            Instruction::Param { name: "n".to_string() },
            Instruction::Return { value: Some(Operand::var("n")) },
            Instruction::FunctionDef { name: "main".to_string() },
            Instruction::Nop,
        ]);
        assert_eq!(
            program.functions(),
            vec![("f".to_string(), 0..3), ("main".to_string(), 3..5)]
        );
    }

    #[test]
    fn test_uses_and_defs() {
        let inst = Instruction::ArrayRead {
            array: "a".to_string(),
            index: Operand::Temp(TempId(1)),
            result: TempId(2),
        };
        assert_eq!(inst.uses(), vec![&Operand::Temp(TempId(1))]);
        assert_eq!(inst.defined_temp(), Some(TempId(2)));
        assert_eq!(Instruction::Print { value: Operand::Int(1) }.defined_temp(), None);
    }

    #[test]
    fn test_dump_indents_bodies() {
        let program = IrProgram::from_instructions(vec![
            Instruction::FunctionDef { name: "main".to_string() },
            Instruction::Print { value: Operand::var("x") },
        ]);
        assert_eq!(program.dump(), "FUNCTION main:\n    PRINT x\n");
    }
}
