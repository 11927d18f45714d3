//! MIPS Teaching Compiler - Intermediate Representation
//!
//! A flat, ordered list of three-address instructions. Each function's code
//! starts at its `FunctionDef` instruction and runs until the next one.
//!
//! - `ir`: instruction, operand and program types plus the text dump
//! - `typing`: operand types derived from symbol tables and producing instructions
//! - `optimizer`: folding, algebraic identities, copy propagation, dead-code removal

pub mod ir;
pub mod optimizer;
pub mod typing;

pub use ir::{Instruction, IrProgram, Operand, Place};
pub use optimizer::{eliminate_dead_temporaries, fold_and_propagate, optimize, OptimizationStats};
pub use typing::TypeEnv;
