//! MIPS Teaching Compiler - Frontend Interface
//!
//! The typed syntax tree handed over by the parser and type checker, and the
//! IR generator that lowers it to three-address code.

pub mod ast;
pub mod irgen;

pub use ast::{Expr, FunctionDef, Param, Program, Stmt, StmtKind, ENTRY_FUNCTION};
pub use irgen::generate;
