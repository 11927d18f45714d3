//! MIPS Teaching Compiler - Code Generation Target
//!
//! The target instruction set as data, and its serialization to assembly
//! text:
//!
//! - `asm`: registers, addressing modes and instructions
//! - `abi`: calling convention, frame prologue and epilogue
//! - `data`: the data section (interned float constants)
//! - `emit`: program layout and text output

pub mod abi;
pub mod asm;
pub mod data;
pub mod emit;

pub use abi::{AbiError, CallingConvention, Frame};
pub use asm::{syscall, Addr, AsmInst, Reg};
pub use data::{DataItem, DataSection};
pub use emit::{emit_instructions, emit_program, AsmProgram, EmitError};
