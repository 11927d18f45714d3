//! MIPS Teaching Compiler - Simulator
//!
//! Executes an [`AsmProgram`] instruction by instruction so emitted code can
//! be checked by what it prints. Only the instruction subset the compiler
//! emits is modelled.

mod execution;
mod machine;

pub use machine::{Machine, MachineState, DEFAULT_STEP_LIMIT, STACK_TOP};

use mipc_codegen::AsmProgram;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("integer division by zero at instruction {pc}")]
    DivisionByZero { pc: usize },

    #[error("undefined label '{0}'")]
    UndefinedLabel(String),

    #[error("label '{0}' is defined more than once")]
    DuplicateLabel(String),

    #[error("jump to invalid address {0:#x}")]
    BadJump(u32),

    #[error("unaligned memory access at {0:#x}")]
    UnalignedAccess(u32),

    #[error("unknown syscall {0}")]
    UnknownSyscall(i32),

    #[error("execution ran past the last instruction")]
    FellOffEnd,

    #[error("step limit of {0} instructions exceeded")]
    StepLimit(u64),
}

/// Run `program` from its entry label to the exit syscall and return what it printed
pub fn run(program: &AsmProgram) -> Result<String, SimError> {
    let mut machine = Machine::new(program)?;
    machine.run()?;
    Ok(machine.output().to_string())
}
