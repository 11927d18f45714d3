//! MIPS Teaching Compiler - Backend
//!
//! Register allocation and assembly generation, plus the pipeline that runs
//! every phase in order:
//!
//! syntax tree -> IR -> optimized IR -> target instructions -> assembly text

pub mod lower;
pub mod regmgmt;

pub use lower::{lower_program, AllocStats};

use log::info;
use mipc_codegen::{emit_program, AsmProgram};
use mipc_common::{CompilerError, Session};
use mipc_frontend::{generate, Program};
use mipc_ir::{optimize, IrProgram, OptimizationStats};

/// Options for one compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run the IR optimizer before lowering
    pub optimize: bool,
    /// Keep `#` comments in the assembly text
    pub emit_comments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            emit_comments: true,
        }
    }
}

/// Every intermediate product of a compilation
#[derive(Debug)]
pub struct CompileOutput {
    pub session: Session,
    pub ir: IrProgram,
    /// Present when optimization ran
    pub optimized: Option<IrProgram>,
    pub opt_stats: Option<OptimizationStats>,
    pub alloc_stats: AllocStats,
    pub asm: AsmProgram,
    pub text: String,
}

impl CompileOutput {
    /// The IR that was lowered
    pub fn final_ir(&self) -> &IrProgram {
        self.optimized.as_ref().unwrap_or(&self.ir)
    }
}

/// Compile a syntax tree to assembly text. Stops at the first fatal error.
pub fn compile(program: &Program, options: &CompileOptions) -> Result<CompileOutput, CompilerError> {
    let mut session = Session::new();
    let ir = generate(program, &mut session)?;

    let (optimized, opt_stats) = if options.optimize {
        let (optimized, stats) = optimize(&ir, &session.functions)?;
        (Some(optimized), Some(stats))
    } else {
        info!("optimizer disabled");
        (None, None)
    };

    let (asm, alloc_stats) = lower_program(optimized.as_ref().unwrap_or(&ir), &session.functions)?;
    let text = emit_program(&asm, options.emit_comments).map_err(|err| CompilerError::codegen(err.to_string()))?;

    Ok(CompileOutput {
        session,
        ir,
        optimized,
        opt_stats,
        alloc_stats,
        asm,
        text,
    })
}

#[cfg(test)]
mod tests;
