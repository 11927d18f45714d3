//! IR to target instructions
//!
//! Functions are lowered one at a time in program order and reassembled with
//! the entry function first. Within a function every instruction goes
//! through the same cycle:
//!
//! 1. its result type is recorded in the [`TypeEnv`]
//! 2. its operands are brought into registers and the operation is emitted
//! 3. scratch registers and temporaries past their last use are released and
//!    the variable cache is unpinned
//!
//! Loads and stores requested from the variable cache are queued inside it
//! and drained into the output before the next emitted instruction, which
//! keeps them ahead of the instruction that needs them.

mod arith;
mod call;
mod liveness;
mod memory;
mod operands;

use crate::regmgmt::{RegAllocError, RegisterPool, VarCache};
use log::{debug, info};
use mipc_codegen::{syscall, AsmInst, AsmProgram, CallingConvention, DataSection, Frame, Reg};
use mipc_common::{CompilerError, FunctionTable, SourceLocation, TempId, ValueType};
use mipc_frontend::ENTRY_FUNCTION;
use mipc_ir::{Instruction, IrProgram, Operand, TypeEnv};
use std::collections::HashMap;
use std::ops::Range;

/// Register allocation counters for a whole program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocStats {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub spills: usize,
    /// Allocations that fell back to an already used register
    pub pool_exhaustions: usize,
}

/// Lower an IR program to an assembly program
pub fn lower_program(ir: &IrProgram, functions: &FunctionTable) -> Result<(AsmProgram, AllocStats), CompilerError> {
    let mut emitter = Emitter::new(functions);
    let mut entry = None;
    let mut others = Vec::new();
    for (name, range) in ir.functions() {
        let text = emitter.lower_function(ir, &name, range)?;
        if name == ENTRY_FUNCTION {
            entry = Some(text);
        } else {
            others.push(text);
        }
    }
    let mut text = entry.ok_or_else(|| CompilerError::reference(ENTRY_FUNCTION, SourceLocation::dummy()))?;
    for body in others {
        text.extend(body);
    }

    emitter.stats.pool_exhaustions = emitter.int_temps.exhaustion_count() + emitter.float_temps.exhaustion_count();
    let mut program = AsmProgram::new(ENTRY_FUNCTION);
    program.data = emitter.data;
    program.text = text;
    info!(
        "emitted {} target instructions, {} float constants (cache: {} hits, {} misses, {} spills)",
        program.text.len(),
        program.data.items().len(),
        emitter.stats.cache_hits,
        emitter.stats.cache_misses,
        emitter.stats.spills
    );
    Ok((program, emitter.stats))
}

fn alloc_error(err: RegAllocError) -> CompilerError {
    CompilerError::codegen(err.to_string())
}

pub(crate) struct Emitter<'a> {
    env: TypeEnv<'a>,
    data: DataSection,
    out: Vec<AsmInst>,
    cache: VarCache,
    int_temps: RegisterPool,
    float_temps: RegisterPool,
    temp_regs: HashMap<TempId, Reg>,
    /// Results of calls to void functions, with the callee's name
    void_results: HashMap<TempId, String>,
    last_use: HashMap<TempId, usize>,
    /// Registers borrowed for the current instruction only
    scratch: Vec<Reg>,
    pending_args: Vec<Operand>,
    next_param: usize,
    frame: Frame,
    stats: AllocStats,
}

impl<'a> Emitter<'a> {
    fn new(functions: &'a FunctionTable) -> Self {
        Self {
            env: TypeEnv::new(functions),
            data: DataSection::new(),
            out: Vec::new(),
            cache: VarCache::new(&Reg::SAVED),
            int_temps: RegisterPool::integer(),
            float_temps: RegisterPool::float(),
            temp_regs: HashMap::new(),
            void_results: HashMap::new(),
            last_use: HashMap::new(),
            scratch: Vec::new(),
            pending_args: Vec::new(),
            next_param: 0,
            frame: Frame::new(ENTRY_FUNCTION, 0, false, true),
            stats: AllocStats::default(),
        }
    }

    fn lower_function(
        &mut self,
        ir: &IrProgram,
        name: &str,
        range: Range<usize>,
    ) -> Result<Vec<AsmInst>, CompilerError> {
        let insts = ir.instructions();
        let func = self.env.enter_function(name)?;
        if func.param_count() > CallingConvention::MAX_REG_PARAMS {
            return Err(CompilerError::unsupported(
                format!(
                    "'{}' takes {} parameters; at most {} are supported",
                    name,
                    func.param_count(),
                    CallingConvention::MAX_REG_PARAMS
                ),
                func.location.clone(),
            ));
        }

        let has_calls = insts[range.clone()]
            .iter()
            .any(|inst| matches!(inst, Instruction::Call { .. }));
        self.frame = Frame::new(name, func.symtab.frame_size(), has_calls, name == ENTRY_FUNCTION);
        self.cache = VarCache::new(&Reg::SAVED);
        self.int_temps.reset();
        self.float_temps.reset();
        self.temp_regs.clear();
        self.scratch.clear();
        self.pending_args.clear();
        self.next_param = 0;
        self.last_use = liveness::last_uses(insts, range.clone());
        debug!(
            "lowering {} ({} instructions, frame {} bytes, base {})",
            name,
            range.len(),
            self.frame.locals_size,
            self.frame.base()
        );

        self.out = self.frame.gen_prologue();
        let mut returned = false;
        for idx in range {
            let inst = &insts[idx];
            let loc = ir.location(idx);
            self.env.observe(inst, &loc)?;
            if !matches!(inst, Instruction::FunctionDef { .. }) {
                self.emit(AsmInst::Comment(inst.to_string()));
            }
            self.lower_instruction(inst, idx, &loc)?;
            self.end_instruction();
            self.release_dead_temps(idx);
            returned = matches!(inst, Instruction::Return { .. });
        }
        if !returned {
            for inst in self.frame.gen_epilogue() {
                self.emit(inst);
            }
        }
        self.sync();

        let (hits, misses, spills) = self.cache.stats();
        self.stats.cache_hits += hits;
        self.stats.cache_misses += misses;
        self.stats.spills += spills;
        Ok(std::mem::take(&mut self.out))
    }

    fn lower_instruction(&mut self, inst: &Instruction, idx: usize, loc: &SourceLocation) -> Result<(), CompilerError> {
        match inst {
            Instruction::FunctionDef { .. } | Instruction::Nop => Ok(()),
            Instruction::Binary { op, lhs, rhs, result } => self.binary(*op, lhs, rhs, *result, loc),
            Instruction::Assign { src, dest } => self.assign(src, dest, loc),
            Instruction::Declare { name } | Instruction::ArrayDeclare { name, .. } => {
                let home = self.home(name, loc)?;
                self.emit(AsmInst::Comment(format!("{} lives at {}", name, home)));
                Ok(())
            }
            Instruction::ArrayRead { array, index, result } => self.array_read(array, index, *result, loc),
            Instruction::ArrayWrite { array, index, value } => self.array_write(array, index, value, loc),
            Instruction::Print { value } => self.print(value, loc),
            Instruction::Param { name } => self.param(name, loc),
            Instruction::Arg { value } => {
                self.pending_args.push(value.clone());
                Ok(())
            }
            Instruction::Call { function, argc, result } => self.call(function, *argc, *result, idx, loc),
            Instruction::Return { value } => self.ret(value.as_ref(), loc),
        }
    }

    /// Print an integer or float followed by a newline
    fn print(&mut self, value: &Operand, loc: &SourceLocation) -> Result<(), CompilerError> {
        match self.value_type(value, loc)? {
            ValueType::Float => {
                let reg = self.float_value(value, loc)?;
                self.emit(AsmInst::MovS(Reg::FLOAT_PRINT_ARG, reg));
                self.emit(AsmInst::Li(Reg::V0, syscall::PRINT_FLOAT));
            }
            _ => {
                match value {
                    Operand::Int(v) => self.emit(AsmInst::Li(Reg::A0, *v)),
                    _ => {
                        let reg = self.int_value(value, loc)?;
                        self.emit(AsmInst::Move(Reg::A0, reg));
                    }
                }
                self.emit(AsmInst::Li(Reg::V0, syscall::PRINT_INT));
            }
        }
        self.emit(AsmInst::Syscall);
        self.emit(AsmInst::Li(Reg::A0, '\n' as i32));
        self.emit(AsmInst::Li(Reg::V0, syscall::PRINT_CHAR));
        self.emit(AsmInst::Syscall);
        Ok(())
    }

    /// Move queued cache loads and stores into the output
    fn sync(&mut self) {
        let pending = self.cache.take_instructions();
        self.out.extend(pending);
    }

    fn emit(&mut self, inst: AsmInst) {
        self.sync();
        self.out.push(inst);
    }

    fn release(&mut self, reg: Reg) {
        if reg.is_float() {
            self.float_temps.release(reg);
        } else {
            self.int_temps.release(reg);
        }
    }

    fn end_instruction(&mut self) {
        let scratch = std::mem::take(&mut self.scratch);
        for reg in scratch.into_iter().rev() {
            self.release(reg);
        }
        self.cache.unpin_all();
    }

    /// Free the registers of temporaries nothing reads after `idx`
    fn release_dead_temps(&mut self, idx: usize) {
        let mut dead: Vec<TempId> = self
            .temp_regs
            .keys()
            .filter(|id| !matches!(self.last_use.get(*id), Some(&last) if last > idx))
            .copied()
            .collect();
        dead.sort();
        for id in dead.into_iter().rev() {
            if let Some(reg) = self.temp_regs.remove(&id) {
                self.release(reg);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
