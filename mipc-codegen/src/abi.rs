//! Calling convention and stack frame layout
//!
//! Arguments 1-4 travel in `$a0..$a3`; integer results return in `$v0` and
//! float results in `$f0`. Floats cross the argument registers as raw bits.
//! A frame holds the function's symbols at non-negative offsets from its
//! base register. Functions that make calls also save `$ra` and the caller's
//! `$fp` in two extra words above the locals, and address locals through
//! `$fp` because `$sp` moves while temporaries are saved around a call.

use crate::asm::{syscall, Addr, AsmInst, Reg};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbiError {
    #[error("too many parameters: {0} (maximum: {1})")]
    TooManyParameters(usize, usize),
}

pub struct CallingConvention;

impl CallingConvention {
    pub const MAX_REG_PARAMS: usize = 4;

    pub const PARAM_REGS: [Reg; 4] = Reg::ARGS;

    pub const INT_RET: Reg = Reg::V0;

    pub const FLOAT_RET: Reg = Reg::FLOAT_RET;

    /// Words reserved for `$ra` and the saved `$fp`
    pub const LINKAGE_BYTES: i32 = 8;

    /// Register for the parameter at `index` (0-based)
    pub fn param_reg(index: usize) -> Result<Reg, AbiError> {
        if index >= Self::MAX_REG_PARAMS {
            return Err(AbiError::TooManyParameters(index + 1, Self::MAX_REG_PARAMS));
        }
        Ok(Self::PARAM_REGS[index])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    /// Bytes of locals and parameters: the symbol table's running offset
    pub locals_size: u32,
    /// Body contains a call
    pub has_calls: bool,
    /// Program entry: exits the process instead of returning
    pub is_entry: bool,
}

impl Frame {
    pub fn new(name: &str, locals_size: u32, has_calls: bool, is_entry: bool) -> Self {
        Self {
            name: name.to_string(),
            locals_size,
            has_calls,
            is_entry,
        }
    }

    /// Register locals are addressed from
    pub fn base(&self) -> Reg {
        if self.has_calls {
            Reg::Fp
        } else {
            Reg::Sp
        }
    }

    pub fn slot(&self, offset: u32) -> Addr {
        Addr::stack(self.base(), offset as i32)
    }

    fn saves_linkage(&self) -> bool {
        self.has_calls && !self.is_entry
    }

    pub fn gen_prologue(&self) -> Vec<AsmInst> {
        let mut insts = vec![AsmInst::Label(self.name.clone())];
        if self.saves_linkage() {
            insts.push(AsmInst::AddI(Reg::Sp, Reg::Sp, -CallingConvention::LINKAGE_BYTES));
            insts.push(AsmInst::Sw(Reg::Ra, Addr::stack(Reg::Sp, 4)));
            insts.push(AsmInst::Sw(Reg::Fp, Addr::stack(Reg::Sp, 0)));
        }
        if self.locals_size > 0 {
            insts.push(AsmInst::AddI(Reg::Sp, Reg::Sp, -(self.locals_size as i32)));
        }
        if self.has_calls {
            insts.push(AsmInst::Move(Reg::Fp, Reg::Sp));
        }
        insts
    }

    /// Instructions for one return path
    pub fn gen_epilogue(&self) -> Vec<AsmInst> {
        let mut insts = Vec::new();
        if self.locals_size > 0 {
            insts.push(AsmInst::AddI(Reg::Sp, Reg::Sp, self.locals_size as i32));
        }
        if self.is_entry {
            insts.push(AsmInst::Comment("exit program".to_string()));
            insts.push(AsmInst::Li(Reg::V0, syscall::EXIT));
            insts.push(AsmInst::Syscall);
            return insts;
        }
        if self.saves_linkage() {
            insts.push(AsmInst::Lw(Reg::Fp, Addr::stack(Reg::Sp, 0)));
            insts.push(AsmInst::Lw(Reg::Ra, Addr::stack(Reg::Sp, 4)));
            insts.push(AsmInst::AddI(Reg::Sp, Reg::Sp, CallingConvention::LINKAGE_BYTES));
        }
        insts.push(AsmInst::Jr(Reg::Ra));
        insts
    }
}
