//! Getting operands into registers
//!
//! Integer variables come from the variable cache, temporaries from their
//! assigned register, literals are materialized into scratch registers. A
//! value needed at the other type is converted on the way: integers widen
//! with `mtc1` + `cvt.s.w`, floats truncate with `trunc.w.s` + `mfc1`.

use super::{alloc_error, Emitter};
use mipc_codegen::{Addr, AsmInst, Reg};
use mipc_common::{CompilerError, SourceLocation, Symbol, TempId, ValueType};
use mipc_ir::Operand;

impl<'a> Emitter<'a> {
    pub(super) fn symbol(&self, name: &str, loc: &SourceLocation) -> Result<&'a Symbol, CompilerError> {
        self.env
            .symtab()?
            .lookup(name)
            .ok_or_else(|| CompilerError::reference(name, loc.clone()))
    }

    /// Stack slot of a named variable
    pub(super) fn home(&self, name: &str, loc: &SourceLocation) -> Result<Addr, CompilerError> {
        let symbol = self.symbol(name, loc)?;
        Ok(self.frame.slot(symbol.offset))
    }

    fn scalar(&self, name: &str, loc: &SourceLocation) -> Result<&'a Symbol, CompilerError> {
        let symbol = self.symbol(name, loc)?;
        if symbol.is_array {
            return Err(CompilerError::type_error(
                format!("array '{}' used as a scalar value", name),
                loc.clone(),
            ));
        }
        Ok(symbol)
    }

    /// Type of a value operand; a void call result has none
    pub(super) fn value_type(&self, op: &Operand, loc: &SourceLocation) -> Result<ValueType, CompilerError> {
        let ty = self.env.operand_type(op, loc)?;
        if ty == ValueType::Void {
            let callee = op
                .as_temp()
                .and_then(|id| self.void_results.get(&id))
                .map(String::as_str)
                .unwrap_or("<unknown>");
            return Err(CompilerError::type_error(
                format!("'{}' returns void and has no value to use", callee),
                loc.clone(),
            )
            .with_suggestion(format!("give '{}' an int or float return type", callee)));
        }
        Ok(ty)
    }

    fn scratch_int(&mut self) -> Reg {
        let reg = self.int_temps.alloc();
        self.scratch.push(reg);
        reg
    }

    fn scratch_float(&mut self) -> Reg {
        let reg = self.float_temps.alloc();
        self.scratch.push(reg);
        reg
    }

    pub(super) fn scratch(&mut self, ty: ValueType) -> Reg {
        if ty == ValueType::Float {
            self.scratch_float()
        } else {
            self.scratch_int()
        }
    }

    /// Register that holds `id` until its last use
    pub(super) fn define_temp(&mut self, id: TempId, ty: ValueType) -> Reg {
        let reg = if ty == ValueType::Float {
            self.float_temps.alloc()
        } else {
            self.int_temps.alloc()
        };
        self.temp_regs.insert(id, reg);
        reg
    }

    fn temp_reg(&self, id: TempId) -> Result<Reg, CompilerError> {
        self.temp_regs
            .get(&id)
            .copied()
            .ok_or_else(|| CompilerError::internal(format!("{} has no register", id)))
    }

    /// `op` as an integer
    pub(super) fn int_value(&mut self, op: &Operand, loc: &SourceLocation) -> Result<Reg, CompilerError> {
        match op {
            Operand::Int(v) => {
                let reg = self.scratch_int();
                self.emit(AsmInst::Li(reg, *v));
                Ok(reg)
            }
            Operand::Float(v) => {
                let reg = self.scratch_int();
                self.emit(AsmInst::Li(reg, v.trunc() as i32));
                Ok(reg)
            }
            Operand::Var(name) => {
                let symbol = self.scalar(name, loc)?;
                if symbol.ty == ValueType::Float {
                    let f = self.float_value(op, loc)?;
                    let reg = self.scratch_int();
                    self.truncate_into(reg, f);
                    return Ok(reg);
                }
                let home = self.frame.slot(symbol.offset);
                self.cache.use_var(name, home).map_err(alloc_error)
            }
            Operand::Temp(id) => {
                let ty = self.value_type(op, loc)?;
                let reg = self.temp_reg(*id)?;
                if ty == ValueType::Float {
                    let int = self.scratch_int();
                    self.truncate_into(int, reg);
                    return Ok(int);
                }
                Ok(reg)
            }
        }
    }

    /// `op` as a float
    pub(super) fn float_value(&mut self, op: &Operand, loc: &SourceLocation) -> Result<Reg, CompilerError> {
        match op {
            Operand::Int(v) => Ok(self.float_literal(*v as f32)),
            Operand::Float(v) => Ok(self.float_literal(*v)),
            Operand::Var(name) => {
                let symbol = self.scalar(name, loc)?;
                if symbol.ty == ValueType::Float {
                    let home = self.frame.slot(symbol.offset);
                    let reg = self.scratch_float();
                    self.emit(AsmInst::Ls(reg, home));
                    return Ok(reg);
                }
                let int = self.int_value(op, loc)?;
                Ok(self.widen(int))
            }
            Operand::Temp(id) => {
                let ty = self.value_type(op, loc)?;
                let reg = self.temp_reg(*id)?;
                if ty == ValueType::Float {
                    Ok(reg)
                } else {
                    Ok(self.widen(reg))
                }
            }
        }
    }

    /// `op` converted to `ty`
    pub(super) fn value_as(&mut self, op: &Operand, ty: ValueType, loc: &SourceLocation) -> Result<Reg, CompilerError> {
        match ty {
            ValueType::Int => self.int_value(op, loc),
            ValueType::Float => self.float_value(op, loc),
            ValueType::Void => Err(CompilerError::internal(format!("{} requested as void", op))),
        }
    }

    fn float_literal(&mut self, value: f32) -> Reg {
        let label = self.data.intern_float(value);
        let reg = self.scratch_float();
        self.emit(AsmInst::Ls(reg, Addr::Label(label)));
        reg
    }

    fn widen(&mut self, int: Reg) -> Reg {
        let reg = self.scratch_float();
        self.emit(AsmInst::Mtc1(int, reg));
        self.emit(AsmInst::CvtSW(reg, reg));
        reg
    }

    /// `dest = (int) f`, rounding toward zero
    pub(super) fn truncate_into(&mut self, dest: Reg, f: Reg) {
        let tmp = self.scratch_float();
        self.emit(AsmInst::TruncWS(tmp, f));
        self.emit(AsmInst::Mfc1(dest, tmp));
    }

    /// Write `op`, converted to `ty`, into the fixed register `dest`
    pub(super) fn move_into(
        &mut self,
        dest: Reg,
        op: &Operand,
        ty: ValueType,
        loc: &SourceLocation,
    ) -> Result<(), CompilerError> {
        match (ty, op) {
            (ValueType::Int, Operand::Int(v)) => self.emit(AsmInst::Li(dest, *v)),
            (ValueType::Int, Operand::Float(v)) => self.emit(AsmInst::Li(dest, v.trunc() as i32)),
            (ValueType::Int, _) => {
                if self.value_type(op, loc)? == ValueType::Float {
                    let f = self.float_value(op, loc)?;
                    self.truncate_into(dest, f);
                } else {
                    let reg = self.int_value(op, loc)?;
                    if reg != dest {
                        self.emit(AsmInst::Move(dest, reg));
                    }
                }
            }
            (ValueType::Float, _) => {
                let reg = self.float_value(op, loc)?;
                if dest.is_float() {
                    self.emit(AsmInst::MovS(dest, reg));
                } else {
                    // raw bits into an integer register
                    self.emit(AsmInst::Mfc1(dest, reg));
                }
            }
            (ValueType::Void, _) => {
                return Err(CompilerError::internal(format!("{} requested as void", op)));
            }
        }
        Ok(())
    }
}
