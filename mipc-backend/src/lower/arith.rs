//! Arithmetic and assignment

use super::{alloc_error, Emitter};
use mipc_codegen::{Addr, AsmInst};
use mipc_common::{BinOp, CompilerError, SourceLocation, TempId, ValueType};
use mipc_ir::{Operand, Place};

impl Emitter<'_> {
    pub(super) fn binary(
        &mut self,
        op: BinOp,
        lhs: &Operand,
        rhs: &Operand,
        result: TempId,
        loc: &SourceLocation,
    ) -> Result<(), CompilerError> {
        let ty = self
            .env
            .temp_type(result)
            .ok_or_else(|| CompilerError::internal(format!("no type recorded for {}", result)))?;

        if ty == ValueType::Float {
            let a = self.float_value(lhs, loc)?;
            let b = self.float_value(rhs, loc)?;
            let dest = self.define_temp(result, ValueType::Float);
            self.emit(match op {
                BinOp::Add => AsmInst::AddS(dest, a, b),
                BinOp::Sub => AsmInst::SubS(dest, a, b),
                BinOp::Mul => AsmInst::MulS(dest, a, b),
                BinOp::Div => AsmInst::DivS(dest, a, b),
            });
            return Ok(());
        }

        let a = self.int_value(lhs, loc)?;
        let b = self.int_value(rhs, loc)?;
        let dest = self.define_temp(result, ValueType::Int);
        match op {
            BinOp::Add => self.emit(AsmInst::Add(dest, a, b)),
            BinOp::Sub => self.emit(AsmInst::Sub(dest, a, b)),
            BinOp::Mul => {
                self.emit(AsmInst::Mult(a, b));
                self.emit(AsmInst::Mflo(dest));
            }
            BinOp::Div => {
                self.emit(AsmInst::Div(a, b));
                self.emit(AsmInst::Mflo(dest));
            }
        }
        Ok(())
    }

    pub(super) fn assign(&mut self, src: &Operand, dest: &Place, loc: &SourceLocation) -> Result<(), CompilerError> {
        match dest {
            Place::Temp(id) => {
                let ty = self.value_type(src, loc)?;
                match (ty, src) {
                    (ValueType::Int, Operand::Int(v)) => {
                        let reg = self.define_temp(*id, ty);
                        self.emit(AsmInst::Li(reg, *v));
                    }
                    (ValueType::Float, Operand::Float(v)) => {
                        let label = self.data.intern_float(*v);
                        let reg = self.define_temp(*id, ty);
                        self.emit(AsmInst::Ls(reg, Addr::Label(label)));
                    }
                    (ValueType::Float, _) => {
                        let value = self.float_value(src, loc)?;
                        let reg = self.define_temp(*id, ty);
                        self.emit(AsmInst::MovS(reg, value));
                    }
                    _ => {
                        let value = self.int_value(src, loc)?;
                        let reg = self.define_temp(*id, ty);
                        self.emit(AsmInst::Move(reg, value));
                    }
                }
                Ok(())
            }
            Place::Var(name) => {
                let symbol = self.symbol(name, loc)?;
                if symbol.is_array {
                    return Err(CompilerError::type_error(
                        format!("cannot assign to array '{}' as a whole", name),
                        loc.clone(),
                    ));
                }
                let home = self.frame.slot(symbol.offset);
                if symbol.ty == ValueType::Float {
                    let value = self.float_value(src, loc)?;
                    self.emit(AsmInst::Ss(value, home));
                    return Ok(());
                }
                if matches!(src, Operand::Var(s) if s == name) {
                    return Ok(());
                }
                match src {
                    Operand::Int(v) => {
                        let reg = self.cache.define_var(name, home).map_err(alloc_error)?;
                        self.emit(AsmInst::Li(reg, *v));
                    }
                    Operand::Float(v) => {
                        let reg = self.cache.define_var(name, home).map_err(alloc_error)?;
                        self.emit(AsmInst::Li(reg, v.trunc() as i32));
                    }
                    _ if self.value_type(src, loc)? == ValueType::Float => {
                        let value = self.float_value(src, loc)?;
                        let reg = self.cache.define_var(name, home).map_err(alloc_error)?;
                        self.truncate_into(reg, value);
                    }
                    _ => {
                        let value = self.int_value(src, loc)?;
                        let reg = self.cache.define_var(name, home).map_err(alloc_error)?;
                        self.emit(AsmInst::Move(reg, value));
                    }
                }
                Ok(())
            }
        }
    }
}
