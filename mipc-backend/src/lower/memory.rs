//! Array element access
//!
//! The address of `a[i]` is `base + offset(a) + i*4` for a local array and
//! `*(base + offset(a)) + i*4` for an array parameter, whose slot holds the
//! caller's array address. Accesses then go through `0(addr)`.

use super::Emitter;
use mipc_codegen::{Addr, AsmInst, Reg};
use mipc_common::{CompilerError, SourceLocation, TempId, ValueType, WORD_SIZE};
use mipc_ir::Operand;

impl Emitter<'_> {
    fn element_address(&mut self, array: &str, index: &Operand, loc: &SourceLocation) -> Result<Reg, CompilerError> {
        let symbol = self.symbol(array, loc)?;
        if !symbol.is_array {
            return Err(CompilerError::type_error(format!("'{}' is not an array", array), loc.clone()));
        }
        if self.value_type(index, loc)? != ValueType::Int {
            return Err(CompilerError::type_error(
                format!("index of '{}' must be an int, found {}", array, index),
                loc.clone(),
            )
            .with_suggestion("convert the index to int first"));
        }

        let base = self.frame.base();
        let stride = WORD_SIZE as i32;
        let addr = self.scratch(ValueType::Int);
        if symbol.by_reference {
            let slot = self.frame.slot(symbol.offset);
            self.emit(AsmInst::Lw(addr, slot));
            match index {
                Operand::Int(0) => {}
                Operand::Int(i) => self.emit(AsmInst::AddI(addr, addr, i.wrapping_mul(stride))),
                _ => {
                    let i = self.int_value(index, loc)?;
                    let scaled = self.scratch(ValueType::Int);
                    self.emit(AsmInst::Sll(scaled, i, 2));
                    self.emit(AsmInst::Add(addr, addr, scaled));
                }
            }
            return Ok(addr);
        }

        let offset = symbol.offset as i32;
        match index {
            Operand::Int(i) => {
                if *i < 0 || *i as u32 >= symbol.array_len {
                    return Err(CompilerError::type_error(
                        format!(
                            "index {} is out of bounds for '{}' of length {}",
                            i, array, symbol.array_len
                        ),
                        loc.clone(),
                    ));
                }
                self.emit(AsmInst::Comment(format!("&{}[{}] = {} + {} + {}*4", array, i, base, offset, i)));
                self.emit(AsmInst::Li(addr, offset + i * stride));
                self.emit(AsmInst::Add(addr, addr, base));
            }
            _ => {
                let i = self.int_value(index, loc)?;
                self.emit(AsmInst::Sll(addr, i, 2));
                if offset != 0 {
                    self.emit(AsmInst::AddI(addr, addr, offset));
                }
                self.emit(AsmInst::Add(addr, addr, base));
            }
        }
        Ok(addr)
    }

    pub(super) fn array_read(
        &mut self,
        array: &str,
        index: &Operand,
        result: TempId,
        loc: &SourceLocation,
    ) -> Result<(), CompilerError> {
        let addr = self.element_address(array, index, loc)?;
        let ty = self.symbol(array, loc)?.ty;
        let dest = self.define_temp(result, ty);
        if ty == ValueType::Float {
            self.emit(AsmInst::Ls(dest, Addr::stack(addr, 0)));
        } else {
            self.emit(AsmInst::Lw(dest, Addr::stack(addr, 0)));
        }
        Ok(())
    }

    pub(super) fn array_write(
        &mut self,
        array: &str,
        index: &Operand,
        value: &Operand,
        loc: &SourceLocation,
    ) -> Result<(), CompilerError> {
        let addr = self.element_address(array, index, loc)?;
        let ty = self.symbol(array, loc)?.ty;
        let value = self.value_as(value, ty, loc)?;
        if ty == ValueType::Float {
            self.emit(AsmInst::Ss(value, Addr::stack(addr, 0)));
        } else {
            self.emit(AsmInst::Sw(value, Addr::stack(addr, 0)));
        }
        Ok(())
    }
}
