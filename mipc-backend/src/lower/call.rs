//! Parameters, calls and returns

use super::Emitter;
use log::debug;
use mipc_codegen::{Addr, AsmInst, CallingConvention, Reg};
use mipc_common::{CompilerError, ParamInfo, SourceLocation, TempId, ValueType, WORD_SIZE};
use mipc_ir::Operand;

impl Emitter<'_> {
    /// Store the next incoming argument register to the parameter's slot
    pub(super) fn param(&mut self, name: &str, loc: &SourceLocation) -> Result<(), CompilerError> {
        let index = self.next_param;
        self.next_param += 1;
        let reg = CallingConvention::param_reg(index)
            .map_err(|err| CompilerError::unsupported(err.to_string(), loc.clone()))?;
        let home = self.home(name, loc)?;
        self.emit(AsmInst::Sw(reg, home));
        Ok(())
    }

    fn load_argument(
        &mut self,
        target: Reg,
        arg: &Operand,
        param: &ParamInfo,
        loc: &SourceLocation,
    ) -> Result<(), CompilerError> {
        if !param.is_array {
            return self.move_into(target, arg, param.ty, loc);
        }
        let name = match arg {
            Operand::Var(name) => name,
            other => {
                return Err(CompilerError::type_error(
                    format!("parameter '{}' needs an array, found {}", param.name, other),
                    loc.clone(),
                ))
            }
        };
        let symbol = self.symbol(name, loc)?;
        if !symbol.is_array {
            return Err(CompilerError::type_error(
                format!("parameter '{}' needs an array, found scalar '{}'", param.name, name),
                loc.clone(),
            ));
        }
        let slot = self.frame.slot(symbol.offset);
        if symbol.by_reference {
            self.emit(AsmInst::Lw(target, slot));
        } else {
            let base = self.frame.base();
            self.emit(AsmInst::AddI(target, base, symbol.offset as i32));
        }
        Ok(())
    }

    pub(super) fn call(
        &mut self,
        function: &str,
        argc: usize,
        result: TempId,
        idx: usize,
        loc: &SourceLocation,
    ) -> Result<(), CompilerError> {
        let callee = self
            .env
            .functions()
            .get(function)
            .ok_or_else(|| CompilerError::reference(function, loc.clone()))?;
        if argc > CallingConvention::MAX_REG_PARAMS {
            return Err(CompilerError::unsupported(
                format!(
                    "call to '{}' passes {} arguments; at most {} are supported",
                    function,
                    argc,
                    CallingConvention::MAX_REG_PARAMS
                ),
                loc.clone(),
            ));
        }
        if argc != callee.params.len() || argc > self.pending_args.len() {
            return Err(CompilerError::internal(format!(
                "call to '{}' with {} of {} arguments pending",
                function,
                self.pending_args.len(),
                callee.params.len()
            )));
        }

        let args = self.pending_args.split_off(self.pending_args.len() - argc);
        for (i, (arg, param)) in args.iter().zip(&callee.params).enumerate() {
            let target = CallingConvention::param_reg(i)
                .map_err(|err| CompilerError::unsupported(err.to_string(), loc.clone()))?;
            self.load_argument(target, arg, param, loc)?;
        }

        // the callee reuses the variable registers
        self.cache.flush();
        self.sync();

        let mut live: Vec<(TempId, Reg)> = self
            .temp_regs
            .iter()
            .filter(|(id, _)| matches!(self.last_use.get(*id), Some(&last) if last > idx))
            .map(|(&id, &reg)| (id, reg))
            .collect();
        live.sort();
        let save_bytes = (live.len() as u32 * WORD_SIZE) as i32;
        if !live.is_empty() {
            debug!("saving {} live temporaries around call to {}", live.len(), function);
            self.emit(AsmInst::AddI(Reg::Sp, Reg::Sp, -save_bytes));
            for (slot, &(_, reg)) in live.iter().enumerate() {
                let addr = Addr::stack(Reg::Sp, slot as i32 * WORD_SIZE as i32);
                self.emit(if reg.is_float() {
                    AsmInst::Ss(reg, addr)
                } else {
                    AsmInst::Sw(reg, addr)
                });
            }
        }

        self.emit(AsmInst::Jal(function.to_string()));

        if !live.is_empty() {
            for (slot, &(_, reg)) in live.iter().enumerate() {
                let addr = Addr::stack(Reg::Sp, slot as i32 * WORD_SIZE as i32);
                self.emit(if reg.is_float() {
                    AsmInst::Ls(reg, addr)
                } else {
                    AsmInst::Lw(reg, addr)
                });
            }
            self.emit(AsmInst::AddI(Reg::Sp, Reg::Sp, save_bytes));
        }

        match callee.return_type {
            ValueType::Int => {
                let dest = self.define_temp(result, ValueType::Int);
                self.emit(AsmInst::Move(dest, CallingConvention::INT_RET));
            }
            ValueType::Float => {
                let dest = self.define_temp(result, ValueType::Float);
                self.emit(AsmInst::MovS(dest, CallingConvention::FLOAT_RET));
            }
            ValueType::Void => {
                self.void_results.insert(result, function.to_string());
            }
        }
        Ok(())
    }

    pub(super) fn ret(&mut self, value: Option<&Operand>, loc: &SourceLocation) -> Result<(), CompilerError> {
        if let Some(value) = value {
            let ty = self.value_type(value, loc)?;
            if !self.frame.is_entry {
                let return_type = self
                    .env
                    .current()
                    .map(|func| func.return_type)
                    .ok_or_else(|| CompilerError::internal("return outside of any function"))?;
                match return_type {
                    ValueType::Int => self.move_into(CallingConvention::INT_RET, value, ValueType::Int, loc)?,
                    ValueType::Float => self.move_into(CallingConvention::FLOAT_RET, value, ValueType::Float, loc)?,
                    ValueType::Void => {
                        return Err(CompilerError::type_error(
                            format!("void function '{}' returns a {} value", self.frame.name, ty),
                            loc.clone(),
                        ))
                    }
                }
            }
        }
        for inst in self.frame.gen_epilogue() {
            self.emit(inst);
        }
        Ok(())
    }
}
