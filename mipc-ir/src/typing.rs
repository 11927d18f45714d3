//! Operand typing
//!
//! Named variables take their type from the current function's symbol
//! table; temporaries take the type of the instruction that produced them.

use crate::ir::{Instruction, Operand, Place};
use mipc_common::{CompilerError, FunctionSymbol, FunctionTable, SourceLocation, SymbolTable, TempId, ValueType};
use std::collections::HashMap;

pub struct TypeEnv<'a> {
    functions: &'a FunctionTable,
    current: Option<&'a FunctionSymbol>,
    temps: HashMap<TempId, ValueType>,
}

impl<'a> TypeEnv<'a> {
    pub fn new(functions: &'a FunctionTable) -> Self {
        Self {
            functions,
            current: None,
            temps: HashMap::new(),
        }
    }

    pub fn enter_function(&mut self, name: &str) -> Result<&'a FunctionSymbol, CompilerError> {
        let func = self
            .functions
            .get(name)
            .ok_or_else(|| CompilerError::internal(format!("IR references unknown function '{}'", name)))?;
        self.current = Some(func);
        Ok(func)
    }

    pub fn current(&self) -> Option<&'a FunctionSymbol> {
        self.current
    }

    pub fn functions(&self) -> &'a FunctionTable {
        self.functions
    }

    pub fn symtab(&self) -> Result<&'a SymbolTable, CompilerError> {
        self.current
            .map(|f| &f.symtab)
            .ok_or_else(|| CompilerError::internal("instruction outside of any function"))
    }

    pub fn temp_type(&self, id: TempId) -> Option<ValueType> {
        self.temps.get(&id).copied()
    }

    pub fn operand_type(&self, op: &Operand, location: &SourceLocation) -> Result<ValueType, CompilerError> {
        match op {
            Operand::Int(_) => Ok(ValueType::Int),
            Operand::Float(_) => Ok(ValueType::Float),
            Operand::Var(name) => self
                .symtab()?
                .lookup_type(name)
                .ok_or_else(|| CompilerError::reference(name.as_str(), location.clone())),
            Operand::Temp(id) => self
                .temp_type(*id)
                .ok_or_else(|| CompilerError::internal(format!("{} read before it is produced", id))),
        }
    }

    /// Record the type of the temporary `inst` produces, if any
    pub fn observe(&mut self, inst: &Instruction, location: &SourceLocation) -> Result<(), CompilerError> {
        let (id, ty) = match inst {
            Instruction::FunctionDef { name } => {
                self.enter_function(name)?;
                return Ok(());
            }
            Instruction::Binary { op, lhs, rhs, result } => {
                let lt = self.operand_type(lhs, location)?;
                let rt = self.operand_type(rhs, location)?;
                let ty = lt.promote(rt).ok_or_else(|| {
                    CompilerError::type_error(format!("operand of '{}' has type void", op), location.clone())
                        .with_statement(inst.to_string())
                        .with_suggestion("only call functions returning int or float inside expressions")
                })?;
                (*result, ty)
            }
            Instruction::Assign {
                src,
                dest: Place::Temp(id),
            } => (*id, self.operand_type(src, location)?),
            Instruction::ArrayRead { array, result, .. } => {
                let ty = self
                    .symtab()?
                    .lookup_type(array)
                    .ok_or_else(|| CompilerError::reference(array.as_str(), location.clone()))?;
                (*result, ty)
            }
            Instruction::Call { function, result, .. } => {
                let func = self
                    .functions
                    .get(function)
                    .ok_or_else(|| CompilerError::reference(function.as_str(), location.clone()))?;
                (*result, func.return_type)
            }
            _ => return Ok(()),
        };
        self.temps.insert(id, ty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mipc_common::BinOp;

    fn table() -> FunctionTable {
        let mut functions = FunctionTable::new();
        let main = functions
            .declare_function("main", ValueType::Int, Vec::new(), 0, SourceLocation::dummy())
            .unwrap();
        main.symtab.declare("i", ValueType::Int, SourceLocation::dummy()).unwrap();
        main.symtab.declare("f", ValueType::Float, SourceLocation::dummy()).unwrap();
        functions
            .declare_function("nothing", ValueType::Void, Vec::new(), 1, SourceLocation::dummy())
            .unwrap();
        functions
    }

    #[test]
    fn test_binary_promotes_to_float() {
        let functions = table();
        let mut env = TypeEnv::new(&functions);
        let loc = SourceLocation::dummy();
        env.observe(&Instruction::FunctionDef { name: "main".to_string() }, &loc).unwrap();
        env.observe(
            &Instruction::Binary {
                op: BinOp::Mul,
                lhs: Operand::var("i"),
                rhs: Operand::var("f"),
                result: TempId(0),
            },
            &loc,
        )
        .unwrap();
        assert_eq!(env.temp_type(TempId(0)), Some(ValueType::Float));
        assert_eq!(env.operand_type(&Operand::var("i"), &loc).unwrap(), ValueType::Int);
    }

    #[test]
    fn test_void_call_in_arithmetic_is_type_error() {
        let functions = table();
        let mut env = TypeEnv::new(&functions);
        let loc = SourceLocation::dummy();
        env.observe(&Instruction::FunctionDef { name: "main".to_string() }, &loc).unwrap();
        env.observe(
            &Instruction::Call {
                function: "nothing".to_string(),
                argc: 0,
                result: TempId(3),
            },
            &loc,
        )
        .unwrap();
        assert_eq!(env.temp_type(TempId(3)), Some(ValueType::Void));
        let err = env
            .observe(
                &Instruction::Binary {
                    op: BinOp::Add,
                    lhs: Operand::Temp(TempId(3)),
                    rhs: Operand::Int(1),
                    result: TempId(4),
                },
                &loc,
            )
            .unwrap_err();
        assert!(matches!(err, CompilerError::Type { .. }));
    }

    #[test]
    fn test_unknown_variable_is_reference_error() {
        let functions = table();
        let mut env = TypeEnv::new(&functions);
        env.enter_function("main").unwrap();
        assert!(matches!(
            env.operand_type(&Operand::var("ghost"), &SourceLocation::dummy()),
            Err(CompilerError::Reference { .. })
        ));
    }
}
