//! Syntax tree to three-address IR
//!
//! Expressions return the operand holding their value and append the
//! instructions that compute it. Statements only append. Every intermediate
//! value gets a fresh temporary from the session counter, which keeps
//! counting across functions.

use crate::ast::{Expr, FunctionDef, Program, Stmt, StmtKind, ENTRY_FUNCTION};
use log::{debug, info};
use mipc_common::{CompilerError, ParamInfo, Session, SourceLocation, SymbolTable, ValueType};
use mipc_ir::{Instruction, IrProgram, Operand, Place};

/// Lower `program`, filling the session's function and symbol tables
pub fn generate(program: &Program, session: &mut Session) -> Result<IrProgram, CompilerError> {
    let mut gen = IrGenerator {
        session,
        out: IrProgram::new(),
        current: String::new(),
    };
    gen.declare_functions(program)?;
    for func in &program.functions {
        gen.lower_function(func)?;
    }
    info!(
        "generated {} IR instructions for {} functions ({} temporaries)",
        gen.out.len(),
        program.functions.len(),
        gen.session.temps_allocated()
    );
    Ok(gen.out)
}

struct IrGenerator<'s> {
    session: &'s mut Session,
    out: IrProgram,
    current: String,
}

impl IrGenerator<'_> {
    /// Register every signature up front so calls may precede definitions
    fn declare_functions(&mut self, program: &Program) -> Result<(), CompilerError> {
        for (idx, func) in program.functions.iter().enumerate() {
            let params = func
                .params
                .iter()
                .map(|p| ParamInfo {
                    name: p.name.clone(),
                    ty: p.ty,
                    is_array: p.is_array,
                })
                .collect();
            self.session.functions.declare_function(
                &func.name,
                func.return_type,
                params,
                idx,
                func.location.clone(),
            )?;
        }
        if self.session.functions.get(ENTRY_FUNCTION).is_none() {
            return Err(CompilerError::reference(ENTRY_FUNCTION, SourceLocation::dummy()));
        }
        Ok(())
    }

    fn symtab(&mut self) -> Result<&mut SymbolTable, CompilerError> {
        self.session
            .functions
            .get_mut(&self.current)
            .map(|f| &mut f.symtab)
            .ok_or_else(|| CompilerError::internal(format!("no symbol table for '{}'", self.current)))
    }

    fn emit(&mut self, inst: Instruction, loc: &SourceLocation) {
        self.out.push(inst, loc.clone());
    }

    fn lower_function(&mut self, func: &FunctionDef) -> Result<(), CompilerError> {
        debug!("lowering function {} ({} statements)", func.name, func.body.len());
        self.current = func.name.clone();
        self.emit(
            Instruction::FunctionDef {
                name: func.name.clone(),
            },
            &func.location,
        );
        for param in &func.params {
            if param.ty == ValueType::Void {
                return Err(CompilerError::type_error(
                    format!("parameter '{}' of '{}' has type void", param.name, func.name),
                    func.location.clone(),
                ));
            }
            self.symtab()?
                .declare_param(&param.name, param.ty, param.is_array, func.location.clone())?;
            self.emit(
                Instruction::Param {
                    name: param.name.clone(),
                },
                &func.location,
            );
        }
        for stmt in &func.body {
            self.lower_stmt(stmt, func)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt, func: &FunctionDef) -> Result<(), CompilerError> {
        let loc = &stmt.location;
        match &stmt.kind {
            StmtKind::Decl { name, ty } => {
                if *ty == ValueType::Void {
                    return Err(CompilerError::type_error(format!("variable '{}' declared void", name), loc.clone())
                        .with_statement(stmt.to_string())
                        .with_suggestion(format!("declare '{}' as int or float", name)));
                }
                self.symtab()?.declare(name, *ty, loc.clone())?;
                self.emit(Instruction::Declare { name: name.clone() }, loc);
            }
            StmtKind::ArrayDecl { name, ty, size } => {
                if *ty == ValueType::Void {
                    return Err(CompilerError::type_error(format!("array '{}' declared void", name), loc.clone())
                        .with_statement(stmt.to_string()));
                }
                self.symtab()?.declare_array(name, *ty, *size, loc.clone())?;
                self.emit(
                    Instruction::ArrayDeclare {
                        name: name.clone(),
                        size: *size,
                    },
                    loc,
                );
            }
            StmtKind::Assign { target, value } => {
                if self.require_symbol(target, loc)? {
                    return Err(CompilerError::type_error(
                        format!("cannot assign to array '{}' as a whole", target),
                        loc.clone(),
                    )
                    .with_statement(stmt.to_string())
                    .with_suggestion(format!("assign to an element, e.g. {}[0] = ...", target)));
                }
                let src = self.lower_value(value, stmt, loc)?;
                self.emit(
                    Instruction::Assign {
                        src,
                        dest: Place::Var(target.clone()),
                    },
                    loc,
                );
            }
            StmtKind::ArrayAssign { name, index, value } => {
                self.require_array(name, loc)?;
                let index = self.lower_expr(index, loc)?;
                let value = self.lower_value(value, stmt, loc)?;
                self.emit(
                    Instruction::ArrayWrite {
                        array: name.clone(),
                        index,
                        value,
                    },
                    loc,
                );
            }
            StmtKind::Print { value } => {
                let value = self.lower_value(value, stmt, loc)?;
                self.emit(Instruction::Print { value }, loc);
            }
            StmtKind::Return { value } => {
                let value = match value {
                    Some(expr) if func.return_type == ValueType::Void => {
                        return Err(CompilerError::type_error(
                            format!("void function '{}' returns the value {}", func.name, expr),
                            loc.clone(),
                        )
                        .with_statement(stmt.to_string())
                        .with_suggestion("remove the value or give the function a return type"));
                    }
                    Some(expr) => Some(self.lower_value(expr, stmt, loc)?),
                    None if func.return_type != ValueType::Void && func.name != ENTRY_FUNCTION => {
                        return Err(CompilerError::type_error(
                            format!("function '{}' must return a {}", func.name, func.return_type),
                            loc.clone(),
                        )
                        .with_statement(stmt.to_string()));
                    }
                    None => None,
                };
                self.emit(Instruction::Return { value }, loc);
            }
        }
        Ok(())
    }

    /// Errors unless `name` is declared; returns whether it is an array
    fn require_symbol(&mut self, name: &str, loc: &SourceLocation) -> Result<bool, CompilerError> {
        self.symtab()?
            .lookup(name)
            .map(|sym| sym.is_array)
            .ok_or_else(|| CompilerError::reference(name, loc.clone()))
    }

    fn require_array(&mut self, name: &str, loc: &SourceLocation) -> Result<(), CompilerError> {
        if self.require_symbol(name, loc)? {
            Ok(())
        } else {
            Err(CompilerError::type_error(format!("'{}' is not an array", name), loc.clone()))
        }
    }

    /// Lower an expression whose value is stored, printed or returned
    fn lower_value(&mut self, expr: &Expr, stmt: &Stmt, loc: &SourceLocation) -> Result<Operand, CompilerError> {
        if let Expr::Call { name, .. } = expr {
            let returns_void = self
                .session
                .functions
                .get(name)
                .is_some_and(|f| f.return_type == ValueType::Void);
            if returns_void {
                return Err(CompilerError::type_error(
                    format!("'{}' returns void and has no value to use", name),
                    loc.clone(),
                )
                .with_statement(stmt.to_string())
                .with_suggestion(format!("give '{}' an int or float return type", name)));
            }
        }
        self.lower_expr(expr, loc)
    }

    fn lower_expr(&mut self, expr: &Expr, loc: &SourceLocation) -> Result<Operand, CompilerError> {
        match expr {
            Expr::IntLiteral { value } => Ok(Operand::Int(*value)),
            Expr::FloatLiteral { value } => Ok(Operand::Float(*value)),
            Expr::Var { name, ty } => {
                let symbol = self
                    .symtab()?
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| CompilerError::reference(name.as_str(), loc.clone()))?;
                if symbol.is_array {
                    return Err(CompilerError::type_error(
                        format!("array '{}' used as a scalar value", name),
                        loc.clone(),
                    )
                    .with_suggestion(format!("index the array, e.g. {}[0]", name)));
                }
                if symbol.ty != *ty {
                    debug!(
                        "tree types '{}' as {} but it was declared {}; using the declaration",
                        name, ty, symbol.ty
                    );
                }
                Ok(Operand::Var(name.clone()))
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs, loc)?;
                let rhs = self.lower_expr(rhs, loc)?;
                let result = self.session.fresh_temp();
                self.emit(
                    Instruction::Binary {
                        op: *op,
                        lhs,
                        rhs,
                        result,
                    },
                    loc,
                );
                Ok(Operand::Temp(result))
            }
            Expr::ArrayAccess { name, index } => {
                self.require_array(name, loc)?;
                let index = self.lower_expr(index, loc)?;
                let result = self.session.fresh_temp();
                self.emit(
                    Instruction::ArrayRead {
                        array: name.clone(),
                        index,
                        result,
                    },
                    loc,
                );
                Ok(Operand::Temp(result))
            }
            Expr::Call { name, args } => self.lower_call(name, args, loc),
        }
    }

    fn lower_call(&mut self, name: &str, args: &[Expr], loc: &SourceLocation) -> Result<Operand, CompilerError> {
        let params = self
            .session
            .functions
            .get(name)
            .map(|f| f.params.clone())
            .ok_or_else(|| CompilerError::reference(name, loc.clone()))?;
        if params.len() != args.len() {
            return Err(CompilerError::type_error(
                format!("'{}' expects {} argument(s) but {} were given", name, params.len(), args.len()),
                loc.clone(),
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
            let value = if param.is_array {
                match arg {
                    Expr::Var { name: array, .. } => {
                        self.require_array(array, loc)?;
                        Operand::Var(array.clone())
                    }
                    _ => {
                        return Err(CompilerError::type_error(
                            format!("argument {} of '{}' must be an array name", i + 1, name),
                            loc.clone(),
                        ))
                    }
                }
            } else {
                self.lower_expr(arg, loc)?
            };
            values.push(value);
        }
        for value in values {
            self.emit(Instruction::Arg { value }, loc);
        }
        let result = self.session.fresh_temp();
        self.emit(
            Instruction::Call {
                function: name.to_string(),
                argc: args.len(),
                result,
            },
            loc,
        );
        Ok(Operand::Temp(result))
    }
}

#[cfg(test)]
#[path = "irgen_tests.rs"]
mod tests;
