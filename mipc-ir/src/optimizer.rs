//! IR optimizer
//!
//! One forward pass over the instruction list with a copy-propagation
//! binding table (searched most-recent-first), followed by a sweep that drops
//! assignments to temporaries nobody reads. The input program is never
//! modified; a new one is returned.

use crate::ir::{Instruction, IrProgram, Operand, Place};
use crate::typing::TypeEnv;
use log::{debug, info, trace};
use mipc_common::{BinOp, CompilerError, FunctionTable, SourceLocation, TempId, ValueType};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationStats {
    pub folded: usize,
    pub simplified: usize,
    pub propagated: usize,
    pub declarations_removed: usize,
    pub temporaries_removed: usize,
}

/// Run the forward pass and the dead-temporary sweep
pub fn optimize(
    program: &IrProgram,
    functions: &FunctionTable,
) -> Result<(IrProgram, OptimizationStats), CompilerError> {
    let (folded, mut stats) = fold_and_propagate(program, functions)?;
    let (swept, removed) = eliminate_dead_temporaries(&folded);
    stats.temporaries_removed = removed;
    info!(
        "optimizer: {} -> {} instructions ({} folded, {} simplified, {} propagated, {} decls removed, {} temps removed)",
        program.len(),
        swept.len(),
        stats.folded,
        stats.simplified,
        stats.propagated,
        stats.declarations_removed,
        stats.temporaries_removed
    );
    Ok((swept, stats))
}

/// The single forward pass: constant folding, algebraic identities, copy
/// propagation and removal of declarations that are never assigned
pub fn fold_and_propagate(
    program: &IrProgram,
    functions: &FunctionTable,
) -> Result<(IrProgram, OptimizationStats), CompilerError> {
    let mut pass = ForwardPass {
        env: TypeEnv::new(functions),
        bindings: Vec::new(),
        assigned: assigned_names(program),
        current: String::new(),
        stats: OptimizationStats::default(),
        out: IrProgram::new(),
    };
    for (inst, loc) in program.iter() {
        pass.visit(inst, loc)?;
    }
    Ok((pass.out, pass.stats))
}

/// (function, variable) pairs that are the destination of some assignment
fn assigned_names(program: &IrProgram) -> HashSet<(String, String)> {
    let mut current = String::new();
    let mut assigned = HashSet::new();
    for inst in program.instructions() {
        match inst {
            Instruction::FunctionDef { name } => current = name.clone(),
            Instruction::Assign {
                dest: Place::Var(name),
                ..
            } => {
                assigned.insert((current.clone(), name.clone()));
            }
            _ => {}
        }
    }
    assigned
}

struct ForwardPass<'a> {
    env: TypeEnv<'a>,
    /// Append-only; later entries shadow earlier ones for the same place
    bindings: Vec<(Place, Operand)>,
    assigned: HashSet<(String, String)>,
    current: String,
    stats: OptimizationStats,
    out: IrProgram,
}

impl ForwardPass<'_> {
    fn lookup(&self, op: &Operand) -> Operand {
        let Some(place) = Place::of_operand(op) else {
            return op.clone();
        };
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| *bound == place)
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| op.clone())
    }

    fn resolve(&mut self, op: &Operand) -> Operand {
        let value = self.lookup(op);
        if value != *op {
            trace!("  propagate {} -> {}", op, value);
            self.stats.propagated += 1;
        }
        value
    }

    fn bind(&mut self, place: Place, value: Operand) {
        self.bindings.push((place, value));
    }

    /// `name` is about to change: places currently bound to it must not
    /// pick up the new value, so shadow them with identity bindings
    fn kill(&mut self, name: &str) {
        let target = Operand::var(name);
        let mut seen = HashSet::new();
        let mut stale = Vec::new();
        for (place, value) in self.bindings.iter().rev() {
            if seen.insert(place.clone()) && *value == target {
                stale.push(place.clone());
            }
        }
        for place in stale {
            trace!("  invalidate {} (was {})", place, name);
            let identity = place.to_operand();
            self.bind(place, identity);
        }
    }

    fn emit(&mut self, inst: Instruction, loc: &SourceLocation) {
        self.out.push(inst, loc.clone());
    }

    fn visit(&mut self, inst: &Instruction, loc: &SourceLocation) -> Result<(), CompilerError> {
        match inst {
            Instruction::FunctionDef { name } => {
                self.bindings.clear();
                self.current = name.clone();
                self.emit(inst.clone(), loc);
            }
            Instruction::Declare { name } => {
                if self.assigned.contains(&(self.current.clone(), name.clone())) {
                    self.emit(inst.clone(), loc);
                } else {
                    debug!("dropping declaration of never-assigned '{}' in {}", name, self.current);
                    self.stats.declarations_removed += 1;
                }
            }
            Instruction::Binary { op, lhs, rhs, result } => {
                let lhs = self.resolve(lhs);
                let rhs = self.resolve(rhs);
                let rewritten = if let Some(value) = fold(*op, &lhs, &rhs) {
                    debug!("folded {} {} {} = {}", lhs, op, rhs, value);
                    self.stats.folded += 1;
                    Some(value)
                } else if let Some(value) = self.simplify(*op, &lhs, &rhs, loc)? {
                    debug!("simplified {} {} {} to {}", lhs, op, rhs, value);
                    self.stats.simplified += 1;
                    Some(value)
                } else {
                    None
                };
                match rewritten {
                    Some(value) => {
                        self.bind(Place::Temp(*result), value.clone());
                        self.emit(
                            Instruction::Assign {
                                src: value,
                                dest: Place::Temp(*result),
                            },
                            loc,
                        );
                    }
                    None => self.emit(
                        Instruction::Binary {
                            op: *op,
                            lhs,
                            rhs,
                            result: *result,
                        },
                        loc,
                    ),
                }
            }
            Instruction::Assign { src, dest } => {
                let src = self.resolve(src);
                if let Place::Var(name) = dest {
                    self.kill(name);
                }
                let value = self.binding_value(dest, &src, loc)?;
                self.bind(dest.clone(), value);
                self.emit(
                    Instruction::Assign {
                        src,
                        dest: dest.clone(),
                    },
                    loc,
                );
            }
            _ => self.emit(inst.clone(), loc),
        }
        // Types come from the unoptimized instruction so rewrites never change them
        self.env.observe(inst, loc)
    }

    /// What a later read of `dest` may be replaced with after `dest = src`.
    /// An assignment across int and float converts, so only literals (converted
    /// here the same way the target converts them) and same-typed names qualify.
    /// A temporary is never forwarded past the copy into a variable: its
    /// register would stay live until the variable's last read.
    fn binding_value(
        &self,
        dest: &Place,
        src: &Operand,
        loc: &SourceLocation,
    ) -> Result<Operand, CompilerError> {
        let Place::Var(_) = dest else {
            return Ok(src.clone());
        };
        if src.as_temp().is_some() {
            return Ok(dest.to_operand());
        }
        let dest_ty = self.env.operand_type(&dest.to_operand(), loc)?;
        let src_ty = self.env.operand_type(src, loc)?;
        if dest_ty == src_ty {
            return Ok(src.clone());
        }
        Ok(match (src, dest_ty) {
            (Operand::Int(v), ValueType::Float) => Operand::Float(*v as f32),
            (Operand::Float(v), ValueType::Int) => Operand::Int(v.trunc() as i32),
            _ => dest.to_operand(),
        })
    }

    /// `x + 0`, `0 + x`, `x * 1`, `1 * x` and `x * 0`, `0 * x` where the
    /// identity operand is a literal and `x` is not
    fn simplify(
        &self,
        op: BinOp,
        lhs: &Operand,
        rhs: &Operand,
        loc: &SourceLocation,
    ) -> Result<Option<Operand>, CompilerError> {
        let (literal, other) = match (lhs.is_literal(), rhs.is_literal()) {
            (true, false) => (lhs, rhs),
            (false, true) => (rhs, lhs),
            _ => return Ok(None),
        };
        let other_ty = self.env.operand_type(other, loc)?;
        if other_ty == ValueType::Void {
            return Ok(None);
        }
        // A float identity would widen an int operand; leave that to codegen
        let keeps_type = !(matches!(literal, Operand::Float(_)) && other_ty == ValueType::Int);

        let rewritten = match op {
            BinOp::Add if is_zero(literal) && keeps_type => Some(other.clone()),
            BinOp::Mul if is_zero(literal) => Some(match other_ty.promote(literal_type(literal)) {
                Some(ValueType::Float) => Operand::Float(0.0),
                _ => Operand::Int(0),
            }),
            BinOp::Mul if is_one(literal) && keeps_type => Some(other.clone()),
            _ => None,
        };
        Ok(rewritten)
    }
}

fn literal_type(op: &Operand) -> ValueType {
    match op {
        Operand::Float(_) => ValueType::Float,
        _ => ValueType::Int,
    }
}

fn is_zero(op: &Operand) -> bool {
    match op {
        Operand::Int(v) => *v == 0,
        Operand::Float(v) => *v == 0.0,
        _ => false,
    }
}

fn is_one(op: &Operand) -> bool {
    match op {
        Operand::Int(v) => *v == 1,
        Operand::Float(v) => *v == 1.0,
        _ => false,
    }
}

/// Evaluate `lhs op rhs` when both are literals. Division by zero and
/// overflowing division are left for the target to execute.
fn fold(op: BinOp, lhs: &Operand, rhs: &Operand) -> Option<Operand> {
    match (lhs, rhs) {
        (Operand::Int(a), Operand::Int(b)) => {
            let value = match op {
                BinOp::Add => a.wrapping_add(*b),
                BinOp::Sub => a.wrapping_sub(*b),
                BinOp::Mul => a.wrapping_mul(*b),
                BinOp::Div => a.checked_div(*b)?,
            };
            Some(Operand::Int(value))
        }
        (Operand::Int(_) | Operand::Float(_), Operand::Int(_) | Operand::Float(_)) => {
            let a = as_f32(lhs)?;
            let b = as_f32(rhs)?;
            let value = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div if b == 0.0 => return None,
                BinOp::Div => a / b,
            };
            Some(Operand::Float(value))
        }
        _ => None,
    }
}

fn as_f32(op: &Operand) -> Option<f32> {
    match op {
        Operand::Int(v) => Some(*v as f32),
        Operand::Float(v) => Some(*v),
        _ => None,
    }
}

/// Remove assignments to temporaries that are never read, repeating until
/// nothing changes. Returns the new program and how many were removed.
pub fn eliminate_dead_temporaries(program: &IrProgram) -> (IrProgram, usize) {
    let mut current = program.clone();
    let mut removed = 0;
    loop {
        let read: HashSet<TempId> = current
            .instructions()
            .iter()
            .flat_map(|inst| inst.uses())
            .filter_map(|op| op.as_temp())
            .collect();
        let mut next = IrProgram::new();
        let mut changed = false;
        for (inst, loc) in current.iter() {
            if let Instruction::Assign {
                dest: Place::Temp(id),
                ..
            } = inst
            {
                if !read.contains(id) {
                    trace!("  dead temporary {}", id);
                    changed = true;
                    removed += 1;
                    continue;
                }
            }
            next.push(inst.clone(), loc.clone());
        }
        current = next;
        if !changed {
            return (current, removed);
        }
    }
}

#[cfg(test)]
#[path = "optimizer_tests.rs"]
mod tests;
