//! Value types and temporary handles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a variable, array cell, expression or function result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Float,
    Void,
}

impl ValueType {
    pub fn is_float(self) -> bool {
        matches!(self, ValueType::Float)
    }

    /// Result type of an arithmetic operation: float wins over int.
    /// Returns `None` when either side is void.
    pub fn promote(self, other: ValueType) -> Option<ValueType> {
        match (self, other) {
            (ValueType::Void, _) | (_, ValueType::Void) => None,
            (ValueType::Float, _) | (_, ValueType::Float) => Some(ValueType::Float),
            _ => Some(ValueType::Int),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Void => write!(f, "void"),
        }
    }
}

/// Arithmetic operators of the source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{}", symbol)
    }
}

/// Handle for a compiler-introduced temporary.
///
/// Temporaries are numbered from a counter owned by the [`Session`](crate::Session)
/// and never share a namespace with source-level names, so a user variable
/// called `t0` cannot collide with `TempId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub u32);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
