//! Typed syntax tree
//!
//! One enum variant per node kind. Lists are vectors and the order of
//! `Program::functions` replaces the next-function link. All nodes are serde
//! types so a tree can be read from JSON.

use mipc_common::{BinOp, CompilerError, SourceLocation, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    IntLiteral {
        value: i32,
    },
    FloatLiteral {
        value: f32,
    },
    /// Variable reference with the type resolved by the checker
    Var {
        name: String,
        ty: ValueType,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    ArrayAccess {
        name: String,
        index: Box<Expr>,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn int(value: i32) -> Self {
        Expr::IntLiteral { value }
    }

    pub fn float(value: f32) -> Self {
        Expr::FloatLiteral { value }
    }

    pub fn var(name: &str, ty: ValueType) -> Self {
        Expr::Var {
            name: name.to_string(),
            ty,
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn index(name: &str, index: Expr) -> Self {
        Expr::ArrayAccess {
            name: name.to_string(),
            index: Box::new(index),
        }
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.to_string(),
            args,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLiteral { value } => write!(f, "{}", value),
            Expr::FloatLiteral { value } => write!(f, "{:?}", value),
            Expr::Var { name, .. } => write!(f, "{}", name),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::ArrayAccess { name, index } => write!(f, "{}[{}]", name, index),
            Expr::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StmtKind {
    Decl {
        name: String,
        ty: ValueType,
    },
    ArrayDecl {
        name: String,
        ty: ValueType,
        size: u32,
    },
    Assign {
        target: String,
        value: Expr,
    },
    ArrayAssign {
        name: String,
        index: Expr,
        value: Expr,
    },
    Print {
        value: Expr,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
    #[serde(default)]
    pub location: SourceLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            location: SourceLocation::dummy(),
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn decl(name: &str, ty: ValueType) -> Self {
        Self::new(StmtKind::Decl {
            name: name.to_string(),
            ty,
        })
    }

    pub fn array_decl(name: &str, ty: ValueType, size: u32) -> Self {
        Self::new(StmtKind::ArrayDecl {
            name: name.to_string(),
            ty,
            size,
        })
    }

    pub fn assign(target: &str, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            target: target.to_string(),
            value,
        })
    }

    pub fn array_assign(name: &str, index: Expr, value: Expr) -> Self {
        Self::new(StmtKind::ArrayAssign {
            name: name.to_string(),
            index,
            value,
        })
    }

    pub fn print(value: Expr) -> Self {
        Self::new(StmtKind::Print { value })
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return { value })
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Decl { name, ty } => write!(f, "{} {};", ty, name),
            StmtKind::ArrayDecl { name, ty, size } => write!(f, "{} {}[{}];", ty, name, size),
            StmtKind::Assign { target, value } => write!(f, "{} = {};", target, value),
            StmtKind::ArrayAssign { name, index, value } => write!(f, "{}[{}] = {};", name, index, value),
            StmtKind::Print { value } => write!(f, "print({});", value),
            StmtKind::Return { value: Some(value) } => write!(f, "return {};", value),
            StmtKind::Return { value: None } => write!(f, "return;"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
    #[serde(default)]
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: ValueType,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Name of the function that holds the program entry point
pub const ENTRY_FUNCTION: &str = "main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
}

/// Accepted JSON shapes: a function list, or a bare statement list for a
/// program without user-defined functions
#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramRepr {
    Functions { functions: Vec<FunctionDef> },
    Statements { statements: Vec<Stmt> },
}

impl Program {
    pub fn new(functions: Vec<FunctionDef>) -> Self {
        Self { functions }
    }

    /// Wrap top-level statements in an `int main()` entry function
    pub fn from_statements(body: Vec<Stmt>) -> Self {
        Self {
            functions: vec![FunctionDef {
                name: ENTRY_FUNCTION.to_string(),
                return_type: ValueType::Int,
                params: Vec::new(),
                body,
                location: SourceLocation::dummy(),
            }],
        }
    }

    pub fn from_json(text: &str) -> Result<Self, CompilerError> {
        let repr: ProgramRepr = serde_json::from_str(text).map_err(|e| CompilerError::Io {
            message: format!("invalid syntax tree: {}", e),
        })?;
        Ok(match repr {
            ProgramRepr::Functions { functions } => Self::new(functions),
            ProgramRepr::Statements { statements } => Self::from_statements(statements),
        })
    }

    pub fn to_json(&self) -> Result<String, CompilerError> {
        serde_json::to_string_pretty(self).map_err(|e| CompilerError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_statement_list_json() {
        let json = r#"{
            "statements": [
                { "kind": "decl", "name": "x", "ty": "int",
                  "location": { "filename": "p.c", "line": 1, "column": 1 } },
                { "kind": "assign", "target": "x",
                  "value": { "kind": "binary", "op": "add",
                             "lhs": { "kind": "int_literal", "value": 2 },
                             "rhs": { "kind": "int_literal", "value": 3 } } },
                { "kind": "print", "value": { "kind": "var", "name": "x", "ty": "int" } }
            ]
        }"#;
        let program = Program::from_json(json).unwrap();
        assert_eq!(program.functions.len(), 1);
        let main = &program.functions[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.body[0].location, SourceLocation::new("p.c", 1, 1));
        assert_eq!(
            main.body[1],
            Stmt::assign("x", Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3)))
        );
    }

    #[test]
    fn test_function_list_json() {
        let json = r#"{
            "functions": [
                { "name": "twice", "return_type": "int",
                  "params": [ { "name": "n", "ty": "int" } ],
                  "body": [ { "kind": "return",
                              "value": { "kind": "binary", "op": "mul",
                                         "lhs": { "kind": "var", "name": "n", "ty": "int" },
                                         "rhs": { "kind": "int_literal", "value": 2 } } } ] },
                { "name": "main", "return_type": "int",
                  "body": [ { "kind": "print",
                              "value": { "kind": "call", "name": "twice",
                                         "args": [ { "kind": "int_literal", "value": 21 } ] } } ] }
            ]
        }"#;
        let program = Program::from_json(json).unwrap();
        assert_eq!(program.functions.len(), 2);
        assert!(!program.functions[0].params[0].is_array);
        assert_eq!(
            program.functions[1].body[0],
            Stmt::print(Expr::call("twice", vec![Expr::int(21)]))
        );
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(matches!(
            Program::from_json("{ \"statements\": 3 }"),
            Err(CompilerError::Io { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_of_program() {
        let program = Program::from_statements(vec![Stmt::print(Expr::float(2.5))]);
        let back = Program::from_json(&program.to_json().unwrap()).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn test_statement_display() {
        assert_eq!(
            Stmt::array_assign("a", Expr::int(2), Expr::var("x", ValueType::Int)).to_string(),
            "a[2] = x;"
        );
        assert_eq!(
            Stmt::assign("y", Expr::binary(BinOp::Div, Expr::int(4), Expr::int(0))).to_string(),
            "y = (4 / 0);"
        );
    }
}
