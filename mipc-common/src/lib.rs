//! MIPS Teaching Compiler - Common Types and Utilities
//!
//! Shared types used by every stage of the pipeline: error and diagnostic
//! types, source locations, value types, the per-function symbol tables and
//! the compilation session that owns them.

pub mod error;
pub mod session;
pub mod source_loc;
pub mod symtab;
pub mod types;

pub use error::{CompilerError, Diagnostic, Severity};
pub use session::Session;
pub use source_loc::SourceLocation;
pub use symtab::{FunctionSymbol, FunctionTable, ParamInfo, Symbol, SymbolTable, MAX_FRAME_BYTES, WORD_SIZE};
pub use types::{BinOp, TempId, ValueType};
