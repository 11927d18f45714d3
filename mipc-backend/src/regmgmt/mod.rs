//! Register Management
//!
//! Two independent mechanisms, one per kind of value:
//!
//! - `VarCache` keeps named integer variables in the saved registers with an
//!   LRU policy. A slot is the variable's home while it is cached; dirty
//!   slots are stored back to the stack before reuse.
//! - `RegisterPool` hands out registers for temporaries from a free-list
//!   stack, one pool for integers and one for floats.
//!
//! ## Invariants
//!
//! - A pinned slot is never chosen for eviction
//! - Exactly one store is emitted when a dirty slot is evicted or flushed
//! - Pools never share registers; values cross between them only through
//!   explicit conversion instructions

pub use self::cache::{Slot, VarCache};
pub use self::pool::RegisterPool;

use thiserror::Error;

mod cache;
mod pool;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegAllocError {
    #[error("every variable register is pinned; cannot load '{0}'")]
    AllPinned(String),
}
