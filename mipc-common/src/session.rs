//! Compilation session: the state one run of the pipeline owns

use crate::symtab::FunctionTable;
use crate::types::TempId;
use log::debug;

/// Owns the function table (and through it every symbol table) and the
/// temporary counter. Phases receive it by reference; nothing is global.
#[derive(Debug, Default)]
pub struct Session {
    pub functions: FunctionTable,
    next_temp: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next temporary. The counter spans the whole compilation unit and is
    /// never reset between functions.
    pub fn fresh_temp(&mut self) -> TempId {
        let id = TempId(self.next_temp);
        self.next_temp += 1;
        id
    }

    pub fn temps_allocated(&self) -> u32 {
        self.next_temp
    }

    /// Drop all state from a previous run
    pub fn reset(&mut self) {
        debug!(
            "resetting session ({} functions, {} temporaries)",
            self.functions.len(),
            self.next_temp
        );
        self.functions.clear();
        self.next_temp = 0;
    }
}
