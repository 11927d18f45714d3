//! Free-list register pools for temporaries

use log::warn;
use mipc_codegen::Reg;

#[derive(Debug, Clone)]
pub struct RegisterPool {
    kind: &'static str,
    regs: Vec<Reg>,
    /// Stack of free registers; the top is handed out next
    free: Vec<Reg>,
    exhausted: usize,
}

impl RegisterPool {
    pub fn new(kind: &'static str, regs: &[Reg]) -> Self {
        Self {
            kind,
            regs: regs.to_vec(),
            free: regs.iter().rev().copied().collect(),
            exhausted: 0,
        }
    }

    pub fn integer() -> Self {
        Self::new("integer", &Reg::TEMPS)
    }

    pub fn float() -> Self {
        Self::new("float", &Reg::float_temps())
    }

    /// Next free register. When none is left the first register of the pool
    /// is handed out again, which may clobber a live value.
    pub fn alloc(&mut self) -> Reg {
        match self.free.pop() {
            Some(reg) => reg,
            None => {
                self.exhausted += 1;
                let fallback = self.regs[0];
                warn!(
                    "{} register pool exhausted ({} registers live); reusing {}",
                    self.kind,
                    self.regs.len(),
                    fallback
                );
                fallback
            }
        }
    }

    pub fn release(&mut self, reg: Reg) {
        if self.regs.contains(&reg) && !self.free.contains(&reg) {
            self.free.push(reg);
        }
    }

    pub fn owns(&self, reg: Reg) -> bool {
        self.regs.contains(&reg)
    }

    pub fn in_use(&self) -> Vec<Reg> {
        self.regs.iter().copied().filter(|r| !self.free.contains(r)).collect()
    }

    /// Times the fallback register had to be used
    pub fn exhaustion_count(&self) -> usize {
        self.exhausted
    }

    pub fn reset(&mut self) {
        self.free = self.regs.iter().rev().copied().collect();
    }
}
