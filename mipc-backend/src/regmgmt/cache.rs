//! LRU cache of named integer variables

use super::RegAllocError;
use log::{debug, trace};
use mipc_codegen::{Addr, AsmInst, Reg};

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub reg: Reg,
    /// Variable name and its stack home
    pub occupant: Option<(String, Addr)>,
    pub last_used: u64,
    pub dirty: bool,
    pub pinned: bool,
}

impl Slot {
    fn holds(&self, name: &str) -> bool {
        matches!(&self.occupant, Some((n, _)) if n == name)
    }
}

#[derive(Debug, Clone)]
pub struct VarCache {
    slots: Vec<Slot>,
    clock: u64,
    hits: usize,
    misses: usize,
    spills: usize,
    instructions: Vec<AsmInst>,
}

impl VarCache {
    pub fn new(regs: &[Reg]) -> Self {
        let slots = regs
            .iter()
            .map(|&reg| Slot {
                reg,
                occupant: None,
                last_used: 0,
                dirty: false,
                pinned: false,
            })
            .collect();
        Self {
            slots,
            clock: 0,
            hits: 0,
            misses: 0,
            spills: 0,
            instructions: Vec::new(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.holds(name))
    }

    /// Free slot if any, else the unpinned slot with the oldest timestamp
    /// after storing its occupant when dirty
    fn claim_slot(&mut self, for_name: &str) -> Result<usize, RegAllocError> {
        if let Some(idx) = self.slots.iter().position(|slot| slot.occupant.is_none()) {
            return Ok(idx);
        }
        let victim = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.pinned)
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(idx, _)| idx)
            .ok_or_else(|| RegAllocError::AllPinned(for_name.to_string()))?;
        self.evict(victim, true);
        Ok(victim)
    }

    fn evict(&mut self, idx: usize, write_back: bool) {
        let slot = &mut self.slots[idx];
        if let Some((name, home)) = slot.occupant.take() {
            if write_back && slot.dirty {
                debug!("spilling '{}' from {} to {}", name, slot.reg, home);
                self.instructions.push(AsmInst::Comment(format!("spill {}", name)));
                self.instructions.push(AsmInst::Sw(slot.reg, home));
                self.spills += 1;
            } else {
                trace!("dropping '{}' from {}", name, slot.reg);
            }
        }
        slot.dirty = false;
        slot.pinned = false;
    }

    /// Register holding the current value of `name`, loading it from `home`
    /// on a miss. The slot stays pinned until [`unpin_all`](Self::unpin_all).
    pub fn use_var(&mut self, name: &str, home: Addr) -> Result<Reg, RegAllocError> {
        let now = self.tick();
        if let Some(idx) = self.find(name) {
            let slot = &mut self.slots[idx];
            slot.last_used = now;
            slot.pinned = true;
            self.hits += 1;
            trace!("cache hit '{}' in {}", name, slot.reg);
            return Ok(slot.reg);
        }

        self.misses += 1;
        let idx = self.claim_slot(name)?;
        let slot = &mut self.slots[idx];
        self.instructions.push(AsmInst::Lw(slot.reg, home.clone()));
        slot.occupant = Some((name.to_string(), home));
        slot.last_used = now;
        slot.dirty = false;
        slot.pinned = true;
        trace!("cache miss '{}' loaded into {}", name, slot.reg);
        Ok(slot.reg)
    }

    /// Register that will receive a new value for `name`. Any cached copy is
    /// stale and dropped without a store; the new slot is dirty.
    pub fn define_var(&mut self, name: &str, home: Addr) -> Result<Reg, RegAllocError> {
        if let Some(idx) = self.find(name) {
            self.evict(idx, false);
        }
        let now = self.tick();
        let idx = self.claim_slot(name)?;
        let slot = &mut self.slots[idx];
        slot.occupant = Some((name.to_string(), home));
        slot.last_used = now;
        slot.dirty = true;
        slot.pinned = true;
        trace!("'{}' now lives in {}", name, slot.reg);
        Ok(slot.reg)
    }

    /// Drop `name` without storing it
    pub fn invalidate(&mut self, name: &str) {
        if let Some(idx) = self.find(name) {
            self.evict(idx, false);
        }
    }

    pub fn unpin_all(&mut self) {
        for slot in &mut self.slots {
            slot.pinned = false;
        }
    }

    /// Store every dirty slot and empty the cache
    pub fn flush(&mut self) {
        for idx in 0..self.slots.len() {
            self.evict(idx, true);
        }
    }

    pub fn cached_reg(&self, name: &str) -> Option<Reg> {
        self.find(name).map(|idx| self.slots[idx].reg)
    }

    pub fn is_cache_reg(&self, reg: Reg) -> bool {
        self.slots.iter().any(|slot| slot.reg == reg)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// (hits, misses, spills)
    pub fn stats(&self) -> (usize, usize, usize) {
        (self.hits, self.misses, self.spills)
    }

    pub fn take_instructions(&mut self) -> Vec<AsmInst> {
        std::mem::take(&mut self.instructions)
    }
}
