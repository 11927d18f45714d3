//! Machine state and the run loop

use crate::SimError;
use log::{debug, trace};
use mipc_codegen::{Addr, AsmInst, AsmProgram, DataItem, Reg};
use std::collections::HashMap;

/// Initial stack pointer; the stack grows down from here
pub const STACK_TOP: u32 = 0x7fff_effc;

/// Address of the first text instruction, used for return addresses
pub(crate) const TEXT_BASE: u32 = 0x0040_0000;

const DATA_BASE: u32 = 0x1001_0000;

pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Halted,
}

pub struct Machine<'p> {
    pub(crate) program: &'p AsmProgram,
    labels: HashMap<String, usize>,
    data_labels: HashMap<String, u32>,
    pub(crate) registers: [u32; 32],
    /// Raw bits of the float registers
    pub(crate) float_registers: [u32; 32],
    pub(crate) hi: u32,
    pub(crate) lo: u32,
    memory: HashMap<u32, u32>,
    pub(crate) pc: usize,
    pub(crate) state: MachineState,
    pub(crate) output: String,
    steps: u64,
    step_limit: u64,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p AsmProgram) -> Result<Self, SimError> {
        let mut labels = HashMap::new();
        for (idx, inst) in program.text.iter().enumerate() {
            if let AsmInst::Label(name) = inst {
                if labels.insert(name.clone(), idx).is_some() {
                    return Err(SimError::DuplicateLabel(name.clone()));
                }
            }
        }
        let pc = *labels
            .get(&program.entry)
            .ok_or_else(|| SimError::UndefinedLabel(program.entry.clone()))?;

        let mut memory = HashMap::new();
        let mut data_labels = HashMap::new();
        for (i, item) in program.data.items().iter().enumerate() {
            let addr = DATA_BASE + 4 * i as u32;
            match item {
                DataItem::Float { label, value } => {
                    memory.insert(addr, value.to_bits());
                    data_labels.insert(label.clone(), addr);
                }
            }
        }

        let mut registers = [0u32; 32];
        registers[Self::index(Reg::Sp)] = STACK_TOP;
        registers[Self::index(Reg::Fp)] = STACK_TOP;
        Ok(Self {
            program,
            labels,
            data_labels,
            registers,
            float_registers: [0; 32],
            hi: 0,
            lo: 0,
            memory,
            pc,
            state: MachineState::Running,
            output: String::new(),
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        })
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Conventional register number
    pub(crate) fn index(reg: Reg) -> usize {
        match reg {
            Reg::Zero => 0,
            Reg::V0 => 2,
            Reg::V1 => 3,
            Reg::A0 => 4,
            Reg::A1 => 5,
            Reg::A2 => 6,
            Reg::A3 => 7,
            Reg::T0 => 8,
            Reg::T1 => 9,
            Reg::T2 => 10,
            Reg::T3 => 11,
            Reg::T4 => 12,
            Reg::T5 => 13,
            Reg::T6 => 14,
            Reg::T7 => 15,
            Reg::S0 => 16,
            Reg::S1 => 17,
            Reg::S2 => 18,
            Reg::S3 => 19,
            Reg::S4 => 20,
            Reg::S5 => 21,
            Reg::S6 => 22,
            Reg::S7 => 23,
            Reg::T8 => 24,
            Reg::T9 => 25,
            Reg::Sp => 29,
            Reg::Fp => 30,
            Reg::Ra => 31,
            Reg::F(n) => (n & 31) as usize,
        }
    }

    pub fn reg(&self, reg: Reg) -> i32 {
        if reg.is_float() {
            return self.float_registers[Self::index(reg)] as i32;
        }
        self.registers[Self::index(reg)] as i32
    }

    pub(crate) fn set_reg(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::Zero => {}
            Reg::F(_) => self.float_registers[Self::index(reg)] = value,
            _ => self.registers[Self::index(reg)] = value,
        }
    }

    pub fn float_reg(&self, reg: Reg) -> f32 {
        f32::from_bits(self.float_registers[Self::index(reg)])
    }

    pub(crate) fn set_float(&mut self, reg: Reg, value: f32) {
        self.float_registers[Self::index(reg)] = value.to_bits();
    }

    pub(crate) fn address(&self, addr: &Addr) -> Result<u32, SimError> {
        let resolved = match addr {
            Addr::Offset { base, offset } => self.registers[Self::index(*base)].wrapping_add(*offset as u32),
            Addr::Label(label) => *self
                .data_labels
                .get(label)
                .ok_or_else(|| SimError::UndefinedLabel(label.clone()))?,
        };
        if resolved % 4 != 0 {
            return Err(SimError::UnalignedAccess(resolved));
        }
        Ok(resolved)
    }

    /// Word at `addr`; memory never written reads as zero
    pub fn load_word(&self, addr: u32) -> u32 {
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    pub(crate) fn store_word(&mut self, addr: u32, value: u32) {
        trace!("mem[{:#x}] = {:#x}", addr, value);
        self.memory.insert(addr, value);
    }

    pub(crate) fn label_index(&self, label: &str) -> Result<usize, SimError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| SimError::UndefinedLabel(label.to_string()))
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Execute one instruction
    pub fn step(&mut self) -> Result<(), SimError> {
        if self.state == MachineState::Halted {
            return Ok(());
        }
        let program = self.program;
        let inst = program.text.get(self.pc).ok_or(SimError::FellOffEnd)?;
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(SimError::StepLimit(self.step_limit));
        }
        self.execute_instruction(inst)
    }

    /// Run until the exit syscall
    pub fn run(&mut self) -> Result<(), SimError> {
        while self.state == MachineState::Running {
            self.step()?;
        }
        debug!("halted after {} steps, {} bytes of output", self.steps, self.output.len());
        Ok(())
    }
}
