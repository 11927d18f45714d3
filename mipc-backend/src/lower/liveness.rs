//! Last-use analysis for temporaries
//!
//! Straight-line code makes this a single forward scan. An argument is not
//! consumed by its `Arg` instruction but by the `Call` that pops it, so its
//! operand stays live until then.

use mipc_ir::{Instruction, Operand};
use mipc_common::TempId;
use std::collections::HashMap;
use std::ops::Range;

/// Index of the last instruction in `range` reading each temporary
pub fn last_uses(instructions: &[Instruction], range: Range<usize>) -> HashMap<TempId, usize> {
    let mut last = HashMap::new();
    let mut pending: Vec<Option<TempId>> = Vec::new();
    for idx in range {
        match &instructions[idx] {
            Instruction::Arg { value } => pending.push(value.as_temp()),
            Instruction::Call { argc, .. } => {
                let keep = pending.len().saturating_sub(*argc);
                for temp in pending.drain(keep..).flatten() {
                    last.insert(temp, idx);
                }
            }
            inst => {
                for op in inst.uses() {
                    if let Operand::Temp(id) = op {
                        last.insert(*id, idx);
                    }
                }
            }
        }
    }
    last
}
