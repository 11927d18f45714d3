//! Assembly text emission
//!
//! Lays out the data section, then the text section with the entry label,
//! one instruction per line. Labels are checked before anything is written.

use crate::asm::{Addr, AsmInst};
use crate::data::DataSection;
use std::collections::HashSet;
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmitError {
    #[error("label '{0}' is defined more than once")]
    DuplicateLabel(String),

    #[error("reference to undefined label '{0}'")]
    UndefinedLabel(String),

    #[error("entry label '{0}' is missing")]
    MissingEntry(String),
}

/// A complete program ready for serialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsmProgram {
    pub data: DataSection,
    pub text: Vec<AsmInst>,
    pub entry: String,
}

impl AsmProgram {
    pub fn new(entry: &str) -> Self {
        Self {
            data: DataSection::new(),
            text: Vec::new(),
            entry: entry.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), EmitError> {
        let mut labels = HashSet::new();
        for inst in &self.text {
            if let AsmInst::Label(name) = inst {
                if !labels.insert(name.as_str()) {
                    return Err(EmitError::DuplicateLabel(name.clone()));
                }
            }
        }
        if !labels.contains(self.entry.as_str()) {
            return Err(EmitError::MissingEntry(self.entry.clone()));
        }
        for inst in &self.text {
            match inst {
                AsmInst::Jal(target) if !labels.contains(target.as_str()) => {
                    return Err(EmitError::UndefinedLabel(target.clone()));
                }
                AsmInst::Ls(_, Addr::Label(label)) | AsmInst::Lw(_, Addr::Label(label))
                    if self.data.float_value(label).is_none() =>
                {
                    return Err(EmitError::UndefinedLabel(label.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Text of an instruction sequence, without section headers
pub fn emit_instructions(instructions: &[AsmInst], include_comments: bool) -> String {
    let mut out = String::new();
    for inst in instructions {
        match inst {
            AsmInst::Label(_) => {
                if !out.is_empty() {
                    out.push('\n');
                }
                let _ = writeln!(out, "{}", inst);
            }
            AsmInst::Comment(_) if !include_comments => {}
            _ => {
                let _ = writeln!(out, "    {}", inst);
            }
        }
    }
    out
}

/// Full assembly file for `program`
pub fn emit_program(program: &AsmProgram, include_comments: bool) -> Result<String, EmitError> {
    program.validate()?;

    let mut out = String::new();
    out.push_str(".data\n");
    for item in program.data.items() {
        let _ = writeln!(out, "{}", item);
    }
    out.push_str("\n.text\n");
    let _ = writeln!(out, ".globl {}", program.entry);
    out.push_str(&emit_instructions(&program.text, include_comments));
    Ok(out)
}
