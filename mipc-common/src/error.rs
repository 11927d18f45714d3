//! Error handling for the MIPS teaching compiler
//!
//! Every phase returns `Result<_, CompilerError>`. The first fatal error ends
//! the run; the driver turns it into a [`Diagnostic`] for display.

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type covering every phase of the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Declaration error at {location}: '{name}' is already declared in this scope")]
    Declaration {
        location: SourceLocation,
        name: String,
    },

    #[error("Reference error at {location}: '{name}' is not declared")]
    Reference {
        location: SourceLocation,
        name: String,
    },

    #[error("Type error at {location}: {message}")]
    Type {
        location: SourceLocation,
        message: String,
        /// Text of the offending statement or instruction
        statement: Option<String>,
        suggestion: Option<String>,
    },

    #[error("Unsupported construct at {location}: {message}")]
    Unsupported {
        location: SourceLocation,
        message: String,
    },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilerError {
    pub fn declaration(name: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Declaration {
            location,
            name: name.into(),
        }
    }

    pub fn reference(name: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Reference {
            location,
            name: name.into(),
        }
    }

    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Type {
            location,
            message: message.into(),
            statement: None,
            suggestion: None,
        }
    }

    pub fn unsupported(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Unsupported {
            location,
            message: message.into(),
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        CompilerError::Codegen {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilerError::Internal {
            message: message.into(),
        }
    }

    /// Attach a suggested fix. No effect on variants that do not carry one.
    pub fn with_suggestion(mut self, fix: impl Into<String>) -> Self {
        if let CompilerError::Type { suggestion, .. } = &mut self {
            *suggestion = Some(fix.into());
        }
        self
    }

    /// Attach the offending statement text. No effect on variants that do not carry one.
    pub fn with_statement(mut self, text: impl Into<String>) -> Self {
        if let CompilerError::Type { statement, .. } = &mut self {
            *statement = Some(text.into());
        }
        self
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompilerError::Declaration { location, .. }
            | CompilerError::Reference { location, .. }
            | CompilerError::Type { location, .. }
            | CompilerError::Unsupported { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Build the multi-line diagnostic printed by the driver
    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string(), self.location().cloned());
        match self {
            CompilerError::Declaration { name, .. } => {
                diag = diag.with_note(format!("rename or remove the second declaration of '{}'", name));
            }
            CompilerError::Reference { name, .. } => {
                diag = diag.with_note(format!("declare '{}' before using it", name));
            }
            CompilerError::Type {
                statement,
                suggestion,
                ..
            } => {
                if let Some(text) = statement {
                    diag = diag.with_note(format!("in: {}", text));
                }
                if let Some(fix) = suggestion {
                    diag = diag.with_note(format!("suggested fix: {}", fix));
                }
            }
            _ => {}
        }
        diag
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional location and notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: String, location: Option<SourceLocation>) -> Self {
        Self {
            severity: Severity::Error,
            message,
            location,
            notes: Vec::new(),
        }
    }

    pub fn warning(message: String, location: Option<SourceLocation>) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            location,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(loc) = self.location.as_ref().filter(|l| !l.is_dummy()) {
            write!(f, "\n  --> {}", loc)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_error_message() {
        let err = CompilerError::reference("y_unused_var", SourceLocation::new("p.c", 2, 5));
        assert_eq!(
            err.to_string(),
            "Reference error at p.c:2:5: 'y_unused_var' is not declared"
        );
    }

    #[test]
    fn test_type_error_diagnostic_has_statement_and_fix() {
        let err = CompilerError::type_error(
            "cannot assign the result of void function 'f'",
            SourceLocation::new("p.c", 4, 1),
        )
        .with_statement("x = t3")
        .with_suggestion("declare 'f' with a non-void return type");

        let rendered = err.diagnostic().to_string();
        assert_eq!(
            rendered,
            "error: Type error at p.c:4:1: cannot assign the result of void function 'f'\n  \
             --> p.c:4:1\n  \
             note: in: x = t3\n  \
             note: suggested fix: declare 'f' with a non-void return type"
        );
    }

    #[test]
    fn test_suggestion_ignored_on_other_variants() {
        let err = CompilerError::internal("boom").with_suggestion("ignored");
        assert_eq!(err, CompilerError::internal("boom"));
        assert!(err.location().is_none());
    }

    #[test]
    fn test_diagnostic_with_notes() {
        let diag = Diagnostic::warning("pool exhausted".to_string(), None)
            .with_note("first".to_string())
            .with_note("second".to_string());
        assert_eq!(diag.notes.len(), 2);
        assert_eq!(diag.to_string(), "warning: pool exhausted\n  note: first\n  note: second");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: CompilerError = io.into();
        assert!(matches!(err, CompilerError::Io { .. }));
    }
}
