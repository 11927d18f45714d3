//! Source location tracking for error reporting

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location used for compiler-synthesized nodes and in tests
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("prog.c", 3, 7);
        assert_eq!(format!("{}", loc), "prog.c:3:7");
    }

    #[test]
    fn test_default_is_dummy() {
        assert!(SourceLocation::default().is_dummy());
        assert!(!SourceLocation::new("a.c", 1, 1).is_dummy());
    }
}
