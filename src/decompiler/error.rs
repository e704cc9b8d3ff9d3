/// Decompiler errors and diagnostics

use std::fmt;

use thiserror::Error;

use crate::decompiler::ast::Loc;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompileError {
    /// A postfix `with` whose closing `With` node is missing or different.
    #[error("{loc}: unmatched paired with: expected `{expected}`, found {found}")]
    UnmatchedPairedWith {
        loc: Loc,
        expected: String,
        found: String,
    },

    /// A handler was resolved for a node it cannot print.
    #[error("{loc}: handler for {expected} received {class}")]
    HandlerMismatch {
        loc: Loc,
        class: String,
        expected: &'static str,
    },

    #[error("{loc}: {message}")]
    Statement { loc: Loc, message: String },
}

impl DecompileError {
    pub fn statement(loc: &Loc, message: impl Into<String>) -> Self {
        DecompileError::Statement {
            loc: loc.clone(),
            message: message.into(),
        }
    }

    /// Fatal errors abort the whole file; the rest become placeholders.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecompileError::UnmatchedPairedWith { .. })
    }

    /// The error without its location prefix.
    pub fn reason(&self) -> String {
        match self {
            DecompileError::Statement { message, .. } => message.clone(),
            DecompileError::HandlerMismatch { class, expected, .. } => {
                format!("handler for {} received {}", expected, class)
            }
            DecompileError::UnmatchedPairedWith {
                expected, found, ..
            } => format!("unmatched paired with: expected `{}`, found {}", expected, found),
        }
    }

    pub fn loc(&self) -> &Loc {
        match self {
            DecompileError::UnmatchedPairedWith { loc, .. }
            | DecompileError::HandlerMismatch { loc, .. }
            | DecompileError::Statement { loc, .. } => loc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnknownNode,
    UnsupportedShape,
    StatementFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnknownNode => "unknown node",
            DiagnosticKind::UnsupportedShape => "unsupported shape",
            DiagnosticKind::StatementFailed => "statement failed",
        };
        f.write_str(name)
    }
}

/// A problem the decompiler recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub class: String,
    pub loc: Loc,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({}): {}", self.loc, self.kind, self.class, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_paired_with_is_fatal() {
        let loc = Loc::new("a.rpy", 3);
        let unmatched = DecompileError::UnmatchedPairedWith {
            loc: loc.clone(),
            expected: "dissolve".to_string(),
            found: "renpy.ast.Say".to_string(),
        };

        assert!(unmatched.is_fatal());
        assert!(!DecompileError::statement(&loc, "no screen decompiler").is_fatal());
        assert_eq!(
            unmatched.to_string(),
            "a.rpy:3: unmatched paired with: expected `dissolve`, found renpy.ast.Say"
        );
    }
}
