//! Non-fatal diagnostics.
//!
//! Parsing never fails: malformed input falls back to literal text. The
//! findings below are reported alongside the document for callers that want
//! to lint their input. They never change the output.

use thiserror::Error;

/// Diagnostic kinds for categorizing findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A fenced code block ran to the end of its container.
    UnclosedFence,
    /// An HTML block with an explicit end condition ran to the end of its container.
    UnclosedHtmlBlock,
    /// A later reference definition was shadowed by an earlier one.
    DuplicateReference,
    /// A full reference link named a label with no definition.
    UnresolvedReference,
    /// Container nesting exceeded the configured limit.
    NestingLimit,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::UnclosedFence => "unclosed-fence",
            DiagnosticKind::UnclosedHtmlBlock => "unclosed-html-block",
            DiagnosticKind::DuplicateReference => "duplicate-reference",
            DiagnosticKind::UnresolvedReference => "unresolved-reference",
            DiagnosticKind::NestingLimit => "nesting-limit",
        }
    }
}

/// A finding with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", .line.map(|l| format!("line {}: ", l)).unwrap_or_default())]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// 1-based source line, when known.
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
        }
    }

    pub fn unclosed_fence(fence: &str, line: usize) -> Self {
        Self::new(
            DiagnosticKind::UnclosedFence,
            format!("code fence {} is never closed", fence),
            Some(line),
        )
    }

    pub fn unclosed_html_block(line: usize) -> Self {
        Self::new(
            DiagnosticKind::UnclosedHtmlBlock,
            "HTML block runs to the end of its container",
            Some(line),
        )
    }

    pub fn duplicate_reference(label: &str) -> Self {
        Self::new(
            DiagnosticKind::DuplicateReference,
            format!("reference [{}] is defined more than once; the first definition wins", label),
            None,
        )
    }

    pub fn unresolved_reference(label: &str) -> Self {
        Self::new(
            DiagnosticKind::UnresolvedReference,
            format!("reference [{}] has no definition", label),
            None,
        )
    }

    pub fn nesting_limit(limit: usize, line: usize) -> Self {
        Self::new(
            DiagnosticKind::NestingLimit,
            format!("containers nested deeper than {} are read as text", limit),
            Some(line),
        )
    }
}
