//! # Markweave Core
//!
//! A CommonMark-family Markdown compiler with tables, math, wiki-links,
//! embedded files and strikethrough.
//!
//! Input is structured into blocks line by line, list items are combined
//! into lists, reference definitions are harvested, and finally every leaf
//! block's text is resolved into inline nodes with a delimiter stack. The
//! resulting [`Document`] renders to HTML or to a CommonMark-style XML AST.
//!
//! ## Quick Start
//!
//! ```rust
//! let doc = markweave_core::parse("# Hello World\n\nThis is a **paragraph**.");
//!
//! assert_eq!(doc.blocks.len(), 2);
//! assert_eq!(
//!     doc.render_html(),
//!     "<h1>Hello World</h1>\n<p>This is a <strong>paragraph</strong>.</p>\n"
//! );
//! ```
//!
//! ## Diagnostics
//!
//! Parsing never fails. Findings that do not change the output are
//! reported next to the document:
//!
//! ```rust
//! use markweave_core::{DiagnosticKind, Parser, Profile};
//!
//! let result = Parser::new(Profile::Extended).parse_with_diagnostics("```rust\nfn main() {}\n");
//!
//! assert_eq!(result.diagnostics.len(), 1);
//! assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnclosedFence);
//! ```
//!
//! ## Profiles
//!
//! - `Profile::Extended` - CommonMark plus every extension (the default)
//! - `Profile::CommonMark` - CommonMark only
//!
//! Single extensions can be switched off with [`Parser::without_extension`].

pub mod ast;
mod blocks;
pub mod entity;
pub mod error;
pub mod html;
mod inline;
mod leaf;
pub mod lexer;
pub mod options;
pub mod parser;
mod render;
pub mod text;
pub mod xml;

pub use ast::{Block, Document, Inline, ReferenceDefinition};
pub use error::{Diagnostic, DiagnosticKind};
pub use options::{Extension, Options, Profile};
pub use parser::{ParseResult, Parser};
pub use xml::{AstElement, AstNode};

/// Parse `text` with every extension enabled.
#[inline]
pub fn parse(text: &str) -> Document {
    Parser::default().parse(text)
}
