//! Block structuring and the public parser entry points.
//!
//! Parsing runs in four steps:
//!
//! 1. the structurer drives the block recognizers over the input lines,
//!    recursing into block quotes and list items;
//! 2. adjacent list items are combined into lists;
//! 3. link reference definitions are harvested from the whole tree;
//! 4. every leaf's raw text is resolved into inline nodes.
//!
//! Parsing never fails. Findings that do not change the output are collected
//! as [`Diagnostic`]s.

use std::collections::hash_map::Entry;

use log::{debug, trace, warn};

use crate::ast::{
    ends_with_paragraph, Block, Document, LeafContent, List, ListItem, Paragraph,
    ReferenceDefinition, ReferenceMap,
};
use crate::blocks::{Context, Recognizer};
use crate::error::Diagnostic;
use crate::inline::InlineParser;
use crate::lexer::{split_lines, Line};
use crate::options::{Extension, Options, Profile};
use crate::text::normalize_label;

/// Result of parsing with diagnostics.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed document. Always complete.
    pub document: Document,
    /// Non-fatal findings, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Check if parsing produced no diagnostics.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Markdown parser with configurable extensions.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: Options,
}

impl Parser {
    /// Create a new parser with the extensions of the given profile.
    #[inline]
    pub fn new(profile: Profile) -> Self {
        Self::with_options(Options::from_profile(profile))
    }

    #[inline]
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    /// Enable additional extensions.
    pub fn with_extensions(mut self, extensions: &[Extension]) -> Self {
        for extension in extensions {
            self.options.enable(*extension);
        }
        self
    }

    /// Disable a single extension.
    pub fn without_extension(mut self, extension: Extension) -> Self {
        self.options.disable(extension);
        self
    }

    /// Bound how deeply block quotes and list items may nest.
    ///
    /// Container markers beyond the limit are read as paragraph text.
    pub fn with_max_nesting(mut self, limit: usize) -> Self {
        self.options.max_nesting = limit;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Parse `input` into a document.
    #[inline]
    pub fn parse(&self, input: &str) -> Document {
        self.parse_with_diagnostics(input).document
    }

    /// Parse `input`, returning both the document and any diagnostics.
    pub fn parse_with_diagnostics(&self, input: &str) -> ParseResult {
        let lines = split_lines(input);

        let mut structurer = BlockParser::new(&self.options);
        let mut blocks = Vec::new();
        structurer.parse_blocks(&lines, &mut blocks);
        let mut diagnostics = structurer.diagnostics;

        let mut blocks = combine_lists(blocks);
        let references = harvest_references(&blocks, &mut diagnostics);

        let mut inlines = InlineParser::new(&references, &self.options);
        resolve_blocks(&mut blocks, &mut inlines);
        diagnostics.append(&mut inlines.diagnostics);

        debug!(
            "parsed {} lines into {} blocks with {} references ({} diagnostics)",
            lines.len(),
            blocks.len(),
            references.len(),
            diagnostics.len()
        );

        ParseResult {
            document: Document { blocks, references },
            diagnostics,
        }
    }
}

// =============================================================================
// Block structurer
// =============================================================================

/// State shared by the recognizers during block structuring.
pub(crate) struct BlockParser<'o> {
    pub(crate) options: &'o Options,
    /// Current container nesting depth.
    depth: usize,
    /// Diagnostics are dropped while positive.
    quiet: usize,
    nesting_reported: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'o> BlockParser<'o> {
    pub(crate) fn new(options: &'o Options) -> Self {
        Self {
            options,
            depth: 0,
            quiet: 0,
            nesting_reported: false,
            diagnostics: Vec::new(),
        }
    }

    /// Structure `lines` into blocks appended to `out`.
    pub(crate) fn parse_blocks<'a>(&mut self, lines: &[Line<'a>], out: &mut Vec<Block>) {
        let mut pos = 0;
        while pos < lines.len() {
            let rest = &lines[pos..];
            let after_paragraph = out.last().is_some_and(Block::is_paragraph);

            if after_paragraph && rest[0].lazy {
                continue_paragraph(&rest[0], out);
                pos += 1;
                continue;
            }

            let cx = Context {
                after_paragraph,
                ..Context::default()
            };
            match self.recognize(rest, out, cx, |_| true) {
                Some(consumed) => pos += consumed,
                None => {
                    continue_paragraph(&rest[0], out);
                    pos += 1;
                }
            }
        }
    }

    /// Parse the content of a container one level deeper.
    pub(crate) fn parse_container<'a>(&mut self, lines: &[Line<'a>]) -> Vec<Block> {
        self.depth += 1;
        let mut children = Vec::new();
        self.parse_blocks(lines, &mut children);
        self.depth -= 1;
        children
    }

    /// Try the recognizers accepted by `filter` in priority order.
    fn recognize<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
        filter: impl Fn(Recognizer) -> bool,
    ) -> Option<usize> {
        for recognizer in Recognizer::PRIORITY {
            if !filter(recognizer) {
                continue;
            }
            if let Some(consumed) = self.try_parse(recognizer, lines, out, cx) {
                trace!(
                    "{:?} took {} line(s) at line {}",
                    recognizer,
                    consumed,
                    lines[0].number
                );
                return Some(consumed);
            }
        }
        None
    }

    /// Whether `rest[0]`, which lacks its container's prefix, continues the
    /// paragraph left open at the end of `buffer`.
    ///
    /// The buffer is parsed on trial unless its last line already tells:
    /// a blank line closes any paragraph and a lazy line was only accepted
    /// into an open one. If it ends in a paragraph (looking through nested
    /// containers), the line is checked against every recognizer that can
    /// start a block on a lazy line. The line continues the paragraph only
    /// if none of them accepts it.
    pub(crate) fn lazy_continues<'a>(&mut self, buffer: &[Line<'a>], rest: &[Line<'a>]) -> bool {
        if rest[0].is_blank() {
            return false;
        }
        self.quietly(|parser| {
            let open_paragraph = match buffer.last() {
                Some(last) if last.lazy => true,
                Some(last) if last.is_blank() => false,
                _ => ends_with_paragraph(&parser.parse_container(buffer)),
            };
            if !open_paragraph {
                return false;
            }
            let mut scratch = Vec::new();
            parser
                .recognize(rest, &mut scratch, Context::LAZY, Recognizer::starts_block_lazily)
                .is_none()
        })
    }

    /// Whether some block starts at `lines[0]` while a paragraph is open.
    pub(crate) fn interrupts_paragraph<'a>(&mut self, lines: &[Line<'a>]) -> bool {
        self.quietly(|parser| {
            let mut scratch = Vec::new();
            parser
                .recognize(lines, &mut scratch, Context::INTERRUPT, |r| {
                    r != Recognizer::SetextHeading
                })
                .is_some()
        })
    }

    /// Whether `lines[0]` starts a block that ends the body of the table
    /// above it. Another table, a setext underline or a definition cannot.
    pub(crate) fn interrupts_table<'a>(&mut self, lines: &[Line<'a>]) -> bool {
        self.quietly(|parser| {
            let mut scratch = Vec::new();
            parser
                .recognize(lines, &mut scratch, Context::TABLE_ROW, |r| {
                    !matches!(
                        r,
                        Recognizer::Table
                            | Recognizer::SetextHeading
                            | Recognizer::LinkReferenceDefinition
                    )
                })
                .is_some()
        })
    }

    /// Check the nesting guard before opening a container at `line`.
    pub(crate) fn enter_container(&mut self, line: &Line<'_>) -> bool {
        if self.depth < self.options.max_nesting {
            return true;
        }
        if self.quiet == 0 && !self.nesting_reported {
            self.nesting_reported = true;
            warn!(
                "line {}: container nesting exceeds {}; reading the rest as text",
                line.number, self.options.max_nesting
            );
            self.diagnostics
                .push(Diagnostic::nesting_limit(self.options.max_nesting, line.number));
        }
        false
    }

    /// Record a diagnostic unless a trial parse is running.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        if self.quiet == 0 {
            self.diagnostics.push(diagnostic);
        }
    }

    fn quietly<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.quiet += 1;
        let result = f(self);
        self.quiet -= 1;
        result
    }
}

/// Append `line` to the open paragraph, or start a new one.
fn continue_paragraph(line: &Line<'_>, out: &mut Vec<Block>) {
    let text = line.as_str().trim_start_matches([' ', '\t']);
    if let Some(Block::Paragraph(Paragraph {
        content: LeafContent::Raw(raw),
    })) = out.last_mut()
    {
        raw.push('\n');
        raw.push_str(text);
        return;
    }
    out.push(Block::Paragraph(Paragraph {
        content: LeafContent::Raw(text.to_string()),
    }));
}

// =============================================================================
// List combination
// =============================================================================

/// Group adjacent list items of the same kind into lists, innermost first.
///
/// Blank lines between items of one list stay at the end of the item they
/// follow, as separators that render nothing. Blank lines after the last
/// item stay behind the list.
fn combine_lists(blocks: Vec<Block>) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut current: Option<List> = None;
    let mut blanks: Vec<Block> = Vec::new();

    for block in blocks {
        match combine_children(block) {
            Block::ListItem(item) => match current.as_mut() {
                Some(list) if list.marker.continues(&item.marker) => {
                    if !blanks.is_empty() {
                        list.loose = true;
                        if let Some(previous) = list.items.last_mut() {
                            previous.children.append(&mut blanks);
                        }
                    }
                    list.items.push(item);
                }
                _ => {
                    flush_list(&mut out, current.take(), &mut blanks);
                    current = Some(List {
                        marker: item.marker,
                        loose: false,
                        items: vec![item],
                    });
                }
            },
            blank @ Block::BlankLine(_) if current.is_some() => blanks.push(blank),
            other => {
                flush_list(&mut out, current.take(), &mut blanks);
                out.push(other);
            }
        }
    }
    flush_list(&mut out, current, &mut blanks);
    out
}

fn combine_children(block: Block) -> Block {
    match block {
        Block::BlockQuote(mut quote) => {
            quote.children = combine_lists(quote.children);
            Block::BlockQuote(quote)
        }
        Block::ListItem(mut item) => {
            item.children = combine_lists(item.children);
            Block::ListItem(item)
        }
        other => other,
    }
}

fn flush_list(out: &mut Vec<Block>, list: Option<List>, blanks: &mut Vec<Block>) {
    if let Some(mut list) = list {
        list.loose = list.loose || items_are_loose(&list.items);
        out.push(Block::List(list));
    }
    out.append(blanks);
}

/// An item is loose if it is followed by a blank line before the next item,
/// or if it holds a blank line between two other children.
fn items_are_loose(items: &[ListItem]) -> bool {
    items.iter().enumerate().any(|(i, item)| {
        let children = &item.children;
        if i + 1 != items.len() && children.len() > 1 && children.last().is_some_and(Block::is_blank_line) {
            return true;
        }
        let Some(first_content) = children.iter().position(|c| !c.is_blank_line()) else {
            return false;
        };
        let Some(last_content) = children.iter().rposition(|c| !c.is_blank_line()) else {
            return false;
        };
        children[first_content..last_content]
            .iter()
            .any(Block::is_blank_line)
    })
}

// =============================================================================
// References and inline resolution
// =============================================================================

/// Collect every reference definition in document order. The first
/// definition of a label wins; later ones are reported.
fn harvest_references(blocks: &[Block], diagnostics: &mut Vec<Diagnostic>) -> ReferenceMap {
    let mut definitions = Vec::new();
    collect_definitions(blocks, &mut definitions);

    let mut references = ReferenceMap::with_capacity(definitions.len());
    for definition in definitions {
        match references.entry(normalize_label(&definition.label)) {
            Entry::Occupied(_) => {
                diagnostics.push(Diagnostic::duplicate_reference(&definition.label));
            }
            Entry::Vacant(slot) => {
                slot.insert(ReferenceDefinition {
                    destination: definition.destination.clone(),
                    title: definition.title.clone(),
                });
            }
        }
    }
    references
}

fn collect_definitions<'b>(
    blocks: &'b [Block],
    out: &mut Vec<&'b crate::ast::LinkReferenceDefinition>,
) {
    for block in blocks {
        match block {
            Block::LinkReferenceDefinition(definition) => out.push(definition),
            Block::BlockQuote(quote) => collect_definitions(&quote.children, out),
            Block::ListItem(item) => collect_definitions(&item.children, out),
            Block::List(list) => {
                for item in &list.items {
                    collect_definitions(&item.children, out);
                }
            }
            _ => {}
        }
    }
}

/// Replace the raw text of every leaf with its inline nodes.
fn resolve_blocks(blocks: &mut [Block], inlines: &mut InlineParser<'_>) {
    for block in blocks {
        match block {
            Block::BlockQuote(quote) => resolve_blocks(&mut quote.children, inlines),
            Block::ListItem(item) => resolve_blocks(&mut item.children, inlines),
            Block::List(list) => {
                for item in &mut list.items {
                    resolve_blocks(&mut item.children, inlines);
                }
            }
            Block::Paragraph(paragraph) => resolve_leaf(&mut paragraph.content, inlines),
            Block::Heading(heading) => resolve_leaf(&mut heading.content, inlines),
            Block::Table(table) => {
                for row in std::iter::once(&mut table.head).chain(table.body.iter_mut()) {
                    for cell in &mut row.cells {
                        resolve_leaf(&mut cell.content, inlines);
                    }
                }
            }
            _ => {}
        }
    }
}

fn resolve_leaf(content: &mut LeafContent, inlines: &mut InlineParser<'_>) {
    if let LeafContent::Raw(text) = content {
        *content = LeafContent::Inlines(inlines.parse(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ListKind;

    fn parse(input: &str) -> Document {
        Parser::default().parse(input)
    }

    #[test]
    fn test_lazy_paragraph_continuation() {
        let doc = parse("> foo\nbar");
        assert_eq!(doc.blocks.len(), 1);
        let Block::BlockQuote(quote) = &doc.blocks[0] else {
            panic!("expected block quote");
        };
        assert_eq!(quote.children.len(), 1);
        assert!(quote.children[0].is_paragraph());
    }

    #[test]
    fn test_lazy_line_cannot_be_underline() {
        let doc = parse("> foo\n---");
        assert!(matches!(doc.blocks[0], Block::BlockQuote(_)));
        assert!(matches!(doc.blocks[1], Block::ThematicBreak));
    }

    #[test]
    fn test_list_combination_splits_on_sign() {
        let doc = parse("- a\n- b\n+ c");
        let lists: Vec<_> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::List(list) => Some(list),
                _ => None,
            })
            .collect();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].items.len(), 2);
        assert_eq!(lists[1].marker.sign, '+');
        assert_eq!(lists[1].marker.kind, ListKind::Bullet);
    }

    #[test]
    fn test_blank_between_items_is_loose() {
        let Block::List(list) = &parse("- a\n\n- b").blocks[0] else {
            panic!("expected list");
        };
        assert!(list.loose);
        let Block::List(list) = &parse("- a\n- b").blocks[0] else {
            panic!("expected list");
        };
        assert!(!list.loose);
    }

    #[test]
    fn test_blank_between_items_stays_on_item() {
        let Block::List(list) = &parse("- a\n\n- b").blocks[0] else {
            panic!("expected list");
        };
        assert!(list.items[0].children.last().is_some_and(Block::is_blank_line));
        assert!(!list.items[1].children.iter().any(Block::is_blank_line));
    }

    #[test]
    fn test_first_definition_wins() {
        let result = Parser::default().parse_with_diagnostics("[x]: /a\n[X]: /b\n");
        assert_eq!(result.document.references()["x"].destination, "/a");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_nesting_limit() {
        let result = Parser::default()
            .with_max_nesting(2)
            .parse_with_diagnostics("> > > deep");
        assert_eq!(result.diagnostics.len(), 1);
        let Block::BlockQuote(outer) = &result.document.blocks[0] else {
            panic!("expected block quote");
        };
        let Block::BlockQuote(inner) = &outer.children[0] else {
            panic!("expected nested block quote");
        };
        assert!(inner.children[0].is_paragraph());
    }
}
