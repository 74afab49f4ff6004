//! Document tree types.
//!
//! The tree is built in two passes. Block structuring produces blocks whose
//! leaf text is still raw Markdown ([`LeafContent::Raw`]); inline resolution
//! then replaces each leaf's text with its inline nodes exactly once.
//!
//! Every node exclusively owns its children. Rendering never mutates the tree.

use std::collections::HashMap;

/// Label → definition map built from every link reference definition.
///
/// Keys are normalized labels (see [`crate::text::normalize_label`]).
pub type ReferenceMap = HashMap<String, ReferenceDefinition>;

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Top-level blocks in document order.
    pub blocks: Vec<Block>,
    /// Reference definitions harvested before inline resolution.
    pub references: ReferenceMap,
}

impl Document {
    /// The harvested label → definition map.
    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }
}

/// The target of a reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDefinition {
    pub destination: String,
    pub title: Option<String>,
}

/// Text of a leaf block, before or after inline resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafContent {
    /// Raw Markdown awaiting inline resolution.
    Raw(String),
    /// Resolved inline nodes.
    Inlines(Vec<Inline>),
}

impl Default for LeafContent {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

impl LeafContent {
    /// The resolved inline nodes, or an empty slice before resolution.
    pub fn inlines(&self) -> &[Inline] {
        match self {
            Self::Inlines(inlines) => inlines,
            Self::Raw(_) => &[],
        }
    }

    /// Raw text, if inline resolution has not run yet.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Raw(text) => Some(text),
            Self::Inlines(_) => None,
        }
    }
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `>` block quotation.
    BlockQuote(BlockQuote),
    /// A run of list items sharing marker kind and sign.
    List(List),
    /// A single list item. Only present before list combination.
    ListItem(ListItem),
    Paragraph(Paragraph),
    /// ATX (`#`) or setext (underlined) heading.
    Heading(Heading),
    /// Code indented by four or more columns.
    IndentedCode(IndentedCode),
    /// Code between backtick or tilde fences.
    FencedCode(FencedCode),
    /// Raw HTML block, rendered as is.
    Html(HtmlBlock),
    ThematicBreak,
    /// A line of spaces and tabs. Kept for list tightness, never rendered.
    BlankLine(BlankLine),
    /// `[label]: destination "title"`. Never rendered.
    LinkReferenceDefinition(LinkReferenceDefinition),
    /// `$$ ... $$` display math.
    Math(MathBlock),
    Table(Table),
}

impl Block {
    #[inline]
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    #[inline]
    pub fn is_blank_line(&self) -> bool {
        matches!(self, Block::BlankLine(_))
    }

    /// Child blocks of a container, or `None` for leaves and lists.
    pub fn children(&self) -> Option<&[Block]> {
        match self {
            Block::BlockQuote(quote) => Some(&quote.children),
            Block::ListItem(item) => Some(&item.children),
            _ => None,
        }
    }
}

/// Whether the last block, looking through nested containers, is a paragraph.
pub fn ends_with_paragraph(blocks: &[Block]) -> bool {
    match blocks.last() {
        Some(Block::Paragraph(_)) => true,
        Some(Block::BlockQuote(quote)) => ends_with_paragraph(&quote.children),
        Some(Block::ListItem(item)) => ends_with_paragraph(&item.children),
        Some(Block::List(list)) => list
            .items
            .last()
            .is_some_and(|item| ends_with_paragraph(&item.children)),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockQuote {
    pub children: Vec<Block>,
}

/// Kind of list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `-`, `+` or `*`.
    Bullet,
    /// Digits followed by `.` or `)`.
    Ordered,
}

/// A list item marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    pub kind: ListKind,
    /// The bullet character, or the `.`/`)` after an ordinal.
    pub sign: char,
    /// Start number of an ordered item; 1 for bullets.
    pub start: u32,
}

impl ListMarker {
    /// Items continue the same list only if kind and sign agree.
    #[inline]
    pub fn continues(&self, other: &ListMarker) -> bool {
        self.kind == other.kind && self.sign == other.sign
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub marker: ListMarker,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    /// Marker of the first item.
    pub marker: ListMarker,
    /// Loose lists wrap item paragraphs in `<p>`.
    pub loose: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub content: LeafContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    Atx,
    Setext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Heading level (1-6; setext headings are 1 or 2).
    pub level: u8,
    pub kind: HeadingKind,
    pub content: LeafContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentedCode {
    /// Code lines joined with `\n`, including the final line ending.
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedCode {
    /// Raw info string after the opening fence, trimmed.
    pub info: String,
    /// Body lines joined with `\n`, including the final line ending.
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlBlock {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankLine {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReferenceDefinition {
    /// Label as written, without brackets.
    pub label: String,
    pub destination: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathBlock {
    /// Source text including the `$$` delimiters.
    pub content: String,
}

/// Column alignment from a table's delimiter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Right,
    Center,
}

impl Alignment {
    /// Value of the `align` attribute, if any.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Alignment::None => None,
            Alignment::Left => Some("left"),
            Alignment::Right => Some("right"),
            Alignment::Center => Some("center"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub head: TableRow,
    /// Body rows; empty when the table has only a header.
    pub body: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Header,
    Data,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub kind: CellKind,
    pub align: Alignment,
    pub content: LeafContent,
}

/// Inline nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Literal text. Escapes and entities are resolved at render time.
    Text(String),
    /// `` `code` `` with line endings folded to spaces.
    CodeSpan(String),
    Autolink(Autolink),
    /// Raw inline HTML.
    HtmlTag(String),
    HardBreak,
    SoftBreak,
    /// `[[destination|display]]`
    WikiLink(WikiLink),
    /// `![[source|attribute]]`
    EmbeddedFile(EmbeddedFile),
    /// `$$...$$` inside a paragraph, delimiters included.
    Math(String),
    /// `$...$`, delimiters included.
    MathSpan(String),
    Emphasis(Emphasis),
    /// `~text~` or `~~text~~`
    Strikethrough(Vec<Inline>),
    Link(Link),
    Image(Image),
}

impl Inline {
    /// Append the plain text of this node, as used for image `alt`.
    pub fn plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(&crate::text::unescape(text)),
            Inline::CodeSpan(code) => out.push_str(code),
            Inline::Autolink(link) => out.push_str(&link.label),
            Inline::HtmlTag(_) => {}
            Inline::HardBreak | Inline::SoftBreak => out.push('\n'),
            Inline::WikiLink(link) => {
                out.push_str(link.display.as_deref().unwrap_or(&link.destination))
            }
            Inline::EmbeddedFile(file) => out.push_str(&file.source),
            Inline::Math(math) | Inline::MathSpan(math) => out.push_str(math),
            Inline::Emphasis(Emphasis { children, .. })
            | Inline::Strikethrough(children)
            | Inline::Link(Link { children, .. })
            | Inline::Image(Image { children, .. }) => {
                for child in children {
                    child.plain_text(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autolink {
    /// Link target; email autolinks carry a `mailto:` prefix.
    pub destination: String,
    /// Text shown for the link.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    pub display: Option<String>,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub source: String,
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emphasis {
    /// `<strong>` when set, `<em>` otherwise.
    pub strong: bool,
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub children: Vec<Inline>,
    /// Raw destination; escapes and entities are resolved when rendering.
    pub destination: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Description, flattened to text for `alt`.
    pub children: Vec<Inline>,
    pub source: String,
    pub title: Option<String>,
}
