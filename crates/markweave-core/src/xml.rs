//! AST element tree in the CommonMark XML format.
//!
//! [`Document::render_ast`] mirrors the document as generic elements named
//! after the CommonMark DTD (plus `table_*`, `math_*`, `wiki-link` and
//! `file` for the extensions). [`Document::render_xml`] serializes that tree.

use std::fmt::Write;

use crate::ast::{
    Alignment, Block, CellKind, Document, Inline, LeafContent, List, ListItem, ListKind, TableRow,
};
use crate::text::{escape_html, unescape};

/// XML namespace of the document element.
pub const NAMESPACE: &str = "http://commonmark.org/xml/1.0";

const XML_HEADER: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE document SYSTEM \"CommonMark.dtd\">\n";

/// A named element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<AstNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Element(AstElement),
    Text(String),
}

impl AstElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(AstNode::Text(text.into()));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = AstElement>) -> Self {
        self.children
            .extend(children.into_iter().map(AstNode::Element));
        self
    }

    /// Value of the attribute `name`, if set.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &AstElement> {
        self.children.iter().filter_map(|child| match child {
            AstNode::Element(element) => Some(element),
            AstNode::Text(_) => None,
        })
    }

    /// Concatenated text of this element's direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                AstNode::Text(text) => Some(text.as_str()),
                AstNode::Element(_) => None,
            })
            .collect()
    }

    /// Serialize this element and its descendants, two spaces per level.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(0, &mut out);
        out
    }

    fn write_xml(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{}<{}", indent, self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
        }

        if self.children.is_empty() {
            out.push_str(" />\n");
            return;
        }
        if self.children.iter().all(|c| matches!(c, AstNode::Text(_))) {
            let _ = writeln!(out, ">{}</{}>", escape_html(&self.text()), self.name);
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            match child {
                AstNode::Element(element) => element.write_xml(depth + 1, out),
                AstNode::Text(text) => {
                    let _ = writeln!(out, "{}  {}", indent, escape_html(text));
                }
            }
        }
        let _ = writeln!(out, "{}</{}>", indent, self.name);
    }
}

impl Document {
    /// Mirror the document as an AST element tree.
    pub fn render_ast(&self) -> AstElement {
        AstElement::new("document")
            .with_attribute("xmlns", NAMESPACE)
            .with_children(self.blocks.iter().filter_map(block_element))
    }

    /// Serialize [`Document::render_ast`] as an XML document.
    ///
    /// ```rust
    /// let xml = markweave_core::parse("Hi").render_xml();
    /// assert!(xml.contains("<paragraph>\n    <text>Hi</text>\n  </paragraph>"));
    /// ```
    pub fn render_xml(&self) -> String {
        let mut xml = String::from(XML_HEADER);
        xml.push_str(&self.render_ast().to_xml());
        xml
    }
}

// =============================================================================
// Blocks
// =============================================================================

fn block_element(block: &Block) -> Option<AstElement> {
    let element = match block {
        Block::BlankLine(_) | Block::LinkReferenceDefinition(_) => return None,
        Block::BlockQuote(quote) => {
            AstElement::new("block_quote").with_children(quote.children.iter().filter_map(block_element))
        }
        Block::List(list) => list_element(list),
        Block::ListItem(item) => item_element(item),
        Block::Paragraph(paragraph) => leaf_element("paragraph", &paragraph.content),
        Block::Heading(heading) => leaf_element("heading", &heading.content)
            .with_attribute("level", heading.level.to_string()),
        Block::IndentedCode(code) => AstElement::new("code_block").with_text(code.code.as_str()),
        Block::FencedCode(code) => {
            let element = AstElement::new("code_block");
            let element = if code.info.is_empty() {
                element
            } else {
                element.with_attribute("info", unescape(&code.info))
            };
            element.with_text(code.code.as_str())
        }
        Block::Html(html) => AstElement::new("html_block").with_text(html.content.as_str()),
        Block::ThematicBreak => AstElement::new("thematic_break"),
        Block::Math(math) => AstElement::new("math_block").with_text(math.content.as_str()),
        Block::Table(table) => {
            let head = AstElement::new("table_head").with_children([row_element(&table.head)]);
            let mut element = AstElement::new("table").with_children([head]);
            if !table.body.is_empty() {
                let body = AstElement::new("table_body")
                    .with_children(table.body.iter().map(row_element));
                element = element.with_children([body]);
            }
            element
        }
    };
    Some(element)
}

fn list_element(list: &List) -> AstElement {
    let marker = list.marker;
    let mut element = AstElement::new("list");
    element = match marker.kind {
        ListKind::Bullet => element.with_attribute("type", "bullet"),
        ListKind::Ordered => element
            .with_attribute("type", "ordered")
            .with_attribute("start", marker.start.to_string()),
    };
    element = element.with_attribute("tight", (!list.loose).to_string());
    if marker.kind == ListKind::Ordered {
        let delimiter = if marker.sign == ')' { "paren" } else { "period" };
        element = element.with_attribute("delimiter", delimiter);
    }
    element.with_children(list.items.iter().map(item_element))
}

fn item_element(item: &ListItem) -> AstElement {
    AstElement::new("item").with_children(item.children.iter().filter_map(block_element))
}

fn row_element(row: &TableRow) -> AstElement {
    AstElement::new("table_row").with_children(row.cells.iter().map(|cell| {
        let name = match cell.kind {
            CellKind::Header => "header_cell",
            CellKind::Data => "data_cell",
        };
        let align = match cell.align {
            Alignment::None => "none",
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Center => "center",
        };
        leaf_element(name, &cell.content).with_attribute("align", align)
    }))
}

fn leaf_element(name: &str, content: &LeafContent) -> AstElement {
    match content {
        LeafContent::Inlines(inlines) => {
            AstElement::new(name).with_children(inlines.iter().map(inline_element))
        }
        LeafContent::Raw(text) => AstElement::new(name).with_text(text.as_str()),
    }
}

// =============================================================================
// Inlines
// =============================================================================

fn inline_element(inline: &Inline) -> AstElement {
    match inline {
        Inline::Text(text) => AstElement::new("text").with_text(unescape(text)),
        Inline::CodeSpan(code) => AstElement::new("code").with_text(code.as_str()),
        Inline::Autolink(link) => AstElement::new("link")
            .with_attribute("destination", link.destination.as_str())
            .with_attribute("title", "")
            .with_children([AstElement::new("text").with_text(link.label.as_str())]),
        Inline::HtmlTag(tag) => AstElement::new("html_inline").with_text(tag.as_str()),
        Inline::HardBreak => AstElement::new("linebreak"),
        Inline::SoftBreak => AstElement::new("softbreak"),
        Inline::WikiLink(link) => {
            let mut element = AstElement::new("wiki-link");
            if let Some(display) = &link.display {
                element = element.with_attribute("display", display.as_str());
            }
            element.with_attribute("destination", link.destination.as_str())
        }
        Inline::EmbeddedFile(file) => {
            let element = AstElement::new("file").with_attribute("source", file.source.as_str());
            match &file.attribute {
                Some(attribute) => element.with_attribute("attribute", attribute.as_str()),
                None => element,
            }
        }
        Inline::Math(math) => AstElement::new("math").with_text(math.as_str()),
        Inline::MathSpan(math) => AstElement::new("math_span").with_text(math.as_str()),
        Inline::Emphasis(emphasis) => {
            AstElement::new(if emphasis.strong { "strong" } else { "emph" })
                .with_children(emphasis.children.iter().map(inline_element))
        }
        Inline::Strikethrough(children) => {
            AstElement::new("strikethrough").with_children(children.iter().map(inline_element))
        }
        Inline::Link(link) => AstElement::new("link")
            .with_attribute("destination", unescape(&link.destination))
            .with_attribute("title", link.title.as_deref().map(unescape).unwrap_or_default())
            .with_children(link.children.iter().map(inline_element)),
        Inline::Image(image) => AstElement::new("image")
            .with_attribute("destination", unescape(&image.source))
            .with_attribute("title", image.title.as_deref().map(unescape).unwrap_or_default())
            .with_children(image.children.iter().map(inline_element)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_only_elements_stay_on_one_line() {
        let element = AstElement::new("paragraph")
            .with_children([AstElement::new("text").with_text("a < b")]);
        assert_eq!(
            element.to_xml(),
            "<paragraph>\n  <text>a &lt; b</text>\n</paragraph>\n"
        );
    }

    #[test]
    fn test_empty_elements_self_close() {
        let element = AstElement::new("thematic_break");
        assert_eq!(element.to_xml(), "<thematic_break />\n");
    }

    #[test]
    fn test_attribute_lookup() {
        let element = AstElement::new("heading").with_attribute("level", "2");
        assert_eq!(element.attribute("level"), Some("2"));
        assert_eq!(element.attribute("missing"), None);
    }

    #[test]
    fn test_document_has_namespace() {
        let ast = Document::default().render_ast();
        assert_eq!(ast.name, "document");
        assert_eq!(ast.attribute("xmlns"), Some(NAMESPACE));
        assert!(ast.children.is_empty());
    }
}
