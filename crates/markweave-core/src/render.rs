//! HTML rendering.
//!
//! Rendering is a read-only walk over a resolved [`Document`]. Block output
//! is joined with `\n`; blank lines and reference definitions produce
//! nothing. Tightness flows from a list into its items and decides whether
//! their paragraphs are wrapped in `<p>`.

use std::fmt::Write;

use crate::ast::{
    Block, Document, EmbeddedFile, FencedCode, Heading, Image, Inline, Link, List, ListItem,
    ListKind, Table, TableCell, TableRow, WikiLink,
};
use crate::text::{encode_url, escape_html, normalize_url, unescape};

impl Document {
    /// Render the document to HTML.
    ///
    /// ```rust
    /// let doc = markweave_core::parse("# Title\n\nSome *text*.");
    /// assert_eq!(doc.render_html(), "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n");
    /// ```
    pub fn render_html(&self) -> String {
        let body = join_blocks(&self.blocks, false);
        if body.is_empty() {
            return body;
        }
        let mut html = body.replace('\0', "\u{FFFD}");
        html.push('\n');
        html
    }
}

/// Render `blocks` and join the visible ones with `\n`.
fn join_blocks(blocks: &[Block], tight: bool) -> String {
    let mut out = String::new();
    for html in blocks.iter().filter_map(|block| render_block(block, tight)) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&html);
    }
    out
}

/// HTML for one block, or `None` for blocks that render nothing.
pub(crate) fn render_block(block: &Block, tight: bool) -> Option<String> {
    let html = match block {
        Block::BlankLine(_) | Block::LinkReferenceDefinition(_) => return None,
        Block::BlockQuote(quote) => {
            let content = join_blocks(&quote.children, false);
            if content.is_empty() {
                "<blockquote>\n</blockquote>".to_string()
            } else {
                format!("<blockquote>\n{}\n</blockquote>", content)
            }
        }
        Block::List(list) => render_list(list),
        Block::ListItem(item) => render_item(item, tight),
        Block::Paragraph(paragraph) => {
            let inlines = render_inlines(paragraph.content.inlines());
            if tight {
                inlines
            } else {
                format!("<p>{}</p>", inlines)
            }
        }
        Block::Heading(Heading { level, content, .. }) => {
            format!("<h{0}>{1}</h{0}>", level, render_inlines(content.inlines()))
        }
        Block::IndentedCode(code) => format!("<pre><code>{}</code></pre>", escape_html(&code.code)),
        Block::FencedCode(code) => render_fenced_code(code),
        Block::Html(html) => html.content.clone(),
        Block::ThematicBreak => "<hr />".to_string(),
        Block::Math(math) => escape_html(&math.content).into_owned(),
        Block::Table(table) => render_table(table),
    };
    Some(html)
}

fn render_list(list: &List) -> String {
    let items = list
        .items
        .iter()
        .map(|item| render_item(item, !list.loose))
        .collect::<Vec<_>>()
        .join("\n");
    match list.marker.kind {
        ListKind::Bullet => format!("<ul>\n{}\n</ul>", items),
        ListKind::Ordered if list.marker.start == 1 => format!("<ol>\n{}\n</ol>", items),
        ListKind::Ordered => format!("<ol start=\"{}\">\n{}\n</ol>", list.marker.start, items),
    }
}

fn render_item(item: &ListItem, tight: bool) -> String {
    let visible: Vec<&Block> = item
        .children
        .iter()
        .filter(|block| !matches!(block, Block::BlankLine(_) | Block::LinkReferenceDefinition(_)))
        .collect();
    let content = visible
        .iter()
        .filter_map(|block| render_block(block, tight))
        .collect::<Vec<_>>()
        .join("\n");
    if content.is_empty() {
        return "<li></li>".to_string();
    }

    let opens_bare = tight && visible.first().is_some_and(|block| block.is_paragraph());
    let closes_bare = tight && visible.last().is_some_and(|block| block.is_paragraph());
    format!(
        "<li>{}{}{}</li>",
        if opens_bare { "" } else { "\n" },
        content,
        if closes_bare { "" } else { "\n" }
    )
}

fn render_fenced_code(code: &FencedCode) -> String {
    let info = unescape(&code.info);
    match info.split_whitespace().next() {
        Some(language) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html(language),
            escape_html(&code.code)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(&code.code)),
    }
}

// =============================================================================
// Tables
// =============================================================================

fn render_table(table: &Table) -> String {
    let mut html = String::from("<table>\n<thead>\n");
    html.push_str(&render_row(&table.head));
    html.push_str("\n</thead>");
    if !table.body.is_empty() {
        html.push_str("\n<tbody>\n");
        let rows: Vec<String> = table.body.iter().map(render_row).collect();
        html.push_str(&rows.join("\n"));
        html.push_str("\n</tbody>");
    }
    html.push_str("\n</table>");
    html
}

fn render_row(row: &TableRow) -> String {
    let cells: Vec<String> = row.cells.iter().map(render_cell).collect();
    format!("<tr>\n{}\n</tr>", cells.join("\n"))
}

fn render_cell(cell: &TableCell) -> String {
    let tag = match cell.kind {
        crate::ast::CellKind::Header => "th",
        crate::ast::CellKind::Data => "td",
    };
    let content = render_inlines(cell.content.inlines());
    match cell.align.as_str() {
        Some(align) => format!("<{0} align=\"{1}\">{2}</{0}>", tag, align, content),
        None => format!("<{0}>{1}</{0}>", tag, content),
    }
}

// =============================================================================
// Inlines
// =============================================================================

pub(crate) fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        render_inline(inline, &mut out);
    }
    out
}

fn render_inline(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) => out.push_str(&escape_html(&unescape(text))),
        Inline::CodeSpan(code) => {
            out.push_str("<code>");
            out.push_str(&escape_html(code));
            out.push_str("</code>");
        }
        Inline::Autolink(link) => {
            let _ = write!(
                out,
                "<a href=\"{}\">{}</a>",
                escape_html(&encode_url(&link.destination)),
                escape_html(&link.label)
            );
        }
        Inline::HtmlTag(tag) => out.push_str(tag),
        Inline::HardBreak => out.push_str("<br />\n"),
        Inline::SoftBreak => out.push('\n'),
        Inline::WikiLink(WikiLink {
            display,
            destination,
        }) => {
            let _ = write!(
                out,
                "<a class=\"wiki-link\" href=\"{}\">{}</a>",
                escape_html(destination),
                escape_html(display.as_deref().unwrap_or(destination))
            );
        }
        Inline::EmbeddedFile(EmbeddedFile { source, attribute }) => {
            let _ = write!(out, "<div class=\"embedded-file\" data-src=\"{}\"", escape_html(source));
            if let Some(attribute) = attribute {
                let _ = write!(out, " data-attribute=\"{}\"", escape_html(attribute));
            }
            out.push_str("/>");
        }
        Inline::Math(math) | Inline::MathSpan(math) => out.push_str(&escape_html(math)),
        Inline::Emphasis(emphasis) => {
            let tag = if emphasis.strong { "strong" } else { "em" };
            let _ = write!(out, "<{0}>{1}</{0}>", tag, render_inlines(&emphasis.children));
        }
        Inline::Strikethrough(children) => {
            let _ = write!(out, "<del>{}</del>", render_inlines(children));
        }
        Inline::Link(Link {
            children,
            destination,
            title,
        }) => {
            let _ = write!(out, "<a href=\"{}\"", escape_html(&normalize_url(destination)));
            push_title(out, title.as_deref());
            let _ = write!(out, ">{}</a>", render_inlines(children));
        }
        Inline::Image(Image {
            children,
            source,
            title,
        }) => {
            let mut alt = String::new();
            for child in children {
                child.plain_text(&mut alt);
            }
            let _ = write!(
                out,
                "<img src=\"{}\" alt=\"{}\"",
                escape_html(&normalize_url(source)),
                escape_html(&alt)
            );
            push_title(out, title.as_deref());
            out.push_str(" />");
        }
    }
}

fn push_title(out: &mut String, title: Option<&str>) {
    if let Some(title) = title {
        let _ = write!(out, " title=\"{}\"", escape_html(&unescape(title)));
    }
}
