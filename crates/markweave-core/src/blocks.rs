//! Block recognizers.
//!
//! Each recognizer looks at the lines starting at the current position and
//! either declines or appends one or more blocks to `out`, returning the
//! number of lines it consumed. Recognizers are tried in [`Recognizer::PRIORITY`]
//! order; the first one that accepts wins. Lines nobody claims become
//! paragraph text.

use crate::ast::{
    Alignment, BlankLine, Block, BlockQuote, CellKind, FencedCode, Heading, HeadingKind,
    HtmlBlock, IndentedCode, LeafContent, LinkReferenceDefinition, ListItem, ListKind,
    ListMarker, MathBlock, Table, TableCell, TableRow,
};
use crate::error::Diagnostic;
use crate::html::HtmlBlockKind;
use crate::lexer::{count_leading_space, tab_width, Line};
use crate::options::Extension;
use crate::parser::BlockParser;
use crate::text::{
    find_unescaped, is_space_or_tab, read_link_destination, read_link_label, read_link_title,
    rest_of_line_blank, skip_inner_spaces, trim_spaces,
};

/// Longest ordinal accepted in an ordered list marker, in digits.
const MAX_ORDINAL_DIGITS: usize = 9;

/// The block recognizers, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recognizer {
    ThematicBreak,
    BlockQuote,
    ListItem,
    BlankLine,
    AtxHeading,
    FencedCode,
    HtmlBlock,
    IndentedCode,
    LinkReferenceDefinition,
    SetextHeading,
    Table,
    MathBlock,
}

impl Recognizer {
    pub(crate) const PRIORITY: [Recognizer; 12] = [
        Recognizer::ThematicBreak,
        Recognizer::BlockQuote,
        Recognizer::ListItem,
        Recognizer::BlankLine,
        Recognizer::AtxHeading,
        Recognizer::FencedCode,
        Recognizer::HtmlBlock,
        Recognizer::IndentedCode,
        Recognizer::LinkReferenceDefinition,
        Recognizer::SetextHeading,
        Recognizer::Table,
        Recognizer::MathBlock,
    ];

    /// Whether this recognizer may end a lazy paragraph continuation.
    ///
    /// Indented code, setext underlines, definitions and tables never start
    /// on a line that could instead continue a paragraph.
    #[inline]
    pub(crate) fn starts_block_lazily(self) -> bool {
        !matches!(
            self,
            Recognizer::IndentedCode
                | Recognizer::SetextHeading
                | Recognizer::LinkReferenceDefinition
                | Recognizer::Table
        )
    }

    #[inline]
    fn extension(self) -> Option<Extension> {
        match self {
            Recognizer::Table => Some(Extension::Tables),
            Recognizer::MathBlock => Some(Extension::Math),
            _ => None,
        }
    }
}

/// What precedes the line being recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Context {
    /// The previous sibling is an open paragraph.
    pub after_paragraph: bool,
    /// The line might be a lazy continuation of a paragraph inside a
    /// container that lost its prefix.
    pub lazy_paragraph: bool,
    /// Only ask whether a block starts at the first line. Containers and
    /// multi-line leaves accept on their opening line without collecting
    /// the rest, and the blocks pushed are not meaningful.
    pub opening_only: bool,
}

impl Context {
    /// A paragraph is open and the line is checked for an interruption.
    pub(crate) const INTERRUPT: Context = Context {
        after_paragraph: true,
        lazy_paragraph: false,
        opening_only: true,
    };

    pub(crate) const LAZY: Context = Context {
        after_paragraph: false,
        lazy_paragraph: true,
        opening_only: true,
    };

    /// A table row is checked for the start of another block.
    pub(crate) const TABLE_ROW: Context = Context {
        after_paragraph: false,
        lazy_paragraph: false,
        opening_only: true,
    };
}

impl BlockParser<'_> {
    /// Run a single recognizer at `lines[0]`.
    pub(crate) fn try_parse<'a>(
        &mut self,
        recognizer: Recognizer,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        if let Some(extension) = recognizer.extension() {
            if !self.options.has(extension) {
                return None;
            }
        }
        match recognizer {
            Recognizer::ThematicBreak => thematic_break(&lines[0]).then(|| {
                out.push(Block::ThematicBreak);
                1
            }),
            Recognizer::BlockQuote => self.block_quote(lines, out, cx),
            Recognizer::ListItem => self.list_item(lines, out, cx),
            Recognizer::BlankLine => lines[0].is_blank().then(|| {
                out.push(Block::BlankLine(BlankLine {
                    content: lines[0].as_str().to_string(),
                }));
                1
            }),
            Recognizer::AtxHeading => atx_heading(&lines[0]).map(|heading| {
                out.push(Block::Heading(heading));
                1
            }),
            Recognizer::FencedCode => self.fenced_code(lines, out, cx),
            Recognizer::HtmlBlock => self.html_block(lines, out, cx),
            Recognizer::IndentedCode => indented_code(lines, out, cx),
            Recognizer::LinkReferenceDefinition => link_reference_definition(lines, out, cx),
            Recognizer::SetextHeading => self.setext_heading(lines, out, cx),
            Recognizer::Table => self.table(lines, out, cx),
            Recognizer::MathBlock => math_block(lines, out),
        }
    }

    // =========================================================================
    // Containers
    // =========================================================================

    fn block_quote<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        let first = strip_quote_marker(&lines[0])?;
        if !self.enter_container(&lines[0]) {
            return None;
        }
        if cx.opening_only {
            return Some(1);
        }

        let mut buffer = vec![first];
        let mut consumed = 1;
        while let Some(line) = lines.get(consumed) {
            if let Some(content) = strip_quote_marker(line) {
                buffer.push(content);
            } else if self.lazy_continues(&buffer, &lines[consumed..]) {
                buffer.push(line.clone().into_lazy());
            } else {
                break;
            }
            consumed += 1;
        }

        let children = self.parse_container(&buffer);
        out.push(Block::BlockQuote(BlockQuote { children }));
        Some(consumed)
    }

    fn list_item<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        let first = &lines[0];
        let indent = first.indent(4);
        if indent.columns >= 4 {
            return None;
        }
        let (marker, marker_len) = list_marker(&first.as_str()[indent.index..])?;
        if cx.after_paragraph && marker.kind == ListKind::Ordered && marker.start != 1 {
            return None;
        }

        let start = indent.index + marker_len;
        let column = first.column + indent.columns + marker_len;
        let after_marker = first.advance(start, column);
        let begins_blank = after_marker.is_blank();
        if begins_blank && cx.after_paragraph {
            return None;
        }

        let mut width = indent.columns + marker_len;
        let content = if begins_blank {
            width += 1;
            after_marker.with_text(String::new())
        } else {
            let separator = after_marker.indent(5);
            match separator.columns {
                0 => return None,
                // Code in the first line: the item content starts one column
                // after the marker and the rest stays indented.
                5 => {
                    width += 1;
                    after_marker.remainder(
                        separator.index,
                        column + 1 + 4 + separator.leftover,
                        4 + separator.leftover,
                    )
                }
                n => {
                    width += n;
                    after_marker.advance(separator.index, column + n)
                }
            }
        };

        if !self.enter_container(first) {
            return None;
        }
        if cx.opening_only {
            return Some(1);
        }

        if begins_blank && lines.get(1).is_some_and(Line::is_blank) {
            out.push(Block::ListItem(ListItem {
                marker,
                children: Vec::new(),
            }));
            out.push(Block::BlankLine(BlankLine {
                content: String::new(),
            }));
            return Some(1);
        }

        let mut buffer = vec![content];
        let mut consumed = 1;
        while let Some(line) = lines.get(consumed) {
            if let Some(content) = list_item_content(line, width) {
                buffer.push(content);
            } else if self.lazy_continues(&buffer, &lines[consumed..]) {
                buffer.push(line.clone().into_lazy());
            } else {
                break;
            }
            consumed += 1;
        }

        let mut children = self.parse_container(&buffer);
        let mut trailing = Vec::new();
        while children.len() > 1 && children.last().is_some_and(Block::is_blank_line) {
            trailing.extend(children.pop());
        }
        out.push(Block::ListItem(ListItem { marker, children }));
        out.extend(trailing.into_iter().rev());
        Some(consumed)
    }

    // =========================================================================
    // Leaves that report diagnostics or look ahead
    // =========================================================================

    fn fenced_code<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        let first = &lines[0];
        let indent = first.indent(4);
        if indent.columns >= 4 {
            return None;
        }
        let opening = &first.as_str()[indent.index..];
        let fence_char = match opening.bytes().next()? {
            c @ (b'`' | b'~') => c,
            _ => return None,
        };
        let fence_len = opening.bytes().take_while(|b| *b == fence_char).count();
        if fence_len < 3 {
            return None;
        }
        let info = trim_spaces(&opening[fence_len..]);
        if fence_char == b'`' && info.contains('`') {
            return None;
        }
        if cx.opening_only {
            return Some(1);
        }

        let mut code = String::new();
        let mut consumed = lines.len();
        let mut closed = false;
        for (i, line) in lines.iter().enumerate().skip(1) {
            if closes_fence(line, fence_char, fence_len) {
                consumed = i + 1;
                closed = true;
                break;
            }
            let strip = line.indent(indent.columns);
            push_spaces(&mut code, strip.leftover);
            code.push_str(&line.as_str()[strip.index..]);
            code.push('\n');
        }
        if !closed {
            self.report(Diagnostic::unclosed_fence(&opening[..fence_len], first.number));
        }

        out.push(Block::FencedCode(FencedCode {
            info: info.to_string(),
            code,
        }));
        Some(consumed)
    }

    fn html_block<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        let first = &lines[0];
        let indent = first.indent(4);
        if indent.columns >= 4 {
            return None;
        }
        let kind = HtmlBlockKind::classify(&first.as_str()[indent.index..])?;
        if !kind.can_interrupt_paragraph() && (cx.after_paragraph || cx.lazy_paragraph) {
            return None;
        }
        if cx.opening_only {
            return Some(1);
        }

        let mut content = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                content.push('\n');
            }
            content.push_str(line.as_str());
            let ends = kind.ends_on(line.as_str())
                || (kind.ends_at_blank_line() && lines.get(i + 1).is_some_and(Line::is_blank));
            if ends {
                out.push(Block::Html(HtmlBlock { content }));
                return Some(i + 1);
            }
        }

        if !kind.ends_at_blank_line() {
            self.report(Diagnostic::unclosed_html_block(first.number));
        }
        out.push(Block::Html(HtmlBlock { content }));
        Some(lines.len())
    }

    fn setext_heading<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        if cx.after_paragraph {
            return None;
        }
        let first = &lines[0];
        let indent = first.indent(4);
        if indent.columns >= 4 || first.is_blank() || setext_underline(first).is_some() {
            return None;
        }

        let mut content = String::from(&first.as_str()[indent.index..]);
        for (i, line) in lines.iter().enumerate().skip(1) {
            if line.is_blank() {
                return None;
            }
            if !line.lazy {
                if let Some(level) = setext_underline(line) {
                    out.push(Block::Heading(Heading {
                        level,
                        kind: HeadingKind::Setext,
                        content: LeafContent::Raw(trim_spaces(&content).to_string()),
                    }));
                    return Some(i + 1);
                }
            }
            if !line.lazy && self.interrupts_paragraph(&lines[i..]) {
                return None;
            }
            content.push('\n');
            content.push_str(line.as_str().trim_start_matches([' ', '\t']));
        }
        None
    }

    fn table<'a>(
        &mut self,
        lines: &[Line<'a>],
        out: &mut Vec<Block>,
        cx: Context,
    ) -> Option<usize> {
        let head_line = &lines[0];
        let delimiter_line = lines.get(1)?;
        if head_line.indent(4).columns >= 4 || delimiter_line.indent(4).columns >= 4 {
            return None;
        }
        if !head_line.as_str().contains('|') && !delimiter_line.as_str().contains('|') {
            return None;
        }
        let header = split_row(head_line.as_str());
        let aligns = delimiter_row(delimiter_line.as_str())?;
        if header.len() != aligns.len() {
            return None;
        }

        if cx.opening_only {
            return Some(2);
        }

        let head = table_row(header, &aligns, CellKind::Header);
        let mut body = Vec::new();
        let mut consumed = 2;
        while let Some(line) = lines.get(consumed) {
            if line.indent(4).columns >= 4 || self.interrupts_table(&lines[consumed..]) {
                break;
            }
            let mut cells = split_row(line.as_str());
            cells.resize(aligns.len(), String::new());
            body.push(table_row(cells, &aligns, CellKind::Data));
            consumed += 1;
        }

        out.push(Block::Table(Table { head, body }));
        Some(consumed)
    }
}

// =============================================================================
// Container helpers
// =============================================================================

/// Strip a `>` marker and one optional following space from `line`.
///
/// A tab after the marker counts as one column of separator; the rest of the
/// tab is kept as spaces.
fn strip_quote_marker<'a>(line: &Line<'a>) -> Option<Line<'a>> {
    let indent = line.indent(4);
    if indent.columns >= 4 || line.as_str().as_bytes().get(indent.index) != Some(&b'>') {
        return None;
    }
    let start = indent.index + 1;
    let column = line.column + indent.columns + 1;
    Some(match line.as_str().as_bytes().get(start) {
        Some(b' ') => line.advance(start + 1, column + 1),
        Some(b'\t') => {
            let width = tab_width(column);
            line.remainder(start + 1, column + width, width - 1)
        }
        _ => line.advance(start, column),
    })
}

/// Read a bullet or ordered list marker. Returns the marker and its byte length.
fn list_marker(text: &str) -> Option<(ListMarker, usize)> {
    let bytes = text.as_bytes();
    match *bytes.first()? {
        sign @ (b'-' | b'+' | b'*') => Some((
            ListMarker {
                kind: ListKind::Bullet,
                sign: sign as char,
                start: 1,
            },
            1,
        )),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > MAX_ORDINAL_DIGITS {
                return None;
            }
            let sign = match bytes.get(digits)? {
                sign @ (b'.' | b')') => *sign as char,
                _ => return None,
            };
            let start = text[..digits].parse().ok()?;
            Some((
                ListMarker {
                    kind: ListKind::Ordered,
                    sign,
                    start,
                },
                digits + 1,
            ))
        }
        _ => None,
    }
}

/// Content of a continuation line of a list item whose content starts
/// `width` columns in. Blank lines always continue the item.
fn list_item_content<'a>(line: &Line<'a>, width: usize) -> Option<Line<'a>> {
    if line.is_blank() {
        return Some(line.with_text(String::new()));
    }
    let indent = line.indent(width);
    if indent.columns < width {
        return None;
    }
    Some(line.remainder(
        indent.index,
        line.column + width + indent.leftover,
        indent.leftover,
    ))
}

// =============================================================================
// Leaf blocks
// =============================================================================

fn thematic_break(line: &Line<'_>) -> bool {
    let indent = line.indent(4);
    if indent.columns >= 4 {
        return false;
    }
    let rest = &line.as_str()[indent.index..];
    let Some(mark @ (b'-' | b'_' | b'*')) = rest.bytes().next() else {
        return false;
    };
    let mut count = 0;
    for b in rest.bytes() {
        if b == mark {
            count += 1;
        } else if !is_space_or_tab(b) {
            return false;
        }
    }
    count >= 3
}

fn atx_heading(line: &Line<'_>) -> Option<Heading> {
    let indent = line.indent(4);
    if indent.columns >= 4 {
        return None;
    }
    let rest = &line.as_str()[indent.index..];
    let level = rest.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let mut content = trim_spaces(after);
    let without_closing = content.trim_end_matches('#');
    if without_closing.is_empty() {
        content = "";
    } else if without_closing.ends_with([' ', '\t']) {
        content = trim_spaces(without_closing);
    }

    Some(Heading {
        level: level as u8,
        kind: HeadingKind::Atx,
        content: LeafContent::Raw(content.to_string()),
    })
}

fn closes_fence(line: &Line<'_>, fence_char: u8, fence_len: usize) -> bool {
    if line.indent(4).columns >= 4 {
        return false;
    }
    let fence = trim_spaces(line.as_str());
    fence.len() >= fence_len && fence.bytes().all(|b| b == fence_char)
}

fn indented_code(lines: &[Line<'_>], out: &mut Vec<Block>, cx: Context) -> Option<usize> {
    if cx.after_paragraph {
        return None;
    }

    let mut code = String::new();
    let mut consumed = 0;
    for line in lines {
        if line.is_blank() {
            break;
        }
        let indent = line.indent(4);
        if indent.columns < 4 {
            break;
        }
        push_spaces(&mut code, indent.leftover);
        code.push_str(&line.as_str()[indent.index..]);
        code.push('\n');
        consumed += 1;
    }
    if consumed == 0 {
        return None;
    }

    // Blank lines between two chunks of code belong to the code.
    let mut blanks = Vec::new();
    while let Some(Block::BlankLine(_)) = out.last() {
        if let Some(Block::BlankLine(blank)) = out.pop() {
            blanks.push(blank);
        }
    }
    if let Some(Block::IndentedCode(previous)) = out.last_mut() {
        for blank in blanks.iter().rev() {
            let indent = count_leading_space(&blank.content, 0, 4);
            push_spaces(&mut previous.code, indent.leftover);
            previous.code.push_str(&blank.content[indent.index..]);
            previous.code.push('\n');
        }
        previous.code.push_str(&code);
    } else {
        out.extend(blanks.into_iter().rev().map(Block::BlankLine));
        out.push(Block::IndentedCode(IndentedCode { code }));
    }
    Some(consumed)
}

fn link_reference_definition(
    lines: &[Line<'_>],
    out: &mut Vec<Block>,
    cx: Context,
) -> Option<usize> {
    if cx.after_paragraph {
        return None;
    }
    let first = &lines[0];
    let indent = first.indent(4);
    if indent.columns >= 4 {
        return None;
    }
    let opening = &first.as_str()[indent.index..];
    if !opening.starts_with('[') {
        return None;
    }

    let mut text = String::from(opening);
    for line in &lines[1..] {
        if line.is_blank() {
            break;
        }
        text.push('\n');
        text.push_str(line.as_str());
    }

    let (definition, rest) = parse_definition(&text)?;
    let read = &text[..text.len() - rest.len()];
    let newlines = read.matches('\n').count();
    let consumed = if read.ends_with('\n') { newlines } else { newlines + 1 };

    out.push(Block::LinkReferenceDefinition(definition));
    Some(consumed)
}

/// Parse one definition at the start of `text`. Returns the definition and
/// the text after the line it ends on.
fn parse_definition(text: &str) -> Option<(LinkReferenceDefinition, &str)> {
    let (label, rest) = read_link_label(text)?;
    let rest = rest.strip_prefix(':')?;
    let rest = skip_inner_spaces(rest)?;
    let (destination, after_destination) = read_link_destination(rest)?;
    if destination.is_empty() && !rest.starts_with('<') {
        return None;
    }

    let definition = |title: Option<&str>| LinkReferenceDefinition {
        label: label.to_string(),
        destination: destination.to_string(),
        title: title.map(str::to_string),
    };

    if let Some(spaced) =
        skip_inner_spaces(after_destination).filter(|s| s.len() < after_destination.len())
    {
        if let Some((title, after_title)) = read_link_title(spaced) {
            if let Some(rest) = rest_of_line_blank(after_title) {
                return Some((definition(Some(title)), rest));
            }
        }
    }

    let rest = rest_of_line_blank(after_destination)?;
    Some((definition(None), rest))
}

/// Level of a setext underline: 1 for `=`, 2 for `-`.
fn setext_underline(line: &Line<'_>) -> Option<u8> {
    let indent = line.indent(4);
    if indent.columns >= 4 {
        return None;
    }
    let rest = trim_spaces(&line.as_str()[indent.index..]);
    let level = match rest.bytes().next()? {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let mark = rest.as_bytes()[0];
    rest.bytes().all(|b| b == mark).then_some(level)
}

fn math_block(lines: &[Line<'_>], out: &mut Vec<Block>) -> Option<usize> {
    let first = &lines[0];
    let indent = first.indent(4);
    if indent.columns >= 4 {
        return None;
    }
    let mut segment = first.as_str()[indent.index..].strip_prefix("$$")?;
    let mut content = String::from("$$");

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            segment = line.as_str();
            content.push('\n');
        }
        let Some(end) = find_unescaped(segment, b'$') else {
            content.push_str(segment);
            continue;
        };
        let closing = &segment[end..];
        if !closing.starts_with("$$") || !crate::lexer::is_blank(&closing[2..]) {
            return None;
        }
        content.push_str(&segment[..end]);
        content.push_str("$$");
        out.push(Block::Math(MathBlock { content }));
        return Some(i + 1);
    }
    None
}

// =============================================================================
// Table rows
// =============================================================================

/// Split a table row into trimmed cell texts. Leading and trailing pipes are
/// optional; `\|` stays inside a cell as a literal pipe.
fn split_row(line: &str) -> Vec<String> {
    let mut rest = trim_spaces(line);
    rest = rest.strip_prefix('|').unwrap_or(rest);
    let mut cells = Vec::new();
    while !rest.is_empty() {
        let (cell, after) = match find_unescaped(rest, b'|') {
            Some(end) => (&rest[..end], &rest[end + 1..]),
            None => (rest, ""),
        };
        cells.push(trim_spaces(cell).replace("\\|", "|"));
        rest = after;
    }
    cells
}

/// Parse a delimiter row into column alignments.
fn delimiter_row(line: &str) -> Option<Vec<Alignment>> {
    split_row(line)
        .iter()
        .map(|cell| {
            let left = cell.starts_with(':');
            let right = cell.len() > 1 && cell.ends_with(':');
            let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
            if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
                return None;
            }
            Some(match (left, right) {
                (false, false) => Alignment::None,
                (true, false) => Alignment::Left,
                (false, true) => Alignment::Right,
                (true, true) => Alignment::Center,
            })
        })
        .collect()
}

fn table_row(cells: Vec<String>, aligns: &[Alignment], kind: CellKind) -> TableRow {
    TableRow {
        cells: cells
            .into_iter()
            .zip(aligns)
            .map(|(content, align)| TableCell {
                kind,
                align: *align,
                content: LeafContent::Raw(content),
            })
            .collect(),
    }
}

#[inline]
fn push_spaces(out: &mut String, count: usize) {
    out.extend(std::iter::repeat(' ').take(count));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_marker() {
        let (marker, len) = list_marker("12) foo").unwrap();
        assert_eq!(marker.kind, ListKind::Ordered);
        assert_eq!(marker.sign, ')');
        assert_eq!(marker.start, 12);
        assert_eq!(len, 3);
        assert!(list_marker("1234567890. x").is_none());
        assert!(list_marker("a. x").is_none());
        assert_eq!(list_marker("* x").unwrap().0.sign, '*');
    }

    #[test]
    fn test_strip_quote_marker_with_tab() {
        let line = Line::new(">\tfoo", 1);
        let content = strip_quote_marker(&line).unwrap();
        assert_eq!(content.as_str(), "  foo");
        assert_eq!(content.column, 2);
    }

    #[test]
    fn test_thematic_break() {
        assert!(thematic_break(&Line::new(" - - -", 1)));
        assert!(thematic_break(&Line::new("___", 1)));
        assert!(!thematic_break(&Line::new("--", 1)));
        assert!(!thematic_break(&Line::new("-- a", 1)));
        assert!(!thematic_break(&Line::new("    ***", 1)));
    }

    #[test]
    fn test_atx_closing_sequence() {
        let content = |s: &str| match atx_heading(&Line::new(s, 1)).map(|h| h.content) {
            Some(LeafContent::Raw(text)) => Some(text),
            _ => None,
        };
        assert_eq!(content("# foo ##").as_deref(), Some("foo"));
        assert_eq!(content("# foo#").as_deref(), Some("foo#"));
        assert_eq!(content("### ###").as_deref(), Some(""));
        assert_eq!(content("#5 bolt"), None);
        assert_eq!(content("####### foo"), None);
    }

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("a | b"), vec!["a", "b"]);
        assert_eq!(split_row(r"| a \| b |"), vec!["a | b"]);
    }

    #[test]
    fn test_delimiter_row() {
        assert_eq!(
            delimiter_row("| :-- | --: | :-: | - |"),
            Some(vec![Alignment::Left, Alignment::Right, Alignment::Center, Alignment::None])
        );
        assert_eq!(delimiter_row("| -x- |"), None);
        assert_eq!(delimiter_row("| : |"), None);
    }

    #[test]
    fn test_parse_definition_with_title() {
        let (definition, rest) = parse_definition("[Foo]: /url \"title\"\nnext").unwrap();
        assert_eq!(definition.label, "Foo");
        assert_eq!(definition.destination, "/url");
        assert_eq!(definition.title.as_deref(), Some("title"));
        assert_eq!(rest, "next");
    }

    #[test]
    fn test_parse_definition_title_on_bad_line() {
        let (definition, rest) = parse_definition("[foo]: /url\n\"title\" ok").unwrap();
        assert_eq!(definition.title, None);
        assert_eq!(rest, "\"title\" ok");
        assert!(parse_definition("[foo]:").is_none());
        assert!(parse_definition("[foo]: /url bar").is_none());
    }
}
