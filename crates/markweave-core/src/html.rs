//! Raw HTML grammar shared by HTML blocks and inline HTML.
//!
//! Every reader takes text starting at `<` and returns the byte length of the
//! construct it recognized.

use std::sync::LazyLock;

use memchr::memmem;
use regex::Regex;

use crate::text::is_space_or_tab;

/// Tags whose content is raw text. Their blocks end at the matching close tag.
static RAW_TEXT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:pre|script|style|textarea)$").unwrap());

static RAW_TEXT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:pre|script|style|textarea)>").unwrap());

/// Block-level tag names that start an HTML block on their own.
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:address|article|aside|base|basefont|blockquote|body|caption|center|col|colgroup|dd|details|dialog|dir|div|dl|dt|fieldset|figcaption|figure|footer|form|frame|frameset|h1|h2|h3|h4|h5|h6|head|header|hr|html|iframe|legend|li|link|main|menu|menuitem|nav|noframes|ol|optgroup|option|p|param|section|source|summary|table|tbody|td|tfoot|th|thead|title|tr|track|ul)$",
    )
    .unwrap()
});

/// The seven kinds of HTML block, decided by the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlBlockKind {
    /// `<pre`, `<script`, `<style` or `<textarea`.
    RawText,
    /// `<!--`
    Comment,
    /// `<?`
    ProcessingInstruction,
    /// `<!` followed by a letter.
    Declaration,
    /// `<![CDATA[`
    Cdata,
    /// A known block-level tag name.
    BlockTag,
    /// Any complete open or closing tag alone on its line.
    AnyTag,
}

impl HtmlBlockKind {
    /// Classify the first line of a potential HTML block. `line` starts at
    /// the first non-space character.
    pub fn classify(line: &str) -> Option<Self> {
        let after_lt = line.strip_prefix('<')?;

        if let Some((name, _)) = tag_name(after_lt) {
            if RAW_TEXT_TAG.is_match(name) {
                return Some(Self::RawText);
            }
        }
        if line.starts_with("<!--") {
            return Some(Self::Comment);
        }
        if line.starts_with("<?") {
            return Some(Self::ProcessingInstruction);
        }
        if line.len() > 2 && line.starts_with("<!") && line.as_bytes()[2].is_ascii_alphabetic() {
            return Some(Self::Declaration);
        }
        if line.starts_with("<![CDATA[") {
            return Some(Self::Cdata);
        }

        let name_start = after_lt.strip_prefix('/').unwrap_or(after_lt);
        if let Some((name, rest)) = tag_name(name_start) {
            if BLOCK_TAG.is_match(name) {
                let rest = rest.strip_prefix('/').filter(|r| r.starts_with('>')).unwrap_or(rest);
                if rest.is_empty() || rest.starts_with(&[' ', '\t', '>'][..]) {
                    return Some(Self::BlockTag);
                }
            }
        }

        let len = open_tag(line).or_else(|| closing_tag(line))?;
        if crate::lexer::is_blank(&line[len..]) {
            return Some(Self::AnyTag);
        }
        None
    }

    /// Whether `line` satisfies the end condition of a raw-text, comment,
    /// processing instruction, declaration or CDATA block.
    pub fn ends_on(self, line: &str) -> bool {
        match self {
            Self::RawText => RAW_TEXT_END.is_match(line),
            Self::Comment => line.contains("-->"),
            Self::ProcessingInstruction => line.contains("?>"),
            Self::Declaration => line.contains('>'),
            Self::Cdata => line.contains("]]>"),
            Self::BlockTag | Self::AnyTag => false,
        }
    }

    /// Blocks of these kinds end before the next blank line.
    pub fn ends_at_blank_line(self) -> bool {
        matches!(self, Self::BlockTag | Self::AnyTag)
    }

    pub fn can_interrupt_paragraph(self) -> bool {
        self != Self::AnyTag
    }
}

/// Read any inline HTML construct: open tag, closing tag, comment,
/// processing instruction, declaration or CDATA section.
pub fn inline_tag(text: &str) -> Option<usize> {
    open_tag(text)
        .or_else(|| closing_tag(text))
        .or_else(|| comment(text))
        .or_else(|| processing_instruction(text))
        .or_else(|| cdata(text))
        .or_else(|| declaration(text))
}

/// `<name attr="value" ... />`
pub fn open_tag(text: &str) -> Option<usize> {
    let rest = text.strip_prefix('<')?;
    let (_, mut rest) = tag_name(rest)?;
    while let Some(after) = attribute(rest) {
        rest = after;
    }
    rest = tag_spaces(rest)?;
    rest = rest.strip_prefix('/').unwrap_or(rest);
    rest = rest.strip_prefix('>')?;
    Some(text.len() - rest.len())
}

/// `</name >`
pub fn closing_tag(text: &str) -> Option<usize> {
    let rest = text.strip_prefix("</")?;
    let (_, rest) = tag_name(rest)?;
    let rest = tag_spaces(rest)?;
    let rest = rest.strip_prefix('>')?;
    Some(text.len() - rest.len())
}

/// `<!-- ... -->`, where the body may not start with `>` or `->`, end with
/// `-` or contain `--`.
pub fn comment(text: &str) -> Option<usize> {
    let body_start = text.strip_prefix("<!--")?;
    let end = memmem::find(body_start.as_bytes(), b"-->")?;
    let body = &body_start[..end];
    if body.starts_with('>') || body.starts_with("->") || body.ends_with('-') || body.contains("--") {
        return None;
    }
    Some(4 + end + 3)
}

/// `<? ... ?>`
pub fn processing_instruction(text: &str) -> Option<usize> {
    let body = text.strip_prefix("<?")?;
    let end = memmem::find(body.as_bytes(), b"?>")?;
    Some(2 + end + 2)
}

/// `<!X ... >` with `X` an ASCII letter.
pub fn declaration(text: &str) -> Option<usize> {
    let body = text.strip_prefix("<!")?;
    if !body.as_bytes().first()?.is_ascii_alphabetic() {
        return None;
    }
    let end = memchr::memchr(b'>', text.as_bytes())?;
    Some(end + 1)
}

/// `<![CDATA[ ... ]]>`
pub fn cdata(text: &str) -> Option<usize> {
    if !text.starts_with("<![CDATA[") {
        return None;
    }
    let end = memmem::find(text.as_bytes(), b"]]>")?;
    Some(end + 3)
}

/// An ASCII letter followed by letters, digits or `-`.
fn tag_name(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
        .count();
    Some((&text[..len], &text[len..]))
}

/// Spaces and tabs with at most one line ending among them.
fn tag_spaces(text: &str) -> Option<&str> {
    crate::text::skip_inner_spaces(text)
}

/// Whitespace, an attribute name, and an optional `=value`.
fn attribute(text: &str) -> Option<&str> {
    let rest = tag_spaces(text)?;
    if rest.len() == text.len() {
        return None;
    }
    let rest = attribute_name(rest)?;
    Some(attribute_value_spec(rest).unwrap_or(rest))
}

fn attribute_name(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let first = *bytes.first()?;
    if !(first.is_ascii_alphabetic() || first == b'_' || first == b':') {
        return None;
    }
    let len = 1 + bytes[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(**b, b'_' | b'.' | b':' | b'-'))
        .count();
    Some(&text[len..])
}

fn attribute_value_spec(text: &str) -> Option<&str> {
    let rest = tag_spaces(text)?;
    let rest = rest.strip_prefix('=')?;
    let rest = tag_spaces(rest)?;
    attribute_value(rest)
}

fn attribute_value(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    match *bytes.first()? {
        quote @ (b'\'' | b'"') => {
            let end = memchr::memchr(quote, &bytes[1..])?;
            Some(&text[end + 2..])
        }
        _ => {
            let len = bytes
                .iter()
                .take_while(|b| {
                    !(is_space_or_tab(**b)
                        || matches!(**b, b'\n' | b'\r' | b'"' | b'\'' | b'=' | b'<' | b'>' | b'`'))
                })
                .count();
            (len > 0).then(|| &text[len..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_tag() {
        assert_eq!(open_tag("<a href=\"x\" data-y=z disabled>rest"), Some(30));
        assert_eq!(open_tag("<br/>"), Some(5));
        assert_eq!(open_tag("<a href='x\">"), None);
        assert_eq!(open_tag("<33>"), None);
        assert_eq!(open_tag("<a foo=\"bar\"baz>"), None);
    }

    #[test]
    fn test_closing_tag() {
        assert_eq!(closing_tag("</div >"), Some(7));
        assert_eq!(closing_tag("</div x>"), None);
    }

    #[test]
    fn test_comment_rules() {
        assert_eq!(comment("<!-- ok -->x"), Some(11));
        assert_eq!(comment("<!-- a -- b -->"), None);
        assert_eq!(comment("<!--> -->"), None);
    }

    #[test]
    fn test_other_constructs() {
        assert_eq!(processing_instruction("<?php echo 1; ?>"), Some(16));
        assert_eq!(declaration("<!DOCTYPE html>"), Some(15));
        assert_eq!(cdata("<![CDATA[x]]>"), Some(13));
        assert_eq!(inline_tag("<![CDATA[x]]>"), Some(13));
    }

    #[test]
    fn test_classify_block_kinds() {
        assert_eq!(HtmlBlockKind::classify("<script type=\"x\">"), Some(HtmlBlockKind::RawText));
        assert_eq!(HtmlBlockKind::classify("<!-- c"), Some(HtmlBlockKind::Comment));
        assert_eq!(HtmlBlockKind::classify("<div class=\"a\">"), Some(HtmlBlockKind::BlockTag));
        assert_eq!(HtmlBlockKind::classify("</table>"), Some(HtmlBlockKind::BlockTag));
        assert_eq!(HtmlBlockKind::classify("<custom-el a=1>  "), Some(HtmlBlockKind::AnyTag));
        assert_eq!(HtmlBlockKind::classify("<custom-el> text"), None);
        assert_eq!(HtmlBlockKind::classify("text"), None);
    }

    #[test]
    fn test_end_conditions() {
        assert!(HtmlBlockKind::RawText.ends_on("foo</PRE>"));
        assert!(HtmlBlockKind::Comment.ends_on("x -->"));
        assert!(!HtmlBlockKind::Cdata.ends_on("]]"));
    }
}
