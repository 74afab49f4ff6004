//! Character classes and the small scanners shared by block and inline
//! parsing: escapes, entities, link labels, destinations and titles.
//!
//! Scanners take the text starting at the construct and return what they
//! read together with the unconsumed rest. They never fail loudly; `None`
//! means the construct is not present.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use unicode_categories::UnicodeCategories;

use crate::entity;

/// Longest allowed link label, in characters.
pub const MAX_LABEL_LEN: usize = 999;

/// Characters left untouched when normalizing a link destination.
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#')
    .remove(b'%');

// =============================================================================
// Character classes
// =============================================================================

/// `!-/`, `:-@`, `[-\``, `{-~`.
#[inline]
pub fn is_ascii_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
}

/// ASCII punctuation or any character in a Unicode `P*` category.
#[inline]
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_punctuation()
}

/// Unicode `Zs`, tab, line feed, form feed or carriage return.
#[inline]
pub fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0c' | '\r') || c.is_separator_space()
}

/// ASCII control characters including DEL.
#[inline]
pub fn is_control(c: char) -> bool {
    c.is_ascii_control()
}

#[inline]
pub fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
pub fn is_line_ending(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// Trim spaces and tabs from both ends.
#[inline]
pub fn trim_spaces(text: &str) -> &str {
    text.trim_matches(|c: char| c == ' ' || c == '\t')
}

/// Number of leading bytes of `text` that are spaces or tabs.
#[inline]
pub fn leading_spaces(text: &str) -> usize {
    text.bytes().take_while(|b| is_space_or_tab(*b)).count()
}

// =============================================================================
// Escapes and entities
// =============================================================================

/// Resolve backslash escapes and entity references in a single pass.
///
/// A backslash before ASCII punctuation yields the punctuation; any other
/// backslash is kept. Entities are decoded only where they are not produced
/// by an escape, so `\&amp;` stays `&amp;`.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.bytes().any(|b| b == b'\\' || b == b'&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(|c: char| c == '\\' || c == '&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if rest.starts_with('\\') {
            match rest[1..].chars().next() {
                Some(c) if is_ascii_punctuation(c) => {
                    out.push(c);
                    rest = &rest[2..];
                }
                _ => {
                    out.push('\\');
                    rest = &rest[1..];
                }
            }
        } else if let Some((decoded, len)) = entity::decode_at(rest) {
            out.push_str(&decoded);
            rest = &rest[len..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape `&`, `<`, `>` and `"` for HTML text and attribute values.
#[inline]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

/// Normalize a link destination for use in `href`/`src`.
///
/// Escapes and entities are resolved, then everything outside the URL-safe
/// set is percent-encoded. Existing `%XX` sequences are kept as they are.
pub fn normalize_url(destination: &str) -> String {
    encode_url(&unescape(destination))
}

/// Percent-encode `url` without resolving escapes, as autolinks require.
pub fn encode_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(pos) = rest.find('%') {
        out.extend(utf8_percent_encode(&rest[..pos], URL_ENCODE_SET));
        let hex = rest.as_bytes();
        let valid = hex.len() >= pos + 3
            && hex[pos + 1].is_ascii_hexdigit()
            && hex[pos + 2].is_ascii_hexdigit();
        out.push_str(if valid { "%" } else { "%25" });
        rest = &rest[pos + 1..];
    }
    out.extend(utf8_percent_encode(rest, URL_ENCODE_SET));
    out
}

// =============================================================================
// Labels
// =============================================================================

/// Normalize a link label for matching: trim, collapse internal whitespace to
/// a single space and fold case.
///
/// ```rust
/// use markweave_core::text::normalize_label;
///
/// assert_eq!(normalize_label("  Foo \n  Bar "), "foo bar");
/// assert_eq!(normalize_label("foo bar"), normalize_label("FOO   BAR"));
/// ```
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for word in label.split(|c: char| is_whitespace(c) || c == ' ') {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(fold_case));
    }
    out
}

/// Simple case folding. `ẞ`/`ß` fold to `ss` so German labels match.
fn fold_case(c: char) -> impl Iterator<Item = char> {
    let folded: Vec<char> = match c {
        'ß' | 'ẞ' => vec!['s', 's'],
        _ => c.to_lowercase().collect(),
    };
    folded.into_iter()
}

/// Find the first `ending` not preceded by a backslash escape.
///
/// Returns the byte offset of `ending` in `text`.
pub fn find_unescaped(text: &str, ending: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            if i + 1 < bytes.len() && bytes[i + 1].is_ascii_punctuation() {
                i += 2;
                continue;
            }
        } else if b == ending {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Read `[label]` at the start of `text`.
///
/// The label may span lines but may not contain an unescaped `[`, exceed
/// [`MAX_LABEL_LEN`] characters or consist only of whitespace.
pub fn read_link_label(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('[')?;
    let end = find_unescaped(inner, b']')?;
    let label = &inner[..end];
    if label.chars().count() > MAX_LABEL_LEN
        || find_unescaped(label, b'[').is_some()
        || label.chars().all(|c| c == ' ' || c == '\t' || c == '\n' || c == '\r')
    {
        return None;
    }
    Some((label, &inner[end + 1..]))
}

// =============================================================================
// Destinations and titles
// =============================================================================

/// Skip spaces and tabs with at most one line ending among them.
///
/// Returns `None` when a blank line would be crossed.
pub fn skip_inner_spaces(text: &str) -> Option<&str> {
    let rest = &text[leading_spaces(text)..];
    let Some(after) = strip_line_ending(rest) else {
        return Some(rest);
    };
    if after.is_empty() {
        return Some(after);
    }
    let after = &after[leading_spaces(after)..];
    if after.bytes().next().is_some_and(is_line_ending) {
        return None;
    }
    Some(after)
}

/// Remove one leading line ending, if present.
#[inline]
pub fn strip_line_ending(text: &str) -> Option<&str> {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .or_else(|| text.strip_prefix('\r'))
}

/// Read a link destination: `<...>` or a run without spaces or controls and
/// with balanced parentheses.
pub fn read_link_destination(text: &str) -> Option<(&str, &str)> {
    if text.starts_with('<') {
        read_wrapped_destination(text)
    } else {
        read_bare_destination(text)
    }
}

fn read_wrapped_destination(text: &str) -> Option<(&str, &str)> {
    let inner = &text[1..];
    let end = find_unescaped(inner, b'>')?;
    let destination = &inner[..end];
    if destination.bytes().any(is_line_ending) || find_unescaped(destination, b'<').is_some() {
        return None;
    }
    Some((destination, &inner[end + 1..]))
}

fn read_bare_destination(text: &str) -> Option<(&str, &str)> {
    let end = text
        .char_indices()
        .find(|(_, c)| is_control(*c) || *c == ' ')
        .map_or(text.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }

    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' if depth == 0 => return Some((&text[..i], &text[i..])),
            b')' => {
                depth -= 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if depth != 0 {
        return None;
    }
    let end = i.min(end);
    Some((&text[..end], &text[end..]))
}

/// Read a link title: `"..."`, `'...'` or `(...)`. Titles may span lines but
/// may not contain a blank line.
pub fn read_link_title(text: &str) -> Option<(&str, &str)> {
    let close = match text.as_bytes().first()? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let inner = &text[1..];
    let end = find_unescaped(inner, close)?;
    let title = &inner[..end];
    if close == b')' && find_unescaped(title, b'(').is_some() {
        return None;
    }
    if contains_blank_line(title) {
        return None;
    }
    Some((title, &inner[end + 1..]))
}

fn contains_blank_line(text: &str) -> bool {
    let segments: Vec<&str> = text.split('\n').collect();
    segments.len() > 2
        && segments[1..segments.len() - 1]
            .iter()
            .any(|s| crate::lexer::is_blank(s))
}

/// Check that the rest of the current line holds only spaces and tabs.
///
/// Returns the text after the line ending.
pub fn rest_of_line_blank(text: &str) -> Option<&str> {
    let rest = &text[leading_spaces(text)..];
    if rest.is_empty() {
        return Some(rest);
    }
    strip_line_ending(rest)
}
