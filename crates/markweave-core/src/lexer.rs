//! Line splitting and indentation scanning.
//!
//! The block structurer works on [`Line`] records instead of raw text. A line
//! remembers the column it starts at, so tab stops stay correct after a
//! container strips its prefix, and whether it was forced into a paragraph as
//! a lazy continuation.
//!
//! # Performance
//!
//! - Zero-copy: top-level lines borrow directly from input
//! - SIMD-accelerated line ending scanning via `memchr`
//! - Only lines that need leftover tab spaces re-emitted are allocated

use std::borrow::Cow;

use memchr::memchr2;

/// Width of a tab stop in columns.
pub const TAB_STOP: usize = 4;

/// Number of columns a tab advances when it starts at `column`.
#[inline(always)]
pub const fn tab_width(column: usize) -> usize {
    TAB_STOP - (column % TAB_STOP)
}

/// A single line of block input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// The line text without its line ending.
    pub text: Cow<'a, str>,
    /// Column at which `text` begins in the source line.
    pub column: usize,
    /// 1-based source line number.
    pub number: usize,
    /// Set when the line was appended to a container as a lazy paragraph
    /// continuation. Such a line can never be a setext underline.
    pub lazy: bool,
}

/// Result of counting leading whitespace with tab awareness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indent {
    /// Columns counted, capped at the limit.
    pub columns: usize,
    /// Byte index of the first character not consumed.
    pub index: usize,
    /// Columns of the last consumed tab that lie beyond the limit.
    pub leftover: usize,
}

impl<'a> Line<'a> {
    /// Create a top-level line starting at column zero.
    #[inline]
    pub fn new(text: &'a str, number: usize) -> Self {
        Self {
            text: Cow::Borrowed(text),
            column: 0,
            number,
            lazy: false,
        }
    }

    /// The line text.
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Check if this line contains only spaces and tabs.
    #[inline(always)]
    pub fn is_blank(&self) -> bool {
        is_blank(&self.text)
    }

    /// Count leading whitespace, stopping once `limit` columns are reached.
    #[inline]
    pub fn indent(&self, limit: usize) -> Indent {
        count_leading_space(&self.text, self.column, limit)
    }

    /// The remainder of the line starting at byte `start`, which begins at
    /// `column` in the source.
    pub fn advance(&self, start: usize, column: usize) -> Line<'a> {
        self.remainder(start, column, 0)
    }

    /// Like [`Line::advance`], but re-emits `leftover` spaces in front of the
    /// remainder. Used when a container consumes only part of a tab.
    pub fn remainder(&self, start: usize, column: usize, leftover: usize) -> Line<'a> {
        let text = if leftover == 0 {
            match &self.text {
                Cow::Borrowed(s) => {
                    let s: &'a str = *s;
                    Cow::Borrowed(&s[start..])
                }
                Cow::Owned(s) => Cow::Owned(s[start..].to_string()),
            }
        } else {
            let mut owned = String::with_capacity(leftover + self.text.len() - start);
            owned.extend(std::iter::repeat(' ').take(leftover));
            owned.push_str(&self.text[start..]);
            Cow::Owned(owned)
        };
        Line {
            text,
            column: column.saturating_sub(leftover),
            number: self.number,
            lazy: self.lazy,
        }
    }

    /// Replace the text with `text`, keeping position information.
    pub fn with_text(&self, text: String) -> Line<'a> {
        Line {
            text: Cow::Owned(text),
            column: self.column,
            number: self.number,
            lazy: self.lazy,
        }
    }

    /// Mark the line as a lazy paragraph continuation.
    pub fn into_lazy(mut self) -> Line<'a> {
        self.lazy = true;
        self
    }
}

/// Check if `text` contains only spaces and tabs.
#[inline]
pub fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| b == b' ' || b == b'\t')
}

/// Count leading spaces and tabs of `text`, which starts at `column`.
///
/// Tabs advance to the next multiple of [`TAB_STOP`]. Counting stops once
/// `limit` columns are reached; when a tab crosses the limit the extra columns
/// are reported as `leftover` so callers can re-emit them as spaces.
pub fn count_leading_space(text: &str, column: usize, limit: usize) -> Indent {
    let mut index = 0;
    let mut count = 0;
    for b in text.bytes() {
        if count >= limit {
            return Indent {
                columns: limit,
                index,
                leftover: count - limit,
            };
        }
        match b {
            b' ' => count += 1,
            b'\t' => count += tab_width(column + count),
            _ => break,
        }
        index += 1;
    }
    if count > limit {
        return Indent {
            columns: limit,
            index,
            leftover: count - limit,
        };
    }
    Indent {
        columns: count,
        index,
        leftover: 0,
    }
}

/// Column reached after the first `end` bytes of `text`, starting at `column`.
pub fn column_after(text: &str, column: usize, end: usize) -> usize {
    let mut col = column;
    for b in text.as_bytes()[..end].iter() {
        if *b == b'\t' {
            col += tab_width(col);
        } else {
            col += 1;
        }
    }
    col
}

/// Split input into lines, treating `\n`, `\r` and `\r\n` as line endings.
///
/// A trailing line ending does not produce an extra empty line.
pub fn split_lines(input: &str) -> Vec<Line<'_>> {
    let bytes = input.as_bytes();
    let mut lines = Vec::with_capacity(bytes.len() / 32 + 1);
    let mut start = 0;
    while start < bytes.len() {
        let (end, next) = match memchr2(b'\n', b'\r', &bytes[start..]) {
            Some(pos) => {
                let end = start + pos;
                if bytes[end] == b'\r' && bytes.get(end + 1) == Some(&b'\n') {
                    (end, end + 2)
                } else {
                    (end, end + 1)
                }
            }
            None => (bytes.len(), bytes.len()),
        };
        lines.push(Line::new(&input[start..end], lines.len() + 1));
        start = next;
    }
    lines
}
