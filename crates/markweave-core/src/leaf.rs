//! Leaf inline recognizers.
//!
//! A leaf inline is a construct with no nested inline structure: code spans,
//! autolinks, raw HTML, line breaks, wiki-links, embedded files and math. The
//! resolver tries [`parse`] at every position before looking at delimiters.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Autolink, EmbeddedFile, Inline, WikiLink};
use crate::html;
use crate::options::{Extension, Options};
use crate::text::{find_unescaped, is_control, is_whitespace};

/// The content of a `<...>` email autolink.
static EMAIL_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

static WWW_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^www(?P<domain>(?:\.[-_a-zA-Z0-9]+){2,})[^<\s]*").unwrap()
});

static URL_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?P<domain>[-_a-zA-Z0-9]+(?:\.[-_a-zA-Z0-9]+)+)[^<\s]*").unwrap()
});

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9._+]+@[-_a-zA-Z0-9]+(?:\.[-_a-zA-Z0-9]+)+").unwrap());

/// Shortest and longest URI scheme accepted in `<scheme:...>` autolinks.
const SCHEME_LEN: std::ops::RangeInclusive<usize> = 2..=32;

/// Try every leaf recognizer at byte `pos` of `text`.
///
/// Returns the inline node and the number of bytes it spans.
pub(crate) fn parse(text: &str, pos: usize, options: &Options) -> Option<(Inline, usize)> {
    let rest = &text[pos..];
    match rest.as_bytes().first()? {
        b'`' => Some(code_span(rest)),
        b'<' => uri_autolink(rest)
            .or_else(|| email_autolink(rest))
            .or_else(|| html_tag(rest)),
        b'[' if options.has(Extension::WikiLinks) => wiki_link(rest),
        b'!' if options.has(Extension::EmbeddedFiles) => embedded_file(rest),
        b'$' if options.has(Extension::Math) => math(rest),
        b' ' | b'\\' => line_break(rest),
        b'\n' => Some(soft_break(rest)),
        _ if options.has(Extension::ExtendedAutolinks) && at_word_boundary(text, pos) => {
            extended_autolink(rest)
        }
        _ => None,
    }
}

// =============================================================================
// Code spans
// =============================================================================

/// A backtick run opens a code span closed by a run of the same length. An
/// unmatched opening run is literal text.
fn code_span(text: &str) -> (Inline, usize) {
    let bytes = text.as_bytes();
    let open = bytes.iter().take_while(|b| **b == b'`').count();

    let mut i = open;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
        if run == open {
            let content = normalize_code(&text[open..i]);
            return (Inline::CodeSpan(content), i + run);
        }
        i += run;
    }
    (Inline::Text(text[..open].to_string()), open)
}

fn normalize_code(content: &str) -> String {
    let folded = content.replace('\n', " ");
    let all_spaces = folded.bytes().all(|b| b == b' ');
    if !all_spaces && folded.len() >= 2 && folded.starts_with(' ') && folded.ends_with(' ') {
        folded[1..folded.len() - 1].to_string()
    } else {
        folded
    }
}

// =============================================================================
// Autolinks and raw HTML
// =============================================================================

/// `<scheme:anything-but-spaces-and-angles>`
fn uri_autolink(text: &str) -> Option<(Inline, usize)> {
    let inner = text.strip_prefix('<')?;
    let scheme_len = inner.find(':')?;
    let scheme = &inner[..scheme_len];
    if !SCHEME_LEN.contains(&scheme_len)
        || !scheme.as_bytes()[0].is_ascii_alphabetic()
        || !scheme
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
    {
        return None;
    }
    let end = inner.find(|c: char| c == '<' || c == '>' || c == ' ' || is_control(c))?;
    if inner.as_bytes()[end] != b'>' {
        return None;
    }
    let uri = &inner[..end];
    Some((
        Inline::Autolink(Autolink {
            destination: uri.to_string(),
            label: uri.to_string(),
        }),
        end + 2,
    ))
}

/// `<user@example.com>`
fn email_autolink(text: &str) -> Option<(Inline, usize)> {
    let inner = text.strip_prefix('<')?;
    let end = inner.find('>')?;
    let email = &inner[..end];
    if !EMAIL_AUTOLINK.is_match(email) {
        return None;
    }
    Some((
        Inline::Autolink(Autolink {
            destination: format!("mailto:{}", email),
            label: email.to_string(),
        }),
        end + 2,
    ))
}

fn html_tag(text: &str) -> Option<(Inline, usize)> {
    let len = html::inline_tag(text)?;
    Some((Inline::HtmlTag(text[..len].to_string()), len))
}

/// Extended autolinks only start after whitespace, at the start of the
/// text, or after one of `*`, `_`, `~` and `(`.
fn at_word_boundary(text: &str, pos: usize) -> bool {
    match text[..pos].chars().next_back() {
        None => true,
        Some(c) => is_whitespace(c) || matches!(c, '*' | '_' | '~' | '('),
    }
}

fn extended_autolink(text: &str) -> Option<(Inline, usize)> {
    let link = match text.as_bytes()[0] {
        b'w' => www_autolink(text),
        b'h' => url_autolink(text),
        b'm' if text.starts_with("mailto:") => return protocol_autolink(text, "mailto:"),
        b'x' if text.starts_with("xmpp:") => return protocol_autolink(text, "xmpp:"),
        _ => None,
    };
    link.or_else(|| email(text).map(|address| bare_email(address, "mailto:")))
}

fn www_autolink(text: &str) -> Option<(Inline, usize)> {
    let candidate = WWW_AUTOLINK.find(text)?.as_str();
    let link = trim_link_path(candidate);
    let captures = WWW_AUTOLINK.captures(link)?;
    if captures[0].len() != link.len() || !valid_domain(&captures["domain"]) {
        return None;
    }
    Some((
        Inline::Autolink(Autolink {
            destination: format!("http://{}", link),
            label: link.to_string(),
        }),
        link.len(),
    ))
}

fn url_autolink(text: &str) -> Option<(Inline, usize)> {
    let candidate = URL_AUTOLINK.find(text)?.as_str();
    let link = trim_link_path(candidate);
    let captures = URL_AUTOLINK.captures(link)?;
    if captures[0].len() != link.len() || !valid_domain(&captures["domain"]) {
        return None;
    }
    Some((
        Inline::Autolink(Autolink {
            destination: link.to_string(),
            label: link.to_string(),
        }),
        link.len(),
    ))
}

/// `mailto:user@example.com` and `xmpp:user@example.com/resource`
fn protocol_autolink(text: &str, scheme: &str) -> Option<(Inline, usize)> {
    let address = email(&text[scheme.len()..])?;
    let mut len = scheme.len() + address.len();
    if scheme == "xmpp:" && text[len..].starts_with('/') {
        let resource = text[len + 1..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'@' | b'.'))
            .count();
        if resource > 0 {
            len += 1 + resource;
        }
    }
    let link = &text[..len];
    Some((
        Inline::Autolink(Autolink {
            destination: link.to_string(),
            label: link.to_string(),
        }),
        len,
    ))
}

fn bare_email(address: &str, scheme: &str) -> (Inline, usize) {
    (
        Inline::Autolink(Autolink {
            destination: format!("{}{}", scheme, address),
            label: address.to_string(),
        }),
        address.len(),
    )
}

/// A bare email address at the start of `text`. The address may not end
/// in `-` or `_`.
fn email(text: &str) -> Option<&str> {
    let local = text
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'+'))
        .count();
    if local == 0 || text.as_bytes().get(local) != Some(&b'@') {
        return None;
    }
    let address = EMAIL.find(text)?.as_str();
    if address.ends_with(['-', '_']) {
        return None;
    }
    Some(address)
}

/// The last two domain segments may not contain `_`.
fn valid_domain(domain: &str) -> bool {
    domain
        .split('.')
        .filter(|segment| !segment.is_empty())
        .rev()
        .take(2)
        .all(|segment| !segment.contains('_'))
}

/// Drop trailing punctuation, unbalanced closing parentheses and trailing
/// entity references from an extended autolink.
fn trim_link_path(link: &str) -> &str {
    let mut end = link.len();
    loop {
        let current = &link[..end];
        let Some(last) = current.chars().next_back() else {
            break;
        };
        match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' => end -= 1,
            ')' if current.matches(')').count() > current.matches('(').count() => end -= 1,
            ';' => match entity_suffix(current) {
                Some(start) => end = start,
                None => break,
            },
            _ => break,
        }
    }
    &link[..end]
}

/// Start of a trailing `&name;` in `text`, if any.
fn entity_suffix(text: &str) -> Option<usize> {
    let amp = text.rfind('&')?;
    let name = &text[amp + 1..text.len() - 1];
    (!name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())).then_some(amp)
}

// =============================================================================
// Line breaks
// =============================================================================

/// Two or more spaces, or a backslash, before a line ending is a hard break;
/// a single space is part of a soft break.
fn line_break(text: &str) -> Option<(Inline, usize)> {
    let bytes = text.as_bytes();
    if bytes[0] == b'\\' {
        if bytes.get(1) != Some(&b'\n') {
            return None;
        }
        return Some((Inline::HardBreak, 1 + newline_len(&text[1..])));
    }

    let spaces = bytes.iter().take_while(|b| **b == b' ').count();
    if bytes.get(spaces) != Some(&b'\n') {
        return None;
    }
    let len = spaces + newline_len(&text[spaces..]);
    if spaces >= 2 {
        Some((Inline::HardBreak, len))
    } else {
        Some((Inline::SoftBreak, len))
    }
}

fn soft_break(text: &str) -> (Inline, usize) {
    (Inline::SoftBreak, newline_len(text))
}

/// Length of the line ending at the start of `text` plus the indentation of
/// the next line.
fn newline_len(text: &str) -> usize {
    1 + text[1..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

// =============================================================================
// Wiki-links, embedded files and math
// =============================================================================

/// `[[destination|display]]`
fn wiki_link(text: &str) -> Option<(Inline, usize)> {
    let (content, len) = double_bracketed(text, "[[")?;
    let link = match content.split_once('|') {
        Some((destination, display)) => WikiLink {
            display: (!display.is_empty()).then(|| display.to_string()),
            destination: destination.to_string(),
        },
        None => WikiLink {
            display: None,
            destination: content.to_string(),
        },
    };
    Some((Inline::WikiLink(link), len))
}

/// `![[source|attribute]]`
fn embedded_file(text: &str) -> Option<(Inline, usize)> {
    let (content, len) = double_bracketed(text, "![[")?;
    let file = match content.split_once('|') {
        Some((source, attribute)) => EmbeddedFile {
            source: source.to_string(),
            attribute: Some(attribute.to_string()),
        },
        None => EmbeddedFile {
            source: content.to_string(),
            attribute: None,
        },
    };
    Some((Inline::EmbeddedFile(file), len))
}

/// Content between `opening` and the `]]` that balances it. Backslash
/// escapes hide brackets.
fn double_bracketed<'t>(text: &'t str, opening: &str) -> Option<(&'t str, usize)> {
    let inner = text.strip_prefix(opening)?;
    let bytes = inner.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 1;
                // skip the whole escaped character
                while i < bytes.len() && !inner.is_char_boundary(i + 1) {
                    i += 1;
                }
            }
            b'[' => depth += 1,
            b']' if depth == 0 => {
                if bytes.get(i + 1) != Some(&b']') {
                    return None;
                }
                return Some((&inner[..i], opening.len() + i + 2));
            }
            b']' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// `$$...$$` is [`Inline::Math`]; a non-empty `$...$` is [`Inline::MathSpan`].
fn math(text: &str) -> Option<(Inline, usize)> {
    if let Some(inner) = text.strip_prefix("$$") {
        if let Some(end) = find_unescaped(inner, b'$') {
            if inner[end..].starts_with("$$") {
                let len = 2 + end + 2;
                return Some((Inline::Math(text[..len].to_string()), len));
            }
        }
    }
    let inner = &text[1..];
    let end = find_unescaped(inner, b'$')?;
    if end == 0 {
        return None;
    }
    let len = 1 + end + 1;
    Some((Inline::MathSpan(text[..len].to_string()), len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extended() -> Options {
        Options::default()
    }

    #[test]
    fn test_code_span_strips_one_space() {
        assert_eq!(code_span("`` `a` ``"), (Inline::CodeSpan("`a`".into()), 9));
        assert_eq!(code_span("`  `"), (Inline::CodeSpan("  ".into()), 4));
        assert_eq!(code_span("`a\nb`"), (Inline::CodeSpan("a b".into()), 5));
    }

    #[test]
    fn test_code_span_unmatched_run_is_text() {
        assert_eq!(code_span("```foo``"), (Inline::Text("```".into()), 3));
    }

    #[test]
    fn test_angle_autolinks() {
        let (link, len) = uri_autolink("<https://x.org/a?b>rest").unwrap();
        assert_eq!(len, 19);
        assert!(matches!(link, Inline::Autolink(Autolink { ref destination, .. }) if destination == "https://x.org/a?b"));
        assert!(uri_autolink("<m:abc>").is_none());
        assert!(uri_autolink("<http://a b>").is_none());

        let (link, _) = email_autolink("<foo@bar.example.com>").unwrap();
        assert!(matches!(link, Inline::Autolink(Autolink { ref destination, .. }) if destination == "mailto:foo@bar.example.com"));
    }

    #[test]
    fn test_www_autolink_trims_trailing_punctuation() {
        let (link, len) = extended_autolink("www.commonmark.org/a.b.").unwrap();
        assert_eq!(len, 22);
        assert_eq!(
            link,
            Inline::Autolink(Autolink {
                destination: "http://www.commonmark.org/a.b".into(),
                label: "www.commonmark.org/a.b".into(),
            })
        );
    }

    #[test]
    fn test_autolink_parentheses_and_entities() {
        assert_eq!(trim_link_path("www.google.com/search?q=(business))+ok"), "www.google.com/search?q=(business))+ok");
        assert_eq!(trim_link_path("www.google.com/search?q=Markup+(business)))"), "www.google.com/search?q=Markup+(business)");
        assert_eq!(trim_link_path("www.google.com/search?q=commonmark&hl;"), "www.google.com/search?q=commonmark");
        assert_eq!(trim_link_path("www.google.com/search?q=commonmark&hl;x"), "www.google.com/search?q=commonmark&hl;x");
    }

    #[test]
    fn test_extended_autolink_needs_word_boundary() {
        let options = extended();
        assert!(parse("see www.example.com", 4, &options).is_some());
        assert!(parse("xwww.example.com", 1, &options).is_none());
        assert!(parse("(www.example.com)", 1, &options).is_some());
    }

    #[test]
    fn test_invalid_domain() {
        assert!(extended_autolink("www.xxx.yyy._zzz").is_none());
        assert!(extended_autolink("www.xxx._yyy.zzz").is_none());
        assert!(extended_autolink("www.x_xx.yyy.zzz").is_some());
    }

    #[test]
    fn test_bare_email_and_protocols() {
        let (link, len) = extended_autolink("foo@bar.baz.").unwrap();
        assert_eq!(len, 11);
        assert!(matches!(link, Inline::Autolink(Autolink { ref destination, .. }) if destination == "mailto:foo@bar.baz"));
        assert!(extended_autolink("a.b-c_d@a.b-").is_none());

        let (link, _) = extended_autolink("xmpp:foo@bar.baz/txt@bin.com").unwrap();
        assert!(matches!(link, Inline::Autolink(Autolink { ref destination, .. }) if destination == "xmpp:foo@bar.baz/txt@bin.com"));
        let (link, _) = extended_autolink("mailto:a@b.com").unwrap();
        assert!(matches!(link, Inline::Autolink(Autolink { ref label, .. }) if label == "mailto:a@b.com"));
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(line_break("  \n  next"), Some((Inline::HardBreak, 5)));
        assert_eq!(line_break(" \nnext"), Some((Inline::SoftBreak, 2)));
        assert_eq!(line_break("\\\nnext"), Some((Inline::HardBreak, 2)));
        assert_eq!(line_break("  x"), None);
        assert_eq!(soft_break("\n\tx"), (Inline::SoftBreak, 2));
    }

    #[test]
    fn test_wiki_link_and_embed() {
        let (link, len) = wiki_link("[[Page|the page]] tail").unwrap();
        assert_eq!(len, 17);
        assert_eq!(
            link,
            Inline::WikiLink(WikiLink {
                display: Some("the page".into()),
                destination: "Page".into(),
            })
        );
        assert!(wiki_link("[[unclosed]").is_none());

        let (file, _) = embedded_file("![[image.png|200]]").unwrap();
        assert_eq!(
            file,
            Inline::EmbeddedFile(EmbeddedFile {
                source: "image.png".into(),
                attribute: Some("200".into()),
            })
        );
    }

    #[test]
    fn test_math() {
        assert_eq!(math("$$x^2$$ y"), Some((Inline::Math("$$x^2$$".into()), 7)));
        assert_eq!(math("$a \\$ b$"), Some((Inline::MathSpan("$a \\$ b$".into()), 8)));
        assert_eq!(math("$$"), None);
        assert_eq!(math("$ no close"), None);
    }

    #[test]
    fn test_disabled_extensions_do_not_match() {
        let options = Options::from_profile(crate::options::Profile::CommonMark);
        assert!(parse("[[x]]", 0, &options).is_none());
        assert!(parse("$x$", 0, &options).is_none());
        assert!(parse("www.example.com", 0, &options).is_none());
    }
}
