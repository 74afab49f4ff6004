//! HTML entity decoding.
//!
//! Named entities come from the `entities` table (the HTML5 list). Only the
//! forms terminated by `;` are recognized, as CommonMark requires.

use std::collections::HashMap;
use std::sync::LazyLock;

use entities::ENTITIES;

/// Longest entity name in the table, used to bound scanning.
const MAX_NAME_LEN: usize = 32;

static NAMED: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    ENTITIES
        .iter()
        .filter_map(|e| {
            let name = e.entity.strip_prefix('&')?.strip_suffix(';')?;
            Some((name, e.characters))
        })
        .collect()
});

/// Look up a named entity by its name without `&` and `;`.
pub fn lookup(name: &str) -> Option<&'static str> {
    NAMED.get(name).copied()
}

/// Try to decode an entity at the start of `text`, which begins with `&`.
///
/// Returns the decoded text and the number of bytes consumed.
pub fn decode_at(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    if bytes.get(1) == Some(&b'#') {
        return decode_numeric(text);
    }

    let name_len = bytes[1..]
        .iter()
        .take(MAX_NAME_LEN + 1)
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || bytes.get(1 + name_len) != Some(&b';') {
        return None;
    }
    let name = &text[1..1 + name_len];
    lookup(name).map(|s| (s.to_string(), name_len + 2))
}

fn decode_numeric(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let (radix, digits_start, max_digits) = match bytes.get(2) {
        Some(b'x') | Some(b'X') => (16, 3, 6),
        _ => (10, 2, 7),
    };
    let digits = bytes[digits_start..]
        .iter()
        .take_while(|b| {
            if radix == 16 {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            }
        })
        .count();
    if digits == 0 || digits > max_digits || bytes.get(digits_start + digits) != Some(&b';') {
        return None;
    }
    let value = u32::from_str_radix(&text[digits_start..digits_start + digits], radix).ok()?;
    let ch = match value {
        0 => char::REPLACEMENT_CHARACTER,
        v => char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER),
    };
    Some((ch.to_string(), digits_start + digits + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_entity() {
        assert_eq!(decode_at("&amp;rest"), Some(("&".to_string(), 5)));
        assert_eq!(decode_at("&copy;"), Some(("\u{a9}".to_string(), 6)));
    }

    #[test]
    fn test_named_entity_requires_semicolon() {
        assert_eq!(decode_at("&amp rest"), None);
        assert_eq!(decode_at("&madeup;"), None);
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_at("&#35;"), Some(("#".to_string(), 5)));
        assert_eq!(decode_at("&#x22;"), Some(("\"".to_string(), 6)));
        assert_eq!(decode_at("&#0;"), Some(("\u{fffd}".to_string(), 4)));
        assert_eq!(decode_at("&#xD800;"), Some(("\u{fffd}".to_string(), 8)));
    }

    #[test]
    fn test_numeric_entity_digit_limits() {
        assert_eq!(decode_at("&#87654321;"), None);
        assert_eq!(decode_at("&#abcdef0;"), None);
        assert_eq!(decode_at("&#;"), None);
    }
}
