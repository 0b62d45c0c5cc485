//! # Canonical JSON
//!
//! Compact JSON in declaration field order with HTML-sensitive characters
//! escaped. Signers hash exactly these bytes, so the encoding is part of the
//! wire format and must not drift.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

/// Compact formatter that escapes `<`, `>`, `&`, U+2028 and U+2029 inside
/// strings as `\uXXXX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serializes `value` to canonical JSON bytes.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample<'a> {
        b: &'a str,
        a: Vec<&'a str>,
    }

    #[test]
    fn test_compact_and_ordered() {
        let out = to_vec(&Sample { b: "x", a: vec!["1", "2"] }).unwrap();
        assert_eq!(out, br#"{"b":"x","a":["1","2"]}"#);
    }

    #[test]
    fn test_html_characters_escaped() {
        let out = to_vec(&Sample { b: "<fleet & co>", a: vec![] }).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"b":"\u003cfleet \u0026 co\u003e","a":[]}"#
        );
    }

    #[test]
    fn test_line_separators_escaped() {
        let out = to_vec("a\u{2028}b\u{2029}").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#""a\u2028b\u2029""#);
    }

    #[test]
    fn test_standard_escapes_untouched() {
        let out = to_vec("quote\" slash\\ tab\t é").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"quote\\\" slash\\\\ tab\\t é\""
        );
    }
}
