//! Conversion between raw characters and `\uXXXX` escape text
//!
//! Prompt themes are full of private-use glyphs (powerline arrows, nerd font
//! icons). The JSON exporter writes every non-ASCII character as an escape so
//! the files survive editors and terminals with broken encodings; the same
//! helpers let editors show and accept the escaped form.

use std::fmt::Write;

/// Escape every character above U+007F as `\uXXXX`
///
/// Characters outside the basic multilingual plane are written as a UTF-16
/// surrogate pair of escapes, matching what JSON parsers expect.
pub fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units) {
            // Writing into a String cannot fail
            let _ = write!(out, "\\u{:04x}", unit);
        }
    }
    out
}

/// Decode `\uXXXX` escapes back into characters
///
/// Surrogate pairs are joined. Malformed escapes and lone surrogates are
/// left in the output verbatim.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("\\u") {
        out.push_str(&rest[..pos]);
        let escape = &rest[pos..];

        let Some(high) = parse_unit(escape) else {
            out.push_str("\\u");
            rest = &escape[2..];
            continue;
        };

        if (0xD800..0xDC00).contains(&high) {
            if let Some(low) = parse_unit(&escape[6..]).filter(|u| (0xDC00..0xE000).contains(u)) {
                let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                if let Some(ch) = char::from_u32(code) {
                    out.push(ch);
                    rest = &escape[12..];
                    continue;
                }
            }
            out.push_str(&escape[..6]);
            rest = &escape[6..];
            continue;
        }

        match char::from_u32(u32::from(high)) {
            Some(ch) => out.push(ch),
            None => out.push_str(&escape[..6]),
        }
        rest = &escape[6..];
    }

    out.push_str(rest);
    out
}

/// Label a character by its code point, e.g. `U+E0B0`
pub fn code_point_label(ch: char) -> String {
    format!("U+{:04X}", u32::from(ch))
}

/// Parse the four hex digits of a `\uXXXX` escape at the start of `text`
fn parse_unit(text: &str) -> Option<u16> {
    let digits = text.strip_prefix("\\u")?.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}
