//! Color token classification and resolution
//!
//! Segment colors are strings in one of several forms, checked in this order:
//! - `p:<key>` palette reference, looked up in the active palette
//! - context tokens (`parentBackground`, `accent`, ...) resolved by the renderer
//! - named colors (`red`, `lightBlue`, `transparent`, ...)
//! - hex literals (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`)
//!
//! Anything else is passed through as a literal the renderer may understand.

use crate::types::Palette;
use regex::Regex;
use std::sync::OnceLock;

/// Prefix of palette references
pub const PALETTE_PREFIX: &str = "p:";

/// Tokens whose color is only known at render time
pub const CONTEXT_TOKENS: &[&str] = &[
    "parentBackground",
    "parentForeground",
    "background",
    "foreground",
    "accent",
];

/// Named colors and the hex value used to preview them
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("red", "#cd3131"),
    ("green", "#0dbc79"),
    ("yellow", "#e5e510"),
    ("blue", "#2472c8"),
    ("magenta", "#bc3fbc"),
    ("cyan", "#11a8cd"),
    ("white", "#e5e5e5"),
    ("darkGray", "#666666"),
    ("lightRed", "#f14c4c"),
    ("lightGreen", "#23d18b"),
    ("lightYellow", "#f5f543"),
    ("lightBlue", "#3b8eea"),
    ("lightMagenta", "#d670d6"),
    ("lightCyan", "#29b8db"),
    ("lightWhite", "#ffffff"),
    ("default", "#ffffff"),
    ("transparent", "#00000000"),
];

/// What kind of color token a string is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorKind<'a> {
    /// `p:<key>` reference into the active palette
    PaletteRef(&'a str),
    /// Context-dependent token resolved by the renderer
    Context(&'a str),
    /// Entry of the named color table, with its hex value
    Named(&'static str),
    /// Hex literal
    Hex,
    /// Anything else
    Literal,
}

/// Outcome of resolving a color token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedColor {
    /// Concrete color value (hex)
    Concrete(String),
    /// Determined by the renderer at run time
    Dynamic(String),
    /// Palette reference with no matching key
    Unresolved(String),
    /// Uninterpreted literal passed through as-is
    Literal(String),
}

impl ResolvedColor {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ResolvedColor::Unresolved(_))
    }

    /// Concrete value, if the token resolved to one
    pub fn value(&self) -> Option<&str> {
        match self {
            ResolvedColor::Concrete(value) => Some(value),
            _ => None,
        }
    }
}

fn hex_pattern() -> &'static Regex {
    static HEX: OnceLock<Regex> = OnceLock::new();
    HEX.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
            .expect("hex color pattern is valid")
    })
}

/// Check whether a string is a hex color literal
pub fn is_hex(token: &str) -> bool {
    hex_pattern().is_match(token)
}

/// Look up a named color's hex value
pub fn named_color(name: &str) -> Option<&'static str> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, hex)| *hex)
}

/// Classify a token by pattern, in priority order
pub fn classify(token: &str) -> ColorKind<'_> {
    if let Some(key) = token.strip_prefix(PALETTE_PREFIX) {
        return ColorKind::PaletteRef(key);
    }
    if CONTEXT_TOKENS.contains(&token) {
        return ColorKind::Context(token);
    }
    if let Some(hex) = named_color(token) {
        return ColorKind::Named(hex);
    }
    if is_hex(token) {
        return ColorKind::Hex;
    }
    ColorKind::Literal
}

/// Resolve a token against a palette
///
/// Palette values may themselves be named colors or hex literals; they are
/// resolved one level further so previews get a concrete value.
pub fn resolve(token: &str, palette: &Palette) -> ResolvedColor {
    match classify(token) {
        ColorKind::PaletteRef(key) => match palette.get(key) {
            Some(value) => match classify(value) {
                ColorKind::Named(hex) => ResolvedColor::Concrete(hex.to_string()),
                ColorKind::Hex => ResolvedColor::Concrete(value.clone()),
                ColorKind::Context(name) => ResolvedColor::Dynamic(name.to_string()),
                // Nested palette references are not followed
                ColorKind::PaletteRef(_) | ColorKind::Literal => {
                    ResolvedColor::Literal(value.clone())
                }
            },
            None => ResolvedColor::Unresolved(key.to_string()),
        },
        ColorKind::Context(name) => ResolvedColor::Dynamic(name.to_string()),
        ColorKind::Named(hex) => ResolvedColor::Concrete(hex.to_string()),
        ColorKind::Hex => ResolvedColor::Concrete(token.to_string()),
        ColorKind::Literal => ResolvedColor::Literal(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::from([
            ("primary".to_string(), "#112233".to_string()),
            ("warn".to_string(), "yellow".to_string()),
            ("inherit".to_string(), "parentBackground".to_string()),
        ])
    }

    #[test]
    fn test_resolve_palette_reference() {
        assert_eq!(
            resolve("p:primary", &palette()),
            ResolvedColor::Concrete("#112233".to_string())
        );
    }

    #[test]
    fn test_resolve_missing_palette_reference() {
        let resolved = resolve("p:missing", &palette());
        assert_eq!(resolved, ResolvedColor::Unresolved("missing".to_string()));
        assert!(resolved.is_unresolved());
    }

    #[test]
    fn test_resolve_with_empty_palette() {
        assert!(resolve("p:primary", &Palette::new()).is_unresolved());
    }

    #[test]
    fn test_resolve_hex_unchanged() {
        assert_eq!(
            resolve("#abcdef", &palette()),
            ResolvedColor::Concrete("#abcdef".to_string())
        );
        assert_eq!(resolve("#abc", &palette()).value(), Some("#abc"));
    }

    #[test]
    fn test_resolve_context_tokens_are_dynamic() {
        for token in CONTEXT_TOKENS {
            assert_eq!(
                resolve(token, &palette()),
                ResolvedColor::Dynamic(token.to_string())
            );
        }
    }

    #[test]
    fn test_resolve_named_colors() {
        assert_eq!(resolve("white", &palette()).value(), Some("#e5e5e5"));
        assert_eq!(resolve("transparent", &palette()).value(), Some("#00000000"));
    }

    #[test]
    fn test_palette_values_resolve_one_level() {
        assert_eq!(resolve("p:warn", &palette()).value(), Some("#e5e510"));
        assert_eq!(
            resolve("p:inherit", &palette()),
            ResolvedColor::Dynamic("parentBackground".to_string())
        );
    }

    #[test]
    fn test_unknown_token_is_literal() {
        assert_eq!(
            resolve("{{ if .Error }}red{{ end }}", &palette()),
            ResolvedColor::Literal("{{ if .Error }}red{{ end }}".to_string())
        );
        assert_eq!(classify("#12345"), ColorKind::Literal);
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(classify("p:red"), ColorKind::PaletteRef("red"));
        assert_eq!(classify("background"), ColorKind::Context("background"));
        assert_eq!(classify("red"), ColorKind::Named("#cd3131"));
        assert_eq!(classify("#FFFFFF80"), ColorKind::Hex);
    }
}
