//! Non-fatal document checks
//!
//! Diagnostics describe states an editor should highlight (duplicate
//! aliases, dangling palette references) without refusing to import or
//! export the document.

use crate::color::{self, ResolvedColor};
use crate::types::{Config, ExtraPromptKind, Palette, Segment};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

/// A problem found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Alias used by more than one segment
    DuplicateAlias { path: String, alias: String },
    /// Alias that does not match `^[A-Za-z][A-Za-z0-9_]*$`
    InvalidAlias { path: String, alias: String },
    /// Tooltip with no trigger words
    TooltipWithoutTips { path: String },
    /// `p:` reference with no key in the active palette
    UnresolvedColor { path: String, key: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateAlias { path, alias } => {
                write!(f, "{}: alias '{}' is used by more than one segment", path, alias)
            }
            Diagnostic::InvalidAlias { path, alias } => write!(
                f,
                "{}: alias '{}' must start with a letter and contain only letters, digits or '_'",
                path, alias
            ),
            Diagnostic::TooltipWithoutTips { path } => {
                write!(f, "{}: tooltip has no tips and will never show", path)
            }
            Diagnostic::UnresolvedColor { path, key } => {
                write!(f, "{}: palette key '{}' is not defined", path, key)
            }
        }
    }
}

fn alias_pattern() -> &'static Regex {
    static ALIAS: OnceLock<Regex> = OnceLock::new();
    ALIAS.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("alias pattern is valid"))
}

/// Check an alias against the allowed pattern
pub fn is_valid_alias(alias: &str) -> bool {
    alias_pattern().is_match(alias)
}

/// Paths of every segment (and tooltip) whose alias is shared with another
///
/// Paths use the same form as diagnostics (`blocks[0].segments[2]`,
/// `tooltips[1]`), so they do not depend on ids having been assigned.
pub fn duplicate_alias_paths(config: &Config) -> HashSet<String> {
    let located = config
        .blocks
        .iter()
        .enumerate()
        .flat_map(|(bi, block)| {
            block
                .segments
                .iter()
                .enumerate()
                .map(move |(si, segment)| (format!("blocks[{}].segments[{}]", bi, si), segment))
        })
        .chain(
            config
                .tooltips
                .iter()
                .enumerate()
                .map(|(ti, tooltip)| (format!("tooltips[{}]", ti), &tooltip.segment)),
        );

    let mut by_alias: HashMap<&str, Vec<String>> = HashMap::new();
    for (path, segment) in located {
        if let Some(alias) = segment.alias.as_deref().filter(|a| !a.is_empty()) {
            by_alias.entry(alias).or_default().push(path);
        }
    }

    by_alias
        .into_values()
        .filter(|paths| paths.len() > 1)
        .flatten()
        .collect()
}

/// Run every check against the document
pub fn check(config: &Config, preview: Option<&str>) -> Vec<Diagnostic> {
    let palette = config.active_palette(preview);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for segment in config.all_segments() {
        if let Some(alias) = segment.alias.as_deref().filter(|a| !a.is_empty()) {
            *counts.entry(alias).or_default() += 1;
        }
    }

    let mut found = Vec::new();
    let check_segment = |path: String, segment: &Segment, found: &mut Vec<Diagnostic>| {
        if let Some(alias) = segment.alias.as_deref().filter(|a| !a.is_empty()) {
            if !is_valid_alias(alias) {
                found.push(Diagnostic::InvalidAlias {
                    path: path.clone(),
                    alias: alias.to_string(),
                });
            }
            if counts.get(alias).copied().unwrap_or(0) > 1 {
                found.push(Diagnostic::DuplicateAlias {
                    path: path.clone(),
                    alias: alias.to_string(),
                });
            }
        }
        check_color(&path, "foreground", segment.foreground.as_deref(), &palette, found);
        check_color(&path, "background", segment.background.as_deref(), &palette, found);
    };

    for (bi, block) in config.blocks.iter().enumerate() {
        for (si, segment) in block.segments.iter().enumerate() {
            check_segment(format!("blocks[{}].segments[{}]", bi, si), segment, &mut found);
        }
    }

    for (ti, tooltip) in config.tooltips.iter().enumerate() {
        let path = format!("tooltips[{}]", ti);
        if tooltip.tips.is_empty() {
            found.push(Diagnostic::TooltipWithoutTips { path: path.clone() });
        }
        check_segment(path, &tooltip.segment, &mut found);
    }

    for kind in ExtraPromptKind::all() {
        if let Some(prompt) = config.extra_prompt(*kind) {
            let path = kind.key().to_string();
            check_color(&path, "foreground", prompt.foreground.as_deref(), &palette, &mut found);
            check_color(&path, "background", prompt.background.as_deref(), &palette, &mut found);
        }
    }

    found
}

fn check_color(
    path: &str,
    field: &str,
    token: Option<&str>,
    palette: &Palette,
    found: &mut Vec<Diagnostic>,
) {
    let Some(token) = token else {
        return;
    };
    if let ResolvedColor::Unresolved(key) = color::resolve(token, palette) {
        found.push(Diagnostic::UnresolvedColor {
            path: format!("{}.{}", path, field),
            key,
        });
    }
}

impl Config {
    /// Run every document check; see [`check`]
    pub fn diagnostics(&self, preview: Option<&str>) -> Vec<Diagnostic> {
        check(self, preview)
    }
}
