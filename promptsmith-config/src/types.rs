//! Theme document data structures
//!
//! Field declaration order is the export order: serializing a [`Config`]
//! always yields keys in the sequence written here.

use crate::color::{self, ResolvedColor};
use crate::ids::IdGenerator;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Schema URL written when a document does not carry one
pub const DEFAULT_SCHEMA: &str =
    "https://raw.githubusercontent.com/JanDeDobbeleer/oh-my-posh/main/themes/schema.json";

/// Document version written when a document does not carry one
pub const DEFAULT_VERSION: u32 = 4;

/// Flat palette: key to color string
pub type Palette = IndexMap<String, String>;

/// Top-level theme document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Global rendering flags
    #[serde(flatten)]
    pub settings: GlobalSettings,

    /// Prompt blocks, rendered in order
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tooltips: Vec<Tooltip>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient_prompt: Option<ExtraPrompt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_prompt: Option<ExtraPrompt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_line: Option<ExtraPrompt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_line: Option<ExtraPrompt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_prompt: Option<ExtraPrompt>,

    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub palette: Option<Palette>,

    /// Palette variants selected by a template at render time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palettes: Option<PaletteSet>,

    /// Colors cycled through by consecutive segments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<CycleColor>>,

    /// Free-form template variables
    #[serde(default, skip_serializing_if = "is_none_or_empty")]
    pub var: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<Maps>,
}

/// Global flags controlling how the renderer behaves
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_space: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_integration: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_cursor_positioning: Option<bool>,

    /// Working directory protocol ("osc99", "osc7", "osc51")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_title_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_background: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltips_action: Option<TooltipsAction>,

    #[serde(rename = "async", default, skip_serializing_if = "Option::is_none")]
    pub async_loading: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_notice: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_pwsh_bleed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterm_features: Option<Vec<String>>,
}

/// How a tooltip combines with the regular right prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipsAction {
    Replace,
    Extend,
    Prefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Prompt,
    Rprompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
}

/// What a right-aligned block does when it does not fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    Break,
    Hide,
}

/// A row (or right-hand side) of segments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: BlockType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    /// Start the block on a new line
    #[serde(default, skip_serializing_if = "is_false")]
    pub newline: bool,

    /// Render even when every segment is empty
    #[serde(default, skip_serializing_if = "is_false")]
    pub force: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_diamond: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_diamond: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overflow: Option<Overflow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filler: Option<String>,

    /// 1-based override of the render position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Block {
    pub fn new(kind: BlockType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Create a left-aligned prompt block
    pub fn left_prompt() -> Self {
        Self {
            alignment: Some(Alignment::Left),
            ..Self::new(BlockType::Prompt)
        }
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStyle {
    Plain,
    #[default]
    Powerline,
    Diamond,
    Accordion,
}

impl SegmentStyle {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentStyle::Plain => "plain",
            SegmentStyle::Powerline => "powerline",
            SegmentStyle::Diamond => "diamond",
            SegmentStyle::Accordion => "accordion",
        }
    }
}

/// How multiple templates are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatesLogic {
    FirstMatch,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    Folder,
    Session,
    Device,
}

/// Segment result caching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentCache {
    /// Duration string understood by the renderer, e.g. "1h" or "none"
    pub duration: String,
    pub strategy: CacheStrategy,
}

/// A single piece of prompt output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, skip_serializing)]
    pub id: String,

    /// Segment kind from the renderer's catalog ("path", "git", ...)
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub style: SegmentStyle,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powerline_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_powerline_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub invert_powerline: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_diamond: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_diamond: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,

    /// Conditional foreground templates, first match wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreground_templates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub background_templates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_logic: Option<TemplatesLogic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub interactive: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_folders: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_folders: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<SegmentCache>,

    /// Segment-type specific options; keys are defined by segment metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl Segment {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: SegmentStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_colors(mut self, foreground: &str, background: &str) -> Self {
        self.foreground = Some(foreground.to_string());
        self.background = Some(background.to_string());
        self
    }

    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// A segment shown in the right prompt while typing one of `tips`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tooltip {
    #[serde(flatten)]
    pub segment: Segment,

    /// Command words that trigger the tooltip
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Tooltip {
    pub fn new(kind: impl Into<String>, tips: &[&str]) -> Self {
        Self {
            segment: Segment::new(kind),
            tips: tips.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.segment.id
    }
}

/// Secondary prompt slot (transient, valid line, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtraPrompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreground_templates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub background_templates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newline: Option<bool>,
}

impl ExtraPrompt {
    /// True when the prompt has no template, colors or filler and no newline
    ///
    /// Empty strings count as absent.
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
        blank(&self.template)
            && blank(&self.foreground)
            && blank(&self.background)
            && blank(&self.filler)
            && self.foreground_templates.is_empty()
            && self.background_templates.is_empty()
            && self.newline != Some(true)
    }
}

/// The five named extra prompt slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraPromptKind {
    Transient,
    Secondary,
    ValidLine,
    ErrorLine,
    Debug,
}

impl ExtraPromptKind {
    pub fn all() -> &'static [ExtraPromptKind] {
        &[
            ExtraPromptKind::Transient,
            ExtraPromptKind::Secondary,
            ExtraPromptKind::ValidLine,
            ExtraPromptKind::ErrorLine,
            ExtraPromptKind::Debug,
        ]
    }

    /// Document key for this slot
    pub fn key(&self) -> &'static str {
        match self {
            ExtraPromptKind::Transient => "transient_prompt",
            ExtraPromptKind::Secondary => "secondary_prompt",
            ExtraPromptKind::ValidLine => "valid_line",
            ExtraPromptKind::ErrorLine => "error_line",
            ExtraPromptKind::Debug => "debug_prompt",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.key() == s)
    }
}

/// Named palette variants plus the template that picks one at render time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaletteSet {
    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub list: IndexMap<String, Palette>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CycleColor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

/// Display name substitutions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Maps {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub user_name: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub host_name: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub shell_name: IndexMap<String, String>,
}

impl Config {
    /// Document holding the given blocks and nothing else
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Self::default()
        }
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    pub fn block_index(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }

    /// Locate a segment by id: (block index, segment index)
    pub fn segment_position(&self, segment_id: &str) -> Option<(usize, usize)> {
        self.blocks.iter().enumerate().find_map(|(bi, block)| {
            block
                .segments
                .iter()
                .position(|s| s.id == segment_id)
                .map(|si| (bi, si))
        })
    }

    pub fn segment(&self, segment_id: &str) -> Option<&Segment> {
        let (bi, si) = self.segment_position(segment_id)?;
        Some(&self.blocks[bi].segments[si])
    }

    pub fn tooltip_index(&self, tooltip_id: &str) -> Option<usize> {
        self.tooltips.iter().position(|t| t.segment.id == tooltip_id)
    }

    pub fn tooltip(&self, tooltip_id: &str) -> Option<&Tooltip> {
        self.tooltips.iter().find(|t| t.segment.id == tooltip_id)
    }

    /// All segments in document order: block segments first, then tooltips
    pub fn all_segments(&self) -> impl Iterator<Item = &Segment> {
        self.blocks
            .iter()
            .flat_map(|b| b.segments.iter())
            .chain(self.tooltips.iter().map(|t| &t.segment))
    }

    pub fn extra_prompt(&self, kind: ExtraPromptKind) -> Option<&ExtraPrompt> {
        match kind {
            ExtraPromptKind::Transient => self.transient_prompt.as_ref(),
            ExtraPromptKind::Secondary => self.secondary_prompt.as_ref(),
            ExtraPromptKind::ValidLine => self.valid_line.as_ref(),
            ExtraPromptKind::ErrorLine => self.error_line.as_ref(),
            ExtraPromptKind::Debug => self.debug_prompt.as_ref(),
        }
    }

    pub fn extra_prompt_slot(&mut self, kind: ExtraPromptKind) -> &mut Option<ExtraPrompt> {
        match kind {
            ExtraPromptKind::Transient => &mut self.transient_prompt,
            ExtraPromptKind::Secondary => &mut self.secondary_prompt,
            ExtraPromptKind::ValidLine => &mut self.valid_line,
            ExtraPromptKind::ErrorLine => &mut self.error_line,
            ExtraPromptKind::Debug => &mut self.debug_prompt,
        }
    }

    /// Palette used to resolve `p:` references
    ///
    /// A previewed variant wins when it exists in `palettes.list`; otherwise
    /// the flat palette is used. No palette at all yields an empty map.
    pub fn active_palette(&self, preview: Option<&str>) -> Palette {
        if let Some(name) = preview {
            if let Some(variant) = self.palettes.as_ref().and_then(|set| set.list.get(name)) {
                return variant.clone();
            }
        }
        self.palette.clone().unwrap_or_default()
    }

    /// Resolve a color token against the active palette
    pub fn resolve_color(&self, token: &str, preview: Option<&str>) -> ResolvedColor {
        color::resolve(token, &self.active_palette(preview))
    }

    /// Give every block, segment and tooltip without an id a fresh one
    ///
    /// Ids that are already present are kept, except for repeats of an id
    /// seen earlier in the document, which are replaced.
    pub fn assign_missing_ids(&mut self, ids: &dyn IdGenerator) {
        let mut seen = HashSet::new();
        let mut ensure = |id: &mut String, kind: &str| {
            if id.is_empty() || !seen.insert(id.clone()) {
                *id = ids.next_id(kind);
                seen.insert(id.clone());
            }
        };

        for block in &mut self.blocks {
            ensure(&mut block.id, "block");
            for segment in &mut block.segments {
                ensure(&mut segment.id, "segment");
            }
        }
        for tooltip in &mut self.tooltips {
            ensure(&mut tooltip.segment.id, "tooltip");
        }
    }

    /// Blank every identifier (used before comparing documents structurally)
    pub fn clear_ids(&mut self) {
        for block in &mut self.blocks {
            block.id.clear();
            for segment in &mut block.segments {
                segment.id.clear();
            }
        }
        for tooltip in &mut self.tooltips {
            tooltip.segment.id.clear();
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_none_or_empty<K, V>(map: &Option<IndexMap<K, V>>) -> bool {
    map.as_ref().map_or(true, IndexMap::is_empty)
}
