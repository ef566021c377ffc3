//! Built-in default theme
//!
//! Used for new editing sessions and "reset to default".

use crate::types::{
    Alignment, Block, BlockType, Config, Palette, Segment, SegmentStyle, DEFAULT_SCHEMA,
    DEFAULT_VERSION,
};

/// The theme a fresh session starts from (without ids)
pub fn default_config() -> Config {
    let session = Segment {
        leading_diamond: Some("\u{e0b6}".to_string()),
        trailing_diamond: Some("\u{e0b0}".to_string()),
        ..Segment::new("session")
            .with_style(SegmentStyle::Diamond)
            .with_colors("p:white", "p:blue")
            .with_template(" {{ .UserName }} ")
    };

    let path = Segment {
        powerline_symbol: Some("\u{e0b0}".to_string()),
        ..Segment::new("path")
            .with_colors("p:black", "p:pink")
            .with_template(" \u{f07b} {{ .Path }} ")
            .with_option("style", "folder")
    };

    let git = Segment {
        powerline_symbol: Some("\u{e0b0}".to_string()),
        background_templates: vec![
            "{{ if or (.Working.Changed) (.Staging.Changed) }}p:yellow{{ end }}".to_string(),
            "{{ if gt .Ahead 0 }}p:orange{{ end }}".to_string(),
        ],
        ..Segment::new("git")
            .with_colors("p:black", "p:lime")
            .with_template(" {{ .HEAD }} ")
            .with_option("fetch_status", true)
    };

    let exit = Segment {
        background_templates: vec!["{{ if gt .Code 0 }}p:red{{ end }}".to_string()],
        trailing_diamond: Some("\u{e0b4}".to_string()),
        ..Segment::new("status")
            .with_style(SegmentStyle::Diamond)
            .with_colors("p:white", "p:blue")
            .with_template(" \u{e23a} ")
            .with_option("always_enabled", true)
    };

    let palette = Palette::from(
        [
            ("black", "#262B44"),
            ("blue", "#4B95E9"),
            ("lime", "#95ffa4"),
            ("orange", "#F07623"),
            ("pink", "#F3AE35"),
            ("red", "#D81E5B"),
            ("white", "#E0DEF4"),
            ("yellow", "#F3AE35"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    Config {
        schema: Some(DEFAULT_SCHEMA.to_string()),
        version: Some(DEFAULT_VERSION),
        blocks: vec![Block {
            alignment: Some(Alignment::Left),
            ..Block::new(BlockType::Prompt).with_segments(vec![session, path, git, exit])
        }],
        palette: Some(palette),
        ..Config::default()
    }
}
