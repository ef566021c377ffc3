//! Mutation engine for the live theme document
//!
//! [`Editor`] owns the document and is the only thing that changes it. Every
//! operation is synchronous and all-or-nothing: it either applies completely
//! and publishes [`EditorEvent::Edited`](crate::events::EditorEvent), or it
//! leaves the document untouched. Operations that name a block, segment or
//! tooltip that no longer exists are no-ops that return `false` (or `None`);
//! UI races with stale ids are expected and not errors.
//!
//! The document is held in an `Arc` and cloned on write, so event
//! subscribers receive cheap immutable snapshots.

use crate::events::EditorEvents;
use promptsmith_config::defaults::default_config;
use promptsmith_config::parser::import_with_ids;
use promptsmith_config::types::{CycleColor, GlobalSettings};
use promptsmith_config::{
    export, Block, Config, Diagnostic, ExtraPrompt, ExtraPromptKind, Format, IdGenerator,
    Palette, PaletteSet, ResolvedColor, Segment, Tooltip,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// The single active selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Block(String),
    Segment(String),
    Tooltip(String),
}

pub struct Editor {
    config: Arc<Config>,
    selection: Option<Selection>,
    /// Palette variant used for color previews
    preview_palette: Option<String>,
    ids: Arc<dyn IdGenerator>,
    events: EditorEvents,
}

impl Editor {
    /// Start a session on the built-in default theme
    pub fn new(ids: Arc<dyn IdGenerator>, events: EditorEvents) -> Self {
        Self::with_config(default_config(), ids, events)
    }

    /// Start a session on the given document (missing ids are assigned)
    pub fn with_config(
        mut config: Config,
        ids: Arc<dyn IdGenerator>,
        events: EditorEvents,
    ) -> Self {
        config.assign_missing_ids(ids.as_ref());
        Self {
            config: Arc::new(config),
            selection: None,
            preview_palette: None,
            ids,
            events,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cheap shared snapshot of the current document
    pub fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub fn events(&self) -> &EditorEvents {
        &self.events
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_block_id(&self) -> Option<&str> {
        match &self.selection {
            Some(Selection::Block(id)) => Some(id),
            _ => None,
        }
    }

    pub fn selected_segment_id(&self) -> Option<&str> {
        match &self.selection {
            Some(Selection::Segment(id)) => Some(id),
            _ => None,
        }
    }

    pub fn selected_tooltip_id(&self) -> Option<&str> {
        match &self.selection {
            Some(Selection::Tooltip(id)) => Some(id),
            _ => None,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn preview_palette(&self) -> Option<&str> {
        self.preview_palette.as_deref()
    }

    // ---- whole document ----

    /// Replace the document with unsaved content (accepted draft, ...)
    ///
    /// Selection and palette preview are cleared. A document without blocks
    /// is refused and `false` returned.
    pub fn load(&mut self, config: Config) -> bool {
        self.swap(config, false)
    }

    /// Make a saved config from the library the live document
    ///
    /// Like [`Editor::load`], but subscribers see
    /// [`EditorEvent::Loaded`](crate::events::EditorEvent) and drop the draft.
    pub fn open_saved(&mut self, config: Config) -> bool {
        self.swap(config, true)
    }

    /// Go back to the built-in default theme
    pub fn reset(&mut self) {
        self.swap(default_config(), false);
    }

    /// Import theme text and load it; the current document is kept on error
    pub fn import(&mut self, text: &str, hint: &str) -> promptsmith_config::Result<()> {
        let config = import_with_ids(text, hint, self.ids.as_ref())?;
        self.swap(config, false);
        Ok(())
    }

    fn swap(&mut self, mut config: Config, saved: bool) -> bool {
        if config.blocks.is_empty() {
            warn!("Refusing to load a theme without blocks");
            return false;
        }
        config.assign_missing_ids(self.ids.as_ref());
        self.config = Arc::new(config);
        self.selection = None;
        self.preview_palette = None;
        debug!("Loaded theme with {} block(s)", self.config.blocks.len());
        if saved {
            self.events.emit_loaded(self.snapshot());
        } else {
            self.events.emit_replaced(self.snapshot());
        }
        true
    }

    pub fn export(&self, format: Format) -> promptsmith_config::Result<String> {
        export(&self.config, format)
    }

    pub fn active_palette(&self) -> Palette {
        self.config.active_palette(self.preview_palette.as_deref())
    }

    pub fn resolve_color(&self, token: &str) -> ResolvedColor {
        self.config
            .resolve_color(token, self.preview_palette.as_deref())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.config.diagnostics(self.preview_palette.as_deref())
    }

    /// Apply a change to global flags
    pub fn update_settings(&mut self, update: impl FnOnce(&mut GlobalSettings)) {
        update(&mut self.doc().settings);
        self.commit();
    }

    pub fn set_cycle(&mut self, cycle: Option<Vec<CycleColor>>) {
        self.doc().cycle = cycle;
        self.commit();
    }

    // ---- blocks ----

    /// Append a block, returning its id
    pub fn add_block(&mut self, mut block: Block) -> String {
        let mut taken = self.taken_ids();
        self.claim_block(&mut taken, &mut block);
        let id = block.id.clone();
        self.doc().blocks.push(block);
        self.commit();
        id
    }

    /// Change a block in place
    ///
    /// The block keeps its id; segments left without a unique id get one.
    pub fn update_block(&mut self, block_id: &str, update: impl FnOnce(&mut Block)) -> bool {
        let Some(bi) = self.config.block_index(block_id) else {
            return false;
        };
        let ids = Arc::clone(&self.ids);
        let doc = self.doc();
        update(&mut doc.blocks[bi]);
        doc.blocks[bi].id = block_id.to_string();
        doc.assign_missing_ids(ids.as_ref());
        self.reconcile_selection();
        self.commit();
        true
    }

    /// Remove a block and its segments
    ///
    /// A theme always keeps at least one block, so removing the last one is
    /// refused.
    pub fn remove_block(&mut self, block_id: &str) -> bool {
        let Some(bi) = self.config.block_index(block_id) else {
            return false;
        };
        if self.config.blocks.len() == 1 {
            debug!("Refusing to remove the only block {}", block_id);
            return false;
        }
        self.doc().blocks.remove(bi);
        self.reconcile_selection();
        self.commit();
        true
    }

    /// Move the block at `from` so it ends up at `to`
    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> bool {
        let len = self.config.blocks.len();
        if from >= len || to >= len {
            return false;
        }
        move_item(&mut self.doc().blocks, from, to);
        self.commit();
        true
    }

    pub fn select_block(&mut self, block_id: &str) -> bool {
        if self.config.block(block_id).is_none() {
            return false;
        }
        self.selection = Some(Selection::Block(block_id.to_string()));
        true
    }

    // ---- segments ----

    /// Insert a segment into a block at `index` (appended when absent or
    /// past the end), returning its id
    pub fn add_segment(
        &mut self,
        block_id: &str,
        mut segment: Segment,
        index: Option<usize>,
    ) -> Option<String> {
        let bi = self.config.block_index(block_id)?;
        let mut taken = self.taken_ids();
        self.claim(&mut taken, &mut segment.id, "segment");
        let id = segment.id.clone();

        let segments = &mut self.doc().blocks[bi].segments;
        let at = index.unwrap_or(segments.len()).min(segments.len());
        segments.insert(at, segment);
        self.commit();
        Some(id)
    }

    pub fn update_segment(
        &mut self,
        block_id: &str,
        segment_id: &str,
        update: impl FnOnce(&mut Segment),
    ) -> bool {
        let Some((bi, si)) = self.find_segment(block_id, segment_id) else {
            return false;
        };
        let segment = &mut self.doc().blocks[bi].segments[si];
        update(segment);
        segment.id = segment_id.to_string();
        self.commit();
        true
    }

    pub fn remove_segment(&mut self, block_id: &str, segment_id: &str) -> bool {
        let Some((bi, si)) = self.find_segment(block_id, segment_id) else {
            return false;
        };
        self.doc().blocks[bi].segments.remove(si);
        self.reconcile_selection();
        self.commit();
        true
    }

    /// Move a segment by position, within one block or across two
    ///
    /// The segment is removed first and then inserted at `to_index` in the
    /// resulting list (clamped to its end).
    pub fn move_segment(
        &mut self,
        from_block_id: &str,
        to_block_id: &str,
        from_index: usize,
        to_index: usize,
    ) -> bool {
        let (Some(from), Some(to)) = (
            self.config.block_index(from_block_id),
            self.config.block_index(to_block_id),
        ) else {
            return false;
        };
        if from_index >= self.config.blocks[from].segments.len() {
            return false;
        }

        let doc = self.doc();
        let segment = doc.blocks[from].segments.remove(from_index);
        let target = &mut doc.blocks[to].segments;
        let at = to_index.min(target.len());
        target.insert(at, segment);
        self.commit();
        true
    }

    /// Insert a copy right after the original, returning the copy's id
    pub fn duplicate_segment(&mut self, block_id: &str, segment_id: &str) -> Option<String> {
        let (bi, si) = self.find_segment(block_id, segment_id)?;
        let mut copy = self.config.blocks[bi].segments[si].clone();
        copy.id = self.ids.next_id("segment");
        let id = copy.id.clone();
        self.doc().blocks[bi].segments.insert(si + 1, copy);
        self.commit();
        Some(id)
    }

    pub fn select_segment(&mut self, segment_id: &str) -> bool {
        if self.config.segment_position(segment_id).is_none() {
            return false;
        }
        self.selection = Some(Selection::Segment(segment_id.to_string()));
        true
    }

    // ---- tooltips ----

    pub fn add_tooltip(&mut self, mut tooltip: Tooltip, index: Option<usize>) -> String {
        let mut taken = self.taken_ids();
        self.claim(&mut taken, &mut tooltip.segment.id, "tooltip");
        let id = tooltip.segment.id.clone();

        let tooltips = &mut self.doc().tooltips;
        let at = index.unwrap_or(tooltips.len()).min(tooltips.len());
        tooltips.insert(at, tooltip);
        self.commit();
        id
    }

    pub fn update_tooltip(&mut self, tooltip_id: &str, update: impl FnOnce(&mut Tooltip)) -> bool {
        let Some(ti) = self.config.tooltip_index(tooltip_id) else {
            return false;
        };
        let tooltip = &mut self.doc().tooltips[ti];
        update(tooltip);
        tooltip.segment.id = tooltip_id.to_string();
        self.commit();
        true
    }

    pub fn remove_tooltip(&mut self, tooltip_id: &str) -> bool {
        let Some(ti) = self.config.tooltip_index(tooltip_id) else {
            return false;
        };
        self.doc().tooltips.remove(ti);
        self.reconcile_selection();
        self.commit();
        true
    }

    pub fn duplicate_tooltip(&mut self, tooltip_id: &str) -> Option<String> {
        let ti = self.config.tooltip_index(tooltip_id)?;
        let mut copy = self.config.tooltips[ti].clone();
        copy.segment.id = self.ids.next_id("tooltip");
        let id = copy.segment.id.clone();
        self.doc().tooltips.insert(ti + 1, copy);
        self.commit();
        Some(id)
    }

    pub fn reorder_tooltips(&mut self, from: usize, to: usize) -> bool {
        let len = self.config.tooltips.len();
        if from >= len || to >= len {
            return false;
        }
        move_item(&mut self.doc().tooltips, from, to);
        self.commit();
        true
    }

    pub fn select_tooltip(&mut self, tooltip_id: &str) -> bool {
        if self.config.tooltip_index(tooltip_id).is_none() {
            return false;
        }
        self.selection = Some(Selection::Tooltip(tooltip_id.to_string()));
        true
    }

    // ---- palettes ----

    pub fn set_palette(&mut self, palette: Option<Palette>) {
        self.doc().palette = palette;
        self.commit();
    }

    /// Add or overwrite one flat palette entry (creating the palette)
    pub fn set_palette_color(&mut self, key: &str, value: &str) {
        self.doc()
            .palette
            .get_or_insert_with(Palette::new)
            .insert(key.to_string(), value.to_string());
        self.commit();
    }

    pub fn remove_palette_color(&mut self, key: &str) -> bool {
        let present = self
            .config
            .palette
            .as_ref()
            .is_some_and(|p| p.contains_key(key));
        if !present {
            return false;
        }
        if let Some(palette) = self.doc().palette.as_mut() {
            palette.shift_remove(key);
        }
        self.commit();
        true
    }

    /// Replace the whole palette set
    pub fn set_palettes(&mut self, palettes: Option<PaletteSet>) {
        self.doc().palettes = palettes;
        self.reconcile_preview();
        self.commit();
    }

    pub fn set_palettes_template(&mut self, template: &str) {
        self.doc()
            .palettes
            .get_or_insert_with(PaletteSet::default)
            .template = template.to_string();
        self.commit();
    }

    /// Add or replace a named palette variant
    pub fn set_palette_variant(&mut self, name: &str, palette: Palette) {
        self.doc()
            .palettes
            .get_or_insert_with(PaletteSet::default)
            .list
            .insert(name.to_string(), palette);
        self.commit();
    }

    /// Rename a variant in place; fails if `new` is already taken
    pub fn rename_palette_variant(&mut self, old: &str, new: &str) -> bool {
        let Some(set) = self.config.palettes.as_ref() else {
            return false;
        };
        if old == new || !set.list.contains_key(old) || set.list.contains_key(new) {
            return false;
        }

        if let Some(set) = self.doc().palettes.as_mut() {
            set.list = std::mem::take(&mut set.list)
                .into_iter()
                .map(|(name, palette)| {
                    if name == old {
                        (new.to_string(), palette)
                    } else {
                        (name, palette)
                    }
                })
                .collect();
        }
        if self.preview_palette.as_deref() == Some(old) {
            self.preview_palette = Some(new.to_string());
        }
        self.commit();
        true
    }

    /// Remove a variant; previewing it stops
    pub fn remove_palette_variant(&mut self, name: &str) -> bool {
        let present = self
            .config
            .palettes
            .as_ref()
            .is_some_and(|set| set.list.contains_key(name));
        if !present {
            return false;
        }
        if let Some(set) = self.doc().palettes.as_mut() {
            set.list.shift_remove(name);
        }
        self.reconcile_preview();
        self.commit();
        true
    }

    /// Preview colors with a variant (`None` goes back to the flat palette)
    ///
    /// Previewing changes no document state, so no event is published.
    pub fn preview_palette_variant(&mut self, name: Option<&str>) -> bool {
        match name {
            None => {
                self.preview_palette = None;
                true
            }
            Some(name) => {
                let exists = self
                    .config
                    .palettes
                    .as_ref()
                    .is_some_and(|set| set.list.contains_key(name));
                if exists {
                    self.preview_palette = Some(name.to_string());
                }
                exists
            }
        }
    }

    // ---- extra prompts ----

    /// Replace an extra prompt slot as given
    pub fn set_extra_prompt(&mut self, kind: ExtraPromptKind, prompt: Option<ExtraPrompt>) {
        *self.doc().extra_prompt_slot(kind) = prompt;
        self.commit();
    }

    /// Merge a change into an extra prompt, creating it when absent
    ///
    /// If the result is empty (see [`ExtraPrompt::is_empty`]) the slot is
    /// removed entirely.
    pub fn update_extra_prompt(
        &mut self,
        kind: ExtraPromptKind,
        update: impl FnOnce(&mut ExtraPrompt),
    ) {
        let slot = self.doc().extra_prompt_slot(kind);
        let mut prompt = slot.take().unwrap_or_default();
        update(&mut prompt);
        if !prompt.is_empty() {
            *slot = Some(prompt);
        }
        self.commit();
    }

    // ---- internals ----

    fn doc(&mut self) -> &mut Config {
        Arc::make_mut(&mut self.config)
    }

    fn commit(&self) {
        self.events.emit_edited(self.snapshot());
    }

    fn find_segment(&self, block_id: &str, segment_id: &str) -> Option<(usize, usize)> {
        let bi = self.config.block_index(block_id)?;
        let si = self.config.blocks[bi]
            .segments
            .iter()
            .position(|s| s.id == segment_id)?;
        Some((bi, si))
    }

    fn taken_ids(&self) -> HashSet<String> {
        let blocks = self.config.blocks.iter().flat_map(|b| {
            std::iter::once(b.id.clone()).chain(b.segments.iter().map(|s| s.id.clone()))
        });
        let tooltips = self.config.tooltips.iter().map(|t| t.segment.id.clone());
        blocks.chain(tooltips).collect()
    }

    /// Keep a caller-supplied id only when it is set and unused
    fn claim(&self, taken: &mut HashSet<String>, id: &mut String, kind: &str) {
        if id.is_empty() || taken.contains(id.as_str()) {
            *id = self.ids.next_id(kind);
        }
        taken.insert(id.clone());
    }

    fn claim_block(&self, taken: &mut HashSet<String>, block: &mut Block) {
        self.claim(taken, &mut block.id, "block");
        for segment in &mut block.segments {
            self.claim(taken, &mut segment.id, "segment");
        }
    }

    /// Drop the selection if its target is gone
    fn reconcile_selection(&mut self) {
        let alive = match &self.selection {
            None => true,
            Some(Selection::Block(id)) => self.config.block(id).is_some(),
            Some(Selection::Segment(id)) => self.config.segment_position(id).is_some(),
            Some(Selection::Tooltip(id)) => self.config.tooltip_index(id).is_some(),
        };
        if !alive {
            self.selection = None;
        }
    }

    fn reconcile_preview(&mut self) {
        if let Some(name) = &self.preview_palette {
            let exists = self
                .config
                .palettes
                .as_ref()
                .is_some_and(|set| set.list.contains_key(name));
            if !exists {
                self.preview_palette = None;
            }
        }
    }
}

/// Remove-then-insert; indices already checked
fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EditorEvent;
    use promptsmith_config::{BlockType, SequentialIds};

    fn editor_with(config: Config) -> Editor {
        Editor::with_config(config, Arc::new(SequentialIds::new()), EditorEvents::new())
    }

    /// Block A = [s1, s2, s3], block B = []
    fn two_blocks() -> Editor {
        let segments = ["s1", "s2", "s3"]
            .iter()
            .map(|id| Segment {
                id: id.to_string(),
                ..Segment::new("text")
            })
            .collect();
        let a = Block {
            id: "A".to_string(),
            ..Block::left_prompt().with_segments(segments)
        };
        let b = Block {
            id: "B".to_string(),
            ..Block::new(BlockType::Rprompt)
        };
        editor_with(Config::with_blocks(vec![a, b]))
    }

    fn segment_ids(editor: &Editor, block_id: &str) -> Vec<String> {
        editor
            .config()
            .block(block_id)
            .unwrap()
            .segments
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    #[test]
    fn test_move_segment_across_blocks() {
        let mut editor = two_blocks();
        assert!(editor.move_segment("A", "B", 0, 0));
        assert_eq!(segment_ids(&editor, "A"), ["s2", "s3"]);
        assert_eq!(segment_ids(&editor, "B"), ["s1"]);
    }

    #[test]
    fn test_move_segment_within_block() {
        let mut editor = two_blocks();
        assert!(editor.move_segment("A", "A", 0, 2));
        assert_eq!(segment_ids(&editor, "A"), ["s2", "s3", "s1"]);

        assert!(editor.move_segment("A", "A", 2, 0));
        assert_eq!(segment_ids(&editor, "A"), ["s1", "s2", "s3"]);
    }

    #[test]
    fn test_move_segment_clamps_target_and_rejects_bad_source() {
        let mut editor = two_blocks();
        assert!(editor.move_segment("A", "B", 1, 10));
        assert_eq!(segment_ids(&editor, "B"), ["s2"]);
        assert!(!editor.move_segment("A", "B", 5, 0));
        assert!(!editor.move_segment("gone", "B", 0, 0));
        assert_eq!(segment_ids(&editor, "A"), ["s1", "s3"]);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut editor = two_blocks();
        assert!(editor.select_block("A"));
        assert!(editor.select_segment("s2"));
        assert_eq!(editor.selected_block_id(), None);
        assert_eq!(editor.selected_segment_id(), Some("s2"));

        let tip = editor.add_tooltip(Tooltip::new("git", &["git"]), None);
        assert!(editor.select_tooltip(&tip));
        assert_eq!(editor.selected_segment_id(), None);
        assert_eq!(editor.selection(), Some(&Selection::Tooltip(tip)));
    }

    #[test]
    fn test_select_stale_id_keeps_selection() {
        let mut editor = two_blocks();
        editor.select_segment("s1");
        assert!(!editor.select_block("gone"));
        assert_eq!(editor.selected_segment_id(), Some("s1"));
    }

    #[test]
    fn test_remove_selected_segment_clears_selection() {
        let mut editor = two_blocks();
        editor.select_segment("s2");
        assert!(editor.remove_segment("A", "s2"));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_remove_block_clears_selected_segment() {
        let mut editor = two_blocks();
        editor.select_segment("s3");
        assert!(editor.remove_block("A"));
        assert_eq!(editor.selected_segment_id(), None);
        assert_eq!(editor.selected_block_id(), None);
    }

    #[test]
    fn test_remove_other_segment_keeps_selection() {
        let mut editor = two_blocks();
        editor.select_segment("s2");
        assert!(editor.remove_segment("A", "s1"));
        assert_eq!(editor.selected_segment_id(), Some("s2"));
    }

    #[test]
    fn test_last_block_cannot_be_removed() {
        let mut editor = two_blocks();
        assert!(editor.remove_block("B"));
        assert!(!editor.remove_block("A"));
        assert_eq!(editor.config().blocks.len(), 1);
    }

    #[test]
    fn test_stale_ids_are_noops() {
        let mut editor = two_blocks();
        let before = editor.snapshot();
        assert!(!editor.remove_segment("A", "missing"));
        assert!(!editor.remove_segment("B", "s1"));
        assert!(!editor.update_block("missing", |b| b.newline = true));
        assert!(!editor.update_segment("A", "missing", |s| s.kind = "git".into()));
        assert_eq!(editor.duplicate_segment("A", "missing"), None);
        assert_eq!(editor.add_segment("missing", Segment::new("git"), None), None);
        assert!(!editor.remove_tooltip("missing"));
        assert!(!editor.reorder_blocks(0, 5));
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
    }

    #[test]
    fn test_duplicate_segment_lands_after_original() {
        let mut editor = two_blocks();
        editor.update_segment("A", "s2", |s| s.alias = Some("Two".into()));
        let copy = editor.duplicate_segment("A", "s2").unwrap();
        assert_eq!(segment_ids(&editor, "A"), ["s1", "s2", copy.as_str(), "s3"]);

        let original = editor.config().segment("s2").unwrap().clone();
        let duplicate = editor.config().segment(&copy).unwrap().clone();
        assert_ne!(original.id, duplicate.id);
        assert_eq!(Segment { id: String::new(), ..original }, Segment { id: String::new(), ..duplicate });
    }

    #[test]
    fn test_add_segment_at_index_and_fresh_id() {
        let mut editor = two_blocks();
        // Colliding caller id is replaced
        let segment = Segment {
            id: "s1".to_string(),
            ..Segment::new("git")
        };
        let id = editor.add_segment("A", segment, Some(1)).unwrap();
        assert_ne!(id, "s1");
        assert_eq!(segment_ids(&editor, "A"), ["s1", id.as_str(), "s2", "s3"]);

        let tail = editor.add_segment("A", Segment::new("time"), Some(99)).unwrap();
        assert_eq!(segment_ids(&editor, "A").last(), Some(&tail));
    }

    #[test]
    fn test_update_segment_keeps_id() {
        let mut editor = two_blocks();
        assert!(editor.update_segment("A", "s1", |s| {
            s.id = "hijack".into();
            s.template = Some("{{ .Path }}".into());
        }));
        let segment = editor.config().segment("s1").unwrap();
        assert_eq!(segment.template.as_deref(), Some("{{ .Path }}"));
    }

    #[test]
    fn test_update_block_repairs_segment_ids() {
        let mut editor = two_blocks();
        editor.select_segment("s3");
        assert!(editor.update_block("A", |block| {
            block.segments.pop();
            block.segments.push(Segment::new("git"));
            block.newline = true;
        }));
        let block = editor.config().block("A").unwrap();
        assert!(block.newline);
        assert!(block.segments.iter().all(|s| !s.id.is_empty()));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_add_block_assigns_ids() {
        let mut editor = two_blocks();
        let block = Block::left_prompt().with_segments(vec![Segment::new("path")]);
        let id = editor.add_block(block);
        let added = editor.config().block(&id).unwrap();
        assert!(!added.segments[0].id.is_empty());
        assert_eq!(editor.config().blocks.last().unwrap().id, id);
    }

    #[test]
    fn test_reorder_blocks_and_tooltips() {
        let mut editor = two_blocks();
        let c = editor.add_block(Block::left_prompt());
        assert!(editor.reorder_blocks(2, 0));
        let order: Vec<&str> = editor.config().blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, [c.as_str(), "A", "B"]);

        let t1 = editor.add_tooltip(Tooltip::new("git", &["git"]), None);
        let t2 = editor.add_tooltip(Tooltip::new("aws", &["aws"]), None);
        let t0 = editor.add_tooltip(Tooltip::new("kubectl", &["k"]), Some(0));
        assert!(editor.reorder_tooltips(0, 2));
        let order: Vec<&str> = editor.config().tooltips.iter().map(|t| t.id()).collect();
        assert_eq!(order, [t1.as_str(), t2.as_str(), t0.as_str()]);
    }

    #[test]
    fn test_duplicate_and_remove_tooltip() {
        let mut editor = two_blocks();
        let t1 = editor.add_tooltip(Tooltip::new("git", &["git", "g"]), None);
        let copy = editor.duplicate_tooltip(&t1).unwrap();
        assert_eq!(editor.config().tooltips[1].id(), copy);
        assert_eq!(editor.config().tooltips[1].tips, ["git", "g"]);

        editor.select_tooltip(&copy);
        assert!(editor.remove_tooltip(&copy));
        assert_eq!(editor.selection(), None);
        assert!(editor.update_tooltip(&t1, |t| t.tips.push("gs".into())));
        assert_eq!(editor.config().tooltips[0].tips.len(), 3);
    }

    #[test]
    fn test_extra_prompt_collapses_when_empty() {
        let mut editor = two_blocks();
        editor.update_extra_prompt(ExtraPromptKind::Transient, |p| p.template = Some(String::new()));
        assert!(editor.config().transient_prompt.is_none());

        editor.update_extra_prompt(ExtraPromptKind::Transient, |p| p.template = Some("> ".into()));
        editor.update_extra_prompt(ExtraPromptKind::Transient, |p| p.foreground = Some("red".into()));
        let prompt = editor.config().transient_prompt.clone().unwrap();
        assert_eq!(prompt.template.as_deref(), Some("> "));
        assert_eq!(prompt.foreground.as_deref(), Some("red"));

        editor.update_extra_prompt(ExtraPromptKind::Transient, |p| *p = ExtraPrompt::default());
        assert!(editor.config().transient_prompt.is_none());
    }

    #[test]
    fn test_extra_prompt_newline_alone_is_kept() {
        let mut editor = two_blocks();
        editor.update_extra_prompt(ExtraPromptKind::ValidLine, |p| p.newline = Some(true));
        assert!(editor.config().valid_line.is_some());
        editor.set_extra_prompt(ExtraPromptKind::ValidLine, None);
        assert!(editor.config().valid_line.is_none());
    }

    #[test]
    fn test_palette_colors() {
        let mut editor = two_blocks();
        editor.set_palette_color("primary", "#112233");
        assert_eq!(editor.resolve_color("p:primary").value(), Some("#112233"));
        assert!(editor.resolve_color("p:missing").is_unresolved());

        assert!(editor.remove_palette_color("primary"));
        assert!(!editor.remove_palette_color("primary"));
        assert!(editor.active_palette().is_empty());
    }

    #[test]
    fn test_palette_variant_preview_lifecycle() {
        let mut editor = two_blocks();
        editor.set_palette_color("bg", "#000000");
        editor.set_palette_variant("light", Palette::from([("bg".to_string(), "#ffffff".to_string())]));
        editor.set_palettes_template("{{ .Env.THEME }}");

        assert!(!editor.preview_palette_variant(Some("dark")));
        assert!(editor.preview_palette_variant(Some("light")));
        assert_eq!(editor.resolve_color("p:bg").value(), Some("#ffffff"));

        assert!(editor.rename_palette_variant("light", "day"));
        assert_eq!(editor.preview_palette(), Some("day"));

        assert!(editor.remove_palette_variant("day"));
        assert_eq!(editor.preview_palette(), None);
        assert_eq!(editor.resolve_color("p:bg").value(), Some("#000000"));
        assert_eq!(editor.config().palettes.as_ref().unwrap().template, "{{ .Env.THEME }}");
    }

    #[test]
    fn test_rename_variant_keeps_position_and_rejects_collision() {
        let mut editor = two_blocks();
        editor.set_palette_variant("a", Palette::new());
        editor.set_palette_variant("b", Palette::new());
        editor.set_palette_variant("c", Palette::new());
        assert!(!editor.rename_palette_variant("a", "c"));
        assert!(editor.rename_palette_variant("b", "middle"));
        let names: Vec<&String> = editor.config().palettes.as_ref().unwrap().list.keys().collect();
        assert_eq!(names, ["a", "middle", "c"]);
    }

    #[test]
    fn test_set_palettes_drops_stale_preview() {
        let mut editor = two_blocks();
        editor.set_palette_variant("dark", Palette::new());
        editor.preview_palette_variant(Some("dark"));
        editor.set_palettes(None);
        assert_eq!(editor.preview_palette(), None);
    }

    #[test]
    fn test_import_failure_keeps_document() {
        let mut editor = two_blocks();
        let before = editor.snapshot();
        assert!(editor.import("{\"blocks\": 3}", "json").is_err());
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));

        editor.select_segment("s1");
        editor
            .import("blocks:\n  - segments:\n      - type: git\n", "theme.yaml")
            .unwrap();
        assert_eq!(editor.config().blocks[0].segments[0].kind, "git");
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut editor = two_blocks();
        editor.reset();
        let mut expected = default_config();
        let mut actual = editor.config().clone();
        expected.clear_ids();
        actual.clear_ids();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_settings_and_cycle() {
        let mut editor = two_blocks();
        editor.update_settings(|s| s.final_space = Some(true));
        editor.set_cycle(Some(vec![CycleColor::default()]));
        assert_eq!(editor.config().settings.final_space, Some(true));
        assert_eq!(editor.config().cycle.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_mutations_publish_snapshots() {
        let mut editor = two_blocks();
        let mut rx = editor.events().subscribe();

        editor.remove_segment("A", "s1");
        editor.select_segment("s2");
        assert!(editor.load(Config::with_blocks(vec![Block::left_prompt()])));
        assert!(editor.open_saved(Config::with_blocks(vec![Block::left_prompt()])));

        match &*rx.recv().await.unwrap() {
            EditorEvent::Edited(config) => assert_eq!(config.blocks[0].segments.len(), 2),
            other => panic!("unexpected event {other:?}"),
        }
        // Selection changes publish nothing
        assert!(matches!(*rx.recv().await.unwrap(), EditorEvent::Replaced(_)));
        assert!(matches!(*rx.recv().await.unwrap(), EditorEvent::Loaded(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_load_refuses_document_without_blocks() {
        let mut editor = two_blocks();
        let mut rx = editor.events().subscribe();
        let before = editor.snapshot();

        assert!(!editor.load(Config::default()));
        assert!(!editor.open_saved(Config::with_blocks(Vec::new())));
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_is_not_aliased() {
        let mut editor = two_blocks();
        let before = editor.snapshot();
        editor.update_block("A", |b| b.force = true);
        assert!(!before.block("A").unwrap().force);
        assert!(editor.config().block("A").unwrap().force);
    }
}
