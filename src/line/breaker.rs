// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The line breaker: a pull-driven state machine that turns queued
//! attributed paragraphs into lines, one call at a time.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::analysis::compute_log_attrs;
use crate::attrs::{AttrAffects, AttrList, AttrType, Attribute, BaselineShift, ShowFlags};
use crate::context::{Direction, Gravity, LayoutContext};
use crate::glyph::{glyph_unknown, GlyphInfo, GlyphItem, GlyphString, GLYPH_EMPTY};
use crate::item::{AnalysisFlags, Item};
use crate::itemize::{itemize, resolve_base_level};
use crate::shape::{shape, ShapeFlags};
use crate::tabs::{TabAlign, TabArray};

use super::ellipsize::ellipsize_line;
use super::{reorder_runs, EllipsizeMode, Line, LineData, WrapMode};

const LINE_SEPARATOR: char = '\u{2028}';

/// State of the last tab on the line being built, kept so that following
/// runs can keep patching the tab's advance for non-left alignments.
#[derive(Clone, Debug)]
struct LastTab {
    /// Index of the tab's run within the line under construction; `None`
    /// while the tab's own run is being inserted.
    run_index: Option<usize>,
    /// Tab stop index.
    index: usize,
    /// Line width when the tab was shaped.
    width: f32,
    /// Resolved tab stop position.
    pos: f32,
    align: TabAlign,
    decimal: char,
}

/// A baseline-shift attribute currently in effect.
#[derive(Clone, Debug)]
struct BaselineEntry {
    attr: Attribute,
    y_offset: f32,
}

/// Attributes resolved per item at shaping time.
#[derive(Clone, Copy, Debug, Default)]
struct ItemProperties {
    letter_spacing: f32,
    show: ShowFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakResult {
    /// Couldn't fit anything.
    NoneFit,
    /// The item was broken in the middle.
    SomeFit,
    /// Everything fit.
    AllFit,
    /// Nothing fit, but that was ok, as we can break at the first char.
    EmptyFit,
    /// The item is a line separator.
    LineSeparator,
    /// The item is a paragraph separator.
    ParagraphSeparator,
}

/// Breaks attributed text into [`Line`]s.
///
/// Paragraphs are queued with [`add_text`](Self::add_text); every call to
/// [`next_line`](Self::next_line) produces the next line for the given
/// width, wrap mode and ellipsization mode. The most recent line can be
/// pushed back with [`undo_line`](Self::undo_line) to retry it with
/// different parameters.
pub struct LineBreaker {
    context: LayoutContext,
    base_dir: Direction,
    tabs: Option<TabArray>,

    /// Pending paragraphs.
    datas: VecDeque<Arc<LineData>>,
    /// The paragraph currently being broken.
    data: Option<Arc<LineData>>,
    /// Unprocessed tail of the current paragraph's items.
    items: VecDeque<Item>,
    /// Pristine copy of the itemization, for [`undo_line`](Self::undo_line).
    data_items: Vec<Item>,
    /// Attributes that only affect rendering, reapplied per line.
    render_attrs: Option<AttrList>,
    para_level: u8,

    /// Characters consumed from the current paragraph.
    start_offset: usize,
    line_start_index: usize,
    line_start_offset: usize,
    at_paragraph_start: bool,
    n_lines: usize,

    line_x: f32,
    line_width: f32,
    line_wrap: WrapMode,
    line_ellipsize: EllipsizeMode,
    /// Width still available on the current line; negative means unbounded.
    remaining_width: f32,

    /// Shaping of the head item, kept across calls so breaking off a prefix
    /// doesn't reshape the remainder.
    glyphs: Option<GlyphString>,
    log_widths: Vec<f32>,
    log_widths_offset: usize,

    tab_width: Option<f32>,
    hyphen_width: Option<f32>,
    last_tab: Option<LastTab>,

    baseline_shifts: Vec<BaselineEntry>,
}

impl LineBreaker {
    pub fn new(context: LayoutContext) -> Self {
        Self {
            context,
            base_dir: Direction::Neutral,
            tabs: None,
            datas: VecDeque::new(),
            data: None,
            items: VecDeque::new(),
            data_items: Vec::new(),
            render_attrs: None,
            para_level: 0,
            start_offset: 0,
            line_start_index: 0,
            line_start_offset: 0,
            at_paragraph_start: true,
            n_lines: 0,
            line_x: 0.0,
            line_width: -1.0,
            line_wrap: WrapMode::Word,
            line_ellipsize: EllipsizeMode::None,
            remaining_width: -1.0,
            glyphs: None,
            log_widths: Vec::new(),
            log_widths_offset: 0,
            tab_width: None,
            hyphen_width: None,
            last_tab: None,
            baseline_shifts: Vec::new(),
        }
    }

    pub fn context(&self) -> &LayoutContext {
        &self.context
    }

    /// Sets the base direction for lines. [`Direction::Neutral`] (the
    /// default) resolves the direction from the content.
    pub fn set_base_dir(&mut self, direction: Direction) {
        self.base_dir = direction;
    }

    pub fn base_dir(&self) -> Direction {
        self.base_dir
    }

    /// Sets the tab stops. `None` reinstates default tabs (every 8 spaces).
    pub fn set_tabs(&mut self, tabs: Option<&TabArray>) {
        self.tabs = tabs.map(|tabs| {
            let mut tabs = tabs.clone();
            tabs.sort();
            tabs
        });
    }

    pub fn tabs(&self) -> Option<&TabArray> {
        self.tabs.as_ref()
    }

    /// The number of lines produced so far.
    pub fn line_count(&self) -> usize {
        self.n_lines
    }

    /// Queues a paragraph of text. Invalid UTF-8 in `text` has already been
    /// excluded by the type; embedders converting foreign data should
    /// replace invalid bytes before the call (the convention is `?`).
    ///
    /// The end of `text` is treated as a paragraph break. May be called
    /// repeatedly to queue more input.
    pub fn add_text(&mut self, text: &str, attrs: Option<&AttrList>) {
        let log_attrs = compute_log_attrs(text, attrs);
        let n_chars = text.chars().count();
        self.datas.push_back(Arc::new(LineData {
            text: text.to_owned(),
            attrs: attrs.cloned(),
            log_attrs,
            n_chars,
        }));
    }

    /// Queues a paragraph supplied as raw bytes; invalid UTF-8 sequences are
    /// replaced with `?` and a warning is logged.
    pub fn add_bytes(&mut self, bytes: &[u8], attrs: Option<&AttrList>) {
        match core::str::from_utf8(bytes) {
            Ok(text) => self.add_text(text, attrs),
            Err(_) => {
                log::warn!("invalid UTF-8 in input; replacing broken bytes");
                let text: String = String::from_utf8_lossy(bytes)
                    .chars()
                    .map(|ch| if ch == char::REPLACEMENT_CHARACTER { '?' } else { ch })
                    .collect();
                self.add_text(&text, attrs);
            }
        }
    }

    /// Whether any unprocessed text remains.
    pub fn has_line(&mut self) -> bool {
        self.ensure_items();
        !self.items.is_empty()
    }

    /// The resolved direction of the next line, or [`Direction::Neutral`]
    /// when there is no more input.
    pub fn get_direction(&mut self) -> Direction {
        self.ensure_items();
        if self.data.is_none() {
            return Direction::Neutral;
        }
        self.resolved_dir()
    }

    /// Produces the next line.
    ///
    /// `x` is the line's starting position (used to place tabs), `width` the
    /// available width or a negative value for no limit. When `ellipsize`
    /// is not [`EllipsizeMode::None`] and `width` is non-negative, all
    /// remaining text of the paragraph is made to fit by eliding. The line's
    /// baseline origin is (0, 0); positioning is the caller's concern.
    pub fn next_line(
        &mut self,
        x: f32,
        width: f32,
        wrap: WrapMode,
        ellipsize: EllipsizeMode,
    ) -> Option<Line> {
        self.ensure_items();
        if self.items.is_empty() {
            return None;
        }
        let data = self.data.clone()?;

        let mut line = Line::new(data);
        line.start_index = self.line_start_index;
        line.start_offset = self.line_start_offset;
        line.starts_paragraph = self.at_paragraph_start;
        line.direction = self.resolved_dir();

        self.line_x = x;
        self.line_width = width;
        self.line_wrap = wrap;
        self.line_ellipsize = ellipsize;
        self.last_tab = None;

        self.remaining_width = if self.should_ellipsize() { -1.0 } else { width };

        self.process_line(&mut line);
        line.num_chars = line.runs.iter().map(|run| run.item.num_chars).sum();

        self.postprocess_line(&mut line);

        if self.items.is_empty() {
            line.ends_paragraph = true;
        }
        self.at_paragraph_start = line.ends_paragraph;
        self.n_lines += 1;
        self.line_start_index += line.length;
        self.line_start_offset = self.start_offset;

        if self.items.is_empty() {
            self.data = None;
            self.data_items.clear();
            self.render_attrs = None;
        }

        Some(line)
    }

    /// Re-queues the content of `line` as unprocessed input.
    ///
    /// Succeeds only for the most recently produced line (or, when a
    /// paragraph has been fully consumed, for any of its lines undone in
    /// reverse order). Returns `false` without touching any state otherwise.
    pub fn undo_line(&mut self, line: &Line) -> bool {
        if self.data.is_none()
            && line.start_index == 0
            && line.length == line.data.text.len()
        {
            debug_assert!(self.items.is_empty(), "stale items without a paragraph");
            self.datas.push_front(line.data.clone());
            self.n_lines -= 1;
            self.glyphs = None;
            return true;
        }

        let matches_current = self
            .data
            .as_ref()
            .is_some_and(|data| Arc::ptr_eq(data, &line.data));
        if matches_current && self.line_start_index == line.start_index + line.length {
            // Recover the original items covering the line's byte range.
            let mut recovered: Vec<Item> = Vec::new();
            for item in &self.data_items {
                if item.offset + item.length < line.start_index {
                    continue;
                }
                if item.offset > self.line_start_index {
                    break;
                }
                let mut item = item.clone();
                if item.offset < line.start_index {
                    let split_len = line.start_index - item.offset;
                    let split_chars = line.data.text[item.offset..line.start_index]
                        .chars()
                        .count();
                    let _head = item.split(split_len, split_chars);
                }
                if item.offset + item.length > self.line_start_index {
                    let split_len = self.line_start_index - item.offset;
                    let split_chars = line.data.text[item.offset..self.line_start_index]
                        .chars()
                        .count();
                    let first = item.split(split_len, split_chars);
                    item = first;
                }
                if item.length > 0 {
                    recovered.push(item);
                }
            }
            for item in recovered.into_iter().rev() {
                self.items.push_front(item);
            }

            self.n_lines -= 1;
            self.at_paragraph_start = line.starts_paragraph;
            self.line_start_index = line.start_index;
            self.line_start_offset = line.start_offset;
            self.glyphs = None;
            self.start_offset = line.start_offset;
            self.log_widths_offset = 0;
            return true;
        }

        false
    }

    // Lazy itemization of the next queued paragraph.

    fn ensure_items(&mut self) {
        while self.items.is_empty() {
            if self.data.is_none() {
                self.data = self.datas.pop_front();
            }
            if self.data.is_none() {
                return;
            }
            self.itemize_data();
            if self.items.is_empty() {
                // An empty paragraph produces no lines; move on.
                self.data = None;
                self.render_attrs = None;
            }
        }
    }

    fn itemize_data(&mut self) {
        let Some(data) = self.data.clone() else {
            return;
        };

        // Partition the paragraph's attributes by the stage they affect.
        let mut render_attrs = data.attrs.clone();
        let itemize_attrs = render_attrs.as_mut().and_then(|list| {
            list.filter(|attr| attr.attr_type().affects().contains(AttrAffects::ITEMIZATION))
        });
        let shape_attrs = render_attrs.as_mut().and_then(|list| {
            list.filter(|attr| {
                attr.attr_type()
                    .affects()
                    .intersects(AttrAffects::BREAKING | AttrAffects::SHAPING)
            })
        });
        self.render_attrs = render_attrs;

        let effective_dir = if self.base_dir == Direction::Neutral {
            self.context.base_dir()
        } else {
            self.base_dir
        };
        self.para_level = resolve_base_level(&data.text, effective_dir);

        let items = itemize(
            &self.context,
            self.base_dir,
            &data.text,
            0,
            data.text.len(),
            itemize_attrs.as_ref(),
        );
        self.items = items.into();

        if let Some(shape_attrs) = &shape_attrs {
            let mut iter = shape_attrs.iterator();
            for item in &mut self.items {
                item.apply_attrs(&mut iter);
            }
        }

        self.data_items = self.items.iter().cloned().collect();

        self.hyphen_width = None;
        self.tab_width = None;
        self.start_offset = 0;
        self.line_start_offset = 0;
        self.line_start_index = 0;
        self.baseline_shifts.clear();
        self.glyphs = None;
        self.log_widths.clear();
        self.log_widths_offset = 0;
        self.remaining_width = -1.0;
        self.at_paragraph_start = true;
    }

    /// The resolved direction is always LTR or RTL, never weak or neutral.
    fn resolved_dir(&self) -> Direction {
        let mut dir = if self.para_level & 1 != 0 {
            Direction::Rtl
        } else {
            Direction::Ltr
        };
        // The direction vs. gravity dance: a rotated layout reads along the
        // rotated top edge.
        match self.context.gravity() {
            Gravity::Auto | Gravity::South => {}
            Gravity::North => {
                dir = if dir == Direction::Ltr {
                    Direction::Rtl
                } else {
                    Direction::Ltr
                };
            }
            Gravity::East => dir = Direction::Ltr,
            Gravity::West => dir = Direction::Rtl,
        }
        dir
    }

    fn should_ellipsize(&self) -> bool {
        self.line_ellipsize != EllipsizeMode::None && self.line_width >= 0.0
    }

    pub(crate) fn shape_flags(&self) -> ShapeFlags {
        if self.context.round_glyph_positions() {
            ShapeFlags::ROUND_POSITIONS
        } else {
            ShapeFlags::empty()
        }
    }

    fn item_properties(item: &Item) -> ItemProperties {
        let mut props = ItemProperties::default();
        for attr in &item.analysis.extra_attrs {
            match attr.attr_type() {
                AttrType::LETTER_SPACING => {
                    props.letter_spacing = attr.float_value() as f32;
                }
                AttrType::SHOW => {
                    props.show |= ShowFlags::from_bits_truncate(attr.int_value() as u32);
                }
                _ => {}
            }
        }
        props
    }

    fn item_text<'a>(data: &'a LineData, item: &Item) -> &'a str {
        &data.text[item.offset..item.offset + item.length]
    }

    fn first_char(data: &LineData, item: &Item) -> Option<char> {
        Self::item_text(data, item).chars().next()
    }

    fn line_width_so_far(&self, line: &Line) -> f32 {
        if self.remaining_width >= 0.0 {
            self.line_width - self.remaining_width
        } else {
            line.width()
        }
    }

    // Cached metrics.

    fn ensure_tab_width(&mut self) -> f32 {
        if let Some(width) = self.tab_width {
            return width;
        }
        let space_width = self
            .context
            .load_font(self.context.font_description(), self.context.language())
            .map(|font| {
                font.nominal_glyph(' ')
                    .map(|glyph| font.glyph_extents(glyph).logical.width)
                    .filter(|w| *w > 0.0)
                    .unwrap_or_else(|| font.metrics(None).approximate_char_width)
            })
            .unwrap_or(0.0);
        let mut width = space_width * 8.0;
        if width <= 0.0 {
            // Keep tab position search moving even without a usable font.
            width = 50.0;
        }
        self.tab_width = Some(width);
        width
    }

    fn ensure_hyphen_width(&mut self, item: &Item) -> f32 {
        if let Some(width) = self.hyphen_width {
            return width;
        }
        let width = item
            .analysis
            .font
            .as_ref()
            .and_then(|font| {
                let hyphen = if font.has_char('\u{2010}') { '\u{2010}' } else { '-' };
                font.nominal_glyph(hyphen)
                    .map(|glyph| font.glyph_extents(glyph).logical.width)
            })
            .unwrap_or(0.0);
        self.hyphen_width = Some(width);
        width
    }

    // Tab machinery.

    fn get_tab_pos(&mut self, index: usize) -> (f32, TabAlign, Option<char>, bool) {
        let offset = self.line_x;
        let scale = self.context.scale();
        enum TabPos {
            Explicit(f32, TabAlign, Option<char>),
            Extrapolated(f32, f32, f32, TabAlign, Option<char>),
            Default,
        }
        let tab_pos = match &self.tabs {
            Some(tabs) if !tabs.is_empty() => {
                let n_tabs = tabs.len();
                let to_units = if tabs.positions_in_pixels() { scale } else { 1.0 };
                if index < n_tabs {
                    let stop = tabs.get(index).unwrap();
                    TabPos::Explicit(stop.position * to_units, stop.align, stop.decimal_point)
                } else {
                    // Extrapolate by repeating the last tab gap.
                    let last = tabs.get(n_tabs - 1).unwrap();
                    let last_pos = last.position * to_units;
                    let next_to_last_pos = if n_tabs > 1 {
                        tabs.get(n_tabs - 2).unwrap().position * to_units
                    } else {
                        0.0
                    };
                    TabPos::Extrapolated(
                        last_pos,
                        next_to_last_pos,
                        (index - n_tabs + 1) as f32,
                        last.align,
                        last.decimal_point,
                    )
                }
            }
            _ => TabPos::Default,
        };
        let (pos, align, decimal, is_default) = match tab_pos {
            TabPos::Explicit(pos, align, decimal) => (pos, align, decimal, false),
            TabPos::Extrapolated(last_pos, next_to_last_pos, multiplier, align, decimal) => {
                let tab_width = if last_pos > next_to_last_pos {
                    last_pos - next_to_last_pos
                } else {
                    self.ensure_tab_width()
                };
                (last_pos + tab_width * multiplier, align, decimal, false)
            }
            TabPos::Default => (self.ensure_tab_width() * index as f32, TabAlign::Left, None, true),
        };
        (pos - offset, align, decimal, is_default)
    }

    fn shape_tab(
        &mut self,
        line: &Line,
        properties: &ItemProperties,
        current_width: f32,
        item: &Item,
        glyphs: &mut GlyphString,
    ) {
        let _ = line;
        glyphs.set_size(1);
        glyphs.glyphs[0] = GlyphInfo {
            glyph: if properties.show.contains(ShowFlags::SPACES) {
                glyph_unknown('\t')
            } else {
                GLYPH_EMPTY
            },
            width: 0.0,
            x_offset: 0.0,
            y_offset: 0.0,
            is_cluster_start: true,
        };
        glyphs.log_clusters[0] = 0;

        let tab_width = self.ensure_tab_width();
        let space_width = tab_width / 8.0;

        let mut index = self.last_tab.as_ref().map(|tab| tab.index).unwrap_or(0);
        let (pos, align, decimal) = loop {
            let (pos, align, decimal, is_default) = self.get_tab_pos(index);
            // Keep at least a space of distance for default stops; respect
            // user stops to the unit.
            let min_gap = if is_default { space_width } else { 0.001 };
            if pos >= current_width + min_gap {
                glyphs.glyphs[0].width = pos - current_width;
                break (pos, align, decimal);
            }
            index += 1;
        };

        let decimal = decimal.unwrap_or_else(|| self.context.decimal_point());
        let _ = item;
        self.last_tab = Some(LastTab {
            run_index: None,
            index,
            width: current_width,
            pos,
            align,
            decimal,
        });
    }

    fn decimal_prefix_width(
        data: &LineData,
        run: &GlyphItem,
        decimal: char,
    ) -> (f32, bool) {
        let item_text = Self::item_text(data, &run.item);
        let log_widths = run.glyphs.logical_widths(item_text, run.is_rtl());
        let mut width = 0.0;
        for (index, ch) in item_text.chars().enumerate() {
            if ch == decimal {
                width += log_widths[index] / 2.0;
                return (width, true);
            }
            width += log_widths[index];
        }
        (width, false)
    }

    /// The delta between the tab's current advance and its advance when the
    /// tab state was recorded; shaping a run after a non-left tab shrinks
    /// the tab, which measurement has to account for.
    fn tab_width_change(&self, line: &Line) -> f32 {
        if let Some(tab) = &self.last_tab {
            if let Some(run_index) = tab.run_index {
                return line.runs[run_index].glyphs.glyphs[0].width - (tab.pos - tab.width);
            }
        }
        0.0
    }

    // Shaping.

    fn shape_run(&mut self, line: &mut Line, item: &Item) -> GlyphString {
        let data = self.data.clone().expect("shaping without a paragraph");
        let mut glyphs = GlyphString::new();
        let properties = Self::item_properties(item);

        if Self::first_char(&data, item) == Some('\t') {
            let current_width = self.line_width_so_far(line);
            self.shape_tab(line, &properties, current_width, item, &mut glyphs);
            return glyphs;
        }

        shape(
            Self::item_text(&data, item),
            &data.text,
            &item.analysis,
            &data.log_attrs[item.char_offset..],
            &mut glyphs,
            self.shape_flags(),
        );

        if properties.letter_spacing != 0.0 && !glyphs.is_empty() {
            let mut glyph_item = GlyphItem::new(item.clone(), glyphs);
            glyph_item.letter_space(
                &data.text,
                &data.log_attrs[item.char_offset..],
                properties.letter_spacing,
            );
            let space_left = properties.letter_spacing / 2.0;
            let space_right = properties.letter_spacing - space_left;
            glyphs = glyph_item.glyphs;
            glyphs.glyphs[0].width += space_left;
            glyphs.glyphs[0].x_offset += space_left;
            glyphs.glyphs.last_mut().unwrap().width += space_right;
        }

        // Update the pending tab's advance so this run lands at its aligned
        // position.
        if let Some(tab) = self.last_tab.clone() {
            if let Some(run_index) = tab.run_index {
                let mut w = tab.pos - tab.width;
                match tab.align {
                    TabAlign::Left => {}
                    TabAlign::Right => w -= glyphs.width(),
                    TabAlign::Center => w -= glyphs.width() / 2.0,
                    TabAlign::Decimal => {
                        let probe = GlyphItem::new(item.clone(), glyphs.clone());
                        let (prefix, _) = Self::decimal_prefix_width(&data, &probe, tab.decimal);
                        w -= prefix;
                    }
                }
                line.runs[run_index].glyphs.glyphs[0].width = w.max(0.0);
            }
        }

        glyphs
    }

    fn insert_run(
        &mut self,
        line: &mut Line,
        run_item: Item,
        glyphs: Option<GlyphString>,
        last_run: bool,
    ) {
        let data = self.data.clone().expect("inserting without a paragraph");
        let is_tab = Self::first_char(&data, &run_item) == Some('\t');

        let glyphs = match glyphs {
            Some(glyphs) => glyphs,
            None => {
                if last_run
                    && self.log_widths_offset == 0
                    && !run_item.analysis.flags.contains(AnalysisFlags::NEED_HYPHEN)
                    && self.glyphs.is_some()
                {
                    self.glyphs.take().unwrap()
                } else {
                    self.shape_run(line, &run_item)
                }
            }
        };
        if last_run {
            self.glyphs = None;
        }

        line.length += run_item.length;
        line.runs.push(GlyphItem::new(run_item, glyphs));
        let new_index = line.runs.len() - 1;

        if is_tab {
            if let Some(tab) = &mut self.last_tab {
                if tab.run_index.is_none() {
                    tab.run_index = Some(new_index);
                }
            }
            return;
        }

        // Keep the pending tab aligned as further runs land after it; a
        // matched decimal point or an exhausted tab stops the adjustment.
        if let Some(mut tab) = self.last_tab.take() {
            if tab.run_index.is_some_and(|index| index != new_index) {
                let run = &line.runs[new_index];
                let mut found_decimal = false;
                match tab.align {
                    TabAlign::Left => {}
                    TabAlign::Right => tab.width += run.width(),
                    TabAlign::Center => tab.width += run.width() / 2.0,
                    TabAlign::Decimal => {
                        let (prefix, found) =
                            Self::decimal_prefix_width(&data, run, tab.decimal);
                        tab.width += prefix;
                        found_decimal = found;
                    }
                }
                let width = (tab.pos - tab.width).max(0.0);
                line.runs[tab.run_index.unwrap()].glyphs.glyphs[0].width = width;
                if !(found_decimal || width == 0.0) {
                    self.last_tab = Some(tab);
                }
            } else {
                self.last_tab = Some(tab);
            }
        }
    }

    fn uninsert_run(&mut self, line: &mut Line) -> Item {
        let run = line.runs.pop().expect("uninserting from an empty line");
        if self
            .last_tab
            .as_ref()
            .is_some_and(|tab| tab.run_index == Some(line.runs.len()))
        {
            self.last_tab = None;
        }
        line.length -= run.item.length;
        run.item
    }

    // Breaking.

    fn can_break_at(&self, offset: usize, wrap: WrapMode) -> bool {
        let data = self.data.as_ref().unwrap();
        if offset == data.n_chars {
            return true;
        }
        if wrap == WrapMode::Char {
            data.log_attrs[offset].is_char_break()
        } else {
            data.log_attrs[offset].is_line_break()
        }
    }

    fn can_break_in(&self, start_offset: usize, num_chars: usize, allow_break_at_start: bool) -> bool {
        let start = if allow_break_at_start { 0 } else { 1 };
        (start..num_chars).any(|i| self.can_break_at(start_offset + i, self.line_wrap))
    }

    fn break_needs_hyphen(&self, pos: usize) -> bool {
        let attr = self.data.as_ref().unwrap().log_attrs[self.start_offset + pos];
        attr.break_inserts_hyphen() || attr.break_removes_preceding()
    }

    fn find_break_extra_width(&mut self, item: &Item, pos: usize) -> f32 {
        let data = self.data.clone().unwrap();
        let attr = data.log_attrs[self.start_offset + pos];
        if attr.break_inserts_hyphen() {
            let hyphen_width = self.ensure_hyphen_width(item);
            if attr.break_removes_preceding() && pos > 0 {
                hyphen_width - self.log_widths[self.log_widths_offset + pos - 1]
            } else {
                hyphen_width
            }
        } else if pos > 0 && data.log_attrs[self.start_offset + pos - 1].is_white() {
            -self.log_widths[self.log_widths_offset + pos - 1]
        } else {
            0.0
        }
    }

    fn compute_log_widths(&mut self, item: &Item) {
        let data = self.data.clone().unwrap();
        debug_assert_eq!(self.log_widths_offset, 0, "log widths already consumed");
        let glyphs = self.glyphs.as_ref().unwrap();
        self.log_widths = glyphs.logical_widths(Self::item_text(&data, item), item.analysis.is_rtl());
    }

    /// Tries to insert as much as possible of the head item onto `line`.
    ///
    /// With `force_fit`, [`BreakResult::NoneFit`] is never returned: a run is
    /// added even if the minimum insertion overflows. With
    /// `no_break_at_end`, [`BreakResult::AllFit`] is never returned: the run
    /// breaks earlier or doesn't fit at all. That combination serves the
    /// back-up path, which re-breaks an item whose end is not a break site.
    fn process_item(
        &mut self,
        line: &mut Line,
        force_fit: bool,
        no_break_at_end: bool,
        is_last_item: bool,
    ) -> BreakResult {
        let data = self.data.clone().unwrap();
        let mut item = self.items.front().unwrap().clone();

        // Shaping a new head item is kept in `self.glyphs`/`self.log_widths`;
        // breaking off prefixes advances `log_widths_offset` instead of
        // reshaping the remainder. The widths are an approximation: clusters
        // are divided evenly, and may reshape differently after a split.
        let mut processing_new_item = false;
        if self.glyphs.is_none() {
            let glyphs = self.shape_run(line, &item);
            self.glyphs = Some(glyphs);
            self.log_widths_offset = 0;
            processing_new_item = true;
        }

        let first_char = Self::first_char(&data, &item);
        if matches!(first_char, Some('\n' | '\r' | '\u{2029}')) {
            self.glyphs = None;
            return BreakResult::ParagraphSeparator;
        }

        if first_char == Some(LINE_SEPARATOR) && !self.should_ellipsize() {
            let item = self.items.pop_front().unwrap();
            let num_chars = item.num_chars;
            self.insert_run(line, item, None, true);
            self.log_widths_offset += num_chars;
            return BreakResult::LineSeparator;
        }

        if self.remaining_width < 0.0 && !no_break_at_end {
            // Wrapping off.
            let item = self.items.pop_front().unwrap();
            self.insert_run(line, item, None, true);
            return BreakResult::AllFit;
        }

        if processing_new_item {
            self.compute_log_widths(&item);
        }

        let mut width: f32 = self.log_widths
            [self.log_widths_offset..self.log_widths_offset + item.num_chars]
            .iter()
            .sum();

        if first_char == Some('\t') {
            let item = self.items.pop_front().unwrap();
            self.insert_run(line, item, None, true);
            self.remaining_width = (self.remaining_width - width).max(0.0);
            return BreakResult::AllFit;
        }

        let mut wrap = self.line_wrap;
        let mut extra_width = if !no_break_at_end
            && self.can_break_at(self.start_offset + item.num_chars, wrap)
        {
            self.find_break_extra_width(&item, item.num_chars)
        } else {
            0.0
        };

        let non_left_tab = self
            .last_tab
            .as_ref()
            .is_some_and(|tab| tab.run_index.is_some() && tab.align != TabAlign::Left);

        if (width + extra_width <= self.remaining_width
            || (item.num_chars == 1 && line.runs.is_empty())
            || non_left_tab)
            && !no_break_at_end
        {
            // Looks like it fits from the approximate widths; measure for
            // real before accepting.
            let glyphs = self.shape_run(line, &item);
            let real_width = glyphs.width() + self.tab_width_change(line);

            if real_width + extra_width <= self.remaining_width
                || (item.num_chars == 1 && line.runs.is_empty())
            {
                let item = self.items.pop_front().unwrap();
                self.insert_run(line, item, Some(glyphs), true);
                self.remaining_width = (self.remaining_width - real_width).max(0.0);
                return BreakResult::AllFit;
            }
            // Doesn't fit after shaping; proceed to break the item.
        }

        // Look for a way to break the item.
        let orig_width = width;
        let orig_extra_width = extra_width;
        let mut break_width = width;
        let mut break_extra_width = extra_width;
        let mut break_num_chars = item.num_chars;
        let mut break_glyphs: Option<GlyphString> = None;

        // If we are farther away from the end of the line than this, don't
        // bother measuring a break candidate precisely.
        let safe_distance = item
            .analysis
            .font
            .as_ref()
            .map(|font| font.metrics(item.analysis.language).approximate_char_width * 3.0)
            .unwrap_or(0.0);

        let char_bytes: Vec<usize> = Self::item_text(&data, &item)
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(core::iter::once(item.length))
            .collect();

        'retry_break: loop {
            width = 0.0;
            let scan_end = if no_break_at_end {
                item.num_chars
            } else {
                item.num_chars + 1
            };
            for num_chars in 0..scan_end {
                extra_width = self.find_break_extra_width(&item, num_chars);

                // MIN(width + extra, width) is monotonically increasing, so
                // once past the budget plus margin with a candidate in hand,
                // stop scanning.
                if (width + extra_width).min(width) > self.remaining_width + safe_distance
                    && break_num_chars < item.num_chars
                {
                    break;
                }

                // With no previous runs we have to grab at least one char.
                if self.can_break_at(self.start_offset + num_chars, wrap)
                    && (num_chars > 0 || !line.runs.is_empty())
                {
                    if num_chars == 0
                        || width + extra_width < self.remaining_width - safe_distance
                    {
                        // Trivially accepted: well within the budget.
                        break_num_chars = num_chars;
                        break_width = width;
                        break_extra_width = extra_width;
                        break_glyphs = None;
                    } else {
                        // Measure the candidate by shaping the prefix.
                        let length = char_bytes[num_chars];
                        let glyphs = if num_chars < item.num_chars {
                            let mut probe = item.clone();
                            let mut first = probe.split(length, num_chars);
                            if self.break_needs_hyphen(num_chars) {
                                first.analysis.flags |= AnalysisFlags::NEED_HYPHEN;
                            } else {
                                first.analysis.flags -= AnalysisFlags::NEED_HYPHEN;
                            }
                            self.shape_run(line, &first)
                        } else {
                            self.shape_run(line, &item)
                        };
                        let new_break_width = glyphs.width() + self.tab_width_change(line);

                        let measured_extra = if num_chars > 0
                            && (num_chars < item.num_chars || !is_last_item)
                            && data.log_attrs[self.start_offset + num_chars - 1].is_white()
                        {
                            // The break eats the preceding space.
                            -self.log_widths[self.log_widths_offset + num_chars - 1]
                        } else if num_chars == item.num_chars
                            && !is_last_item
                            && self.break_needs_hyphen(num_chars)
                        {
                            self.ensure_hyphen_width(&item)
                        } else {
                            0.0
                        };

                        if break_num_chars == item.num_chars
                            || new_break_width + measured_extra <= self.remaining_width
                            || new_break_width + measured_extra < break_width + break_extra_width
                        {
                            break_num_chars = num_chars;
                            break_width = new_break_width;
                            break_extra_width = measured_extra;
                            break_glyphs = Some(glyphs);
                        }
                    }
                }

                if num_chars < item.num_chars {
                    width += self.log_widths[self.log_widths_offset + num_chars];
                }
            }

            if wrap == WrapMode::WordChar
                && force_fit
                && break_width + break_extra_width > self.remaining_width
            {
                // Try again with looser conditions.
                wrap = WrapMode::Char;
                break_num_chars = item.num_chars;
                break_width = orig_width;
                break_extra_width = orig_extra_width;
                break_glyphs = None;
                continue 'retry_break;
            }
            break;
        }

        if force_fit || break_width + break_extra_width <= self.remaining_width {
            // Successfully broke the item.
            if self.remaining_width >= 0.0 {
                self.remaining_width =
                    (self.remaining_width - break_width - break_extra_width).max(0.0);
            }

            if break_num_chars == item.num_chars {
                if self.can_break_at(self.start_offset + break_num_chars, wrap)
                    && self.break_needs_hyphen(break_num_chars)
                {
                    item.analysis.flags |= AnalysisFlags::NEED_HYPHEN;
                }
                self.items.pop_front();
                self.insert_run(line, item, None, true);
                BreakResult::AllFit
            } else if break_num_chars == 0 {
                BreakResult::EmptyFit
            } else {
                let length = char_bytes[break_num_chars];
                let first = item.split(length, break_num_chars);
                *self.items.front_mut().unwrap() = item;
                self.insert_run(line, first, break_glyphs, false);
                self.log_widths_offset += break_num_chars;
                BreakResult::SomeFit
            }
        } else {
            self.glyphs = None;
            BreakResult::NoneFit
        }
    }

    fn process_line(&mut self, line: &mut Line) {
        let mut have_break = false;
        let mut break_remaining_width = 0.0;
        let mut break_start_offset = 0;
        let mut break_link = 0;
        let mut wrapped = false;

        while !self.items.is_empty() {
            let head = self.items.front().unwrap();
            let old_num_chars = head.num_chars;
            let old_remaining_width = self.remaining_width;
            let first_item_in_line = line.runs.is_empty();
            let last_item_in_line = self.items.len() == 1;
            let head_is_tab = {
                let data = self.data.as_ref().unwrap();
                Self::first_char(data, head) == Some('\t')
            };

            let result = self.process_item(line, !have_break, false, last_item_in_line);
            match result {
                BreakResult::AllFit => {
                    if !head_is_tab
                        && self.can_break_in(self.start_offset, old_num_chars, !first_item_in_line)
                    {
                        have_break = true;
                        break_remaining_width = old_remaining_width;
                        break_start_offset = self.start_offset;
                        break_link = line.runs.len() - 1;
                    }
                    self.start_offset += old_num_chars;
                }
                BreakResult::EmptyFit => {
                    wrapped = true;
                    break;
                }
                BreakResult::SomeFit => {
                    let new_num_chars = self.items.front().unwrap().num_chars;
                    self.start_offset += old_num_chars - new_num_chars;
                    wrapped = true;
                    break;
                }
                BreakResult::NoneFit => {
                    // Back up over unused runs to the run holding the break.
                    while line.runs.len() > break_link {
                        let item = self.uninsert_run(line);
                        self.items.push_front(item);
                    }
                    self.start_offset = break_start_offset;
                    self.remaining_width = break_remaining_width;
                    let last_item_in_line = self.items.len() == 1;
                    let old_num_chars = self.items.front().unwrap().num_chars;

                    // Reshape the saved item, forcing a break.
                    let result = self.process_item(line, true, true, last_item_in_line);
                    debug_assert!(
                        matches!(result, BreakResult::SomeFit | BreakResult::EmptyFit),
                        "forced break must produce a fit"
                    );
                    let new_num_chars = self.items.front().unwrap().num_chars;
                    self.start_offset += old_num_chars - new_num_chars;
                    wrapped = true;
                    break;
                }
                BreakResult::LineSeparator => {
                    self.start_offset += old_num_chars;
                    // A line separator is just a forced break.
                    wrapped = true;
                    break;
                }
                BreakResult::ParagraphSeparator => {
                    // The separator is not added as a run; the next line
                    // still starts after its bytes.
                    line.ends_paragraph = true;
                    let item = self.items.pop_front().unwrap();
                    self.line_start_index += item.length;
                    self.start_offset += item.num_chars;
                    break;
                }
            }
        }

        line.wrapped = wrapped;
    }

    // Post-processing.

    fn add_missing_hyphen(&mut self, line: &mut Line) {
        let Some(data) = self.data.clone() else {
            return;
        };
        if line.runs.is_empty() {
            return;
        }
        let last = line.runs.len() - 1;
        let needs = data.log_attrs[self.line_start_offset + line.num_chars].break_inserts_hyphen()
            && !line.runs[last]
                .item
                .analysis
                .flags
                .contains(AnalysisFlags::NEED_HYPHEN);
        if needs {
            // The last run fit without breaking but still needs its hyphen.
            let old_width = line.runs[last].width();
            let mut item = line.runs[last].item.clone();
            item.analysis.flags |= AnalysisFlags::NEED_HYPHEN;
            let glyphs = self.shape_run(line, &item);
            let new_width = glyphs.width();
            line.runs[last].item = item;
            line.runs[last].glyphs = glyphs;
            if self.remaining_width >= 0.0 {
                self.remaining_width += new_width - old_width;
            }
        }
        line.hyphenated = line.runs[last]
            .item
            .analysis
            .flags
            .contains(AnalysisFlags::NEED_HYPHEN);
    }

    fn zero_line_final_space(&mut self, line: &mut Line) {
        let Some(data) = self.data.clone() else {
            return;
        };
        let Some(run) = line.runs.last_mut() else {
            return;
        };
        if run.glyphs.is_empty() {
            return;
        }
        let glyph = if run.is_rtl() { 0 } else { run.glyphs.len() - 1 };

        if run.glyphs.glyphs[glyph].glyph == glyph_unknown(LINE_SEPARATOR) {
            let props = Self::item_properties(&run.item);
            if props.show.contains(ShowFlags::LINE_BREAKS) {
                // This LS is visible.
                return;
            }
        }

        if self.start_offset == 0 || !data.log_attrs[self.start_offset - 1].is_white() {
            return;
        }

        // If the final character forms a cluster with its neighbor, leave
        // the cluster alone.
        if run.glyphs.len() >= 2 {
            let neighbor = if run.is_rtl() { glyph + 1 } else { glyph - 1 };
            if run.glyphs.log_clusters[glyph] == run.glyphs.log_clusters[neighbor] {
                return;
            }
        }

        run.glyphs.glyphs[glyph].width = 0.0;
        run.glyphs.glyphs[glyph].glyph = GLYPH_EMPTY;
    }

    fn collect_baseline_shift(&mut self, item: &Item) -> (f32, f32, f32, f32) {
        let mut start_x = 0.0;
        let mut start_y = 0.0;
        let mut end_x = 0.0;
        let mut end_y = 0.0;

        for attr in &item.analysis.extra_attrs {
            match attr.attr_type() {
                AttrType::RISE => {
                    let value = attr.float_value() as f32;
                    start_y += value;
                    end_y -= value;
                }
                AttrType::BASELINE_SHIFT => {
                    if attr.start() == item.offset {
                        let metrics = item
                            .analysis
                            .font
                            .as_ref()
                            .map(|font| font.metrics(item.analysis.language))
                            .unwrap_or_default();
                        let y_offset = match BaselineShift::from_raw(attr.int_value()) {
                            BaselineShift::Superscript => metrics.ascent * 0.4,
                            BaselineShift::Subscript => -metrics.descent * 0.75,
                            BaselineShift::Shift(value) => value,
                        };
                        self.baseline_shifts.push(BaselineEntry {
                            attr: attr.clone(),
                            y_offset,
                        });
                        start_y += y_offset;
                    }
                    if attr.end() == item.offset + item.length {
                        if let Some(position) = self
                            .baseline_shifts
                            .iter()
                            .rposition(|entry| {
                                entry.attr.equal_value(attr) && entry.attr.range() == attr.range()
                            })
                        {
                            let entry = self.baseline_shifts.remove(position);
                            end_y -= entry.y_offset;
                        } else {
                            log::debug!("baseline shift attribute ends without matching start");
                        }
                    }
                }
                _ => {}
            }
        }

        (start_x, start_y, end_x, end_y)
    }

    fn apply_baseline_shift(&mut self, line: &mut Line) {
        let mut x_offset = 0.0;
        let mut y_offset = 0.0;
        for index in 0..line.runs.len() {
            let item = line.runs[index].item.clone();
            let (start_x, start_y, end_x, end_y) = self.collect_baseline_shift(&item);
            x_offset += start_x;
            y_offset += start_y;

            let run = &mut line.runs[index];
            run.start_x_offset = start_x;
            run.end_x_offset = end_x;
            run.y_offset = y_offset;
            if item.analysis.flags.contains(AnalysisFlags::CENTERED_BASELINE) {
                let metrics = item
                    .analysis
                    .font
                    .as_ref()
                    .map(|font| font.metrics(item.analysis.language))
                    .unwrap_or_default();
                run.y_offset += (metrics.ascent - metrics.descent) / 2.0;
            }

            x_offset += end_x;
            y_offset += end_y;
        }
    }

    fn is_tab_run(data: &LineData, run: &GlyphItem) -> bool {
        data.text[run.item.offset..].starts_with('\t')
    }

    fn pad_glyphstring_right(glyphs: &mut GlyphString, adjustment: f32) {
        let Some(index) = glyphs
            .glyphs
            .iter()
            .rposition(|glyph| glyph.width != 0.0)
        else {
            return;
        };
        glyphs.glyphs[index].width += adjustment;
    }

    fn pad_glyphstring_left(glyphs: &mut GlyphString, adjustment: f32) {
        let Some(index) = glyphs.glyphs.iter().position(|glyph| glyph.width != 0.0) else {
            return;
        };
        glyphs.glyphs[index].width += adjustment;
        glyphs.glyphs[index].x_offset += adjustment;
    }

    /// Redistributes the letter spacing that shaping added after every
    /// grapheme: half moves before each boundary, and the spacing adjacent
    /// to line ends and tab stops is trimmed so alignment still holds.
    fn adjust_line_letter_spacing(&mut self, line: &mut Line) {
        let Some(data) = self.data.clone() else {
            return;
        };

        // With tab stops on an RTL line, walk the runs in reverse to find
        // the corrections, then restore the order.
        let reversed = line.direction == Direction::Rtl
            && line.runs.iter().any(|run| Self::is_tab_run(&data, run));
        if reversed {
            line.runs.reverse();
        }

        let run_count = line.runs.len();
        let mut last_run: Option<usize> = None;
        let mut tab_adjustment = 0.0;
        for index in 0..run_count {
            if Self::is_tab_run(&data, &line.runs[index]) {
                Self::pad_glyphstring_right(&mut line.runs[index].glyphs, tab_adjustment);
                tab_adjustment = 0.0;
            } else {
                let next_run = (index + 1 < run_count).then_some(index + 1);
                let visual_next = if reversed { last_run } else { next_run };
                let visual_last = if reversed { next_run } else { last_run };
                let spacing = Self::item_properties(&line.runs[index].item).letter_spacing;
                let space_left = spacing / 2.0;
                let space_right = spacing - space_left;

                let glyphs = &line.runs[index].glyphs;
                if glyphs.is_empty() {
                    last_run = Some(index);
                    continue;
                }
                let first_zeroed = glyphs.glyphs[0].width == 0.0;
                let last_zeroed = glyphs.glyphs[glyphs.len() - 1].width == 0.0;
                let last_is_edge = visual_last
                    .map_or(true, |i| Self::is_tab_run(&data, &line.runs[i]));
                let next_is_edge = visual_next
                    .map_or(true, |i| Self::is_tab_run(&data, &line.runs[i]));

                let glyphs = &mut line.runs[index].glyphs;
                if first_zeroed {
                    // The space glyph here was zeroed at the line end; take
                    // back the spacing leaning on it.
                    Self::pad_glyphstring_left(glyphs, -space_left);
                } else if last_is_edge {
                    Self::pad_glyphstring_left(glyphs, -space_left);
                    tab_adjustment += space_left;
                }
                if last_zeroed {
                    Self::pad_glyphstring_right(glyphs, -space_right);
                } else if next_is_edge {
                    Self::pad_glyphstring_right(glyphs, -space_right);
                    tab_adjustment += space_right;
                }
            }
            last_run = Some(index);
        }

        if reversed {
            line.runs.reverse();
        }
    }

    /// Reapplies render-only attributes (colors, decorations) to the
    /// finished line's runs so renderers can consult them per run.
    fn apply_render_attrs(&mut self, line: &mut Line) {
        let Some(render_attrs) = &self.render_attrs else {
            return;
        };
        for run in &mut line.runs {
            let start = run.item.offset;
            let end = start + run.item.length;
            for attr in render_attrs.attributes() {
                if attr.start() < end && attr.end() > start {
                    let extras = &mut run.item.analysis.extra_attrs;
                    if !extras.contains(attr) {
                        extras.push(attr.clone());
                    }
                }
            }
        }
    }

    fn postprocess_line(&mut self, line: &mut Line) {
        self.add_missing_hyphen(line);

        // Truncate the logical-final whitespace if we broke the line at it.
        if line.wrapped {
            self.zero_line_final_space(line);
        }

        self.apply_baseline_shift(line);

        if self.should_ellipsize() {
            let data = self.data.clone().expect("ellipsizing without a paragraph");
            ellipsize_line(
                &self.context,
                &data,
                self.shape_flags(),
                self.line_ellipsize,
                self.line_width,
                line,
            );
        }

        // Logical to visual order.
        reorder_runs(&mut line.runs);

        self.adjust_line_letter_spacing(line);

        self.apply_render_attrs(line);
    }
}

impl core::fmt::Debug for LineBreaker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineBreaker")
            .field("pending_paragraphs", &self.datas.len())
            .field("remaining_items", &self.items.len())
            .field("line_start_index", &self.line_start_index)
            .field("n_lines", &self.n_lines)
            .finish_non_exhaustive()
    }
}
