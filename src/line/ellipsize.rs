// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ellipsization of over-wide lines.
//!
//! A "gap" grows outward from a center position until
//! `line_width - gap_width + ellipsis_width <= goal_width`:
//!
//! ```text
//! Line:  [-------------------------------------------]
//! Runs:  [------)[---------------)[------------------]
//! Gap center:                 *
//! Gap:             [----------------------]
//! ```
//!
//! The center sits at the start, middle or end of the line depending on the
//! mode; a start or end center grows the gap in one direction only. The gap
//! grows one span at a time, where a span is a consecutive range of clusters
//! that can't be interrupted by an ellipsis. All computation happens in
//! logical order, before runs are reordered to visual order.

use std::sync::Arc;

use crate::analysis::compute_log_attrs;
use crate::attrs::{AttrAffects, AttrIterator, AttrList, Attribute, ATTR_INDEX_TO_TEXT_END};
use crate::context::{Direction, LayoutContext};
use crate::glyph::{GlyphItem, GlyphItemIter, GlyphString};
use crate::item::{AnalysisFlags, Item};
use crate::itemize::itemize;
use crate::shape::{shape, ShapeFlags};

use super::{EllipsizeMode, Line, LineData};

/// Wide characters prefer a midline ellipsis, following East Asian
/// typographic practice.
fn is_wide(ch: char) -> bool {
    matches!(
        ch,
        '\u{1100}'..='\u{115f}'
            | '\u{2e80}'..='\u{a4cf}'
            | '\u{ac00}'..='\u{d7a3}'
            | '\u{f900}'..='\u{faff}'
            | '\u{fe30}'..='\u{fe4f}'
            | '\u{ff00}'..='\u{ff60}'
            | '\u{ffe0}'..='\u{ffe6}'
    )
}

/// A position within the line: a cluster of one of its runs.
#[derive(Clone, Copy, Debug)]
struct LineIter {
    run_index: usize,
    start_glyph: isize,
    end_glyph: isize,
    start_index: usize,
    end_index: usize,
    start_char: usize,
    end_char: usize,
}

impl LineIter {
    fn from_glyph_iter(run_index: usize, iter: &GlyphItemIter<'_>) -> Self {
        Self {
            run_index,
            start_glyph: iter.start_glyph,
            end_glyph: iter.end_glyph,
            start_index: iter.start_index,
            end_index: iter.end_index,
            start_char: iter.start_char,
            end_char: iter.end_char,
        }
    }

    fn glyph_iter<'a>(&self, line: &'a Line, text: &'a str) -> GlyphItemIter<'a> {
        GlyphItemIter {
            glyph_item: &line.runs[self.run_index],
            text,
            start_glyph: self.start_glyph,
            end_glyph: self.end_glyph,
            start_index: self.start_index,
            end_index: self.end_index,
            start_char: self.start_char,
            end_char: self.end_char,
        }
    }

    fn cluster_width(&self, line: &Line, text: &str) -> f32 {
        self.glyph_iter(line, text).cluster_width()
    }

    /// Moves forward one cluster, crossing into the next run as needed.
    fn next_cluster(&mut self, line: &Line, text: &str) -> bool {
        let mut iter = self.glyph_iter(line, text);
        if iter.next_cluster() {
            *self = Self::from_glyph_iter(self.run_index, &iter);
            return true;
        }
        if self.run_index == line.runs.len() - 1 {
            return false;
        }
        self.run_index += 1;
        let iter = GlyphItemIter::init_start(&line.runs[self.run_index], text);
        *self = Self::from_glyph_iter(self.run_index, &iter);
        true
    }

    /// Moves backward one cluster, crossing into the previous run as needed.
    fn prev_cluster(&mut self, line: &Line, text: &str) -> bool {
        let mut iter = self.glyph_iter(line, text);
        if iter.prev_cluster() {
            *self = Self::from_glyph_iter(self.run_index, &iter);
            return true;
        }
        if self.run_index == 0 {
            return false;
        }
        self.run_index -= 1;
        let iter = GlyphItemIter::init_end(&line.runs[self.run_index], text);
        *self = Self::from_glyph_iter(self.run_index, &iter);
        true
    }
}

struct EllipsizeState<'a> {
    context: &'a LayoutContext,
    text: &'a str,
    log_attrs: &'a [crate::LogAttr],
    attrs: &'a AttrList,
    shape_flags: ShapeFlags,

    /// Width of each of the line's runs.
    run_widths: Vec<f32>,
    total_width: f32,
    gap_center: f32,

    ellipsis_run: Option<GlyphItem>,
    ellipsis_width: f32,
    /// Whether the first character of the gap is wide; a wide gap start
    /// switches to the midline ellipsis.
    ellipsis_is_cjk: bool,

    /// Attribute iterators can only move forward; this cached iterator at
    /// the line start is cloned whenever the gap start backs up.
    line_start_attr: Option<AttrIterator<'a>>,
    gap_start_attr: Option<AttrIterator<'a>>,

    gap_start_iter: LineIter,
    gap_start_x: f32,
    gap_end_iter: LineIter,
    gap_end_x: f32,
}

fn run_start_offset(line: &Line, run_index: usize) -> usize {
    line.runs[run_index].item.char_offset
}

/// An ellipsization boundary is a cluster start that is also a cursor
/// position, or the line edge.
fn starts_at_ellipsization_boundary(state: &EllipsizeState<'_>, line: &Line, iter: &LineIter) -> bool {
    if iter.start_char == 0 && iter.run_index == 0 {
        return true;
    }
    state.log_attrs[run_start_offset(line, iter.run_index) + iter.start_char].is_cursor_position()
}

fn ends_at_ellipsization_boundary(state: &EllipsizeState<'_>, line: &Line, iter: &LineIter) -> bool {
    if iter.end_char == line.runs[iter.run_index].item.num_chars
        && iter.run_index == line.runs.len() - 1
    {
        return true;
    }
    state.log_attrs[run_start_offset(line, iter.run_index) + iter.end_char].is_cursor_position()
}

/// Itemizes a short helper string (the ellipsis) into a single item.
fn itemize_text(state: &EllipsizeState<'_>, text: &str, attrs: &AttrList) -> Item {
    let mut items = itemize(
        state.context,
        Direction::Neutral,
        text,
        0,
        text.len(),
        Some(attrs),
    );
    debug_assert_eq!(items.len(), 1, "ellipsis text must itemize to one item");
    items.remove(0)
}

/// Shapes the ellipsis under the font attributes active at the gap start,
/// falling back to ASCII dots when the chosen font lacks the code point.
fn shape_ellipsis(state: &mut EllipsizeState<'_>) {
    // Carry the gap-start attributes over to the ellipsis, widened to cover
    // the whole helper string.
    let mut attrs = AttrList::new();
    if let Some(gap_attr) = &state.gap_start_attr {
        for attr in gap_attr.get_attrs() {
            if attr
                .attr_type()
                .affects()
                .intersects(AttrAffects::ITEMIZATION | AttrAffects::BREAKING | AttrAffects::SHAPING)
            {
                attrs.insert(attr.with_range(0, ATTR_INDEX_TO_TEXT_END));
            }
        }
    }

    let mut fallback_attrs = attrs.clone();
    attrs.insert(Attribute::fallback(false));

    let mut ellipsis_text: &str = if state.ellipsis_is_cjk {
        // U+22EF MIDLINE HORIZONTAL ELLIPSIS, used for CJK.
        "\u{22ef}"
    } else {
        // U+2026 HORIZONTAL ELLIPSIS.
        "\u{2026}"
    };

    let mut item = itemize_text(state, ellipsis_text, &attrs);

    let covered = item
        .analysis
        .font
        .as_ref()
        .is_some_and(|font| font.has_char(ellipsis_text.chars().next().unwrap()));
    if !covered {
        // Use "..." in the first matching font, with fallback enabled.
        fallback_attrs.insert(Attribute::fallback(true));
        ellipsis_text = "...";
        item = itemize_text(state, ellipsis_text, &fallback_attrs);
    }

    let log_attrs = compute_log_attrs(ellipsis_text, None);
    let mut glyphs = GlyphString::new();
    shape(
        ellipsis_text,
        ellipsis_text,
        &item.analysis,
        &log_attrs,
        &mut glyphs,
        state.shape_flags,
    );

    state.ellipsis_width = glyphs.width();
    state.ellipsis_run = Some(GlyphItem::new(item, glyphs));
}

/// Re-shapes the ellipsis when the gap start moved into a new attribute
/// range or its CJK-ness flipped.
fn update_ellipsis_shape(state: &mut EllipsizeState<'_>, line: &Line) {
    let mut recompute = state.ellipsis_run.is_none();

    if state.line_start_attr.is_none() {
        let mut iter = state.attrs.iterator();
        iter.advance(line.runs[0].item.offset);
        state.line_start_attr = Some(iter);
    }

    if let Some(gap_attr) = &state.gap_start_attr {
        let (start, _) = gap_attr.range();
        if state.gap_start_iter.start_index < start {
            state.gap_start_attr = None;
        }
    }

    if state.gap_start_attr.is_none() {
        let mut iter = state
            .line_start_attr
            .clone()
            .expect("line start iterator was just cached");
        iter.advance(line.runs[state.gap_start_iter.run_index].item.offset);
        state.gap_start_attr = Some(iter);
        recompute = true;
    }

    let start_char = state.text[state.gap_start_iter.start_index..]
        .chars()
        .next()
        .unwrap_or(' ');
    let cjk = is_wide(start_char);
    if cjk != state.ellipsis_is_cjk {
        state.ellipsis_is_cjk = cjk;
        recompute = true;
    }

    if recompute {
        shape_ellipsis(state);
    }
}

/// Finds the smallest span containing the gap center.
fn find_initial_span(state: &mut EllipsizeState<'_>, line: &Line, mode: EllipsizeMode) {
    state.gap_center = match mode {
        EllipsizeMode::Start => 0.0,
        EllipsizeMode::Middle => state.total_width / 2.0,
        EllipsizeMode::End | EllipsizeMode::None => state.total_width,
    };

    // The run containing the gap center. The line and its last run are
    // logically closed at the end, so a center at x = total width still
    // lands inside a run.
    let mut x = 0.0;
    let mut run_index = 0;
    while run_index < line.runs.len() {
        if x + state.run_widths[run_index] > state.gap_center {
            break;
        }
        x += state.run_widths[run_index];
        run_index += 1;
    }
    if run_index == line.runs.len() {
        run_index -= 1;
        x -= state.run_widths[run_index];
    }

    // The cluster containing the gap center.
    let mut iter = GlyphItemIter::init_start(&line.runs[run_index], state.text);
    let mut have_cluster = iter.has_cluster();
    let mut cluster_width = 0.0;
    while have_cluster {
        cluster_width = iter.cluster_width();
        if x + cluster_width > state.gap_center {
            break;
        }
        x += cluster_width;
        have_cluster = iter.next_cluster();
    }
    if !have_cluster {
        // The last cluster is a closed interval; back off one.
        x -= cluster_width;
    }

    state.gap_start_iter = LineIter::from_glyph_iter(run_index, &iter);
    state.gap_end_iter = state.gap_start_iter;
    state.gap_start_x = x;
    state.gap_end_x = x + cluster_width;

    // Expand the gap to a full span.
    while !starts_at_ellipsization_boundary(state, line, &state.gap_start_iter) {
        if !state.gap_start_iter.prev_cluster(line, state.text) {
            break;
        }
        state.gap_start_x -= state.gap_start_iter.cluster_width(line, state.text);
    }
    while !ends_at_ellipsization_boundary(state, line, &state.gap_end_iter) {
        if !state.gap_end_iter.next_cluster(line, state.text) {
            break;
        }
        state.gap_end_x += state.gap_end_iter.cluster_width(line, state.text);
    }

    update_ellipsis_shape(state, line);
}

/// Removes one span from whichever side of the gap grows the cheaper way.
/// Returns false when there is nothing left to remove in either direction.
fn remove_one_span(state: &mut EllipsizeState<'_>, line: &Line) -> bool {
    // Find one span backwards and forwards from the gap, skipping
    // zero-width clusters.
    let mut new_gap_start_iter = state.gap_start_iter;
    let mut new_gap_start_x = state.gap_start_x;
    loop {
        if !new_gap_start_iter.prev_cluster(line, state.text) {
            break;
        }
        let width = new_gap_start_iter.cluster_width(line, state.text);
        new_gap_start_x -= width;
        if starts_at_ellipsization_boundary(state, line, &new_gap_start_iter) && width != 0.0 {
            break;
        }
    }

    let mut new_gap_end_iter = state.gap_end_iter;
    let mut new_gap_end_x = state.gap_end_x;
    loop {
        if !new_gap_end_iter.next_cluster(line, state.text) {
            break;
        }
        let width = new_gap_end_iter.cluster_width(line, state.text);
        new_gap_end_x += width;
        if ends_at_ellipsization_boundary(state, line, &new_gap_end_iter) && width != 0.0 {
            break;
        }
    }

    if state.gap_end_x == new_gap_end_x && state.gap_start_x == new_gap_start_x {
        return false;
    }

    // When both sides can grow, pick the one causing the smaller increase in
    // MAX(gap_end - gap_center, gap_center - gap_start); ties grow the end.
    if state.gap_end_x == new_gap_end_x
        || (state.gap_start_x != new_gap_start_x
            && state.gap_center - new_gap_start_x < new_gap_end_x - state.gap_center)
    {
        state.gap_start_iter = new_gap_start_iter;
        state.gap_start_x = new_gap_start_x;
        update_ellipsis_shape(state, line);
    } else {
        state.gap_end_iter = new_gap_end_iter;
        state.gap_end_x = new_gap_end_x;
    }

    true
}

fn current_width(state: &EllipsizeState<'_>) -> f32 {
    state.total_width - (state.gap_end_x - state.gap_start_x) + state.ellipsis_width
}

/// Fixes the ellipsis run to cover the whole elided byte range as a single
/// cluster, with the minimum elided level and any residual width absorbed
/// into its final glyph.
fn fixup_ellipsis_run(state: &mut EllipsizeState<'_>, line: &Line, extra_width: f32) {
    let run = state.ellipsis_run.as_mut().expect("ellipsis was shaped");
    let glyphs = &mut run.glyphs;

    for cluster in &mut glyphs.log_clusters {
        *cluster = 0;
    }
    for glyph in &mut glyphs.glyphs {
        glyph.is_cluster_start = false;
    }
    glyphs.glyphs[0].is_cluster_start = true;
    glyphs.glyphs.last_mut().unwrap().width += extra_width;

    // Point the item at the entire elided text.
    let item = &mut run.item;
    item.offset = state.gap_start_iter.start_index;
    item.length = state.gap_end_iter.end_index - item.offset;
    item.num_chars = state.text[item.offset..item.offset + item.length]
        .chars()
        .count();
    item.char_offset =
        run_start_offset(line, state.gap_start_iter.run_index) + state.gap_start_iter.start_char;

    let mut level = u8::MAX;
    for run_index in state.gap_start_iter.run_index..=state.gap_end_iter.run_index {
        level = level.min(line.runs[run_index].item.analysis.level);
    }
    item.analysis.level = level;
    item.analysis.flags |= AnalysisFlags::IS_ELLIPSIS;
}

/// Ellipsizes `line` in place so that it fits `goal_width`.
pub(super) fn ellipsize_line(
    context: &LayoutContext,
    data: &Arc<LineData>,
    shape_flags: ShapeFlags,
    mode: EllipsizeMode,
    goal_width: f32,
    line: &mut Line,
) {
    debug_assert!(mode != EllipsizeMode::None && goal_width >= 0.0);
    if line.runs.is_empty() {
        return;
    }

    let owned_attrs = data.attrs.clone().unwrap_or_default();
    let run_widths: Vec<f32> = line.runs.iter().map(GlyphItem::width).collect();
    let total_width: f32 = run_widths.iter().sum();

    let placeholder = LineIter {
        run_index: 0,
        start_glyph: 0,
        end_glyph: 0,
        start_index: 0,
        end_index: 0,
        start_char: 0,
        end_char: 0,
    };
    let mut state = EllipsizeState {
        context,
        text: &data.text,
        log_attrs: &data.log_attrs,
        attrs: &owned_attrs,
        shape_flags,
        run_widths,
        total_width,
        gap_center: 0.0,
        ellipsis_run: None,
        ellipsis_width: 0.0,
        ellipsis_is_cjk: false,
        line_start_attr: None,
        gap_start_attr: None,
        gap_start_iter: placeholder,
        gap_start_x: 0.0,
        gap_end_iter: placeholder,
        gap_end_x: 0.0,
    };

    if state.total_width <= goal_width {
        return;
    }

    find_initial_span(&mut state, line, mode);

    while current_width(&state) > goal_width {
        if !remove_one_span(&mut state, line) {
            break;
        }
    }

    let extra_width = (goal_width - current_width(&state)).max(0.0);
    fixup_ellipsis_run(&mut state, line, extra_width);

    // Splice the surviving run pieces around the ellipsis. The end run is
    // cut first so the start indices stay valid when both ends share a run.
    let start_ri = state.gap_start_iter.run_index;
    let end_ri = state.gap_end_iter.run_index;
    let mut old_runs = std::mem::take(&mut line.runs);

    let mut partial_end_run = None;
    if state.gap_end_iter.end_char != old_runs[end_ri].item.num_chars {
        let split_index = state.gap_end_iter.end_index - old_runs[end_ri].item.offset;
        let gap_part = old_runs[end_ri].split(&data.text, split_index);
        // The slot keeps the surviving suffix; swap so the gap part is
        // dropped with the other elided runs.
        partial_end_run = Some(std::mem::replace(&mut old_runs[end_ri], gap_part));
    }

    let mut partial_start_run = None;
    if state.gap_start_iter.start_char != 0 {
        let split_index = state.gap_start_iter.start_index - old_runs[start_ri].item.offset;
        partial_start_run = Some(old_runs[start_ri].split(&data.text, split_index));
    }

    let mut ellipsis_run = state.ellipsis_run.take();
    let mut new_runs = Vec::with_capacity(old_runs.len() + 2);
    for (index, run) in old_runs.into_iter().enumerate() {
        if index < start_ri {
            new_runs.push(run);
        } else if index == start_ri {
            if let Some(prefix) = partial_start_run.take() {
                new_runs.push(prefix);
            }
            new_runs.push(ellipsis_run.take().expect("ellipsis was shaped"));
            if index == end_ri {
                if let Some(suffix) = partial_end_run.take() {
                    new_runs.push(suffix);
                }
            }
            // The gap portion of this run is dropped.
        } else if index <= end_ri {
            if index == end_ri {
                if let Some(suffix) = partial_end_run.take() {
                    new_runs.push(suffix);
                }
            }
        } else {
            new_runs.push(run);
        }
    }
    line.runs = new_runs;
    line.ellipsized = true;
}
