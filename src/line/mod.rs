// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lines and the byte-index ↔ x-coordinate mapping within them.

mod breaker;
mod ellipsize;

pub use breaker::LineBreaker;

use std::sync::Arc;

use crate::attrs::AttrList;
use crate::context::Direction;
use crate::glyph::{GlyphItem, GlyphString};
use crate::LogAttr;

/// How lines wrap when they overflow their width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// Wrap at word boundaries.
    #[default]
    Word,
    /// Wrap at grapheme boundaries.
    Char,
    /// Wrap at word boundaries, falling back to graphemes when a single
    /// word doesn't fit.
    WordChar,
}

/// Where to elide a line that overflows its width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EllipsizeMode {
    #[default]
    None,
    Start,
    Middle,
    End,
}

/// One queued paragraph of text with its attributes and log-attrs. Shared
/// between the breaker and the lines produced from it.
#[derive(Debug)]
pub(crate) struct LineData {
    pub(crate) text: String,
    pub(crate) attrs: Option<AttrList>,
    pub(crate) log_attrs: Vec<LogAttr>,
    pub(crate) n_chars: usize,
}

/// One laid-out line: glyph runs in visual order.
///
/// A line is produced by [`LineBreaker::next_line`] with its baseline origin
/// at (0, 0); positioning lines below one another is the caller's concern.
#[derive(Debug)]
pub struct Line {
    pub(crate) data: Arc<LineData>,
    pub(crate) runs: Vec<GlyphItem>,
    pub(crate) start_index: usize,
    pub(crate) start_offset: usize,
    pub(crate) length: usize,
    pub(crate) num_chars: usize,
    pub(crate) direction: Direction,
    pub(crate) starts_paragraph: bool,
    pub(crate) ends_paragraph: bool,
    pub(crate) wrapped: bool,
    pub(crate) hyphenated: bool,
    pub(crate) ellipsized: bool,
}

impl Line {
    pub(crate) fn new(data: Arc<LineData>) -> Self {
        Self {
            data,
            runs: Vec::new(),
            start_index: 0,
            start_offset: 0,
            length: 0,
            num_chars: 0,
            direction: Direction::Ltr,
            starts_paragraph: false,
            ends_paragraph: false,
            wrapped: false,
            hyphenated: false,
            ellipsized: false,
        }
    }

    /// The runs of the line in visual order.
    pub fn runs(&self) -> &[GlyphItem] {
        &self.runs
    }

    /// Byte index of the line's start in its paragraph.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Character offset of the line's start in its paragraph.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Byte length of the text covered by the line's runs.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn num_chars(&self) -> usize {
        self.num_chars
    }

    /// The resolved direction: always [`Direction::Ltr`] or
    /// [`Direction::Rtl`].
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn starts_paragraph(&self) -> bool {
        self.starts_paragraph
    }

    pub fn ends_paragraph(&self) -> bool {
        self.ends_paragraph
    }

    /// Whether the breaker wrapped this line (as opposed to ending it at a
    /// paragraph boundary).
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Whether a hyphen was inserted at the end of this line.
    pub fn is_hyphenated(&self) -> bool {
        self.hyphenated
    }

    pub fn is_ellipsized(&self) -> bool {
        self.ellipsized
    }

    /// The paragraph text this line was produced from.
    pub fn paragraph_text(&self) -> &str {
        &self.data.text
    }

    /// The slice of paragraph text covered by the line's runs.
    pub fn text(&self) -> &str {
        &self.data.text[self.start_index..self.start_index + self.length]
    }

    /// Total advance width.
    pub fn width(&self) -> f32 {
        self.runs.iter().map(GlyphItem::width).sum()
    }

    /// Converts a byte index within the line to an x position, in layout
    /// units from the line's left edge.
    ///
    /// With `trailing`, the position is the trailing edge of the character;
    /// positions inside a cluster are interpolated linearly.
    pub fn index_to_x(&self, index: usize, trailing: bool) -> f32 {
        let mut x = 0.0;
        for run in &self.runs {
            let item = &run.item;
            if index >= item.offset && index < item.offset + item.length {
                let run_text = &self.data.text[item.offset..item.offset + item.length];
                return x
                    + glyph_string_index_to_x(
                        &run.glyphs,
                        run_text,
                        run.is_rtl(),
                        index - item.offset,
                        trailing,
                    );
            }
            x += run.width();
        }
        x
    }

    /// Converts an x position to a byte index and a trailing count: the
    /// number of characters of the hit cluster cell lying to the logical
    /// left of `x`.
    ///
    /// Positions outside the line clamp to its edges.
    pub fn x_to_index(&self, x: f32) -> (usize, usize) {
        if self.runs.is_empty() {
            return (self.start_index, 0);
        }
        let width = self.width();

        // The extreme edges resolve to the outermost characters directly:
        // the boundary position belongs to no glyph.
        if x <= 0.0 {
            let run = &self.runs[0];
            return if run.is_rtl() {
                (last_char_offset(&self.data.text, &run.item), 1)
            } else {
                (run.item.offset, 0)
            };
        }
        if x >= width {
            let run = self.runs.last().unwrap();
            return if run.is_rtl() {
                (run.item.offset, 0)
            } else {
                (last_char_offset(&self.data.text, &run.item), 1)
            };
        }

        let x = x.clamp(0.0, width);
        let mut run_x = 0.0;
        for (index, run) in self.runs.iter().enumerate() {
            let run_width = run.width();
            let last = index == self.runs.len() - 1;
            if x < run_x + run_width || last {
                let item = &run.item;
                let run_text = &self.data.text[item.offset..item.offset + item.length];
                let (rel, trailing) =
                    glyph_string_x_to_index(&run.glyphs, run_text, run.is_rtl(), x - run_x);
                return (item.offset + rel, trailing);
            }
            run_x += run_width;
        }
        (self.start_index, 0)
    }
}

/// Byte offset of the last character of an item.
fn last_char_offset(text: &str, item: &crate::item::Item) -> usize {
    text[item.offset..item.offset + item.length]
        .char_indices()
        .next_back()
        .map(|(byte, _)| item.offset + byte)
        .unwrap_or(item.offset)
}

/// Reorders runs from logical to visual order according to their embedding
/// levels: every maximal span at or above each level, taken from the highest
/// level down to the lowest odd one, is reversed.
pub(crate) fn reorder_runs(runs: &mut [GlyphItem]) {
    let run_count = runs.len();
    if run_count < 2 {
        return;
    }

    let mut max_level = 0_u8;
    let mut lowest_odd_level = u8::MAX;
    for run in runs.iter() {
        let level = run.item.analysis.level;
        if level > max_level {
            max_level = level;
        }
        if level & 1 != 0 && level < lowest_odd_level {
            lowest_odd_level = level;
        }
    }
    if lowest_odd_level == u8::MAX {
        return;
    }

    for level in (lowest_odd_level..=max_level).rev() {
        let mut i = 0;
        while i < run_count {
            if runs[i].item.analysis.level >= level {
                let mut end = i + 1;
                while end < run_count && runs[end].item.analysis.level >= level {
                    end += 1;
                }
                runs[i..end].reverse();
                i = end;
            }
            i += 1;
        }
    }
}

/// Converts a byte index within a run to an x position from the run's left
/// edge, interpolating inside clusters.
pub(crate) fn glyph_string_index_to_x(
    glyphs: &GlyphString,
    run_text: &str,
    rtl: bool,
    index: usize,
    trailing: bool,
) -> f32 {
    if glyphs.is_empty() {
        return 0.0;
    }

    let mut start_xpos = 0.0;
    let mut end_xpos = 0.0;
    let mut width = 0.0;
    let mut start_index: Option<usize> = None;
    let mut end_index: Option<usize> = None;

    if rtl {
        width = glyphs.width();
        for i in (0..glyphs.len()).rev() {
            if glyphs.log_clusters[i] > index {
                end_index = Some(glyphs.log_clusters[i]);
                end_xpos = width;
                break;
            }
            if Some(glyphs.log_clusters[i]) != start_index {
                start_index = Some(glyphs.log_clusters[i]);
                start_xpos = width;
            }
            width -= glyphs.glyphs[i].width;
        }
    } else {
        for i in 0..glyphs.len() {
            if glyphs.log_clusters[i] > index {
                end_index = Some(glyphs.log_clusters[i]);
                end_xpos = width;
                break;
            }
            if Some(glyphs.log_clusters[i]) != start_index {
                start_index = Some(glyphs.log_clusters[i]);
                start_xpos = width;
            }
            width += glyphs.glyphs[i].width;
        }
    }

    let start_index = start_index.unwrap_or(0);
    let end_index = match end_index {
        Some(end) => end,
        None => {
            end_xpos = if rtl { 0.0 } else { width };
            run_text.len()
        }
    };

    // Offset of the character within its cluster.
    let mut cluster_chars = 0_usize;
    let mut cluster_offset = 0_usize;
    for (byte, _) in run_text[start_index..end_index].char_indices() {
        if start_index + byte < index {
            cluster_offset += 1;
        }
        cluster_chars += 1;
    }
    if trailing {
        cluster_offset += 1;
    }
    if cluster_chars == 0 {
        return start_xpos;
    }

    ((cluster_chars - cluster_offset) as f32 * start_xpos
        + cluster_offset as f32 * end_xpos)
        / cluster_chars as f32
}

/// Converts an x position from a run's left edge to a byte index and a
/// 0-or-1 trailing indicator for the hit character cell.
pub(crate) fn glyph_string_x_to_index(
    glyphs: &GlyphString,
    run_text: &str,
    rtl: bool,
    x: f32,
) -> (usize, usize) {
    if glyphs.is_empty() {
        return (0, 0);
    }

    let mut start_xpos = 0.0;
    let mut end_xpos = 0.0;
    let mut width = 0.0;
    let mut start_index: Option<usize> = None;
    let mut end_index: Option<usize> = None;
    let mut found = false;

    if rtl {
        width = glyphs.width();
        for i in (0..glyphs.len()).rev() {
            if Some(glyphs.log_clusters[i]) != start_index {
                if found {
                    end_index = Some(glyphs.log_clusters[i]);
                    end_xpos = width;
                    break;
                }
                start_index = Some(glyphs.log_clusters[i]);
                start_xpos = width;
            }
            width -= glyphs.glyphs[i].width;
            if width <= x && x < width + glyphs.glyphs[i].width {
                found = true;
            }
        }
    } else {
        for i in 0..glyphs.len() {
            if Some(glyphs.log_clusters[i]) != start_index {
                if found {
                    end_index = Some(glyphs.log_clusters[i]);
                    end_xpos = width;
                    break;
                }
                start_index = Some(glyphs.log_clusters[i]);
                start_xpos = width;
            }
            if width <= x && x < width + glyphs.glyphs[i].width {
                found = true;
            }
            width += glyphs.glyphs[i].width;
        }
    }

    let start_index = start_index.unwrap_or(0);
    let end_index = match end_index {
        Some(end) => end,
        None => {
            end_xpos = if rtl { 0.0 } else { width };
            run_text.len()
        }
    };

    let cluster_chars = run_text[start_index..end_index].chars().count();
    if start_xpos == end_xpos || cluster_chars == 0 {
        return (start_index, 0);
    }

    let cp = (x - start_xpos) * cluster_chars as f32 / (end_xpos - start_xpos);

    // LTR and RTL handled separately because of the boundary condition:
    // end_xpos goes with the next character for LTR, the previous for RTL.
    if start_xpos < end_xpos {
        let cell = (cp.max(0.0) as usize).min(cluster_chars - 1);
        let byte = run_text[start_index..end_index]
            .char_indices()
            .nth(cell)
            .map(|(b, _)| start_index + b)
            .unwrap_or(start_index);
        let trailing = usize::from(cp.fract() >= 0.5);
        (byte, trailing)
    } else {
        let cell = if cp <= 1.0 {
            0
        } else {
            (cp.ceil() as usize - 1).min(cluster_chars - 1)
        };
        let byte = run_text[start_index..end_index]
            .char_indices()
            .nth(cell)
            .map(|(b, _)| start_index + b)
            .unwrap_or(start_index);
        let cp_flip = cluster_chars as f32 - cp;
        let trailing = usize::from(cp_flip.fract() < 0.5);
        (byte, trailing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::GlyphInfo;
    use crate::item::{Analysis, Item};

    fn run_glyphs(text: &str, rtl: bool) -> GlyphString {
        let mut glyphs = GlyphString::new();
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let logical: Vec<usize> = if rtl {
            offsets.iter().rev().copied().collect()
        } else {
            offsets
        };
        for cluster in logical {
            glyphs.glyphs.push(GlyphInfo {
                glyph: 1,
                width: 10.0,
                is_cluster_start: true,
                ..Default::default()
            });
            glyphs.log_clusters.push(cluster);
        }
        glyphs
    }

    #[test]
    fn index_to_x_is_monotonic_ltr() {
        let glyphs = run_glyphs("abc", false);
        assert_eq!(glyph_string_index_to_x(&glyphs, "abc", false, 0, false), 0.0);
        assert_eq!(glyph_string_index_to_x(&glyphs, "abc", false, 1, false), 10.0);
        assert_eq!(glyph_string_index_to_x(&glyphs, "abc", false, 2, true), 30.0);
    }

    #[test]
    fn index_to_x_reverses_for_rtl() {
        let glyphs = run_glyphs("abc", true);
        assert_eq!(glyph_string_index_to_x(&glyphs, "abc", true, 0, false), 30.0);
        assert_eq!(glyph_string_index_to_x(&glyphs, "abc", true, 2, false), 10.0);
        assert_eq!(glyph_string_index_to_x(&glyphs, "abc", true, 2, true), 0.0);
    }

    #[test]
    fn x_to_index_round_trips_cluster_boundaries() {
        let glyphs = run_glyphs("abc", false);
        for (index, _) in "abc".char_indices() {
            let x = glyph_string_index_to_x(&glyphs, "abc", false, index, false);
            let (back, _) = glyph_string_x_to_index(&glyphs, "abc", false, x);
            assert_eq!(back, index);
        }
    }

    #[test]
    fn x_to_index_reports_trailing_half() {
        let glyphs = run_glyphs("ab", false);
        let (index, trailing) = glyph_string_x_to_index(&glyphs, "ab", false, 7.0);
        assert_eq!(index, 0);
        assert_eq!(trailing, 1);
        let (index, trailing) = glyph_string_x_to_index(&glyphs, "ab", false, 12.0);
        assert_eq!(index, 1);
        assert_eq!(trailing, 0);
    }

    #[test]
    fn reorder_swaps_rtl_spans() {
        let make = |offset: usize, level: u8| {
            let item = Item {
                offset,
                length: 1,
                num_chars: 1,
                char_offset: offset,
                analysis: Analysis {
                    level,
                    ..Analysis::default()
                },
            };
            GlyphItem::new(item, run_glyphs("a", level & 1 != 0))
        };
        // LTR, RTL, RTL, LTR at levels 0,1,1,0.
        let mut runs = vec![make(0, 0), make(1, 1), make(2, 1), make(3, 0)];
        reorder_runs(&mut runs);
        let order: Vec<usize> = runs.iter().map(|r| r.item.offset).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn reorder_reverses_all_rtl_line() {
        let make = |offset: usize| {
            let item = Item {
                offset,
                length: 1,
                num_chars: 1,
                char_offset: offset,
                analysis: Analysis {
                    level: 1,
                    ..Analysis::default()
                },
            };
            GlyphItem::new(item, run_glyphs("a", true))
        };
        let mut runs = vec![make(0), make(1), make(2)];
        reorder_runs(&mut runs);
        let order: Vec<usize> = runs.iter().map(|r| r.item.offset).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }
}
