// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph strings and glyph runs.
//!
//! A [`GlyphString`] holds the shaper's output for one item: parallel arrays
//! of glyph info and log clusters. Glyphs are stored in left-to-right visual
//! order regardless of the item's direction; for right-to-left items that is
//! reversed logical order.

use crate::item::Item;
use crate::LogAttr;

/// A glyph index within a font.
pub type Glyph = u32;

/// A glyph that occupies space but paints nothing.
pub const GLYPH_EMPTY: Glyph = 0x0fff_ffff;

/// Produced when shaping sees invalid input.
pub const GLYPH_INVALID_INPUT: Glyph = 0xffff_ffff;

/// Flag marking a "missing glyph" box for the code point in the low bits.
pub const GLYPH_UNKNOWN_FLAG: Glyph = 0x1000_0000;

/// The missing-glyph box for `ch`.
pub fn glyph_unknown(ch: char) -> Glyph {
    ch as u32 | GLYPH_UNKNOWN_FLAG
}

/// A single positioned glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphInfo {
    pub glyph: Glyph,
    /// Advance width.
    pub width: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    /// Set on the first glyph of each cluster.
    pub is_cluster_start: bool,
}

/// Shaped glyphs for one item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphString {
    pub glyphs: Vec<GlyphInfo>,
    /// Byte offset, relative to the item's start, of the first character of
    /// the cluster each glyph belongs to.
    pub log_clusters: Vec<usize>,
}

impl GlyphString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn set_size(&mut self, len: usize) {
        self.glyphs.resize(len, GlyphInfo::default());
        self.log_clusters.resize(len, 0);
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
        self.log_clusters.clear();
    }

    /// Total advance width.
    pub fn width(&self) -> f32 {
        self.glyphs.iter().map(|g| g.width).sum()
    }

    /// Reverses storage order; used to repair shaper output that arrived in
    /// the wrong direction.
    pub fn reverse(&mut self) {
        self.glyphs.reverse();
        self.log_clusters.reverse();
    }

    /// Distributes cluster widths evenly over the characters of each
    /// cluster.
    ///
    /// `text` is the item's text; `rtl` selects the storage order to walk.
    /// The result has one width per character.
    pub fn logical_widths(&self, text: &str, rtl: bool) -> Vec<f32> {
        let num_chars = text.chars().count();
        let mut widths = vec![0.0_f32; num_chars];
        if self.is_empty() || num_chars == 0 {
            return widths;
        }

        // Byte offset -> char index for cluster starts.
        let char_index = |byte: usize| text[..byte.min(text.len())].chars().count();

        let mut glyph = 0;
        while glyph < self.len() {
            let cluster = self.log_clusters[glyph];
            let mut cluster_width = 0.0;
            let mut end = glyph;
            while end < self.len() && self.log_clusters[end] == cluster {
                cluster_width += self.glyphs[end].width;
                end += 1;
            }

            // The cluster covers [cluster, next_cluster) in text.
            let next_cluster = if rtl {
                if glyph == 0 {
                    text.len()
                } else {
                    self.log_clusters[glyph - 1]
                }
            } else if end < self.len() {
                self.log_clusters[end]
            } else {
                text.len()
            };

            let first_char = char_index(cluster);
            let end_char = char_index(next_cluster);
            let cluster_chars = end_char.saturating_sub(first_char).max(1);
            let per_char = cluster_width / cluster_chars as f32;
            for width in widths
                .iter_mut()
                .skip(first_char)
                .take(cluster_chars)
            {
                *width = per_char;
            }

            glyph = end;
        }

        widths
    }
}

/// An [`Item`] paired with its shaped glyphs; a run on a line.
#[derive(Clone, Debug)]
pub struct GlyphItem {
    pub item: Item,
    pub glyphs: GlyphString,
    /// Horizontal displacement applied before the run, e.g. from baseline
    /// shifts with an italic correction.
    pub start_x_offset: f32,
    /// Horizontal displacement applied after the run.
    pub end_x_offset: f32,
    /// Vertical displacement of the run's baseline; positive raises it.
    pub y_offset: f32,
}

impl GlyphItem {
    pub fn new(item: Item, glyphs: GlyphString) -> Self {
        Self {
            item,
            glyphs,
            start_x_offset: 0.0,
            end_x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.item.analysis.level & 1 != 0
    }

    pub fn width(&self) -> f32 {
        self.glyphs.width()
    }

    /// Splits off the first `split_index` bytes (relative to the item) into
    /// a new run; `self` keeps the remainder. `split_index` must fall on a
    /// cluster boundary.
    pub fn split(&mut self, text: &str, split_index: usize) -> Self {
        debug_assert!(
            split_index > 0 && split_index < self.item.length,
            "split index must be interior to the run"
        );

        let num_glyphs = self.glyphs.len();
        // Number of glyphs belonging to the first part.
        let split_glyphs = if self.is_rtl() {
            // RTL storage puts the logical head at the back.
            let mut count = 0;
            while count < num_glyphs
                && self.glyphs.log_clusters[num_glyphs - 1 - count] < split_index
            {
                count += 1;
            }
            count
        } else {
            let mut count = 0;
            while count < num_glyphs && self.glyphs.log_clusters[count] < split_index {
                count += 1;
            }
            count
        };

        let split_chars = text[self.item.offset..self.item.offset + split_index]
            .chars()
            .count();
        let first_item = self.item.split(split_index, split_chars);

        let mut first_glyphs = GlyphString::new();
        if self.is_rtl() {
            let keep = num_glyphs - split_glyphs;
            first_glyphs.glyphs = self.glyphs.glyphs.split_off(keep);
            first_glyphs.log_clusters = self.glyphs.log_clusters.split_off(keep);
            for cluster in &mut self.glyphs.log_clusters {
                *cluster -= split_index;
            }
        } else {
            first_glyphs.glyphs = self.glyphs.glyphs.drain(..split_glyphs).collect();
            first_glyphs.log_clusters = self.glyphs.log_clusters.drain(..split_glyphs).collect();
            for cluster in &mut self.glyphs.log_clusters {
                *cluster -= split_index;
            }
        }

        Self {
            item: first_item,
            glyphs: first_glyphs,
            start_x_offset: self.start_x_offset,
            end_x_offset: self.end_x_offset,
            y_offset: self.y_offset,
        }
    }

    /// Adds letter spacing after every grapheme, split half before and half
    /// after each interior boundary. The run's outer edges are handled by
    /// the shaping adapter and trimmed during line post-processing.
    pub(crate) fn letter_space(&mut self, text: &str, log_attrs: &[LogAttr], letter_spacing: f32) {
        let space_left = letter_spacing / 2.0;
        let space_right = letter_spacing - space_left;
        let num_glyphs = self.glyphs.len();
        if num_glyphs == 0 {
            return;
        }

        let mut iter = GlyphItemIter::init_start(self, text);
        let mut clusters: Vec<(isize, isize, usize)> = Vec::new();
        loop {
            clusters.push((iter.start_glyph, iter.end_glyph, iter.start_char));
            if !iter.next_cluster() {
                break;
            }
        }

        for (start_glyph, end_glyph, start_char) in clusters {
            if !log_attrs
                .get(start_char)
                .is_some_and(|attr| attr.is_cursor_position())
            {
                continue;
            }
            if start_glyph < end_glyph {
                // LTR
                if start_char > 0 {
                    let glyph = &mut self.glyphs.glyphs[start_glyph as usize];
                    glyph.width += space_left;
                    glyph.x_offset += space_left;
                }
                if (end_glyph as usize) < num_glyphs {
                    self.glyphs.glyphs[(end_glyph - 1) as usize].width += space_right;
                }
            } else {
                // RTL; trailing spacing shifts the following (visually
                // preceding) glyph so widths stay attached to their cluster.
                if start_char > 0 {
                    self.glyphs.glyphs[start_glyph as usize].width += space_left;
                }
                if end_glyph >= 0 {
                    let glyph = &mut self.glyphs.glyphs[end_glyph as usize];
                    glyph.width += space_right;
                    glyph.x_offset += space_right;
                }
            }
        }
    }
}

/// Iterator over the clusters of a [`GlyphItem`], in logical order.
///
/// `start_glyph`/`end_glyph` bracket the cluster's glyphs in storage order:
/// for LTR runs `start < end` and glyphs are `[start, end)`; for RTL runs
/// `start > end` and glyphs are `(end, start]` walked downward.
/// `start_index`/`end_index` are absolute byte positions and
/// `start_char`/`end_char` are character offsets relative to the item.
#[derive(Clone, Debug)]
pub struct GlyphItemIter<'a> {
    pub glyph_item: &'a GlyphItem,
    pub text: &'a str,
    pub start_glyph: isize,
    pub end_glyph: isize,
    pub start_index: usize,
    pub end_index: usize,
    pub start_char: usize,
    pub end_char: usize,
}

impl<'a> GlyphItemIter<'a> {
    /// Positions the iterator on the first cluster; the iterator is unusable
    /// if the run has no glyphs (`has_cluster` on the result is false).
    pub fn init_start(glyph_item: &'a GlyphItem, text: &'a str) -> Self {
        let mut iter = Self {
            glyph_item,
            text,
            start_glyph: 0,
            end_glyph: 0,
            start_index: glyph_item.item.offset,
            end_index: glyph_item.item.offset,
            start_char: 0,
            end_char: 0,
        };
        if glyph_item.is_rtl() {
            iter.end_glyph = glyph_item.glyphs.len() as isize - 1;
        }
        iter.next_cluster();
        iter
    }

    /// Positions the iterator on the last cluster.
    pub fn init_end(glyph_item: &'a GlyphItem, text: &'a str) -> Self {
        let item = &glyph_item.item;
        let sentinel = if glyph_item.is_rtl() {
            -1
        } else {
            glyph_item.glyphs.len() as isize
        };
        let mut iter = Self {
            glyph_item,
            text,
            start_glyph: sentinel,
            end_glyph: sentinel,
            start_index: item.offset + item.length,
            end_index: item.offset + item.length,
            start_char: item.num_chars,
            end_char: item.num_chars,
        };
        iter.prev_cluster();
        iter
    }

    /// Whether the iterator currently points at a cluster.
    pub fn has_cluster(&self) -> bool {
        self.start_index < self.end_index
    }

    fn chars_between(&self, start: usize, end: usize) -> usize {
        self.text[start..end].chars().count()
    }

    /// Advances to the next cluster in logical order.
    pub fn next_cluster(&mut self) -> bool {
        let glyphs = &self.glyph_item.glyphs;
        let item = &self.glyph_item.item;
        let num_glyphs = glyphs.len() as isize;
        let mut glyph_index = self.end_glyph;

        if self.glyph_item.is_rtl() {
            if glyph_index < 0 {
                return false;
            }
        } else if glyph_index >= num_glyphs {
            return false;
        }

        self.start_glyph = self.end_glyph;
        self.start_index = self.end_index;
        self.start_char = self.end_char;

        if self.glyph_item.is_rtl() {
            let cluster = glyphs.log_clusters[glyph_index as usize];
            loop {
                glyph_index -= 1;
                if glyph_index < 0 {
                    self.end_index = item.offset + item.length;
                    self.end_char = item.num_chars;
                    break;
                }
                if glyphs.log_clusters[glyph_index as usize] != cluster {
                    self.end_index = item.offset + glyphs.log_clusters[glyph_index as usize];
                    self.end_char =
                        self.start_char + self.chars_between(self.start_index, self.end_index);
                    break;
                }
            }
        } else {
            let cluster = glyphs.log_clusters[glyph_index as usize];
            loop {
                glyph_index += 1;
                if glyph_index >= num_glyphs {
                    self.end_index = item.offset + item.length;
                    self.end_char = item.num_chars;
                    break;
                }
                if glyphs.log_clusters[glyph_index as usize] != cluster {
                    self.end_index = item.offset + glyphs.log_clusters[glyph_index as usize];
                    self.end_char =
                        self.start_char + self.chars_between(self.start_index, self.end_index);
                    break;
                }
            }
        }

        self.end_glyph = glyph_index;
        debug_assert!(self.start_index < self.end_index, "empty cluster");
        true
    }

    /// Moves back to the previous cluster in logical order.
    pub fn prev_cluster(&mut self) -> bool {
        let glyphs = &self.glyph_item.glyphs;
        let item = &self.glyph_item.item;
        let num_glyphs = glyphs.len() as isize;
        let mut glyph_index = self.start_glyph;

        if self.glyph_item.is_rtl() {
            if glyph_index >= num_glyphs - 1 {
                return false;
            }
        } else if glyph_index <= 0 {
            return false;
        }

        self.end_glyph = self.start_glyph;
        self.end_index = self.start_index;
        self.end_char = self.start_char;

        if self.glyph_item.is_rtl() {
            glyph_index += 1;
            let cluster = glyphs.log_clusters[glyph_index as usize];
            while glyph_index < num_glyphs - 1
                && glyphs.log_clusters[glyph_index as usize + 1] == cluster
            {
                glyph_index += 1;
            }
            self.start_index = item.offset + cluster;
            self.start_char =
                self.end_char - self.chars_between(self.start_index, self.end_index);
        } else {
            glyph_index -= 1;
            let cluster = glyphs.log_clusters[glyph_index as usize];
            while glyph_index > 0 && glyphs.log_clusters[glyph_index as usize - 1] == cluster {
                glyph_index -= 1;
            }
            self.start_index = item.offset + cluster;
            self.start_char =
                self.end_char - self.chars_between(self.start_index, self.end_index);
        }

        self.start_glyph = glyph_index;
        debug_assert!(self.start_index < self.end_index, "empty cluster");
        true
    }

    /// The advance width of the current cluster.
    pub fn cluster_width(&self) -> f32 {
        let glyphs = &self.glyph_item.glyphs;
        let mut width = 0.0;
        if self.start_glyph < self.end_glyph {
            for i in self.start_glyph..self.end_glyph {
                width += glyphs.glyphs[i as usize].width;
            }
        } else {
            let mut i = self.start_glyph;
            while i > self.end_glyph {
                width += glyphs.glyphs[i as usize].width;
                i -= 1;
            }
        }
        width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Analysis, Item};

    fn make_run(text: &str, level: u8) -> GlyphItem {
        // One glyph per char, advance 10.
        let mut glyphs = GlyphString::new();
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let logical: Vec<usize> = if level & 1 != 0 {
            offsets.iter().rev().copied().collect()
        } else {
            offsets.clone()
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
        let item = Item {
            offset: 0,
            length: text.len(),
            num_chars: text.chars().count(),
            char_offset: 0,
            analysis: Analysis {
                level,
                ..Analysis::default()
            },
        };
        GlyphItem::new(item, glyphs)
    }

    #[test]
    fn iter_walks_ltr_clusters_in_logical_order() {
        let run = make_run("abc", 0);
        let mut iter = GlyphItemIter::init_start(&run, "abc");
        assert_eq!((iter.start_index, iter.end_index), (0, 1));
        assert!(iter.next_cluster());
        assert_eq!((iter.start_index, iter.end_index), (1, 2));
        assert!(iter.next_cluster());
        assert_eq!((iter.start_index, iter.end_index), (2, 3));
        assert!(!iter.next_cluster());
    }

    #[test]
    fn iter_walks_rtl_clusters_in_logical_order() {
        let run = make_run("abc", 1);
        let mut iter = GlyphItemIter::init_start(&run, "abc");
        assert_eq!((iter.start_index, iter.end_index), (0, 1));
        assert_eq!(iter.start_glyph, 2);
        assert!(iter.next_cluster());
        assert_eq!((iter.start_index, iter.end_index), (1, 2));
        assert!(iter.next_cluster());
        assert_eq!((iter.start_index, iter.end_index), (2, 3));
        assert!(!iter.next_cluster());
    }

    #[test]
    fn iter_init_end_walks_backwards() {
        let run = make_run("abc", 0);
        let mut iter = GlyphItemIter::init_end(&run, "abc");
        assert_eq!((iter.start_index, iter.end_index), (2, 3));
        assert!(iter.prev_cluster());
        assert_eq!((iter.start_index, iter.end_index), (1, 2));
        assert!(iter.prev_cluster());
        assert_eq!((iter.start_index, iter.end_index), (0, 1));
        assert!(!iter.prev_cluster());
    }

    #[test]
    fn logical_widths_divide_clusters_evenly() {
        let mut glyphs = GlyphString::new();
        // "ffi" shaped to a single ligature glyph of width 30.
        glyphs.glyphs.push(GlyphInfo {
            glyph: 7,
            width: 30.0,
            is_cluster_start: true,
            ..Default::default()
        });
        glyphs.log_clusters.push(0);
        let widths = glyphs.logical_widths("ffi", false);
        assert_eq!(widths, vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn split_ltr_run() {
        let mut run = make_run("abcd", 0);
        let first = run.split("abcd", 2);
        assert_eq!(first.item.length, 2);
        assert_eq!(first.glyphs.len(), 2);
        assert_eq!(run.item.offset, 2);
        assert_eq!(run.item.length, 2);
        assert_eq!(run.glyphs.log_clusters, vec![0, 1]);
    }

    #[test]
    fn split_rtl_run() {
        let mut run = make_run("abcd", 1);
        let first = run.split("abcd", 1);
        assert_eq!(first.item.length, 1);
        assert_eq!(first.glyphs.len(), 1);
        assert_eq!(first.glyphs.log_clusters, vec![0]);
        assert_eq!(run.glyphs.len(), 3);
        // Remaining clusters are rebased and still reversed.
        assert_eq!(run.glyphs.log_clusters, vec![2, 1, 0]);
    }
}
