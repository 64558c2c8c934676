// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Items: maximal substrings of uniform analysis.

use unicode_script::Script;

use crate::attrs::{AttrIterator, Attribute};
use crate::context::Gravity;
use crate::font::{FontRef, Language};

bitflags::bitflags! {
    /// Flags attached to an item's analysis.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AnalysisFlags: u8 {
        /// Glyphs sit on a centered baseline (vertical gravities, CJK).
        const CENTERED_BASELINE = 1 << 0;
        /// The item is the ellipsis inserted by ellipsization.
        const IS_ELLIPSIS = 1 << 1;
        /// Shaping must add a hyphen after this item (break site).
        const NEED_HYPHEN = 1 << 2;
    }
}

/// The analysis shared by every character of an item.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// The font selected for the item; `None` when the font map had no
    /// match (the fallback shaper takes over).
    pub font: Option<FontRef>,
    /// Bidirectional embedding level; odd levels are right-to-left.
    pub level: u8,
    pub gravity: Gravity,
    pub flags: AnalysisFlags,
    pub script: Script,
    pub language: Option<Language>,
    /// Attributes to apply during shaping and rendering.
    pub extra_attrs: Vec<Attribute>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            font: None,
            level: 0,
            gravity: Gravity::South,
            flags: AnalysisFlags::empty(),
            script: Script::Common,
            language: None,
            extra_attrs: Vec::new(),
        }
    }
}

impl Analysis {
    pub fn is_rtl(&self) -> bool {
        self.level & 1 != 0
    }
}

/// A maximal contiguous substring uniform in script, level, language, font
/// and itemization attributes.
#[derive(Clone, Debug)]
pub struct Item {
    /// Byte offset into the text.
    pub offset: usize,
    /// Byte length.
    pub length: usize,
    /// Number of characters.
    pub num_chars: usize,
    /// Character offset into the text.
    pub char_offset: usize,
    pub analysis: Analysis,
}

impl Item {
    /// Splits off the first `split_length` bytes (`split_num_chars`
    /// characters) into a new item; `self` keeps the remainder.
    pub fn split(&mut self, split_length: usize, split_num_chars: usize) -> Self {
        debug_assert!(
            split_length <= self.length && split_num_chars <= self.num_chars,
            "split beyond item bounds"
        );
        let first = Self {
            offset: self.offset,
            length: split_length,
            num_chars: split_num_chars,
            char_offset: self.char_offset,
            analysis: self.analysis.clone(),
        };
        self.offset += split_length;
        self.length -= split_length;
        self.num_chars -= split_num_chars;
        self.char_offset += split_num_chars;
        first
    }

    /// Reverses a [`split`](Self::split) whose first part was discarded,
    /// re-extending this item to cover it again.
    pub fn unsplit(&mut self, split_length: usize, split_num_chars: usize) {
        self.offset -= split_length;
        self.length += split_length;
        self.num_chars += split_num_chars;
        self.char_offset -= split_num_chars;
    }

    /// Collects the attributes overlapping this item from `iter` into the
    /// item's extras. The iterator is left positioned at the last segment
    /// examined so a sequence of items can share one pass.
    pub fn apply_attrs(&mut self, iter: &mut AttrIterator<'_>) {
        let item_start = self.offset;
        let item_end = self.offset + self.length;
        loop {
            let (start, end) = iter.range();
            if start >= item_end {
                break;
            }
            if end > item_start {
                for attr in iter.get_attrs() {
                    if !self.analysis.extra_attrs.contains(&attr) {
                        self.analysis.extra_attrs.push(attr);
                    }
                }
            }
            if end >= item_end || !iter.next() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::{AttrList, Color};

    #[test]
    fn split_and_unsplit_round_trip() {
        let mut item = Item {
            offset: 4,
            length: 10,
            num_chars: 10,
            char_offset: 4,
            analysis: Analysis::default(),
        };
        let first = item.split(3, 3);
        assert_eq!((first.offset, first.length, first.num_chars), (4, 3, 3));
        assert_eq!((item.offset, item.length, item.char_offset), (7, 7, 7));
        item.unsplit(3, 3);
        assert_eq!((item.offset, item.length, item.num_chars), (4, 10, 10));
    }

    #[test]
    fn apply_attrs_collects_overlapping_ranges() {
        let mut list = AttrList::new();
        list.insert(Attribute::foreground(Color::new(1, 2, 3)).with_range(0, 6));
        list.insert(Attribute::strikethrough(true).with_range(8, 12));

        let mut iter = list.iterator();
        let mut a = Item {
            offset: 0,
            length: 5,
            num_chars: 5,
            char_offset: 0,
            analysis: Analysis::default(),
        };
        let mut b = Item {
            offset: 5,
            length: 5,
            num_chars: 5,
            char_offset: 5,
            analysis: Analysis::default(),
        };
        a.apply_attrs(&mut iter);
        b.apply_attrs(&mut iter);
        assert_eq!(a.analysis.extra_attrs.len(), 1);
        // b overlaps the tail of the foreground and the head of the
        // strikethrough.
        assert_eq!(b.analysis.extra_attrs.len(), 2);
    }
}
