// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute lists.

use super::iter::AttrIterator;
use super::types::{Attribute, ATTR_INDEX_FROM_TEXT_BEGINNING, ATTR_INDEX_TO_TEXT_END};

/// An ordered collection of [`Attribute`]s.
///
/// Attributes are kept sorted by start index, with a stable order among equal
/// starts. Cloning a list deep-copies the attributes it owns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttrList {
    attributes: Vec<Attribute>,
}

impl AttrList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn insert_internal(&mut self, attr: Attribute, before: bool) -> usize {
        let start = attr.start;
        let position = if before {
            self.attributes
                .iter()
                .position(|a| a.start >= start)
                .unwrap_or(self.attributes.len())
        } else {
            self.attributes
                .iter()
                .position(|a| a.start > start)
                .unwrap_or(self.attributes.len())
        };
        self.attributes.insert(position, attr);
        position
    }

    /// Inserts `attr` after all other attributes with a matching start index.
    pub fn insert(&mut self, attr: Attribute) {
        self.insert_internal(attr, false);
    }

    /// Inserts `attr` before all other attributes with a matching start index.
    pub fn insert_before(&mut self, attr: Attribute) {
        self.insert_internal(attr, true);
    }

    /// Inserts `attr`, replacing any attributes of the same type on its
    /// segment and merging with adjoining attributes of identical value.
    ///
    /// After `change`, attributes of the inserted type have pairwise-disjoint
    /// ranges, and no two touching ranges carry identical values. This is
    /// slower than [`insert`](Self::insert) (linear in the list), but keeps a
    /// continually edited list normalized.
    pub fn change(&mut self, attr: Attribute) {
        let start_index = attr.start;
        let end_index = attr.end;

        if start_index == end_index {
            // Empty range, nothing to do.
            return;
        }

        if self.attributes.is_empty() {
            self.insert(attr);
            return;
        }

        let ty = attr.ty;
        let mut attr = Some(attr);
        let mut attr_index = None;
        let mut i = 0;
        while i < self.attributes.len() {
            if self.attributes[i].start > start_index {
                self.attributes.insert(i, attr.take().unwrap());
                attr_index = Some(i);
                break;
            }

            if self.attributes[i].ty != ty {
                i += 1;
                continue;
            }

            if self.attributes[i].end < start_index {
                // This attribute does not overlap with the new one.
                i += 1;
                continue;
            }

            if self.attributes[i].equal_value(attr.as_ref().unwrap()) {
                if self.attributes[i].end >= end_index {
                    // Totally inside the existing attribute, nothing to do.
                    return;
                }
                self.attributes[i].end = end_index;
                attr_index = Some(i);
                break;
            }

            // Split, truncate, or remove the old attribute.
            if self.attributes[i].end > end_index {
                let mut end_attr = self.attributes[i].clone();
                end_attr.start = end_index;
                self.insert(end_attr);
            }
            if self.attributes[i].start == start_index {
                self.attributes.remove(i);
                break;
            }
            self.attributes[i].end = start_index;
            i += 1;
        }

        let mut attr_index = match attr_index {
            Some(index) => index,
            None => self.insert_internal(attr.take().unwrap(), false),
        };

        // The range is in the list one way or the other; fix up the
        // remainder, continuing from where the scan above stopped.
        let mut j = i + 1;
        while j < self.attributes.len() {
            if self.attributes[j].start > end_index {
                break;
            }
            if j == attr_index || self.attributes[j].ty != ty {
                j += 1;
                continue;
            }

            if self.attributes[j].end <= self.attributes[attr_index].end
                || self.attributes[j].equal_value(&self.attributes[attr_index])
            {
                // Merge the following attribute into the new one.
                self.attributes[attr_index].end = end_index.max(self.attributes[j].end);
                self.attributes.remove(j);
                if attr_index > j {
                    attr_index -= 1;
                }
                continue;
            }

            // Trim the start of this attribute so it begins at the end of
            // the new attribute; this may require moving it to keep starts
            // non-decreasing.
            self.attributes[j].start = self.attributes[attr_index].end;
            let mut k = j;
            while k + 1 < self.attributes.len()
                && self.attributes[k + 1].start < self.attributes[k].start
            {
                self.attributes.swap(k, k + 1);
                if attr_index == k + 1 {
                    attr_index = k;
                }
                k += 1;
            }
            j += 1;
        }
    }

    /// Adjusts indices for an edit that removed `remove` bytes at `pos` and
    /// inserted `add` bytes. Attributes entirely inside the removed range are
    /// dropped; sentinel endpoints are preserved.
    pub fn update(&mut self, pos: usize, remove: usize, add: usize) {
        let mut i = 0;
        while i < self.attributes.len() {
            let attr = &mut self.attributes[i];

            if attr.start >= pos && attr.end < pos + remove {
                self.attributes.remove(i);
                continue;
            }

            if attr.start != ATTR_INDEX_FROM_TEXT_BEGINNING {
                if attr.start >= pos && attr.start < pos + remove {
                    attr.start = pos + add;
                } else if attr.start >= pos + remove {
                    attr.start = attr.start - remove + add;
                }
            }

            if attr.end != ATTR_INDEX_TO_TEXT_END {
                if attr.end >= pos && attr.end < pos + remove {
                    attr.end = pos;
                } else if attr.end >= pos + remove {
                    if add > remove && ATTR_INDEX_TO_TEXT_END - attr.end < add - remove {
                        attr.end = ATTR_INDEX_TO_TEXT_END;
                    } else {
                        attr.end = attr.end - remove + add;
                    }
                }
            }

            i += 1;
        }
    }

    /// Opens a hole of length `len` at `pos`, stretching attributes that
    /// cross it, then [`change`](Self::change)s a copy of each of `other`'s
    /// attributes offset by `pos` and clamped to the hole.
    ///
    /// With `len == 0` the other list's attributes are overlaid without
    /// clamping, which merges two lists after index adjustment.
    pub fn splice(&mut self, other: &Self, pos: usize, len: usize) {
        let end = pos.saturating_add(len);

        for attr in &mut self.attributes {
            if attr.start <= pos {
                if attr.end > pos {
                    attr.end = attr.end.saturating_add(len);
                }
            } else {
                // This can squash an attribute against the end sentinel, but
                // deleting it here could surprise the caller, so keep it.
                attr.start = attr.start.saturating_add(len);
                attr.end = attr.end.saturating_add(len);
            }
        }

        for attr in &other.attributes {
            let mut attr = attr.clone();
            if len > 0 {
                attr.start = attr.start.saturating_add(pos).min(end);
                attr.end = attr.end.saturating_add(pos).min(end);
            } else {
                attr.start = attr.start.saturating_add(pos);
                attr.end = attr.end.saturating_add(pos);
            }
            // A zero-length result is discarded by `change`.
            self.change(attr);
        }
    }

    /// Removes attributes matching `predicate` and returns them as a new
    /// list, or `None` if none matched.
    pub fn filter(&mut self, mut predicate: impl FnMut(&Attribute) -> bool) -> Option<Self> {
        let mut filtered = Vec::new();
        let mut i = 0;
        while i < self.attributes.len() {
            if predicate(&self.attributes[i]) {
                filtered.push(self.attributes.remove(i));
            } else {
                i += 1;
            }
        }
        if filtered.is_empty() {
            None
        } else {
            Some(Self {
                attributes: filtered,
            })
        }
    }

    /// Whether both lists hold the same multiset of (range, value) pairs,
    /// regardless of insertion order.
    pub fn equal(&self, other: &Self) -> bool {
        if self.attributes.len() != other.attributes.len() {
            return false;
        }
        let mut matched = vec![false; other.attributes.len()];
        for attr in &self.attributes {
            let mut found = false;
            for (candidate, used) in other.attributes.iter().zip(matched.iter_mut()) {
                if !*used
                    && candidate.start == attr.start
                    && candidate.end == attr.end
                    && candidate.equal_value(attr)
                {
                    *used = true;
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    /// An iterator over the segments of constant attribute set.
    pub fn iterator(&self) -> AttrIterator<'_> {
        AttrIterator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::types::Color;

    fn fg(color: Color, start: usize, end: usize) -> Attribute {
        Attribute::foreground(color).with_range(start, end)
    }

    const RED: Color = Color::new(0xffff, 0, 0);
    const BLUE: Color = Color::new(0, 0, 0xffff);

    #[test]
    fn insert_keeps_start_order_and_stability() {
        let mut list = AttrList::new();
        list.insert(fg(RED, 5, 10));
        list.insert(fg(BLUE, 0, 3));
        list.insert(fg(BLUE, 5, 8));
        let starts: Vec<_> = list.attributes().iter().map(|a| a.start()).collect();
        assert_eq!(starts, vec![0, 5, 5]);
        // Equal starts: the later insert lands after.
        assert_eq!(list.attributes()[1].value(), &super::super::AttrValue::Color(RED));

        list.insert_before(fg(RED, 5, 6));
        assert_eq!(list.attributes()[1].value(), &super::super::AttrValue::Color(RED));
        assert_eq!(list.attributes()[1].end(), 6);
    }

    #[test]
    fn change_truncates_overlapping_attribute() {
        // Spec scenario: [0,5)=red then change([3,8)=blue) leaves
        // [0,3)=red and [3,8)=blue.
        let mut list = AttrList::new();
        list.change(fg(RED, 0, 5));
        list.change(fg(BLUE, 3, 8));
        let attrs = list.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].range(), (0, 3));
        assert_eq!(attrs[1].range(), (3, 8));
    }

    #[test]
    fn change_merges_touching_equal_values() {
        let mut list = AttrList::new();
        list.change(fg(RED, 0, 5));
        list.change(fg(RED, 5, 9));
        let attrs = list.attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].range(), (0, 9));
    }

    #[test]
    fn change_splits_containing_attribute() {
        let mut list = AttrList::new();
        list.change(fg(RED, 0, 10));
        list.change(fg(BLUE, 3, 6));
        let attrs = list.attributes();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].range(), (0, 3));
        assert_eq!(attrs[1].range(), (3, 6));
        assert_eq!(attrs[2].range(), (6, 10));
    }

    #[test]
    fn change_absorbs_contained_attributes() {
        let mut list = AttrList::new();
        list.change(fg(RED, 2, 4));
        list.change(fg(RED, 6, 8));
        list.change(fg(BLUE, 0, 10));
        let attrs = list.attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].range(), (0, 10));
    }

    #[test]
    fn change_discards_empty_range() {
        let mut list = AttrList::new();
        list.change(fg(RED, 4, 4));
        assert!(list.is_empty());
    }

    #[test]
    fn update_drops_and_shifts() {
        let mut list = AttrList::new();
        list.insert(fg(RED, 2, 4));
        list.insert(fg(BLUE, 10, 20));
        // Remove bytes [3, 9), insert 2.
        list.update(3, 6, 2);
        let attrs = list.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].range(), (2, 3));
        assert_eq!(attrs[1].range(), (6, 16));

        // An attribute wholly inside the removed region is dropped.
        let mut list = AttrList::new();
        list.insert(fg(RED, 3, 5));
        list.update(2, 6, 0);
        assert!(list.is_empty());
    }

    #[test]
    fn update_round_trip_outside_edit_is_identity() {
        let mut list = AttrList::new();
        list.insert(fg(RED, 0, 4));
        list.insert(fg(BLUE, 20, 30));
        let before = list.clone();
        list.update(10, 3, 7);
        list.update(10, 7, 3);
        assert!(list.equal(&before));
    }

    #[test]
    fn update_preserves_sentinels() {
        let mut list = AttrList::new();
        list.insert(Attribute::foreground(RED));
        list.update(0, 5, 0);
        assert_eq!(list.attributes()[0].range(), (0, usize::MAX));
    }

    #[test]
    fn splice_stretches_and_overlays() {
        let mut list = AttrList::new();
        list.insert(fg(RED, 0, 10));
        let mut other = AttrList::new();
        other.insert(fg(BLUE, 0, 3));
        list.splice(&other, 4, 3);
        let attrs = list.attributes();
        // The hole stretched red to [0, 13); blue occupies [4, 7).
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].range(), (0, 4));
        assert_eq!(attrs[1].range(), (4, 7));
        assert_eq!(attrs[2].range(), (7, 13));
    }

    #[test]
    fn splice_len_zero_is_plain_overlay() {
        let mut list = AttrList::new();
        list.insert(fg(RED, 0, 4));
        let mut other = AttrList::new();
        other.insert(fg(BLUE, 0, 6));
        list.splice(&other, 10, 0);
        let attrs = list.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].range(), (10, 16));
    }

    #[test]
    fn filter_extracts_matching() {
        let mut list = AttrList::new();
        list.insert(fg(RED, 0, 4));
        list.insert(Attribute::strikethrough(true).with_range(1, 2));
        let filtered = list
            .filter(|attr| attr.attr_type() == crate::attrs::AttrType::STRIKETHROUGH)
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(list.len(), 1);
        assert!(list
            .filter(|attr| attr.attr_type() == crate::attrs::AttrType::STRIKETHROUGH)
            .is_none());
    }

    #[test]
    fn equal_ignores_order() {
        let mut a = AttrList::new();
        a.insert(fg(RED, 0, 4));
        a.insert(fg(BLUE, 2, 6));
        let mut b = AttrList::new();
        b.insert(fg(BLUE, 2, 6));
        b.insert(fg(RED, 0, 4));
        assert!(a.equal(&b));
        b.insert(fg(RED, 0, 4));
        assert!(!a.equal(&b));
    }
}
