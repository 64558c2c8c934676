// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute iteration.

use smallvec::SmallVec;

use crate::font::{
    FontDescription, FontStretch, FontStyle, FontVariant, FontWeight, Language,
};

use super::list::AttrList;
use super::types::{AttrMerge, AttrType, AttrValue, Attribute, ATTR_INDEX_TO_TEXT_END};

/// A cursor over the segments of an [`AttrList`].
///
/// At any moment the iterator exposes a half-open range
/// ([`range`](Self::range)) inside which the set of active attributes is
/// constant. [`next`](Self::next) advances to the next boundary where the
/// set changes. The list must not be modified while an iterator is live
/// (enforced by the borrow).
#[derive(Clone, Debug)]
pub struct AttrIterator<'a> {
    attrs: &'a [Attribute],
    attr_index: usize,
    start: usize,
    end: usize,
    /// Indices of attributes currently in effect, in list order; the back of
    /// the stack takes priority on lookups.
    stack: SmallVec<[usize; 8]>,
}

impl<'a> AttrIterator<'a> {
    pub(crate) fn new(list: &'a AttrList) -> Self {
        let mut iter = Self {
            attrs: list.attributes(),
            attr_index: 0,
            start: 0,
            end: 0,
            stack: SmallVec::new(),
        };
        if !iter.next() {
            iter.end = ATTR_INDEX_TO_TEXT_END;
        }
        iter
    }

    /// The current segment.
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Advances to the next segment. Returns `false` at the end of the list.
    pub fn next(&mut self) -> bool {
        if self.attr_index >= self.attrs.len() && self.stack.is_empty() {
            return false;
        }

        self.start = self.end;
        let start = self.start;
        let attrs = self.attrs;
        let mut end = ATTR_INDEX_TO_TEXT_END;

        self.stack.retain(|&mut index| attrs[index].end != start);
        for &index in self.stack.iter() {
            end = end.min(attrs[index].end);
        }

        while self.attr_index < attrs.len() {
            let attr = &attrs[self.attr_index];
            if attr.start != start {
                break;
            }
            if attr.end > start {
                self.stack.push(self.attr_index);
                end = end.min(attr.end);
            }
            self.attr_index += 1;
        }

        if self.attr_index < attrs.len() {
            end = end.min(attrs[self.attr_index].start);
        }

        self.end = end;
        true
    }

    /// Advances until the current segment contains `index`. Returns `false`
    /// if the iterator runs off the end first.
    pub fn advance(&mut self, index: usize) -> bool {
        while index >= self.end {
            if !self.next() {
                return false;
            }
        }
        if self.start > index {
            log::warn!("attribute iterator had already moved beyond the index");
        }
        true
    }

    /// The active attribute of `ty`, if any.
    ///
    /// When multiple attributes of the same type overlap, the one whose range
    /// starts closest to the current position wins.
    pub fn get(&self, ty: AttrType) -> Option<&'a Attribute> {
        self.stack
            .iter()
            .rev()
            .map(|&index| &self.attrs[index])
            .find(|attr| attr.ty == ty)
    }

    /// All attributes active on the current segment.
    ///
    /// For types with the [`Overrides`](AttrMerge::Overrides) merge policy,
    /// only the highest-priority value of each type is returned.
    pub fn get_attrs(&self) -> Vec<Attribute> {
        let mut out: Vec<Attribute> = Vec::new();
        for &index in self.stack.iter().rev() {
            let attr = &self.attrs[index];
            if attr.ty.merge() == AttrMerge::Overrides
                && out.iter().any(|prev| prev.ty == attr.ty)
            {
                continue;
            }
            out.push(attr.clone());
        }
        out.reverse();
        out
    }

    /// Resolves the font description, language and non-font extras at the
    /// current position.
    ///
    /// `desc` should come in holding the layout defaults; fields set by
    /// attributes override it under a first-set-wins mask walked from the
    /// top of the stack. The `Scale` pseudo-attribute multiplies the size
    /// after all masks have accumulated.
    pub fn get_font(
        &self,
        desc: &mut FontDescription,
        language: &mut Option<Language>,
        extras: Option<&mut Vec<Attribute>>,
    ) {
        use crate::font::FontMask;

        let mut mask = FontMask::empty();
        let mut scale: Option<f64> = None;
        let mut have_language = false;
        let mut collected: Vec<Attribute> = Vec::new();

        for &index in self.stack.iter().rev() {
            let attr = &self.attrs[index];
            match attr.ty {
                AttrType::FONT_DESC => {
                    if let AttrValue::FontDesc(other) = &attr.value {
                        let new_mask = other.set_fields() & !mask;
                        mask |= new_mask;
                        desc.unset_fields(new_mask);
                        desc.merge(other, false);
                    }
                }
                AttrType::FAMILY => {
                    if !mask.contains(FontMask::FAMILY) {
                        mask |= FontMask::FAMILY;
                        if let AttrValue::String(family) = &attr.value {
                            desc.set_family(family);
                        }
                    }
                }
                AttrType::STYLE => {
                    if !mask.contains(FontMask::STYLE) {
                        mask |= FontMask::STYLE;
                        desc.set_style(FontStyle::from_raw(attr.int_value()));
                    }
                }
                AttrType::VARIANT => {
                    if !mask.contains(FontMask::VARIANT) {
                        mask |= FontMask::VARIANT;
                        desc.set_variant(FontVariant::from_raw(attr.int_value()));
                    }
                }
                AttrType::WEIGHT => {
                    if !mask.contains(FontMask::WEIGHT) {
                        mask |= FontMask::WEIGHT;
                        desc.set_weight(FontWeight(attr.int_value().clamp(0, 1000) as u16));
                    }
                }
                AttrType::STRETCH => {
                    if !mask.contains(FontMask::STRETCH) {
                        mask |= FontMask::STRETCH;
                        desc.set_stretch(FontStretch::from_raw(attr.int_value()));
                    }
                }
                AttrType::SIZE => {
                    if !mask.contains(FontMask::SIZE) {
                        mask |= FontMask::SIZE;
                        desc.set_size(attr.float_value() as f32);
                    }
                }
                AttrType::ABSOLUTE_SIZE => {
                    if !mask.contains(FontMask::SIZE) {
                        mask |= FontMask::SIZE;
                        desc.set_absolute_size(attr.float_value() as f32);
                    }
                }
                AttrType::SCALE => {
                    if scale.is_none() {
                        scale = Some(attr.float_value());
                    }
                }
                AttrType::LANGUAGE => {
                    if !have_language {
                        have_language = true;
                        if let AttrValue::Language(lang) = &attr.value {
                            *language = Some(*lang);
                        }
                    }
                }
                _ => {
                    let found = attr.ty.merge() == AttrMerge::Overrides
                        && collected.iter().any(|prev| prev.ty == attr.ty);
                    if !found {
                        collected.push(attr.clone());
                    }
                }
            }
        }

        if let Some(scale) = scale {
            // Keep the product in a double so no intermediate lives in an
            // extended-precision register.
            let size: f64 = scale * f64::from(desc.size());
            if desc.size_is_absolute() {
                desc.set_absolute_size(size as f32);
            } else {
                desc.set_size(size as f32);
            }
        }

        if let Some(extras) = extras {
            collected.reverse();
            *extras = collected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::types::Color;

    const RED: Color = Color::new(0xffff, 0, 0);
    const BLUE: Color = Color::new(0, 0, 0xffff);

    #[test]
    fn iterates_segments_of_constant_attributes() {
        let mut list = AttrList::new();
        list.insert(Attribute::foreground(RED).with_range(1, 4));
        list.insert(Attribute::foreground(BLUE).with_range(2, 5));

        let mut iter = list.iterator();
        assert_eq!(iter.range(), (0, 1));
        assert!(iter.get(AttrType::FOREGROUND).is_none());

        assert!(iter.next());
        assert_eq!(iter.range(), (1, 2));
        assert_eq!(
            iter.get(AttrType::FOREGROUND).unwrap().value(),
            &AttrValue::Color(RED)
        );

        assert!(iter.next());
        assert_eq!(iter.range(), (2, 4));
        // The attribute starting closest to the position wins.
        assert_eq!(
            iter.get(AttrType::FOREGROUND).unwrap().value(),
            &AttrValue::Color(BLUE)
        );

        assert!(iter.next());
        assert_eq!(iter.range(), (4, 5));
        assert!(iter.next());
        assert_eq!(iter.range(), (5, ATTR_INDEX_TO_TEXT_END));
        assert!(!iter.next());
    }

    #[test]
    fn empty_list_has_one_unbounded_segment() {
        let list = AttrList::new();
        let mut iter = list.iterator();
        assert_eq!(iter.range(), (0, ATTR_INDEX_TO_TEXT_END));
        assert!(!iter.next());
    }

    #[test]
    fn get_attrs_applies_override_merge() {
        let mut list = AttrList::new();
        list.insert(Attribute::foreground(RED).with_range(0, 10));
        list.insert(Attribute::foreground(BLUE).with_range(0, 10));
        let iter = list.iterator();
        let attrs = iter.get_attrs();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value(), &AttrValue::Color(BLUE));
    }

    #[test]
    fn advance_moves_to_containing_segment() {
        let mut list = AttrList::new();
        list.insert(Attribute::foreground(RED).with_range(3, 6));
        let mut iter = list.iterator();
        assert!(iter.advance(4));
        assert_eq!(iter.range(), (3, 6));
        assert!(iter.advance(100));
        assert_eq!(iter.range().1, ATTR_INDEX_TO_TEXT_END);
    }

    #[test]
    fn get_font_masks_and_scales() {
        use crate::font::FontWeight;

        let mut list = AttrList::new();
        let mut desc_attr = FontDescription::new();
        desc_attr.set_family("Mono");
        desc_attr.set_size(10.0);
        list.insert(Attribute::font_desc(desc_attr).with_range(0, 10));
        // Weight set directly wins over the description's unset weight.
        list.insert(Attribute::weight(FontWeight::BOLD).with_range(0, 10));
        list.insert(Attribute::scale(2.0).with_range(0, 10));
        list.insert(Attribute::strikethrough(true).with_range(0, 10));

        let iter = list.iterator();
        let mut desc = FontDescription::new();
        desc.set_family("sans-serif");
        desc.set_size(12.0);
        let mut language = None;
        let mut extras = Vec::new();
        iter.get_font(&mut desc, &mut language, Some(&mut extras));

        assert_eq!(desc.family(), Some("Mono"));
        assert_eq!(desc.weight(), FontWeight::BOLD);
        assert_eq!(desc.size(), 20.0);
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].attr_type(), AttrType::STRIKETHROUGH);
    }
}
