// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ranged attributes over text.
//!
//! An [`AttrList`] holds [`Attribute`]s sorted by start index. Lists resolve
//! overlaps of same-typed attributes through [`AttrList::change`], track text
//! edits through [`AttrList::update`] and [`AttrList::splice`], and expose
//! the active attribute set at every position through [`AttrIterator`].

mod iter;
mod list;
mod registry;
mod serialize;
mod types;

pub use iter::AttrIterator;
pub use list::AttrList;
pub use serialize::{ParseError, ParseErrorKind};
pub use types::{
    AttrAffects, AttrMerge, AttrType, AttrValue, AttrValueKind, Attribute, BaselineShift, Color,
    CustomValue, FontScale, LineStyle, ShowFlags, TextTransform, ATTR_INDEX_FROM_TEXT_BEGINNING,
    ATTR_INDEX_TO_TEXT_END,
};
