// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lineflow is a library for laying out attributed, bidirectional,
//! multi-script text one line at a time.
//!
//! Some key types are:
//! - [`AttrList`] holds ranged attributes over a text and resolves overlaps.
//! - [`LayoutContext`] carries the font map and global layout parameters. The
//!   font backend itself stays behind the [`font::Font`] and [`font::FontMap`]
//!   traits.
//! - [`LineBreaker`] consumes attributed paragraphs and produces [`Line`]s on
//!   demand: each call to [`next_line`](LineBreaker::next_line) receives a
//!   width, a wrap mode and an ellipsization mode, so every line can be
//!   requested with different parameters (and undone with
//!   [`undo_line`](LineBreaker::undo_line)).
//! - [`Line`] is a list of positioned glyph runs in visual order, with
//!   byte-index ↔ x-coordinate mapping.
//!
//! ## Usage example
//!
//! ```rust
//! use std::sync::Arc;
//! use lineflow::{AttrList, Attribute, LayoutContext, LineBreaker, WrapMode, EllipsizeMode};
//! use lineflow::testing::TestFontMap;
//!
//! // A real application provides its own font backend; the deterministic
//! // test backend shapes every char to a fixed-width glyph.
//! let context = LayoutContext::new(Arc::new(TestFontMap::new()));
//!
//! let mut attrs = AttrList::new();
//! attrs.insert(Attribute::letter_spacing(1.0).with_range(0, 5));
//!
//! let mut breaker = LineBreaker::new(context);
//! breaker.add_text("Hello World", Some(&attrs));
//!
//! while breaker.has_line() {
//!     let line = breaker
//!         .next_line(0.0, 80.0, WrapMode::Word, EllipsizeMode::None)
//!         .unwrap();
//!     for run in line.runs() {
//!         let _advance = run.glyphs.width();
//!     }
//! }
//! ```

// LINEBENDER LINT SET - lib.rs - v4
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET

mod analysis;
mod context;
mod glyph;
mod item;
mod itemize;
mod line;
mod shape;
mod tabs;

pub mod attrs;
pub mod font;
pub mod render;
pub mod testing;

#[cfg(test)]
mod tests;

pub use analysis::{compute_log_attrs, LogAttr};
pub use attrs::{AttrList, AttrType, AttrValue, Attribute, Color, ShowFlags};
pub use context::{Direction, Gravity, GravityHint, LayoutContext};
pub use glyph::{
    glyph_unknown, Glyph, GlyphInfo, GlyphItem, GlyphItemIter, GlyphString, GLYPH_EMPTY,
    GLYPH_INVALID_INPUT, GLYPH_UNKNOWN_FLAG,
};
pub use item::{Analysis, AnalysisFlags, Item};
pub use itemize::itemize;
pub use line::{EllipsizeMode, Line, LineBreaker, WrapMode};
pub use shape::{shape, ShapeFlags};
pub use tabs::{TabAlign, TabArray, TabStop};
