// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic font backend for tests and examples.
//!
//! Every character shapes to one glyph whose id is its code point, 10 units
//! wide (20 for East Asian wide characters, 0 for combining marks). This
//! makes layout results exactly predictable without loading any real font.

use std::sync::Arc;

use hashbrown::HashSet;

use crate::font::{
    Font, FontDescription, FontMap, FontMetrics, FontRef, GlyphExtents, Language, Rect,
};
use crate::glyph::{glyph_unknown, Glyph, GlyphInfo, GlyphString, GLYPH_UNKNOWN_FLAG};
use crate::item::Analysis;
use crate::shape::ShapeFlags;

/// Advance of a regular glyph.
pub const CHAR_WIDTH: f32 = 10.0;

/// Advance of an East Asian wide glyph.
pub const WIDE_CHAR_WIDTH: f32 = 20.0;

pub(crate) fn is_combining(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036f}' | '\u{0591}'..='\u{05bd}' | '\u{20d0}'..='\u{20ff}')
}

pub(crate) fn is_wide(ch: char) -> bool {
    matches!(
        ch,
        '\u{1100}'..='\u{115f}'
            | '\u{2e80}'..='\u{a4cf}'
            | '\u{ac00}'..='\u{d7a3}'
            | '\u{f900}'..='\u{faff}'
            | '\u{ff00}'..='\u{ff60}'
    )
}

fn char_width(ch: char) -> f32 {
    if is_combining(ch) {
        0.0
    } else if is_wide(ch) {
        WIDE_CHAR_WIDTH
    } else {
        CHAR_WIDTH
    }
}

/// A metrics-only font with fixed advances.
#[derive(Debug)]
pub struct TestFont {
    description: FontDescription,
    missing: HashSet<char>,
    broken: bool,
}

impl TestFont {
    pub fn new() -> Self {
        let mut description = FontDescription::new();
        description.set_family("Test");
        description.set_size(10.0);
        Self {
            description,
            missing: HashSet::new(),
            broken: false,
        }
    }

    pub fn with_family(family: &str) -> Self {
        let mut font = Self::new();
        font.description.set_family(family);
        font
    }

    /// A font lacking coverage for `chars`.
    pub fn without_chars(chars: &[char]) -> Self {
        let mut font = Self::new();
        font.missing = chars.iter().copied().collect();
        font
    }

    /// A font whose shaper yields no glyphs, to exercise the fallback path.
    pub fn broken() -> Self {
        let mut font = Self::new();
        font.description.set_family("Broken");
        font.broken = true;
        font
    }

    fn glyph_char(glyph: Glyph) -> Option<char> {
        char::from_u32(glyph & !GLYPH_UNKNOWN_FLAG)
    }
}

impl Default for TestFont {
    fn default() -> Self {
        Self::new()
    }
}

impl Font for TestFont {
    fn description(&self) -> FontDescription {
        self.description.clone()
    }

    fn metrics(&self, _language: Option<Language>) -> FontMetrics {
        FontMetrics {
            ascent: 8.0,
            descent: 2.0,
            height: 12.0,
            underline_position: -1.0,
            underline_thickness: 1.0,
            strikethrough_position: 4.0,
            strikethrough_thickness: 1.0,
            approximate_char_width: CHAR_WIDTH,
            approximate_digit_width: CHAR_WIDTH,
        }
    }

    fn glyph_extents(&self, glyph: Glyph) -> GlyphExtents {
        let width = Self::glyph_char(glyph).map(char_width).unwrap_or(CHAR_WIDTH);
        let logical = Rect {
            x: 0.0,
            y: -8.0,
            width,
            height: 10.0,
        };
        GlyphExtents {
            ink: logical,
            logical,
        }
    }

    fn nominal_glyph(&self, ch: char) -> Option<Glyph> {
        if self.missing.contains(&ch) {
            None
        } else {
            Some(ch as u32)
        }
    }

    fn shape_text(
        &self,
        text: &str,
        analysis: &Analysis,
        _flags: ShapeFlags,
        glyphs: &mut GlyphString,
    ) {
        glyphs.clear();
        if self.broken {
            return;
        }
        for (offset, ch) in text.char_indices() {
            let cluster = if is_combining(ch) && !glyphs.is_empty() {
                *glyphs.log_clusters.last().unwrap()
            } else {
                offset
            };
            glyphs.glyphs.push(GlyphInfo {
                glyph: self.nominal_glyph(ch).unwrap_or_else(|| glyph_unknown(ch)),
                width: char_width(ch),
                x_offset: 0.0,
                y_offset: 0.0,
                is_cluster_start: !is_combining(ch) || glyphs.glyphs.is_empty(),
            });
            glyphs.log_clusters.push(cluster);
        }
        if analysis.is_rtl() {
            glyphs.reverse();
        }
    }
}

/// A font map always resolving to shared [`TestFont`] instances.
#[derive(Debug)]
pub struct TestFontMap {
    default: FontRef,
    families: Vec<(String, FontRef)>,
    fallback: Option<FontRef>,
}

impl TestFontMap {
    pub fn new() -> Self {
        Self {
            default: Arc::new(TestFont::new()),
            families: Vec::new(),
            fallback: None,
        }
    }

    /// Uses `font` as the default match.
    pub fn with_default(font: TestFont) -> Self {
        Self {
            default: Arc::new(font),
            families: Vec::new(),
            fallback: None,
        }
    }

    /// Registers a distinct font for a family name.
    pub fn add_family(&mut self, family: &str, font: TestFont) {
        self.families.push((family.to_owned(), Arc::new(font)));
    }

    /// Registers the font used for per-character fallback.
    pub fn set_fallback(&mut self, font: TestFont) {
        self.fallback = Some(Arc::new(font));
    }

    /// The default font instance.
    pub fn font(&self) -> FontRef {
        self.default.clone()
    }
}

impl Default for TestFontMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FontMap for TestFontMap {
    fn load_font(&self, desc: &FontDescription, _language: Option<Language>) -> Option<FontRef> {
        if let Some(family) = desc.family() {
            for (name, font) in &self.families {
                if name == family {
                    return Some(font.clone());
                }
            }
        }
        Some(self.default.clone())
    }

    fn load_font_for_char(
        &self,
        ch: char,
        desc: &FontDescription,
        language: Option<Language>,
    ) -> Option<FontRef> {
        let primary = self.load_font(desc, language)?;
        if primary.has_char(ch) {
            return Some(primary);
        }
        if let Some(fallback) = &self.fallback {
            if fallback.has_char(ch) {
                return Some(fallback.clone());
            }
        }
        Some(primary)
    }
}
