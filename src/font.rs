// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font collaborator interface.
//!
//! Lineflow does not load fonts or rasterize glyphs. The font backend is
//! supplied by the embedder through the [`Font`] and [`FontMap`] traits;
//! everything the layout core needs from it is glyph coverage, metrics and
//! shaping.

use core::fmt;
use core::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};

use hashbrown::HashSet;

use crate::glyph::{Glyph, GlyphString};
use crate::item::Analysis;
use crate::shape::ShapeFlags;

/// An interned language tag (BCP 47 style, e.g. `en-us`).
///
/// Tags are canonicalized to lowercase with `-` separators and interned for
/// the lifetime of the process, so `Language` is `Copy` and comparison is a
/// pointer comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language(&'static str);

fn language_registry() -> &'static Mutex<HashSet<&'static str>> {
    static REGISTRY: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashSet::new()))
}

impl Language {
    /// Interns `tag` and returns the canonical language.
    ///
    /// Returns `None` for tags containing characters outside
    /// `[A-Za-z0-9-_]`.
    pub fn from_string(tag: &str) -> Option<Self> {
        if tag.is_empty()
            || !tag
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return None;
        }
        let canon: String = tag
            .chars()
            .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
            .collect();
        let mut registry = language_registry().lock().unwrap();
        if let Some(interned) = registry.get(canon.as_str()) {
            return Some(Self(interned));
        }
        let interned: &'static str = Box::leak(canon.into_boxed_str());
        registry.insert(interned);
        Some(Self(interned))
    }

    /// The canonical tag.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.0)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Slant of a font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Normal,
    Oblique,
    Italic,
}

impl FontStyle {
    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Oblique => "oblique",
            Self::Italic => "italic",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "normal" => Some(Self::Normal),
            "oblique" => Some(Self::Oblique),
            "italic" => Some(Self::Italic),
            _ => None,
        }
    }

    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Oblique,
            2 => Self::Italic,
            _ => Self::Normal,
        }
    }
}

/// Capitalization variant of a font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
}

impl FontVariant {
    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SmallCaps => "small-caps",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "normal" => Some(Self::Normal),
            "small-caps" => Some(Self::SmallCaps),
            _ => None,
        }
    }

    pub(crate) fn from_raw(raw: i32) -> Self {
        if raw == 1 {
            Self::SmallCaps
        } else {
            Self::Normal
        }
    }
}

/// Weight of a font, on the usual 100–1000 scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: Self = Self(100);
    pub const ULTRALIGHT: Self = Self(200);
    pub const LIGHT: Self = Self(300);
    pub const NORMAL: Self = Self(400);
    pub const MEDIUM: Self = Self(500);
    pub const SEMIBOLD: Self = Self(600);
    pub const BOLD: Self = Self(700);
    pub const ULTRABOLD: Self = Self(800);
    pub const HEAVY: Self = Self(900);

    pub(crate) fn nick(self) -> Option<&'static str> {
        match self {
            Self::THIN => Some("thin"),
            Self::ULTRALIGHT => Some("ultralight"),
            Self::LIGHT => Some("light"),
            Self::NORMAL => Some("normal"),
            Self::MEDIUM => Some("medium"),
            Self::SEMIBOLD => Some("semibold"),
            Self::BOLD => Some("bold"),
            Self::ULTRABOLD => Some("ultrabold"),
            Self::HEAVY => Some("heavy"),
            _ => None,
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "thin" => Some(Self::THIN),
            "ultralight" => Some(Self::ULTRALIGHT),
            "light" => Some(Self::LIGHT),
            "normal" => Some(Self::NORMAL),
            "medium" => Some(Self::MEDIUM),
            "semibold" => Some(Self::SEMIBOLD),
            "bold" => Some(Self::BOLD),
            "ultrabold" => Some(Self::ULTRABOLD),
            "heavy" => Some(Self::HEAVY),
            _ => nick.parse::<u16>().ok().map(Self),
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Width of a font relative to its normal design.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl FontStretch {
    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::UltraCondensed => "ultra-condensed",
            Self::ExtraCondensed => "extra-condensed",
            Self::Condensed => "condensed",
            Self::SemiCondensed => "semi-condensed",
            Self::Normal => "normal",
            Self::SemiExpanded => "semi-expanded",
            Self::Expanded => "expanded",
            Self::ExtraExpanded => "extra-expanded",
            Self::UltraExpanded => "ultra-expanded",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "ultra-condensed" => Some(Self::UltraCondensed),
            "extra-condensed" => Some(Self::ExtraCondensed),
            "condensed" => Some(Self::Condensed),
            "semi-condensed" => Some(Self::SemiCondensed),
            "normal" => Some(Self::Normal),
            "semi-expanded" => Some(Self::SemiExpanded),
            "expanded" => Some(Self::Expanded),
            "extra-expanded" => Some(Self::ExtraExpanded),
            "ultra-expanded" => Some(Self::UltraExpanded),
            _ => None,
        }
    }

    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::UltraCondensed,
            1 => Self::ExtraCondensed,
            2 => Self::Condensed,
            3 => Self::SemiCondensed,
            5 => Self::SemiExpanded,
            6 => Self::Expanded,
            7 => Self::ExtraExpanded,
            8 => Self::UltraExpanded,
            _ => Self::Normal,
        }
    }
}

bitflags::bitflags! {
    /// Which fields of a [`FontDescription`] have been set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct FontMask: u8 {
        const FAMILY = 1 << 0;
        const STYLE = 1 << 1;
        const VARIANT = 1 << 2;
        const WEIGHT = 1 << 3;
        const STRETCH = 1 << 4;
        const SIZE = 1 << 5;
    }
}

/// A description of a font to load, with per-field set masks so that
/// descriptions can be merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontDescription {
    family: Option<String>,
    style: FontStyle,
    variant: FontVariant,
    weight: FontWeight,
    stretch: FontStretch,
    size: f32,
    size_is_absolute: bool,
    mask: FontMask,
}

impl FontDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn set_family(&mut self, family: &str) {
        self.family = Some(family.to_owned());
        self.mask |= FontMask::FAMILY;
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn set_style(&mut self, style: FontStyle) {
        self.style = style;
        self.mask |= FontMask::STYLE;
    }

    pub fn variant(&self) -> FontVariant {
        self.variant
    }

    pub fn set_variant(&mut self, variant: FontVariant) {
        self.variant = variant;
        self.mask |= FontMask::VARIANT;
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn set_weight(&mut self, weight: FontWeight) {
        self.weight = weight;
        self.mask |= FontMask::WEIGHT;
    }

    pub fn stretch(&self) -> FontStretch {
        self.stretch
    }

    pub fn set_stretch(&mut self, stretch: FontStretch) {
        self.stretch = stretch;
        self.mask |= FontMask::STRETCH;
    }

    /// The size in points, or in device units if
    /// [`size_is_absolute`](Self::size_is_absolute).
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
        self.size_is_absolute = false;
        self.mask |= FontMask::SIZE;
    }

    pub fn set_absolute_size(&mut self, size: f32) {
        self.size = size;
        self.size_is_absolute = true;
        self.mask |= FontMask::SIZE;
    }

    pub fn size_is_absolute(&self) -> bool {
        self.size_is_absolute
    }

    /// The set of fields that have been explicitly set.
    pub fn set_fields(&self) -> FontMask {
        self.mask
    }

    pub fn unset_fields(&mut self, mask: FontMask) {
        if mask.contains(FontMask::FAMILY) {
            self.family = None;
        }
        self.mask &= !mask;
    }

    /// Merges `other` into `self`. Fields set in `other` are copied over when
    /// `replace_existing` is true or the field is unset in `self`.
    pub fn merge(&mut self, other: &Self, replace_existing: bool) {
        let new_mask = if replace_existing {
            other.mask
        } else {
            other.mask & !self.mask
        };
        if new_mask.contains(FontMask::FAMILY) {
            self.family = other.family.clone();
        }
        if new_mask.contains(FontMask::STYLE) {
            self.style = other.style;
        }
        if new_mask.contains(FontMask::VARIANT) {
            self.variant = other.variant;
        }
        if new_mask.contains(FontMask::WEIGHT) {
            self.weight = other.weight;
        }
        if new_mask.contains(FontMask::STRETCH) {
            self.stretch = other.stretch;
        }
        if new_mask.contains(FontMask::SIZE) {
            self.size = other.size;
            self.size_is_absolute = other.size_is_absolute;
        }
        self.mask |= new_mask;
    }
}

impl fmt::Display for FontDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(family) = &self.family {
            f.write_str(family)?;
            wrote = true;
        }
        let mut word = |f: &mut fmt::Formatter<'_>, s: &str| -> fmt::Result {
            if wrote {
                f.write_str(" ")?;
            }
            wrote = true;
            f.write_str(s)
        };
        if self.mask.contains(FontMask::STYLE) && self.style != FontStyle::Normal {
            word(f, self.style.nick())?;
        }
        if self.mask.contains(FontMask::VARIANT) && self.variant != FontVariant::Normal {
            word(f, self.variant.nick())?;
        }
        if self.mask.contains(FontMask::WEIGHT) && self.weight != FontWeight::NORMAL {
            match self.weight.nick() {
                Some(nick) => word(f, nick)?,
                None => word(f, &self.weight.0.to_string())?,
            }
        }
        if self.mask.contains(FontMask::STRETCH) && self.stretch != FontStretch::Normal {
            word(f, self.stretch.nick())?;
        }
        if self.mask.contains(FontMask::SIZE) {
            word(f, &format!("{}", self.size))?;
            if self.size_is_absolute {
                f.write_str("px")?;
            }
        }
        Ok(())
    }
}

impl FromStr for FontDescription {
    type Err = ();

    /// Parses the `Display` format: `[FAMILY] [STYLE-OPTIONS] [SIZE][px]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut desc = Self::new();
        let mut words: Vec<&str> = s.split_whitespace().collect();

        if let Some(last) = words.last() {
            let (num, absolute) = match last.strip_suffix("px") {
                Some(stripped) => (stripped, true),
                None => (*last, false),
            };
            if let Ok(size) = num.parse::<f32>() {
                if size >= 0.0 {
                    if absolute {
                        desc.set_absolute_size(size);
                    } else {
                        desc.set_size(size);
                    }
                    words.pop();
                }
            }
        }

        // Consume style keywords from the end; the rest is the family.
        while let Some(last) = words.last() {
            if let Some(style) = FontStyle::from_nick(last) {
                desc.set_style(style);
            } else if let Some(variant) = FontVariant::from_nick(last) {
                desc.set_variant(variant);
            } else if last
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && FontWeight::from_nick(last).is_some()
            {
                desc.set_weight(FontWeight::from_nick(last).unwrap());
            } else if let Some(stretch) = FontStretch::from_nick(last) {
                desc.set_stretch(stretch);
            } else {
                break;
            }
            words.pop();
        }

        if !words.is_empty() {
            desc.set_family(&words.join(" "));
        }
        Ok(desc)
    }
}

/// Logical metrics of a font, in layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub height: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub strikethrough_position: f32,
    pub strikethrough_thickness: f32,
    pub approximate_char_width: f32,
    pub approximate_digit_width: f32,
}

/// A rectangle in layout units. `y` grows downward from the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Ink and logical extents of a glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphExtents {
    pub ink: Rect,
    pub logical: Rect,
}

/// A loaded font supplied by the embedder.
///
/// `shape_text` fills `glyphs` with shaped output for `text` under
/// `analysis`; storage order must be left-to-right (visual for LTR items,
/// reversed-logical for RTL items). The adapter in [`crate::shape`] verifies
/// and repairs direction and substitutes a per-char fallback when a font
/// yields no glyphs.
pub trait Font: fmt::Debug + Send + Sync {
    /// A description identifying the loaded font, used for diagnostics and
    /// attribute iteration.
    fn description(&self) -> FontDescription;

    fn metrics(&self, language: Option<Language>) -> FontMetrics;

    fn glyph_extents(&self, glyph: Glyph) -> GlyphExtents;

    /// Looks up the glyph for a code point, if the font covers it.
    fn nominal_glyph(&self, ch: char) -> Option<Glyph>;

    fn has_char(&self, ch: char) -> bool {
        self.nominal_glyph(ch).is_some()
    }

    fn shape_text(&self, text: &str, analysis: &Analysis, flags: ShapeFlags, glyphs: &mut GlyphString);
}

/// A shared handle to a loaded font.
pub type FontRef = Arc<dyn Font>;

/// The font database supplied by the embedder.
pub trait FontMap: fmt::Debug + Send + Sync {
    /// Loads the best match for `desc`.
    fn load_font(&self, desc: &FontDescription, language: Option<Language>) -> Option<FontRef>;

    /// Loads a font covering `ch`, preferring a match for `desc`. Used for
    /// per-character fallback; the default asks for the plain match.
    fn load_font_for_char(
        &self,
        ch: char,
        desc: &FontDescription,
        language: Option<Language>,
    ) -> Option<FontRef> {
        let _ = ch;
        self.load_font(desc, language)
    }
}

/// A shared handle to a font map.
pub type FontMapRef = Arc<dyn FontMap>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_interning_is_canonical() {
        let a = Language::from_string("en_US").unwrap();
        let b = Language::from_string("en-us").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "en-us");
        assert!(Language::from_string("").is_none());
        assert!(Language::from_string("bad tag").is_none());
    }

    #[test]
    fn description_merge_respects_mask() {
        let mut base = FontDescription::new();
        base.set_family("Serif");
        base.set_size(12.0);
        let mut other = FontDescription::new();
        other.set_family("Sans");
        other.set_weight(FontWeight::BOLD);

        let mut merged = base.clone();
        merged.merge(&other, false);
        assert_eq!(merged.family(), Some("Serif"));
        assert_eq!(merged.weight(), FontWeight::BOLD);

        let mut replaced = base.clone();
        replaced.merge(&other, true);
        assert_eq!(replaced.family(), Some("Sans"));
        assert_eq!(replaced.size(), 12.0);
    }

    #[test]
    fn description_round_trips_through_string() {
        let mut desc = FontDescription::new();
        desc.set_family("DejaVu Sans");
        desc.set_style(FontStyle::Italic);
        desc.set_weight(FontWeight::BOLD);
        desc.set_size(12.5);
        let s = desc.to_string();
        assert_eq!(s, "DejaVu Sans italic bold 12.5");
        let parsed: FontDescription = s.parse().unwrap();
        assert_eq!(parsed.family(), Some("DejaVu Sans"));
        assert_eq!(parsed.style(), FontStyle::Italic);
        assert_eq!(parsed.weight(), FontWeight::BOLD);
        assert_eq!(parsed.size(), 12.5);
        assert!(!parsed.size_is_absolute());
    }
}
