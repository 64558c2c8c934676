// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context for layout.

use crate::font::{FontDescription, FontMapRef, FontRef, Language};

/// The direction of a run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Strong left-to-right.
    Ltr,
    /// Strong right-to-left.
    Rtl,
    /// Left-to-right unless the content says otherwise.
    WeakLtr,
    /// Right-to-left unless the content says otherwise.
    WeakRtl,
    /// Determined entirely from content.
    #[default]
    Neutral,
}

impl Direction {
    /// Whether this is one of the two strong directions.
    pub fn is_strong(self) -> bool {
        matches!(self, Self::Ltr | Self::Rtl)
    }
}

/// Glyph orientation, named for the side of the glyph the baseline sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gravity {
    /// Upright glyphs, horizontal text.
    #[default]
    South,
    /// Rotated clockwise, for vertical text.
    East,
    /// Upside down.
    North,
    /// Rotated counter-clockwise, for vertical text.
    West,
    /// Resolved from the script of each item.
    Auto,
}

impl Gravity {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::East | Self::West)
    }

    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::South => "south",
            Self::East => "east",
            Self::North => "north",
            Self::West => "west",
            Self::Auto => "auto",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "north" => Some(Self::North),
            "west" => Some(Self::West),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::East,
            2 => Self::North,
            3 => Self::West,
            4 => Self::Auto,
            _ => Self::South,
        }
    }
}

/// How strongly a gravity request overrides the script's natural orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GravityHint {
    #[default]
    Natural,
    Strong,
    Line,
}

impl GravityHint {
    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Strong => "strong",
            Self::Line => "line",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "natural" => Some(Self::Natural),
            "strong" => Some(Self::Strong),
            "line" => Some(Self::Line),
            _ => None,
        }
    }

    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Strong,
            2 => Self::Line,
            _ => Self::Natural,
        }
    }
}

/// Global parameters for itemization, shaping and line breaking.
///
/// A context carries the font map, the defaults that apply where no attribute
/// overrides them, and device-level settings such as the display scale and
/// glyph position rounding.
#[derive(Clone, Debug)]
pub struct LayoutContext {
    font_map: FontMapRef,
    base_dir: Direction,
    gravity: Gravity,
    gravity_hint: GravityHint,
    language: Option<Language>,
    font_desc: FontDescription,
    scale: f32,
    round_glyph_positions: bool,
    decimal_point: char,
}

impl LayoutContext {
    pub fn new(font_map: FontMapRef) -> Self {
        let mut font_desc = FontDescription::new();
        font_desc.set_family("sans-serif");
        font_desc.set_size(12.0);
        Self {
            font_map,
            base_dir: Direction::Neutral,
            gravity: Gravity::South,
            gravity_hint: GravityHint::Natural,
            language: None,
            font_desc,
            scale: 1.0,
            round_glyph_positions: false,
            decimal_point: '.',
        }
    }

    pub fn font_map(&self) -> &FontMapRef {
        &self.font_map
    }

    pub fn base_dir(&self) -> Direction {
        self.base_dir
    }

    pub fn set_base_dir(&mut self, dir: Direction) {
        self.base_dir = dir;
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Gravity) {
        self.gravity = gravity;
    }

    pub fn gravity_hint(&self) -> GravityHint {
        self.gravity_hint
    }

    pub fn set_gravity_hint(&mut self, hint: GravityHint) {
        self.gravity_hint = hint;
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn set_language(&mut self, language: Option<Language>) {
        self.language = language;
    }

    /// The default font description, merged under any font attributes.
    pub fn font_description(&self) -> &FontDescription {
        &self.font_desc
    }

    pub fn set_font_description(&mut self, desc: FontDescription) {
        self.font_desc = desc;
    }

    /// Layout units per device pixel; used to convert pixel-flagged tab
    /// positions.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Whether shaped advances and offsets are rounded to device units.
    pub fn round_glyph_positions(&self) -> bool {
        self.round_glyph_positions
    }

    pub fn set_round_glyph_positions(&mut self, round: bool) {
        self.round_glyph_positions = round;
    }

    /// The decimal point used by decimal tab stops that don't set their own.
    pub fn decimal_point(&self) -> char {
        self.decimal_point
    }

    pub fn set_decimal_point(&mut self, decimal_point: char) {
        self.decimal_point = decimal_point;
    }

    pub(crate) fn load_font(
        &self,
        desc: &FontDescription,
        language: Option<Language>,
    ) -> Option<FontRef> {
        self.font_map
            .load_font(desc, language.or(self.language))
    }
}
