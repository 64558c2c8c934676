// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute types and values.

use core::fmt;
use std::sync::Arc;

use crate::context::{Gravity, GravityHint};
use crate::font::{FontDescription, FontStretch, FontStyle, FontVariant, FontWeight, Language};

use super::registry;

/// Start index denoting "from the beginning of the text".
pub const ATTR_INDEX_FROM_TEXT_BEGINNING: usize = 0;

/// End index denoting "to the end of the text".
pub const ATTR_INDEX_TO_TEXT_END: usize = usize::MAX;

bitflags::bitflags! {
    /// The layout stages an attribute type participates in.
    ///
    /// The line breaker filters a blob's attribute list by these classes:
    /// itemization attributes feed the itemizer, break/shape attributes are
    /// applied to items as extras, and the rest are reapplied to runs after a
    /// line is formed.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrAffects: u8 {
        const ITEMIZATION = 1 << 0;
        const BREAKING = 1 << 1;
        const SHAPING = 1 << 2;
        const RENDERING = 1 << 3;
    }
}

/// How multiple attributes of one type combine when collecting extras.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttrMerge {
    /// The attribute starting closest to the position suppresses the others.
    #[default]
    Overrides,
    /// All values are kept.
    Accumulates,
}

/// The kind of value carried by an attribute type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrValueKind {
    Int,
    Boolean,
    Float,
    Color,
    Language,
    FontDesc,
    String,
    Custom,
}

/// Identifies an attribute type.
///
/// Built-in types are associated constants; new types are allocated with
/// [`AttrType::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrType(pub(crate) u32);

struct BuiltinInfo {
    ty: AttrType,
    nick: &'static str,
    kind: AttrValueKind,
    affects: u8,
    merge: AttrMerge,
}

macro_rules! builtin {
    ($ty:expr, $nick:literal, $kind:ident, $affects:expr) => {
        builtin!($ty, $nick, $kind, $affects, AttrMerge::Overrides)
    };
    ($ty:expr, $nick:literal, $kind:ident, $affects:expr, $merge:expr) => {
        BuiltinInfo {
            ty: $ty,
            nick: $nick,
            kind: AttrValueKind::$kind,
            affects: $affects,
            merge: $merge,
        }
    };
}

const ITEMIZE: u8 = AttrAffects::ITEMIZATION.bits();
const BREAK: u8 = AttrAffects::BREAKING.bits();
const SHAPE: u8 = AttrAffects::SHAPING.bits();
const RENDER: u8 = AttrAffects::RENDERING.bits();

#[rustfmt::skip]
static BUILTINS: &[BuiltinInfo] = &[
    builtin!(AttrType::LANGUAGE, "language", Language, ITEMIZE),
    builtin!(AttrType::FAMILY, "family", String, ITEMIZE),
    builtin!(AttrType::STYLE, "style", Int, ITEMIZE),
    builtin!(AttrType::WEIGHT, "weight", Int, ITEMIZE),
    builtin!(AttrType::VARIANT, "variant", Int, ITEMIZE),
    builtin!(AttrType::STRETCH, "stretch", Int, ITEMIZE),
    builtin!(AttrType::SIZE, "size", Float, ITEMIZE),
    builtin!(AttrType::FONT_DESC, "font-desc", FontDesc, ITEMIZE),
    builtin!(AttrType::FOREGROUND, "foreground", Color, RENDER),
    builtin!(AttrType::BACKGROUND, "background", Color, RENDER),
    builtin!(AttrType::UNDERLINE, "underline", Int, RENDER),
    builtin!(AttrType::STRIKETHROUGH, "strikethrough", Boolean, RENDER),
    builtin!(AttrType::RISE, "rise", Float, SHAPE | RENDER),
    builtin!(AttrType::SCALE, "scale", Float, ITEMIZE),
    builtin!(AttrType::FALLBACK, "fallback", Boolean, ITEMIZE),
    builtin!(AttrType::LETTER_SPACING, "letter-spacing", Float, SHAPE),
    builtin!(AttrType::UNDERLINE_COLOR, "underline-color", Color, RENDER),
    builtin!(AttrType::STRIKETHROUGH_COLOR, "strikethrough-color", Color, RENDER),
    builtin!(AttrType::ABSOLUTE_SIZE, "absolute-size", Float, ITEMIZE),
    builtin!(AttrType::GRAVITY, "gravity", Int, ITEMIZE),
    builtin!(AttrType::GRAVITY_HINT, "gravity-hint", Int, ITEMIZE),
    builtin!(AttrType::FONT_FEATURES, "font-features", String, SHAPE, AttrMerge::Accumulates),
    builtin!(AttrType::ALLOW_BREAKS, "allow-breaks", Boolean, BREAK),
    builtin!(AttrType::SHOW, "show", Int, SHAPE),
    builtin!(AttrType::INSERT_HYPHENS, "insert-hyphens", Boolean, BREAK),
    builtin!(AttrType::OVERLINE, "overline", Int, RENDER),
    builtin!(AttrType::OVERLINE_COLOR, "overline-color", Color, RENDER),
    builtin!(AttrType::TEXT_TRANSFORM, "text-transform", Int, SHAPE),
    builtin!(AttrType::WORD, "word", Boolean, BREAK),
    builtin!(AttrType::SENTENCE, "sentence", Boolean, BREAK),
    builtin!(AttrType::BASELINE_SHIFT, "baseline-shift", Int, SHAPE | RENDER),
    builtin!(AttrType::FONT_SCALE, "font-scale", Int, ITEMIZE),
];

impl AttrType {
    pub const LANGUAGE: Self = Self(1);
    pub const FAMILY: Self = Self(2);
    pub const STYLE: Self = Self(3);
    pub const WEIGHT: Self = Self(4);
    pub const VARIANT: Self = Self(5);
    pub const STRETCH: Self = Self(6);
    pub const SIZE: Self = Self(7);
    pub const FONT_DESC: Self = Self(8);
    pub const FOREGROUND: Self = Self(9);
    pub const BACKGROUND: Self = Self(10);
    pub const UNDERLINE: Self = Self(11);
    pub const STRIKETHROUGH: Self = Self(12);
    pub const RISE: Self = Self(13);
    pub const SCALE: Self = Self(14);
    pub const FALLBACK: Self = Self(15);
    pub const LETTER_SPACING: Self = Self(16);
    pub const UNDERLINE_COLOR: Self = Self(17);
    pub const STRIKETHROUGH_COLOR: Self = Self(18);
    pub const ABSOLUTE_SIZE: Self = Self(19);
    pub const GRAVITY: Self = Self(20);
    pub const GRAVITY_HINT: Self = Self(21);
    pub const FONT_FEATURES: Self = Self(22);
    pub const ALLOW_BREAKS: Self = Self(23);
    pub const SHOW: Self = Self(24);
    pub const INSERT_HYPHENS: Self = Self(25);
    pub const OVERLINE: Self = Self(26);
    pub const OVERLINE_COLOR: Self = Self(27);
    pub const TEXT_TRANSFORM: Self = Self(28);
    pub const WORD: Self = Self(29);
    pub const SENTENCE: Self = Self(30);
    pub const BASELINE_SHIFT: Self = Self(31);
    pub const FONT_SCALE: Self = Self(32);

    fn builtin_info(self) -> Option<&'static BuiltinInfo> {
        BUILTINS.iter().find(|info| info.ty == self)
    }

    /// Registers a new attribute type. Registration is monotonic: types are
    /// never unregistered.
    pub fn register(
        nick: &str,
        kind: AttrValueKind,
        affects: AttrAffects,
        merge: AttrMerge,
    ) -> Self {
        registry::register(nick, kind, affects, merge)
    }

    /// The value kind for this type, or `None` for an unknown custom id.
    pub fn value_kind(self) -> Option<AttrValueKind> {
        if let Some(info) = self.builtin_info() {
            return Some(info.kind);
        }
        registry::lookup(self).map(|record| record.kind)
    }

    pub fn affects(self) -> AttrAffects {
        if let Some(info) = self.builtin_info() {
            return AttrAffects::from_bits_truncate(info.affects);
        }
        registry::lookup(self)
            .map(|record| record.affects)
            .unwrap_or(AttrAffects::empty())
    }

    pub fn merge(self) -> AttrMerge {
        if let Some(info) = self.builtin_info() {
            return info.merge;
        }
        registry::lookup(self)
            .map(|record| record.merge)
            .unwrap_or_default()
    }

    /// The serialization nick for this type.
    pub fn nick(self) -> Option<String> {
        if let Some(info) = self.builtin_info() {
            return Some(info.nick.to_owned());
        }
        registry::lookup(self).map(|record| record.nick)
    }

    /// Resolves a nick back to a type, searching built-ins then the registry.
    pub fn from_nick(nick: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|info| info.nick == nick)
            .map(|info| info.ty)
            .or_else(|| registry::find_by_nick(nick))
    }
}

/// A color with 16 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

impl Color {
    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 0xffff,
        }
    }

    pub const fn with_alpha(mut self, alpha: u16) -> Self {
        self.alpha = alpha;
        self
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrrrggggbbbb` and the same forms with an
    /// alpha component appended.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let (digits, has_alpha) = match hex.len() {
            3 | 6 | 12 => (hex.len() / 3, false),
            4 | 8 | 16 => (hex.len() / 4, true),
            _ => return None,
        };
        let channel = |index: usize| -> u16 {
            let raw = &hex[index * digits..(index + 1) * digits];
            let value = u16::from_str_radix(raw, 16).unwrap_or(0);
            // Replicate short forms across the full 16-bit range.
            match digits {
                1 => value * 0x1111,
                2 => value * 0x101,
                _ => value,
            }
        };
        let mut color = Self::new(channel(0), channel(1), channel(2));
        if has_alpha {
            color.alpha = channel(3);
        }
        Some(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha == 0xffff {
            write!(f, "#{:04x}{:04x}{:04x}", self.red, self.green, self.blue)
        } else {
            write!(
                f,
                "#{:04x}{:04x}{:04x}{:04x}",
                self.red, self.green, self.blue, self.alpha
            )
        }
    }
}

/// Style of an underline or overline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    None,
    Single,
    Double,
    /// Below the font's descent, e.g. for preedit text.
    Low,
    /// A wavy error indication.
    Error,
}

impl LineStyle {
    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Single,
            2 => Self::Double,
            3 => Self::Low,
            4 => Self::Error,
            _ => Self::None,
        }
    }

    pub(crate) fn to_raw(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Double => 2,
            Self::Low => 3,
            Self::Error => 4,
        }
    }

    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::Double => "double",
            Self::Low => "low",
            Self::Error => "error",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "none" => Some(Self::None),
            "single" => Some(Self::Single),
            "double" => Some(Self::Double),
            "low" => Some(Self::Low),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Case transformation applied during shaping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextTransform {
    #[default]
    None,
    Lowercase,
    Uppercase,
    /// Uppercase the first character of every word.
    Capitalize,
}

impl TextTransform {
    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Lowercase,
            2 => Self::Uppercase,
            3 => Self::Capitalize,
            _ => Self::None,
        }
    }

    pub(crate) fn to_raw(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Lowercase => 1,
            Self::Uppercase => 2,
            Self::Capitalize => 3,
        }
    }

    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
            Self::Capitalize => "capitalize",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "none" => Some(Self::None),
            "lowercase" => Some(Self::Lowercase),
            "uppercase" => Some(Self::Uppercase),
            "capitalize" => Some(Self::Capitalize),
            _ => None,
        }
    }
}

/// A baseline displacement for a range of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BaselineShift {
    Superscript,
    Subscript,
    /// An explicit shift in layout units; positive raises the text.
    Shift(f32),
}

impl BaselineShift {
    // Raw encoding: 1/2 are the named shifts, anything of greater magnitude
    // than ENUM_LIMIT is an explicit shift in units.
    const ENUM_LIMIT: i32 = 1024;

    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Superscript,
            2 => Self::Subscript,
            units => Self::Shift(units as f32),
        }
    }

    pub(crate) fn to_raw(self) -> i32 {
        match self {
            Self::Superscript => 1,
            Self::Subscript => 2,
            Self::Shift(units) => {
                let raw = units as i32;
                if raw.abs() <= Self::ENUM_LIMIT {
                    // Small explicit shifts round away from the enum range.
                    if raw < 0 {
                        -Self::ENUM_LIMIT - 1
                    } else {
                        Self::ENUM_LIMIT + 1
                    }
                } else {
                    raw
                }
            }
        }
    }

    pub(crate) fn nick(self) -> Option<&'static str> {
        match self {
            Self::Superscript => Some("superscript"),
            Self::Subscript => Some("subscript"),
            Self::Shift(_) => None,
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "superscript" => Some(Self::Superscript),
            "subscript" => Some(Self::Subscript),
            _ => None,
        }
    }
}

/// Font size adjustment accompanying a baseline shift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontScale {
    #[default]
    None,
    Superscript,
    Subscript,
    SmallCaps,
}

impl FontScale {
    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Superscript,
            2 => Self::Subscript,
            3 => Self::SmallCaps,
            _ => Self::None,
        }
    }

    pub(crate) fn to_raw(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Superscript => 1,
            Self::Subscript => 2,
            Self::SmallCaps => 3,
        }
    }

    pub(crate) fn nick(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
            Self::SmallCaps => "small-caps",
        }
    }

    pub(crate) fn from_nick(nick: &str) -> Option<Self> {
        match nick {
            "none" => Some(Self::None),
            "superscript" => Some(Self::Superscript),
            "subscript" => Some(Self::Subscript),
            "small-caps" => Some(Self::SmallCaps),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Which invisible characters are rendered visibly.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ShowFlags: u32 {
        const SPACES = 1 << 0;
        const LINE_BREAKS = 1 << 1;
        const IGNORABLES = 1 << 2;
    }
}

/// A user-defined attribute value.
///
/// The trait plays the role of the copy/destroy/equal/serialize callback
/// vtable: cloning and dropping are handled by the shared handle, equality
/// goes through [`CustomValue::equals`], and [`CustomValue::serialize`] feeds
/// the debug text format.
pub trait CustomValue: fmt::Debug + Send + Sync + 'static {
    fn equals(&self, other: &dyn CustomValue) -> bool;

    fn as_any(&self) -> &dyn core::any::Any;

    /// A textual form for the debug serialization format, if any.
    fn serialize(&self) -> Option<String> {
        None
    }
}

/// The value carried by an attribute.
#[derive(Clone, Debug)]
pub enum AttrValue {
    Int(i32),
    Boolean(bool),
    Float(f64),
    Color(Color),
    Language(Language),
    FontDesc(FontDescription),
    String(String),
    Custom(Arc<dyn CustomValue>),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Color(a), Self::Color(b)) => a == b,
            (Self::Language(a), Self::Language(b)) => a == b,
            (Self::FontDesc(a), Self::FontDesc(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.equals(b.as_ref()),
            _ => false,
        }
    }
}

/// A value applied to a range of text.
///
/// Freshly constructed attributes cover the whole text; use
/// [`with_range`](Attribute::with_range) to restrict them.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub(crate) ty: AttrType,
    pub(crate) value: AttrValue,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Attribute {
    pub fn new(ty: AttrType, value: AttrValue) -> Self {
        Self {
            ty,
            value,
            start: ATTR_INDEX_FROM_TEXT_BEGINNING,
            end: ATTR_INDEX_TO_TEXT_END,
        }
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn attr_type(&self) -> AttrType {
        self.ty
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Whether `other` carries the same type and value, regardless of range.
    pub fn equal_value(&self, other: &Self) -> bool {
        self.ty == other.ty && self.value == other.value
    }

    pub(crate) fn int_value(&self) -> i32 {
        match &self.value {
            AttrValue::Int(v) => *v,
            _ => 0,
        }
    }

    pub(crate) fn float_value(&self) -> f64 {
        match &self.value {
            AttrValue::Float(v) => *v,
            _ => 0.0,
        }
    }

    pub(crate) fn bool_value(&self) -> bool {
        matches!(&self.value, AttrValue::Boolean(true))
    }

    // Constructors for the built-in types.

    pub fn language(language: Language) -> Self {
        Self::new(AttrType::LANGUAGE, AttrValue::Language(language))
    }

    pub fn family(family: &str) -> Self {
        Self::new(AttrType::FAMILY, AttrValue::String(family.to_owned()))
    }

    pub fn style(style: FontStyle) -> Self {
        Self::new(AttrType::STYLE, AttrValue::Int(style as i32))
    }

    pub fn weight(weight: FontWeight) -> Self {
        Self::new(AttrType::WEIGHT, AttrValue::Int(i32::from(weight.0)))
    }

    pub fn variant(variant: FontVariant) -> Self {
        Self::new(AttrType::VARIANT, AttrValue::Int(variant as i32))
    }

    pub fn stretch(stretch: FontStretch) -> Self {
        Self::new(AttrType::STRETCH, AttrValue::Int(stretch as i32))
    }

    /// Font size in points.
    pub fn size(size: f32) -> Self {
        Self::new(AttrType::SIZE, AttrValue::Float(f64::from(size)))
    }

    /// Font size in device units.
    pub fn absolute_size(size: f32) -> Self {
        Self::new(AttrType::ABSOLUTE_SIZE, AttrValue::Float(f64::from(size)))
    }

    pub fn font_desc(desc: FontDescription) -> Self {
        Self::new(AttrType::FONT_DESC, AttrValue::FontDesc(desc))
    }

    pub fn foreground(color: Color) -> Self {
        Self::new(AttrType::FOREGROUND, AttrValue::Color(color))
    }

    pub fn background(color: Color) -> Self {
        Self::new(AttrType::BACKGROUND, AttrValue::Color(color))
    }

    pub fn underline(style: LineStyle) -> Self {
        Self::new(AttrType::UNDERLINE, AttrValue::Int(style.to_raw()))
    }

    pub fn underline_color(color: Color) -> Self {
        Self::new(AttrType::UNDERLINE_COLOR, AttrValue::Color(color))
    }

    pub fn overline(style: LineStyle) -> Self {
        Self::new(AttrType::OVERLINE, AttrValue::Int(style.to_raw()))
    }

    pub fn overline_color(color: Color) -> Self {
        Self::new(AttrType::OVERLINE_COLOR, AttrValue::Color(color))
    }

    pub fn strikethrough(strikethrough: bool) -> Self {
        Self::new(AttrType::STRIKETHROUGH, AttrValue::Boolean(strikethrough))
    }

    pub fn strikethrough_color(color: Color) -> Self {
        Self::new(AttrType::STRIKETHROUGH_COLOR, AttrValue::Color(color))
    }

    /// Vertical displacement in layout units; positive raises the text.
    pub fn rise(rise: f32) -> Self {
        Self::new(AttrType::RISE, AttrValue::Float(f64::from(rise)))
    }

    /// Font size multiplier applied after all other size computations.
    pub fn scale(scale: f64) -> Self {
        Self::new(AttrType::SCALE, AttrValue::Float(scale))
    }

    pub fn fallback(enable: bool) -> Self {
        Self::new(AttrType::FALLBACK, AttrValue::Boolean(enable))
    }

    /// Extra space after every grapheme, in layout units.
    pub fn letter_spacing(spacing: f32) -> Self {
        Self::new(AttrType::LETTER_SPACING, AttrValue::Float(f64::from(spacing)))
    }

    pub fn gravity(gravity: Gravity) -> Self {
        Self::new(AttrType::GRAVITY, AttrValue::Int(gravity as i32))
    }

    pub fn gravity_hint(hint: GravityHint) -> Self {
        Self::new(AttrType::GRAVITY_HINT, AttrValue::Int(hint as i32))
    }

    /// OpenType features as a CSS-style feature string.
    pub fn font_features(features: &str) -> Self {
        Self::new(AttrType::FONT_FEATURES, AttrValue::String(features.to_owned()))
    }

    pub fn allow_breaks(allow: bool) -> Self {
        Self::new(AttrType::ALLOW_BREAKS, AttrValue::Boolean(allow))
    }

    pub fn show(flags: ShowFlags) -> Self {
        Self::new(AttrType::SHOW, AttrValue::Int(flags.bits() as i32))
    }

    pub fn insert_hyphens(insert: bool) -> Self {
        Self::new(AttrType::INSERT_HYPHENS, AttrValue::Boolean(insert))
    }

    pub fn text_transform(transform: TextTransform) -> Self {
        Self::new(AttrType::TEXT_TRANSFORM, AttrValue::Int(transform.to_raw()))
    }

    /// Marks the range as a single word for breaking purposes.
    pub fn word() -> Self {
        Self::new(AttrType::WORD, AttrValue::Boolean(true))
    }

    /// Marks the range as a single sentence for breaking purposes.
    pub fn sentence() -> Self {
        Self::new(AttrType::SENTENCE, AttrValue::Boolean(true))
    }

    pub fn baseline_shift(shift: BaselineShift) -> Self {
        Self::new(AttrType::BASELINE_SHIFT, AttrValue::Int(shift.to_raw()))
    }

    pub fn font_scale(scale: FontScale) -> Self {
        Self::new(AttrType::FONT_SCALE, AttrValue::Int(scale.to_raw()))
    }

    pub fn custom(ty: AttrType, value: Arc<dyn CustomValue>) -> Self {
        Self::new(ty, AttrValue::Custom(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parse_forms() {
        assert_eq!(Color::parse("#fff"), Some(Color::new(0xffff, 0xffff, 0xffff)));
        assert_eq!(
            Color::parse("#ff0000"),
            Some(Color::new(0xffff, 0, 0))
        );
        assert_eq!(
            Color::parse("#ffff00000000"),
            Some(Color::new(0xffff, 0, 0))
        );
        assert_eq!(
            Color::parse("#ff000080"),
            Some(Color::new(0xffff, 0, 0).with_alpha(0x8080))
        );
        assert_eq!(Color::parse("red"), None);
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn color_display_round_trips() {
        let opaque = Color::new(0x1234, 0x5678, 0x9abc);
        assert_eq!(Color::parse(&opaque.to_string()), Some(opaque));
        let translucent = opaque.with_alpha(0x0102);
        assert_eq!(Color::parse(&translucent.to_string()), Some(translucent));
    }

    #[test]
    fn baseline_shift_raw_round_trips() {
        assert_eq!(
            BaselineShift::from_raw(BaselineShift::Superscript.to_raw()),
            BaselineShift::Superscript
        );
        assert_eq!(
            BaselineShift::from_raw(BaselineShift::Shift(2000.0).to_raw()),
            BaselineShift::Shift(2000.0)
        );
        // Small explicit shifts survive as shifts, not as enum values.
        let small = BaselineShift::Shift(3.0).to_raw();
        assert!(matches!(BaselineShift::from_raw(small), BaselineShift::Shift(_)));
    }

    #[test]
    fn new_attribute_covers_whole_text() {
        let attr = Attribute::foreground(Color::new(0, 0, 0));
        assert_eq!(attr.start(), ATTR_INDEX_FROM_TEXT_BEGINNING);
        assert_eq!(attr.end(), ATTR_INDEX_TO_TEXT_END);
        let ranged = attr.with_range(3, 8);
        assert_eq!(ranged.range(), (3, 8));
    }

    #[test]
    fn builtin_metadata_lookup() {
        assert_eq!(AttrType::FOREGROUND.nick().as_deref(), Some("foreground"));
        assert_eq!(AttrType::from_nick("letter-spacing"), Some(AttrType::LETTER_SPACING));
        assert!(AttrType::WEIGHT.affects().contains(AttrAffects::ITEMIZATION));
        assert_eq!(AttrType::SHOW.value_kind(), Some(AttrValueKind::Int));
        assert_eq!(AttrType::from_nick("no-such-nick"), None);
    }
}
