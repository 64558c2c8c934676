// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug serialization for attribute lists.
//!
//! One attribute per line: `START END NICK VALUE`. Strings and font
//! descriptions are double-quoted, enumerated integers are written as their
//! nicks where known, and the "to end" sentinel is written as `-1`. The
//! format is intended for tests and debugging and is not stable across
//! versions.

use core::fmt;
use core::str::FromStr;

use crate::font::{FontDescription, FontStretch, FontStyle, FontVariant, FontWeight, Language};

use super::list::AttrList;
use super::types::{
    AttrType, AttrValue, AttrValueKind, Attribute, BaselineShift, FontScale, LineStyle,
    TextTransform, ATTR_INDEX_TO_TEXT_END,
};
use crate::context::{Gravity, GravityHint};

/// Why parsing an attribute list failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// A line did not have the `START END NICK VALUE` shape.
    MissingField,
    /// A start or end index did not parse.
    InvalidIndex,
    /// The type nick is not a built-in and is not registered.
    UnknownNick,
    /// The value did not parse for the type's value kind.
    InvalidValue,
    /// The type's value kind cannot be represented in this format.
    UnsupportedValue,
}

/// Error produced by [`AttrList::from_str`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    /// 1-based line of the offending record.
    line: usize,
}

impl ParseError {
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }

    fn new(kind: ParseErrorKind, line: usize) -> Self {
        Self { kind, line }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ParseErrorKind::MissingField => "missing field",
            ParseErrorKind::InvalidIndex => "invalid index",
            ParseErrorKind::UnknownNick => "unknown attribute nick",
            ParseErrorKind::InvalidValue => "invalid value",
            ParseErrorKind::UnsupportedValue => "unsupported value kind",
        };
        write!(f, "{what} on line {}", self.line)
    }
}

impl core::error::Error for ParseError {}

fn quote(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn unquote(s: &str) -> Option<String> {
    let mut chars = s.trim().chars();
    if chars.next() != Some('"') {
        return None;
    }
    let mut out = String::new();
    let mut escaped = false;
    for c in chars {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some(out);
        } else {
            out.push(c);
        }
    }
    None
}

fn int_value_string(ty: AttrType, value: i32) -> String {
    let nick = match ty {
        AttrType::STYLE => Some(FontStyle::from_raw(value).nick()),
        AttrType::VARIANT => Some(FontVariant::from_raw(value).nick()),
        AttrType::STRETCH => Some(FontStretch::from_raw(value).nick()),
        AttrType::WEIGHT => FontWeight(value.clamp(0, 1000) as u16).nick(),
        AttrType::UNDERLINE | AttrType::OVERLINE => Some(LineStyle::from_raw(value).nick()),
        AttrType::TEXT_TRANSFORM => Some(TextTransform::from_raw(value).nick()),
        AttrType::FONT_SCALE => Some(FontScale::from_raw(value).nick()),
        AttrType::BASELINE_SHIFT => BaselineShift::from_raw(value).nick(),
        AttrType::GRAVITY => Some(Gravity::from_raw(value).nick()),
        AttrType::GRAVITY_HINT => Some(GravityHint::from_raw(value).nick()),
        _ => None,
    };
    match nick {
        Some(nick) => nick.to_owned(),
        None => value.to_string(),
    }
}

fn parse_int_value(ty: AttrType, raw: &str) -> Option<i32> {
    let by_nick = match ty {
        AttrType::STYLE => FontStyle::from_nick(raw).map(|v| v as i32),
        AttrType::VARIANT => FontVariant::from_nick(raw).map(|v| v as i32),
        AttrType::STRETCH => FontStretch::from_nick(raw).map(|v| v as i32),
        AttrType::WEIGHT => FontWeight::from_nick(raw).map(|v| i32::from(v.0)),
        AttrType::UNDERLINE | AttrType::OVERLINE => {
            LineStyle::from_nick(raw).map(LineStyle::to_raw)
        }
        AttrType::TEXT_TRANSFORM => TextTransform::from_nick(raw).map(TextTransform::to_raw),
        AttrType::FONT_SCALE => FontScale::from_nick(raw).map(FontScale::to_raw),
        AttrType::BASELINE_SHIFT => BaselineShift::from_nick(raw).map(BaselineShift::to_raw),
        AttrType::GRAVITY => Gravity::from_nick(raw).map(|v| v as i32),
        AttrType::GRAVITY_HINT => GravityHint::from_nick(raw).map(|v| v as i32),
        _ => None,
    };
    by_nick.or_else(|| raw.parse::<i32>().ok())
}

fn value_string(attr: &Attribute) -> Option<String> {
    let mut out = String::new();
    match &attr.value {
        AttrValue::Int(v) => out.push_str(&int_value_string(attr.ty, *v)),
        AttrValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        AttrValue::Float(v) => out.push_str(&v.to_string()),
        AttrValue::Color(v) => out.push_str(&v.to_string()),
        AttrValue::Language(v) => out.push_str(v.as_str()),
        AttrValue::String(v) => quote(v, &mut out),
        AttrValue::FontDesc(v) => quote(&v.to_string(), &mut out),
        AttrValue::Custom(v) => out.push_str(&v.serialize()?),
    }
    Some(out)
}

impl fmt::Display for AttrList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attr in self.attributes() {
            let Some(value) = value_string(attr) else {
                // Custom values without a textual form are skipped.
                continue;
            };
            let Some(nick) = attr.ty.nick() else {
                continue;
            };
            write!(f, "{} ", attr.start)?;
            if attr.end == ATTR_INDEX_TO_TEXT_END {
                write!(f, "-1")?;
            } else {
                write!(f, "{}", attr.end)?;
            }
            writeln!(f, " {nick} {value}")?;
        }
        Ok(())
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    if raw == "-1" {
        return Some(ATTR_INDEX_TO_TEXT_END);
    }
    raw.parse::<usize>().ok()
}

impl FromStr for AttrList {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut list = Self::new();
        for (line_index, line) in s.lines().enumerate() {
            let line_no = line_index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.splitn(4, char::is_whitespace);
            let (Some(start), Some(end), Some(nick)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(ParseError::new(ParseErrorKind::MissingField, line_no));
            };
            let raw_value = fields.next().unwrap_or("").trim();
            if raw_value.is_empty() {
                return Err(ParseError::new(ParseErrorKind::MissingField, line_no));
            }

            let start = parse_index(start)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidIndex, line_no))?;
            let end = parse_index(end)
                .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidIndex, line_no))?;
            let ty = AttrType::from_nick(nick)
                .ok_or_else(|| ParseError::new(ParseErrorKind::UnknownNick, line_no))?;
            let kind = ty
                .value_kind()
                .ok_or_else(|| ParseError::new(ParseErrorKind::UnknownNick, line_no))?;

            let invalid = || ParseError::new(ParseErrorKind::InvalidValue, line_no);
            let value = match kind {
                AttrValueKind::Int => {
                    AttrValue::Int(parse_int_value(ty, raw_value).ok_or_else(invalid)?)
                }
                AttrValueKind::Boolean => match raw_value {
                    "true" => AttrValue::Boolean(true),
                    "false" => AttrValue::Boolean(false),
                    _ => return Err(invalid()),
                },
                AttrValueKind::Float => {
                    AttrValue::Float(raw_value.parse::<f64>().map_err(|_| invalid())?)
                }
                AttrValueKind::Color => {
                    AttrValue::Color(crate::attrs::Color::parse(raw_value).ok_or_else(invalid)?)
                }
                AttrValueKind::Language => {
                    AttrValue::Language(Language::from_string(raw_value).ok_or_else(invalid)?)
                }
                AttrValueKind::String => AttrValue::String(unquote(raw_value).ok_or_else(invalid)?),
                AttrValueKind::FontDesc => {
                    let quoted = unquote(raw_value).ok_or_else(invalid)?;
                    AttrValue::FontDesc(
                        FontDescription::from_str(&quoted).map_err(|()| invalid())?,
                    )
                }
                AttrValueKind::Custom => {
                    return Err(ParseError::new(ParseErrorKind::UnsupportedValue, line_no));
                }
            };

            list.insert(Attribute::new(ty, value).with_range(start, end));
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::types::Color;

    #[test]
    fn round_trips_common_attributes() {
        let mut list = AttrList::new();
        list.insert(Attribute::foreground(Color::new(0xffff, 0, 0)).with_range(0, 5));
        list.insert(Attribute::weight(FontWeight::BOLD).with_range(3, 8));
        list.insert(Attribute::family("DejaVu Sans").with_range(2, 9));
        list.insert(Attribute::letter_spacing(2.5));
        list.insert(Attribute::text_transform(TextTransform::Uppercase).with_range(1, 2));

        let text = list.to_string();
        let parsed: AttrList = text.parse().unwrap();
        assert!(list.equal(&parsed));
    }

    #[test]
    fn writes_nicks_for_enumerated_ints() {
        let mut list = AttrList::new();
        list.insert(Attribute::weight(FontWeight::BOLD).with_range(0, 4));
        assert_eq!(list.to_string(), "0 4 weight bold\n");
    }

    #[test]
    fn sentinel_end_round_trips() {
        let mut list = AttrList::new();
        list.insert(Attribute::strikethrough(true));
        let text = list.to_string();
        assert_eq!(text, "0 -1 strikethrough true\n");
        let parsed: AttrList = text.parse().unwrap();
        assert_eq!(parsed.attributes()[0].end(), ATTR_INDEX_TO_TEXT_END);
    }

    #[test]
    fn unknown_nick_fails_whole_parse() {
        let err = "0 4 not-an-attr true".parse::<AttrList>().unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::UnknownNick);
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn quoted_strings_escape() {
        let mut list = AttrList::new();
        list.insert(Attribute::family("Weird \"Font\"").with_range(0, 2));
        let text = list.to_string();
        let parsed: AttrList = text.parse().unwrap();
        assert!(list.equal(&parsed));
    }
}
