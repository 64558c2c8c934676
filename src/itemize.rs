// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Itemization: splitting attributed text into runs of uniform analysis.

use std::sync::Arc;

use unicode_bidi::{BidiDataSource, BidiInfo, HardcodedBidiData, Level};
use unicode_script::{Script, UnicodeScript};

use crate::attrs::{AttrList, AttrType, Attribute};
use crate::context::{Direction, Gravity, LayoutContext};
use crate::font::{FontDescription, FontRef, Language};
use crate::item::{Analysis, AnalysisFlags, Item};

/// Resolves the paragraph embedding level for `text` under `base_dir`.
///
/// Strong directions force the level; weak and neutral directions scan for
/// the first strong character and fall back to the direction's bias.
pub(crate) fn resolve_base_level(text: &str, base_dir: Direction) -> u8 {
    match base_dir {
        Direction::Ltr => 0,
        Direction::Rtl => 1,
        Direction::WeakLtr | Direction::WeakRtl | Direction::Neutral => {
            use unicode_bidi::BidiClass;
            let data = HardcodedBidiData;
            for ch in text.chars() {
                match data.bidi_class(ch) {
                    BidiClass::L => return 0,
                    BidiClass::R | BidiClass::AL => return 1,
                    _ => {}
                }
            }
            match base_dir {
                Direction::WeakRtl => 1,
                _ => 0,
            }
        }
    }
}

/// Separator characters that always form single-character items so the line
/// breaker can dispatch on an item's first character.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CharKind {
    Normal,
    Tab,
    LineSeparator,
    ParagraphSeparator,
}

fn char_kind(ch: char) -> CharKind {
    match ch {
        '\t' => CharKind::Tab,
        '\u{2028}' => CharKind::LineSeparator,
        '\n' | '\r' | '\u{2029}' => CharKind::ParagraphSeparator,
        _ => CharKind::Normal,
    }
}

fn real_script(script: Script) -> bool {
    !matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

/// Characters that don't constrain font selection.
fn no_coverage_needed(ch: char) -> bool {
    ch.is_whitespace() || ch.is_control() || matches!(ch, '\u{200b}'..='\u{200f}' | '\u{2028}' | '\u{2029}' | '\u{00ad}')
}

struct Segment {
    end: usize,
    font: Option<FontRef>,
    language: Option<Language>,
    gravity: Gravity,
    fallback: bool,
    desc: FontDescription,
    extras: Vec<Attribute>,
}

fn compute_segment(
    context: &LayoutContext,
    iter: &crate::attrs::AttrIterator<'_>,
    text_end: usize,
) -> Segment {
    let (_, end) = iter.range();
    let mut desc = context.font_description().clone();
    let mut language = None;
    let mut extras = Vec::new();
    iter.get_font(&mut desc, &mut language, Some(&mut extras));

    let mut gravity = context.gravity();
    let mut fallback = true;
    for attr in &extras {
        match attr.attr_type() {
            AttrType::GRAVITY => gravity = Gravity::from_raw(attr.int_value()),
            AttrType::FALLBACK => fallback = attr.bool_value(),
            AttrType::FONT_SCALE => {
                let factor = match crate::attrs::FontScale::from_raw(attr.int_value()) {
                    crate::attrs::FontScale::None => 1.0,
                    crate::attrs::FontScale::Superscript
                    | crate::attrs::FontScale::Subscript => 0.6,
                    crate::attrs::FontScale::SmallCaps => 0.8,
                };
                if factor != 1.0 {
                    let size = desc.size() * factor;
                    if desc.size_is_absolute() {
                        desc.set_absolute_size(size);
                    } else {
                        desc.set_size(size);
                    }
                }
            }
            _ => {}
        }
    }
    if gravity == Gravity::Auto {
        gravity = Gravity::South;
    }

    let language = language.or(context.language());
    let font = context.font_map().load_font(&desc, language);

    Segment {
        end: end.min(text_end),
        font,
        language,
        gravity,
        fallback,
        desc,
        extras,
    }
}

fn same_font(a: &Option<FontRef>, b: &Option<FontRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Breaks `text[start_index..start_index + length]` into items of uniform
/// script, embedding level, language, font and itemization attributes.
///
/// `base_dir` of [`Direction::Neutral`] defers to the context's base
/// direction and then to the content. Items are returned in logical order.
pub fn itemize(
    context: &LayoutContext,
    base_dir: Direction,
    text: &str,
    start_index: usize,
    length: usize,
    attrs: Option<&AttrList>,
) -> Vec<Item> {
    let end_index = start_index + length;
    let para = &text[start_index..end_index];
    if para.is_empty() {
        return Vec::new();
    }

    let dir = if base_dir == Direction::Neutral {
        context.base_dir()
    } else {
        base_dir
    };
    let base_level = resolve_base_level(para, dir);
    let level_override = if base_level & 1 != 0 {
        Level::rtl()
    } else {
        Level::ltr()
    };
    let bidi = BidiInfo::new(para, Some(level_override));

    // Effective script per char: Common/Inherited/Unknown inherit the
    // preceding real script; leading ones take the first real script.
    let mut scripts: Vec<Script> = Vec::new();
    let mut current = Script::Common;
    for ch in para.chars() {
        let script = ch.script();
        if real_script(script) {
            current = script;
        }
        scripts.push(current);
    }
    if let Some(first_real) = scripts.iter().copied().find(|s| real_script(*s)) {
        for script in &mut scripts {
            if real_script(*script) {
                break;
            }
            *script = first_real;
        }
    }

    let empty_attrs = AttrList::new();
    let list = attrs.unwrap_or(&empty_attrs);
    let mut iter = list.iterator();
    iter.advance(start_index);
    let mut segment = compute_segment(context, &iter, end_index);

    let mut items: Vec<Item> = Vec::new();
    let mut run_start = 0_usize;
    let mut run_chars = 0_usize;
    let mut char_offset = 0_usize;

    struct RunState {
        level: u8,
        script: Script,
        font: Option<FontRef>,
        language: Option<Language>,
        gravity: Gravity,
        extras: Vec<Attribute>,
        kind: CharKind,
    }
    let mut run: Option<RunState> = None;

    let mut flush = |items: &mut Vec<Item>,
                     run: &mut Option<RunState>,
                     run_start: usize,
                     run_end: usize,
                     run_chars: usize,
                     char_offset: usize| {
        let Some(state) = run.take() else {
            return;
        };
        let mut flags = AnalysisFlags::empty();
        if state.gravity.is_vertical() {
            flags |= AnalysisFlags::CENTERED_BASELINE;
        }
        items.push(Item {
            offset: start_index + run_start,
            length: run_end - run_start,
            num_chars: run_chars,
            char_offset: char_offset - run_chars,
            analysis: Analysis {
                font: state.font,
                level: state.level,
                gravity: state.gravity,
                flags,
                script: state.script,
                language: state.language,
                extra_attrs: state.extras,
            },
        });
    };

    let mut chars = para.char_indices().peekable();
    while let Some((rel, ch)) = chars.next() {
        let abs = start_index + rel;
        if abs >= segment.end {
            iter.advance(abs);
            segment = compute_segment(context, &iter, end_index);
        }

        let level = bidi.levels[rel].number();
        let script = scripts[char_offset];
        let kind = char_kind(ch);

        let font = match &segment.font {
            Some(font) if no_coverage_needed(ch) || font.has_char(ch) => Some(font.clone()),
            _ if segment.fallback && !no_coverage_needed(ch) => context
                .font_map()
                .load_font_for_char(ch, &segment.desc, segment.language)
                .or_else(|| segment.font.clone()),
            _ => segment.font.clone(),
        };

        // A CRLF pair stays one paragraph-separator item.
        let crlf = ch == '\r' && chars.peek().is_some_and(|&(_, next)| next == '\n');

        let break_before = match &run {
            None => false,
            Some(state) => {
                state.kind != CharKind::Normal
                    || kind != CharKind::Normal
                    || state.level != level
                    || state.script != script
                    || !same_font(&state.font, &font)
                    || state.language != segment.language
                    || state.gravity != segment.gravity
                    || state.extras != segment.extras
            }
        };
        if break_before {
            flush(&mut items, &mut run, run_start, rel, run_chars, char_offset);
        }
        if run.is_none() {
            run_start = rel;
            run_chars = 0;
            run = Some(RunState {
                level,
                script,
                font,
                language: segment.language,
                gravity: segment.gravity,
                extras: segment.extras.clone(),
                kind,
            });
        }

        run_chars += 1;
        char_offset += 1;

        if crlf {
            let (_, nl) = chars.next().unwrap();
            debug_assert_eq!(nl, '\n');
            run_chars += 1;
            char_offset += 1;
        }
    }

    flush(
        &mut items,
        &mut run,
        run_start,
        para.len(),
        run_chars,
        char_offset,
    );

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFontMap;

    fn test_context() -> LayoutContext {
        LayoutContext::new(Arc::new(TestFontMap::new()))
    }

    #[test]
    fn uniform_text_is_one_item() {
        let context = test_context();
        let items = itemize(&context, Direction::Neutral, "Hello", 0, 5, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].offset, 0);
        assert_eq!(items[0].length, 5);
        assert_eq!(items[0].num_chars, 5);
        assert_eq!(items[0].analysis.level, 0);
    }

    #[test]
    fn tabs_and_separators_are_isolated() {
        let context = test_context();
        let items = itemize(&context, Direction::Neutral, "ab\tcd\ne", 0, 7, None);
        let spans: Vec<(usize, usize)> = items.iter().map(|i| (i.offset, i.length)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 1), (3, 2), (5, 1), (6, 1)]);
    }

    #[test]
    fn crlf_is_one_item() {
        let context = test_context();
        let items = itemize(&context, Direction::Neutral, "ab\r\ncd", 0, 6, None);
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].length, 2);
        assert_eq!(items[1].num_chars, 2);
    }

    #[test]
    fn mixed_direction_splits_by_level() {
        let context = test_context();
        // Hebrew aleph-bet-gimel followed by latin.
        let text = "\u{05d0}\u{05d1}\u{05d2} abc";
        let items = itemize(&context, Direction::Neutral, text, 0, text.len(), None);
        assert!(items.len() >= 2);
        assert_eq!(items[0].analysis.level & 1, 1);
        let last = items.last().unwrap();
        assert_eq!(last.analysis.level & 1, 0);
    }

    #[test]
    fn resolved_level_follows_content_when_neutral() {
        assert_eq!(resolve_base_level("abc", Direction::Neutral), 0);
        assert_eq!(resolve_base_level("\u{05d0}bc", Direction::Neutral), 1);
        assert_eq!(resolve_base_level("123", Direction::WeakRtl), 1);
        assert_eq!(resolve_base_level("\u{05d0}", Direction::Ltr), 0);
    }

    #[test]
    fn attr_boundary_splits_items_when_itemizing_a_full_list() {
        use crate::attrs::{AttrList, Attribute, Color};
        let context = test_context();
        let mut attrs = AttrList::new();
        attrs.insert(Attribute::foreground(Color::new(1, 2, 3)).with_range(0, 2));
        let items = itemize(&context, Direction::Neutral, "abcd", 0, 4, Some(&attrs));
        // Non-font attributes land in the items' extras, so their
        // boundaries split runs when itemizing a full list directly. The
        // line breaker avoids this by filtering to itemization attributes.
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].analysis.extra_attrs.len(), 1);
    }
}
