// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shaping adapter.
//!
//! Wraps the font backend's shaper with the pieces the layout core needs on
//! top of raw shaping: text transforms, show flags, hyphen insertion, the
//! per-character fallback when a font produces nothing, and direction repair
//! so glyph storage is always left-to-right.

use std::sync::{Mutex, OnceLock};

use hashbrown::HashSet;

use crate::attrs::{AttrType, ShowFlags, TextTransform};
use crate::glyph::{glyph_unknown, GlyphInfo, GlyphString, GLYPH_EMPTY};
use crate::item::{Analysis, AnalysisFlags};
use crate::LogAttr;

bitflags::bitflags! {
    /// Flags influencing shaping.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ShapeFlags: u8 {
        /// Round advances and offsets to whole device units.
        const ROUND_POSITIONS = 1 << 0;
    }
}

/// Characters that shape to nothing unless a show flag makes them visible.
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{2028}' | '\u{2029}' | '\u{00ad}' | '\u{200b}'..='\u{200f}'
            | '\u{2060}' | '\u{feff}'
    )
}

fn shape_scratch() -> &'static Mutex<String> {
    static SCRATCH: OnceLock<Mutex<String>> = OnceLock::new();
    SCRATCH.get_or_init(|| Mutex::new(String::new()))
}

fn warned_fonts() -> &'static Mutex<HashSet<String>> {
    static WARNED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    WARNED.get_or_init(|| Mutex::new(HashSet::new()))
}

fn single_char(mut iter: impl Iterator<Item = char>) -> Option<char> {
    let first = iter.next()?;
    if iter.next().is_some() {
        return None;
    }
    Some(first)
}

/// Applies a case transform, keeping the byte length of every character so
/// cluster indices stay valid; characters whose mapping would change length
/// are left alone.
fn transform_into(
    text: &str,
    transform: TextTransform,
    log_attrs: &[LogAttr],
    out: &mut String,
) {
    out.clear();
    out.reserve(text.len());
    for (index, ch) in text.chars().enumerate() {
        let mapped = match transform {
            TextTransform::None => None,
            TextTransform::Lowercase => single_char(ch.to_lowercase()),
            TextTransform::Uppercase => single_char(ch.to_uppercase()),
            TextTransform::Capitalize => {
                if log_attrs.get(index).is_some_and(|a| a.is_word_start()) {
                    single_char(ch.to_uppercase())
                } else {
                    None
                }
            }
        };
        match mapped {
            Some(mapped) if mapped.len_utf8() == ch.len_utf8() => out.push(mapped),
            _ => out.push(ch),
        }
    }
}

fn show_flags(analysis: &Analysis) -> ShowFlags {
    let mut flags = ShowFlags::empty();
    for attr in &analysis.extra_attrs {
        if attr.attr_type() == AttrType::SHOW {
            flags |= ShowFlags::from_bits_truncate(attr.int_value() as u32);
        }
    }
    flags
}

fn text_transform(analysis: &Analysis) -> TextTransform {
    for attr in &analysis.extra_attrs {
        if attr.attr_type() == AttrType::TEXT_TRANSFORM {
            return TextTransform::from_raw(attr.int_value());
        }
    }
    TextTransform::None
}

/// Emits one glyph per character; used when the font backend fails.
fn shape_fallback(text: &str, analysis: &Analysis, glyphs: &mut GlyphString) {
    glyphs.clear();
    let metrics = analysis
        .font
        .as_ref()
        .map(|font| font.metrics(analysis.language));
    for (offset, ch) in text.char_indices() {
        let (glyph, width) = if is_invisible(ch) {
            (GLYPH_EMPTY, 0.0)
        } else {
            let glyph = glyph_unknown(ch);
            let width = analysis
                .font
                .as_ref()
                .map(|font| font.glyph_extents(glyph).logical.width)
                .filter(|w| *w > 0.0)
                .or(metrics.as_ref().map(|m| m.approximate_char_width))
                .unwrap_or(0.0);
            (glyph, width)
        };
        glyphs.glyphs.push(GlyphInfo {
            glyph,
            width,
            x_offset: 0.0,
            y_offset: 0.0,
            is_cluster_start: true,
        });
        glyphs.log_clusters.push(offset);
    }
    if analysis.is_rtl() {
        glyphs.reverse();
    }
}

/// Checks that storage order matches the item's level parity and repairs it.
fn fix_direction(analysis: &Analysis, glyphs: &mut GlyphString) {
    if glyphs.len() < 2 {
        return;
    }
    let first = glyphs.log_clusters[0];
    let last = glyphs.log_clusters[glyphs.len() - 1];
    if first == last {
        return;
    }
    let stored_rtl = first > last;
    if stored_rtl != analysis.is_rtl() {
        log::warn!(
            "shaper produced glyphs in the wrong direction for level {}; reversing",
            analysis.level
        );
        glyphs.reverse();
    }
}

fn mark_cluster_starts(glyphs: &mut GlyphString) {
    let mut prev = usize::MAX;
    for index in 0..glyphs.len() {
        let cluster = glyphs.log_clusters[index];
        glyphs.glyphs[index].is_cluster_start = cluster != prev;
        prev = cluster;
    }
}

/// Shapes `item_text` with `analysis`, filling `glyphs`.
///
/// `paragraph_text` supplies shaping context around the item; `log_attrs`
/// holds the item's per-character records (used by transforms). The result
/// is stored in left-to-right order regardless of direction.
pub fn shape(
    item_text: &str,
    paragraph_text: &str,
    analysis: &Analysis,
    log_attrs: &[LogAttr],
    glyphs: &mut GlyphString,
    flags: ShapeFlags,
) {
    let _ = paragraph_text;
    glyphs.clear();
    if item_text.is_empty() {
        return;
    }

    let transform = text_transform(analysis);
    let need_hyphen = analysis.flags.contains(AnalysisFlags::NEED_HYPHEN);

    // Invalid UTF-8 never reaches this point (input is sanitized on entry),
    // so the only text rewriting is transforms and the break hyphen.
    let rewrite = transform != TextTransform::None || need_hyphen;
    let mut local = String::new();
    let mut guard = None;
    let shaped_text: &str = if rewrite {
        let buffer: &mut String = match shape_scratch().try_lock() {
            Ok(lock) => {
                guard = Some(lock);
                guard.as_mut().unwrap()
            }
            // Contended: shape with a throwaway buffer.
            Err(_) => &mut local,
        };
        transform_into(item_text, transform, log_attrs, buffer);
        if need_hyphen {
            let hyphen = match &analysis.font {
                Some(font) if font.has_char('\u{2010}') => '\u{2010}',
                _ => '-',
            };
            buffer.push(hyphen);
        }
        buffer
    } else {
        item_text
    };

    match &analysis.font {
        Some(font) => {
            font.shape_text(shaped_text, analysis, flags, glyphs);
            if glyphs.is_empty() {
                let description = font.description().to_string();
                let mut warned = warned_fonts().lock().unwrap();
                if warned.insert(description.clone()) {
                    log::warn!(
                        "shaping produced no glyphs for {:?} with font '{description}'; \
                         using per-character fallback",
                        shaped_text,
                    );
                }
                shape_fallback(shaped_text, analysis, glyphs);
            }
        }
        None => shape_fallback(shaped_text, analysis, glyphs),
    }

    fix_direction(analysis, glyphs);

    // Show-flag and invisible-character handling on cluster granularity.
    // The appended hyphen's glyphs still point past the item here, which
    // keeps them out of this pass.
    let show = show_flags(analysis);
    for index in 0..glyphs.len() {
        let cluster = glyphs.log_clusters[index];
        let Some(ch) = item_text[cluster.min(item_text.len())..].chars().next() else {
            continue;
        };
        if is_invisible(ch) {
            let visible = match ch {
                '\u{2028}' | '\n' | '\r' | '\u{2029}' => show.contains(ShowFlags::LINE_BREAKS),
                _ => show.contains(ShowFlags::IGNORABLES),
            };
            if visible {
                let glyph = glyph_unknown(ch);
                glyphs.glyphs[index].glyph = glyph;
                glyphs.glyphs[index].width = analysis
                    .font
                    .as_ref()
                    .map(|font| font.glyph_extents(glyph).logical.width)
                    .filter(|w| *w > 0.0)
                    .unwrap_or(glyphs.glyphs[index].width);
            } else {
                glyphs.glyphs[index].glyph = GLYPH_EMPTY;
                glyphs.glyphs[index].width = 0.0;
            }
        } else if ch.is_whitespace() && show.contains(ShowFlags::SPACES) {
            glyphs.glyphs[index].glyph = glyph_unknown(ch);
        }
    }

    if need_hyphen {
        // The appended hyphen belongs to the item's final cluster.
        let last_char_offset = item_text
            .char_indices()
            .next_back()
            .map(|(offset, _)| offset)
            .unwrap_or(0);
        for cluster in &mut glyphs.log_clusters {
            if *cluster >= item_text.len() {
                *cluster = last_char_offset;
            }
        }
    }

    if flags.contains(ShapeFlags::ROUND_POSITIONS) {
        for glyph in &mut glyphs.glyphs {
            glyph.width = glyph.width.round();
            glyph.x_offset = glyph.x_offset.round();
            glyph.y_offset = glyph.y_offset.round();
        }
    }

    mark_cluster_starts(glyphs);
}
