// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-character boolean properties (log-attrs).
//!
//! One record per character plus a sentinel at the end of the text. The
//! breaker consults these for break opportunities, whitespace collapsing and
//! hyphen insertion; cursor motion and ellipsization use the cursor-position
//! bits.

use unicode_segmentation::UnicodeSegmentation;
use xi_unicode::LineBreakIterator;

use crate::attrs::{AttrList, AttrType};

bitflags::bitflags! {
    /// The per-character properties.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LogAttr: u16 {
        const LINE_BREAK = 1 << 0;
        const MANDATORY_BREAK = 1 << 1;
        const CHAR_BREAK = 1 << 2;
        const WHITE = 1 << 3;
        const CURSOR_POSITION = 1 << 4;
        const WORD_START = 1 << 5;
        const WORD_END = 1 << 6;
        const SENTENCE_START = 1 << 7;
        const SENTENCE_END = 1 << 8;
        const BREAK_INSERTS_HYPHEN = 1 << 9;
        const BREAK_REMOVES_PRECEDING = 1 << 10;
    }
}

impl LogAttr {
    /// Whether a line can wrap before this character.
    pub fn is_line_break(self) -> bool {
        self.contains(Self::LINE_BREAK)
    }

    /// Whether a line must end before this character.
    pub fn is_mandatory_break(self) -> bool {
        self.contains(Self::MANDATORY_BREAK)
    }

    /// Whether char-granularity wrapping can break before this character.
    pub fn is_char_break(self) -> bool {
        self.contains(Self::CHAR_BREAK)
    }

    /// Whether this character is whitespace.
    pub fn is_white(self) -> bool {
        self.contains(Self::WHITE)
    }

    /// Whether the cursor can stand before this character.
    pub fn is_cursor_position(self) -> bool {
        self.contains(Self::CURSOR_POSITION)
    }

    pub fn is_word_start(self) -> bool {
        self.contains(Self::WORD_START)
    }

    pub fn is_word_end(self) -> bool {
        self.contains(Self::WORD_END)
    }

    pub fn is_sentence_start(self) -> bool {
        self.contains(Self::SENTENCE_START)
    }

    pub fn is_sentence_end(self) -> bool {
        self.contains(Self::SENTENCE_END)
    }

    /// Whether breaking here requires inserting a hyphen.
    pub fn break_inserts_hyphen(self) -> bool {
        self.contains(Self::BREAK_INSERTS_HYPHEN)
    }

    /// Whether breaking here removes the preceding character.
    pub fn break_removes_preceding(self) -> bool {
        self.contains(Self::BREAK_REMOVES_PRECEDING)
    }
}

/// Computes the log-attr array for `text`: one record per character plus a
/// sentinel.
///
/// `attrs` contributes the break-affecting attributes (`AllowBreaks`,
/// `InsertHyphens`, `Word`, `Sentence`).
pub fn compute_log_attrs(text: &str, attrs: Option<&AttrList>) -> Vec<LogAttr> {
    let char_offsets: Vec<usize> = text.char_indices().map(|(index, _)| index).collect();
    let num_chars = char_offsets.len();
    let mut log_attrs = vec![LogAttr::empty(); num_chars + 1];

    let char_index = |byte: usize| -> Option<usize> {
        if byte == text.len() {
            return Some(num_chars);
        }
        char_offsets.binary_search(&byte).ok()
    };

    // Grapheme boundaries are cursor positions and char-break sites.
    for (byte, _) in text.grapheme_indices(true) {
        if let Some(index) = char_index(byte) {
            log_attrs[index] |= LogAttr::CURSOR_POSITION | LogAttr::CHAR_BREAK;
        }
    }
    log_attrs[num_chars] |= LogAttr::CURSOR_POSITION | LogAttr::CHAR_BREAK;

    // UAX#14 line break opportunities; breaking inside a grapheme is never
    // allowed, so boundaries that segmentation joins are dropped.
    for (byte, hard) in LineBreakIterator::new(text) {
        let Some(index) = char_index(byte) else {
            continue;
        };
        if !log_attrs[index].contains(LogAttr::CURSOR_POSITION) {
            continue;
        }
        log_attrs[index] |= LogAttr::LINE_BREAK;
        if hard {
            log_attrs[index] |= LogAttr::MANDATORY_BREAK;
        }
    }

    for (index, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            log_attrs[index] |= LogAttr::WHITE;
        }
        // A break after a soft hyphen renders a real hyphen in its place.
        if ch == '\u{00ad}' && log_attrs[index + 1].contains(LogAttr::LINE_BREAK) {
            log_attrs[index + 1] |= LogAttr::BREAK_INSERTS_HYPHEN;
        }
    }

    for (byte, word) in text.split_word_bound_indices() {
        if !word.chars().any(char::is_alphanumeric) {
            continue;
        }
        if let Some(index) = char_index(byte) {
            log_attrs[index] |= LogAttr::WORD_START;
        }
        if let Some(index) = char_index(byte + word.len()) {
            log_attrs[index] |= LogAttr::WORD_END;
        }
    }

    for (byte, sentence) in text.split_sentence_bound_indices() {
        if sentence.trim().is_empty() {
            continue;
        }
        if let Some(index) = char_index(byte) {
            log_attrs[index] |= LogAttr::SENTENCE_START;
        }
        if let Some(index) = char_index(byte + sentence.len()) {
            log_attrs[index] |= LogAttr::SENTENCE_END;
        }
    }

    if let Some(attrs) = attrs {
        apply_attr_breaks(text, attrs, &char_offsets, &mut log_attrs);
    }

    log_attrs
}

/// Overrides computed breaks with the break-affecting attributes.
fn apply_attr_breaks(
    text: &str,
    attrs: &AttrList,
    char_offsets: &[usize],
    log_attrs: &mut [LogAttr],
) {
    let num_chars = char_offsets.len();
    let char_index = |byte: usize| -> Option<usize> {
        if byte >= text.len() {
            return Some(num_chars);
        }
        char_offsets.binary_search(&byte).ok()
    };

    for attr in attrs.attributes() {
        let start = attr.start();
        let end = attr.end().min(text.len());
        if start >= end {
            continue;
        }
        let Some(start_char) = char_index(start) else {
            continue;
        };
        let Some(end_char) = char_index(end) else {
            continue;
        };

        match attr.attr_type() {
            AttrType::ALLOW_BREAKS if !attr.bool_value() => {
                for record in &mut log_attrs[start_char + 1..end_char] {
                    if !record.contains(LogAttr::MANDATORY_BREAK) {
                        record.remove(LogAttr::LINE_BREAK | LogAttr::CHAR_BREAK);
                    }
                }
            }
            AttrType::INSERT_HYPHENS if !attr.bool_value() => {
                for record in &mut log_attrs[start_char + 1..=end_char] {
                    record.remove(LogAttr::BREAK_INSERTS_HYPHEN);
                }
            }
            AttrType::WORD => {
                for record in &mut log_attrs[start_char + 1..end_char] {
                    record.remove(LogAttr::WORD_START | LogAttr::WORD_END);
                    if !record.contains(LogAttr::MANDATORY_BREAK) {
                        record.remove(LogAttr::LINE_BREAK);
                    }
                }
                log_attrs[start_char] |= LogAttr::WORD_START;
                log_attrs[end_char] |= LogAttr::WORD_END;
            }
            AttrType::SENTENCE => {
                for record in &mut log_attrs[start_char + 1..end_char] {
                    record.remove(LogAttr::SENTENCE_START | LogAttr::SENTENCE_END);
                }
                log_attrs[start_char] |= LogAttr::SENTENCE_START;
                log_attrs[end_char] |= LogAttr::SENTENCE_END;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attribute;

    #[test]
    fn spaces_open_break_opportunities() {
        let attrs = compute_log_attrs("Hello World", None);
        assert_eq!(attrs.len(), 12);
        // Break allowed before 'W' (after the space).
        assert!(attrs[6].is_line_break());
        assert!(!attrs[6].is_mandatory_break());
        assert!(attrs[5].is_white());
        // No break inside "Hello".
        for attr in &attrs[1..5] {
            assert!(!attr.is_line_break());
        }
        // Sentinel is a mandatory break.
        assert!(attrs[11].is_mandatory_break());
    }

    #[test]
    fn newline_is_mandatory() {
        let attrs = compute_log_attrs("ab\ncd", None);
        assert!(attrs[3].is_mandatory_break());
    }

    #[test]
    fn grapheme_cluster_blocks_breaks_and_cursor() {
        // e + combining acute: one grapheme, two chars.
        let attrs = compute_log_attrs("e\u{0301}x", None);
        assert!(attrs[0].is_cursor_position());
        assert!(!attrs[1].is_cursor_position());
        assert!(!attrs[1].is_char_break());
        assert!(attrs[2].is_cursor_position());
    }

    #[test]
    fn soft_hyphen_inserts_hyphen_on_break() {
        let attrs = compute_log_attrs("co\u{00ad}op", None);
        assert!(attrs[3].is_line_break());
        assert!(attrs[3].break_inserts_hyphen());
    }

    #[test]
    fn word_and_sentence_marks() {
        let attrs = compute_log_attrs("Hi there. Bye.", None);
        assert!(attrs[0].is_word_start());
        assert!(attrs[2].is_word_end());
        assert!(attrs[3].is_word_start());
        assert!(attrs[0].is_sentence_start());
        assert!(attrs[10].is_sentence_start());
    }

    #[test]
    fn allow_breaks_false_suppresses_wrapping() {
        let mut list = AttrList::new();
        list.insert(Attribute::allow_breaks(false).with_range(0, 11));
        let attrs = compute_log_attrs("Hello World", Some(&list));
        assert!(!attrs[6].is_line_break());
    }

    #[test]
    fn word_attr_suppresses_interior_breaks() {
        let mut list = AttrList::new();
        list.insert(Attribute::word().with_range(0, 11));
        let attrs = compute_log_attrs("Hello World", Some(&list));
        assert!(!attrs[6].is_line_break());
        assert!(attrs[0].is_word_start());
        assert!(attrs[11].is_word_end());
    }
}
