// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{breaker_for, collect_lines, wrap_lines};
use crate::glyph::GLYPH_EMPTY;
use crate::{Direction, EllipsizeMode, WrapMode};

#[test]
fn one_line_when_width_is_unbounded() {
    let lines = wrap_lines("Hello World", -1.0);
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert_eq!(line.num_chars(), 11);
    assert_eq!(line.runs().len(), 1);
    assert_eq!(line.width(), 110.0);
    assert!(!line.is_wrapped());
    assert!(!line.is_hyphenated());
    assert!(line.starts_paragraph());
    assert!(line.ends_paragraph());
}

#[test]
fn wraps_at_word_boundary_and_collapses_trailing_space() {
    // Width just below "Hello " (60): break after "Hello", space collapsed.
    let lines = wrap_lines("Hello World", 55.0);
    assert_eq!(lines.len(), 2);

    let first = &lines[0];
    assert_eq!(first.text(), "Hello ");
    assert!(first.is_wrapped());
    assert!(!first.is_hyphenated());
    assert!(!first.ends_paragraph());
    // The trailing space glyph was zeroed.
    let glyphs = &first.runs().last().unwrap().glyphs;
    assert_eq!(glyphs.glyphs.last().unwrap().glyph, GLYPH_EMPTY);
    assert_eq!(glyphs.glyphs.last().unwrap().width, 0.0);
    assert_eq!(first.width(), 50.0);

    let second = &lines[1];
    assert_eq!(second.text(), "World");
    assert!(!second.is_wrapped());
    assert!(second.ends_paragraph());
}

#[test]
fn forces_overflowing_line_when_nothing_fits() {
    // Width below "Hello": no fitting break, so the first word is forced.
    let lines = wrap_lines("Hello World", 45.0);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text(), "Hello ");
    assert!(lines[0].is_wrapped());
    // Visually the line is "Hello": the space is collapsed.
    assert_eq!(lines[0].width(), 50.0);
    assert_eq!(lines[1].text(), "World");
}

#[test]
fn paragraph_separator_ends_line_without_a_run() {
    let lines = wrap_lines("ab\ncd", -1.0);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text(), "ab");
    assert!(lines[0].ends_paragraph());
    assert!(!lines[0].is_wrapped());
    // The next line starts past the separator bytes.
    assert_eq!(lines[1].start_index(), 3);
    assert_eq!(lines[1].text(), "cd");
    assert!(lines[1].starts_paragraph());
}

#[test]
fn byte_ranges_of_lines_cover_the_text() {
    let text = "one two three\nfour five\r\nsix";
    let lines = wrap_lines(text, 60.0);
    let mut covered = 0;
    for line in &lines {
        // Runs cover [start, start + length); paragraph separators are
        // skipped between lines.
        assert!(line.start_index() >= covered);
        let gap = &text[covered..line.start_index()];
        assert!(gap.chars().all(|c| matches!(c, '\n' | '\r' | '\u{2029}')));
        covered = line.start_index() + line.length();
    }
    let tail = &text[covered..];
    assert!(tail.chars().all(|c| matches!(c, '\n' | '\r' | '\u{2029}')));
}

#[test]
fn line_separator_forces_break_but_not_paragraph() {
    let lines = wrap_lines("ab\u{2028}cd", -1.0);
    assert_eq!(lines.len(), 2);
    assert!(!lines[0].ends_paragraph());
    assert!(lines[0].is_wrapped());
    // The separator stays on the line as an (invisible) run.
    assert_eq!(lines[0].length(), 2 + '\u{2028}'.len_utf8());
    assert_eq!(lines[1].text(), "cd");
}

#[test]
fn char_wrap_breaks_inside_words() {
    let mut breaker = breaker_for("abcdef", None);
    let lines = collect_lines(&mut breaker, 25.0, WrapMode::Char, EllipsizeMode::None);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].text(), "ab");
    assert_eq!(lines[1].text(), "cd");
    assert_eq!(lines[2].text(), "ef");
}

#[test]
fn word_char_wrap_falls_back_to_chars() {
    let mut breaker = breaker_for("abcdef", None);
    let lines = collect_lines(&mut breaker, 25.0, WrapMode::WordChar, EllipsizeMode::None);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].text(), "ab");
    for line in &lines[..2] {
        assert!(line.is_wrapped());
        assert!(line.width() <= 25.0);
    }
}

#[test]
fn multiple_paragraph_queues_are_processed_in_order() {
    let mut breaker = breaker_for("first", None);
    breaker.add_text("second", None);
    let lines = collect_lines(&mut breaker, -1.0, WrapMode::Word, EllipsizeMode::None);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text(), "first");
    assert_eq!(lines[1].text(), "second");
    assert!(lines[0].ends_paragraph());
}

#[test]
fn empty_input_produces_no_lines() {
    let mut breaker = breaker_for("", None);
    assert!(!breaker.has_line());
    assert!(breaker
        .next_line(0.0, -1.0, WrapMode::Word, EllipsizeMode::None)
        .is_none());
    assert_eq!(breaker.get_direction(), Direction::Neutral);
}

#[test]
fn unwrapped_line_fits_width_invariant() {
    for width in [45.0, 55.0, 65.0, 120.0] {
        for line in wrap_lines("Hello World", width) {
            if !line.is_wrapped() && !line.is_ellipsized() {
                assert!(line.width() <= width, "unwrapped line wider than limit");
            }
        }
    }
}
