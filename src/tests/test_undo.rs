// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::breaker_for;
use crate::{EllipsizeMode, Line, WrapMode};

fn lines_equal(a: &Line, b: &Line) -> bool {
    a.start_index() == b.start_index()
        && a.length() == b.length()
        && a.num_chars() == b.num_chars()
        && a.is_wrapped() == b.is_wrapped()
        && a.is_hyphenated() == b.is_hyphenated()
        && a.runs().len() == b.runs().len()
        && a.runs().iter().zip(b.runs()).all(|(ra, rb)| {
            ra.item.offset == rb.item.offset
                && ra.item.length == rb.item.length
                && ra.glyphs == rb.glyphs
        })
}

#[test]
fn undo_then_redo_reproduces_the_line() {
    let mut breaker = breaker_for("Hello World", None);
    let line = breaker
        .next_line(0.0, 55.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert!(breaker.undo_line(&line));
    let again = breaker
        .next_line(0.0, 55.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert!(lines_equal(&line, &again));

    // The rest of the text is still produced.
    let rest = breaker
        .next_line(0.0, 55.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert_eq!(rest.text(), "World");
    assert!(!breaker.has_line());
}

#[test]
fn undo_allows_retrying_with_a_different_width() {
    let mut breaker = breaker_for("Hello World", None);
    let narrow = breaker
        .next_line(0.0, 55.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert_eq!(narrow.text(), "Hello ");
    assert!(breaker.undo_line(&narrow));
    let wide = breaker
        .next_line(0.0, 200.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert_eq!(wide.text(), "Hello World");
    assert!(!wide.is_wrapped());
}

#[test]
fn undo_of_stale_line_is_rejected() {
    let mut breaker = breaker_for("one two three four", None);
    let first = breaker
        .next_line(0.0, 85.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    let _second = breaker
        .next_line(0.0, 85.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    // `first` is no longer the most recent line.
    assert!(!breaker.undo_line(&first));
}

#[test]
fn undo_of_a_complete_paragraph_requeues_it() {
    let mut breaker = breaker_for("short", None);
    let line = breaker
        .next_line(0.0, -1.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert!(!breaker.has_line());
    assert!(breaker.undo_line(&line));
    assert!(breaker.has_line());
    let again = breaker
        .next_line(0.0, -1.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert!(lines_equal(&line, &again));
}

#[test]
fn undo_in_reverse_order_restores_multiple_lines() {
    // Three lines; keep the paragraph active by leaving the last unproduced.
    let mut breaker = breaker_for("aa bb cc", None);
    let first = breaker
        .next_line(0.0, 25.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    let second = breaker
        .next_line(0.0, 25.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert!(breaker.has_line());
    assert!(breaker.undo_line(&second));
    assert!(breaker.undo_line(&first));
    let replay_first = breaker
        .next_line(0.0, 25.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    assert!(lines_equal(&first, &replay_first));
}

#[test]
fn undo_of_final_partial_line_is_rejected_after_paragraph_drains() {
    let mut breaker = breaker_for("Hello World", None);
    let _first = breaker
        .next_line(0.0, 55.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    let second = breaker
        .next_line(0.0, 55.0, WrapMode::Word, EllipsizeMode::None)
        .unwrap();
    // The paragraph has been dropped and `second` is not a complete blob.
    assert!(!breaker.undo_line(&second));
}
