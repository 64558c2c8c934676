// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{breaker_for, wrap_lines};
use crate::Direction;

const HEBREW: &str = "\u{05d0}\u{05d1}\u{05d2}\u{05d3}";

#[test]
fn neutral_base_dir_resolves_from_content() {
    let mut breaker = breaker_for(HEBREW, None);
    assert_eq!(breaker.get_direction(), Direction::Rtl);

    let mut breaker = breaker_for("latin", None);
    assert_eq!(breaker.get_direction(), Direction::Ltr);
}

#[test]
fn strong_base_dir_wins_over_content() {
    let mut breaker = breaker_for(HEBREW, None);
    breaker.set_base_dir(Direction::Ltr);
    assert_eq!(breaker.get_direction(), Direction::Ltr);
}

#[test]
fn latin_run_reorders_left_of_hebrew_in_rtl_line() {
    let text = format!("{HEBREW} latin");
    let mut breaker = breaker_for(&text, None);
    assert_eq!(breaker.get_direction(), Direction::Rtl);
    let line = breaker
        .next_line(0.0, -1.0, crate::WrapMode::Word, crate::EllipsizeMode::None)
        .unwrap();
    assert_eq!(line.direction(), Direction::Rtl);
    assert!(line.runs().len() >= 2);

    // After reordering, the visually first run is the Latin one.
    let first = &line.runs()[0];
    assert_eq!(first.item.analysis.level & 1, 0);
    assert!(text[first.item.offset..].starts_with("latin"));
    // And the Hebrew run sits to its right.
    let last = line.runs().last().unwrap();
    assert_eq!(last.item.analysis.level & 1, 1);
    assert_eq!(last.item.offset, 0);
}

#[test]
fn rtl_glyphs_are_stored_in_visual_order() {
    let lines = wrap_lines(HEBREW, -1.0);
    let run = &lines[0].runs()[0];
    assert!(run.is_rtl());
    // Storage is left-to-right visual: clusters descend.
    let clusters = &run.glyphs.log_clusters;
    assert!(clusters.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn visual_runs_have_nondecreasing_x() {
    let text = format!("abc {HEBREW} def");
    for line in wrap_lines(&text, -1.0) {
        let mut x = 0.0;
        for run in line.runs() {
            assert!(run.width() >= 0.0);
            x += run.width();
        }
        assert_eq!(x, line.width());
    }
}
