// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{breaker_for, collect_lines, wrap_lines};
use crate::{Attribute, EllipsizeMode, WrapMode};

#[test]
fn soft_hyphen_break_inserts_hyphen() {
    // "co" + soft hyphen + "op"; the only break is at the soft hyphen.
    let lines = wrap_lines("co\u{00ad}op", 35.0);
    assert_eq!(lines.len(), 2);

    let first = &lines[0];
    assert!(first.is_wrapped());
    assert!(first.is_hyphenated());
    // "co" plus the rendered hyphen.
    assert_eq!(first.width(), 30.0);
    // The visually final glyph is the inserted hyphen.
    let glyphs = &first.runs().last().unwrap().glyphs;
    assert_eq!(glyphs.glyphs.last().unwrap().glyph, 0x2010);

    assert_eq!(lines[1].text(), "op");
    assert!(!lines[1].is_hyphenated());
}

#[test]
fn no_hyphen_when_line_is_not_broken_there() {
    let lines = wrap_lines("co\u{00ad}op", -1.0);
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].is_hyphenated());
    // The soft hyphen shapes invisibly.
    assert_eq!(lines[0].width(), 40.0);
}

#[test]
fn insert_hyphens_false_suppresses_hyphenation() {
    let mut attrs = crate::AttrList::new();
    attrs.insert(Attribute::insert_hyphens(false).with_range(0, 6));
    let mut breaker = breaker_for("co\u{00ad}op", Some(&attrs));
    let lines = collect_lines(&mut breaker, 35.0, WrapMode::Word, EllipsizeMode::None);
    // The break survives, but no hyphen is inserted.
    assert_eq!(lines.len(), 2);
    assert!(!lines[0].is_hyphenated());
    assert_eq!(lines[0].width(), 20.0);
}
