// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use super::utils::breaker_for;
use crate::item::AnalysisFlags;
use crate::testing::{TestFont, TestFontMap};
use crate::{EllipsizeMode, LayoutContext, LineBreaker, WrapMode};

fn ellipsized(text: &str, mode: EllipsizeMode, goal: f32) -> crate::Line {
    let mut breaker = breaker_for(text, None);
    let line = breaker.next_line(0.0, goal, WrapMode::Word, mode).unwrap();
    assert!(!breaker.has_line(), "ellipsizing consumes all input");
    line
}

#[test]
fn end_mode_elides_the_tail() {
    // Goal is the width of "abc…".
    let line = ellipsized("abcdefghij", EllipsizeMode::End, 40.0);
    assert!(line.is_ellipsized());
    assert!(line.width() <= 40.0);
    assert_eq!(line.runs().len(), 2);

    let prefix = &line.runs()[0];
    assert_eq!(prefix.item.offset, 0);
    assert_eq!(prefix.item.length, 3);

    let ellipsis = &line.runs()[1];
    assert!(ellipsis.item.analysis.flags.contains(AnalysisFlags::IS_ELLIPSIS));
    // The ellipsis item spans the elided "defghij".
    assert_eq!(ellipsis.item.offset, 3);
    assert_eq!(ellipsis.item.length, 7);
    assert_eq!(ellipsis.glyphs.len(), 1);
}

#[test]
fn start_mode_elides_the_head() {
    let line = ellipsized("abcdefghij", EllipsizeMode::Start, 40.0);
    assert!(line.is_ellipsized());
    assert!(line.width() <= 40.0);
    assert_eq!(line.runs().len(), 2);
    assert!(line.runs()[0]
        .item
        .analysis
        .flags
        .contains(AnalysisFlags::IS_ELLIPSIS));
    let suffix = &line.runs()[1];
    assert_eq!(suffix.item.offset + suffix.item.length, 10);
}

#[test]
fn middle_mode_keeps_both_ends() {
    let line = ellipsized("abcdefghij", EllipsizeMode::Middle, 50.0);
    assert!(line.is_ellipsized());
    assert!(line.width() <= 50.0);
    assert_eq!(line.runs().len(), 3);
    assert!(line.runs()[1]
        .item
        .analysis
        .flags
        .contains(AnalysisFlags::IS_ELLIPSIS));
    assert_eq!(line.runs()[0].item.offset, 0);
    let suffix = &line.runs()[2];
    assert_eq!(suffix.item.offset + suffix.item.length, 10);
}

#[test]
fn fitting_line_is_not_ellipsized() {
    let line = ellipsized("abc", EllipsizeMode::End, 100.0);
    assert!(!line.is_ellipsized());
    assert_eq!(line.width(), 30.0);
}

#[test]
fn missing_ellipsis_char_falls_back_to_dots() {
    let font = TestFont::without_chars(&['\u{2026}', '\u{22ef}']);
    let context = LayoutContext::new(Arc::new(TestFontMap::with_default(font)));
    let mut breaker = LineBreaker::new(context);
    breaker.add_text("abcdefghij", None);
    let line = breaker
        .next_line(0.0, 60.0, WrapMode::Word, EllipsizeMode::End)
        .unwrap();
    assert!(line.is_ellipsized());
    let ellipsis = line
        .runs()
        .iter()
        .find(|run| run.item.analysis.flags.contains(AnalysisFlags::IS_ELLIPSIS))
        .unwrap();
    // ASCII "..." shapes to three glyphs forming one cluster.
    assert_eq!(ellipsis.glyphs.len(), 3);
    assert!(ellipsis.glyphs.glyphs[0].is_cluster_start);
    assert!(!ellipsis.glyphs.glyphs[1].is_cluster_start);
    assert!(line.width() <= 60.0);
}

#[test]
fn wide_gap_start_prefers_midline_ellipsis() {
    // CJK text: each char is 20 units wide.
    let line = ellipsized("\u{4e00}\u{4e8c}\u{4e09}\u{56db}\u{4e94}", EllipsizeMode::End, 60.0);
    assert!(line.is_ellipsized());
    let ellipsis = line
        .runs()
        .iter()
        .find(|run| run.item.analysis.flags.contains(AnalysisFlags::IS_ELLIPSIS))
        .unwrap();
    // U+22EF midline ellipsis; the test font maps glyph ids to code points.
    assert_eq!(ellipsis.glyphs.glyphs[0].glyph, 0x22ef);
}

#[test]
fn ellipsis_absorbs_residual_width() {
    // Goal width falls between cluster boundaries; the final glyph absorbs
    // the residue so the line width matches the goal.
    let line = ellipsized("abcdefghij", EllipsizeMode::End, 45.0);
    assert!(line.is_ellipsized());
    assert_eq!(line.width(), 45.0);
}
