// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{breaker_for, collect_lines};
use crate::tabs::{TabAlign, TabArray, TabStop};
use crate::{EllipsizeMode, WrapMode};

fn layout_with_tabs(text: &str, tabs: Option<&TabArray>) -> crate::Line {
    let mut breaker = breaker_for(text, None);
    breaker.set_tabs(tabs);
    let mut lines = collect_lines(&mut breaker, -1.0, WrapMode::Word, EllipsizeMode::None);
    assert_eq!(lines.len(), 1);
    lines.remove(0)
}

#[test]
fn default_tab_advances_to_next_stop() {
    // Default tabs are every 8 spaces = 80 units. "abc" is 30 wide, so the
    // tab advance is 50.
    let line = layout_with_tabs("abc\tdef", None);
    assert_eq!(line.runs().len(), 3);
    let tab_run = &line.runs()[1];
    assert_eq!(tab_run.glyphs.len(), 1);
    assert_eq!(tab_run.glyphs.glyphs[0].width, 50.0);
    assert_eq!(line.width(), 30.0 + 50.0 + 30.0);
}

#[test]
fn text_at_default_stop_skips_to_the_following_one() {
    // Text reaching the stop exactly moves to the stop after; default stops
    // keep at least a space width of distance.
    let line = layout_with_tabs("abcdefgh\ti", None);
    let tab_run = &line.runs()[1];
    // 8 chars = 80 sits on the first stop; the tab reaches 160.
    assert_eq!(tab_run.glyphs.glyphs[0].width, 80.0);
}

#[test]
fn right_aligned_tab_places_right_edge_at_stop() {
    let mut tabs = TabArray::new(false);
    tabs.push(TabStop::new(100.0, TabAlign::Right));
    let line = layout_with_tabs("a\tbc", Some(&tabs));
    let tab_run = &line.runs()[1];
    // "bc" is 20 wide; its right edge sits at 100.
    assert_eq!(tab_run.glyphs.glyphs[0].width, 70.0);
    assert_eq!(line.width(), 100.0);
}

#[test]
fn center_aligned_tab_centers_following_run() {
    let mut tabs = TabArray::new(false);
    tabs.push(TabStop::new(100.0, TabAlign::Center));
    let line = layout_with_tabs("a\tbc", Some(&tabs));
    let tab_run = &line.runs()[1];
    // The center of "bc" (20 wide) sits at 100: 10 + 80 + 10 = 100.
    assert_eq!(tab_run.glyphs.glyphs[0].width, 80.0);
}

#[test]
fn decimal_tab_aligns_decimal_point() {
    let mut tabs = TabArray::new(false);
    tabs.push(TabStop::new(100.0, TabAlign::Decimal));
    let line = layout_with_tabs("a\t12.5", Some(&tabs));
    let tab_run = &line.runs()[1];
    // Prefix up to the middle of "." is 25; tab = 100 - 10 - 25 = 65.
    assert_eq!(tab_run.glyphs.glyphs[0].width, 65.0);
}

#[test]
fn tab_advance_is_never_negative() {
    let mut tabs = TabArray::new(false);
    tabs.push(TabStop::new(15.0, TabAlign::Right));
    // The following run is far wider than the stop allows.
    let line = layout_with_tabs("a\twide", Some(&tabs));
    let tab_run = &line.runs()[1];
    assert!(tab_run.glyphs.glyphs[0].width >= 0.0);
}

#[test]
fn stops_extrapolate_by_last_gap() {
    let mut tabs = TabArray::new(false);
    tabs.push(TabStop::new(40.0, TabAlign::Left));
    tabs.push(TabStop::new(100.0, TabAlign::Left));
    // Third tab: extrapolated to 160 by repeating the 60-unit gap.
    let line = layout_with_tabs("a\tb\tc\td", Some(&tabs));
    let widths: Vec<f32> = line
        .runs()
        .iter()
        .map(|run| run.glyphs.glyphs[0].width)
        .collect();
    // Runs: a, tab(40-10), b, tab(100-50), c, tab(160-110), d.
    assert_eq!(widths[1], 30.0);
    assert_eq!(widths[3], 50.0);
    assert_eq!(widths[5], 50.0);
}

#[test]
fn second_tab_continues_from_previous_stop() {
    let line = layout_with_tabs("a\tb\tc", None);
    // Stops at 80 and 160.
    assert_eq!(line.width(), 160.0 + 10.0);
}
