// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for layout tests.

use std::sync::Arc;

use crate::testing::TestFontMap;
use crate::{AttrList, EllipsizeMode, LayoutContext, Line, LineBreaker, WrapMode};

pub(crate) fn test_context() -> LayoutContext {
    LayoutContext::new(Arc::new(TestFontMap::new()))
}

pub(crate) fn breaker_for(text: &str, attrs: Option<&AttrList>) -> LineBreaker {
    let mut breaker = LineBreaker::new(test_context());
    breaker.add_text(text, attrs);
    breaker
}

/// Breaks all remaining text at a constant width.
pub(crate) fn collect_lines(
    breaker: &mut LineBreaker,
    width: f32,
    wrap: WrapMode,
    ellipsize: EllipsizeMode,
) -> Vec<Line> {
    let mut lines = Vec::new();
    while breaker.has_line() {
        let line = breaker
            .next_line(0.0, width, wrap, ellipsize)
            .expect("has_line implies a next line");
        lines.push(line);
        assert!(lines.len() < 1000, "runaway line production");
    }
    lines
}

/// Lays out `text` with no attributes and word wrapping.
pub(crate) fn wrap_lines(text: &str, width: f32) -> Vec<Line> {
    let mut breaker = breaker_for(text, None);
    collect_lines(&mut breaker, width, WrapMode::Word, EllipsizeMode::None)
}
