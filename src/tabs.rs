// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tab stops.

/// Alignment of text at a tab stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TabAlign {
    /// Text starts at the stop.
    #[default]
    Left,
    /// Text ends at the stop.
    Right,
    /// Text is centered on the stop.
    Center,
    /// The first occurrence of the decimal point sits at the stop.
    Decimal,
}

/// A single tab stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabStop {
    pub position: f32,
    pub align: TabAlign,
    /// Decimal point for [`TabAlign::Decimal`]; `None` falls back to the
    /// context's decimal point.
    pub decimal_point: Option<char>,
}

impl TabStop {
    pub fn new(position: f32, align: TabAlign) -> Self {
        Self {
            position,
            align,
            decimal_point: None,
        }
    }

    pub fn with_decimal_point(mut self, decimal_point: char) -> Self {
        self.decimal_point = Some(decimal_point);
        self
    }
}

/// An ordered list of tab stops.
///
/// Positions past the last configured stop are extrapolated by repeating the
/// last gap. Note that tabs and justification conflict with each other:
/// justification will move content away from its tab-aligned positions, as
/// will alignments other than left.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabArray {
    stops: Vec<TabStop>,
    positions_in_pixels: bool,
}

impl TabArray {
    /// Creates an empty array. When `positions_in_pixels` is set, positions
    /// are multiplied by the context scale when resolved.
    pub fn new(positions_in_pixels: bool) -> Self {
        Self {
            stops: Vec::new(),
            positions_in_pixels,
        }
    }

    pub fn positions_in_pixels(&self) -> bool {
        self.positions_in_pixels
    }

    pub fn push(&mut self, stop: TabStop) {
        self.stops.push(stop);
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TabStop> {
        self.stops.get(index)
    }

    /// Sorts stops by position. The line breaker sorts its copy on
    /// [`set_tabs`](crate::LineBreaker::set_tabs).
    pub fn sort(&mut self) {
        self.stops
            .sort_by(|a, b| a.position.total_cmp(&b.position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_orders_by_position() {
        let mut tabs = TabArray::new(false);
        tabs.push(TabStop::new(100.0, TabAlign::Right));
        tabs.push(TabStop::new(50.0, TabAlign::Left));
        tabs.sort();
        assert_eq!(tabs.get(0).unwrap().position, 50.0);
        assert_eq!(tabs.get(1).unwrap().position, 100.0);
    }
}
