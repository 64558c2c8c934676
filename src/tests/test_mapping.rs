// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::wrap_lines;

#[test]
fn index_to_x_walks_the_line() {
    let lines = wrap_lines("abc", -1.0);
    let line = &lines[0];
    assert_eq!(line.index_to_x(0, false), 0.0);
    assert_eq!(line.index_to_x(1, false), 10.0);
    assert_eq!(line.index_to_x(2, false), 20.0);
    assert_eq!(line.index_to_x(2, true), 30.0);
}

#[test]
fn x_to_index_inverts_index_to_x_on_cluster_boundaries() {
    let lines = wrap_lines("Hello World", -1.0);
    let line = &lines[0];
    for (index, _) in "Hello World".char_indices() {
        let x = line.index_to_x(index, false);
        let (back, _) = line.x_to_index(x);
        assert_eq!(back, index, "round trip through x = {x}");
    }
}

#[test]
fn x_to_index_resolves_halves() {
    let lines = wrap_lines("ab", -1.0);
    let line = &lines[0];
    let (index, trailing) = line.x_to_index(3.0);
    assert_eq!((index, trailing), (0, 0));
    let (index, trailing) = line.x_to_index(7.0);
    assert_eq!((index, trailing), (0, 1));
    let (index, trailing) = line.x_to_index(13.0);
    assert_eq!((index, trailing), (1, 0));
}

#[test]
fn x_outside_line_clamps_to_edges() {
    let lines = wrap_lines("ab", -1.0);
    let line = &lines[0];
    let (index, _) = line.x_to_index(-5.0);
    assert_eq!(index, 0);
    let (index, trailing) = line.x_to_index(500.0);
    assert_eq!(index, 1);
    assert_eq!(trailing, 1);
}

#[test]
fn mapping_within_multibyte_text() {
    // Hebrew: 2-byte chars, RTL storage.
    let text = "\u{05d0}\u{05d1}\u{05d2}";
    let lines = wrap_lines(text, -1.0);
    let line = &lines[0];
    // Logical first char sits at the visual right.
    assert_eq!(line.index_to_x(0, false), 30.0);
    assert_eq!(line.index_to_x(0, true), 20.0);
    assert_eq!(line.index_to_x(4, false), 10.0);
    // Round trip on each char start. In RTL a boundary resolves as the
    // trailing edge of the previous character; fold the trailing count back
    // in before comparing.
    for (index, _) in text.char_indices() {
        let x = line.index_to_x(index, false);
        let (back, trailing) = line.x_to_index(x);
        let resolved = if trailing > 0 {
            text[back..]
                .char_indices()
                .nth(trailing)
                .map(|(byte, _)| back + byte)
                .unwrap_or(text.len())
        } else {
            back
        };
        assert_eq!(resolved, index, "round trip through x = {x}");
    }
}

#[test]
fn cluster_interpolation_divides_evenly() {
    // Combining mark joins the base character's cluster.
    let text = "e\u{0301}x";
    let lines = wrap_lines(text, -1.0);
    let line = &lines[0];
    // Cluster "e%CC%81" is 10 units over 2 chars; the mark's offset
    // interpolates to the middle.
    assert_eq!(line.index_to_x(0, false), 0.0);
    assert_eq!(line.index_to_x(1, false), 5.0);
    assert_eq!(line.index_to_x(3, false), 10.0);
}
