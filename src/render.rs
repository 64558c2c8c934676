// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rendering collaborator interface.
//!
//! Lineflow does not rasterize anything. A backend implements [`Renderer`]'s
//! primitives (glyphs and trapezoids at minimum); the provided methods build
//! decorated line rendering on top, decomposing rectangles into trapezoids
//! and the error underline into a sawtooth in a rotated frame.

use crate::attrs::{AttrType, AttrValue, Color, LineStyle};
use crate::font::{FontRef, Rect};
use crate::glyph::{Glyph, GlyphItem, GlyphString};
use crate::line::Line;

/// The part of a rendering being drawn, for color and state selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPart {
    Foreground,
    Background,
    Underline,
    Overline,
    Strikethrough,
}

/// Decorations resolved for one run from its render attributes.
#[derive(Clone, Debug, Default)]
struct RunDecorations {
    foreground: Option<Color>,
    background: Option<Color>,
    underline: LineStyle,
    underline_color: Option<Color>,
    overline: LineStyle,
    overline_color: Option<Color>,
    strikethrough: bool,
    strikethrough_color: Option<Color>,
}

fn resolve_decorations(run: &GlyphItem) -> RunDecorations {
    let mut deco = RunDecorations::default();
    for attr in &run.item.analysis.extra_attrs {
        let color = match attr.value() {
            AttrValue::Color(color) => Some(*color),
            _ => None,
        };
        match attr.attr_type() {
            AttrType::FOREGROUND => deco.foreground = color,
            AttrType::BACKGROUND => deco.background = color,
            AttrType::UNDERLINE => deco.underline = LineStyle::from_raw(attr.int_value()),
            AttrType::UNDERLINE_COLOR => deco.underline_color = color,
            AttrType::OVERLINE => deco.overline = LineStyle::from_raw(attr.int_value()),
            AttrType::OVERLINE_COLOR => deco.overline_color = color,
            AttrType::STRIKETHROUGH => deco.strikethrough = attr.bool_value(),
            AttrType::STRIKETHROUGH_COLOR => deco.strikethrough_color = color,
            _ => {}
        }
    }
    deco
}

/// Error underlines are drawn as rectangles in a frame rotated so the zigzag
/// is axis aligned; the long side of each unit is `HEIGHT_SQUARES * square`
/// where `square = height / HEIGHT_SQUARES`. The value 2.5 looks better than
/// either 3 (long and skinny) or 2 (short and stubby).
const HEIGHT_SQUARES: f32 = 2.5;

/// A 2×2 transform plus translation, used by the default error underline to
/// rotate its axis-aligned sawtooth into place.
#[derive(Clone, Copy, Debug)]
struct Matrix {
    xx: f32,
    xy: f32,
    yx: f32,
    yy: f32,
    x0: f32,
    y0: f32,
}

impl Matrix {
    fn transform(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.xx * x + self.xy * y + self.x0,
            self.yx * x + self.yy * y + self.y0,
        )
    }
}

/// A renderer vtable.
///
/// `draw_trapezoid` and `draw_glyphs` are the required primitives; all other
/// drawing has default implementations in terms of them. Trapezoids have
/// horizontal parallel edges: `(y1, x11..x21)` on top, `(y2, x12..x22)` on
/// the bottom.
pub trait Renderer {
    /// Draws a glyph string with its baseline origin at (x, y).
    fn draw_glyphs(&mut self, font: Option<&FontRef>, glyphs: &GlyphString, x: f32, y: f32);

    fn draw_trapezoid(
        &mut self,
        part: RenderPart,
        y1: f32,
        x11: f32,
        x21: f32,
        y2: f32,
        x12: f32,
        x22: f32,
    );

    /// Called before any drawing for a line batch.
    fn begin(&mut self) {}

    /// Called after a line batch.
    fn end(&mut self) {}

    /// The color (or None for the default) to use for `part` changed.
    fn set_color(&mut self, part: RenderPart, color: Option<Color>) {
        let _ = (part, color);
    }

    /// Notifies that non-color state of `part` changed; backends that batch
    /// geometry per part flush here.
    fn part_changed(&mut self, part: RenderPart) {
        let _ = part;
    }

    /// Draws a single glyph; the default routes through a one-glyph string.
    fn draw_glyph(&mut self, font: Option<&FontRef>, glyph: Glyph, x: f32, y: f32) {
        let mut glyphs = GlyphString::new();
        glyphs.set_size(1);
        glyphs.glyphs[0].glyph = glyph;
        glyphs.glyphs[0].is_cluster_start = true;
        self.draw_glyphs(font, &glyphs, x, y);
    }

    /// Draws an axis-aligned rectangle, decomposed into two trapezoids.
    fn draw_rectangle(&mut self, part: RenderPart, x: f32, y: f32, width: f32, height: f32) {
        let mid = y + height / 2.0;
        self.draw_trapezoid(part, y, x, x + width, mid, x, x + width);
        self.draw_trapezoid(part, mid, x, x + width, y + height, x, x + width);
    }

    /// Draws a run's shaped glyphs. `text` is the run's source text, for
    /// backends that render text rather than glyphs.
    fn draw_run(&mut self, text: &str, run: &GlyphItem, x: f32, y: f32) {
        let _ = text;
        self.draw_glyphs(run.item.analysis.font.as_ref(), &run.glyphs, x, y);
    }

    /// Draws a decoration line of the given style.
    fn draw_styled_line(
        &mut self,
        part: RenderPart,
        style: LineStyle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) {
        match style {
            LineStyle::None => {}
            LineStyle::Single | LineStyle::Low => {
                self.draw_rectangle(part, x, y, width, height);
            }
            LineStyle::Double => {
                self.draw_rectangle(part, x, y, width, height);
                self.draw_rectangle(part, x, y + 2.0 * height, width, height);
            }
            LineStyle::Error => self.draw_error_underline(x, y, width, height * HEIGHT_SQUARES),
        }
    }

    /// Draws a squiggly line approximately covering the given rectangle, in
    /// the style of an underline indicating a spelling error. The width is
    /// rounded to an integer number of up/down segments and the result is
    /// centered in the given rectangle.
    fn draw_error_underline(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let square = height / HEIGHT_SQUARES;
        let unit_width = (HEIGHT_SQUARES - 1.0) * square;
        let width_units = ((width + unit_width / 2.0) / unit_width).floor().max(1.0);
        let x = x + (width - width_units * unit_width) / 2.0;

        // The local frame maps the axis-aligned sawtooth rectangles onto
        // 45° diagonals of `square`-sized cells.
        let scale = 0.5 * square;
        let mut matrix = Matrix {
            xx: scale,
            xy: -scale,
            yx: scale,
            yy: scale,
            x0: x,
            y0: y,
        };
        let dx = unit_width * 2.0;

        let mut i = (width_units as i32 - 1) / 2;
        loop {
            // Stroke A: the long rising edge.
            draw_rotated_rectangle(
                self,
                RenderPart::Underline,
                &matrix,
                0.0,
                0.0,
                HEIGHT_SQUARES * 2.0 - 1.0,
                1.0,
            );
            if i <= 0 {
                break;
            }
            i -= 1;
            // Stroke B: the short falling edge joining the next unit.
            draw_rotated_rectangle(
                self,
                RenderPart::Underline,
                &matrix,
                HEIGHT_SQUARES * 2.0 - 2.0,
                -(HEIGHT_SQUARES * 2.0 - 3.0),
                1.0,
                HEIGHT_SQUARES * 2.0 - 3.0,
            );
            matrix.x0 += dx;
        }
    }

    /// Draws the extents of a shaped placeholder; backends with custom
    /// inline objects override this.
    fn draw_shape(&mut self, ink: &Rect, logical: &Rect, x: f32, y: f32) {
        let _ = ink;
        self.draw_rectangle(
            RenderPart::Foreground,
            x + logical.x,
            y + logical.y,
            logical.width,
            logical.height,
        );
    }

    /// Draws a positioned line with its decorations: backgrounds first, then
    /// glyphs, then underlines, overlines and strikethroughs from each run's
    /// render attributes. (x, y) is the leftmost point of the baseline.
    fn draw_line(&mut self, line: &Line, x: f32, y: f32) {
        self.begin();

        let mut run_x = x;
        for run in line.runs() {
            let width = run.width();
            let deco = resolve_decorations(run);
            let metrics = run
                .item
                .analysis
                .font
                .as_ref()
                .map(|font| font.metrics(run.item.analysis.language))
                .unwrap_or_default();
            let run_y = y - run.y_offset;

            if let Some(background) = deco.background {
                self.set_color(RenderPart::Background, Some(background));
                self.part_changed(RenderPart::Background);
                self.draw_rectangle(
                    RenderPart::Background,
                    run_x,
                    run_y - metrics.ascent,
                    width,
                    metrics.ascent + metrics.descent,
                );
            }

            self.set_color(RenderPart::Foreground, deco.foreground);
            self.part_changed(RenderPart::Foreground);
            let text = &line.paragraph_text()[run.item.offset..run.item.offset + run.item.length];
            self.draw_run(text, run, run_x + run.start_x_offset, run_y);

            if deco.underline != LineStyle::None {
                self.set_color(
                    RenderPart::Underline,
                    deco.underline_color.or(deco.foreground),
                );
                self.part_changed(RenderPart::Underline);
                let offset = match deco.underline {
                    LineStyle::Low => metrics.underline_position - metrics.descent,
                    _ => metrics.underline_position,
                };
                self.draw_styled_line(
                    RenderPart::Underline,
                    deco.underline,
                    run_x,
                    run_y - offset,
                    width,
                    metrics.underline_thickness,
                );
            }

            if deco.overline != LineStyle::None {
                self.set_color(
                    RenderPart::Overline,
                    deco.overline_color.or(deco.foreground),
                );
                self.part_changed(RenderPart::Overline);
                self.draw_styled_line(
                    RenderPart::Overline,
                    deco.overline,
                    run_x,
                    run_y - metrics.ascent,
                    width,
                    metrics.underline_thickness,
                );
            }

            if deco.strikethrough {
                self.set_color(
                    RenderPart::Strikethrough,
                    deco.strikethrough_color.or(deco.foreground),
                );
                self.part_changed(RenderPart::Strikethrough);
                self.draw_rectangle(
                    RenderPart::Strikethrough,
                    run_x,
                    run_y - metrics.strikethrough_position,
                    width,
                    metrics.strikethrough_thickness,
                );
            }

            run_x += width;
        }

        self.end();
    }
}

/// Draws a rectangle under an arbitrary transform, decomposed into
/// trapezoids between its vertically sorted corners: a pure shear is one
/// trapezoid; otherwise a triangle, a middle trapezoid, and a closing
/// triangle.
fn draw_rotated_rectangle<R: Renderer + ?Sized>(
    renderer: &mut R,
    part: RenderPart,
    matrix: &Matrix,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    let mut points = [
        matrix.transform(x, y),
        matrix.transform(x + width, y),
        matrix.transform(x, y + height),
        matrix.transform(x + width, y + height),
    ];
    points.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));

    if points[0].1 == points[1].1 {
        renderer.draw_trapezoid(
            part, points[0].1, points[0].0, points[1].0, points[2].1, points[2].0, points[3].0,
        );
    } else if points[1].0 < points[2].0 {
        let tmp_width =
            (points[2].0 - points[0].0) * (points[1].1 - points[0].1) / (points[2].1 - points[0].1);
        let base_width = tmp_width + points[0].0 - points[1].0;
        renderer.draw_trapezoid(
            part,
            points[0].1,
            points[0].0,
            points[0].0,
            points[1].1,
            points[1].0,
            points[1].0 + base_width,
        );
        renderer.draw_trapezoid(
            part,
            points[1].1,
            points[1].0,
            points[1].0 + base_width,
            points[2].1,
            points[2].0 - base_width,
            points[2].0,
        );
        renderer.draw_trapezoid(
            part,
            points[2].1,
            points[2].0 - base_width,
            points[2].0,
            points[3].1,
            points[3].0,
            points[3].0,
        );
    } else {
        let tmp_width =
            (points[0].0 - points[2].0) * (points[1].1 - points[0].1) / (points[2].1 - points[0].1);
        let base_width = tmp_width + points[1].0 - points[0].0;
        renderer.draw_trapezoid(
            part,
            points[0].1,
            points[0].0,
            points[0].0,
            points[1].1,
            points[1].0 - base_width,
            points[1].0,
        );
        renderer.draw_trapezoid(
            part,
            points[1].1,
            points[1].0 - base_width,
            points[1].0,
            points[2].1,
            points[2].0,
            points[2].0 + base_width,
        );
        renderer.draw_trapezoid(
            part,
            points[2].1,
            points[2].0,
            points[2].0 + base_width,
            points[3].1,
            points[3].0,
            points[3].0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingRenderer {
        trapezoids: Vec<(RenderPart, [f32; 6])>,
        glyph_runs: usize,
    }

    impl Renderer for RecordingRenderer {
        fn draw_glyphs(&mut self, _font: Option<&FontRef>, _glyphs: &GlyphString, _x: f32, _y: f32) {
            self.glyph_runs += 1;
        }

        fn draw_trapezoid(
            &mut self,
            part: RenderPart,
            y1: f32,
            x11: f32,
            x21: f32,
            y2: f32,
            x12: f32,
            x22: f32,
        ) {
            self.trapezoids.push((part, [y1, x11, x21, y2, x12, x22]));
        }
    }

    #[test]
    fn rectangle_decomposes_into_two_trapezoids() {
        let mut renderer = RecordingRenderer::default();
        renderer.draw_rectangle(RenderPart::Background, 0.0, 0.0, 10.0, 4.0);
        assert_eq!(renderer.trapezoids.len(), 2);
        let (_, top) = renderer.trapezoids[0];
        assert_eq!(top, [0.0, 0.0, 10.0, 2.0, 0.0, 10.0]);
    }

    #[test]
    fn error_underline_emits_sawtooth() {
        let mut renderer = RecordingRenderer::default();
        renderer.draw_error_underline(0.0, 0.0, 60.0, 5.0);
        // Multiple units, each stroke decomposed into trapezoids.
        assert!(renderer.trapezoids.len() >= 4);
        assert!(renderer
            .trapezoids
            .iter()
            .all(|(part, _)| *part == RenderPart::Underline));
    }
}
