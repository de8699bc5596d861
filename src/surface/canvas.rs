//! CPU drawing target backed by a `tiny_skia::Pixmap`.
//!
//! The pixmap is premultiplied. Every primitive blends source-over onto a
//! buffer that starts opaque, so the bytes handed to the GPU are plain RGBA8.

use std::path::Path;

use glam::Vec2;
use image::RgbaImage;
use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, LinearGradient, Paint, PathBuilder, Pixmap, Point,
    RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform,
};

use super::{Stop, Surface};
use crate::color::Rgba;
use crate::{Result, VisualizerError};

/// Software drawing target; its buffer is what gets presented or saved.
pub struct Canvas {
    pixmap: Pixmap,
}

fn skia_color(c: Rgba) -> Color {
    Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        c.a.clamp(0.0, 1.0),
    )
    .unwrap_or(Color::TRANSPARENT)
}

fn point(v: Vec2) -> Point {
    Point::from_xy(v.x, v.y)
}

fn gradient_stops(stops: &[Stop]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|&(offset, color)| GradientStop::new(offset, skia_color(color)))
        .collect()
}

/// Solid paint used when a gradient degenerates.
fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint
}

fn shaded(shader: Option<Shader<'static>>, fallback: Rgba) -> Paint<'static> {
    match shader {
        Some(shader) => Paint {
            shader,
            ..Paint::default()
        },
        None => solid(fallback),
    }
}

fn last_color(stops: &[Stop]) -> Rgba {
    stops.last().map(|s| s.1).unwrap_or(Rgba::TRANSPARENT)
}

impl Canvas {
    /// Fails when either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or(VisualizerError::SurfaceUnavailable { width, height })?;
        pixmap.fill(Color::BLACK);
        Ok(Self { pixmap })
    }

    /// Reallocate the buffer. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Canvas::new(width, height)?;
        Ok(())
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let Some(px) = self.pixmap.pixel(x, y) else {
            return Rgba::TRANSPARENT;
        };
        let c = px.demultiply();
        Rgba::new(
            c.red() as f32 / 255.0,
            c.green() as f32 / 255.0,
            c.blue() as f32 / 255.0,
            c.alpha() as f32 / 255.0,
        )
    }

    /// Straight-alpha copy of the buffer.
    pub fn to_image(&self) -> RgbaImage {
        let raw = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), raw)
            .unwrap_or_else(|| RgbaImage::new(self.pixmap.width(), self.pixmap.height()))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_image().save(path)?;
        Ok(())
    }

    fn full_rect(&self) -> Option<Rect> {
        Rect::from_xywh(
            0.0,
            0.0,
            self.pixmap.width() as f32,
            self.pixmap.height() as f32,
        )
    }

    fn fill_circle_with(&mut self, center: Vec2, radius: f32, paint: &Paint<'_>) {
        if !(radius > 0.0 && center.is_finite()) {
            return;
        }
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.pixmap
                .fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Round-capped segment stroked with `paint`.
    fn stroke_segment(&mut self, from: Vec2, to: Vec2, width: f32, paint: &Paint<'_>) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, paint, &stroke, Transform::identity(), None);
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self, color: Rgba) {
        self.pixmap.fill(skia_color(color));
    }

    fn fill(&mut self, color: Rgba) {
        if let Some(rect) = self.full_rect() {
            self.pixmap
                .fill_rect(rect, &solid(color), Transform::identity(), None);
        }
    }

    fn fill_linear_gradient(&mut self, from: Vec2, to: Vec2, stops: &[Stop]) {
        let Some(rect) = self.full_rect() else {
            return;
        };
        let shader = LinearGradient::new(
            point(from),
            point(to),
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        );
        let paint = shaded(shader, last_color(stops));
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.fill_circle_with(center, radius, &solid(color));
    }

    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, stops: &[Stop]) {
        if !(radius > 0.0 && center.is_finite()) {
            return;
        }
        let shader = RadialGradient::new(
            point(center),
            point(center),
            radius,
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        );
        let paint = shaded(shader, last_color(stops));
        self.fill_circle_with(center, radius, &paint);
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        if !(radius > 0.0 && width > 0.0 && center.is_finite()) {
            return;
        }
        let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, from_color: Rgba, to_color: Rgba) {
        if !(width > 0.0 && from.is_finite() && to.is_finite()) {
            return;
        }
        let shader = LinearGradient::new(
            point(from),
            point(to),
            vec![
                GradientStop::new(0.0, skia_color(from_color)),
                GradientStop::new(1.0, skia_color(to_color)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );
        let paint = shaded(shader, from_color);
        self.stroke_segment(from, to, width, &paint);
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.len() < 2 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(first.x, first.y);
        for p in rest {
            pb.line_to(p.x, p.y);
        }
        pb.close();
        if let Some(path) = pb.finish() {
            self.pixmap.fill_path(
                &path,
                &solid(color),
                FillRule::EvenOdd,
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_bar(&mut self, top_left: Vec2, size: Vec2, bottom: Rgba, top: Rgba) {
        if !(size.x > 0.0 && size.y > 0.0 && top_left.is_finite()) {
            return;
        }
        let radius = (size.x * 0.5).min(size.y * 0.5);
        let cx = top_left.x + size.x * 0.5;
        let base = top_left.y + size.y;

        let shader = LinearGradient::new(
            Point::from_xy(cx, base),
            Point::from_xy(cx, top_left.y),
            vec![
                GradientStop::new(0.0, skia_color(bottom)),
                GradientStop::new(1.0, skia_color(top)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );
        let paint = shaded(shader, top);

        let a = Vec2::new(cx, top_left.y + radius);
        let b = Vec2::new(cx, base - radius);
        if b.y - a.y <= f32::EPSILON {
            self.fill_circle_with(Vec2::new(cx, top_left.y + size.y * 0.5), radius, &paint);
        } else {
            self.stroke_segment(a, b, radius * 2.0, &paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

    #[test]
    fn test_zero_size_is_unavailable() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(VisualizerError::SurfaceUnavailable { width: 0, height: 10 })
        ));
        assert!(Canvas::new(4, 4).is_ok());
    }

    #[test]
    fn test_new_canvas_is_opaque_black() {
        let canvas = Canvas::new(3, 3).unwrap();
        assert!(canvas.as_raw().chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_fill_circle_covers_center_only() {
        let mut canvas = Canvas::new(32, 32).unwrap();
        canvas.fill_circle(Vec2::new(16.0, 16.0), 5.0, RED);

        assert_eq!(canvas.pixel(16, 16).r, 1.0);
        assert_eq!(canvas.pixel(0, 0).r, 0.0);
        assert_eq!(canvas.pixel(16, 16).a, 1.0);
    }

    #[test]
    fn test_half_alpha_blends_over_black() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.fill(RED.fade(0.5));
        let px = canvas.pixel(1, 1);
        assert!((px.r - 0.5).abs() < 0.02);
        assert_eq!(px.a, 1.0);
    }

    #[test]
    fn test_shapes_outside_bounds_are_ignored() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        canvas.fill_circle(Vec2::new(-100.0, -100.0), 3.0, RED);
        canvas.stroke_line(
            Vec2::new(f32::NAN, 0.0),
            Vec2::new(4.0, 4.0),
            2.0,
            RED,
            RED,
        );
        assert!(canvas.as_raw().chunks(4).all(|px| px[0] == 0));
    }

    #[test]
    fn test_polygon_fill() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        let square = [
            Vec2::new(2.0, 2.0),
            Vec2::new(8.0, 2.0),
            Vec2::new(8.0, 8.0),
            Vec2::new(2.0, 8.0),
        ];
        canvas.fill_polygon(&square, RED);
        assert_eq!(canvas.pixel(5, 5).r, 1.0);
        assert_eq!(canvas.pixel(9, 9).r, 0.0);
    }

    #[test]
    fn test_linear_gradient_spans_surface() {
        let mut canvas = Canvas::new(64, 4).unwrap();
        let white = Rgba::new(1.0, 1.0, 1.0, 1.0);
        canvas.fill_linear_gradient(
            Vec2::ZERO,
            Vec2::new(64.0, 0.0),
            &[(0.0, Rgba::new(0.0, 0.0, 0.0, 1.0)), (1.0, white)],
        );
        assert!(canvas.pixel(2, 1).r < 0.1);
        assert!(canvas.pixel(61, 1).r > 0.9);
    }

    #[test]
    fn test_bar_gradient_runs_bottom_to_top() {
        let mut canvas = Canvas::new(10, 40).unwrap();
        let blue = Rgba::new(0.0, 0.0, 1.0, 1.0);
        canvas.fill_bar(Vec2::new(0.0, 0.0), Vec2::new(10.0, 40.0), RED, blue);

        let low = canvas.pixel(5, 34);
        let high = canvas.pixel(5, 6);
        assert!(low.r > high.r);
        assert!(high.b > low.b);
    }

    #[test]
    fn test_saved_image_matches_buffer() {
        let mut canvas = Canvas::new(6, 6).unwrap();
        canvas.clear(Rgba::new(0.2, 0.4, 0.6, 1.0));
        let img = canvas.to_image();
        assert_eq!(img.dimensions(), (6, 6));
        assert_eq!(img.as_raw().as_slice(), canvas.as_raw());
    }
}
