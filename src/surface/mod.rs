//! Drawing surface abstraction used by the visualizers.
//!
//! Coordinates are in pixels with the origin at the top-left corner.
//! Colours are straight-alpha [`Rgba`]; every primitive blends source-over.
//! Gradient stops must be in ascending offset order.

mod canvas;

pub use canvas::Canvas;

use glam::Vec2;

use crate::color::Rgba;

/// Colour stop: offset in [0, 1] and colour.
pub type Stop = (f32, Rgba);

/// 2D immediate-mode drawing target.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Overwrite every pixel.
    fn clear(&mut self, color: Rgba);

    /// Blend `color` over every pixel.
    fn fill(&mut self, color: Rgba);

    /// Blend a linear gradient running from `from` to `to` over the whole
    /// surface.
    fn fill_linear_gradient(&mut self, from: Vec2, to: Vec2, stops: &[Stop]);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, stops: &[Stop]);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba);

    /// Round-capped segment whose colour runs from `from_color` to
    /// `to_color`.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, from_color: Rgba, to_color: Rgba);

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);

    /// Vertical bar with fully rounded ends. `top_left` and `size` give the
    /// bounding box; colour runs from `bottom` to `top`.
    fn fill_bar(&mut self, top_left: Vec2, size: Vec2, bottom: Rgba, top: Rgba);

    fn width(&self) -> f32 {
        self.size().0 as f32
    }

    fn height(&self) -> f32 {
        self.size().1 as f32
    }
}
