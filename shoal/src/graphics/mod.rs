//! # Graphics
//!
//! The draw chain threads a [`Renderer`] through every draw link. It is a small immediate-mode
//! surface with a canvas-like transform stack: links `save`, `translate`/`scale`, draw, and
//! `restore`. Coordinates passed to the primitive draws are in the current transform's space.
//!
//! [`Canvas`] draws to the macroquad window; [`Recorder`] keeps the calls around for tests.

pub mod draw;
pub mod record;

pub use draw::Canvas;
pub use macroquad::{
    color::{colors::*, Color},
    math::{vec2, Rect, Vec2},
};
pub use record::{DrawOp, Recorder};

pub trait Renderer {
    /// Size of the drawing surface in pixels.
    fn size(&self) -> Vec2;

    /// Resizes the surface to match the window. Called once per frame before `clear`.
    fn fit_to_screen(&mut self) {}

    fn clear(&mut self, color: Color);

    /// Pushes the current transform and alpha.
    fn save(&mut self);
    /// Pops what the matching `save` pushed. An unbalanced `restore` resets to identity.
    fn restore(&mut self);
    fn translate(&mut self, by: Vec2);
    fn scale(&mut self, factor: f32);
    fn set_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, thickness: f32, color: Color);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color);
    fn fill_text(&mut self, text: &str, at: Vec2, size: f32, color: Color);
}

/// Current transform of a renderer. Maps `p` to `offset + p * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub offset: Vec2,
    pub scale: f32,
    pub alpha: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            alpha: 1.0,
        }
    }
}

impl Transform {
    pub fn apply(&self, p: Vec2) -> Vec2 {
        self.offset + p * self.scale
    }

    pub fn apply_len(&self, len: f32) -> f32 {
        len * self.scale
    }

    pub fn apply_rect(&self, rect: Rect) -> Rect {
        let at = self.apply(vec2(rect.x, rect.y));
        Rect::new(at.x, at.y, rect.w * self.scale, rect.h * self.scale)
    }

    pub fn tint(&self, color: Color) -> Color {
        Color {
            a: color.a * self.alpha,
            ..color
        }
    }

    pub fn translate(&mut self, by: Vec2) {
        self.offset += by * self.scale;
    }

    pub fn scale(&mut self, factor: f32) {
        self.scale *= factor;
    }
}

/// Transform plus the stack `save`/`restore` walk, shared by both renderers.
#[derive(Clone, Debug, Default)]
pub(crate) struct TransformStack {
    pub(crate) current: Transform,
    saved: Vec<Transform>,
}

impl TransformStack {
    pub(crate) fn save(&mut self) {
        self.saved.push(self.current);
    }

    pub(crate) fn restore(&mut self) {
        self.current = self.saved.pop().unwrap_or_default();
    }

    pub(crate) fn reset(&mut self) {
        self.current = Transform::default();
        self.saved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_is_scaled() {
        let mut t = Transform::default();
        t.translate(vec2(10.0, 0.0));
        t.scale(2.0);
        t.translate(vec2(5.0, 5.0));
        assert_eq!(t.offset, vec2(20.0, 10.0));
        assert_eq!(t.apply(vec2(1.0, 1.0)), vec2(22.0, 12.0));
        assert_eq!(t.apply_len(3.0), 6.0);
    }

    #[test]
    fn test_restore_pops_saved_transform() {
        let mut stack = TransformStack::default();
        stack.current.translate(vec2(1.0, 2.0));
        stack.save();
        stack.current.scale(4.0);
        stack.current.alpha = 0.5;
        stack.restore();
        assert_eq!(stack.current.offset, vec2(1.0, 2.0));
        assert_eq!(stack.current.scale, 1.0);
        assert_eq!(stack.current.alpha, 1.0);

        // unbalanced
        stack.restore();
        assert_eq!(stack.current, Transform::default());
    }
}
