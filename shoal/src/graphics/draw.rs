use macroquad::{shapes::*, text, window};

use super::{Color, Rect, Renderer, TransformStack, Vec2};

/// Draws straight to the macroquad window.
pub struct Canvas {
    stack: TransformStack,
    size: Vec2,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            stack: TransformStack::default(),
            size: Vec2::new(window::screen_width(), window::screen_height()),
        }
    }
}

impl Renderer for Canvas {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fit_to_screen(&mut self) {
        self.size = Vec2::new(window::screen_width(), window::screen_height());
        // a frame always starts from identity, even if a link forgot to restore
        self.stack.reset();
    }

    fn clear(&mut self, color: Color) {
        window::clear_background(color);
    }

    fn save(&mut self) {
        self.stack.save();
    }

    fn restore(&mut self) {
        self.stack.restore();
    }

    fn translate(&mut self, by: Vec2) {
        self.stack.current.translate(by);
    }

    fn scale(&mut self, factor: f32) {
        self.stack.current.scale(factor);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.stack.current.alpha = alpha;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let t = self.stack.current;
        let rect = t.apply_rect(rect);
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, t.tint(color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let t = self.stack.current;
        let center = t.apply(center);
        draw_circle(center.x, center.y, t.apply_len(radius), t.tint(color));
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, thickness: f32, color: Color) {
        let t = self.stack.current;
        let center = t.apply(center);
        draw_circle_lines(
            center.x,
            center.y,
            t.apply_len(radius),
            t.apply_len(thickness),
            t.tint(color),
        );
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        let t = self.stack.current;
        let (from, to) = (t.apply(from), t.apply(to));
        draw_line(from.x, from.y, to.x, to.y, t.apply_len(thickness), t.tint(color));
    }

    fn fill_text(&mut self, string: &str, at: Vec2, size: f32, color: Color) {
        let t = self.stack.current;
        let params = text::TextParams {
            font_size: t.apply_len(size).round().max(1.0) as u16,
            color: t.tint(color),
            ..Default::default()
        };
        let mut pos = t.apply(at);
        pos.y += t.apply_len(size);
        text::draw_text_ex(string, pos.x, pos.y, params);
    }
}
