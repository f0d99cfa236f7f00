use super::{Color, Rect, Renderer, TransformStack, Vec2};

/// A draw call as it would have reached the screen, with the transform already applied.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear(Color),
    Rect(Rect, Color),
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    CircleOutline {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Line(Vec2, Vec2, Color),
    Text(String, Vec2, Color),
}

/// Windowless renderer that remembers every draw call.
#[derive(Clone, Debug)]
pub struct Recorder {
    pub ops: Vec<DrawOp>,
    size: Vec2,
    stack: TransformStack,
    frames: usize,
}

impl Recorder {
    pub fn new(size: Vec2) -> Self {
        Self {
            ops: Vec::new(),
            size,
            stack: TransformStack::default(),
            frames: 0,
        }
    }

    /// Number of times the surface was fitted, i.e. frames that got to the draw step.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Text of every `fill_text` call so far.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(s, _, _) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> Vec<(Vec2, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Circle { center, radius, .. } => Some((*center, *radius)),
                _ => None,
            })
            .collect()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(Vec2::new(1024.0, 768.0))
    }
}

impl Renderer for Recorder {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fit_to_screen(&mut self) {
        self.frames += 1;
        self.stack.reset();
        self.ops.clear();
    }

    fn clear(&mut self, color: Color) {
        self.ops.push(DrawOp::Clear(color));
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
        self.ops.push(DrawOp::Rect(t.apply_rect(rect), t.tint(color)));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let t = self.stack.current;
        self.ops.push(DrawOp::Circle {
            center: t.apply(center),
            radius: t.apply_len(radius),
            color: t.tint(color),
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, _thickness: f32, color: Color) {
        let t = self.stack.current;
        self.ops.push(DrawOp::CircleOutline {
            center: t.apply(center),
            radius: t.apply_len(radius),
            color: t.tint(color),
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, _thickness: f32, color: Color) {
        let t = self.stack.current;
        self.ops
            .push(DrawOp::Line(t.apply(from), t.apply(to), t.tint(color)));
    }

    fn fill_text(&mut self, text: &str, at: Vec2, _size: f32, color: Color) {
        let t = self.stack.current;
        self.ops
            .push(DrawOp::Text(text.to_string(), t.apply(at), t.tint(color)));
    }
}
