//! Drawing
//!
//! Entities and banners draw through `DrawTarget` instead of calling
//! macroquad directly, so the world can be drawn (and tested) without a
//! window. `ScreenTarget` is the real thing.

use macroquad::prelude::*;

/// Minimal vector drawing surface
pub trait DrawTarget {
    /// Size of the drawable area in pixels
    fn size(&self) -> Vec2;
    fn circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color);
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    /// Draw `text` with its top-left corner at `at`
    fn text(&mut self, text: &str, at: Vec2, font_size: f32, color: Color);
    fn measure_text(&self, text: &str, font_size: f32) -> Vec2;
}

/// Something that knows how to render itself at a world position
pub trait Drawable {
    fn draw(&self, at: Vec2, target: &mut dyn DrawTarget);
}

/// Draws straight to the macroquad window
pub struct ScreenTarget;

impl DrawTarget for ScreenTarget {
    fn size(&self) -> Vec2 {
        vec2(screen_width(), screen_height())
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        draw_circle(center.x, center.y, radius, color);
    }

    fn line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        draw_line(from.x, from.y, to.x, to.y, thickness, color);
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        draw_rectangle(x, y, w, h, color);
    }

    fn text(&mut self, text: &str, at: Vec2, font_size: f32, color: Color) {
        // macroquad positions text by its baseline
        let dims = measure_text(text, None, font_size as u16, 1.0);
        draw_text(text, at.x, at.y + dims.offset_y, font_size, color);
    }

    fn measure_text(&self, text: &str, font_size: f32) -> Vec2 {
        let dims = measure_text(text, None, font_size as u16, 1.0);
        vec2(dims.width, dims.height)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCall {
    Circle { center: Vec2, radius: f32 },
    Line { from: Vec2, to: Vec2 },
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Text { text: String, at: Vec2 },
}

/// Records calls instead of drawing. Text measures 10px per character and
/// `font_size` tall.
#[cfg(test)]
pub(crate) struct RecordingTarget {
    pub size: Vec2,
    pub calls: Vec<DrawCall>,
}

#[cfg(test)]
impl RecordingTarget {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: vec2(width, height),
            calls: Vec::new(),
        }
    }

    pub fn texts(&self) -> Vec<(&str, Vec2)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, at } => Some((text.as_str(), *at)),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Circle { .. }))
            .count()
    }
}

#[cfg(test)]
impl DrawTarget for RecordingTarget {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn circle(&mut self, center: Vec2, radius: f32, _color: Color) {
        self.calls.push(DrawCall::Circle { center, radius });
    }

    fn line(&mut self, from: Vec2, to: Vec2, _thickness: f32, _color: Color) {
        self.calls.push(DrawCall::Line { from, to });
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, _color: Color) {
        self.calls.push(DrawCall::Rect { x, y, w, h });
    }

    fn text(&mut self, text: &str, at: Vec2, _font_size: f32, _color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            at,
        });
    }

    fn measure_text(&self, text: &str, font_size: f32) -> Vec2 {
        vec2(text.chars().count() as f32 * 10.0, font_size)
    }
}
