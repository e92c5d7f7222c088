//! Bullets
//!
//! A bullet is an entity with its firearm's drag. It has no behavior of its
//! own beyond the shared integration and leaves the world once it has
//! slowed down to a crawl.

use super::draw::{DrawTarget, Drawable};
use super::entity::DEFAULT_SPEED_LOSS;
use macroquad::color::Color;
use macroquad::math::Vec2;

/// Speed below which a bullet is removed
pub const MIN_BULLET_SPEED: f32 = 0.5;

const BULLET_RADIUS: f32 = 2.0;
const BULLET_COLOR: Color = Color::new(1.0, 0.85, 0.3, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    /// Fraction of velocity lost per tick
    pub speed_loss: f32,
}

impl Default for Bullet {
    fn default() -> Self {
        Self {
            speed_loss: DEFAULT_SPEED_LOSS,
        }
    }
}

impl Drawable for Bullet {
    fn draw(&self, at: Vec2, target: &mut dyn DrawTarget) {
        target.circle(at, BULLET_RADIUS, BULLET_COLOR);
    }
}
