//! The player
//!
//! Input arrives through `EventHandler` and is only recorded there; movement
//! and firearm actions are applied on the next tick, where the world is
//! reachable through the tick context.

use super::draw::{DrawTarget, Drawable};
use super::event::EventHandler;
use super::world::{TickContext, WorldResources};
use crate::firearm::Firearm;
use crate::input::InputEvent;
use macroquad::color::{Color, WHITE};
use macroquad::input::{KeyCode, MouseButton};
use macroquad::math::{vec2, Vec2};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Velocity lost per tick while walking
pub const PLAYER_RESISTANCE: f32 = 0.15;

/// Impulse applied per tick at full acceleration
const MAX_IMPULSE: f32 = 1.0;

const PLAYER_RADIUS: f32 = 10.0;
const PLAYER_COLOR: Color = Color::new(0.35, 0.75, 1.0, 1.0);
const AMMO_COLOR: Color = Color::new(0.95, 0.8, 0.25, 1.0);
const RELOAD_COLOR: Color = Color::new(0.6, 0.6, 0.6, 1.0);
const POPUP_FONT_SIZE: f32 = 16.0;

/// Firearm input waiting for the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirearmAction {
    Trigger,
    Untrigger,
    Reload,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub firearm: Firearm,
    /// Movement speed multiplier from the settings
    speed: f32,
    /// Acceleration gained per tick of held movement
    ramp_step: f32,
    ramp: f32,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    cursor: Vec2,
    actions: Vec<FirearmAction>,
    /// Reload progress as of the last tick
    reload_progress: f32,
    /// Frames the firearm name stays on screen
    popup_ticks: u32,
    /// Shown over the player while reloading
    reloading_label: String,
}

impl Player {
    pub fn new(resources: &WorldResources) -> Self {
        let settings = &resources.player;
        let ramp_ticks = settings.seconds_to_full_speed * resources.fps as f32;

        Self {
            firearm: Firearm::new(Arc::clone(resources.default_firearm())),
            speed: settings.speed,
            ramp_step: if ramp_ticks > 1.0 { 1.0 / ramp_ticks } else { 1.0 },
            ramp: 0.0,
            up: false,
            down: false,
            left: false,
            right: false,
            cursor: Vec2::ZERO,
            actions: Vec::new(),
            reload_progress: 1.0,
            popup_ticks: settings.gun_popup_length.saturating_mul(resources.fps),
            reloading_label: resources.strings.translate("gui.world.text.reloading").to_string(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Frames left on the firearm name popup
    pub fn popup_ticks(&self) -> u32 {
        self.popup_ticks
    }

    pub fn read_from_json(&mut self, resources: &WorldResources, from: &Map<String, Value>) {
        let Some(saved) = from.get("firearm").and_then(Value::as_object) else {
            return;
        };
        match Firearm::from_json(&resources.catalog, saved) {
            Some(firearm) => self.firearm = firearm,
            None => tracing::warn!(firearm = ?saved.get("id"), "unknown firearm in save, keeping default"),
        }
    }

    pub fn write_to_json(&self, into: &mut Map<String, Value>) {
        into.insert("kind".into(), "player".into());
        into.insert("firearm".into(), self.firearm.write_to_json());
    }

    /// Impulse for this tick from the held movement keys
    pub fn movement_impulse(&mut self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.up {
            direction.y -= 1.0;
        }
        if self.down {
            direction.y += 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        if self.right {
            direction.x += 1.0;
        }

        let Some(direction) = direction.try_normalize() else {
            self.ramp = 0.0;
            return Vec2::ZERO;
        };
        self.ramp = (self.ramp + self.ramp_step).min(1.0);
        direction * self.ramp * MAX_IMPULSE
    }

    /// Apply queued firearm input and advance the firearm
    pub fn update(&mut self, ctx: &mut TickContext, pos: Vec2) {
        let aim = self.cursor - pos;
        for action in std::mem::take(&mut self.actions) {
            match action {
                FirearmAction::Trigger => self.firearm.trigger(ctx, pos, aim),
                FirearmAction::Untrigger => self.firearm.untrigger(ctx, pos, aim),
                FirearmAction::Reload => self.firearm.reload(ctx),
            }
        }
        self.firearm.tick(ctx, pos, aim);

        self.reload_progress = self.firearm.progress(ctx.now);
        self.popup_ticks = self.popup_ticks.saturating_sub(1);
    }

    fn set_direction(&mut self, key: KeyCode, held: bool) {
        match key {
            KeyCode::W => self.up = held,
            KeyCode::S => self.down = held,
            KeyCode::A => self.left = held,
            KeyCode::D => self.right = held,
            _ => {}
        }
    }
}

impl EventHandler for Player {
    fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed { key: KeyCode::R, control: false } => {
                self.actions.push(FirearmAction::Reload);
            }
            InputEvent::KeyPressed { key, control: false } => self.set_direction(key, true),
            InputEvent::KeyReleased { key } => self.set_direction(key, false),
            InputEvent::MouseMoved { x, y } => self.cursor = vec2(x, y),
            InputEvent::MouseButtonPressed { button: MouseButton::Left, x, y } => {
                self.cursor = vec2(x, y);
                self.actions.push(FirearmAction::Trigger);
            }
            InputEvent::MouseButtonReleased { button: MouseButton::Left, x, y } => {
                self.cursor = vec2(x, y);
                self.actions.push(FirearmAction::Untrigger);
            }
            _ => {}
        }
    }
}

impl Drawable for Player {
    fn draw(&self, at: Vec2, target: &mut dyn DrawTarget) {
        target.circle(at, PLAYER_RADIUS, PLAYER_COLOR);

        let aim = (self.cursor - at).try_normalize().unwrap_or(Vec2::X);
        target.line(at, at + aim * PLAYER_RADIUS * 2.0, 2.0, PLAYER_COLOR);

        // Ammo (and reload) bars under the player
        let width = PLAYER_RADIUS * 2.0;
        let bar_x = at.x - PLAYER_RADIUS;
        let bar_y = at.y + PLAYER_RADIUS + 4.0;
        target.rect(bar_x, bar_y, width * (1.0 - self.firearm.depletion()), 3.0, AMMO_COLOR);
        if self.firearm.is_reloading() {
            target.rect(bar_x, bar_y + 4.0, width * self.reload_progress, 3.0, RELOAD_COLOR);
        }

        // The reload notice takes the popup's place above the player
        let label = if self.firearm.is_reloading() {
            Some(self.reloading_label.as_str())
        } else if self.popup_ticks > 0 {
            Some(self.firearm.name())
        } else {
            None
        };
        if let Some(label) = label {
            let size = target.measure_text(label, POPUP_FONT_SIZE);
            let at = vec2(at.x - size.x / 2.0, at.y - PLAYER_RADIUS - 6.0 - size.y);
            target.text(label, at, POPUP_FONT_SIZE, WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerSettings;
    use crate::game::draw::{DrawCall, RecordingTarget};
    use crate::game::world::{test_resources_with, TickHarness};
    use std::time::Instant;

    fn player(settings: PlayerSettings) -> Player {
        Player::new(&test_resources_with(settings, std::env::temp_dir()))
    }

    #[test]
    fn test_acceleration_ramp() {
        // Half a second at 60fps: full speed after 30 ticks
        let mut p = player(PlayerSettings {
            seconds_to_full_speed: 0.5,
            ..PlayerSettings::default()
        });
        p.handle_event(&InputEvent::KeyPressed { key: KeyCode::D, control: false });

        let first = p.movement_impulse();
        assert!((first.x - 1.0 / 30.0).abs() < 1e-6);
        assert_eq!(first.y, 0.0);

        for _ in 0..40 {
            p.movement_impulse();
        }
        assert_eq!(p.movement_impulse(), vec2(MAX_IMPULSE, 0.0));

        p.handle_event(&InputEvent::KeyReleased { key: KeyCode::D });
        assert_eq!(p.movement_impulse(), Vec2::ZERO);
        p.handle_event(&InputEvent::KeyPressed { key: KeyCode::W, control: false });
        assert!(p.movement_impulse().y < 0.0);
    }

    #[test]
    fn test_instant_acceleration() {
        let mut p = player(PlayerSettings {
            seconds_to_full_speed: 0.0,
            ..PlayerSettings::default()
        });
        p.handle_event(&InputEvent::KeyPressed { key: KeyCode::S, control: false });
        assert_eq!(p.movement_impulse(), vec2(0.0, MAX_IMPULSE));
    }

    #[test]
    fn test_click_fires_on_next_update() {
        let mut p = player(PlayerSettings::default());
        let mut harness = TickHarness::new();
        let now = Instant::now();

        p.handle_event(&InputEvent::MouseButtonPressed {
            button: MouseButton::Left,
            x: 200.0,
            y: 100.0,
        });
        assert!(harness.spawned().is_empty());

        p.update(&mut harness.ctx(now), vec2(100.0, 100.0));
        let bullets = harness.spawned();
        assert_eq!(bullets.len(), 1);
        assert!(bullets[0].motion_x > 0.0);
        assert_eq!(bullets[0].motion_y, 0.0);
        assert_eq!(p.firearm.left_in_mag(), 9);

        p.handle_event(&InputEvent::MouseButtonReleased {
            button: MouseButton::Left,
            x: 200.0,
            y: 100.0,
        });
        p.handle_event(&InputEvent::KeyPressed { key: KeyCode::R, control: false });
        p.update(&mut harness.ctx(now), vec2(100.0, 100.0));
        assert!(p.firearm.is_reloading());
    }

    #[test]
    fn test_ctrl_keys_do_not_move() {
        let mut p = player(PlayerSettings::default());
        p.handle_event(&InputEvent::KeyPressed { key: KeyCode::S, control: true });
        assert_eq!(p.movement_impulse(), Vec2::ZERO);
    }

    #[test]
    fn test_popup_length_saturates() {
        let p = player(PlayerSettings {
            gun_popup_length: u32::MAX,
            ..PlayerSettings::default()
        });
        assert_eq!(p.popup_ticks(), u32::MAX);
    }

    #[test]
    fn test_reloading_label_replaces_popup() {
        let mut p = player(PlayerSettings::default());
        let mut harness = TickHarness::new();
        p.handle_event(&InputEvent::KeyPressed { key: KeyCode::R, control: false });
        p.update(&mut harness.ctx(Instant::now()), Vec2::ZERO);
        assert!(p.firearm.is_reloading());

        let mut target = RecordingTarget::new(800.0, 600.0);
        p.draw(vec2(100.0, 100.0), &mut target);
        let texts = target.texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "Reloading");
    }

    #[test]
    fn test_popup_expires() {
        let mut p = player(PlayerSettings {
            gun_popup_length: 1,
            ..PlayerSettings::default()
        });
        assert_eq!(p.popup_ticks(), 60);

        let mut target = RecordingTarget::new(800.0, 600.0);
        p.draw(vec2(100.0, 100.0), &mut target);
        assert_eq!(target.texts()[0].0, p.firearm.name());

        let mut harness = TickHarness::new();
        for _ in 0..60 {
            p.update(&mut harness.ctx(Instant::now()), Vec2::ZERO);
        }
        let mut target = RecordingTarget::new(800.0, 600.0);
        p.draw(vec2(100.0, 100.0), &mut target);
        assert!(target.texts().is_empty());
        assert!(matches!(target.calls[0], DrawCall::Circle { radius, .. } if radius == PLAYER_RADIUS));
    }
}
