//! Firearms
//!
//! `FirearmProperties` describe a weapon model and are shared through the
//! catalog. A `Firearm` is one carried instance of such a model: it owns the
//! ammunition counts and the fire-control timing.
//!
//! Timing is measured against `TickContext::now`, so every state change
//! happens inside a world tick (or an event applied during one).

pub mod properties;

pub use properties::{CatalogError, FireMode, FirearmCatalog, FirearmProperties, Spread};

use crate::game::entity::Entity;
use crate::game::world::TickContext;
use macroquad::math::Vec2;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Firearm {
    props: Arc<FirearmProperties>,
    /// When the last shot went off
    action_start: Option<Instant>,
    /// Set while a magazine swap is in progress
    reload_start: Option<Instant>,
    trigger_held: bool,
    /// Response-trigger shot owed from a release during the action cycle
    release_shot_pending: bool,
    left_in_mag: u32,
    /// Spare magazines, not counting the loaded one
    left_mags: u32,
    last_shoot_sound: Option<usize>,
}

impl Firearm {
    /// A fresh weapon: full magazine plus every spare
    pub fn new(props: Arc<FirearmProperties>) -> Self {
        Self {
            left_in_mag: props.mag_size,
            left_mags: props.mag_quantity.saturating_sub(1),
            props,
            action_start: None,
            reload_start: None,
            trigger_held: false,
            release_shot_pending: false,
            last_shoot_sound: None,
        }
    }

    /// Rebuild a weapon from its saved state.
    ///
    /// Returns `None` when the object names no firearm known to `catalog`.
    pub fn from_json(catalog: &FirearmCatalog, from: &Map<String, Value>) -> Option<Self> {
        let id = from.get("id")?.as_str()?;
        let mut firearm = Firearm::new(Arc::clone(catalog.get(id)?));
        firearm.read_from_json(from);
        Some(firearm)
    }

    /// Update the ammunition counts from `from`, keeping anything absent or
    /// mistyped. Counts are clamped to what the model can hold.
    pub fn read_from_json(&mut self, from: &Map<String, Value>) {
        if let Some(n) = from.get("left_in_mag").and_then(Value::as_u64) {
            self.left_in_mag = n.min(self.props.mag_size as u64) as u32;
        }
        if let Some(n) = from.get("left_mags").and_then(Value::as_u64) {
            let max_spares = self.props.mag_quantity.saturating_sub(1);
            self.left_mags = n.min(max_spares as u64) as u32;
        }
    }

    pub fn write_to_json(&self) -> Value {
        json!({
            "id": self.props.id,
            "left_in_mag": self.left_in_mag,
            "left_mags": self.left_mags,
        })
    }

    pub fn id(&self) -> &str {
        &self.props.id
    }

    pub fn name(&self) -> &str {
        &self.props.name
    }

    pub fn left_in_mag(&self) -> u32 {
        self.left_in_mag
    }

    pub fn left_mags(&self) -> u32 {
        self.left_mags
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_start.is_some()
    }

    /// Press the trigger. Press-fired modes shoot on the first press only.
    pub fn trigger(&mut self, ctx: &mut TickContext, pos: Vec2, aim: Vec2) {
        let was_held = std::mem::replace(&mut self.trigger_held, true);
        if was_held {
            return;
        }

        match self.props.fire_mode {
            FireMode::FullAuto => {}
            FireMode::SemiAuto | FireMode::Shotgun | FireMode::SemiAutoResponseTrigger => {
                self.try_fire(ctx, pos, aim);
            }
        }
    }

    /// Release the trigger
    pub fn untrigger(&mut self, ctx: &mut TickContext, pos: Vec2, aim: Vec2) {
        let was_held = std::mem::replace(&mut self.trigger_held, false);
        if !was_held || self.props.fire_mode != FireMode::SemiAutoResponseTrigger {
            return;
        }

        if !self.try_fire(ctx, pos, aim) && self.left_in_mag > 0 && !self.is_reloading() {
            self.release_shot_pending = true;
        }
    }

    /// Advance timers: finish reloads, fire owed release shots and keep
    /// full-auto weapons firing.
    pub fn tick(&mut self, ctx: &mut TickContext, pos: Vec2, aim: Vec2) {
        self.finish_reload(ctx.now);

        if self.release_shot_pending && self.action_ready(ctx.now) {
            self.release_shot_pending = false;
            self.try_fire(ctx, pos, aim);
        }

        if self.props.fire_mode == FireMode::FullAuto && self.trigger_held {
            self.try_fire(ctx, pos, aim);
        }
    }

    /// Start swapping magazines. Does nothing without a spare or while a
    /// reload is already running.
    pub fn reload(&mut self, ctx: &mut TickContext) {
        if self.left_mags == 0 || self.is_reloading() {
            return;
        }

        self.reload_start = Some(ctx.now);
        if let Some(sound) = &self.props.reload_sound {
            ctx.play_sound(sound);
        }
    }

    /// Reload progress in `[0, 1]`; 1 when not reloading
    pub fn progress(&self, now: Instant) -> f32 {
        match self.reload_start {
            None => 1.0,
            Some(start) => {
                let total = self.props.reload_speed.as_secs_f32();
                if total <= 0.0 {
                    return 1.0;
                }
                (now.saturating_duration_since(start).as_secs_f32() / total).min(1.0)
            }
        }
    }

    /// Fraction of the magazine already spent, in `[0, 1]`
    pub fn depletion(&self) -> f32 {
        if self.props.mag_size == 0 {
            return 1.0;
        }
        1.0 - self.left_in_mag as f32 / self.props.mag_size as f32
    }

    fn action_ready(&self, now: Instant) -> bool {
        self.action_start
            .map_or(true, |start| now.saturating_duration_since(start) >= self.props.action_speed)
    }

    fn finish_reload(&mut self, now: Instant) {
        if let Some(start) = self.reload_start {
            if now.saturating_duration_since(start) >= self.props.reload_speed {
                self.reload_start = None;
                self.left_in_mag = self.props.mag_size;
                self.left_mags = self.left_mags.saturating_sub(1);
            }
        }
    }

    fn try_fire(&mut self, ctx: &mut TickContext, pos: Vec2, aim: Vec2) -> bool {
        if self.is_reloading() || self.left_in_mag == 0 || !self.action_ready(ctx.now) {
            return false;
        }
        self.fire(ctx, pos, aim);
        true
    }

    fn fire(&mut self, ctx: &mut TickContext, pos: Vec2, aim: Vec2) {
        self.left_in_mag -= 1;
        self.action_start = Some(ctx.now);

        let direction = aim.try_normalize().unwrap_or(Vec2::X);
        let bullet = self.props.bullet;
        for _ in 0..self.props.projectiles_per_shot {
            let heading = self.jitter(ctx, direction);
            ctx.spawn(Entity::bullet(pos, heading * bullet.speed, bullet.speed_loss));
        }

        let sounds = &self.props.shoot_sounds;
        if !sounds.is_empty() {
            let next = self.last_shoot_sound.map_or(0, |last| (last + 1) % sounds.len());
            self.last_shoot_sound = Some(next);
            ctx.play_sound(&sounds[next]);
        }
    }

    fn jitter(&self, ctx: &mut TickContext, direction: Vec2) -> Vec2 {
        let Some(spread) = self.props.spread else {
            return direction;
        };

        // Signed degrees; the sign picks the side
        let degrees = ctx.rng().gen_range(spread.min..=spread.max);
        Vec2::from_angle(degrees.to_radians()).rotate(direction)
    }
}
