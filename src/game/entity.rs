//! Entities
//!
//! Everything that lives in a `GameWorld` is an `Entity`: a position, a
//! velocity and an id, plus per-variant state in `EntityKind`. All variants
//! share the same integration and wall bounce in `tick`; what differs is
//! their speed, drag, serialized fields and optional capabilities.
//!
//! Serialized form (one JSON object per entity):
//!
//! ```text
//! { "x", "y", "motion_x", "motion_y", "id",   every entity
//!   "kind": "player" | "bullet",              variants only
//!   ...variant fields }
//! ```

use super::bullet::{Bullet, MIN_BULLET_SPEED};
use super::draw::Drawable;
use super::event::EventHandler;
use super::player::{Player, PLAYER_RESISTANCE};
use super::world::{TickContext, WorldResources};
use macroquad::math::{vec2, Vec2};
use serde_json::{Map, Value};

/// Registry key of an entity within its world
pub type EntityId = u64;

/// Share of the velocity covered per tick
pub const MOTION_FACTOR: f32 = 0.15;

/// Drag of entities without their own
pub const DEFAULT_SPEED_LOSS: f32 = 0.15;

#[derive(Debug, Clone)]
pub enum EntityKind {
    Generic,
    Player(Box<Player>),
    Bullet(Bullet),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub motion_x: f32,
    pub motion_y: f32,
    pub kind: EntityKind,
}

impl Entity {
    /// A generic entity at rest
    pub fn new(x: f32, y: f32) -> Self {
        Self::with_kind(EntityKind::Generic, x, y)
    }

    fn with_kind(kind: EntityKind, x: f32, y: f32) -> Self {
        Self {
            id: 0,
            x,
            y,
            motion_x: 0.0,
            motion_y: 0.0,
            kind,
        }
    }

    pub fn player(resources: &WorldResources, at: Vec2) -> Self {
        Self::with_kind(EntityKind::Player(Box::new(Player::new(resources))), at.x, at.y)
    }

    pub fn bullet(at: Vec2, velocity: Vec2, speed_loss: f32) -> Self {
        Self {
            motion_x: velocity.x,
            motion_y: velocity.y,
            ..Self::with_kind(EntityKind::Bullet(Bullet { speed_loss }), at.x, at.y)
        }
    }

    /// Build an entity from its serialized form.
    ///
    /// The second value is true for the entity the player controls.
    pub fn from_json(resources: &WorldResources, from: &Map<String, Value>) -> (Self, bool) {
        let (kind, primary) = match from.get("kind").and_then(Value::as_str) {
            Some("player") => (EntityKind::Player(Box::new(Player::new(resources))), true),
            Some("bullet") => (EntityKind::Bullet(Bullet::default()), false),
            _ => (EntityKind::Generic, false),
        };

        let mut entity = Self::with_kind(kind, 0.0, 0.0);
        entity.read_from_json(resources, from);
        (entity, primary)
    }

    /// Overwrite fields present in `from`. Absent or mistyped fields keep
    /// their current value.
    pub fn read_from_json(&mut self, resources: &WorldResources, from: &Map<String, Value>) {
        let float = |key: &str| from.get(key).and_then(Value::as_f64).map(|v| v as f32);

        if let Some(x) = float("x") {
            self.x = x;
        }
        if let Some(y) = float("y") {
            self.y = y;
        }
        if let Some(motion_x) = float("motion_x") {
            self.motion_x = motion_x;
        }
        if let Some(motion_y) = float("motion_y") {
            self.motion_y = motion_y;
        }
        if let Some(id) = from.get("id").and_then(Value::as_u64) {
            self.id = id;
        }

        match &mut self.kind {
            EntityKind::Generic => {}
            EntityKind::Player(player) => player.read_from_json(resources, from),
            EntityKind::Bullet(bullet) => {
                if let Some(loss) = float("speed_loss") {
                    bullet.speed_loss = loss;
                }
            }
        }
    }

    pub fn write_to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("x".into(), self.x.into());
        out.insert("y".into(), self.y.into());
        out.insert("motion_x".into(), self.motion_x.into());
        out.insert("motion_y".into(), self.motion_y.into());
        out.insert("id".into(), self.id.into());

        match &self.kind {
            EntityKind::Generic => {}
            EntityKind::Player(player) => player.write_to_json(&mut out),
            EntityKind::Bullet(bullet) => {
                out.insert("kind".into(), "bullet".into());
                out.insert("speed_loss".into(), bullet.speed_loss.into());
            }
        }
        out
    }

    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn velocity(&self) -> Vec2 {
        vec2(self.motion_x, self.motion_y)
    }

    pub fn speed(&self) -> f32 {
        match &self.kind {
            EntityKind::Generic | EntityKind::Bullet(_) => 1.0,
            EntityKind::Player(player) => player.speed(),
        }
    }

    pub fn speed_loss(&self) -> f32 {
        match &self.kind {
            EntityKind::Generic => DEFAULT_SPEED_LOSS,
            EntityKind::Player(_) => PLAYER_RESISTANCE,
            EntityKind::Bullet(bullet) => bullet.speed_loss,
        }
    }

    /// Integrate one step and bounce off the walls of a
    /// `bound_x` x `bound_y` area. Walls are off if either bound is 0.
    pub fn tick(&mut self, bound_x: f32, bound_y: f32) {
        let speed = self.speed();
        let resisted = 1.0 - self.speed_loss();

        self.x += self.motion_x * MOTION_FACTOR * speed;
        self.y += self.motion_y * MOTION_FACTOR * speed;
        self.motion_x *= resisted;
        self.motion_y *= resisted;

        if bound_x != 0.0 && bound_y != 0.0 {
            if self.x < 0.0 {
                self.x = self.x.abs();
                self.motion_x = -self.motion_x;
            }
            if self.x > bound_x {
                self.x += bound_x - self.x;
                self.motion_x = -self.motion_x;
            }
            if self.y < 0.0 {
                self.y = self.y.abs();
                self.motion_y = -self.motion_y;
            }
            if self.y > bound_y {
                self.y += bound_y - self.y;
                self.motion_y = -self.motion_y;
            }
        }
    }

    /// Add an impulse scaled by this entity's speed
    pub fn start_movement(&mut self, accel_x: f32, accel_y: f32) {
        let speed = self.speed();
        self.motion_x += accel_x * speed;
        self.motion_y += accel_y * speed;
    }

    /// One world tick: input-driven movement, integration, then variant
    /// behavior.
    pub fn update(&mut self, ctx: &mut TickContext) {
        let impulse = match &mut self.kind {
            EntityKind::Player(player) => Some(player.movement_impulse()),
            _ => None,
        };
        if let Some(impulse) = impulse {
            self.start_movement(impulse.x, impulse.y);
        }

        self.tick(ctx.bounds.x, ctx.bounds.y);

        let pos = self.position();
        let slow = self.velocity().length() < MIN_BULLET_SPEED;
        match &mut self.kind {
            EntityKind::Generic => {}
            EntityKind::Player(player) => player.update(ctx, pos),
            EntityKind::Bullet(_) => {
                if slow {
                    ctx.despawn(self.id);
                }
            }
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(player) => Some(&**player),
            _ => None,
        }
    }

    /// The entity's visual representation, if it has one
    pub fn drawable(&self) -> Option<&dyn Drawable> {
        match &self.kind {
            EntityKind::Generic => None,
            EntityKind::Player(player) => Some(&**player),
            EntityKind::Bullet(bullet) => Some(bullet),
        }
    }

    /// The entity's input handler, if it reacts to input
    pub fn event_handler(&mut self) -> Option<&mut dyn EventHandler> {
        match &mut self.kind {
            EntityKind::Player(player) => Some(&mut **player),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::{test_resources, TickHarness};
    use serde_json::json;
    use std::time::Instant;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn moving(x: f32, y: f32, motion_x: f32, motion_y: f32) -> Entity {
        Entity {
            motion_x,
            motion_y,
            ..Entity::new(x, y)
        }
    }

    #[test]
    fn test_tick_without_bounds() {
        let mut e = moving(10.0, 20.0, 4.0, -2.0);
        e.tick(0.0, 0.0);
        assert!(close(e.x, 10.0 + 4.0 * 0.15));
        assert!(close(e.y, 20.0 - 2.0 * 0.15));
        assert!(close(e.motion_x, 4.0 * 0.85));
        assert!(close(e.motion_y, -2.0 * 0.85));

        // One zero bound disables the walls
        let mut e = moving(-1.0, 500.0, -4.0, 4.0);
        e.tick(100.0, 0.0);
        assert!(e.x < -1.0);
        assert!(e.y > 500.0);
    }

    #[test]
    fn test_bounce_off_near_wall() {
        let mut e = moving(-5.0, 50.0, 2.0, 0.0);
        e.tick(100.0, 100.0);
        // -5 + 0.3 = -4.7, reflected
        assert!(close(e.x, 4.7));
        assert!(close(e.motion_x, -1.7));

        let mut e = moving(50.0, 1.0, 0.0, -20.0);
        e.tick(100.0, 100.0);
        assert!(close(e.y, 2.0));
        assert!(close(e.motion_y, 17.0));
    }

    #[test]
    fn test_bounce_off_far_wall() {
        let mut e = moving(99.0, 50.0, 20.0, 0.0);
        e.tick(100.0, 100.0);
        assert_eq!(e.x, 100.0);
        assert!(close(e.motion_x, -17.0));

        let mut e = moving(50.0, 105.0, 0.0, 2.0);
        e.tick(100.0, 100.0);
        assert!(close(e.y, 100.0));
        assert!(close(e.motion_y, -1.7));
    }

    #[test]
    fn test_start_movement_scales_by_speed() {
        let resources = test_resources();
        let mut e = Entity::new(0.0, 0.0);
        e.start_movement(1.0, -2.0);
        assert_eq!(e.velocity(), vec2(1.0, -2.0));

        let mut p = Entity::player(&resources, Vec2::ZERO);
        p.start_movement(1.0, 0.0);
        assert_eq!(p.motion_x, resources.player.speed);
    }

    #[test]
    fn test_from_json_kinds() {
        let resources = test_resources();
        let cases = [
            (json!({"kind": "player"}), true, "player"),
            (json!({"kind": "bullet"}), false, "bullet"),
            (json!({"kind": "tank"}), false, "generic"),
            (json!({"kind": 7}), false, "generic"),
            (json!({}), false, "generic"),
        ];

        for (value, expected_primary, expected_kind) in cases {
            let (entity, primary) = Entity::from_json(&resources, &object(value));
            let kind = match entity.kind {
                EntityKind::Generic => "generic",
                EntityKind::Player(_) => "player",
                EntityKind::Bullet(_) => "bullet",
            };
            assert_eq!(primary, expected_primary);
            assert_eq!(kind, expected_kind);
        }
    }

    #[test]
    fn test_partial_read_keeps_values() {
        let resources = test_resources();
        let mut e = moving(1.0, 2.0, 3.0, 4.0);
        e.id = 9;

        e.read_from_json(&resources, &object(json!({"y": 20.0, "motion_x": "fast", "id": -3})));
        assert_eq!((e.x, e.y, e.motion_x, e.motion_y, e.id), (1.0, 20.0, 3.0, 4.0, 9));
    }

    #[test]
    fn test_generic_json_has_exactly_common_fields() {
        let json = moving(1.0, 2.0, 3.0, 4.0).write_to_json();
        let mut keys: Vec<&str> = json.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["id", "motion_x", "motion_y", "x", "y"]);
    }

    #[test]
    fn test_common_fields_round_trip() {
        let resources = test_resources();
        let mut original = moving(12.5, -3.25, 0.1, 7.0);
        original.id = 4321;

        let (restored, primary) = Entity::from_json(&resources, &original.write_to_json());
        assert!(!primary);
        assert_eq!(
            (restored.x, restored.y, restored.motion_x, restored.motion_y, restored.id),
            (12.5, -3.25, 0.1, 7.0, 4321)
        );
    }

    #[test]
    fn test_variants_extend_common_fields() {
        let resources = test_resources();

        let bullet = Entity::bullet(vec2(1.0, 1.0), vec2(5.0, 0.0), 0.25).write_to_json();
        assert_eq!(bullet["kind"], "bullet");
        assert_eq!(bullet["speed_loss"], 0.25);
        assert_eq!(bullet["motion_x"], 5.0);

        let player = Entity::player(&resources, vec2(3.0, 4.0)).write_to_json();
        assert_eq!(player["kind"], "player");
        assert_eq!(player["firearm"]["id"], "default");
        assert_eq!(player["x"], 3.0);

        let (restored, primary) = Entity::from_json(&resources, &player);
        assert!(primary);
        assert_eq!(restored.as_player().unwrap().firearm.id(), "default");
    }

    #[test]
    fn test_bullet_keeps_its_drag() {
        let resources = test_resources();
        let saved = Entity::bullet(Vec2::ZERO, vec2(10.0, 0.0), 0.5).write_to_json();
        let (mut bullet, _) = Entity::from_json(&resources, &saved);

        assert_eq!(bullet.speed_loss(), 0.5);
        bullet.tick(0.0, 0.0);
        assert!(close(bullet.motion_x, 5.0));
    }

    #[test]
    fn test_capabilities() {
        let resources = test_resources();
        let mut generic = Entity::new(0.0, 0.0);
        let mut bullet = Entity::bullet(Vec2::ZERO, Vec2::X, 0.1);
        let mut player = Entity::player(&resources, Vec2::ZERO);

        assert!(generic.drawable().is_none());
        assert!(generic.event_handler().is_none());
        assert!(bullet.drawable().is_some());
        assert!(bullet.event_handler().is_none());
        assert!(player.drawable().is_some());
        assert!(player.event_handler().is_some());
    }

    #[test]
    fn test_slow_bullet_requests_despawn() {
        let mut harness = TickHarness::new();
        let mut bullet = Entity::bullet(Vec2::ZERO, vec2(0.1, 0.0), 0.1);
        bullet.id = 77;

        bullet.update(&mut harness.ctx(Instant::now()));
        assert_eq!(harness.despawned(), vec![77]);

        let mut fast = Entity::bullet(Vec2::ZERO, vec2(20.0, 0.0), 0.1);
        fast.update(&mut harness.ctx(Instant::now()));
        assert_eq!(harness.despawned(), vec![77]);
    }
}
