//! Game World
//!
//! The World owns every live entity and drives the simulation:
//! - Entity registry keyed by randomly reserved ids
//! - Deferred spawn/despawn while entities are being ticked
//! - Input dispatch to entities that handle events
//! - Background saves and their status banners
//!
//! Entities never hold a reference back to the world. During a tick each one
//! gets a `TickContext` instead, which queues world mutations; the queue is
//! applied once the whole registry has been ticked.

use super::banner::Banner;
use super::draw::DrawTarget;
use super::entity::{Entity, EntityId};
use crate::config::PlayerSettings;
use crate::firearm::{CatalogError, FirearmCatalog, FirearmProperties};
use crate::i18n::Localization;
use crate::input::InputEvent;
use crate::storage::save_file::{save_file_name, unique_save_name, SAVE_EXTENSION};
use crate::storage::{save_async, PendingSave, SaveError};
use chrono::Local;
use macroquad::color::{Color, WHITE};
use macroquad::input::KeyCode;
use macroquad::math::{vec2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Largest id tried before falling back to the full id range
const MAX_RANDOM_ID: EntityId = 10_000;
const MAX_RANDOM_TRIES: usize = 10;

const BANNER_FONT_SIZE: f32 = 20.0;
const ERROR_COLOR: Color = Color::new(1.0, 0.3, 0.3, 1.0);

/// Read-only data every world needs, built once at startup
#[derive(Debug)]
pub struct WorldResources {
    pub catalog: Arc<FirearmCatalog>,
    pub strings: Arc<Localization>,
    pub player: PlayerSettings,
    /// Effective frame rate, used to turn seconds into ticks
    pub fps: u32,
    pub saves_dir: PathBuf,
    default_firearm: Arc<FirearmProperties>,
}

impl WorldResources {
    /// Fails if the configured default firearm isn't in the catalog
    pub fn new(
        catalog: Arc<FirearmCatalog>,
        strings: Arc<Localization>,
        player: PlayerSettings,
        fps: u32,
        saves_dir: PathBuf,
    ) -> Result<Self, CatalogError> {
        let default_firearm = Arc::clone(catalog.require(&player.default_firearm)?);
        Ok(Self {
            catalog,
            strings,
            player,
            fps,
            saves_dir,
            default_firearm,
        })
    }

    pub fn default_firearm(&self) -> &Arc<FirearmProperties> {
        &self.default_firearm
    }
}

/// A world mutation requested while entities are being ticked
#[derive(Debug)]
pub(crate) enum PendingOp {
    Spawn(Entity),
    Despawn(EntityId),
}

/// World access for an entity during its tick
pub struct TickContext<'a> {
    /// Time of the current tick
    pub now: Instant,
    /// Size of the playing area, `(0, 0)` for unbounded
    pub bounds: Vec2,
    rng: &'a mut StdRng,
    pending: &'a mut Vec<PendingOp>,
    sounds: &'a mut Vec<String>,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        now: Instant,
        bounds: Vec2,
        rng: &'a mut StdRng,
        pending: &'a mut Vec<PendingOp>,
        sounds: &'a mut Vec<String>,
    ) -> Self {
        Self {
            now,
            bounds,
            rng,
            pending,
            sounds,
        }
    }

    /// Add `entity` once the tick is over. It gets a fresh id then.
    pub fn spawn(&mut self, entity: Entity) {
        self.pending.push(PendingOp::Spawn(entity));
    }

    /// Remove `id` once the tick is over
    pub fn despawn(&mut self, id: EntityId) {
        self.pending.push(PendingOp::Despawn(id));
    }

    /// Ask the frontend to play a sound effect
    pub fn play_sound(&mut self, id: &str) {
        self.sounds.push(id.to_string());
    }

    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }
}

pub struct GameWorld {
    resources: Arc<WorldResources>,
    entities: HashMap<EntityId, Entity>,
    /// Ids handed out by `reserve_eid` but not spawned yet
    reserved: HashSet<EntityId>,
    /// Mutations queued during the current tick
    pending: Vec<PendingOp>,
    /// Sound requests not yet collected by the frontend
    sounds: Vec<String>,
    rng: StdRng,
    saves: Vec<PendingSave>,
    save_banner: Option<Banner>,
    error_banner: Option<Banner>,
}

impl GameWorld {
    /// Create a new empty world.
    pub fn new(resources: Arc<WorldResources>) -> Self {
        Self::with_rng(resources, StdRng::from_entropy())
    }

    pub(crate) fn with_rng(resources: Arc<WorldResources>, rng: StdRng) -> Self {
        Self {
            resources,
            entities: HashMap::new(),
            reserved: HashSet::new(),
            pending: Vec::new(),
            sounds: Vec::new(),
            rng,
            saves: Vec::new(),
            save_banner: None,
            error_banner: None,
        }
    }

    /// A world holding only the player, at `spawn_at`
    pub fn new_game(resources: Arc<WorldResources>, spawn_at: Vec2) -> (Self, EntityId) {
        let mut world = Self::new(resources);
        let player = Entity::player(&world.resources, spawn_at);
        let id = world.reserve_eid();
        world.spawn(id, player);
        (world, id)
    }

    /// Rebuild a world from a save snapshot (id string -> entity object).
    ///
    /// The snapshot key is the entity's id, whatever its `"id"` field says.
    /// Also returns the id of the player entity, if there is one.
    pub fn from_snapshot(
        resources: Arc<WorldResources>,
        snapshot: &Map<String, Value>,
    ) -> (Self, Option<EntityId>) {
        let mut world = Self::new(resources);
        let mut player = None;

        for (key, value) in snapshot {
            let Ok(id) = key.parse::<EntityId>() else {
                tracing::warn!(key = %key, "skipping entity with a non-numeric id");
                continue;
            };
            let Some(object) = value.as_object() else {
                tracing::warn!(id, "skipping entity that isn't an object");
                continue;
            };

            let (entity, primary) = Entity::from_json(&world.resources, object);
            if primary {
                if let Some(previous) = player.replace(id) {
                    tracing::warn!(previous, id, "snapshot has more than one player");
                }
            }
            world.spawn(id, entity);
        }

        tracing::info!(entities = world.len(), player = ?player, "world loaded from snapshot");
        (world, player)
    }

    // =========================================================================
    // Entity Management
    // =========================================================================

    /// Pick an id that is neither live nor already reserved.
    ///
    /// Ids are drawn from `0..=10_000`. After ten collisions the id is drawn
    /// from the whole `u64` range without checking.
    pub fn reserve_eid(&mut self) -> EntityId {
        for _ in 0..MAX_RANDOM_TRIES {
            let candidate = self.rng.gen_range(0..=MAX_RANDOM_ID);
            if !self.entities.contains_key(&candidate) && !self.reserved.contains(&candidate) {
                self.reserved.insert(candidate);
                return candidate;
            }
        }

        let id = self.rng.gen();
        self.reserved.insert(id);
        id
    }

    /// Insert `entity` under `id`. An entity already holding `id` is kept.
    pub fn spawn(&mut self, id: EntityId, mut entity: Entity) -> EntityId {
        self.reserved.remove(&id);
        entity.id = id;
        match self.entities.entry(id) {
            Entry::Occupied(_) => tracing::warn!(id, "entity id already in use, spawn ignored"),
            Entry::Vacant(slot) => {
                slot.insert(entity);
            }
        }
        id
    }

    /// Remove an entity right away.
    /// Entities being ticked use `TickContext::despawn` instead.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity that must exist.
    ///
    /// # Panics
    /// If there is no entity with this id.
    pub fn ent(&self, id: EntityId) -> &Entity {
        match self.entities.get(&id) {
            Some(entity) => entity,
            None => panic!("no entity with id {}", id),
        }
    }

    /// Mutable variant of [`GameWorld::ent`]
    pub fn ent_mut(&mut self, id: EntityId) -> &mut Entity {
        match self.entities.get_mut(&id) {
            Some(entity) => entity,
            None => panic!("no entity with id {}", id),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance every entity one step inside a `bounds` sized area
    pub fn tick(&mut self, bounds: Vec2) {
        self.tick_at(bounds, Instant::now());
    }

    pub fn tick_at(&mut self, bounds: Vec2, now: Instant) {
        self.tick_with(bounds, now, |entity, ctx| entity.update(ctx));
    }

    fn tick_with<F>(&mut self, bounds: Vec2, now: Instant, mut update: F)
    where
        F: FnMut(&mut Entity, &mut TickContext),
    {
        self.poll_saves();

        let mut ctx = TickContext::new(now, bounds, &mut self.rng, &mut self.pending, &mut self.sounds);
        for entity in self.entities.values_mut() {
            update(entity, &mut ctx);
        }

        self.flush_pending();
    }

    /// Apply queued mutations in the order they were requested
    fn flush_pending(&mut self) {
        for op in std::mem::take(&mut self.pending) {
            match op {
                PendingOp::Spawn(entity) => {
                    let id = self.reserve_eid();
                    self.spawn(id, entity);
                }
                PendingOp::Despawn(id) => {
                    self.entities.remove(&id);
                }
            }
        }
    }

    /// Take the sound effects requested since the last call
    pub fn drain_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sounds)
    }

    /// Ctrl+[ saves the game; everything goes to the entities' handlers
    pub fn handle_event(&mut self, event: &InputEvent) {
        if event.is_ctrl_key(KeyCode::LeftBracket) {
            self.start_save();
        }

        for entity in self.entities.values_mut() {
            if let Some(handler) = entity.event_handler() {
                handler.handle_event(event);
            }
        }
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Serialize the registry as id string -> entity object
    pub fn snapshot(&self) -> Map<String, Value> {
        self.entities
            .iter()
            .map(|(id, entity)| (id.to_string(), Value::Object(entity.write_to_json())))
            .collect()
    }

    /// Write a snapshot to the saves directory on a background thread
    pub fn start_save(&mut self) {
        let json = match serde_json::to_string(&self.snapshot()) {
            Ok(json) => json,
            Err(e) => {
                self.finish_save("", Err(SaveError::Json(e)));
                return;
            }
        };

        let saves_dir = &self.resources.saves_dir;
        let in_flight: Vec<&str> = self.saves.iter().map(PendingSave::name).collect();
        let name = unique_save_name(saves_dir, &save_file_name(Local::now()), &in_flight);
        let path = saves_dir.join(format!("{}.{}", name, SAVE_EXTENSION));
        tracing::info!(path = %path.display(), entities = self.entities.len(), "saving game");
        self.saves.push(save_async(path, name, json));
    }

    /// Number of saves still being written
    pub fn saves_in_flight(&self) -> usize {
        self.saves.len()
    }

    fn poll_saves(&mut self) {
        let mut running = Vec::with_capacity(self.saves.len());
        for mut save in std::mem::take(&mut self.saves) {
            match save.poll() {
                None => running.push(save),
                Some(result) => {
                    self.finish_save(save.name(), result);
                    save.wait();
                }
            }
        }
        self.saves = running;
    }

    fn finish_save(&mut self, name: &str, result: Result<(), SaveError>) {
        let fps = self.resources.fps;
        let strings = &self.resources.strings;
        match result {
            Ok(()) => {
                tracing::info!(save = name, "game saved");
                let text = strings.format("gui.world.text.save_success", &[name]);
                self.save_banner = Some(Banner::new(text, fps.saturating_mul(2)));
            }
            Err(e) => {
                tracing::error!(save = name, error = %e, "save failed");
                let text = strings.format("gui.world.text.save_compression_error", &[&e.to_string()]);
                self.error_banner = Some(Banner::new(text, fps.saturating_mul(10)));
            }
        }
    }

    pub fn save_banner(&self) -> Option<&Banner> {
        self.save_banner.as_ref()
    }

    pub fn error_banner(&self) -> Option<&Banner> {
        self.error_banner.as_ref()
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Draw every drawable entity, then the save banners.
    /// Each call counts as one frame for the banners.
    pub fn draw(&mut self, target: &mut dyn DrawTarget) {
        for entity in self.entities.values() {
            if let Some(drawable) = entity.drawable() {
                drawable.draw(entity.position(), target);
            }
        }

        if let Some(banner) = &mut self.save_banner {
            let size = target.measure_text(&banner.text, BANNER_FONT_SIZE);
            let (x_factor, y_factor) = banner.slide(self.resources.fps);
            let x = target.size().x - x_factor * (size.x + BANNER_FONT_SIZE * 0.75);
            target.text(&banner.text, vec2(x, y_factor * size.y), BANNER_FONT_SIZE, WHITE);
            banner.advance();
        }
        if let Some(banner) = &mut self.error_banner {
            target.text(&banner.text, Vec2::ZERO, BANNER_FONT_SIZE, ERROR_COLOR);
            banner.advance();
        }

        self.save_banner = self.save_banner.take().filter(Banner::is_visible);
        self.error_banner = self.error_banner.take().filter(Banner::is_visible);
    }
}

impl Drop for GameWorld {
    fn drop(&mut self) {
        for save in self.saves.drain(..) {
            save.wait();
        }
    }
}

// =============================================================================
// Test support
// =============================================================================

#[cfg(test)]
pub(crate) fn test_resources_with(player: PlayerSettings, saves_dir: PathBuf) -> Arc<WorldResources> {
    use crate::firearm::properties::sample;
    use crate::firearm::FireMode;

    let catalog = FirearmCatalog::from_properties([
        sample("default", FireMode::SemiAuto),
        sample("rifle", FireMode::FullAuto),
    ])
    .unwrap();
    let resources = WorldResources::new(
        Arc::new(catalog),
        Arc::new(Localization::builtin()),
        player,
        60,
        saves_dir,
    )
    .unwrap();
    Arc::new(resources)
}

#[cfg(test)]
pub(crate) fn test_resources() -> Arc<WorldResources> {
    test_resources_with(PlayerSettings::default(), std::env::temp_dir().join("rebarbs-test-saves"))
}

/// Owns what a `TickContext` borrows so entities and firearms can be ticked
/// outside a world
#[cfg(test)]
pub(crate) struct TickHarness {
    pub rng: StdRng,
    pub pending: Vec<PendingOp>,
    pub sounds: Vec<String>,
}

#[cfg(test)]
impl TickHarness {
    pub fn new() -> Self {
        Self {
            rng: StdRng::seed_from_u64(0x5eed),
            pending: Vec::new(),
            sounds: Vec::new(),
        }
    }

    pub fn ctx(&mut self, now: Instant) -> TickContext<'_> {
        TickContext::new(now, Vec2::ZERO, &mut self.rng, &mut self.pending, &mut self.sounds)
    }

    pub fn spawned(&self) -> Vec<&Entity> {
        self.pending
            .iter()
            .filter_map(|op| match op {
                PendingOp::Spawn(entity) => Some(entity),
                PendingOp::Despawn(_) => None,
            })
            .collect()
    }

    pub fn despawned(&self) -> Vec<EntityId> {
        self.pending
            .iter()
            .filter_map(|op| match op {
                PendingOp::Despawn(id) => Some(*id),
                PendingOp::Spawn(_) => None,
            })
            .collect()
    }
}
