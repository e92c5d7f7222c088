//! Game Simulation Module
//!
//! A small entity simulation for a top-down shooter. Entities are a closed
//! set of variants rather than component bags: there are only three kinds
//! and each knows how to tick, serialize and draw itself.
//!
//! Key concepts:
//! - Entity: position + velocity + id, with a variant (`EntityKind`)
//! - GameWorld: the id -> entity registry; owns ticking, input and saves
//! - TickContext: what an entity may do to the world mid-tick (queued)
//! - DrawTarget: where entities and banners render

pub mod banner;
pub mod bullet;
pub mod draw;
pub mod entity;
pub mod event;
pub mod player;
pub mod world;

// Re-export main types
pub use entity::EntityId;
pub use world::{GameWorld, WorldResources};
