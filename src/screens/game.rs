//! In-game screen
//!
//! Hosts one `GameWorld`. Escape leaves for the menu; everything else goes
//! to the world.

use crate::game::draw::DrawTarget;
use crate::game::{EntityId, GameWorld};
use crate::input::InputEvent;
use macroquad::input::KeyCode;
use macroquad::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    ReturnToMenu,
}

pub struct GameScreen {
    world: GameWorld,
    player: Option<EntityId>,
}

impl GameScreen {
    pub fn new(world: GameWorld, player: Option<EntityId>) -> Self {
        if player.is_none() {
            tracing::warn!("world has no player entity");
        }
        Self { world, player }
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> Option<GameAction> {
        if event.is_key(KeyCode::Escape) {
            return Some(GameAction::ReturnToMenu);
        }
        self.world.handle_event(event);
        None
    }

    pub fn update(&mut self, bounds: Vec2) {
        self.world.tick(bounds);
    }

    pub fn draw(&mut self, target: &mut dyn DrawTarget) {
        self.world.draw(target);
    }

    /// Sound effects requested since the last frame
    pub fn drain_sounds(&mut self) -> Vec<String> {
        self.world.drain_sounds()
    }
}
