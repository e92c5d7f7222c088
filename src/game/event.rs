//! Input dispatch
//!
//! Entities that react to player input expose an `EventHandler` through
//! `Entity::event_handler`. The world forwards every input event it receives
//! to each of them, in no particular order.
//!
//! Handlers only record what happened. Anything that needs the world (firing,
//! spawning) is applied on the entity's next tick.

use crate::input::InputEvent;

pub trait EventHandler {
    fn handle_event(&mut self, event: &InputEvent);
}
