//! Input events
//!
//! macroquad exposes input as per-frame polling. `EventPump` turns that into
//! a list of discrete events each frame so screens and the world can react
//! to edges (press, release, move) the same way.

mod state;

pub use state::EventPump;

use macroquad::input::{KeyCode, MouseButton};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed { key: KeyCode, control: bool },
    KeyReleased { key: KeyCode },
    MouseMoved { x: f32, y: f32 },
    MouseButtonPressed { button: MouseButton, x: f32, y: f32 },
    MouseButtonReleased { button: MouseButton, x: f32, y: f32 },
    /// Vertical wheel movement, positive away from the user
    MouseWheel { delta: f32 },
}

impl InputEvent {
    /// Plain (no Ctrl) press of `key`
    pub fn is_key(&self, key: KeyCode) -> bool {
        matches!(*self, InputEvent::KeyPressed { key: k, control: false } if k == key)
    }

    /// Ctrl + `key` press
    pub fn is_ctrl_key(&self, key: KeyCode) -> bool {
        matches!(*self, InputEvent::KeyPressed { key: k, control: true } if k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matching_respects_control() {
        let plain = InputEvent::KeyPressed { key: KeyCode::LeftBracket, control: false };
        let ctrl = InputEvent::KeyPressed { key: KeyCode::LeftBracket, control: true };

        assert!(plain.is_key(KeyCode::LeftBracket));
        assert!(!plain.is_ctrl_key(KeyCode::LeftBracket));
        assert!(ctrl.is_ctrl_key(KeyCode::LeftBracket));
        assert!(!ctrl.is_key(KeyCode::LeftBracket));
        assert!(!InputEvent::KeyReleased { key: KeyCode::LeftBracket }.is_key(KeyCode::LeftBracket));
    }
}
