//! Event pump
//!
//! Polls keyboard and mouse state from macroquad once per frame and emits
//! the edges as `InputEvent`s.

use super::InputEvent;
use macroquad::prelude::*;

const MOUSE_BUTTONS: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

pub struct EventPump {
    last_mouse: (f32, f32),
}

impl EventPump {
    pub fn new() -> Self {
        Self {
            last_mouse: mouse_position(),
        }
    }

    /// Collect this frame's input events
    pub fn poll(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let control = is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl);

        let mut pressed: Vec<KeyCode> = get_keys_pressed().into_iter().collect();
        pressed.sort_by_key(|k| *k as u16);
        events.extend(pressed.into_iter().map(|key| InputEvent::KeyPressed { key, control }));

        let mut released: Vec<KeyCode> = get_keys_released().into_iter().collect();
        released.sort_by_key(|k| *k as u16);
        events.extend(released.into_iter().map(|key| InputEvent::KeyReleased { key }));

        let (x, y) = mouse_position();
        if (x, y) != self.last_mouse {
            self.last_mouse = (x, y);
            events.push(InputEvent::MouseMoved { x, y });
        }

        for button in MOUSE_BUTTONS {
            if is_mouse_button_pressed(button) {
                events.push(InputEvent::MouseButtonPressed { button, x, y });
            }
            if is_mouse_button_released(button) {
                events.push(InputEvent::MouseButtonReleased { button, x, y });
            }
        }

        let (_, wheel_y) = mouse_wheel();
        if wheel_y != 0.0 {
            events.push(InputEvent::MouseWheel { delta: wheel_y });
        }

        events
    }
}

impl Default for EventPump {
    fn default() -> Self {
        Self::new()
    }
}
