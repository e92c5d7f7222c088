//! Screens
//!
//! The application shows exactly one screen at a time: the main menu or a
//! running game.

pub mod game;
pub mod menu;

pub use game::{GameAction, GameScreen};
pub use menu::{MenuAction, MenuScreen};
