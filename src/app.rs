//! Application state and screen management
//!
//! One screen is active at a time. Screens report what they want done
//! (start a game, load a save, toggle sound, leave) and the application
//! carries it out, since it owns the config, the sound bank and the shared
//! world resources.

use crate::audio::SoundBank;
use crate::config::Config;
use crate::game::draw::DrawTarget;
use crate::game::{GameWorld, WorldResources};
use crate::input::InputEvent;
use crate::screens::{GameAction, GameScreen, MenuAction, MenuScreen};
use crate::storage::read_snapshot;
use macroquad::math::Vec2;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The active screen
pub enum Screen {
    Menu(MenuScreen),
    Game(GameScreen),
}

/// Main application state
pub struct AppState {
    pub screen: Screen,
    config: Config,
    /// Where `config` is persisted when the menu changes it
    config_path: PathBuf,
    resources: Arc<WorldResources>,
    sounds: SoundBank,
    quit: bool,
}

impl AppState {
    pub fn new(config: Config, config_path: PathBuf, resources: Arc<WorldResources>, sounds: SoundBank) -> Self {
        let menu = MenuScreen::new(
            Arc::clone(&resources.strings),
            resources.saves_dir.clone(),
            !config.play_sounds,
        );
        Self {
            screen: Screen::Menu(menu),
            config,
            config_path,
            resources,
            sounds,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle_event(&mut self, event: &InputEvent, screen_size: Vec2) {
        match &mut self.screen {
            Screen::Menu(menu) => {
                if let Some(action) = menu.handle_event(event) {
                    self.apply_menu_action(action, screen_size);
                }
            }
            Screen::Game(game) => {
                if let Some(GameAction::ReturnToMenu) = game.handle_event(event) {
                    tracing::info!("returning to menu");
                    self.screen = Screen::Menu(self.new_menu());
                }
            }
        }
    }

    pub fn update(&mut self, bounds: Vec2) {
        if let Screen::Game(game) = &mut self.screen {
            game.update(bounds);
            for sound in game.drain_sounds() {
                self.sounds.play(&sound);
            }
        }
    }

    pub fn draw(&mut self, target: &mut dyn DrawTarget) {
        match &mut self.screen {
            Screen::Menu(menu) => menu.draw(target),
            Screen::Game(game) => game.draw(target),
        }
    }

    fn new_menu(&self) -> MenuScreen {
        MenuScreen::new(
            Arc::clone(&self.resources.strings),
            self.resources.saves_dir.clone(),
            !self.config.play_sounds,
        )
    }

    fn apply_menu_action(&mut self, action: MenuAction, screen_size: Vec2) {
        match action {
            MenuAction::Start => {
                tracing::info!("starting new game");
                let (world, player) = GameWorld::new_game(Arc::clone(&self.resources), screen_size / 2.0);
                self.screen = Screen::Game(GameScreen::new(world, Some(player)));
            }
            MenuAction::Load(path) => self.load_game(&path),
            MenuAction::ToggleMute => {
                self.config.play_sounds = !self.config.play_sounds;
                self.sounds.set_enabled(self.config.play_sounds);
                if let Err(e) = self.config.save(&self.config_path) {
                    tracing::warn!(error = %e, "couldn't persist sound setting");
                }
                if let Screen::Menu(menu) = &mut self.screen {
                    menu.set_muted(!self.config.play_sounds);
                }
            }
            MenuAction::Quit => {
                tracing::info!("quit requested");
                self.quit = true;
            }
        }
    }

    fn load_game(&mut self, path: &Path) {
        match read_snapshot(path) {
            Ok(snapshot) => {
                tracing::info!(path = %path.display(), "loading save");
                let (world, player) = GameWorld::from_snapshot(Arc::clone(&self.resources), &snapshot);
                self.screen = Screen::Game(GameScreen::new(world, player));
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "couldn't load save");
                let text = self
                    .resources
                    .strings
                    .format("gui.application.text.load_error", &[&e.to_string()]);
                if let Screen::Menu(menu) = &mut self.screen {
                    menu.set_status(text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerSettings;
    use crate::game::world::test_resources_with;
    use crate::storage::save_file::write_save;
    use macroquad::input::KeyCode;
    use macroquad::math::vec2;
    use tempfile::TempDir;

    const SCREEN: Vec2 = Vec2::new(800.0, 600.0);

    fn key(key: KeyCode) -> InputEvent {
        InputEvent::KeyPressed { key, control: false }
    }

    fn app(dir: &TempDir) -> AppState {
        let resources = test_resources_with(PlayerSettings::default(), dir.path().join("saves"));
        AppState::new(
            Config::default(),
            dir.path().join("config.ron"),
            resources,
            SoundBank::silent(),
        )
    }

    fn menu(app: &AppState) -> &MenuScreen {
        match &app.screen {
            Screen::Menu(menu) => menu,
            Screen::Game(_) => panic!("expected the menu"),
        }
    }

    #[test]
    fn test_start_and_return_to_menu() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        app.handle_event(&key(KeyCode::Enter), SCREEN);
        match &app.screen {
            Screen::Game(game) => {
                let player = game.player().unwrap();
                assert_eq!(game.world().ent(player).position(), vec2(400.0, 300.0));
            }
            Screen::Menu(_) => panic!("game didn't start"),
        }

        app.update(SCREEN);
        app.handle_event(&key(KeyCode::Escape), SCREEN);
        assert_eq!(menu(&app).items()[0], "Start");
    }

    #[test]
    fn test_load_save_from_menu() {
        let dir = TempDir::new().unwrap();
        let saves = dir.path().join("saves");
        write_save(
            &saves.join("slot.sav"),
            br#"{"42": {"kind": "player", "x": 5.0, "y": 6.0}}"#,
        )
        .unwrap();

        let mut app = app(&dir);
        app.handle_event(&key(KeyCode::Down), SCREEN);
        app.handle_event(&key(KeyCode::Enter), SCREEN);
        assert_eq!(menu(&app).items(), vec!["slot", "Back"]);

        app.handle_event(&key(KeyCode::Enter), SCREEN);
        match &app.screen {
            Screen::Game(game) => {
                assert_eq!(game.player(), Some(42));
                assert_eq!(game.world().ent(42).x, 5.0);
            }
            Screen::Menu(_) => panic!("save didn't load"),
        }
    }

    #[test]
    fn test_corrupt_save_shows_error() {
        let dir = TempDir::new().unwrap();
        let saves = dir.path().join("saves");
        std::fs::create_dir_all(&saves).unwrap();
        std::fs::write(saves.join("bad.sav"), b"garbage").unwrap();

        let mut app = app(&dir);
        app.handle_event(&key(KeyCode::Down), SCREEN);
        app.handle_event(&key(KeyCode::Enter), SCREEN);
        app.handle_event(&key(KeyCode::Enter), SCREEN);

        let status = menu(&app).status().unwrap();
        assert!(status.starts_with("Couldn't load save: "), "{}", status);
    }

    #[test]
    fn test_mute_persists_to_config() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        app.handle_event(&key(KeyCode::Down), SCREEN);
        app.handle_event(&key(KeyCode::Down), SCREEN);
        app.handle_event(&key(KeyCode::Enter), SCREEN);

        assert_eq!(menu(&app).items()[2], "Unmute");
        let saved = Config::load_or_create(&dir.path().join("config.ron")).unwrap();
        assert!(!saved.play_sounds);
    }

    #[test]
    fn test_quit() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_event(&key(KeyCode::Up), SCREEN);
        app.handle_event(&key(KeyCode::Enter), SCREEN);
        assert!(app.should_quit());
    }
}
