//! Main menu
//!
//! Two pages: the main page (start, load, mute, quit) and the save browser.
//! Rows are a fixed height starting at `MENU_TOP`, so mouse hit-testing
//! doesn't need the renderer.

use crate::game::draw::DrawTarget;
use crate::i18n::Localization;
use crate::input::InputEvent;
use crate::storage::save_file::SAVE_EXTENSION;
use crate::storage::{list_files, StorageError};
use macroquad::color::{Color, GRAY, WHITE};
use macroquad::input::{KeyCode, MouseButton};
use macroquad::math::vec2;
use std::path::PathBuf;
use std::sync::Arc;

const MENU_TOP: f32 = 120.0;
const ROW_HEIGHT: f32 = 48.0;
const FONT_SIZE: f32 = 32.0;
const STATUS_FONT_SIZE: f32 = 20.0;
const HIGHLIGHT: Color = Color::new(1.0, 0.8, 0.3, 1.0);

/// What the menu wants the application to do
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Start,
    Load(PathBuf),
    ToggleMute,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
enum MenuPage {
    Main,
    /// Save names, without extension
    Load(Vec<String>),
}

pub struct MenuScreen {
    strings: Arc<Localization>,
    saves_dir: PathBuf,
    page: MenuPage,
    selected: usize,
    muted: bool,
    /// Message under the menu (load errors, empty save list)
    status: Option<String>,
}

impl MenuScreen {
    pub fn new(strings: Arc<Localization>, saves_dir: PathBuf, muted: bool) -> Self {
        Self {
            strings,
            saves_dir,
            page: MenuPage::Main,
            selected: 0,
            muted,
            status: None,
        }
    }

    pub fn set_status(&mut self, status: String) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Labels of the rows on the current page
    pub fn items(&self) -> Vec<String> {
        let t = |key| self.strings.translate(key).to_string();
        match &self.page {
            MenuPage::Main => vec![
                t("gui.application.text.start"),
                t("gui.application.text.load"),
                if self.muted {
                    t("gui.application.text.unmute")
                } else {
                    t("gui.application.text.mute")
                },
                t("gui.application.text.quit"),
            ],
            MenuPage::Load(saves) => {
                let mut items = saves.clone();
                items.push(t("gui.application.text.back"));
                items
            }
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> Option<MenuAction> {
        let count = self.items().len();
        match *event {
            InputEvent::KeyPressed { key, control: false } => match key {
                KeyCode::Up | KeyCode::W => self.move_selection(count, -1),
                KeyCode::Down | KeyCode::S => self.move_selection(count, 1),
                KeyCode::Enter | KeyCode::KpEnter | KeyCode::Space => return self.activate(),
                KeyCode::Escape if matches!(self.page, MenuPage::Load(_)) => self.open_main(),
                _ => {}
            },
            InputEvent::MouseWheel { delta } if delta > 0.0 => self.move_selection(count, -1),
            InputEvent::MouseWheel { delta } if delta < 0.0 => self.move_selection(count, 1),
            InputEvent::MouseMoved { y, .. } => {
                if let Some(row) = row_at(y, count) {
                    self.selected = row;
                }
            }
            InputEvent::MouseButtonPressed { button: MouseButton::Left, y, .. } => {
                if let Some(row) = row_at(y, count) {
                    self.selected = row;
                    return self.activate();
                }
            }
            _ => {}
        }
        None
    }

    fn move_selection(&mut self, count: usize, step: isize) {
        if count == 0 {
            return;
        }
        self.selected = (self.selected as isize + step).rem_euclid(count as isize) as usize;
    }

    fn activate(&mut self) -> Option<MenuAction> {
        if let MenuPage::Load(saves) = &self.page {
            if let Some(name) = saves.get(self.selected) {
                let path = self.saves_dir.join(format!("{}.{}", name, SAVE_EXTENSION));
                return Some(MenuAction::Load(path));
            }
            // Back
            self.open_main();
            return None;
        }

        match self.selected {
            0 => Some(MenuAction::Start),
            1 => {
                self.open_saves();
                None
            }
            2 => Some(MenuAction::ToggleMute),
            3 => Some(MenuAction::Quit),
            _ => None,
        }
    }

    fn open_main(&mut self) {
        self.page = MenuPage::Main;
        self.selected = 1;
    }

    fn open_saves(&mut self) {
        let saves = match list_files(&self.saves_dir) {
            Ok(files) => files,
            // Nothing saved yet
            Err(StorageError::NotFound(_)) => Vec::new(),
            Err(e) => {
                tracing::warn!(dir = %self.saves_dir.display(), error = %e, "couldn't list saves");
                Vec::new()
            }
        };
        let suffix = format!(".{}", SAVE_EXTENSION);
        let saves: Vec<String> = saves
            .into_iter()
            .filter_map(|f| f.strip_suffix(&suffix).map(str::to_string))
            .collect();

        self.status = if saves.is_empty() {
            Some(self.strings.translate("gui.application.text.no_saves").to_string())
        } else {
            None
        };
        self.page = MenuPage::Load(saves);
        self.selected = 0;
    }

    pub fn draw(&self, target: &mut dyn DrawTarget) {
        let width = target.size().x;
        let items = self.items();

        for (i, label) in items.iter().enumerate() {
            let size = target.measure_text(label, FONT_SIZE);
            let y = MENU_TOP + i as f32 * ROW_HEIGHT + (ROW_HEIGHT - size.y) / 2.0;
            let color = if i == self.selected { HIGHLIGHT } else { WHITE };
            target.text(label, vec2((width - size.x) / 2.0, y), FONT_SIZE, color);
        }

        if let Some(status) = &self.status {
            let size = target.measure_text(status, STATUS_FONT_SIZE);
            let y = MENU_TOP + items.len() as f32 * ROW_HEIGHT + ROW_HEIGHT / 2.0;
            target.text(status, vec2((width - size.x) / 2.0, y), STATUS_FONT_SIZE, GRAY);
        }
    }
}

fn row_at(y: f32, count: usize) -> Option<usize> {
    if y < MENU_TOP {
        return None;
    }
    let row = ((y - MENU_TOP) / ROW_HEIGHT) as usize;
    (row < count).then_some(row)
}
