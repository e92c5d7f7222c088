//! rebarbs: a top-down 2D shooter
//!
//! Move with WASD, aim with the mouse, shoot with the left button and
//! reload with R. Ctrl+[ saves the running game; Escape returns to the menu.
//! Weapons are data: one JSON file per firearm in the assets directory.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod audio;
mod config;
mod firearm;
mod game;
mod i18n;
mod input;
mod screens;
mod storage;

use app::AppState;
use audio::SoundBank;
use config::{Config, ConfigError};
use firearm::{CatalogError, FirearmCatalog};
use game::draw::ScreenTarget;
use game::WorldResources;
use i18n::Localization;
use input::EventPump;
use macroquad::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("firearms: {0}")]
    Catalog(#[from] CatalogError),
}

fn window_conf() -> Conf {
    // Read here as well as in main: swap interval is fixed at window creation
    let vsync = Config::load_or_create(&Config::default_path())
        .map(|c| c.vsync)
        .unwrap_or(true);

    Conf {
        window_title: format!("rebarbs v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        platform: miniquad::conf::Platform {
            swap_interval: Some(if vsync { 1 } else { 0 }),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rebarbs=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Everything that has to succeed before a window is worth showing
fn startup() -> Result<(Config, std::path::PathBuf, Arc<WorldResources>), StartupError> {
    let config_path = Config::default_path();
    let config = Config::load_or_create(&config_path)?;

    let strings = Arc::new(Localization::load(&config.lang_dir(), &config.language));
    let catalog = Arc::new(FirearmCatalog::load(&config.firearms_dir())?);

    let resources = WorldResources::new(
        catalog,
        strings,
        config.player.clone(),
        config.effective_fps(),
        config.saves_dir.clone(),
    )?;
    Ok((config, config_path, Arc::new(resources)))
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    init_logging();
    tracing::info!(version = VERSION, "starting");

    let (config, config_path, resources) = match startup() {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            std::process::exit(1);
        }
    };

    let sounds = SoundBank::load(
        &config.sounds_dir(),
        resources.catalog.sound_ids(),
        config.sound_effect_volume,
        config.play_sounds,
    )
    .await;

    // None when vsync paces the frames
    let target_frame_time = (!config.vsync).then(|| 1.0 / config.effective_fps() as f64);

    let mut pump = EventPump::new();
    let mut app = AppState::new(config, config_path, resources, sounds);

    loop {
        let frame_start = get_time();
        let screen = vec2(screen_width(), screen_height());

        for event in pump.poll() {
            app.handle_event(&event, screen);
        }
        if app.should_quit() {
            break;
        }

        app.update(screen);

        clear_background(Color::from_rgba(24, 24, 28, 255));
        app.draw(&mut ScreenTarget);

        // ===== FPS limiting =====
        if let Some(target_frame_time) = target_frame_time {
            let elapsed = get_time() - frame_start;
            let remaining = target_frame_time - elapsed;

            if remaining > 0.0 {
                // Native: use sleep for bulk, then spin-wait for precision
                #[cfg(not(target_arch = "wasm32"))]
                {
                    let spin_margin = 0.002; // 2ms
                    while get_time() - frame_start + spin_margin < target_frame_time {
                        std::thread::sleep(std::time::Duration::from_millis(1));
                    }
                    while get_time() - frame_start < target_frame_time {
                        std::hint::spin_loop();
                    }
                }
                // WASM: just spin-wait (no thread::sleep available)
                #[cfg(target_arch = "wasm32")]
                {
                    while get_time() - frame_start < target_frame_time {}
                }
            }
        }

        next_frame().await;
    }

    tracing::info!("bye");
}
