//! Sound effects
//!
//! Firearms only name their sounds; the world queues those names and the
//! frontend plays them from this bank. Files live in the sounds directory
//! as `<id>.wav` or `<id>.ogg`.

use macroquad::audio::{load_sound, play_sound, PlaySoundParams, Sound};
use std::collections::HashMap;
use std::path::Path;

const EXTENSIONS: [&str; 2] = ["wav", "ogg"];

pub struct SoundBank {
    sounds: HashMap<String, Sound>,
    volume: f32,
    enabled: bool,
}

impl SoundBank {
    /// A bank that never plays anything
    pub fn silent() -> Self {
        Self {
            sounds: HashMap::new(),
            volume: 0.0,
            enabled: false,
        }
    }

    /// Load every sound in `ids` from `dir`. Missing files are logged and
    /// skipped.
    pub async fn load<'a, I>(dir: &Path, ids: I, volume: f32, enabled: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut sounds = HashMap::new();
        for id in ids {
            match load_first(dir, id).await {
                Some(sound) => {
                    sounds.insert(id.to_string(), sound);
                }
                None => tracing::warn!(sound = id, dir = %dir.display(), "sound effect not found"),
            }
        }
        tracing::info!(count = sounds.len(), "loaded sound effects");

        Self {
            sounds,
            volume,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Play `id` once if sound is on and it was loaded
    pub fn play(&self, id: &str) {
        if !self.enabled {
            return;
        }
        match self.sounds.get(id) {
            Some(sound) => play_sound(
                sound,
                PlaySoundParams {
                    looped: false,
                    volume: self.volume,
                },
            ),
            None => tracing::debug!(sound = id, "no such sound loaded"),
        }
    }
}

async fn load_first(dir: &Path, id: &str) -> Option<Sound> {
    for ext in EXTENSIONS {
        let path = dir.join(format!("{}.{}", id, ext));
        if !path.is_file() {
            continue;
        }
        match load_sound(&path.to_string_lossy()).await {
            Ok(sound) => return Some(sound),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "couldn't decode sound"),
        }
    }
    None
}
