//! Localized UI strings
//!
//! Language files are flat JSON objects (`"key": "text"`) stored under
//! `<assets>/lang/<language>.json`. Keys missing from the file fall back to
//! the built-in English table, then to the key itself.

use std::collections::HashMap;
use std::path::Path;

const BUILTIN: &[(&str, &str)] = &[
    ("gui.application.text.start", "Start"),
    ("gui.application.text.load", "Load"),
    ("gui.application.text.back", "Back"),
    ("gui.application.text.mute", "Mute"),
    ("gui.application.text.unmute", "Unmute"),
    ("gui.application.text.quit", "Quit"),
    ("gui.application.text.no_saves", "No saves found"),
    ("gui.application.text.load_error", "Couldn't load save: {}"),
    ("gui.world.text.save_success", "Saved as {}"),
    ("gui.world.text.save_compression_error", "Couldn't save the game: {}"),
    ("gui.world.text.reloading", "Reloading"),
];

#[derive(Debug, Clone)]
pub struct Localization {
    strings: HashMap<String, String>,
}

impl Localization {
    /// English strings compiled into the binary
    pub fn builtin() -> Self {
        Self {
            strings: BUILTIN
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Load `<dir>/<language>.json` over the built-in table.
    ///
    /// A missing or malformed file is logged and leaves the built-in strings.
    pub fn load(dir: &Path, language: &str) -> Self {
        let mut localization = Self::builtin();
        let path = dir.join(format!("{}.json", language));

        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<HashMap<String, String>>(&text) {
                Ok(strings) => {
                    tracing::debug!(language, count = strings.len(), "loaded language file");
                    localization.strings.extend(strings);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "malformed language file"),
            },
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "language file unavailable"),
        }
        localization
    }

    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Translate `key` and fill its `{}` placeholders in order.
    ///
    /// Placeholders without a matching argument stay as they are; extra
    /// arguments are ignored. Argument text is never scanned for placeholders.
    pub fn format(&self, key: &str, args: &[&str]) -> String {
        let mut args = args.iter();
        let mut pieces = self.translate(key).split("{}");
        let mut text = pieces.next().unwrap_or_default().to_string();
        for piece in pieces {
            text.push_str(args.next().copied().unwrap_or("{}"));
            text.push_str(piece);
        }
        text
    }
}

impl Default for Localization {
    fn default() -> Self {
        Self::builtin()
    }
}
