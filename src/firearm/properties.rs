//! Firearm catalog
//!
//! Weapon definitions are JSON files in the firearms directory, one weapon
//! per file. They are read once at startup into a `FirearmCatalog` that is
//! shared read-only with every world.

use crate::storage::{list_files, StorageError};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How the trigger translates into shots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireMode {
    /// Fires continuously while the trigger is held
    FullAuto,
    /// One shot per trigger press
    SemiAuto,
    /// One shot on press and another on release
    SemiAutoResponseTrigger,
    /// Press-fired like `SemiAuto`. No definition token maps here yet.
    Shotgun,
}

impl FromStr for FireMode {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-auto" => Ok(FireMode::FullAuto),
            "semi-auto" | "bolt-action" | "single-shot" => Ok(FireMode::SemiAuto),
            "semi-auto-response-trigger" => Ok(FireMode::SemiAutoResponseTrigger),
            other => Err(DefinitionError::UnknownFireMode(other.to_string())),
        }
    }
}

impl fmt::Display for FireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            FireMode::FullAuto => "full-auto",
            FireMode::SemiAuto => "semi-auto",
            FireMode::SemiAutoResponseTrigger => "semi-auto-response-trigger",
            FireMode::Shotgun => "shotgun",
        };
        f.write_str(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletProperties {
    /// Muzzle velocity
    pub speed: f32,
    /// Fraction of velocity lost per tick
    pub speed_loss: f32,
}

/// Angular deviation applied to every projectile, in signed degrees
/// (the sign picks the side of the aim line)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub min: f32,
    pub max: f32,
}

/// One catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct FirearmProperties {
    pub id: String,
    pub name: String,
    pub bullet: BulletProperties,
    pub fire_mode: FireMode,
    /// Minimum time between two shots
    pub action_speed: Duration,
    /// Time a magazine swap takes
    pub reload_speed: Duration,
    pub mag_size: u32,
    /// Magazines carried, including the loaded one
    pub mag_quantity: u32,
    pub spread: Option<Spread>,
    pub projectiles_per_shot: u32,
    pub shoot_sounds: Vec<String>,
    pub reload_sound: Option<String>,
}

/// A single definition that can't be turned into properties
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("\"{0}\" is not a fire_mode")]
    UnknownFireMode(String),
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidInterval { field: &'static str, value: f32 },
    #[error("spread min ({min}) is greater than max ({max})")]
    InvalidSpread { min: f32, max: f32 },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("couldn't list {}: {source}", dir.display())]
    Listing {
        dir: PathBuf,
        #[source]
        source: StorageError,
    },
    #[error("couldn't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid firearm definition: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: {source}", path.display())]
    Definition {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },
    #[error("firearm id \"{id}\" is defined more than once")]
    Duplicate { id: String },
    #[error("no firearm with id \"{0}\"")]
    Missing(String),
}

// On-disk layout of a definition file

#[derive(Deserialize)]
struct FirearmDefinition {
    id: String,
    name: String,
    bullet: BulletDefinition,
    fire_mode: String,
    action_speed: f32,
    reload_speed: f32,
    mag_size: u32,
    mag_quantity: u32,
    spread: Option<SpreadDefinition>,
    projectiles_per_shot: Option<u32>,
    sounds: Option<SoundsDefinition>,
}

#[derive(Deserialize)]
struct BulletDefinition {
    speed: f32,
    speed_loss: f32,
}

#[derive(Deserialize)]
struct SpreadDefinition {
    on: bool,
    min: f32,
    max: f32,
}

#[derive(Deserialize)]
struct SoundsDefinition {
    #[serde(default)]
    shoot: Vec<String>,
    reload: Option<String>,
}

fn interval(field: &'static str, value: f32) -> Result<Duration, DefinitionError> {
    Duration::try_from_secs_f32(value).map_err(|_| DefinitionError::InvalidInterval { field, value })
}

impl TryFrom<FirearmDefinition> for FirearmProperties {
    type Error = DefinitionError;

    fn try_from(def: FirearmDefinition) -> Result<Self, Self::Error> {
        let spread = match def.spread {
            Some(s) if s.on => {
                if s.min > s.max {
                    return Err(DefinitionError::InvalidSpread { min: s.min, max: s.max });
                }
                Some(Spread { min: s.min, max: s.max })
            }
            _ => None,
        };
        let (shoot_sounds, reload_sound) = match def.sounds {
            Some(s) => (s.shoot, s.reload),
            None => (Vec::new(), None),
        };

        Ok(FirearmProperties {
            fire_mode: def.fire_mode.parse()?,
            action_speed: interval("action_speed", def.action_speed)?,
            reload_speed: interval("reload_speed", def.reload_speed)?,
            id: def.id,
            name: def.name,
            bullet: BulletProperties {
                speed: def.bullet.speed,
                speed_loss: def.bullet.speed_loss,
            },
            mag_size: def.mag_size,
            mag_quantity: def.mag_quantity,
            spread,
            projectiles_per_shot: def.projectiles_per_shot.unwrap_or(1).max(1),
            shoot_sounds,
            reload_sound,
        })
    }
}

impl FirearmProperties {
    /// Parse a single definition file's contents
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let def: FirearmDefinition = serde_json::from_str(text)?;
        FirearmProperties::try_from(def).map_err(<serde_json::Error as serde::de::Error>::custom)
    }
}

/// Every known firearm, keyed by id
#[derive(Debug, Clone, Default)]
pub struct FirearmCatalog {
    firearms: BTreeMap<String, Arc<FirearmProperties>>,
}

impl FirearmCatalog {
    /// Load every `*.json` file in `dir`.
    ///
    /// Any unreadable or invalid file fails the whole load.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let files = list_files(dir).map_err(|source| CatalogError::Listing {
            dir: dir.to_path_buf(),
            source,
        })?;

        let mut catalog = FirearmCatalog::default();
        for file in files.iter().filter(|f| f.ends_with(".json")) {
            let path = dir.join(file);
            let text = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let def: FirearmDefinition = serde_json::from_str(&text).map_err(|source| CatalogError::Json {
                path: path.clone(),
                source,
            })?;
            let props = FirearmProperties::try_from(def)
                .map_err(|source| CatalogError::Definition { path, source })?;
            catalog.insert(props)?;
        }

        tracing::info!(dir = %dir.display(), count = catalog.len(), "loaded firearm catalog");
        Ok(catalog)
    }

    /// Build a catalog from already-constructed entries
    pub fn from_properties<I>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = FirearmProperties>,
    {
        let mut catalog = FirearmCatalog::default();
        for props in entries {
            catalog.insert(props)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, props: FirearmProperties) -> Result<(), CatalogError> {
        if self.firearms.contains_key(&props.id) {
            return Err(CatalogError::Duplicate { id: props.id });
        }
        tracing::debug!(id = %props.id, mode = %props.fire_mode, "registered firearm");
        self.firearms.insert(props.id.clone(), Arc::new(props));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<FirearmProperties>> {
        self.firearms.get(id)
    }

    /// Like `get`, but an absent id is an error
    pub fn require(&self, id: &str) -> Result<&Arc<FirearmProperties>, CatalogError> {
        self.get(id).ok_or_else(|| CatalogError::Missing(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.firearms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firearms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FirearmProperties>> {
        self.firearms.values()
    }

    /// Every sound id referenced by any firearm
    pub fn sound_ids(&self) -> BTreeSet<&str> {
        self.iter()
            .flat_map(|p| p.shoot_sounds.iter().chain(p.reload_sound.iter()))
            .map(String::as_str)
            .collect()
    }
}

impl Index<&str> for FirearmCatalog {
    type Output = Arc<FirearmProperties>;

    fn index(&self, id: &str) -> &Self::Output {
        match self.firearms.get(id) {
            Some(props) => props,
            None => panic!("no firearm with id \"{}\"", id),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(id: &str, fire_mode: FireMode) -> FirearmProperties {
    FirearmProperties {
        id: id.to_string(),
        name: format!("Test {}", id),
        bullet: BulletProperties {
            speed: 20.0,
            speed_loss: 0.05,
        },
        fire_mode,
        action_speed: Duration::from_millis(100),
        reload_speed: Duration::from_millis(500),
        mag_size: 10,
        mag_quantity: 2,
        spread: None,
        projectiles_per_shot: 1,
        shoot_sounds: vec!["shot-a".to_string(), "shot-b".to_string()],
        reload_sound: Some("reload".to_string()),
    }
}
