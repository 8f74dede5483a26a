//! Level blueprints
//!
//! A blueprint is a statically authored level: a text layout plus a tile
//! table, optionally linked to other blueprints through stairways. The
//! library holds every definition; the loader turns one into cells.
//!
//! On disk a library is a directory with a `blueprints.json` manifest:
//!
//! ```json
//! {
//!   "special_characters": "special_characters.json",
//!   "blueprints": [
//!     { "kind": "ground_floor", "layout": "ground_floor.txt",
//!       "tiles": "ground_floor.json", "stairs_down": "basement" }
//!   ]
//! }
//! ```

pub mod loader;
pub mod tiles;

pub use loader::{LoadedBlueprint, Spawn, load};
pub use tiles::{Palette, SpecialCharacter, TileTemplate};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::cell::StairDirection;

/// Name of a blueprint definition, e.g. "ground_floor"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintKind(String);

impl BlueprintKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlueprintKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for BlueprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one instantiated blueprint, unique within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlueprintId(pub u32);

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static definition of one level
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintDef {
    pub kind: BlueprintKind,
    /// Character grid, one row per line
    pub layout: String,
    pub tiles: Vec<TileTemplate>,
    /// Grid size; derived from the layout when absent
    pub size: Option<UVec2>,
    pub stairs_up: Option<BlueprintKind>,
    pub stairs_down: Option<BlueprintKind>,
}

impl BlueprintDef {
    pub fn new(kind: impl Into<BlueprintKind>, layout: impl Into<String>, tiles: Vec<TileTemplate>) -> Self {
        Self {
            kind: kind.into(),
            layout: layout.into(),
            tiles,
            size: None,
            stairs_up: None,
            stairs_down: None,
        }
    }

    pub fn with_stairs_up(mut self, target: impl Into<BlueprintKind>) -> Self {
        self.stairs_up = Some(target.into());
        self
    }

    pub fn with_stairs_down(mut self, target: impl Into<BlueprintKind>) -> Self {
        self.stairs_down = Some(target.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(UVec2::new(width, height));
        self
    }

    /// Blueprint a stairway in `direction` leads to
    pub fn link(&self, direction: StairDirection) -> Option<&BlueprintKind> {
        match direction {
            StairDirection::Up => self.stairs_up.as_ref(),
            StairDirection::Down => self.stairs_down.as_ref(),
        }
    }
}

/// Manifest entry naming a blueprint's files
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    kind: BlueprintKind,
    layout: String,
    tiles: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    stairs_up: Option<BlueprintKind>,
    #[serde(default)]
    stairs_down: Option<BlueprintKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    special_characters: String,
    blueprints: Vec<ManifestEntry>,
}

const MANIFEST: &str = "blueprints.json";

/// Blueprint files compiled into the binary
const BUILTIN_FILES: &[(&str, &str)] = &[
    (MANIFEST, include_str!("../../assets/blueprints/blueprints.json")),
    (
        "special_characters.json",
        include_str!("../../assets/blueprints/special_characters.json"),
    ),
    ("ground_floor.txt", include_str!("../../assets/blueprints/ground_floor.txt")),
    ("ground_floor.json", include_str!("../../assets/blueprints/ground_floor.json")),
    ("basement.txt", include_str!("../../assets/blueprints/basement.txt")),
    ("basement.json", include_str!("../../assets/blueprints/basement.json")),
];

/// Every known blueprint definition plus the shared special-character table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlueprintLibrary {
    defs: BTreeMap<BlueprintKind, BlueprintDef>,
    special: Vec<SpecialCharacter>,
}

impl BlueprintLibrary {
    pub fn new(special: Vec<SpecialCharacter>) -> Self {
        Self {
            defs: BTreeMap::new(),
            special,
        }
    }

    /// Ground floor and basement shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_manifest(|name| {
            BUILTIN_FILES
                .iter()
                .find(|(file, _)| *file == name)
                .map(|(_, contents)| contents.to_string())
                .ok_or_else(|| {
                    Error::io(name, std::io::Error::from(std::io::ErrorKind::NotFound))
                })
        })
    }

    /// Load every blueprint listed in `dir/blueprints.json`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let library = Self::from_manifest(|name| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| Error::io(path, e))
        })?;
        log::info!("Loaded {} blueprints from {}", library.len(), dir.display());
        Ok(library)
    }

    /// Build a library, reading files through `read`
    fn from_manifest<F>(read: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String>,
    {
        let manifest: Manifest =
            serde_json::from_str(&read(MANIFEST)?).map_err(|e| Error::table(MANIFEST, e))?;
        let special = tiles::parse_special(
            &manifest.special_characters,
            &read(&manifest.special_characters)?,
        )?;
        let mut library = Self::new(special);
        for entry in manifest.blueprints {
            let tiles = tiles::parse_tiles(&entry.tiles, &read(&entry.tiles)?)?;
            let size = match (entry.width, entry.height) {
                (Some(w), Some(h)) => Some(UVec2::new(w, h)),
                _ => None,
            };
            library.insert(BlueprintDef {
                kind: entry.kind,
                layout: read(&entry.layout)?,
                tiles,
                size,
                stairs_up: entry.stairs_up,
                stairs_down: entry.stairs_down,
            });
        }
        Ok(library)
    }

    /// Add or replace a definition
    pub fn insert(&mut self, def: BlueprintDef) {
        self.defs.insert(def.kind.clone(), def);
    }

    pub fn get(&self, kind: &BlueprintKind) -> Result<&BlueprintDef> {
        self.defs
            .get(kind)
            .ok_or_else(|| Error::BlueprintNotFound(kind.to_string()))
    }

    pub fn special_characters(&self) -> &[SpecialCharacter] {
        &self.special
    }

    pub fn kinds(&self) -> impl Iterator<Item = &BlueprintKind> {
        self.defs.keys()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
