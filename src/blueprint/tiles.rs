//! Tile and special-character tables
//!
//! A tile table is a JSON array of [`TileTemplate`]s, one per glyph. The
//! special-character table reserves glyphs (spawn markers and the like) that
//! no tile table may reuse.

use std::collections::HashMap;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::consts::MAX_RADIUS;
use crate::error::{Error, Result};
use crate::sim::cell::{Cell, Emitter};

fn default_foreground() -> Color {
    Color::WHITE
}

fn default_light_color() -> Color {
    Color::WHITE
}

fn default_brightness() -> f32 {
    1.0
}

/// Attributes for every cell drawn with one glyph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileTemplate {
    /// Class identifier (e.g. "Wall", "Door")
    pub class: String,
    pub glyph: char,
    /// Display-name key; "stairs_up" / "stairs_down" mark stairways
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub walkable: bool,
    #[serde(default)]
    pub interactable: bool,
    #[serde(default = "default_foreground")]
    pub foreground: Color,
    #[serde(default)]
    pub background: Color,
    #[serde(default)]
    pub blocks_fov: bool,
    #[serde(default)]
    pub emits_light: bool,
    #[serde(default = "default_light_color")]
    pub light_color: Color,
    #[serde(default)]
    pub light_radius: u32,
    /// Peak intensity of the emitted light
    #[serde(default = "default_brightness")]
    pub brightness: f32,
    /// Glyph of the tile this one becomes when interacted with
    #[serde(default)]
    pub toggle: Option<char>,
}

impl TileTemplate {
    pub fn emitter(&self) -> Emitter {
        Emitter {
            emits: self.emits_light,
            radius: self.light_radius.min(MAX_RADIUS),
            color: self.light_color,
            intensity: self.brightness.clamp(0.0, 1.0),
        }
    }

    /// Fresh cell at `position`
    pub fn to_cell(&self, position: IVec2, dim_ratio: f32) -> Cell {
        let mut cell = Cell::new(position);
        self.apply_to(&mut cell, dim_ratio);
        cell
    }

    /// Overwrite the tile-defined attributes of `cell`.
    ///
    /// Position, exploration, light state and `on_enter` are left alone.
    pub fn apply_to(&self, cell: &mut Cell, dim_ratio: f32) {
        cell.glyph = self.glyph;
        cell.class.clone_from(&self.class);
        cell.name.clone_from(&self.name);
        cell.fg = self.foreground;
        cell.bg = self.background;
        cell.dim_fg = self.foreground.dimmed(dim_ratio);
        cell.dim_bg = self.background.dimmed(dim_ratio);
        cell.walkable = self.walkable;
        cell.interactable = self.interactable;
        cell.blocks_fov = self.blocks_fov;
        cell.emitter = self.emitter();
    }
}

/// A reserved glyph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCharacter {
    pub glyph: char,
    /// What the glyph stands for, e.g. "player"
    pub role: String,
    /// Tile glyph placed underneath; blank when absent
    #[serde(default)]
    pub floor: Option<char>,
}

/// Parse a tile table
pub fn parse_tiles(what: &str, json: &str) -> Result<Vec<TileTemplate>> {
    serde_json::from_str(json).map_err(|e| Error::table(what, e))
}

/// Parse a special-character table
pub fn parse_special(what: &str, json: &str) -> Result<Vec<SpecialCharacter>> {
    serde_json::from_str(json).map_err(|e| Error::table(what, e))
}

/// Tile templates of one blueprint, keyed by glyph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    tiles: HashMap<char, TileTemplate>,
    dim_ratio: f32,
}

impl Palette {
    /// Index `tiles` by glyph, rejecting duplicates and reserved glyphs
    pub fn new(
        blueprint: &str,
        tiles: &[TileTemplate],
        special: &[SpecialCharacter],
        dim_ratio: f32,
    ) -> Result<Self> {
        let mut map = HashMap::with_capacity(tiles.len());
        for tile in tiles {
            if special.iter().any(|s| s.glyph == tile.glyph) {
                return Err(Error::ReservedGlyph {
                    blueprint: blueprint.to_string(),
                    glyph: tile.glyph,
                });
            }
            if map.insert(tile.glyph, tile.clone()).is_some() {
                return Err(Error::DuplicateGlyph {
                    blueprint: blueprint.to_string(),
                    glyph: tile.glyph,
                });
            }
        }
        Ok(Self {
            tiles: map,
            dim_ratio,
        })
    }

    pub fn get(&self, glyph: char) -> Option<&TileTemplate> {
        self.tiles.get(&glyph)
    }

    pub fn dim_ratio(&self) -> f32 {
        self.dim_ratio
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Cell for `glyph` at `position`
    pub fn cell(&self, glyph: char, position: IVec2) -> Option<Cell> {
        self.get(glyph).map(|t| t.to_cell(position, self.dim_ratio))
    }

    /// What `cell` turns into when used, if its tile declares a toggle
    pub fn toggled(&self, cell: &Cell) -> Option<Cell> {
        let target = self.get(self.get(cell.glyph)?.toggle?)?;
        let mut next = cell.clone();
        target.apply_to(&mut next, self.dim_ratio);
        Some(next)
    }
}
