//! Grid cells
//!
//! A cell is a plain value: reading it from a grid hands out a clone, and the
//! only way back in is `Grid::set_cell`. Light state (`brightness`,
//! `light_sources`) is owned by the light engine and ignored on write.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::blueprint::BlueprintKind;
use crate::color::Color;
use crate::consts::{STAIRS_DOWN_NAME, STAIRS_UP_NAME};
use crate::distance_sq;

/// Which way a stairway leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StairDirection {
    Up,
    Down,
}

impl StairDirection {
    /// Cell name carrying this direction
    pub fn cell_name(&self) -> &'static str {
        match self {
            StairDirection::Up => STAIRS_UP_NAME,
            StairDirection::Down => STAIRS_DOWN_NAME,
        }
    }

    /// The stairway you arrive on after taking this one
    pub fn complement(&self) -> Self {
        match self {
            StairDirection::Up => StairDirection::Down,
            StairDirection::Down => StairDirection::Up,
        }
    }

    pub fn from_cell_name(name: &str) -> Option<Self> {
        match name {
            STAIRS_UP_NAME => Some(StairDirection::Up),
            STAIRS_DOWN_NAME => Some(StairDirection::Down),
            _ => None,
        }
    }
}

/// Effect fired when an actor steps onto a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellEffect {
    /// Move the actor to the linked blueprint
    StairsTransition {
        direction: StairDirection,
        target: BlueprintKind,
    },
}

/// Light a cell emits itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub emits: bool,
    pub radius: u32,
    pub color: Color,
    /// Peak brightness multiplier in (0, 1]
    pub intensity: f32,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            emits: false,
            radius: 0,
            color: Color::WHITE,
            intensity: 1.0,
        }
    }
}

/// One light source's share of a cell's illumination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightContribution {
    /// Position of the emitting cell in the same grid
    pub source: IVec2,
    pub level: f32,
    pub color: Color,
}

/// One grid position's physical, visual and light state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub position: IVec2,

    // === Visual ===
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
    /// Colours used when explored but not currently visible
    pub dim_fg: Color,
    pub dim_bg: Color,

    // === Physical ===
    /// Tile class identifier from the tile table
    pub class: String,
    /// Display name (localization key)
    pub name: Option<String>,
    pub walkable: bool,
    pub blocks_fov: bool,
    pub interactable: bool,
    /// Once true, never reset
    pub explored: bool,

    // === Light ===
    pub emitter: Emitter,
    pub brightness: f32,
    pub light_sources: Vec<LightContribution>,

    /// Fired when an actor steps onto the cell
    pub on_enter: Option<CellEffect>,
}

impl Cell {
    /// A blank, non-walkable, see-through cell
    pub fn new(position: IVec2) -> Self {
        Self {
            position,
            glyph: ' ',
            fg: Color::BLACK,
            bg: Color::BLACK,
            dim_fg: Color::BLACK,
            dim_bg: Color::BLACK,
            class: String::new(),
            name: None,
            walkable: false,
            blocks_fov: false,
            interactable: false,
            explored: false,
            emitter: Emitter::default(),
            brightness: 0.0,
            light_sources: Vec::new(),
            on_enter: None,
        }
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn emits_light(&self) -> bool {
        self.emitter.emits
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Direction of this cell's stairway, if it is one
    pub fn stairs(&self) -> Option<StairDirection> {
        self.name.as_deref().and_then(StairDirection::from_cell_name)
    }

    /// Closest contributing light; ties go to the earliest contribution
    pub fn nearest_light(&self) -> Option<&LightContribution> {
        self.light_sources
            .iter()
            .min_by_key(|c| distance_sq(c.source, self.position))
    }

    /// Brightest remaining contribution, or 0 with none
    pub(crate) fn recompute_brightness(&mut self) {
        self.brightness = self
            .light_sources
            .iter()
            .map(|c| c.level)
            .fold(0.0, f32::max);
    }

    /// Copy everything the caller may change, keeping position and light state.
    /// `explored` only ever moves false -> true.
    pub(crate) fn assign_from(&mut self, other: &Cell) {
        self.glyph = other.glyph;
        self.fg = other.fg;
        self.bg = other.bg;
        self.dim_fg = other.dim_fg;
        self.dim_bg = other.dim_bg;
        self.class.clone_from(&other.class);
        self.name.clone_from(&other.name);
        self.walkable = other.walkable;
        self.blocks_fov = other.blocks_fov;
        self.interactable = other.interactable;
        self.explored |= other.explored;
        self.emitter = other.emitter;
        self.on_enter.clone_from(&other.on_enter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lit_cell() -> Cell {
        let mut cell = Cell::new(IVec2::new(2, 3));
        cell.glyph = '+';
        cell.name = Some(STAIRS_DOWN_NAME.to_string());
        cell.on_enter = Some(CellEffect::StairsTransition {
            direction: StairDirection::Down,
            target: BlueprintKind::new("basement"),
        });
        cell.light_sources.push(LightContribution {
            source: IVec2::new(0, 3),
            level: 0.4,
            color: Color::rgb(255, 0, 0),
        });
        cell.light_sources.push(LightContribution {
            source: IVec2::new(4, 3),
            level: 0.6,
            color: Color::rgb(0, 0, 255),
        });
        cell.recompute_brightness();
        cell
    }

    #[test]
    fn test_clone_is_deep() {
        let original = lit_cell();
        let mut copy = original.clone();
        assert_eq!(copy, original);
        copy.light_sources.clear();
        copy.on_enter = None;
        assert_eq!(original.light_sources.len(), 2);
        assert!(original.on_enter.is_some());
    }

    #[test]
    fn test_nearest_light_tie_goes_to_first() {
        let cell = lit_cell();
        // Both sources are 2 away
        assert_eq!(cell.nearest_light().unwrap().source, IVec2::new(0, 3));
        assert!((cell.brightness - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_stairs_direction() {
        let cell = lit_cell();
        assert_eq!(cell.stairs(), Some(StairDirection::Down));
        assert_eq!(StairDirection::Down.complement(), StairDirection::Up);
        assert_eq!(StairDirection::Up.complement().cell_name(), STAIRS_DOWN_NAME);
        assert_eq!(Cell::new(IVec2::ZERO).stairs(), None);
    }

    #[test]
    fn test_assign_keeps_light_state_and_explored() {
        let mut stored = lit_cell();
        stored.explored = true;
        let mut incoming = Cell::new(IVec2::new(9, 9));
        incoming.walkable = true;
        stored.assign_from(&incoming);
        assert!(stored.walkable);
        assert!(stored.explored);
        assert_eq!(stored.position, IVec2::new(2, 3));
        assert_eq!(stored.light_sources.len(), 2);
        assert_eq!(stored.on_enter, None);
    }

    proptest! {
        #[test]
        fn prop_clone_round_trip(
            x in -50i32..50, y in -50i32..50,
            glyph in proptest::char::range('!', '~'),
            walkable: bool, blocks: bool, explored: bool,
            radius in 0u32..12, level in 0.0f32..1.0,
        ) {
            let mut cell = Cell::new(IVec2::new(x, y));
            cell.glyph = glyph;
            cell.walkable = walkable;
            cell.blocks_fov = blocks;
            cell.explored = explored;
            cell.emitter.emits = radius > 0;
            cell.emitter.radius = radius;
            cell.light_sources.push(LightContribution {
                source: IVec2::new(x, y),
                level,
                color: Color::rgb(glyph as u8, 0, 0),
            });
            cell.recompute_brightness();
            let copy = cell.clone();
            prop_assert_eq!(copy, cell);
        }
    }
}
