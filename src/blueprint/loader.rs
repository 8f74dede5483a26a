//! Blueprint loading: layout text + tile table -> cells
//!
//! Every glyph in the layout must be the empty glyph, a tile from the
//! blueprint's table, or a reserved special character. Anything else is a
//! configuration error and loading stops at the first one.

use glam::{IVec2, UVec2};

use super::tiles::{Palette, SpecialCharacter};
use super::{BlueprintDef, BlueprintKind, BlueprintLibrary};
use crate::consts::EMPTY_GLYPH;
use crate::error::{Error, Result};
use crate::sim::cell::{Cell, CellEffect};

/// A special character found in the layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
    pub role: String,
    pub position: IVec2,
}

/// Cells and metadata for one parsed blueprint
#[derive(Debug, Clone)]
pub struct LoadedBlueprint {
    pub kind: BlueprintKind,
    pub size: UVec2,
    /// Row-major, `size.x * size.y` long
    pub cells: Vec<Cell>,
    /// In layout order
    pub spawns: Vec<Spawn>,
    pub palette: Palette,
}

impl LoadedBlueprint {
    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    /// First spawn with `role`
    pub fn spawn(&self, role: &str) -> Option<IVec2> {
        self.spawns.iter().find(|s| s.role == role).map(|s| s.position)
    }
}

/// Parse the blueprint `kind` from `library`
pub fn load(library: &BlueprintLibrary, kind: &BlueprintKind, dim_ratio: f32) -> Result<LoadedBlueprint> {
    let def = library.get(kind)?;
    let special = library.special_characters();
    check_special_table(special)?;
    let palette = Palette::new(kind.as_str(), &def.tiles, special, dim_ratio)?;

    let rows: Vec<Vec<char>> = def.layout.lines().map(|l| l.chars().collect()).collect();
    let size = layout_size(def, &rows)?;

    let mut cells = Vec::with_capacity((size.x * size.y) as usize);
    let mut spawns = Vec::new();
    for y in 0..size.y as usize {
        let row = rows.get(y).map(Vec::as_slice).unwrap_or_default();
        for x in 0..size.x as usize {
            // Short rows are padded with blank
            let glyph = row.get(x).copied().unwrap_or(EMPTY_GLYPH);
            let position = IVec2::new(x as i32, y as i32);
            let mut cell = resolve(def, &palette, special, glyph, position, &mut spawns)?;
            attach_stairs(def, &mut cell)?;
            cells.push(cell);
        }
    }

    log::debug!(
        "Parsed blueprint {}: {}x{}, {} spawns",
        kind,
        size.x,
        size.y,
        spawns.len()
    );
    Ok(LoadedBlueprint {
        kind: kind.clone(),
        size,
        cells,
        spawns,
        palette,
    })
}

fn check_special_table(special: &[SpecialCharacter]) -> Result<()> {
    for (i, entry) in special.iter().enumerate() {
        if entry.glyph == EMPTY_GLYPH || special[..i].iter().any(|s| s.glyph == entry.glyph) {
            return Err(Error::DuplicateGlyph {
                blueprint: "special_characters".to_string(),
                glyph: entry.glyph,
            });
        }
    }
    Ok(())
}

fn layout_size(def: &BlueprintDef, rows: &[Vec<char>]) -> Result<UVec2> {
    let longest = rows.iter().map(Vec::len).max().unwrap_or(0);
    let size = def
        .size
        .unwrap_or_else(|| UVec2::new(longest as u32, rows.len() as u32));
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() > size.x as usize) {
        return Err(Error::LayoutTooWide {
            blueprint: def.kind.to_string(),
            row,
            len: r.len(),
            width: size.x,
        });
    }
    if rows.len() > size.y as usize {
        return Err(Error::LayoutTooTall {
            blueprint: def.kind.to_string(),
            rows: rows.len(),
            height: size.y,
        });
    }
    Ok(size)
}

fn resolve(
    def: &BlueprintDef,
    palette: &Palette,
    special: &[SpecialCharacter],
    glyph: char,
    position: IVec2,
    spawns: &mut Vec<Spawn>,
) -> Result<Cell> {
    if glyph == EMPTY_GLYPH {
        return Ok(Cell::new(position));
    }
    let unknown = |glyph| Error::UnknownGlyph {
        blueprint: def.kind.to_string(),
        glyph,
        x: position.x,
        y: position.y,
    };
    if let Some(cell) = palette.cell(glyph, position) {
        return Ok(cell);
    }
    let entry = special
        .iter()
        .find(|s| s.glyph == glyph)
        .ok_or_else(|| unknown(glyph))?;
    spawns.push(Spawn {
        role: entry.role.clone(),
        position,
    });
    match entry.floor {
        Some(floor) => palette.cell(floor, position).ok_or_else(|| unknown(floor)),
        None => Ok(Cell::new(position)),
    }
}

/// Stairway cells get an effect pointing at the linked blueprint
fn attach_stairs(def: &BlueprintDef, cell: &mut Cell) -> Result<()> {
    let Some(direction) = cell.stairs() else {
        return Ok(());
    };
    let target = def.link(direction).ok_or_else(|| Error::MissingStairLink {
        blueprint: def.kind.to_string(),
        name: direction.cell_name().to_string(),
    })?;
    cell.on_enter = Some(CellEffect::StairsTransition {
        direction,
        target: target.clone(),
    });
    Ok(())
}
