//! Error types for grid access and blueprint configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading levels or touching the grid.
///
/// Everything except [`Error::OutOfBounds`], [`Error::UnknownActor`] and
/// [`Error::UnknownBlueprint`] is a configuration error: the level cannot be
/// played in its current state, so these are never retried.
#[derive(Debug, Error)]
pub enum Error {
    /// No blueprint definition registered under this kind
    #[error("Blueprint not found: {0}")]
    BlueprintNotFound(String),

    /// A blueprint or settings file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tile table, special-character table or manifest is malformed
    #[error("Malformed table in {what}: {source}")]
    TileTable {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Layout uses a glyph with no tile entry
    #[error("Blueprint {blueprint}: glyph {glyph:?} at ({x}, {y}) has no tile entry")]
    UnknownGlyph {
        blueprint: String,
        glyph: char,
        x: i32,
        y: i32,
    },

    /// Glyph is defined in both the tile table and the special table
    #[error("Blueprint {blueprint}: glyph {glyph:?} is reserved as a special character")]
    ReservedGlyph { blueprint: String, glyph: char },

    /// Glyph appears twice in one table
    #[error("Blueprint {blueprint}: glyph {glyph:?} is defined more than once")]
    DuplicateGlyph { blueprint: String, glyph: char },

    /// Colour string is neither a known name nor `#RRGGBB[AA]`
    #[error("Invalid colour: {0:?}")]
    InvalidColor(String),

    /// Layout row longer than the declared grid width
    #[error("Blueprint {blueprint}: row {row} is {len} wide, grid is {width}")]
    LayoutTooWide {
        blueprint: String,
        row: usize,
        len: usize,
        width: u32,
    },

    /// More layout rows than the declared grid height
    #[error("Blueprint {blueprint}: layout has {rows} rows, grid is {height}")]
    LayoutTooTall {
        blueprint: String,
        rows: usize,
        height: u32,
    },

    /// Stairway cell with no linked blueprint in that direction
    #[error("Blueprint {blueprint}: has a {name} cell but no linked blueprint")]
    MissingStairLink { blueprint: String, name: String },

    /// Target level has no complementary stairway to arrive on
    #[error("Blueprint {blueprint}: no {name} cell to arrive on")]
    MissingStairway { blueprint: String, name: String },

    /// Starting level has no spawn point for a required role
    #[error("Blueprint {blueprint}: no {role} spawn point")]
    MissingSpawn { blueprint: String, role: String },

    /// Coordinate outside the grid
    #[error("Position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    /// Actor id not tracked by the world
    #[error("Unknown actor: {0}")]
    UnknownActor(u32),

    /// Blueprint id has no cached grid
    #[error("Unknown blueprint id: {0}")]
    UnknownBlueprint(u32),
}

impl Error {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a table parse error.
    pub fn table(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::TileTable {
            what: what.into(),
            source,
        }
    }

    /// True for configuration errors (bad files, bad level graph)
    pub fn is_config(&self) -> bool {
        !matches!(
            self,
            Error::OutOfBounds { .. } | Error::UnknownActor(_) | Error::UnknownBlueprint(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_classification() {
        assert!(Error::InvalidColor("mauve-ish".into()).is_config());
        assert!(
            Error::MissingStairway {
                blueprint: "basement".into(),
                name: "stairs_up".into(),
            }
            .is_config()
        );
        let oob = Error::OutOfBounds {
            x: -1,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(!oob.is_config());
        assert_eq!(oob.to_string(), "Position (-1, 0) is outside the 10x10 grid");
    }
}
