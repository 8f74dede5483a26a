//! Roguegrid - a turn-based roguelike grid simulation
//!
//! Core modules:
//! - `sim`: Grid, lighting, field of view, actors and level transitions
//! - `blueprint`: Level layouts and tile tables, parsed into cells
//! - `color`: RGBA colours with named/hex parsing
//! - `settings`: Data-driven tuning (light falloff, dimming)
//! - `error`: Crate-wide error type

pub mod blueprint;
pub mod color;
pub mod error;
pub mod settings;
pub mod sim;

pub use blueprint::{BlueprintId, BlueprintKind, BlueprintLibrary};
pub use color::Color;
pub use error::{Error, Result};
pub use settings::{Falloff, Settings};

use glam::IVec2;

/// Simulation constants
pub mod consts {
    /// Glyph that marks "nothing here" in a layout
    pub const EMPTY_GLYPH: char = ' ';

    /// Cell name of an upward stairway
    pub const STAIRS_UP_NAME: &str = "stairs_up";
    /// Cell name of a downward stairway
    pub const STAIRS_DOWN_NAME: &str = "stairs_down";

    /// Special-character role for the player's starting position
    pub const PLAYER_SPAWN_ROLE: &str = "player";

    /// Default blend-toward-black ratio for explored-but-unseen colours
    pub const FOV_DIM_RATIO: f32 = 0.6;
    /// Default observer sight radius
    pub const DEFAULT_FOV_RADIUS: u32 = 8;
    /// Largest light or sight radius accepted from data files
    pub const MAX_RADIUS: u32 = 1024;

    /// Brightness of a light source's own cell
    pub const MAX_BRIGHTNESS: f32 = 1.0;
    /// Brightness at the very edge of a light's radius
    pub const MIN_BRIGHTNESS: f32 = 0.05;
}

/// The eight neighbour offsets, row by row from the top-left
pub const NEIGHBOR_OFFSETS: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Squared Euclidean distance between two grid positions
#[inline]
pub fn distance_sq(a: IVec2, b: IVec2) -> i32 {
    (a - b).length_squared()
}

/// Euclidean distance between two grid positions
#[inline]
pub fn distance(a: IVec2, b: IVec2) -> f32 {
    (distance_sq(a, b) as f32).sqrt()
}

/// Chebyshev (king-move) distance, used for adjacency
#[inline]
pub fn chebyshev(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}
