//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Turn-stepped only
//! - Seeded RNG only (and only in callers)
//! - Stable iteration order (row-major cells, actors by ID)
//! - No rendering or platform dependencies

pub mod actor;
pub mod bitmap;
pub mod cell;
pub mod fov;
pub mod grid;
pub mod light;
pub mod registry;
pub mod transition;
pub mod turn;
pub mod view;
pub mod world;

pub use actor::{Actor, ActorId};
pub use bitmap::Bitmap;
pub use cell::{Cell, CellEffect, Emitter, LightContribution, StairDirection};
pub use grid::{CellUpdate, Grid};
pub use light::LightEngine;
pub use registry::{Instantiated, Registry};
pub use transition::Transition;
pub use turn::{Action, TurnEvent, TurnInput, turn};
pub use view::{Frame, RenderedCell, Renderer, draw_field_of_view, render_cell};
pub use world::World;
