//! Render-ready view of a grid
//!
//! The core never draws; it turns cell state plus an observer's field of view
//! into a [`Frame`] of glyphs and colours and hands it to a [`Renderer`].

use glam::{IVec2, UVec2};

use super::actor::Actor;
use super::bitmap::Bitmap;
use super::cell::Cell;
use super::grid::Grid;
use crate::color::Color;
use crate::settings::Settings;

/// One drawable position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedCell {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

impl RenderedCell {
    pub const BLANK: RenderedCell = RenderedCell {
        glyph: ' ',
        fg: Color::BLACK,
        bg: Color::BLACK,
    };
}

/// A full grid's worth of rendered cells, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub size: UVec2,
    pub cells: Vec<RenderedCell>,
}

impl Frame {
    pub fn get(&self, pos: IVec2) -> Option<&RenderedCell> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.size.x as i32 || pos.y >= self.size.y as i32 {
            return None;
        }
        self.cells.get(pos.y as usize * self.size.x as usize + pos.x as usize)
    }

    /// Glyphs only, one line per row
    pub fn to_ascii(&self) -> String {
        let width = self.size.x.max(1) as usize;
        let mut out = String::with_capacity(self.cells.len() + self.size.y as usize);
        for row in self.cells.chunks(width) {
            out.extend(row.iter().map(|c| c.glyph));
            out.push('\n');
        }
        out
    }
}

/// Receives a frame whenever the visible state changes
pub trait Renderer {
    fn redraw(&mut self, frame: &Frame);
}

/// Colours for one cell given whether it is currently visible
pub fn render_cell(cell: &Cell, visible: bool, settings: &Settings) -> RenderedCell {
    if visible {
        let shade = settings.ambient_light + (1.0 - settings.ambient_light) * cell.brightness;
        let (mut fg, mut bg) = (cell.fg.scale(shade), cell.bg.scale(shade));
        if let Some(light) = cell.nearest_light() {
            let t = settings.light_tint * cell.brightness;
            fg = fg.lerp(light.color, t);
            bg = bg.lerp(light.color.scale(cell.brightness), t);
        }
        RenderedCell {
            glyph: cell.glyph,
            fg,
            bg,
        }
    } else if cell.explored {
        RenderedCell {
            glyph: cell.glyph,
            fg: cell.dim_fg,
            bg: cell.dim_bg,
        }
    } else {
        RenderedCell::BLANK
    }
}

const NPC_COLOR: Color = Color::rgb(220, 60, 60);

fn actor_glyph(actor: &Actor) -> char {
    if actor.is_player {
        '@'
    } else {
        actor.name.chars().next().unwrap_or('?')
    }
}

/// Render `grid` as seen through `visible`, with visible actors on top
pub fn draw_field_of_view(grid: &Grid, visible: &Bitmap, actors: &[&Actor], settings: &Settings) -> Frame {
    let mut cells: Vec<RenderedCell> = grid
        .cells_where(|_| true)
        .map(|cell| render_cell(&cell, visible.get(cell.position), settings))
        .collect();

    let width = grid.width() as usize;
    for actor in actors {
        if !actor.visible || actor.blueprint != grid.blueprint() || !visible.get(actor.position) {
            continue;
        }
        let i = actor.position.y as usize * width + actor.position.x as usize;
        if let Some(slot) = cells.get_mut(i) {
            slot.glyph = actor_glyph(actor);
            slot.fg = if actor.is_player { Color::WHITE } else { NPC_COLOR };
        }
    }

    Frame {
        size: grid.size(),
        cells,
    }
}
