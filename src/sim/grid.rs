//! The live grid for one blueprint instance
//!
//! Cells are stored in a flat row-major array (y * width + x) with a derived
//! blocks-FOV bitmap kept in lockstep. Reads hand out clones; `set_cell` is
//! the only way to change a cell and always runs the light engine first.

use glam::{IVec2, UVec2};

use super::bitmap::Bitmap;
use super::cell::Cell;
use super::fov;
use super::light::LightEngine;
use crate::NEIGHBOR_OFFSETS;
use crate::blueprint::{BlueprintId, Palette};
use crate::error::{Error, Result};

/// What a `set_cell` call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellUpdate {
    /// The cell's blocks-FOV flag flipped
    pub occlusion_changed: bool,
    /// Number of light sources re-propagated
    pub lights_recast: usize,
}

#[derive(Debug, Clone)]
pub struct Grid {
    blueprint: BlueprintId,
    size: UVec2,
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<Cell>,
    blocking: Bitmap,
    /// Tile templates by glyph, for toggling interactable cells
    palette: Palette,
    light: LightEngine,
}

impl Grid {
    /// Build a grid from loaded cells and calibrate its lighting.
    ///
    /// `cells` must be row-major and exactly `size.x * size.y` long; missing
    /// cells are filled blank and extra ones dropped.
    pub fn new(
        blueprint: BlueprintId,
        size: UVec2,
        cells: Vec<Cell>,
        palette: Palette,
        light: LightEngine,
    ) -> Self {
        let len = (size.x * size.y) as usize;
        let mut cells = cells;
        cells.truncate(len);
        let width = size.x.max(1);
        while cells.len() < len {
            let i = cells.len() as u32;
            cells.push(Cell::new(IVec2::new((i % width) as i32, (i / width) as i32)));
        }
        for (i, cell) in cells.iter_mut().enumerate() {
            cell.position = IVec2::new((i as u32 % width) as i32, (i as u32 / width) as i32);
        }

        let mut blocking = Bitmap::new(size);
        for cell in &cells {
            blocking.set(cell.position, cell.blocks_fov);
        }

        let mut grid = Self {
            blueprint,
            size,
            cells,
            blocking,
            palette,
            light,
        };
        grid.recalibrate();
        grid
    }

    /// Open grid of blank walkable cells, handy for tests and sandboxes
    pub fn open(blueprint: BlueprintId, size: UVec2, light: LightEngine) -> Self {
        let cells = (0..size.y as i32)
            .flat_map(|y| (0..size.x as i32).map(move |x| IVec2::new(x, y)))
            .map(|pos| {
                let mut cell = Cell::new(pos);
                cell.glyph = '.';
                cell.walkable = true;
                cell
            })
            .collect();
        Self::new(blueprint, size, cells, Palette::default(), light)
    }

    pub fn blueprint(&self) -> BlueprintId {
        self.blueprint
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    /// Derived blocks-FOV layer
    pub fn blocking(&self) -> &Bitmap {
        &self.blocking
    }

    pub fn light_engine(&self) -> &LightEngine {
        &self.light
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.blocking.in_bounds(IVec2::new(x, y))
    }

    fn index(&self, x: i32, y: i32) -> Result<usize> {
        if self.in_bounds(x, y) {
            Ok(y as usize * self.size.x as usize + x as usize)
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width: self.size.x,
                height: self.size.y,
            })
        }
    }

    /// Copy of the cell at (x, y)
    pub fn get_cell(&self, x: i32, y: i32) -> Result<Cell> {
        self.index(x, y).map(|i| self.cells[i].clone())
    }

    /// Borrow a cell without copying (read-only)
    pub fn cell(&self, pos: IVec2) -> Option<&Cell> {
        self.index(pos.x, pos.y).ok().map(|i| &self.cells[i])
    }

    /// Write `cell` back at its own position.
    ///
    /// Light state on `cell` is ignored; the light engine recomputes it from
    /// the old and new snapshots before any field is copied. `explored`
    /// can be set but never cleared.
    pub fn set_cell(&mut self, cell: &Cell) -> Result<CellUpdate> {
        let i = self.index(cell.x(), cell.y())?;
        let old = self.cells[i].clone();
        let lights_recast = self
            .light
            .adjust(&mut self.cells, &mut self.blocking, cell, &old);
        self.cells[i].assign_from(cell);
        Ok(CellUpdate {
            occlusion_changed: old.blocks_fov != cell.blocks_fov,
            lights_recast,
        })
    }

    /// Up to eight in-bounds neighbours, row by row from the top-left
    pub fn neighbors(&self, cell: &Cell) -> Vec<Cell> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(|offset| cell.position + *offset)
            .filter_map(|pos| self.cell(pos).cloned())
            .collect()
    }

    /// Lazily yield copies of the cells matching `predicate`, row-major.
    ///
    /// Each call walks the live cells again, so results always reflect the
    /// latest `set_cell`.
    pub fn cells_where<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = Cell> + 'a
    where
        P: Fn(&Cell) -> bool + 'a,
    {
        self.cells.iter().filter(move |c| predicate(c)).cloned()
    }

    /// Visibility from `origin` within `radius`
    pub fn calculate_fov(&self, origin: IVec2, radius: u32) -> Result<Bitmap> {
        self.index(origin.x, origin.y)?;
        Ok(fov::calculate(&self.blocking, origin, radius))
    }

    /// Recompute all lighting from scratch
    pub fn recalibrate(&mut self) {
        self.light.calibrate(&mut self.cells, &self.blocking);
    }

    /// Set `explored` on every visible cell; returns how many were new
    pub fn mark_explored(&mut self, visible: &Bitmap) -> usize {
        let mut newly = 0;
        for pos in visible.iter_set() {
            if let Some(cell) = self.cell(pos).filter(|c| !c.explored) {
                let mut cell = cell.clone();
                cell.explored = true;
                if self.set_cell(&cell).is_ok() {
                    newly += 1;
                }
            }
        }
        newly
    }

    /// The tile an interactable cell turns into, if its tile declares one
    pub fn toggled(&self, cell: &Cell) -> Option<Cell> {
        self.palette.toggled(cell)
    }

    /// First cell (row-major) carrying `name`
    pub fn find_named(&self, name: &str) -> Option<Cell> {
        self.cells_where(|c| c.is_named(name)).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::sim::cell::Emitter;
    use proptest::prelude::*;

    fn grid(w: u32, h: u32) -> Grid {
        Grid::open(BlueprintId(1), UVec2::new(w, h), LightEngine::default())
    }

    fn snapshot(grid: &Grid) -> Vec<Cell> {
        grid.cells_where(|_| true).collect()
    }

    #[test]
    fn test_get_cell_bounds() {
        let grid = grid(4, 3);
        assert!(grid.get_cell(3, 2).is_ok());
        assert!(matches!(
            grid.get_cell(4, 0),
            Err(Error::OutOfBounds { x: 4, y: 0, width: 4, height: 3 })
        ));
        assert!(grid.get_cell(0, -1).is_err());
        assert!(grid.in_bounds(0, 0));
        assert!(!grid.in_bounds(-1, 0));
    }

    #[test]
    fn test_get_cell_is_a_copy() {
        let grid = grid(3, 3);
        let mut copy = grid.get_cell(1, 1).unwrap();
        copy.walkable = false;
        copy.glyph = '#';
        assert!(grid.get_cell(1, 1).unwrap().walkable);
        assert_eq!(grid.get_cell(1, 1).unwrap().glyph, '.');
    }

    #[test]
    fn test_set_cell_out_of_bounds() {
        let mut grid = grid(3, 3);
        let stray = Cell::new(IVec2::new(5, 5));
        assert!(grid.set_cell(&stray).is_err());
    }

    #[test]
    fn test_neighbors_filtered_at_corner() {
        let grid = grid(5, 5);
        let corner = grid.get_cell(0, 0).unwrap();
        let around: Vec<IVec2> = grid.neighbors(&corner).iter().map(|c| c.position).collect();
        assert_eq!(
            around,
            vec![IVec2::new(1, 0), IVec2::new(0, 1), IVec2::new(1, 1)]
        );
        let middle = grid.get_cell(2, 2).unwrap();
        assert_eq!(grid.neighbors(&middle).len(), 8);
    }

    #[test]
    fn test_blocking_bitmap_follows_cells() {
        let mut grid = grid(10, 1);
        let mut wall = grid.get_cell(0, 0).unwrap();
        wall.blocks_fov = true;
        let update = grid.set_cell(&wall).unwrap();
        assert!(update.occlusion_changed);
        assert!(grid.blocking().get(IVec2::ZERO));

        wall.blocks_fov = false;
        grid.set_cell(&wall).unwrap();
        assert!(!grid.blocking().get(IVec2::ZERO));
    }

    #[test]
    fn test_toggle_blocking_hides_cells_behind() {
        let mut grid = grid(10, 10);
        let origin = IVec2::new(3, 0);
        // Put a wall between the observer and the corner so "behind" is in bounds
        let mut wall = grid.get_cell(1, 0).unwrap();
        wall.blocks_fov = true;
        grid.set_cell(&wall).unwrap();

        let fov = grid.calculate_fov(origin, 5).unwrap();
        assert!(fov.get(IVec2::new(1, 0)));
        assert!(!fov.get(IVec2::new(0, 0)));

        let mut corner = grid.get_cell(0, 0).unwrap();
        corner.blocks_fov = true;
        grid.set_cell(&corner).unwrap();
        assert!(grid.blocking().get(IVec2::new(0, 0)));
        let fov = grid.calculate_fov(origin, 5).unwrap();
        assert!(!fov.get(IVec2::new(0, 0)));
    }

    #[test]
    fn test_light_scenario_on_open_grid() {
        let mut grid = grid(10, 10);
        let mut torch = grid.get_cell(5, 5).unwrap();
        torch.emitter = Emitter {
            emits: true,
            radius: 3,
            color: Color::rgb(255, 180, 80),
            intensity: 1.0,
        };
        grid.set_cell(&torch).unwrap();

        let reach = grid.calculate_fov(IVec2::new(5, 5), 3).unwrap();
        for pos in reach.iter_set() {
            assert!(grid.get_cell(pos.x, pos.y).unwrap().brightness > 0.0);
        }
        assert_eq!(grid.get_cell(9, 9).unwrap().brightness, 0.0);

        torch.emitter.emits = false;
        grid.set_cell(&torch).unwrap();
        assert!(grid.cells_where(|c| c.brightness > 0.0).next().is_none());
    }

    #[test]
    fn test_cells_where_sees_later_mutations() {
        let mut grid = grid(4, 4);
        assert_eq!(grid.cells_where(|c| !c.walkable).count(), 0);

        let mut door = grid.get_cell(2, 1).unwrap();
        door.walkable = false;
        grid.set_cell(&door).unwrap();
        assert_eq!(grid.cells_where(|c| !c.walkable).count(), 1);
        assert_eq!(
            grid.cells_where(|c| !c.walkable).next().unwrap().position,
            IVec2::new(2, 1)
        );
    }

    #[test]
    fn test_explored_is_monotonic() {
        let mut grid = grid(3, 3);
        let fov = grid.calculate_fov(IVec2::new(1, 1), 1).unwrap();
        assert_eq!(grid.mark_explored(&fov), fov.count());
        assert_eq!(grid.mark_explored(&fov), 0);

        let mut cell = grid.get_cell(1, 1).unwrap();
        cell.explored = false;
        grid.set_cell(&cell).unwrap();
        assert!(grid.get_cell(1, 1).unwrap().explored);
    }

    #[test]
    fn test_find_named() {
        let mut grid = grid(3, 3);
        assert!(grid.find_named("stairs_up").is_none());
        let mut stairs = grid.get_cell(2, 2).unwrap();
        stairs.name = Some("stairs_up".into());
        grid.set_cell(&stairs).unwrap();
        assert_eq!(grid.find_named("stairs_up").unwrap().position, IVec2::new(2, 2));
    }

    proptest! {
        #[test]
        fn prop_get_then_set_is_identity(
            walls in proptest::collection::vec((0i32..8, 0i32..8), 0..10),
            torches in proptest::collection::vec((0i32..8, 0i32..8, 0u32..5), 0..4),
            x in 0i32..8, y in 0i32..8,
        ) {
            let mut grid = grid(8, 8);
            for (wx, wy) in walls {
                let mut cell = grid.get_cell(wx, wy).unwrap();
                cell.blocks_fov = true;
                grid.set_cell(&cell).unwrap();
            }
            for (tx, ty, r) in torches {
                let mut cell = grid.get_cell(tx, ty).unwrap();
                cell.emitter.emits = true;
                cell.emitter.radius = r;
                grid.set_cell(&cell).unwrap();
            }
            let before = snapshot(&grid);
            let blocking_before = grid.blocking().clone();
            let cell = grid.get_cell(x, y).unwrap();
            let update = grid.set_cell(&cell).unwrap();
            prop_assert_eq!(update, CellUpdate::default());
            prop_assert_eq!(snapshot(&grid), before);
            prop_assert_eq!(grid.blocking(), &blocking_before);
        }

        #[test]
        fn prop_lit_implies_sources(
            ops in proptest::collection::vec((0i32..8, 0i32..8, 0u32..4, any::<bool>(), any::<bool>()), 1..20),
        ) {
            let mut grid = grid(8, 8);
            for (x, y, r, emits, blocks) in ops {
                let mut cell = grid.get_cell(x, y).unwrap();
                cell.emitter.emits = emits;
                cell.emitter.radius = r;
                cell.blocks_fov = blocks;
                grid.set_cell(&cell).unwrap();
            }
            for cell in grid.cells_where(|_| true) {
                prop_assert_eq!(cell.brightness > 0.0, !cell.light_sources.is_empty());
            }
            // Incremental updates must agree with a full rescan
            let incremental = snapshot(&grid);
            grid.recalibrate();
            let rescanned = snapshot(&grid);
            for (a, b) in incremental.iter().zip(&rescanned) {
                prop_assert!((a.brightness - b.brightness).abs() < 1e-6, "mismatch at {:?}", a.position);
                let sources = |c: &Cell| c.light_sources.iter().map(|l| (l.source, l.color)).collect::<Vec<_>>();
                prop_assert_eq!(sources(a), sources(b), "source order at {:?}", a.position);
                let nearest = |c: &Cell| c.nearest_light().map(|l| (l.source, l.color));
                prop_assert_eq!(nearest(a), nearest(b), "nearest light at {:?}", a.position);
            }
        }
    }
}
