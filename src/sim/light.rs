//! Light propagation
//!
//! Every emitting cell lights the cells its field of view reaches within its
//! radius. Each lit cell keeps one [`LightContribution`] per source; its
//! brightness is the maximum of those contributions, and its tint comes from
//! the nearest source.
//!
//! The engine is incremental: `adjust` only touches the cells within reach of
//! the lights that actually changed.

use glam::IVec2;

use super::bitmap::Bitmap;
use super::cell::{Cell, Emitter, LightContribution};
use super::fov;
use crate::{chebyshev, distance};
use crate::settings::LightSettings;

/// Stateless light calculator parameterized by the falloff settings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightEngine {
    settings: LightSettings,
}

impl LightEngine {
    pub fn new(settings: LightSettings) -> Self {
        Self {
            settings: settings.sanitized(),
        }
    }

    pub fn settings(&self) -> &LightSettings {
        &self.settings
    }

    /// Brightness an emitter gives a cell `dist` away (caller ensures in radius)
    pub fn level_at(&self, emitter: &Emitter, dist: f32) -> f32 {
        let floor = self.settings.min_brightness;
        let peak = (self.settings.max_brightness * emitter.intensity.clamp(0.0, 1.0)).max(floor);
        let weight = self.settings.falloff.weight(dist, emitter.radius as f32);
        floor + (peak - floor) * weight
    }

    /// Drop all light state and re-propagate every emitter, row-major.
    pub fn calibrate(&self, cells: &mut [Cell], blocking: &Bitmap) {
        for cell in cells.iter_mut() {
            cell.light_sources.clear();
            cell.brightness = 0.0;
        }
        let emitters: Vec<(IVec2, Emitter)> = cells
            .iter()
            .filter(|c| c.emits_light())
            .map(|c| (c.position, c.emitter))
            .collect();
        for (pos, emitter) in &emitters {
            self.propagate(cells, blocking, *pos, emitter);
        }
        log::debug!("Calibrated {} light sources", emitters.len());
    }

    /// Bring light state in line with `old` being replaced by `new`.
    ///
    /// Must run while `cells` still holds `old` at its position. Also writes
    /// the new blocks-FOV flag into `blocking`, since light re-cast through a
    /// changed cell has to see the new geometry. Returns the number of light
    /// sources that were re-propagated.
    pub fn adjust(&self, cells: &mut [Cell], blocking: &mut Bitmap, new: &Cell, old: &Cell) -> usize {
        let pos = old.position;
        let emission_changed = lit(&old.emitter) != lit(&new.emitter);
        let occlusion_changed = old.blocks_fov != new.blocks_fov;
        if !emission_changed && !occlusion_changed {
            return 0;
        }

        // Shadowcasting only consults cells within the radius square, so those
        // are the only lights a geometry change can affect
        let recast: Vec<(IVec2, Emitter)> = if occlusion_changed {
            cells
                .iter()
                .filter(|c| c.emits_light() && c.position != pos)
                .filter(|c| chebyshev(c.position, pos) <= reach(c.emitter.radius, blocking))
                .map(|c| (c.position, c.emitter))
                .collect()
        } else {
            Vec::new()
        };

        if emission_changed && old.emits_light() {
            self.retract(cells, blocking, pos, old.emitter.radius);
        }
        for (source, emitter) in &recast {
            self.retract(cells, blocking, *source, emitter.radius);
        }

        blocking.set(pos, new.blocks_fov);

        let mut propagated = 0;
        if emission_changed && new.emits_light() {
            self.propagate(cells, blocking, pos, &new.emitter);
            propagated += 1;
        }
        for (source, emitter) in &recast {
            self.propagate(cells, blocking, *source, emitter);
            propagated += 1;
        }
        propagated
    }

    /// Add `source`'s contribution to every cell it can see within its radius
    fn propagate(&self, cells: &mut [Cell], blocking: &Bitmap, source: IVec2, emitter: &Emitter) {
        if !emitter.emits {
            return;
        }
        let seen = fov::calculate(blocking, source, emitter.radius);
        for pos in seen.iter_set() {
            let level = self.level_at(emitter, distance(pos, source));
            if let Some(cell) = cell_mut(cells, blocking, pos) {
                // Sources stay in row-major order so nearest-light ties do not
                // depend on update history
                let at = cell
                    .light_sources
                    .partition_point(|c| order(blocking, c.source) < order(blocking, source));
                cell.light_sources.insert(
                    at,
                    LightContribution {
                        source,
                        level,
                        color: emitter.color,
                    },
                );
                cell.brightness = cell.brightness.max(level);
            }
        }
    }

    /// Remove `source`'s contribution from every cell within `radius` of it
    fn retract(&self, cells: &mut [Cell], blocking: &Bitmap, source: IVec2, radius: u32) {
        let r = reach(radius, blocking);
        for y in source.y.saturating_sub(r)..=source.y.saturating_add(r) {
            for x in source.x.saturating_sub(r)..=source.x.saturating_add(r) {
                let Some(cell) = cell_mut(cells, blocking, IVec2::new(x, y)) else {
                    continue;
                };
                let before = cell.light_sources.len();
                cell.light_sources.retain(|c| c.source != source);
                if cell.light_sources.len() != before {
                    cell.recompute_brightness();
                }
            }
        }
    }
}

/// Emitter as far as lighting is concerned: non-emitting cells compare equal
fn lit(emitter: &Emitter) -> Option<&Emitter> {
    emitter.emits.then_some(emitter)
}

/// Radius as a signed extent, capped at the layer size (no light reaches further)
fn reach(radius: u32, layer: &Bitmap) -> i32 {
    let extent = layer.width().saturating_add(layer.height());
    i32::try_from(radius.min(extent)).unwrap_or(i32::MAX)
}

/// Row-major rank of a source position
fn order(layer: &Bitmap, pos: IVec2) -> i64 {
    i64::from(pos.y) * i64::from(layer.width()) + i64::from(pos.x)
}

fn index(layer: &Bitmap, pos: IVec2) -> Option<usize> {
    layer
        .in_bounds(pos)
        .then(|| pos.y as usize * layer.width() as usize + pos.x as usize)
}

fn cell_mut<'a>(cells: &'a mut [Cell], layer: &Bitmap, pos: IVec2) -> Option<&'a mut Cell> {
    index(layer, pos).and_then(move |i| cells.get_mut(i))
}
