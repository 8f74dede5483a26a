//! Actors: anything with a position on a blueprint and a field of view

use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::bitmap::Bitmap;
use super::grid::Grid;
use crate::blueprint::BlueprintId;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    /// Spawn role, e.g. "player" or "goblin"
    pub name: String,
    pub position: IVec2,
    /// Blueprint instance the actor currently stands on
    pub blueprint: BlueprintId,
    pub fov_radius: u32,
    pub is_player: bool,
    /// Drawn only while on the active blueprint
    pub visible: bool,
    /// Last computed field of view; `None` until first computed
    fov: Option<Bitmap>,
}

impl Actor {
    pub fn new(
        id: ActorId,
        name: impl Into<String>,
        blueprint: BlueprintId,
        position: IVec2,
        fov_radius: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            blueprint,
            fov_radius,
            is_player: false,
            visible: true,
            fov: None,
        }
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn field_of_view_radius(&self) -> u32 {
        self.fov_radius
    }

    pub fn field_of_view(&self) -> Option<&Bitmap> {
        self.fov.as_ref()
    }

    /// True if `pos` was visible at the last recompute
    pub fn can_see(&self, pos: IVec2) -> bool {
        self.fov.as_ref().is_some_and(|fov| fov.get(pos))
    }

    /// Recompute the field of view against `grid`
    pub fn recompute_fov(&mut self, grid: &Grid) -> Result<&Bitmap> {
        let fov = grid.calculate_fov(self.position, self.fov_radius)?;
        Ok(self.fov.insert(fov))
    }

    /// Relocate to another blueprint instance; the old view no longer applies
    pub fn move_to_blueprint(&mut self, blueprint: BlueprintId, position: IVec2) {
        self.blueprint = blueprint;
        self.position = position;
        self.fov = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::light::LightEngine;
    use glam::UVec2;

    #[test]
    fn test_recompute_fov() {
        let grid = Grid::open(BlueprintId(1), UVec2::new(9, 9), LightEngine::default());
        let mut actor = Actor::new(ActorId(1), "player", BlueprintId(1), IVec2::new(4, 4), 2);
        assert!(!actor.can_see(IVec2::new(4, 4)));

        let visible = actor.recompute_fov(&grid).unwrap().count();
        assert_eq!(visible, 13);
        assert!(actor.can_see(IVec2::new(4, 2)));
        assert!(!actor.can_see(IVec2::new(4, 1)));
    }

    #[test]
    fn test_recompute_fov_out_of_bounds() {
        let grid = Grid::open(BlueprintId(1), UVec2::new(4, 4), LightEngine::default());
        let mut actor = Actor::new(ActorId(1), "player", BlueprintId(1), IVec2::new(7, 0), 2);
        assert!(actor.recompute_fov(&grid).is_err());
        assert!(actor.field_of_view().is_none());
    }

    #[test]
    fn test_move_to_blueprint_clears_view() {
        let grid = Grid::open(BlueprintId(1), UVec2::new(4, 4), LightEngine::default());
        let mut actor = Actor::new(ActorId(1), "player", BlueprintId(1), IVec2::ZERO, 2);
        actor.recompute_fov(&grid).unwrap();
        actor.move_to_blueprint(BlueprintId(2), IVec2::new(3, 3));
        assert_eq!(actor.blueprint, BlueprintId(2));
        assert_eq!(actor.position(), IVec2::new(3, 3));
        assert!(actor.field_of_view().is_none());
    }
}
