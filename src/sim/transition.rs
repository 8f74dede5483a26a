//! Stairway transitions between blueprints
//!
//! An actor stepping onto a stairway leaves its grid and arrives on the
//! complementary stairway of the linked blueprint. The grid it leaves stays
//! cached in the registry, so coming back finds it exactly as it was.

use glam::IVec2;

use super::actor::ActorId;
use super::cell::StairDirection;
use super::world::World;
use crate::blueprint::{BlueprintId, BlueprintKind};
use crate::error::{Error, Result};

/// What a completed transition did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub actor: ActorId,
    pub from: BlueprintId,
    pub to: BlueprintId,
    /// Position of the stairway the actor arrived on
    pub arrival: IVec2,
    /// The target grid was created by this transition
    pub fresh: bool,
}

impl World {
    /// Move `actor` to blueprint `target`, having taken a stairway leading `via`.
    ///
    /// Fails with a configuration error if the target cannot be loaded or has
    /// no complementary stairway; in that case the actor is left where it was.
    pub fn transition(
        &mut self,
        actor: ActorId,
        target: &BlueprintKind,
        via: StairDirection,
    ) -> Result<Transition> {
        let from = self.actor(actor)?.blueprint;
        let instance = self.initialize_blueprint(target)?;

        let arrival_name = via.complement().cell_name();
        let arrival = self
            .registry
            .grid(instance.id)?
            .find_named(arrival_name)
            .map(|c| c.position)
            .ok_or_else(|| Error::MissingStairway {
                blueprint: target.to_string(),
                name: arrival_name.to_string(),
            })?;

        // Placed directly: the arrival stairway's own effect must not fire
        let is_player = {
            let moving = self.actor_mut(actor)?;
            moving.move_to_blueprint(instance.id, arrival);
            moving.is_player
        };
        if is_player {
            self.active = instance.id;
        }
        self.refresh_visibility();

        self.recompute_fov(actor)?;
        if is_player {
            self.redraw()?;
        }

        log::info!(
            "{} took the {} stairs from {} to {} {} at {}",
            actor,
            via.cell_name(),
            from,
            target,
            instance.id,
            arrival
        );
        Ok(Transition {
            actor,
            from,
            to: instance.id,
            arrival,
            fresh: instance.fresh,
        })
    }
}
