//! Turn stepping
//!
//! One call to [`turn`] applies one actor's action to the world. Everything
//! it triggers (light adjustment, transitions, FOV, redraw) completes before
//! it returns.

use glam::IVec2;

use super::actor::ActorId;
use super::cell::CellEffect;
use super::grid::CellUpdate;
use super::transition::Transition;
use super::world::World;
use crate::chebyshev;
use crate::error::Result;

/// What an actor does with its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Wait,
    /// Step by one cell in any of the eight directions
    Move(IVec2),
    /// Use the neighbouring cell in this direction
    Interact(IVec2),
}

/// Input for a single turn (deterministic)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnInput {
    pub actor: ActorId,
    pub action: Action,
}

/// Outcome of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    Waited,
    Moved { from: IVec2, to: IVec2 },
    /// Target not walkable, occupied or not a single step
    Blocked { at: IVec2 },
    /// Stepped onto a stairway
    Transitioned(Transition),
    Interacted { at: IVec2, update: CellUpdate },
    /// Target is not interactable or has nothing to toggle to
    NothingToInteract { at: IVec2 },
}

fn is_step(delta: IVec2) -> bool {
    chebyshev(delta, IVec2::ZERO) == 1
}

/// Advance the world by one actor's action
pub fn turn(world: &mut World, input: &TurnInput) -> Result<TurnEvent> {
    let actor = world.actor(input.actor)?;
    let (blueprint, from) = (actor.blueprint, actor.position);

    match input.action {
        Action::Wait => Ok(TurnEvent::Waited),

        Action::Move(delta) => {
            let to = from + delta;
            let grid = world.grid(blueprint)?;
            let Some(cell) = grid.cell(to).filter(|c| c.walkable && is_step(delta)).cloned() else {
                return Ok(TurnEvent::Blocked { at: to });
            };
            if world.actor_at(blueprint, to).is_some() {
                return Ok(TurnEvent::Blocked { at: to });
            }

            // A stairway relocates the actor itself; a failed transition
            // leaves it where it stood
            if let Some(CellEffect::StairsTransition { direction, target }) = &cell.on_enter {
                let t = world.transition(input.actor, target, *direction)?;
                return Ok(TurnEvent::Transitioned(t));
            }

            world.place_actor(input.actor, to)?;
            world.recompute_fov(input.actor)?;
            if input.actor == world.player() {
                world.redraw()?;
            }
            Ok(TurnEvent::Moved { from, to })
        }

        Action::Interact(delta) => {
            let at = from + delta;
            let grid = world.grid(blueprint)?;
            let toggled = grid
                .cell(at)
                .filter(|c| c.interactable && is_step(delta))
                .and_then(|c| grid.toggled(c));
            let Some(next) = toggled else {
                return Ok(TurnEvent::NothingToInteract { at });
            };
            let update = world.set_cell_in(blueprint, &next, true)?;
            log::debug!("{} used {} at {}", input.actor, next.class, at);
            Ok(TurnEvent::Interacted { at, update })
        }
    }
}
