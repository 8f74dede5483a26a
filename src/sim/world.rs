//! Simulation context
//!
//! `World` owns everything a running game needs: the blueprint registry, the
//! actors and the renderer hook. There is no global state; independent
//! worlds can run side by side.
//!
//! Grid operations without an explicit blueprint act on the active one, which
//! is always the blueprint the player stands on.

use std::collections::BTreeMap;
use std::fmt;

use glam::IVec2;

use super::actor::{Actor, ActorId};
use super::bitmap::Bitmap;
use super::cell::Cell;
use super::grid::{CellUpdate, Grid};
use super::registry::{Instantiated, Registry};
use super::view::{self, Frame, Renderer};
use crate::blueprint::{BlueprintId, BlueprintKind, BlueprintLibrary};
use crate::consts::PLAYER_SPAWN_ROLE;
use crate::error::{Error, Result};
use crate::settings::Settings;

pub struct World {
    pub(super) registry: Registry,
    pub(super) settings: Settings,
    /// Blueprint the player is on
    pub(super) active: BlueprintId,
    /// Sorted by id for stable iteration
    pub(super) actors: BTreeMap<ActorId, Actor>,
    pub(super) player: ActorId,
    next_actor_id: u32,
    renderer: Option<Box<dyn Renderer>>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("active", &self.active)
            .field("player", &self.player)
            .field("actors", &self.actors.len())
            .field("grids", &self.registry.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl World {
    /// Instantiate `start` and place the player on its player spawn
    pub fn new(library: BlueprintLibrary, settings: Settings, start: &BlueprintKind) -> Result<Self> {
        let settings = settings.sanitized();
        let mut world = Self {
            registry: Registry::new(library, &settings),
            settings,
            active: BlueprintId(0),
            actors: BTreeMap::new(),
            player: ActorId(0),
            next_actor_id: 1,
            renderer: None,
        };
        world.start(start)?;
        Ok(world)
    }

    fn start(&mut self, kind: &BlueprintKind) -> Result<()> {
        let instance = self.registry.initialize_blueprint(kind)?;
        let spawn = self
            .registry
            .spawns(instance.id)
            .iter()
            .find(|s| s.role == PLAYER_SPAWN_ROLE)
            .map(|s| s.position)
            .ok_or_else(|| Error::MissingSpawn {
                blueprint: kind.to_string(),
                role: PLAYER_SPAWN_ROLE.to_string(),
            })?;

        self.active = instance.id;
        self.player = self.spawn_actor(PLAYER_SPAWN_ROLE, instance.id, spawn);
        if let Some(player) = self.actors.get_mut(&self.player) {
            player.is_player = true;
        }
        if instance.fresh {
            self.populate(instance.id);
        }
        self.recompute_fov(self.player)?;
        log::info!("World started on {} {}", kind, instance.id);
        Ok(())
    }

    /// Spawn an actor for every non-player spawn point of `blueprint`
    fn populate(&mut self, blueprint: BlueprintId) {
        let spawns = self.registry.spawns(blueprint).to_vec();
        for spawn in spawns.into_iter().filter(|s| s.role != PLAYER_SPAWN_ROLE) {
            self.spawn_actor(&spawn.role, blueprint, spawn.position);
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn active(&self) -> BlueprintId {
        self.active
    }

    pub fn active_kind(&self) -> Option<&BlueprintKind> {
        self.registry.kind_of(self.active)
    }

    pub fn active_grid(&self) -> Result<&Grid> {
        self.registry.grid(self.active)
    }

    pub fn grid(&self, blueprint: BlueprintId) -> Result<&Grid> {
        self.registry.grid(blueprint)
    }

    // === Actors ===

    pub fn player(&self) -> ActorId {
        self.player
    }

    pub fn actor(&self, id: ActorId) -> Result<&Actor> {
        self.actors.get(&id).ok_or(Error::UnknownActor(id.0))
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Actors standing on `blueprint`, by id
    pub fn actors_on(&self, blueprint: BlueprintId) -> impl Iterator<Item = &Actor> {
        self.actors.values().filter(move |a| a.blueprint == blueprint)
    }

    /// Actor occupying `pos` on `blueprint`, if any
    pub fn actor_at(&self, blueprint: BlueprintId, pos: IVec2) -> Option<ActorId> {
        self.actors_on(blueprint)
            .find(|a| a.position == pos)
            .map(|a| a.id)
    }

    /// Add an actor; visible only if it lands on the active blueprint
    pub fn spawn_actor(&mut self, name: &str, blueprint: BlueprintId, position: IVec2) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        let mut actor = Actor::new(id, name, blueprint, position, self.settings.default_fov_radius);
        actor.visible = blueprint == self.active;
        log::debug!("Spawned {} ({}) on {} at {}", id, name, blueprint, position);
        self.actors.insert(id, actor);
        id
    }

    /// Step an actor to `position` on its current blueprint without firing
    /// `on_enter`
    pub(super) fn place_actor(&mut self, id: ActorId, position: IVec2) -> Result<()> {
        let actor = self.actors.get_mut(&id).ok_or(Error::UnknownActor(id.0))?;
        actor.position = position;
        Ok(())
    }

    pub(super) fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor> {
        self.actors.get_mut(&id).ok_or(Error::UnknownActor(id.0))
    }

    // === Grid operations on the active blueprint ===

    pub fn get_cell(&self, x: i32, y: i32) -> Result<Cell> {
        self.active_grid()?.get_cell(x, y)
    }

    /// Write `cell` into the active grid.
    ///
    /// With `recompute_entity_fov` every observer on the grid recomputes its
    /// field of view after the write and the renderer is redrawn.
    pub fn set_cell(&mut self, cell: &Cell, recompute_entity_fov: bool) -> Result<CellUpdate> {
        self.set_cell_in(self.active, cell, recompute_entity_fov)
    }

    /// As [`World::set_cell`], on any instantiated blueprint
    pub fn set_cell_in(
        &mut self,
        blueprint: BlueprintId,
        cell: &Cell,
        recompute_entity_fov: bool,
    ) -> Result<CellUpdate> {
        let update = self.registry.grid_mut(blueprint)?.set_cell(cell)?;
        if recompute_entity_fov {
            self.recompute_observers(blueprint)?;
            if blueprint == self.active {
                self.redraw()?;
            }
        }
        Ok(update)
    }

    pub fn neighbors(&self, cell: &Cell) -> Result<Vec<Cell>> {
        Ok(self.active_grid()?.neighbors(cell))
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.active_grid().is_ok_and(|g| g.in_bounds(x, y))
    }

    /// Lazy, re-evaluated-per-call query over the active grid
    pub fn cells_where<'a, P>(&'a self, predicate: P) -> Result<impl Iterator<Item = Cell> + 'a>
    where
        P: Fn(&Cell) -> bool + 'a,
    {
        Ok(self.active_grid()?.cells_where(predicate))
    }

    pub fn calculate_fov(&self, origin: IVec2, radius: u32) -> Result<Bitmap> {
        self.active_grid()?.calculate_fov(origin, radius)
    }

    /// Get or create the grid for `kind`; a fresh grid gets its spawns
    /// populated
    pub fn initialize_blueprint(&mut self, kind: &BlueprintKind) -> Result<Instantiated> {
        let instance = self.registry.initialize_blueprint(kind)?;
        if instance.fresh {
            self.populate(instance.id);
        }
        Ok(instance)
    }

    // === Visibility ===

    /// Recompute one actor's field of view; the player's view also marks
    /// cells explored
    pub fn recompute_fov(&mut self, id: ActorId) -> Result<()> {
        let actor = self.actors.get_mut(&id).ok_or(Error::UnknownActor(id.0))?;
        let (blueprint, is_player) = (actor.blueprint, actor.is_player);
        let visible = actor.recompute_fov(self.registry.grid(blueprint)?)?;
        if is_player {
            let newly = self.registry.grid_mut(blueprint)?.mark_explored(visible);
            if newly > 0 {
                log::debug!("Player explored {} new cells", newly);
            }
        }
        Ok(())
    }

    /// Recompute every observer on `blueprint`
    pub fn recompute_observers(&mut self, blueprint: BlueprintId) -> Result<()> {
        let ids: Vec<ActorId> = self.actors_on(blueprint).map(|a| a.id).collect();
        for id in ids {
            self.recompute_fov(id)?;
        }
        Ok(())
    }

    /// Only actors on the active blueprint are drawn
    pub(super) fn refresh_visibility(&mut self) {
        let active = self.active;
        for actor in self.actors.values_mut() {
            actor.visible = actor.blueprint == active;
        }
    }

    /// The active grid as the player currently sees it
    pub fn frame(&self) -> Result<Frame> {
        let grid = self.active_grid()?;
        let visible = self
            .actor(self.player)?
            .field_of_view()
            .cloned()
            .unwrap_or_else(|| Bitmap::new(grid.size()));
        let actors: Vec<&Actor> = self.actors_on(self.active).collect();
        Ok(view::draw_field_of_view(grid, &visible, &actors, &self.settings))
    }

    /// Send the current frame to the renderer, if one is attached
    pub fn redraw(&mut self) -> Result<()> {
        if self.renderer.is_none() {
            return Ok(());
        }
        let frame = self.frame()?;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.redraw(&frame);
        }
        Ok(())
    }

    /// Drop every grid and actor and start over on `start`.
    ///
    /// Blueprint and actor ids keep counting up.
    pub fn reset(&mut self, start: &BlueprintKind) -> Result<()> {
        self.registry.reset();
        self.actors.clear();
        self.start(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<Frame>>>);

    impl Renderer for Recorder {
        fn redraw(&mut self, frame: &Frame) {
            self.0.borrow_mut().push(frame.clone());
        }
    }

    fn world() -> World {
        World::new(BlueprintLibrary::builtin().unwrap(), Settings::default(), &"ground_floor".into())
            .unwrap()
    }

    #[test]
    fn test_new_places_player_and_explores() {
        let world = world();
        let player = world.actor(world.player()).unwrap();
        assert!(player.is_player && player.visible);
        assert_eq!(player.blueprint, world.active());
        assert!(world.get_cell(player.position.x, player.position.y).unwrap().walkable);
        assert!(player.can_see(player.position));
        assert!(world.get_cell(player.position.x, player.position.y).unwrap().explored);
        assert_eq!(world.active_kind(), Some(&BlueprintKind::new("ground_floor")));
    }

    #[test]
    fn test_missing_player_spawn() {
        let library = BlueprintLibrary::builtin().unwrap();
        let err = World::new(library, Settings::default(), &"basement".into()).unwrap_err();
        assert!(matches!(err, Error::MissingSpawn { .. }));
    }

    #[test]
    fn test_set_cell_with_recompute_redraws() {
        let mut world = world();
        let frames = Rc::new(RefCell::new(Vec::new()));
        world.set_renderer(Box::new(Recorder(frames.clone())));

        let pos = world.actor(world.player()).unwrap().position;
        let cell = world.get_cell(pos.x, pos.y).unwrap();
        world.set_cell(&cell, false).unwrap();
        assert!(frames.borrow().is_empty());

        world.set_cell(&cell, true).unwrap();
        assert_eq!(frames.borrow().len(), 1);
        assert_eq!(frames.borrow()[0], world.frame().unwrap());
    }

    #[test]
    fn test_cells_where_sees_latest_write() {
        let mut world = world();
        let count = |w: &World| w.cells_where(|c| c.class == "Door" && c.walkable).unwrap().count();
        let before = count(&world);

        let door = world
            .cells_where(|c| c.class == "Door" && !c.walkable)
            .unwrap()
            .next()
            .unwrap();
        let opened = world.active_grid().unwrap().toggled(&door).unwrap();
        world.set_cell(&opened, true).unwrap();
        assert_eq!(count(&world), before + 1);
    }

    #[test]
    fn test_initialize_blueprint_populates_once() {
        let mut world = world();
        let first = world.initialize_blueprint(&"basement".into()).unwrap();
        let goblins = world.actors_on(first.id).count();
        assert_eq!(goblins, 2);
        assert!(world.actors_on(first.id).all(|a| !a.visible));

        world.initialize_blueprint(&"basement".into()).unwrap();
        assert_eq!(world.actors_on(first.id).count(), goblins);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut world = world();
        let old_active = world.active();
        let old_player = world.player();
        world.initialize_blueprint(&"basement".into()).unwrap();

        world.reset(&"ground_floor".into()).unwrap();
        assert_ne!(world.active(), old_active);
        assert!(world.player() > old_player);
        assert!(world.actor(old_player).is_err());
        assert_eq!(world.registry().len(), 1);
    }

    #[test]
    fn test_unknown_actor() {
        let mut world = world();
        assert!(matches!(world.recompute_fov(ActorId(999)), Err(Error::UnknownActor(999))));
    }
}
