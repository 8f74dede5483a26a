//! Blueprint registry
//!
//! Caches one live [`Grid`] per blueprint kind so that mutations survive
//! leaving and re-entering a level. Identities come from a counter owned by
//! the registry; it only ever increases, even across [`Registry::reset`].

use std::collections::HashMap;

use super::grid::Grid;
use super::light::LightEngine;
use crate::blueprint::{self, BlueprintId, BlueprintKind, BlueprintLibrary, Spawn};
use crate::error::{Error, Result};
use crate::settings::Settings;

/// Result of a get-or-create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instantiated {
    pub id: BlueprintId,
    /// True when the grid was parsed just now rather than taken from the cache
    pub fresh: bool,
}

#[derive(Debug, Clone)]
pub struct Registry {
    library: BlueprintLibrary,
    light: LightEngine,
    dim_ratio: f32,
    next_id: u32,
    ids: HashMap<BlueprintKind, BlueprintId>,
    kinds: HashMap<BlueprintId, BlueprintKind>,
    grids: HashMap<BlueprintId, Grid>,
    /// Special-character positions per instance, as parsed
    spawns: HashMap<BlueprintId, Vec<Spawn>>,
}

impl Registry {
    pub fn new(library: BlueprintLibrary, settings: &Settings) -> Self {
        Self {
            library,
            light: LightEngine::new(settings.light),
            dim_ratio: settings.fov_dim_ratio,
            next_id: 1,
            ids: HashMap::new(),
            kinds: HashMap::new(),
            grids: HashMap::new(),
            spawns: HashMap::new(),
        }
    }

    /// Return the cached grid for `kind`, parsing and calibrating it on first use
    pub fn initialize_blueprint(&mut self, kind: &BlueprintKind) -> Result<Instantiated> {
        if let Some(&id) = self.ids.get(kind) {
            log::debug!("Blueprint {} {} reused from cache", kind, id);
            return Ok(Instantiated { id, fresh: false });
        }

        // Parse before taking an id so a bad blueprint consumes nothing
        let loaded = blueprint::load(&self.library, kind, self.dim_ratio)?;
        let id = self.next_blueprint_id();
        let grid = Grid::new(id, loaded.size, loaded.cells, loaded.palette, self.light);
        log::info!(
            "Instantiated blueprint {} as {} ({}x{})",
            kind,
            id,
            grid.width(),
            grid.height()
        );

        self.ids.insert(kind.clone(), id);
        self.kinds.insert(id, kind.clone());
        self.grids.insert(id, grid);
        self.spawns.insert(id, loaded.spawns);
        Ok(Instantiated { id, fresh: true })
    }

    fn next_blueprint_id(&mut self) -> BlueprintId {
        let id = BlueprintId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn grid(&self, id: BlueprintId) -> Result<&Grid> {
        self.grids.get(&id).ok_or(Error::UnknownBlueprint(id.0))
    }

    pub fn grid_mut(&mut self, id: BlueprintId) -> Result<&mut Grid> {
        self.grids.get_mut(&id).ok_or(Error::UnknownBlueprint(id.0))
    }

    /// Identity of `kind` if it has been instantiated
    pub fn id_of(&self, kind: &BlueprintKind) -> Option<BlueprintId> {
        self.ids.get(kind).copied()
    }

    pub fn kind_of(&self, id: BlueprintId) -> Option<&BlueprintKind> {
        self.kinds.get(&id)
    }

    pub fn spawns(&self, id: BlueprintId) -> &[Spawn] {
        self.spawns.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop every cached grid; the next request for any kind parses afresh
    pub fn reset(&mut self) {
        log::info!("Registry reset, dropping {} grids", self.grids.len());
        self.ids.clear();
        self.kinds.clear();
        self.grids.clear();
        self.spawns.clear();
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::cell::Cell;

    fn registry() -> Registry {
        Registry::new(BlueprintLibrary::builtin().unwrap(), &Settings::default())
    }

    #[test]
    fn test_identity_is_stable_per_kind() {
        let mut registry = registry();
        let ground = registry.initialize_blueprint(&"ground_floor".into()).unwrap();
        let basement = registry.initialize_blueprint(&"basement".into()).unwrap();
        assert!(ground.fresh && basement.fresh);
        assert_ne!(ground.id, basement.id);

        let again = registry.initialize_blueprint(&"ground_floor".into()).unwrap();
        assert_eq!(again, Instantiated { id: ground.id, fresh: false });
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.kind_of(ground.id), Some(&BlueprintKind::new("ground_floor")));
    }

    #[test]
    fn test_cached_grid_keeps_mutations() {
        let mut registry = registry();
        let id = registry.initialize_blueprint(&"ground_floor".into()).unwrap().id;
        let door = registry
            .grid(id)
            .unwrap()
            .cells_where(|c| c.class == "Door" && !c.walkable)
            .next()
            .unwrap();
        let opened = registry.grid(id).unwrap().toggled(&door).unwrap();
        registry.grid_mut(id).unwrap().set_cell(&opened).unwrap();

        registry.initialize_blueprint(&"basement".into()).unwrap();
        registry.initialize_blueprint(&"ground_floor".into()).unwrap();
        let cell: Cell = registry.grid(id).unwrap().get_cell(door.x(), door.y()).unwrap();
        assert!(cell.walkable);
    }

    #[test]
    fn test_unknown_kind_consumes_no_id() {
        let mut registry = registry();
        let err = registry.initialize_blueprint(&"attic".into()).unwrap_err();
        assert!(err.is_config());
        let first = registry.initialize_blueprint(&"basement".into()).unwrap();
        assert_eq!(first.id, BlueprintId(1));
    }

    #[test]
    fn test_reset_never_reuses_ids() {
        let mut registry = registry();
        let before = registry.initialize_blueprint(&"basement".into()).unwrap().id;
        registry.reset();
        assert!(registry.is_empty());
        assert!(matches!(registry.grid(before), Err(Error::UnknownBlueprint(_))));

        let after = registry.initialize_blueprint(&"basement".into()).unwrap();
        assert!(after.fresh);
        assert!(after.id > before);
    }

    #[test]
    fn test_spawns_recorded() {
        let mut registry = registry();
        let id = registry.initialize_blueprint(&"basement".into()).unwrap().id;
        assert_eq!(
            registry.spawns(id).iter().filter(|s| s.role == "goblin").count(),
            2
        );
        assert!(registry.spawns(BlueprintId(99)).is_empty());
    }
}
