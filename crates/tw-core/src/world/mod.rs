//! World context
//!
//! Everything the object engine mutates lives in one [`World`]: the object
//! pool, the maps, archetypes, interned strings, settings and the random
//! number generator. Independent worlds never share state.

mod errors;
mod hooks;
mod integrity;
mod settings;

pub use errors::{ObjectError, Result};
pub use hooks::{ItemUpdate, NoHooks, WorldHooks};
pub use integrity::IntegrityError;
pub use settings::{Settings, SettingsError};

use std::rc::Rc;

use crate::map::{MapId, TileMap};
use crate::object::{ArchetypeRegistry, Object, ObjectArena, ObjectId, ObjectRef, PlayerState, Tag};
use crate::rng::GameRng;
use crate::shstr::StringTable;

/// Counters kept for the server statistics page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Spell effects folded into another on insertion
    pub spell_merges: u64,
    /// Spell merges refused because both tag tables conflicted
    pub spell_hash_full: u64,
}

/// The simulation state
pub struct World {
    pub objects: ObjectArena,
    pub maps: Vec<TileMap>,
    pub archetypes: ArchetypeRegistry,
    pub strings: StringTable,
    pub settings: Settings,
    pub rng: GameRng,
    /// Objects controlled by a player session
    pub players: Vec<ObjectId>,
    pub stats: WorldStats,
    hooks: Rc<dyn WorldHooks>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("objects", &self.objects.count_used())
            .field("maps", &self.maps.len())
            .field("archetypes", &self.archetypes.len())
            .field("settings", &self.settings)
            .field("seed", &self.rng.seed())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Settings::default(), GameRng::default())
    }
}

impl World {
    pub fn new(settings: Settings, rng: GameRng) -> Self {
        Self {
            objects: ObjectArena::new(settings.pool_batch, settings.memory_debug),
            maps: Vec::new(),
            archetypes: ArchetypeRegistry::new(),
            strings: StringTable::new(),
            settings,
            rng,
            players: Vec::new(),
            stats: WorldStats::default(),
            hooks: Rc::new(NoHooks),
        }
    }

    /// Default settings with a seeded generator
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Settings::default(), GameRng::new(seed))
    }

    pub fn set_hooks(&mut self, hooks: Rc<dyn WorldHooks>) {
        self.hooks = hooks;
    }

    /// Installed hooks. Callers hold the returned handle across the call so
    /// the callback can borrow the world mutably.
    pub fn hooks(&self) -> Rc<dyn WorldHooks> {
        Rc::clone(&self.hooks)
    }

    #[inline]
    pub fn obj(&self, id: ObjectId) -> &Object {
        self.objects.get(id)
    }

    #[inline]
    pub fn obj_mut(&mut self, id: ObjectId) -> &mut Object {
        self.objects.get_mut(id)
    }

    /// Weak reference to a live object
    pub fn object_ref(&self, id: ObjectId) -> ObjectRef {
        ObjectRef {
            id,
            tag: self.obj(id).count,
        }
    }

    /// True while `id` still holds the object tagged `tag`
    pub fn is_valid(&self, id: ObjectId, tag: Tag) -> bool {
        if tag == Tag::NONE || !self.objects.contains(id) {
            return false;
        }
        let ob = self.obj(id);
        !ob.is_freed() && ob.count == tag
    }

    /// Resolve a weak reference, `None` once the object is gone
    pub fn resolve(&self, r: ObjectRef) -> Option<ObjectId> {
        self.is_valid(r.id, r.tag).then_some(r.id)
    }

    pub fn add_map(&mut self, map: TileMap) -> MapId {
        self.maps.push(map);
        MapId((self.maps.len() - 1) as u32)
    }

    /// Map by handle. Handles only come from [`World::add_map`].
    pub fn map(&self, id: MapId) -> &TileMap {
        &self.maps[id.0 as usize]
    }

    pub fn map_mut(&mut self, id: MapId) -> &mut TileMap {
        &mut self.maps[id.0 as usize]
    }

    pub fn try_map(&self, id: MapId) -> Option<&TileMap> {
        self.maps.get(id.0 as usize)
    }

    /// Attach a player session to `id`.
    pub fn register_player(&mut self, id: ObjectId) {
        let ob = self.obj_mut(id);
        if ob.player.is_none() {
            ob.player = Some(Box::new(PlayerState::default()));
        }
        if !self.players.contains(&id) {
            self.players.push(id);
        }
    }

    /// Detach the player session from `id`.
    pub fn unregister_player(&mut self, id: ObjectId) {
        self.obj_mut(id).player = None;
        self.players.retain(|&p| p != id);
    }

    /// Live object carrying `tag`
    pub fn find_by_tag_global(&self, tag: Tag) -> Option<ObjectId> {
        if tag == Tag::NONE {
            return None;
        }
        self.objects.used().find(|&id| self.obj(id).count == tag)
    }

    /// Newest live object named `name`
    pub fn find_by_name_global(&self, name: &str) -> Option<ObjectId> {
        let name = self.strings.find(name)?;
        self.objects
            .used()
            .find(|&id| self.obj(id).name.as_ref() == Some(&name))
    }

    /// Log a contract violation with a dump of the offending object.
    ///
    /// Panics when [`Settings::strict`] is set.
    pub(crate) fn violation(&self, err: ObjectError, id: Option<ObjectId>) -> ObjectError {
        log::error!("{err}\n{}", self.object_dump(id));
        if self.settings.strict {
            panic!("{err}");
        }
        err
    }

    /// Write every used object to the debug log.
    pub fn dump_all(&self) {
        for id in self.objects.used() {
            log::debug!("{:?}: {}", id, self.object_dump(Some(id)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_reference_does_not_resolve() {
        let mut world = World::with_seed(1);
        let a = world.object_new();
        let r = world.object_ref(a);
        assert_eq!(world.resolve(r), Some(a));
        world.free(a, Default::default()).unwrap();
        assert_eq!(world.resolve(r), None);

        let b = world.object_new();
        assert_eq!(a, b);
        assert_eq!(world.resolve(r), None);
    }

    #[test]
    fn test_find_global() {
        let mut world = World::with_seed(1);
        let a = world.object_new();
        let name = world.strings.intern("lantern");
        world.obj_mut(a).name = Some(name);
        assert_eq!(world.find_by_name_global("lantern"), Some(a));
        assert_eq!(world.find_by_name_global("torch"), None);
        let tag = world.obj(a).count;
        assert_eq!(world.find_by_tag_global(tag), Some(a));
        assert_eq!(world.find_by_tag_global(Tag::NONE), None);
    }

    #[test]
    fn test_register_player() {
        let mut world = World::with_seed(1);
        let a = world.object_new();
        world.register_player(a);
        world.register_player(a);
        assert_eq!(world.players, vec![a]);
        assert!(world.obj(a).is_controlled());
        world.unregister_player(a);
        assert!(world.players.is_empty());
        assert!(!world.obj(a).is_controlled());
    }

    #[test]
    #[should_panic]
    fn test_strict_violation_panics() {
        let settings = Settings {
            strict: true,
            ..Settings::default()
        };
        let mut world = World::new(settings, GameRng::new(3));
        let a = world.object_new();
        let _ = world.remove(a);
    }
}
