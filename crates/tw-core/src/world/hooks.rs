//! Collaborator callbacks
//!
//! The engine decides when a trap fires, a client is owed an update or a
//! line of sight is stale; what happens next belongs to the layers above it.
//! Every callback gets the world back mutably and may place, remove or free
//! anything, including the objects passed in.

use crate::map::MapId;
use crate::object::ObjectId;

use super::World;

/// What changed about an item a player can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ItemUpdate {
    Quantity,
    Face,
}

/// Callbacks into gameplay and networking. All methods default to no-ops.
pub trait WorldHooks {
    /// `trigger` was walked onto (or off of) by `victim`.
    fn move_on(
        &self,
        _world: &mut World,
        _trigger: ObjectId,
        _victim: ObjectId,
        _originator: Option<ObjectId>,
    ) {
    }

    /// `op` is about to be freed.
    fn destroyed(&self, _world: &mut World, _op: ObjectId) {}

    /// `op` appeared in something `player` is looking at.
    fn item_added(&self, _world: &mut World, _player: ObjectId, _op: ObjectId) {}

    /// `op` left something `player` is looking at.
    fn item_removed(&self, _world: &mut World, _player: ObjectId, _op: ObjectId) {}

    fn item_changed(&self, _world: &mut World, _player: ObjectId, _op: ObjectId, _what: ItemUpdate) {}

    /// Recompute the derived stats of a player after its inventory changed.
    fn fix_player(&self, _world: &mut World, _player: ObjectId) {}

    /// Light or view blocking changed at (x, y).
    fn update_all_los(&self, _world: &mut World, _map: MapId, _x: i32, _y: i32) {}

    /// Carrying capacity of a creature with the given strength
    fn weight_limit(&self, _strength: i8) -> u32 {
        u32::MAX
    }
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl WorldHooks for NoHooks {}
