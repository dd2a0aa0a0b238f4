//! Owner and enemy references
//!
//! Both are stored as handle plus tag and only trusted while the tag still
//! matches the object in that slot.

use super::obj::{ObjectId, ObjectType, Tag};
use crate::world::{ObjectError, Result, World};

impl World {
    /// Owner of `op`, or `None` if it has none or the owner is gone.
    /// A stale owner reference is cleared.
    pub fn get_owner(&mut self, op: ObjectId) -> Option<ObjectId> {
        let ob = self.obj(op);
        let owner = ob.owner?;
        let own = self.obj(owner);
        if !own.is_freed() && !own.is_removed() && own.count == ob.ownercount {
            return Some(owner);
        }
        self.clear_owner(op);
        None
    }

    pub fn clear_owner(&mut self, op: ObjectId) {
        let ob = self.obj_mut(op);
        ob.owner = None;
        ob.ownercount = Tag::NONE;
    }

    /// Make `owner` (or, if it is owned itself, its ultimate owner) the
    /// owner of `op`. `None` clears the owner.
    pub fn set_owner(&mut self, op: ObjectId, owner: Option<ObjectId>) -> Result<()> {
        let Some(mut owner) = owner else {
            self.clear_owner(op);
            return Ok(());
        };

        // a chain can loop through reused slots, so bound the walk
        let mut steps = 0;
        while let Some(next) = self.get_owner(owner) {
            owner = next;
            steps += 1;
            if steps > self.objects.capacity() {
                break;
            }
        }

        if owner == op {
            return Err(self.violation(ObjectError::SelfOwnership { id: op }, Some(op)));
        }

        let tag = self.obj(owner).count;
        let ob = self.obj_mut(op);
        ob.owner = Some(owner);
        ob.ownercount = tag;
        Ok(())
    }

    /// Give `op` the owner of `source`. A player without owner counts as its
    /// own owner; other unowned sources leave `op` untouched.
    pub fn copy_owner(&mut self, op: ObjectId, source: ObjectId) -> Result<()> {
        let owner = match self.get_owner(source) {
            Some(owner) => owner,
            None if self.obj(source).type_ == ObjectType::Player => source,
            None => return Ok(()),
        };
        self.set_owner(op, Some(owner))
    }

    /// Current enemy, cleared if it has been freed since it was set.
    pub fn get_enemy(&mut self, op: ObjectId) -> Option<ObjectId> {
        let ob = self.obj(op);
        let enemy = ob.enemy?;
        if self.is_valid(enemy, ob.enemy_count) {
            return Some(enemy);
        }
        self.set_enemy(op, None);
        None
    }

    pub fn set_enemy(&mut self, op: ObjectId, enemy: Option<ObjectId>) {
        let tag = enemy.map(|e| self.obj(e).count).unwrap_or(Tag::NONE);
        let ob = self.obj_mut(op);
        ob.enemy = enemy;
        ob.enemy_count = tag;
    }
}
