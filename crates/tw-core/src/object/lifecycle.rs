//! Object creation, copying and disposal
//!
//! Strings and archetypes are reference counted, so copying an object is a
//! plain clone of the record with the structural links left alone, and
//! clearing one simply drops the old values.

use std::rc::Rc;

use super::archetype::Archetype;
use super::flags::{Flag, FreeFlags, InsertFlags, MoveType};
use super::obj::{Object, ObjectId, ObjectType};
use crate::consts::SIZEOFFREE;
use crate::map::MapState;
use crate::world::{ObjectError, Result, World};

impl World {
    /// Allocate a blank object. It is flagged removed and placed nowhere.
    pub fn object_new(&mut self) -> ObjectId {
        self.objects.allocate()
    }

    /// Reset `op` to a blank record. Pool links and the tag survive.
    pub fn object_clear(&mut self, op: ObjectId) {
        self.objects.unlink_active(op);
        let ob = self.obj_mut(op);
        let (next, prev, count) = (ob.links.next, ob.links.prev, ob.count);
        *ob = Object::blank();
        ob.links.next = next;
        ob.links.prev = prev;
        ob.count = count;
    }

    /// Overwrite `dest` with the values of `src`.
    ///
    /// Links, tag and player session of `dest` are kept, as are its freed and
    /// removed flags. Objects with negative speed get a random head start.
    pub fn object_copy(&mut self, src: ObjectId, dest: ObjectId) {
        let values = self.obj(src).clone();
        self.copy_values(values, dest);
    }

    pub(crate) fn copy_values(&mut self, mut values: Object, dest: ObjectId) {
        let jitter = if values.speed < 0.0 {
            self.rng.rn2(200) as f32 / 100.0
        } else {
            0.0
        };

        let ob = self.obj_mut(dest);
        let was_freed = ob.is_freed();
        let was_removed = ob.is_removed();
        values.links = ob.links;
        values.count = ob.count;
        values.player = ob.player.take();
        if was_freed {
            values.set_flag(Flag::Freed);
        }
        if was_removed {
            values.set_flag(Flag::Removed);
        }
        values.speed_left -= jitter;
        *ob = values;

        self.update_speed(dest);
    }

    /// Copy `src` into `dest` and duplicate its whole inventory into `dest`.
    pub fn object_copy_with_inv(&mut self, src: ObjectId, dest: ObjectId) -> Result<()> {
        self.object_copy(src, dest);
        for item in self.inventory(src) {
            let tmp = self.object_new();
            self.object_copy_with_inv(item, tmp)?;
            self.insert_in_container(tmp, dest)?;
        }
        Ok(())
    }

    /// Single object instantiated from one archetype part
    pub fn arch_to_object(&mut self, arch: &Rc<Archetype>) -> ObjectId {
        let op = self.object_new();
        self.copy_values(arch.clone.clone(), op);
        self.obj_mut(op).arch = Some(Rc::clone(arch));
        op
    }

    /// Instantiate every part of `arch`, linked head to tail, each part's
    /// coordinates holding its offset from the head.
    pub fn object_create_arch(&mut self, arch: &Rc<Archetype>) -> ObjectId {
        let mut head: Option<ObjectId> = None;
        let mut prev: Option<ObjectId> = None;
        for part in Archetype::parts(arch) {
            let op = self.arch_to_object(&part);
            {
                let ob = self.obj_mut(op);
                ob.x = part.clone.x;
                ob.y = part.clone.y;
                ob.links.head = head;
            }
            if let Some(p) = prev {
                self.obj_mut(p).links.more = Some(op);
            }
            head.get_or_insert(op);
            prev = Some(op);
        }
        // parts() yields at least the archetype itself
        head.unwrap_or_else(|| self.object_new())
    }

    /// Instantiate the registered archetype `name`.
    pub fn create_by_name(&mut self, name: &str) -> Result<ObjectId> {
        match self.archetypes.find(name) {
            Some(arch) => Ok(self.object_create_arch(&arch)),
            None => {
                log::warn!("No archetype named {name}");
                Err(ObjectError::UnknownArchetype {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Duplicate `src` with all its parts and its inventory. Part
    /// coordinates of the copy are relative to its head.
    pub fn create_clone(&mut self, src: ObjectId) -> Result<ObjectId> {
        let src = self.head_of(src);
        let (src_x, src_y) = (self.obj(src).x, self.obj(src).y);

        let mut dst: Option<ObjectId> = None;
        let mut prev: Option<ObjectId> = None;
        let mut part = Some(src);
        while let Some(p) = part {
            let tmp = self.object_new();
            self.object_copy(p, tmp);
            let is_head = self.obj(p).links.head.is_none();
            {
                let ob = self.obj_mut(tmp);
                // insert_in_container recomputes the contents
                ob.carrying = ob.arch.as_ref().map(|a| a.clone.carrying).unwrap_or(0);
                ob.x -= src_x;
                ob.y -= src_y;
                ob.links.head = if is_head { None } else { dst };
                ob.links.more = None;
            }
            if is_head {
                dst = Some(tmp);
            }
            if let Some(pr) = prev {
                self.obj_mut(pr).links.more = Some(tmp);
            }
            prev = Some(tmp);
            part = self.obj(p).links.more;
        }

        let Some(dst) = dst else {
            return Err(ObjectError::StaleHandle { id: src });
        };
        for item in self.inventory(src) {
            let copy = self.create_clone(item)?;
            self.insert_in_container(copy, dst)?;
        }
        Ok(dst)
    }

    /// Set the message text. Messages are expected to end with a newline.
    pub fn set_msg(&mut self, op: ObjectId, msg: Option<&str>) {
        if let Some(m) = msg
            && !m.contains('\n')
        {
            log::error!("Setting a message without a trailing newline!");
        }
        let msg = msg.map(|m| self.strings.intern(m));
        self.obj_mut(op).msg = msg;
    }

    /// Free `op`, dropping its inventory where it stood.
    pub fn free_drop_inventory(&mut self, op: ObjectId) -> Result<()> {
        self.free(op, FreeFlags::empty())
    }

    /// Dispose of a removed object and return its record to the pool.
    ///
    /// The inventory is freed along with it when asked to, or when there is
    /// nowhere to drop it; otherwise it is dropped on the object's last
    /// position (a random part of it, for multi-part objects). The `more`
    /// parts are freed too.
    pub fn free(&mut self, op: ObjectId, flags: FreeFlags) -> Result<()> {
        if !self.obj(op).is_removed() {
            return Err(self.violation(ObjectError::NotRemoved { id: op }, Some(op)));
        }
        if self.obj(op).has(Flag::Friendly) {
            log::warn!("Warning: tried to free friendly object.");
        }
        if self.obj(op).is_freed() {
            return Err(self.violation(ObjectError::AlreadyFreed { id: op }, Some(op)));
        }

        if !flags.contains(FreeFlags::NO_DESTROY_CALLBACK) {
            let tag = self.obj(op).count;
            let hooks = self.hooks();
            hooks.destroyed(self, op);
            if !self.is_valid(op, tag) {
                log::debug!("{op:?} was freed by its destroy callback");
                return Ok(());
            }
        }

        if self.obj(op).links.inv.is_some() {
            if self.drops_inventory(op, flags) {
                self.drop_inventory(op, flags)?;
            } else {
                while let Some(item) = self.obj(op).links.inv {
                    if self.remove(item).is_err() {
                        break;
                    }
                    self.free(item, flags)?;
                }
            }
        }

        if let Some(more) = self.obj(op).links.more {
            self.free(more, flags)?;
            self.obj_mut(op).links.more = None;
        }

        self.obj_mut(op).speed = 0.0;
        self.update_speed(op);

        if self.objects.release(op).is_err() {
            return Err(self.violation(ObjectError::AlreadyFreed { id: op }, Some(op)));
        }
        Ok(())
    }

    /// True if the inventory of `op` can land on its last position.
    fn drops_inventory(&self, op: ObjectId, flags: FreeFlags) -> bool {
        if flags.contains(FreeFlags::FREE_INVENTORY) {
            return false;
        }
        let ob = self.obj(op);
        let Some(map) = ob.links.map.and_then(|m| self.try_map(m)) else {
            return false;
        };
        map.state == MapState::InMemory && map.move_block(ob.x, ob.y) != MoveType::ALL
    }

    fn drop_inventory(&mut self, op: ObjectId, flags: FreeFlags) -> Result<()> {
        while let Some(item) = self.obj(op).links.inv {
            if self.remove(item).is_err() {
                break;
            }

            let it = self.obj(item);
            if it.has(Flag::NoDrop) {
                self.free(item, FreeFlags::FREE_INVENTORY)?;
                continue;
            }
            if it.has(Flag::StartEquip)
                || it.has(Flag::IsATemplate)
                || matches!(it.type_, ObjectType::Rune | ObjectType::Trap)
            {
                self.free_drop_inventory(item)?;
                continue;
            }

            let part = if self.obj(op).links.more.is_some() {
                let parts = self.parts(op);
                parts[self.rng.index(parts.len())]
            } else {
                op
            };
            let Some(map) = self.obj(part).links.map else {
                self.free_drop_inventory(item)?;
                continue;
            };
            let (x, y) = (self.obj(part).x, self.obj(part).y);

            let placed = if self.obj(item).has(Flag::Alive) {
                self.insert_to_free_spot_or_free(item, map, x, y, 0, SIZEOFFREE, None)
                    .map(|_| ())
            } else {
                let mut f = InsertFlags::empty();
                if flags.contains(FreeFlags::DROP_ABOVE_FLOOR) {
                    f |= InsertFlags::ABOVE_FLOOR_ONLY;
                }
                self.insert_in_map_at(item, map, None, f, x, y).map(|_| ())
            };
            if let Err(e) = placed {
                log::warn!("Could not drop {item:?} from {op:?}: {e}");
            }
        }
        Ok(())
    }

    /// Head of a multi-part object, the object itself otherwise
    pub fn head_of(&self, op: ObjectId) -> ObjectId {
        self.obj(op).links.head.unwrap_or(op)
    }

    /// All parts of the object `op` belongs to, head first
    pub fn parts(&self, op: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut part = Some(self.head_of(op));
        while let Some(p) = part {
            out.push(p);
            part = self.obj(p).links.more;
        }
        out
    }

    /// Contents of `op`, top first
    pub fn inventory(&self, op: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut cur = self.obj(op).links.inv;
        while let Some(c) = cur {
            out.push(c);
            cur = self.obj(c).links.below;
        }
        out
    }
}
