//! Inventory and tile lookups
//!
//! Searches only look at the direct contents unless stated otherwise and
//! return the topmost match.

use std::rc::Rc;

use super::archetype::Archetype;
use super::flags::Flag;
use super::obj::{Object, ObjectId, ObjectType, Tag};
use crate::map::MapId;
use crate::shstr::SharedStr;
use crate::world::World;

fn field_is(field: &Option<SharedStr>, s: &str) -> bool {
    field.as_deref() == Some(s)
}

impl World {
    /// First item in `who` matching `pred`
    pub fn find_in_inventory(&self, who: ObjectId, pred: impl Fn(&Object) -> bool) -> Option<ObjectId> {
        let mut cur = self.obj(who).links.inv;
        while let Some(c) = cur {
            let ob = self.obj(c);
            if pred(ob) {
                return Some(c);
            }
            cur = ob.links.below;
        }
        None
    }

    /// Item named `name`. Only interned names can match.
    pub fn find_by_name(&self, who: ObjectId, name: &str) -> Option<ObjectId> {
        let name = self.strings.find(name)?;
        self.find_in_inventory(who, |ob| ob.name.as_ref() == Some(&name))
    }

    pub fn find_by_type(&self, who: ObjectId, type_: ObjectType) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_)
    }

    /// Item of either type
    pub fn find_by_type2(&self, who: ObjectId, type1: ObjectType, type2: ObjectType) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type1 || ob.type_ == type2)
    }

    pub fn find_by_tag(&self, who: ObjectId, tag: Tag) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.count == tag)
    }

    /// Applied item of the given type
    pub fn find_by_type_applied(&self, who: ObjectId, type_: ObjectType) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_ && ob.has(Flag::Applied))
    }

    pub fn find_by_type_and_name(&self, who: ObjectId, type_: ObjectType, name: &str) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_ && field_is(&ob.name, name))
    }

    pub fn find_by_type_and_race(&self, who: ObjectId, type_: ObjectType, race: &str) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_ && field_is(&ob.race, race))
    }

    pub fn find_by_type_and_slaying(
        &self,
        who: ObjectId,
        type_: ObjectType,
        slaying: &str,
    ) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_ && field_is(&ob.slaying, slaying))
    }

    pub fn find_by_type_and_skill(&self, who: ObjectId, type_: ObjectType, skill: &str) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_ && field_is(&ob.skill, skill))
    }

    pub fn find_by_flag(&self, who: ObjectId, flag: Flag) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.has(flag))
    }

    pub fn find_by_flag_applied(&self, who: ObjectId, flag: Flag) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.has(flag) && ob.has(Flag::Applied))
    }

    /// Item made from the archetype called `name`
    pub fn find_by_arch_name(&self, who: ObjectId, name: &str) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.arch.as_ref().is_some_and(|a| a.name.as_str() == name))
    }

    pub fn find_by_type_and_arch_name(&self, who: ObjectId, type_: ObjectType, name: &str) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| {
            ob.type_ == type_ && ob.arch.as_ref().is_some_and(|a| a.name.as_str() == name)
        })
    }

    pub fn find_by_type_subtype(&self, who: ObjectId, type_: ObjectType, subtype: u8) -> Option<ObjectId> {
        self.find_in_inventory(who, |ob| ob.type_ == type_ && ob.subtype == subtype)
    }

    /// Item of the given type directly inside `op`
    pub fn present_in_ob(&self, type_: ObjectType, op: ObjectId) -> Option<ObjectId> {
        self.find_in_inventory(op, |ob| ob.type_ == type_)
    }

    /// Item named `name`, of type `type_` if given
    pub fn present_in_ob_by_name(&self, type_: Option<ObjectType>, name: &str, op: ObjectId) -> Option<ObjectId> {
        self.find_in_inventory(op, |ob| {
            type_.is_none_or(|t| ob.type_ == t) && field_is(&ob.name, name)
        })
    }

    pub fn arch_present_in_ob(&self, at: &Rc<Archetype>, op: ObjectId) -> Option<ObjectId> {
        self.find_in_inventory(op, |ob| ob.arch.as_ref().is_some_and(|a| Rc::ptr_eq(a, at)))
    }

    /// First object at (x, y) made from `at`
    pub fn map_find_by_archetype(&self, map: MapId, x: i32, y: i32, at: &Rc<Archetype>) -> Option<ObjectId> {
        if self.try_map(map).is_none_or(|m| m.out_of_map(x, y)) {
            log::error!("map_find_by_archetype called outside map.");
            return None;
        }
        self.tile_objects(map, x, y)
            .into_iter()
            .find(|&id| self.obj(id).arch.as_ref().is_some_and(|a| Rc::ptr_eq(a, at)))
    }

    /// First object at (x, y) of the given type
    pub fn map_find_by_type(&self, map: MapId, x: i32, y: i32, type_: ObjectType) -> Option<ObjectId> {
        if self.try_map(map).is_none_or(|m| m.out_of_map(x, y)) {
            log::error!("map_find_by_type called outside map.");
            return None;
        }
        self.tile_objects(map, x, y)
            .into_iter()
            .find(|&id| self.obj(id).type_ == type_)
    }

    /// Set `flag` on everything inside `op`, recursively.
    pub fn set_flag_inv(&mut self, op: ObjectId, flag: Flag) {
        for item in self.inventory(op) {
            self.obj_mut(item).set_flag(flag);
            self.set_flag_inv(item, flag);
        }
    }

    /// Clear `flag` on everything inside `op`, recursively.
    pub fn unset_flag_inv(&mut self, op: ObjectId, flag: Flag) {
        for item in self.inventory(op) {
            self.obj_mut(item).clear_flag(flag);
            self.unset_flag_inv(item, flag);
        }
    }

    /// Value of the extension field `key`
    pub fn get_value(&self, op: ObjectId, key: &str) -> Option<SharedStr> {
        // a key nobody interned cannot be set on any object
        let key = self.strings.find(key)?;
        self.obj(op).key_values.get(&key).cloned()
    }

    /// Set the extension field `key` on `op`. `None` clears it; a field its
    /// archetype defines is kept with an empty value so the override sticks.
    /// Missing fields are only created when `add_key` is set.
    pub fn set_value(&mut self, op: ObjectId, key: &str, value: Option<&str>, add_key: bool) -> bool {
        let present = self
            .strings
            .find(key)
            .filter(|k| self.obj(op).key_values.contains(k));
        let key = match present {
            Some(key) => key,
            None if !add_key => return false,
            // clearing a missing key adds nothing
            None if value.is_none() => return true,
            None => self.strings.intern(key),
        };
        let value = value.map(|v| self.strings.intern(v));
        let keep_empty = self
            .obj(op)
            .arch
            .as_ref()
            .is_some_and(|a| a.clone.key_values.contains(&key));
        self.obj_mut(op).key_values.set(key, value, add_key, keep_empty)
    }
}
