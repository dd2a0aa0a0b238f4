//! Stacking identical objects
//!
//! Two objects merge when every property that survives as a single stack
//! is equal. Spell effects use their own rules, see [`World::merge_spell`].

use std::rc::Rc;

use super::flags::{Flag, FreeFlags};
use super::kv::KeyValues;
use super::obj::{Object, ObjectId, ObjectType, Tag};
use crate::consts::{MAX_MERGED_NROF, SPELL_TAG_SIZE};
use crate::shstr::same;
use crate::world::{Result, World};

/// Slot of the spell tag table a tag hashes to
#[inline]
fn tag_slot(tag: Tag) -> usize {
    (tag.0 as usize) & (SPELL_TAG_SIZE - 1)
}

/// Tag recorded for a spell effect. `maxhp` doubles as the casting tag.
#[inline]
fn spell_tag(ob: &Object) -> Tag {
    Tag(ob.stats.maxhp as u32)
}

/// True if the table of `ob` has a different tag in the slot of `tag`.
fn tag_conflicts(ob: &Object, tag: Tag) -> bool {
    ob.spell_tags.as_ref().is_some_and(|tags| {
        let slot = tags[tag_slot(tag)];
        slot != tag && slot != Tag::NONE
    })
}

fn same_arch(a: &Object, b: &Object) -> bool {
    match (&a.arch, &b.arch) {
        (None, None) => true,
        (Some(x), Some(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// Every field compared when stacking, apart from quantity and inventory
fn same_values(a: &Object, b: &Object) -> bool {
    same_arch(a, b)
        && a.flags.merge_equal(&b.flags)
        && same(&a.name, &b.name)
        && same(&a.title, &b.title)
        && same(&a.msg, &b.msg)
        && a.weight == b.weight
        && a.item_power == b.item_power
        && a.resist == b.resist
        && a.stats == b.stats
        && a.attacktype == b.attacktype
        && a.magic == b.magic
        && same(&a.slaying, &b.slaying)
        && same(&a.skill, &b.skill)
        && a.value == b.value
        && a.animation_id == b.animation_id
        && a.client_type == b.client_type
        && same(&a.materialname, &b.materialname)
        && same(&a.lore, &b.lore)
        && a.subtype == b.subtype
        && a.move_type == b.move_type
        && a.move_block == b.move_block
        && a.move_allow == b.move_allow
        && a.move_on == b.move_on
        && a.move_off == b.move_off
        && a.move_slow == b.move_slow
        && a.move_slow_penalty == b.move_slow_penalty
        && a.map_layer == b.map_layer
}

impl World {
    /// True if `ob1` and `ob2` can be one stack.
    ///
    /// Identified objects get `BeenApplied` set first so that flag does not
    /// keep them apart.
    pub fn can_merge(&mut self, ob1: ObjectId, ob2: ObjectId) -> bool {
        if ob1 == ob2 {
            return false;
        }
        let (a, b) = (self.obj(ob1), self.obj(ob2));
        if a.type_ != b.type_ || a.speed != b.speed {
            return false;
        }
        if !a.has(Flag::Animate) && a.speed.abs() > self.settings.min_active_speed {
            return false;
        }
        if u64::from(a.nrof) + u64::from(b.nrof) >= MAX_MERGED_NROF {
            return false;
        }

        match (a.links.inv, b.links.inv) {
            (None, None) => {}
            (Some(i1), Some(i2)) => {
                if !self.can_merge(i1, i2) {
                    return false;
                }
            }
            _ => return false,
        }

        for id in [ob1, ob2] {
            let ob = self.obj_mut(id);
            if ob.has(Flag::Identified) {
                ob.set_flag(Flag::BeenApplied);
            }
        }

        let (a, b) = (self.obj(ob1), self.obj(ob2));
        if !same_values(a, b) {
            return false;
        }
        if a.has(Flag::Applied) || b.has(Flag::Applied) {
            return false;
        }
        if (!a.key_values.is_empty() || !b.key_values.is_empty())
            && !KeyValues::same_set(&a.key_values, &b.key_values)
        {
            return false;
        }
        if a.type_ == ObjectType::Scroll && a.level != b.level {
            return false;
        }
        same(&a.custom_name, &b.custom_name)
    }

    /// Fold `op` into the first stack it can merge with, scanning down from
    /// `top` (or from the top of the stack `op` is in).
    ///
    /// On success `op` is removed and freed and the grown stack returned.
    pub fn merge(&mut self, op: ObjectId, top: Option<ObjectId>) -> Result<Option<ObjectId>> {
        let nrof = self.obj(op).nrof;
        if nrof == 0 {
            return Ok(None);
        }
        let mut cur = match top {
            Some(t) => Some(t),
            None => {
                let mut t = op;
                while let Some(a) = self.obj(t).links.above {
                    t = a;
                }
                Some(t)
            }
        };
        while let Some(tmp) = cur {
            cur = self.obj(tmp).links.below;
            if tmp == op || !self.can_merge(op, tmp) {
                continue;
            }
            self.increase_nrof(tmp, nrof);
            // the grown stack already accounts for this weight
            self.obj_mut(op).weight = 0;
            self.remove(op)?;
            self.free(op, FreeFlags::FREE_INVENTORY | FreeFlags::NO_DESTROY_CALLBACK)?;
            return Ok(Some(tmp));
        }
        Ok(None)
    }

    /// Absorb into `op` the spell effects at (x, y) it may be combined with:
    /// same owner, kind, direction and strength, not yet due to move this
    /// tick, and with compatible tag tables. Damage is averaged over the
    /// durations.
    pub fn merge_spell(&mut self, op: ObjectId, x: i32, y: i32) -> Result<()> {
        let Some(map) = self.obj(op).links.map else {
            return Ok(());
        };
        if self.map(map).out_of_map(x, y) {
            return Ok(());
        }
        for tmp in self.tile_objects(map, x, y) {
            if tmp == op || !self.on_tile(tmp, map, x, y) || !self.spell_compatible(op, tmp) {
                continue;
            }
            if !self.merge_spell_tags(op, tmp) {
                continue;
            }

            self.stats.spell_merges += 1;
            let t = self.obj(tmp);
            let (t_left, t_dur, t_dam) = (t.speed_left, t.duration, t.stats.dam);
            let ob = self.obj_mut(op);
            ob.speed_left = ob.speed_left.max(t_left);
            if t_dur != ob.duration {
                let dam = i32::from(t_dam) * (i32::from(t_dur) + 1)
                    + i32::from(ob.stats.dam) * (i32::from(ob.duration) + 1);
                ob.duration = ob.duration.max(t_dur);
                ob.stats.dam = (dam / (i32::from(ob.duration) + 1) + 1) as i16;
            } else {
                ob.stats.dam += t_dam;
            }

            self.remove(tmp)?;
            self.free_drop_inventory(tmp)?;
        }
        Ok(())
    }

    fn spell_compatible(&self, op: ObjectId, tmp: ObjectId) -> bool {
        let (o, t) = (self.obj(op), self.obj(tmp));
        o.type_ == t.type_
            && o.subtype == t.subtype
            && o.direction == t.direction
            && o.owner == t.owner
            && o.ownercount == t.ownercount
            && o.range == t.range
            && o.stats.wc == t.stats.wc
            && o.level == t.level
            && o.attacktype == t.attacktype
            && o.speed == t.speed
            && t.other_arch.is_none()
            && t.speed_left + t.speed < 0.0
    }

    /// Combine the tag tables of `op` and `tmp` and record the tag of `tmp`
    /// in `op`. Returns false, leaving both untouched, when they conflict.
    fn merge_spell_tags(&mut self, op: ObjectId, tmp: ObjectId) -> bool {
        let (o, t) = (self.obj(op), self.obj(tmp));
        let (op_tag, tmp_tag) = (spell_tag(o), spell_tag(t));
        if tag_conflicts(o, tmp_tag) || tag_conflicts(t, op_tag) || tag_conflicts(t, tmp_tag) {
            return false;
        }

        if let (Some(ot), Some(tt)) = (&o.spell_tags, &t.spell_tags) {
            // two live tables are never combined; only clashes are counted
            let clash = ot
                .iter()
                .zip(tt.iter())
                .any(|(a, b)| *a != Tag::NONE && *b != Tag::NONE && a != b);
            if clash {
                self.stats.spell_hash_full += 1;
            }
            return false;
        }

        if let Some(tags) = self.obj_mut(tmp).spell_tags.take() {
            let ob = self.obj_mut(op);
            let mut tags = tags;
            if tags[tag_slot(op_tag)] == op_tag {
                tags[tag_slot(op_tag)] = Tag::NONE;
            }
            ob.spell_tags = Some(tags);
        }

        if op_tag != tmp_tag {
            let ob = self.obj_mut(op);
            let tags = ob
                .spell_tags
                .get_or_insert_with(|| Box::new([Tag::NONE; SPELL_TAG_SIZE]));
            tags[tag_slot(tmp_tag)] = tmp_tag;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{MapId, TileMap};
    use crate::object::{Archetype, InsertFlags};

    fn coins(world: &mut World, nrof: u32) -> ObjectId {
        let id = world.object_new();
        let name = world.strings.intern("gold coin");
        let ob = world.obj_mut(id);
        ob.type_ = ObjectType::Money;
        ob.name = Some(name);
        ob.nrof = nrof;
        ob.weight = 10;
        id
    }

    #[test]
    fn test_can_merge_basic() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 3);
        let b = coins(&mut world, 4);
        assert!(world.can_merge(a, b));
        assert!(world.can_merge(b, a));
        assert!(!world.can_merge(a, a));

        world.obj_mut(b).weight = 11;
        assert!(!world.can_merge(a, b));
    }

    #[test]
    fn test_can_merge_rejections() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 1);
        let b = coins(&mut world, 1);

        world.obj_mut(a).speed = 0.5;
        world.obj_mut(b).speed = 0.5;
        assert!(!world.can_merge(a, b));
        world.obj_mut(a).set_flag(Flag::Animate);
        world.obj_mut(b).set_flag(Flag::Animate);
        assert!(world.can_merge(a, b));

        world.obj_mut(a).set_flag(Flag::Applied);
        world.obj_mut(b).set_flag(Flag::Applied);
        assert!(!world.can_merge(a, b));
    }

    #[test]
    fn test_can_merge_overflow() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 1 << 30);
        let b = coins(&mut world, 1 << 30);
        assert!(!world.can_merge(a, b));
        world.obj_mut(b).nrof = (1 << 30) - 1;
        assert!(world.can_merge(a, b));
    }

    #[test]
    fn test_identified_normalizes_been_applied() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 1);
        let b = coins(&mut world, 1);
        world.obj_mut(a).set_flag(Flag::Identified);
        world.obj_mut(b).set_flag(Flag::Identified);
        world.obj_mut(a).set_flag(Flag::BeenApplied);
        assert!(world.can_merge(a, b));
        assert!(world.obj(b).has(Flag::BeenApplied));
    }

    #[test]
    fn test_key_values_must_match_both_ways() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 1);
        let b = coins(&mut world, 1);
        world.set_value(a, "mark", Some("x"), true);
        assert!(!world.can_merge(a, b));
        world.set_value(b, "mark", Some("x"), true);
        assert!(world.can_merge(a, b));
        world.set_value(b, "extra", Some("y"), true);
        assert!(!world.can_merge(a, b));
    }

    #[test]
    fn test_inventory_heads_compared() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 1);
        let b = coins(&mut world, 1);
        let ia = coins(&mut world, 1);
        world.insert_in_container(ia, a).unwrap();
        assert!(!world.can_merge(a, b));
        let ib = coins(&mut world, 1);
        world.insert_in_container(ib, b).unwrap();
        assert!(world.can_merge(a, b));
    }

    #[test]
    fn test_scroll_level_and_custom_name() {
        let mut world = World::with_seed(8);
        let a = coins(&mut world, 1);
        let b = coins(&mut world, 1);
        world.obj_mut(a).type_ = ObjectType::Scroll;
        world.obj_mut(b).type_ = ObjectType::Scroll;
        world.obj_mut(a).level = 3;
        assert!(!world.can_merge(a, b));
        world.obj_mut(b).level = 3;
        assert!(world.can_merge(a, b));
        world.obj_mut(a).custom_name = Some(world.strings.intern("lucky"));
        assert!(!world.can_merge(a, b));
    }

    #[test]
    fn test_same_archetype_required() {
        let mut world = World::with_seed(8);
        let name = world.strings.intern("arrow");
        let at = world.archetypes.add(Archetype::new(name, Object::blank()));
        let a = coins(&mut world, 1);
        let b = coins(&mut world, 1);
        world.obj_mut(a).arch = Some(Rc::clone(&at));
        assert!(!world.can_merge(a, b));
        world.obj_mut(b).arch = Some(at);
        assert!(world.can_merge(a, b));
    }

    #[test]
    fn test_merge_into_stack() {
        let mut world = World::with_seed(8);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let a = coins(&mut world, 5);
        let rock = world.object_new();
        world.insert_in_map_at(a, map, None, InsertFlags::empty(), 1, 1).unwrap();
        world.insert_in_map_at(rock, map, None, InsertFlags::empty(), 1, 1).unwrap();
        let b = coins(&mut world, 2);
        world
            .insert_in_map_at(b, map, None, InsertFlags::NO_MERGE, 1, 1)
            .unwrap();
        let tag_b = world.obj(b).count;

        let got = world.merge(b, None).unwrap();
        assert_eq!(got, Some(a));
        assert_eq!(world.obj(a).nrof, 7);
        assert!(!world.is_valid(b, tag_b));
        assert_eq!(world.tile_objects(map, 1, 1), vec![a, rock]);

        let single = world.object_new();
        assert_eq!(world.merge(single, None).unwrap(), None);
    }

    fn bolt(world: &mut World, map: MapId, maxhp: i16, dam: i16, duration: i16) -> ObjectId {
        let id = world.object_new();
        let ob = world.obj_mut(id);
        ob.type_ = ObjectType::SpellEffect;
        ob.speed = 1.0;
        ob.speed_left = -2.0;
        ob.stats.maxhp = maxhp;
        ob.stats.dam = dam;
        ob.duration = duration;
        ob.links.map = Some(map);
        id
    }

    #[test]
    fn test_spell_effects_merge() {
        let mut world = World::with_seed(8);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let first = bolt(&mut world, map, 17, 10, 0);
        world.insert_in_map_at(first, map, None, InsertFlags::empty(), 1, 1).unwrap();
        let tag_first = world.obj(first).count;

        let second = bolt(&mut world, map, 18, 4, 0);
        world.insert_in_map_at(second, map, None, InsertFlags::empty(), 1, 1).unwrap();
        assert!(!world.is_valid(first, tag_first));
        assert_eq!(world.stats.spell_merges, 1);
        let ob = world.obj(second);
        assert_eq!(ob.stats.dam, 14);
        let tags = ob.spell_tags.as_ref().unwrap();
        assert_eq!(tags[17 & 0xf], Tag(17));
    }

    #[test]
    fn test_spell_effects_weighted_damage() {
        let mut world = World::with_seed(8);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let first = bolt(&mut world, map, 5, 10, 3);
        world.insert_in_map_at(first, map, None, InsertFlags::empty(), 0, 0).unwrap();
        let second = bolt(&mut world, map, 5, 2, 1);
        world.insert_in_map_at(second, map, None, InsertFlags::empty(), 0, 0).unwrap();
        let ob = world.obj(second);
        assert_eq!(ob.duration, 3);
        // (10 * 4 + 2 * 2) / 4 + 1
        assert_eq!(ob.stats.dam, 12);
        assert!(ob.spell_tags.is_none());
    }

    #[test]
    fn test_spell_tables_never_combined() {
        let mut world = World::with_seed(8);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let first = bolt(&mut world, map, 1, 1, 0);
        let mut tags = Box::new([Tag::NONE; SPELL_TAG_SIZE]);
        tags[3] = Tag(3);
        world.obj_mut(first).spell_tags = Some(tags.clone());
        world.insert_in_map_at(first, map, None, InsertFlags::empty(), 2, 2).unwrap();

        let second = bolt(&mut world, map, 1, 1, 0);
        tags[3] = Tag(19);
        world.obj_mut(second).spell_tags = Some(tags);
        world.insert_in_map_at(second, map, None, InsertFlags::empty(), 2, 2).unwrap();
        assert_eq!(world.tile_objects(map, 2, 2).len(), 2);
        assert_eq!(world.stats.spell_hash_full, 1);
        assert_eq!(world.stats.spell_merges, 0);
    }
}
