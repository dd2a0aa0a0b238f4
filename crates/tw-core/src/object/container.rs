//! Inventories and containers
//!
//! Contents are a chain hanging off `inv`, newest first, linked through
//! `below`/`above`. A player sees the contents of its own inventory and of
//! an applied container it carries or stands above.

use super::flags::{Flag, FreeFlags};
use super::obj::{ObjectId, ObjectType};
use crate::map::TileFlags;
use crate::world::{ObjectError, Result, World};

impl World {
    /// Put the removed, single-part object `op` into `container`.
    ///
    /// Stackable objects merge into a matching item already inside; the
    /// surviving item is returned and `op` is freed. Weight totals are
    /// adjusted up the environment chain and a watching player is told
    /// about the new item.
    pub fn insert_in_container(&mut self, op: ObjectId, container: ObjectId) -> Result<ObjectId> {
        if !self.obj(op).is_removed() {
            return Err(self.violation(ObjectError::NotRemoved { id: op }, Some(op)));
        }
        if self.obj(container).links.head.is_some() {
            log::debug!("Warning: Tried to insert object wrong part of multipart object.");
        }
        let container = self.head_of(container);
        if self.obj(op).links.more.is_some() {
            return Err(self.violation(ObjectError::MultipartInContainer { id: op }, Some(op)));
        }

        {
            let ob = self.obj_mut(op);
            ob.clear_flag(Flag::ObjOriginal);
            ob.clear_flag(Flag::Removed);
        }

        let nrof = self.obj(op).nrof;
        if nrof > 0 {
            for tmp in self.inventory(container) {
                if self.can_merge(tmp, op) {
                    self.increase_nrof(tmp, nrof);
                    self.obj_mut(op).set_flag(Flag::Removed);
                    self.free(op, FreeFlags::FREE_INVENTORY | FreeFlags::NO_DESTROY_CALLBACK)?;
                    return Ok(tmp);
                }
            }
        }
        let weight = self.carried_weight(op);
        self.add_weight(container, weight);

        let below = self.obj(container).links.inv;
        {
            let ob = self.obj_mut(op);
            ob.links.map = None;
            ob.links.env = Some(container);
            ob.links.above = None;
            ob.links.below = below;
            ob.x = 0;
            ob.y = 0;
            ob.ox = 0;
            ob.oy = 0;
        }
        if let Some(b) = below {
            self.obj_mut(b).links.above = Some(op);
        }
        self.obj_mut(container).links.inv = Some(op);

        let hooks = self.hooks();
        let tag = self.obj(op).count;
        if self.obj(container).is_controlled() {
            hooks.item_added(self, container, op);
        } else if let Some(pl) = self.container_watcher(container) {
            hooks.item_added(self, pl, op);
        }
        if !self.is_valid(op, tag) || self.obj(op).links.env != Some(container) {
            log::debug!("{op:?} left {container:?} during item_added");
            return Ok(op);
        }

        if let Some(pl) = self.player_container(container) {
            let ob = self.obj(op);
            let relevant =
                ob.has(Flag::Applied) || ob.type_ == ObjectType::Skill || ob.glow_radius != 0;
            let owner = self.obj(pl);
            if owner.is_controlled() && !owner.has(Flag::NoFixPlayer) && relevant {
                hooks.fix_player(self, pl);
            }
        }

        if self.obj(op).glow_radius != 0 {
            let c = self.obj(container);
            if let Some(map) = c.links.map {
                let (x, y) = (c.x, c.y);
                if self.map(map).darkness != 0 && !self.map(map).out_of_map(x, y) {
                    self.map_mut(map).tile_mut(x, y).flags |= TileFlags::NEED_UPDATE;
                    self.update_position(map, x, y);
                    hooks.update_all_los(self, map, x, y);
                }
            }
        }

        Ok(op)
    }

    /// Player looking into `container`, if it is an open container carried
    /// by a player or lying under one.
    pub(crate) fn container_watcher(&self, container: ObjectId) -> Option<ObjectId> {
        let c = self.obj(container);
        if c.type_ != ObjectType::Container || !c.has(Flag::Applied) {
            return None;
        }
        if let Some(env) = c.links.env {
            return self.obj(env).is_controlled().then_some(env);
        }
        c.links.map?;
        let mut above = c.links.above;
        while let Some(a) = above {
            if self.obj(a).is_controlled() {
                return Some(a);
            }
            above = self.obj(a).links.above;
        }
        None
    }

    /// Player that sees changes to items directly inside `env`
    pub(crate) fn inventory_watcher(&self, env: ObjectId, item: ObjectId) -> Option<ObjectId> {
        if self.obj(env).is_controlled() && self.obj(item).links.head.is_none() {
            return Some(env);
        }
        self.container_watcher(env)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::map::TileMap;
    use crate::object::InsertFlags;
    use crate::world::WorldHooks;

    #[derive(Default)]
    struct Seen {
        added: RefCell<Vec<(ObjectId, ObjectId)>>,
        fixed: RefCell<Vec<ObjectId>>,
    }

    impl WorldHooks for Seen {
        fn item_added(&self, _world: &mut World, player: ObjectId, op: ObjectId) {
            self.added.borrow_mut().push((player, op));
        }

        fn fix_player(&self, _world: &mut World, player: ObjectId) {
            self.fixed.borrow_mut().push(player);
        }
    }

    #[test]
    fn test_insert_prepends_and_links() {
        let mut world = World::with_seed(5);
        let bag = world.object_new();
        let a = world.object_new();
        let b = world.object_new();
        world.insert_in_container(a, bag).unwrap();
        world.insert_in_container(b, bag).unwrap();
        assert_eq!(world.inventory(bag), vec![b, a]);
        assert_eq!(world.obj(a).links.above, Some(b));
        assert_eq!(world.obj(b).links.env, Some(bag));
        assert!(!world.obj(b).is_removed());
    }

    #[test]
    fn test_insert_rejects_placed_and_multipart() {
        let mut world = World::with_seed(5);
        let bag = world.object_new();
        let a = world.object_new();
        world.insert_in_container(a, bag).unwrap();
        assert_eq!(
            world.insert_in_container(a, bag),
            Err(ObjectError::NotRemoved { id: a })
        );

        let head = world.object_new();
        let tail = world.object_new();
        world.obj_mut(head).links.more = Some(tail);
        world.obj_mut(tail).links.head = Some(head);
        assert_eq!(
            world.insert_in_container(head, bag),
            Err(ObjectError::MultipartInContainer { id: head })
        );
    }

    #[test]
    fn test_insert_merges_stack() {
        let mut world = World::with_seed(5);
        let bag = world.object_new();
        let a = world.object_new();
        world.obj_mut(a).nrof = 3;
        world.obj_mut(a).weight = 10;
        let b = world.object_new();
        world.obj_mut(b).nrof = 4;
        world.obj_mut(b).weight = 10;
        let tag_b = world.obj(b).count;
        world.insert_in_container(a, bag).unwrap();
        let got = world.insert_in_container(b, bag).unwrap();
        assert_eq!(got, a);
        assert_eq!(world.obj(a).nrof, 7);
        assert!(!world.is_valid(b, tag_b));
        assert_eq!(world.obj(bag).carrying, 70);
    }

    #[test]
    fn test_player_is_notified() {
        let mut world = World::with_seed(5);
        let seen = Rc::new(Seen::default());
        world.set_hooks(seen.clone());
        let pl = world.object_new();
        world.obj_mut(pl).type_ = ObjectType::Player;
        world.register_player(pl);
        let torch = world.object_new();
        world.obj_mut(torch).glow_radius = 2;
        world.insert_in_container(torch, pl).unwrap();
        assert_eq!(*seen.added.borrow(), vec![(pl, torch)]);
        assert_eq!(*seen.fixed.borrow(), vec![pl]);
    }

    #[test]
    fn test_open_container_on_map_notifies_player_above() {
        let mut world = World::with_seed(5);
        let seen = Rc::new(Seen::default());
        world.set_hooks(seen.clone());
        let map = world.add_map(TileMap::new("shop", 3, 3));
        let chest = world.object_new();
        world.obj_mut(chest).type_ = ObjectType::Container;
        world.obj_mut(chest).set_flag(Flag::Applied);
        world.insert_in_map_at(chest, map, None, InsertFlags::empty(), 1, 1).unwrap();
        // insertion clears applied; the player opens it afterwards
        world.obj_mut(chest).set_flag(Flag::Applied);
        let pl = world.object_new();
        world.obj_mut(pl).type_ = ObjectType::Player;
        world.register_player(pl);
        world.insert_in_map_at(pl, map, None, InsertFlags::empty(), 1, 1).unwrap();

        let gem = world.object_new();
        world.insert_in_container(gem, chest).unwrap();
        assert_eq!(*seen.added.borrow(), vec![(pl, gem)]);
        assert_eq!(world.container_watcher(chest), Some(pl));
    }
}
