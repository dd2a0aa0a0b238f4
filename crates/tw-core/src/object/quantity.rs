//! Quantity changes on stacks

use super::flags::FreeFlags;
use super::obj::ObjectId;
use crate::world::{ItemUpdate, ObjectError, Result, World};

impl World {
    /// Split `nr` items off `orig` into a new, unplaced object.
    ///
    /// Taking the whole stack disposes of `orig` and hands back a copy. A
    /// request for more than there is fails and changes nothing.
    pub fn split(&mut self, orig: ObjectId, nr: u32) -> Result<ObjectId> {
        let available = self.obj(orig).quantity();
        if available < nr {
            log::debug!(
                "There are only {available} {}s.",
                self.obj(orig).display_name()
            );
            return Err(ObjectError::InsufficientQuantity {
                id: orig,
                available,
                requested: nr,
            });
        }

        let newob = self.create_clone(orig)?;
        if self.obj(orig).nrof == 0 {
            if !self.obj(orig).is_removed() {
                self.remove(orig)?;
            }
            self.free(orig, FreeFlags::FREE_INVENTORY)?;
        } else {
            self.obj_mut(newob).nrof = nr;
            self.decrease_nrof(orig, nr)?;
        }
        Ok(newob)
    }

    /// Take `i` items away from `op`. When nothing is left the object is
    /// removed and freed and `None` returned.
    pub fn decrease_nrof(&mut self, op: ObjectId, i: u32) -> Result<Option<ObjectId>> {
        if i == 0 {
            return Ok(Some(op));
        }
        let i = i.min(self.obj(op).nrof);

        if self.obj(op).is_removed() {
            self.obj_mut(op).nrof -= i;
        } else if let Some(env) = self.obj(op).links.env {
            if i < self.obj(op).nrof {
                let watcher = self.stack_watcher(env);
                let weight = i64::from(self.obj(op).weight);
                self.sub_weight(env, weight * i64::from(self.obj(op).nrof));
                self.obj_mut(op).nrof -= i;
                self.add_weight(env, weight * i64::from(self.obj(op).nrof));
                if let Some(pl) = watcher {
                    let hooks = self.hooks();
                    hooks.item_changed(self, pl, op, ItemUpdate::Quantity);
                    hooks.fix_player(self, pl);
                }
            } else {
                self.remove(op)?;
                self.obj_mut(op).nrof = 0;
            }
        } else if i < self.obj(op).nrof {
            self.obj_mut(op).nrof -= i;
            self.refresh_look(op);
        } else {
            self.remove(op)?;
            self.obj_mut(op).nrof = 0;
        }

        if self.obj(op).nrof > 0 {
            Ok(Some(op))
        } else {
            self.free_drop_inventory(op)?;
            Ok(None)
        }
    }

    /// Add `i` items to `op`.
    pub fn increase_nrof(&mut self, op: ObjectId, i: u32) {
        if i == 0 {
            return;
        }
        if self.obj(op).is_removed() {
            self.obj_mut(op).nrof += i;
        } else if let Some(env) = self.obj(op).links.env {
            let watcher = self.stack_watcher(env);
            let weight = i64::from(self.obj(op).weight);
            self.sub_weight(env, weight * i64::from(self.obj(op).nrof));
            self.obj_mut(op).nrof += i;
            self.add_weight(env, weight * i64::from(self.obj(op).nrof));
            if let Some(pl) = watcher {
                let hooks = self.hooks();
                hooks.item_changed(self, pl, op, ItemUpdate::Quantity);
            }
        } else {
            self.obj_mut(op).nrof += i;
            self.refresh_look(op);
        }
    }

    /// Player seeing the contents of `env`: the player carrying it, or a
    /// player who has it open.
    fn stack_watcher(&self, env: ObjectId) -> Option<ObjectId> {
        self.player_container(env).or_else(|| {
            self.players
                .iter()
                .copied()
                .find(|&pl| self.obj(pl).links.container == Some(env))
        })
    }

    /// Make the first player on the tile of `op` resend its ground view.
    fn refresh_look(&mut self, op: ObjectId) {
        let ob = self.obj(op);
        let Some(map) = ob.links.map else {
            return;
        };
        let (x, y) = (ob.x, ob.y);
        let Some(pl) = self
            .tile_objects(map, x, y)
            .into_iter()
            .find(|&t| self.obj(t).is_controlled())
        else {
            return;
        };
        if let Some(p) = self.obj_mut(pl).player.as_mut() {
            p.update_look = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::map::TileMap;
    use crate::object::{InsertFlags, ObjectType};
    use crate::world::WorldHooks;

    fn arrows(world: &mut World, nrof: u32) -> ObjectId {
        let id = world.object_new();
        let ob = world.obj_mut(id);
        ob.type_ = ObjectType::Arrow;
        ob.weight = 5;
        ob.nrof = nrof;
        id
    }

    #[test]
    fn test_split_on_map() {
        let mut world = World::with_seed(12);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let quiver = arrows(&mut world, 5);
        world.insert_in_map_at(quiver, map, None, InsertFlags::empty(), 1, 1).unwrap();

        let part = world.split(quiver, 2).unwrap();
        assert_eq!(world.obj(part).nrof, 2);
        assert!(world.obj(part).is_removed());
        assert_eq!(world.obj(quiver).nrof, 3);

        assert_eq!(
            world.split(quiver, 4),
            Err(ObjectError::InsufficientQuantity {
                id: quiver,
                available: 3,
                requested: 4
            })
        );
        assert_eq!(world.obj(quiver).nrof, 3);
    }

    #[test]
    fn test_split_everything_frees_original() {
        let mut world = World::with_seed(12);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let quiver = arrows(&mut world, 4);
        world.insert_in_map_at(quiver, map, None, InsertFlags::empty(), 0, 0).unwrap();
        let tag = world.obj(quiver).count;

        let all = world.split(quiver, 4).unwrap();
        assert_eq!(world.obj(all).nrof, 4);
        assert!(!world.is_valid(quiver, tag));
        assert!(world.map(map).tile(0, 0).top.is_none());
    }

    #[test]
    fn test_split_singular_object() {
        let mut world = World::with_seed(12);
        let sword = world.object_new();
        let tag = world.obj(sword).count;
        let copy = world.split(sword, 1).unwrap();
        assert!(!world.is_valid(sword, tag));
        assert!(world.obj(copy).is_removed());
        assert!(world.split(copy, 2).is_err());
    }

    #[test]
    fn test_decrease_in_container_adjusts_weight() {
        let mut world = World::with_seed(12);
        let bag = world.object_new();
        world.obj_mut(bag).type_ = ObjectType::Container;
        world.obj_mut(bag).stats.str = 50;
        let quiver = arrows(&mut world, 10);
        world.insert_in_container(quiver, bag).unwrap();
        assert_eq!(world.obj(bag).carrying, 25);

        assert_eq!(world.decrease_nrof(quiver, 4).unwrap(), Some(quiver));
        assert_eq!(world.obj(bag).carrying, 15);
        world.increase_nrof(quiver, 2);
        assert_eq!(world.obj(bag).carrying, 20);

        assert_eq!(world.decrease_nrof(quiver, 100).unwrap(), None);
        assert_eq!(world.obj(bag).carrying, 0);
        assert!(world.obj(bag).links.inv.is_none());
    }

    #[derive(Default)]
    struct Changes(RefCell<Vec<(ObjectId, ItemUpdate)>>);

    impl WorldHooks for Changes {
        fn item_changed(&self, _w: &mut World, _pl: ObjectId, op: ObjectId, what: ItemUpdate) {
            self.0.borrow_mut().push((op, what));
        }
    }

    #[test]
    fn test_quantity_change_notifies_carrier() {
        let mut world = World::with_seed(12);
        let seen = Rc::new(Changes::default());
        world.set_hooks(seen.clone());
        let pl = world.object_new();
        world.obj_mut(pl).type_ = ObjectType::Player;
        world.register_player(pl);
        let quiver = arrows(&mut world, 3);
        world.insert_in_container(quiver, pl).unwrap();

        world.increase_nrof(quiver, 1);
        world.decrease_nrof(quiver, 2).unwrap();
        assert_eq!(
            *seen.0.borrow(),
            vec![(quiver, ItemUpdate::Quantity), (quiver, ItemUpdate::Quantity)]
        );
    }

    #[test]
    fn test_map_quantity_change_refreshes_look() {
        let mut world = World::with_seed(12);
        let map = world.add_map(TileMap::new("m", 3, 3));
        let pl = world.object_new();
        world.obj_mut(pl).type_ = ObjectType::Player;
        world.register_player(pl);
        world.insert_in_map_at(pl, map, None, InsertFlags::empty(), 2, 2).unwrap();
        let quiver = arrows(&mut world, 3);
        world.insert_in_map_at(quiver, map, None, InsertFlags::empty(), 2, 2).unwrap();
        world.obj_mut(pl).player.as_mut().unwrap().update_look = false;

        world.decrease_nrof(quiver, 1).unwrap();
        assert!(world.obj(pl).player.as_ref().unwrap().update_look);
    }
}
