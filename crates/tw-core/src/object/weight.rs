//! Carried weight
//!
//! `carrying` holds the weight of everything inside an object. Containers
//! reduce the weight of their contents by `stats.str` percent. Every
//! insert, removal and quantity change adjusts the totals of the enclosing
//! objects incrementally; [`World::sum_weight`] recomputes a tree.

use super::obj::{ObjectId, ObjectType};
use crate::world::World;

/// Weight `w` as seen from outside a container with reduction `str`
#[inline]
fn reduced(w: i64, str: i8) -> i64 {
    w * (100 - i64::from(str)) / 100
}

impl World {
    /// Recompute `carrying` for `op` and everything inside it. Returns the
    /// new total.
    pub fn sum_weight(&mut self, op: ObjectId) -> i64 {
        let mut sum: i64 = 0;
        for item in self.inventory(op) {
            if self.obj(item).links.inv.is_some() {
                self.sum_weight(item);
            }
            let it = self.obj(item);
            sum += i64::from(it.carrying) + i64::from(it.weight) * i64::from(it.quantity());
        }
        let ob = self.obj(op);
        if ob.type_ == ObjectType::Container && ob.stats.str != 0 {
            sum = reduced(sum, ob.stats.str);
        }
        self.obj_mut(op).carrying = sum as i32;
        sum
    }

    /// Add `weight` to `op` and every object enclosing it.
    pub fn add_weight(&mut self, op: ObjectId, weight: i64) {
        let mut cur = Some(op);
        let mut weight = weight;
        while let Some(c) = cur {
            let ob = self.obj_mut(c);
            if ob.type_ == ObjectType::Container {
                weight = reduced(weight, ob.stats.str);
            }
            ob.carrying = (i64::from(ob.carrying) + weight) as i32;
            cur = ob.links.env;
        }
    }

    /// Subtract `weight` from `op` and every object enclosing it.
    pub fn sub_weight(&mut self, op: ObjectId, weight: i64) {
        let mut cur = Some(op);
        let mut weight = weight;
        while let Some(c) = cur {
            let ob = self.obj_mut(c);
            if ob.type_ == ObjectType::Container {
                weight = reduced(weight, ob.stats.str);
            }
            ob.carrying = (i64::from(ob.carrying) - weight) as i32;
            cur = ob.links.env;
        }
    }

    /// Weight `op` adds to whatever holds it, before container reduction
    pub(crate) fn carried_weight(&self, op: ObjectId) -> i64 {
        let ob = self.obj(op);
        if ob.nrof > 0 {
            i64::from(ob.weight) * i64::from(ob.nrof)
        } else {
            i64::from(ob.weight) + i64::from(ob.carrying)
        }
    }

    /// Outermost object enclosing `op`, or `op` itself
    pub fn env_recursive(&self, op: ObjectId) -> ObjectId {
        let mut cur = op;
        while let Some(env) = self.obj(cur).links.env {
            if env == cur {
                break;
            }
            cur = env;
        }
        cur
    }

    /// First player found walking out from `op` through its environments
    pub fn player_container(&self, op: ObjectId) -> Option<ObjectId> {
        let mut cur = Some(op);
        while let Some(c) = cur {
            let ob = self.obj(c);
            if ob.type_ == ObjectType::Player {
                return Some(c);
            }
            cur = ob.links.env.filter(|&e| e != c);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(world: &mut World, weight: i32, nrof: u32) -> ObjectId {
        let id = world.object_new();
        let ob = world.obj_mut(id);
        ob.weight = weight;
        ob.nrof = nrof;
        id
    }

    #[test]
    fn test_sum_weight_reduction() {
        let mut world = World::with_seed(9);
        let sack = item(&mut world, 100, 0);
        world.obj_mut(sack).type_ = ObjectType::Container;
        world.obj_mut(sack).stats.str = 40;
        for (w, n) in [(8, 0), (7, 0), (6, 10)] {
            let it = item(&mut world, w, n);
            world.insert_in_container(it, sack).unwrap();
        }
        assert_eq!(world.sum_weight(sack), (6 * 10 + 7 + 8) * 60 / 100);
        assert_eq!(world.obj(sack).carrying, 45);
    }

    #[test]
    fn test_nested_weight_propagates() {
        let mut world = World::with_seed(9);
        let pack = item(&mut world, 10, 0);
        let pouch = item(&mut world, 2, 0);
        world.obj_mut(pouch).type_ = ObjectType::Container;
        world.obj_mut(pouch).stats.str = 50;
        world.insert_in_container(pouch, pack).unwrap();
        let gems = item(&mut world, 4, 5);
        world.insert_in_container(gems, pouch).unwrap();

        assert_eq!(world.obj(pouch).carrying, 10);
        assert_eq!(world.obj(pack).carrying, 12);
        world.sum_weight(pack);
        assert_eq!(world.obj(pack).carrying, 12);

        world.remove(gems).unwrap();
        assert_eq!(world.obj(pouch).carrying, 0);
        assert_eq!(world.obj(pack).carrying, 2);
    }

    #[test]
    fn test_env_and_player_container() {
        let mut world = World::with_seed(9);
        let pl = world.object_new();
        world.obj_mut(pl).type_ = ObjectType::Player;
        let bag = world.object_new();
        let ring = world.object_new();
        world.insert_in_container(bag, pl).unwrap();
        world.insert_in_container(ring, bag).unwrap();
        assert_eq!(world.env_recursive(ring), pl);
        assert_eq!(world.player_container(ring), Some(pl));
        assert_eq!(world.player_container(bag), Some(pl));
        let loose = world.object_new();
        assert_eq!(world.env_recursive(loose), loose);
        assert_eq!(world.player_container(loose), None);
    }
}
