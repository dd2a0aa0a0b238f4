//! Walk-on triggers and terrain slowdown

use super::flags::{Flag, MoveType};
use super::obj::{ObjectId, ObjectType, TerrainSkills};
use crate::world::World;

impl World {
    /// Run the effects of the tile `op` stands on: terrain slows it down and
    /// traps or buttons fire, checked from the top of the stack down.
    ///
    /// Returns true if `op` was destroyed. Scanning stops early when a
    /// trigger moves `op` elsewhere.
    pub fn check_move_on(&mut self, op: ObjectId, originator: Option<ObjectId>) -> bool {
        let ob = self.obj(op);
        if ob.has(Flag::NoApply) {
            return false;
        }
        let Some(map) = ob.links.map else {
            return false;
        };
        let (x, y, tag) = (ob.x, ob.y, ob.count);
        if self.map(map).out_of_map(x, y) {
            return false;
        }
        self.get_map_flags(map, x, y);

        let tile = self.map(map).tile(x, y);
        let (move_on, move_slow, move_block) = (tile.move_on, tile.move_slow, tile.move_block);
        let mt = self.obj(op).move_type;
        if !mt.is_empty() && !mt.intersects(move_on) && !mt.intersects(move_slow) {
            return false;
        }
        // it can dodge both with a movement type the tile lets through
        if !(mt & !move_on & !move_block).is_empty() && !(mt & !move_slow & !move_block).is_empty() {
            return false;
        }

        // start below the run of flying spell effects at the top
        let mut start = self.map(map).tile(x, y).bottom;
        while let Some(t) = start {
            let ob = self.obj(t);
            if ob.links.above.is_none()
                || (ob.move_type.contains(MoveType::FLY_LOW) && ob.has(Flag::NoPick))
            {
                break;
            }
            start = ob.links.above;
        }

        let hooks = self.hooks();
        let mut cur = start;
        while let Some(tmp) = cur {
            cur = self.obj(tmp).links.below;
            if tmp == op {
                continue;
            }

            let (o, t) = (self.obj(op), self.obj(tmp));
            if !o.has(Flag::WizPass) && o.move_type.affected_by(t.move_slow, t.move_block) {
                let mut diff = t.move_slow_penalty * o.speed.abs();
                if o.type_ == ObjectType::Player {
                    let skills = o.player.as_ref().map(|p| p.skills).unwrap_or_default();
                    if (t.has(Flag::IsHilly) && skills.contains(TerrainSkills::CLIMBING))
                        || (t.has(Flag::IsWooded) && skills.contains(TerrainSkills::WOODSMAN))
                    {
                        diff /= 2.0;
                    }
                }
                self.obj_mut(op).speed_left -= diff;
            }

            let (o, t) = (self.obj(op), self.obj(tmp));
            if o.move_type.affected_by(t.move_on, t.move_block) {
                hooks.move_on(self, tmp, op, originator);
                if !self.is_valid(op, tag) {
                    return true;
                }
                if !self.on_tile(op, map, x, y) {
                    return false;
                }
                if let Some(next) = cur
                    && !self.on_tile(next, map, x, y)
                {
                    log::debug!("check_move_on: stack at ({x},{y}) changed under a trigger");
                    return false;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::map::TileMap;
    use crate::object::{FreeFlags, InsertFlags};
    use crate::world::WorldHooks;

    /// Records triggers; a trigger named "pit" frees its victim, one named
    /// "teleporter" moves it one tile east.
    #[derive(Default)]
    struct Traps(RefCell<Vec<ObjectId>>);

    impl WorldHooks for Traps {
        fn move_on(&self, world: &mut World, trigger: ObjectId, victim: ObjectId, _o: Option<ObjectId>) {
            self.0.borrow_mut().push(trigger);
            match world.obj(trigger).display_name() {
                "pit" => {
                    world.remove(victim).unwrap();
                    world.free(victim, FreeFlags::empty()).unwrap();
                }
                "teleporter" => {
                    let (map, x, y) = {
                        let v = world.obj(victim);
                        (v.links.map.unwrap(), v.x, v.y)
                    };
                    world.remove(victim).unwrap();
                    world
                        .insert_in_map_at(victim, map, None, InsertFlags::NO_WALK_ON, x + 1, y)
                        .unwrap();
                }
                _ => {}
            }
        }
    }

    fn trap(world: &mut World, name: &str, on: MoveType) -> ObjectId {
        let id = world.object_new();
        let name = world.strings.intern(name);
        let ob = world.obj_mut(id);
        ob.name = Some(name);
        ob.move_on = on;
        id
    }

    fn setup() -> (World, Rc<Traps>, crate::map::MapId) {
        let mut world = World::with_seed(13);
        let traps = Rc::new(Traps::default());
        world.set_hooks(traps.clone());
        let map = world.add_map(TileMap::new("dungeon", 4, 4));
        (world, traps, map)
    }

    #[test]
    fn test_triggers_fire_top_down() {
        let (mut world, traps, map) = setup();
        let low = trap(&mut world, "plate", MoveType::WALK);
        let high = trap(&mut world, "bell", MoveType::WALK);
        world.insert_in_map_at(low, map, None, InsertFlags::NO_WALK_ON, 1, 1).unwrap();
        world.insert_in_map_at(high, map, None, InsertFlags::NO_WALK_ON, 1, 1).unwrap();

        let hero = world.object_new();
        world.obj_mut(hero).move_type = MoveType::WALK;
        world.insert_in_map_at(hero, map, None, InsertFlags::empty(), 1, 1).unwrap();
        assert_eq!(*traps.0.borrow(), vec![high, low]);
    }

    #[test]
    fn test_flyer_avoids_walk_trigger() {
        let (mut world, traps, map) = setup();
        let plate = trap(&mut world, "plate", MoveType::WALK);
        world.insert_in_map_at(plate, map, None, InsertFlags::NO_WALK_ON, 1, 1).unwrap();
        let bat = world.object_new();
        world.obj_mut(bat).move_type = MoveType::FLY_LOW;
        world.insert_in_map_at(bat, map, None, InsertFlags::empty(), 1, 1).unwrap();
        assert!(traps.0.borrow().is_empty());
    }

    #[test]
    fn test_destroyed_by_trigger() {
        let (mut world, traps, map) = setup();
        let plate = trap(&mut world, "plate", MoveType::WALK);
        let pit = trap(&mut world, "pit", MoveType::WALK);
        world.insert_in_map_at(plate, map, None, InsertFlags::NO_WALK_ON, 2, 2).unwrap();
        world.insert_in_map_at(pit, map, None, InsertFlags::NO_WALK_ON, 2, 2).unwrap();

        let hero = world.object_new();
        world.obj_mut(hero).move_type = MoveType::WALK;
        let got = world.insert_in_map_at(hero, map, None, InsertFlags::empty(), 2, 2).unwrap();
        assert_eq!(got, None);
        // the plate below the pit never fires
        assert_eq!(*traps.0.borrow(), vec![pit]);
        assert_eq!(world.tile_objects(map, 2, 2), vec![plate, pit]);
    }

    #[test]
    fn test_moved_by_trigger_stops_scan() {
        let (mut world, traps, map) = setup();
        let plate = trap(&mut world, "plate", MoveType::WALK);
        let tele = trap(&mut world, "teleporter", MoveType::WALK);
        world.insert_in_map_at(plate, map, None, InsertFlags::NO_WALK_ON, 0, 0).unwrap();
        world.insert_in_map_at(tele, map, None, InsertFlags::NO_WALK_ON, 0, 0).unwrap();

        let hero = world.object_new();
        world.obj_mut(hero).move_type = MoveType::WALK;
        let got = world.insert_in_map_at(hero, map, None, InsertFlags::empty(), 0, 0).unwrap();
        assert_eq!(got, Some(hero));
        assert_eq!(*traps.0.borrow(), vec![tele]);
        assert_eq!((world.obj(hero).x, world.obj(hero).y), (1, 0));
    }

    #[test]
    fn test_slow_terrain() {
        let (mut world, _traps, map) = setup();
        let swamp = world.object_new();
        world.obj_mut(swamp).move_slow = MoveType::WALK;
        world.obj_mut(swamp).move_slow_penalty = 0.5;
        world.obj_mut(swamp).set_flag(Flag::IsWooded);
        world.insert_in_map_at(swamp, map, None, InsertFlags::empty(), 3, 3).unwrap();

        let hero = world.object_new();
        world.obj_mut(hero).move_type = MoveType::WALK;
        world.obj_mut(hero).speed = 1.0;
        world.obj_mut(hero).speed_left = 1.0;
        world.insert_in_map_at(hero, map, None, InsertFlags::empty(), 3, 3).unwrap();
        assert!((world.obj(hero).speed_left - 0.5).abs() < 1e-6);

        let ranger = world.object_new();
        world.obj_mut(ranger).type_ = ObjectType::Player;
        world.register_player(ranger);
        world.obj_mut(ranger).player.as_mut().unwrap().skills = TerrainSkills::WOODSMAN;
        world.obj_mut(ranger).move_type = MoveType::WALK;
        world.obj_mut(ranger).speed = 1.0;
        world.obj_mut(ranger).speed_left = 1.0;
        world.insert_in_map_at(ranger, map, None, InsertFlags::empty(), 3, 3).unwrap();
        assert!((world.obj(ranger).speed_left - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_no_apply_skips() {
        let (mut world, traps, map) = setup();
        let plate = trap(&mut world, "plate", MoveType::WALK);
        world.insert_in_map_at(plate, map, None, InsertFlags::NO_WALK_ON, 1, 2).unwrap();
        let ghost = world.object_new();
        world.obj_mut(ghost).set_flag(Flag::NoApply);
        world.insert_in_map_at(ghost, map, None, InsertFlags::empty(), 1, 2).unwrap();
        assert!(traps.0.borrow().is_empty());
    }
}
