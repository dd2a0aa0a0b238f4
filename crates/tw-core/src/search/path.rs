//! Greedy chase
//!
//! Walks toward the target one tile at a time, side-stepping up to
//! [`DETOUR_AMOUNT`] turns when the straight step is blocked. Hunters can
//! follow a player around a corner into a side corridor but do not solve
//! mazes.

use super::direction::absdir;
use crate::consts::{DETOUR_AMOUNT, FREEARR_X, FREEARR_Y, MAX_SPACES};
use crate::map::TileFlags;
use crate::object::{MoveType, ObjectId};
use crate::world::World;

impl World {
    /// First step `mon` should take toward `target`, or 0 when there is no
    /// path within the step budget or the two are closer than `mindiff`.
    pub fn path_to_player(&mut self, mon: ObjectId, target: ObjectId, mindiff: i32) -> i32 {
        let Some(rv) = self.get_rangevector(mon, target, false) else {
            return 0;
        };
        if rv.distance < mindiff {
            return 0;
        }
        let Some(map) = self.obj(mon).links.map else {
            return 0;
        };
        let mon_move = self.obj(mon).move_type;

        let (mut x, mut y) = (self.obj(mon).x, self.obj(mon).y);
        let mut dir = rv.direction;
        let mut lastdir = dir;
        // direction of the first step actually taken
        let mut first: Option<i32> = None;
        let mut diff = rv.distance_x.abs().max(rv.distance_y.abs());
        let mut max = MAX_SPACES;
        if diff > max {
            return 0;
        }

        while diff > 1 && max > 0 {
            let (lastx, lasty) = (x, y);
            x = lastx + FREEARR_X[dir as usize];
            y = lasty + FREEARR_Y[dir as usize];

            let flags = self.get_map_flags(map, x, y);
            let obstructed = if flags.contains(TileFlags::OUT_OF_MAP) {
                true
            } else {
                let block = self.map(map).move_block(x, y);
                (mon_move.blocked_by(block) || flags.contains(TileFlags::IS_ALIVE))
                    && self.blocked_link(mon, map, x, y)
            };

            if obstructed {
                let redirect = self
                    .get_rangevector_from_mapcoord(map, lastx, lasty, target)
                    .map(|rv| rv.direction)
                    .filter(|&d| d != dir);
                if let Some(d) = redirect {
                    // aim again from the last good tile
                    x = lastx;
                    y = lasty;
                    dir = d;
                } else {
                    let Some(step) = self.side_step(mon, mon_move, lastx, lasty, lastdir) else {
                        return 0;
                    };
                    (x, y) = (lastx + FREEARR_X[step as usize], lasty + FREEARR_Y[step as usize]);
                    diff -= 1;
                    max -= 1;
                    lastdir = dir;
                    first.get_or_insert(step);
                }
            } else {
                diff -= 1;
                max -= 1;
                lastdir = dir;
                first.get_or_insert(dir);
            }

            if diff <= 1 {
                // the walk may have drifted off the straight line
                let Some(rv) = self.get_rangevector_from_mapcoord(map, x, y, target) else {
                    return 0;
                };
                diff = rv.distance_x.abs().max(rv.distance_y.abs());
            }
            if diff > max {
                return 0;
            }
        }
        if max == 0 {
            return 0;
        }
        first.unwrap_or(rv.direction)
    }

    /// Direction within [`DETOUR_AMOUNT`] turns of `lastdir` that `mon` can
    /// step into from (x, y).
    fn side_step(&mut self, mon: ObjectId, mon_move: MoveType, x: i32, y: i32, lastdir: i32) -> Option<i32> {
        let map = self.obj(mon).links.map?;
        for i in -DETOUR_AMOUNT..=DETOUR_AMOUNT {
            if i == 0 {
                continue;
            }
            let d = absdir(lastdir + i);
            let (nx, ny) = (x + FREEARR_X[d as usize], y + FREEARR_Y[d as usize]);
            let flags = self.get_map_flags(map, nx, ny);
            if flags.contains(TileFlags::OUT_OF_MAP) || flags.contains(TileFlags::IS_ALIVE) {
                continue;
            }
            if mon_move.blocked_by(self.map(map).move_block(nx, ny)) {
                continue;
            }
            if !self.blocked_link(mon, map, nx, ny) {
                return Some(d);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::map::{MapId, TileMap};
    use crate::object::{InsertFlags, MoveType, ObjectId};
    use crate::world::World;

    fn put(world: &mut World, map: MapId, x: i32, y: i32, move_type: MoveType, block: MoveType) -> ObjectId {
        let id = world.object_new();
        world.obj_mut(id).move_type = move_type;
        world.obj_mut(id).move_block = block;
        world.insert_in_map_at(id, map, None, InsertFlags::empty(), x, y).unwrap();
        id
    }

    fn arena() -> (World, MapId) {
        let mut world = World::with_seed(61);
        let map = world.add_map(TileMap::new("arena", 9, 9));
        (world, map)
    }

    #[test]
    fn test_straight_line() {
        let (mut world, map) = arena();
        let mon = put(&mut world, map, 1, 1, MoveType::WALK, MoveType::empty());
        let pl = put(&mut world, map, 6, 1, MoveType::WALK, MoveType::empty());
        assert_eq!(world.path_to_player(mon, pl, 0), 3);
        // already adjacent
        let near = put(&mut world, map, 2, 2, MoveType::WALK, MoveType::empty());
        assert_eq!(world.path_to_player(mon, near, 0), 4);
    }

    #[test]
    fn test_mindiff_and_other_map() {
        let (mut world, map) = arena();
        let other = world.add_map(TileMap::new("elsewhere", 9, 9));
        let mon = put(&mut world, map, 1, 1, MoveType::WALK, MoveType::empty());
        let pl = put(&mut world, map, 4, 1, MoveType::WALK, MoveType::empty());
        assert_eq!(world.path_to_player(mon, pl, 4), 0);
        let away = put(&mut world, other, 4, 1, MoveType::WALK, MoveType::empty());
        assert_eq!(world.path_to_player(mon, away, 0), 0);
    }

    #[test]
    fn test_detour_around_wall() {
        let (mut world, map) = arena();
        let mon = put(&mut world, map, 1, 4, MoveType::WALK, MoveType::empty());
        let pl = put(&mut world, map, 7, 4, MoveType::WALK, MoveType::empty());
        put(&mut world, map, 2, 4, MoveType::empty(), MoveType::ALL);
        // the straight step east is walled, the first side step goes north
        assert_eq!(world.path_to_player(mon, pl, 0), 1);
    }

    #[test]
    fn test_enclosed() {
        let (mut world, map) = arena();
        let mon = put(&mut world, map, 4, 4, MoveType::WALK, MoveType::empty());
        let pl = put(&mut world, map, 8, 4, MoveType::WALK, MoveType::empty());
        for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0)] {
            put(&mut world, map, 4 + dx, 4 + dy, MoveType::empty(), MoveType::ALL);
        }
        assert_eq!(world.path_to_player(mon, pl, 0), 0);
    }
}
