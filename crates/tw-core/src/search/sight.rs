//! Line of sight over the ring table

use crate::consts::{FREEARR_X, FREEARR_Y, REDUCTION_DIR, SIZEOFFREE};
use crate::map::{MapId, TileFlags};
use crate::world::World;

impl World {
    /// Whether the ring entry `dir` is visible from (x, y).
    ///
    /// Adjacent entries only need to be on the map and not block view.
    /// Farther ones also need a visible entry one step closer.
    pub fn can_see_monster(&mut self, map: MapId, x: i32, y: i32, dir: i32) -> bool {
        let Ok(idx) = usize::try_from(dir) else {
            return false;
        };
        if idx >= SIZEOFFREE {
            return false;
        }
        let flags = self.get_map_flags(map, x + FREEARR_X[idx], y + FREEARR_Y[idx]);
        if flags.intersects(TileFlags::OUT_OF_MAP | TileFlags::BLOCKSVIEW) {
            return false;
        }
        if idx < 9 {
            return true;
        }
        REDUCTION_DIR[idx]
            .iter()
            .any(|&closer| self.can_see_monster(map, x, y, closer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileMap;
    use crate::object::{Flag, InsertFlags};

    fn blocker(world: &mut World, map: MapId, x: i32, y: i32) {
        let w = world.object_new();
        world.obj_mut(w).set_flag(Flag::BlocksView);
        world.insert_in_map_at(w, map, None, InsertFlags::empty(), x, y).unwrap();
    }

    #[test]
    fn test_adjacent_and_far() {
        let mut world = World::with_seed(41);
        let map = world.add_map(TileMap::new("hall", 7, 7));
        assert!(world.can_see_monster(map, 3, 3, 1));
        assert!(world.can_see_monster(map, 3, 3, 9));
        assert!(world.can_see_monster(map, 3, 3, 25));
        assert!(!world.can_see_monster(map, 3, 3, -1));
        assert!(!world.can_see_monster(map, 0, 0, 1));
    }

    #[test]
    fn test_blocked_view() {
        let mut world = World::with_seed(41);
        let map = world.add_map(TileMap::new("hall", 7, 7));
        // index 10 is (1, -2); it is seen through index 1 or 2
        blocker(&mut world, map, 3, 2);
        assert!(world.can_see_monster(map, 3, 3, 10));
        blocker(&mut world, map, 4, 2);
        assert!(!world.can_see_monster(map, 3, 3, 10));
        assert!(!world.can_see_monster(map, 3, 3, 1));
    }
}
