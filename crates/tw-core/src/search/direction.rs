//! Compass math
//!
//! Directions are numbered 1..=8 clockwise from north, 0 meaning "here".

use serde::{Deserialize, Serialize};

use crate::map::MapId;
use crate::object::ObjectId;
use crate::world::World;

/// Squared distance between two positions
pub const fn distance_squared(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    (x1 - x2) * (x1 - x2) + (y1 - y2) * (y1 - y2)
}

/// Direction pointing from offset (x, y) back to the origin (find_dir_2 equivalent)
pub const fn find_dir_2(x: i32, y: i32) -> i32 {
    let q = if y == 0 { -300 * x } else { x * 100 / y };
    if y > 0 {
        if q < -242 {
            3
        } else if q < -41 {
            2
        } else if q < 41 {
            1
        } else if q < 242 {
            8
        } else {
            7
        }
    } else if q < -242 {
        7
    } else if q < -41 {
        6
    } else if q < 41 {
        5
    } else if q < 242 {
        4
    } else {
        3
    }
}

/// Fold any direction into 1..=8
pub const fn absdir(d: i32) -> i32 {
    (d - 1).rem_euclid(8) + 1
}

/// Number of 45 degree turns between two absolute directions (0..=4)
pub const fn dirdiff(dir1: i32, dir2: i32) -> i32 {
    let d = (dir1 - dir2).abs();
    if d > 4 { 8 - d } else { d }
}

/// How to get from one position to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeVector {
    /// Rounded-down euclidean distance
    pub distance: i32,
    pub distance_x: i32,
    pub distance_y: i32,
    /// First step to take, 0 if already there
    pub direction: i32,
    /// Part of the mover closest to the target
    pub part: Option<ObjectId>,
}

impl RangeVector {
    fn between(dx: i32, dy: i32, part: Option<ObjectId>) -> Self {
        Self {
            distance: (dx * dx + dy * dy).isqrt(),
            distance_x: dx,
            distance_y: dy,
            direction: if dx == 0 && dy == 0 { 0 } else { find_dir_2(-dx, -dy) },
            part,
        }
    }
}

impl World {
    /// Squared distance between two objects
    pub fn distance(&self, a: ObjectId, b: ObjectId) -> i32 {
        let (a, b) = (self.obj(a), self.obj(b));
        distance_squared(a.x, a.y, b.x, b.y)
    }

    /// Vector from `from` to `to`, or `None` when they are not on the same map.
    ///
    /// Unless `head_only` is set, a multi-part `from` is measured from its
    /// part closest to `to`.
    pub fn get_rangevector(&self, from: ObjectId, to: ObjectId, head_only: bool) -> Option<RangeVector> {
        let (f, t) = (self.obj(from), self.obj(to));
        if f.links.map.is_none() || f.links.map != t.links.map {
            return None;
        }
        let (mut dx, mut dy) = (t.x - f.x, t.y - f.y);

        let mut best = from;
        if !head_only && f.links.more.is_some() {
            let mut best_distance = dx * dx + dy * dy;
            let mut cur = f.links.more;
            while let Some(part) = cur {
                let p = self.obj(part);
                let (px, py) = (f.x - p.x + dx, f.y - p.y + dy);
                if px * px + py * py < best_distance {
                    best_distance = px * px + py * py;
                    best = part;
                }
                cur = p.links.more;
            }
            if best != from {
                let b = self.obj(best);
                dx += f.x - b.x;
                dy += f.y - b.y;
            }
        }
        Some(RangeVector::between(dx, dy, Some(best)))
    }

    /// Vector from a map position to `to`
    pub fn get_rangevector_from_mapcoord(&self, map: MapId, x: i32, y: i32, to: ObjectId) -> Option<RangeVector> {
        let t = self.obj(to);
        if t.links.map != Some(map) {
            return None;
        }
        Some(RangeVector::between(t.x - x, t.y - y, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FREEARR_X, FREEARR_Y, FREEDIR, SIZEOFFREE};

    #[test]
    fn test_find_dir_2_matches_ring_table() {
        for i in 1..SIZEOFFREE {
            let (x, y) = (FREEARR_X[i], FREEARR_Y[i]);
            if x.abs() == y.abs() || x == 0 || y == 0 {
                // find_dir_2 takes the delta pointing back at the origin
                assert_eq!(find_dir_2(-x, -y), FREEDIR[i], "index {i}");
            }
        }
    }

    #[test]
    fn test_absdir() {
        assert_eq!(absdir(0), 8);
        assert_eq!(absdir(9), 1);
        assert_eq!(absdir(-1), 7);
        assert_eq!(absdir(17), 1);
        assert_eq!(absdir(3), 3);
    }

    #[test]
    fn test_dirdiff() {
        assert_eq!(dirdiff(1, 1), 0);
        assert_eq!(dirdiff(1, 5), 4);
        assert_eq!(dirdiff(1, 8), 1);
        assert_eq!(dirdiff(2, 7), 3);
    }

    #[test]
    fn test_rangevector_same_map_only() {
        let mut world = World::with_seed(21);
        let m1 = world.add_map(crate::map::TileMap::new("a", 9, 9));
        let m2 = world.add_map(crate::map::TileMap::new("b", 9, 9));
        let a = world.object_new();
        let b = world.object_new();
        world.insert_in_map_at(a, m1, None, crate::object::InsertFlags::empty(), 1, 1).unwrap();
        world.insert_in_map_at(b, m1, None, crate::object::InsertFlags::empty(), 4, 5).unwrap();

        let rv = world.get_rangevector(a, b, false).unwrap();
        assert_eq!((rv.distance_x, rv.distance_y, rv.distance), (3, 4, 5));
        assert_eq!(rv.direction, 4);
        assert_eq!(rv.part, Some(a));
        assert_eq!(world.distance(a, b), 25);

        let rv = world.get_rangevector_from_mapcoord(m1, 4, 1, b).unwrap();
        assert_eq!(rv.direction, 5);
        let rv = world.get_rangevector_from_mapcoord(m1, 4, 5, b).unwrap();
        assert_eq!((rv.distance, rv.direction), (0, 0));
        assert!(world.get_rangevector_from_mapcoord(m2, 4, 1, b).is_none());
    }
}
