//! Free spots for multi-tile objects
//!
//! Both searches assume rectangular footprints and return where the head
//! of the object should go.

use crate::object::ObjectId;
use crate::world::World;

/// Extension field holding a generator's spawn radius
const GENERATOR_RADIUS: &str = "generator_radius";

impl World {
    /// Random head position that puts `ob` right next to `spawner`, found by
    /// walking the ring of positions that touch `spawner`'s footprint.
    pub fn find_multi_free_spot_around(&mut self, ob: ObjectId, spawner: ObjectId) -> Option<(i32, i32)> {
        let ob = self.head_of(ob);
        let map = self.obj(spawner).links.map?;
        let s = self.get_multi_size(ob);
        let g = self.get_multi_size(spawner);

        let (mut sx, mut sy) = (s.sx + 1, s.sy + 1);
        let ix = self.obj(spawner).x - sx - g.hx;
        let iy = self.obj(spawner).y - sy - g.hy;
        sx += g.sx + 1 + s.hx;
        sy += g.sy + 1 + s.hy;

        let mut free = Vec::new();
        for i in 0..(2 * sx + 2 * sy) {
            let (nx, ny) = if i <= sx {
                (ix + i, iy)
            } else if i <= sx + sy {
                (ix + sx, iy + i - sx)
            } else if i <= 2 * sx + sy {
                (ix + sx - (i - (sx + sy)), iy + sy)
            } else {
                (ix, iy + sy - (i - (2 * sx + sy)))
            };
            if self.ob_blocked(Some(ob), map, nx, ny).is_empty() {
                free.push((nx, ny));
            }
        }
        self.rng.choose(&free).copied()
    }

    /// Random head position for `ob` anywhere within the spawn radius of
    /// `spawner`. The radius comes from the `generator_radius` field and is at
    /// least 1.
    pub fn find_multi_free_spot_within_radius(&mut self, ob: ObjectId, spawner: ObjectId) -> Option<(i32, i32)> {
        let radius = self
            .get_value(spawner, GENERATOR_RADIUS)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(1)
            .max(1);

        let ob = self.head_of(ob);
        let map = self.obj(spawner).links.map?;
        let s = self.get_multi_size(ob);
        let g = self.get_multi_size(spawner);

        let (mut sx, mut sy) = (s.sx + 1, s.sy + 1);
        let ix = self.obj(spawner).x - sx - g.hx - radius + 1;
        let iy = self.obj(spawner).y - sy - g.hy - radius + 1;
        sx += g.sx + 1 + s.hx + radius * 2 - 1;
        sy += g.sy + 1 + s.hy + radius * 2 - 1;

        let mut free = Vec::new();
        for x in 0..sx {
            for y in 0..sy {
                let (nx, ny) = (ix + x, iy + y);
                if self.out_of_map(map, nx, ny) {
                    continue;
                }
                if self.ob_blocked(Some(ob), map, nx, ny).is_empty() {
                    free.push((nx, ny));
                }
            }
        }
        self.rng.choose(&free).copied()
    }
}
