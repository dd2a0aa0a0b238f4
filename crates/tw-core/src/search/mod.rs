//! Spatial search (free spots, nearby creatures, reach)
//!
//! Searches walk the ring tables in [`crate::consts`]: index 0 is the
//! center, 1..=8 the adjacent tiles, 9..=24 the second ring and 25..=48 the
//! third.

mod direction;
mod multi;
mod path;
mod sight;

pub use direction::{RangeVector, absdir, dirdiff, distance_squared, find_dir_2};

use serde::{Deserialize, Serialize};

use crate::consts::{FREEARR_X, FREEARR_Y, FREEDIR, MAXFREE, SIZEOFFREE, SIZEOFFREE1, SIZEOFFREE2};
use crate::map::{Blocked, MapId, TileFlags};
use crate::object::{Archetype, Flag, MoveType, ObjectId, ObjectType};
use crate::world::World;

/// Footprint of a multi-part object relative to its head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiSize {
    /// Offset of the rightmost part
    pub sx: i32,
    /// Offset of the lowest part
    pub sy: i32,
    /// Columns of parts left of the head
    pub hx: i32,
    /// Rows of parts above the head
    pub hy: i32,
}

impl World {
    /// Pick a random ring index in `start..stop` where `ob` fits around (x, y).
    ///
    /// A tile that blocks passage cuts the search down to the rings that lie
    /// before it. The cut applies in every direction, so open tiles on the
    /// far side of the origin can be missed.
    pub fn find_free_spot(
        &mut self,
        ob: Option<ObjectId>,
        map: MapId,
        x: i32,
        y: i32,
        start: usize,
        stop: usize,
    ) -> Option<usize> {
        let mut stop = stop.min(self.settings.max_search_ring).min(SIZEOFFREE);
        let mut altern = Vec::with_capacity(SIZEOFFREE);
        let mut i = start;
        while i < stop {
            let flag = self.ob_blocked(ob, map, x + FREEARR_X[i], y + FREEARR_Y[i]);
            if flag.is_empty() {
                altern.push(i);
            } else if flag.contains(Blocked::NO_PASS) && MAXFREE[i] < stop {
                stop = MAXFREE[i];
            }
            i += 1;
        }
        self.rng.choose(&altern).copied()
    }

    /// First ring index where `ob` fits around (x, y), searching every ring.
    pub fn find_first_free_spot(&mut self, ob: Option<ObjectId>, map: MapId, x: i32, y: i32) -> Option<usize> {
        (0..SIZEOFFREE).find(|&i| {
            self.ob_blocked(ob, map, x + FREEARR_X[i], y + FREEARR_Y[i])
                .is_empty()
        })
    }

    /// All ring indices, each ring shuffled on its own so nearer tiles still
    /// come first.
    pub fn get_search_arr(&mut self) -> [usize; SIZEOFFREE] {
        let mut arr: [usize; SIZEOFFREE] = std::array::from_fn(|i| i);
        self.rng.permute(&mut arr, 1, SIZEOFFREE1 + 1);
        self.rng.permute(&mut arr, SIZEOFFREE1 + 1, SIZEOFFREE2 + 1);
        self.rng.permute(&mut arr, SIZEOFFREE2 + 1, SIZEOFFREE);
        arr
    }

    /// Direction of the nearest monster or player around (x, y), 0 if none.
    ///
    /// `exclude` is the creature doing the looking: it is skipped and its
    /// movement type decides which tiles cut the search short.
    pub fn map_find_dir(&mut self, map: MapId, x: i32, y: i32, exclude: Option<ObjectId>) -> i32 {
        let exclude = exclude.map(|e| self.head_of(e));
        let move_type = exclude.map_or(MoveType::ALL, |e| self.obj(e).move_type);

        let mut max = SIZEOFFREE;
        let mut i = 1;
        while i < max {
            let (nx, ny) = (x + FREEARR_X[i], y + FREEARR_Y[i]);
            let flags = self.get_map_flags(map, nx, ny);
            if flags.contains(TileFlags::OUT_OF_MAP) {
                max = MAXFREE[i];
            } else if (move_type & self.map(map).move_block(nx, ny)) == move_type {
                max = MAXFREE[i];
            } else if flags.contains(TileFlags::IS_ALIVE) {
                let found = self.tile_objects(map, nx, ny).into_iter().any(|tmp| {
                    let t = self.obj(tmp);
                    (t.has(Flag::Monster) || t.type_ == ObjectType::Player)
                        && Some(self.head_of(tmp)) != exclude
                });
                if found {
                    return FREEDIR[i];
                }
            }
            i += 1;
        }
        0
    }

    /// Whether `who` could pick up `item`. Creatures other than players
    /// are held to their carrying capacity.
    pub fn can_pick(&self, who: ObjectId, item: ObjectId) -> bool {
        let (w, it) = (self.obj(who), self.obj(item));
        if it.weight <= 0 || it.has(Flag::NoPick) || it.has(Flag::Alive) || it.invisible != 0 {
            return false;
        }
        if w.type_ != ObjectType::Player {
            let strength = w.stats.str.clamp(0, self.settings.max_stat);
            let total = i64::from(w.weight) + i64::from(w.carrying) + i64::from(it.weight);
            if total > i64::from(self.hooks().weight_limit(strength)) {
                return false;
            }
        }
        it.links.head.is_none() && it.links.more.is_none()
    }

    /// Footprint of the object `op` belongs to, from its archetype.
    pub fn get_multi_size(&self, op: ObjectId) -> MultiSize {
        let head = self.obj(self.head_of(op));
        let (mut maxx, mut maxy, mut minx, mut miny) = (0, 0, 0, 0);
        if let Some(arch) = head.arch.as_ref()
            && arch.is_multipart()
        {
            for part in Archetype::parts(arch) {
                maxx = maxx.max(part.clone.x);
                maxy = maxy.max(part.clone.y);
                minx = minx.min(part.clone.x);
                miny = miny.min(part.clone.y);
            }
        }
        MultiSize {
            sx: maxx,
            sy: maxy,
            hx: -minx,
            hy: -miny,
        }
    }
}
