//! Maps and tiles (map.h)
//!
//! A map is a rectangle of tiles. Each tile records the bottom and top of
//! its object stack and aggregate values recomputed from that stack.

mod update;

pub use update::{Blocked, UpdateAction};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::object::{MoveType, ObjectId};

/// Index of a map in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u32);

/// Lifecycle state of a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum MapState {
    Loading,
    #[default]
    InMemory,
    /// Bulk save in progress: per-object bookkeeping is skipped
    Saving,
}

bitflags! {
    /// Aggregate tile flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TileFlags: u16 {
        const BLOCKSVIEW = 0x01;
        const NO_MAGIC = 0x02;
        const PLAYER = 0x08;
        const IS_ALIVE = 0x10;
        const NO_CLERIC = 0x20;
        const NEED_UPDATE = 0x40;
        const NO_ERROR = 0x80;
        const OUT_OF_MAP = 0x100;
    }
}

/// One map square
#[derive(Debug, Clone, Default)]
pub struct Tile {
    /// Bottom of the stack
    pub bottom: Option<ObjectId>,
    /// Top of the stack
    pub top: Option<ObjectId>,
    pub flags: TileFlags,
    pub move_block: MoveType,
    pub move_allow: MoveType,
    pub move_on: MoveType,
    pub move_off: MoveType,
    pub move_slow: MoveType,
    pub light: i8,
    /// Topmost player on the tile, if any
    pub player: Option<ObjectId>,
}

/// A loaded map
#[derive(Debug, Clone)]
pub struct TileMap {
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Zero means fully lit; lighting changes only matter on dark maps
    pub darkness: u8,
    pub state: MapState,
    /// Visible players on the map
    pub players: i32,
    tiles: Vec<Tile>,
}

impl TileMap {
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            name: name.into(),
            width,
            height,
            darkness: 0,
            state: MapState::InMemory,
            players: 0,
            tiles: vec![Tile::default(); (width * height) as usize],
        }
    }

    #[inline]
    pub fn out_of_map(&self, x: i32, y: i32) -> bool {
        x < 0 || y < 0 || x >= self.width || y >= self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Tile at (x, y). Callers check bounds first.
    pub fn tile(&self, x: i32, y: i32) -> &Tile {
        &self.tiles[self.index(x, y)]
    }

    pub fn tile_mut(&mut self, x: i32, y: i32) -> &mut Tile {
        let idx = self.index(x, y);
        &mut self.tiles[idx]
    }

    /// Tile at (x, y) or `None` outside the map
    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.out_of_map(x, y) {
            None
        } else {
            Some(self.tile(x, y))
        }
    }

    /// Movement blocked on a tile; everything is blocked outside the map.
    pub fn move_block(&self, x: i32, y: i32) -> MoveType {
        self.get(x, y).map(|t| t.move_block).unwrap_or(MoveType::ALL)
    }

    pub fn is_saving(&self) -> bool {
        self.state == MapState::Saving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let map = TileMap::new("test", 5, 4);
        assert!(!map.out_of_map(0, 0));
        assert!(!map.out_of_map(4, 3));
        assert!(map.out_of_map(5, 0));
        assert!(map.out_of_map(0, 4));
        assert!(map.out_of_map(-1, 2));
    }

    #[test]
    fn test_tiles_start_empty() {
        let map = TileMap::new("test", 3, 3);
        let tile = map.tile(1, 1);
        assert!(tile.bottom.is_none() && tile.top.is_none());
        assert!(tile.flags.is_empty());
        assert_eq!(map.move_block(-1, 0), MoveType::ALL);
    }
}
