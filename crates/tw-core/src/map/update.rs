//! Tile aggregates and blocking tests (map.c)

use bitflags::bitflags;
use strum::Display;

use super::{MapId, MapState, TileFlags};
use crate::object::{Archetype, Flag, MoveType, ObjectId, ObjectType};
use crate::world::{ItemUpdate, World};

/// Why [`World::object_update`] is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UpdateAction {
    /// Object was put on the tile
    Insert,
    /// An object left the tile; the argument is any object still there
    Remove,
    /// Only the look changed
    Face,
    /// Something that may affect the tile changed
    Change,
}

bitflags! {
    /// Reasons an object cannot be placed
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Blocked: u16 {
        const NO_PASS = 0x04;
        const IS_ALIVE = 0x10;
        const OUT_OF_MAP = 0x100;
    }
}

impl World {
    pub fn out_of_map(&self, map: MapId, x: i32, y: i32) -> bool {
        self.map(map).out_of_map(x, y)
    }

    /// True if `id` currently sits in the stack at (map, x, y)
    pub(crate) fn on_tile(&self, id: ObjectId, map: MapId, x: i32, y: i32) -> bool {
        let ob = self.obj(id);
        !ob.is_freed()
            && !ob.is_removed()
            && ob.links.env.is_none()
            && ob.links.map == Some(map)
            && ob.x == x
            && ob.y == y
    }

    /// Objects at (x, y), bottom first
    pub fn tile_objects(&self, map: MapId, x: i32, y: i32) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let Some(tile) = self.map(map).get(x, y) else {
            return out;
        };
        let mut cur = tile.bottom;
        while let Some(c) = cur {
            out.push(c);
            cur = self.obj(c).links.above;
        }
        out
    }

    /// Tile flags, recomputed first if they are stale. Outside the map only
    /// `OUT_OF_MAP` is set.
    pub fn get_map_flags(&mut self, map: MapId, x: i32, y: i32) -> TileFlags {
        let Some(tile) = self.map(map).get(x, y) else {
            return TileFlags::OUT_OF_MAP;
        };
        if tile.flags.contains(TileFlags::NEED_UPDATE) {
            self.update_position(map, x, y);
        }
        self.map(map).tile(x, y).flags
    }

    /// Recompute the aggregate values of a tile from its stack.
    pub fn update_position(&mut self, map: MapId, x: i32, y: i32) {
        let old = self.map(map).tile(x, y).flags;
        if !old.contains(TileFlags::NEED_UPDATE) {
            log::debug!(
                "update_position called with NEED_UPDATE not set: {} ({x}, {y})",
                self.map(map).name
            );
            return;
        }

        let mut flags = TileFlags::empty();
        let mut light: i8 = 0;
        let mut player = None;
        let (mut block, mut slow, mut on, mut off, mut allow) = (
            MoveType::empty(),
            MoveType::empty(),
            MoveType::empty(),
            MoveType::empty(),
            MoveType::empty(),
        );
        for id in self.tile_objects(map, x, y) {
            let ob = self.obj(id);
            if ob.has(Flag::Wiz) && ob.player.as_ref().is_some_and(|p| p.hidden) {
                continue;
            }
            if ob.type_ == ObjectType::Player {
                player = Some(id);
            }
            light = light.max(ob.glow_radius);

            slow |= ob.move_slow;
            block |= ob.move_block;
            on |= ob.move_on;
            off |= ob.move_off;
            allow |= ob.move_allow;

            if ob.has(Flag::Alive) {
                flags |= TileFlags::IS_ALIVE;
            }
            if ob.has(Flag::NoMagic) {
                flags |= TileFlags::NO_MAGIC;
            }
            if ob.has(Flag::Damned) {
                flags |= TileFlags::NO_CLERIC;
            }
            if ob.has(Flag::BlocksView) {
                flags |= TileFlags::BLOCKSVIEW;
            }
        }
        if player.is_some() {
            flags |= TileFlags::PLAYER;
        }

        let stale = old - (TileFlags::NEED_UPDATE | TileFlags::NO_ERROR);
        if stale != flags && !old.contains(TileFlags::NO_ERROR) {
            log::debug!(
                "update_position: updated flags do not match old flags: {} (x={x},y={y}) {:?} != {:?}",
                self.map(map).name,
                stale,
                flags
            );
        }

        let tile = self.map_mut(map).tile_mut(x, y);
        tile.flags = flags;
        tile.move_block = block & !allow;
        tile.move_allow = allow;
        tile.move_on = on;
        tile.move_off = off;
        tile.move_slow = slow;
        tile.light = light;
        tile.player = player;
    }

    /// Bring the tile of `op` up to date after `action`, recomputing the
    /// aggregates right away only when the change can affect them. Every
    /// part of a multi-part object is handled.
    pub fn object_update(&mut self, op: ObjectId, action: UpdateAction) {
        let mut part = Some(op);
        while let Some(p) = part {
            self.update_one(p, action);
            part = self.obj(p).links.more;
        }
    }

    fn update_one(&mut self, op: ObjectId, action: UpdateAction) {
        let ob = self.obj(op);
        if ob.links.env.is_some() {
            return;
        }
        let Some(map) = ob.links.map else {
            return;
        };
        if self.map(map).state == MapState::Saving {
            return;
        }
        let (x, y) = (ob.x, ob.y);
        if self.map(map).out_of_map(x, y) {
            log::error!("object_update() called for object out of map!");
            return;
        }

        let tile = self.map(map).tile(x, y);
        let flags = tile.flags;
        let update_now = match action {
            UpdateAction::Insert => {
                (ob.has(Flag::BlocksView) && !flags.contains(TileFlags::BLOCKSVIEW))
                    || (ob.has(Flag::NoMagic) && !flags.contains(TileFlags::NO_MAGIC))
                    || (ob.has(Flag::Damned) && !flags.contains(TileFlags::NO_CLERIC))
                    || (ob.has(Flag::Alive) && !flags.contains(TileFlags::IS_ALIVE))
                    || (tile.move_on | ob.move_on) != tile.move_on
                    || (tile.move_off | ob.move_off) != tile.move_off
                    || ((tile.move_block | ob.move_block) & !ob.move_allow) != tile.move_block
                    || (tile.move_slow | ob.move_slow) != tile.move_slow
                    || ob.type_ == ObjectType::Player
            }
            UpdateAction::Remove | UpdateAction::Change => true,
            UpdateAction::Face => false,
        };

        let face_to = match action {
            UpdateAction::Face | UpdateAction::Change
                if flags.contains(TileFlags::PLAYER)
                    && !ob.has(Flag::ClientAnimSync)
                    && !ob.has(Flag::ClientAnimRandom) =>
            {
                tile.player.filter(|&pl| {
                    !self
                        .obj(pl)
                        .player
                        .as_ref()
                        .is_some_and(|p| p.update_look)
                })
            }
            _ => None,
        };

        self.map_mut(map).tile_mut(x, y).flags |= TileFlags::NEED_UPDATE;
        if let Some(pl) = face_to {
            let hooks = self.hooks();
            hooks.item_changed(self, pl, op, ItemUpdate::Face);
        }
        if update_now {
            self.map_mut(map).tile_mut(x, y).flags |= TileFlags::NO_ERROR | TileFlags::NEED_UPDATE;
            self.update_position(map, x, y);
        }
    }

    /// Whether `ob` (all its parts) could stand with its head at (x, y).
    ///
    /// Without an object only the tile's blocking is considered.
    pub fn ob_blocked(&mut self, ob: Option<ObjectId>, map: MapId, x: i32, y: i32) -> Blocked {
        let Some(ob) = ob else {
            if self.map(map).out_of_map(x, y) {
                return Blocked::OUT_OF_MAP;
            }
            return if self.map(map).move_block(x, y).is_empty() {
                Blocked::empty()
            } else {
                Blocked::NO_PASS
            };
        };

        let offsets: Vec<(i32, i32)> = match self.obj(ob).arch.as_ref() {
            Some(arch) => Archetype::parts(arch)
                .map(|a| (a.clone.x, a.clone.y))
                .collect(),
            None => vec![(0, 0)],
        };
        let (move_type, type_) = (self.obj(ob).move_type, self.obj(ob).type_);
        let mut part = Some(ob);
        for (dx, dy) in offsets {
            let (sx, sy) = (x + dx, y + dy);
            let flags = self.get_map_flags(map, sx, sy);
            if flags.contains(TileFlags::OUT_OF_MAP) {
                return Blocked::OUT_OF_MAP;
            }
            if flags.contains(TileFlags::IS_ALIVE) {
                return Blocked::IS_ALIVE;
            }

            let block = self.map(map).move_block(sx, sy);
            let part_type = part.map(|p| self.obj(p).move_type).unwrap_or(move_type);
            part = part.and_then(|p| self.obj(p).links.more);

            if move_type.is_empty() && block != MoveType::ALL {
                continue;
            }
            if type_ == ObjectType::Transport && part_type.is_empty() {
                continue;
            }
            if move_type.blocked_by(block) {
                return Blocked::NO_PASS;
            }
        }
        Blocked::empty()
    }

    /// True if something other than `ob` itself keeps it from moving onto
    /// (x, y). Parts of the same object never block each other.
    pub fn blocked_link(&mut self, ob: ObjectId, map: MapId, x: i32, y: i32) -> bool {
        if self.map(map).out_of_map(x, y) {
            log::error!("blocked_link: Passed map, x, y coordinates outside of map");
            return true;
        }
        let o = self.obj(ob);
        if o.type_ == ObjectType::Transport && o.move_type.is_empty() {
            return false;
        }

        let flags = self.get_map_flags(map, x, y);
        let block = self.map(map).move_block(x, y);
        let alive = flags.contains(TileFlags::IS_ALIVE);
        let o = self.obj(ob);
        if o.type_ != ObjectType::Player && !alive && block.is_empty() {
            return false;
        }
        if !alive && !o.move_type.blocked_by(block) {
            return false;
        }

        let head = self.head_of(ob);
        let move_type = self.obj(head).move_type;
        for tmp in self.tile_objects(map, x, y) {
            if self.head_of(tmp) == head {
                continue;
            }
            let t = self.obj(tmp);
            if (move_type & t.move_block) == move_type {
                return true;
            }
            if t.has(Flag::Alive)
                && t.type_ != ObjectType::Door
                && !(t.has(Flag::Wiz) && t.player.as_ref().is_some_and(|p| p.hidden))
            {
                return true;
            }
        }
        false
    }
}
