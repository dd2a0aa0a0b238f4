//! Map placement

use super::archetype::Archetype;
use super::flags::{Flag, FreeFlags, InsertFlags, MoveType};
use super::obj::{ObjectId, ObjectType};
use crate::consts::{FREEARR_X, FREEARR_Y};
use crate::map::{MapId, UpdateAction};
use crate::world::{ObjectError, Result, World};

impl World {
    /// Put the removed object `op` on `map` at its own coordinates.
    ///
    /// Extra parts are placed first, each at its own coordinates. Stackable
    /// objects absorb matching objects already on the tile; qualifying spell
    /// effects merge with their siblings. Afterwards the move-on triggers of
    /// the tile run unless `NO_WALK_ON` is given.
    ///
    /// Returns `Ok(None)` when `op` was destroyed by a trigger.
    pub fn insert_in_map(
        &mut self,
        op: ObjectId,
        map: MapId,
        originator: Option<ObjectId>,
        flags: InsertFlags,
    ) -> Result<Option<ObjectId>> {
        if self.obj(op).is_freed() {
            log::error!("Trying to insert freed object!");
            return Err(self.violation(ObjectError::AlreadyFreed { id: op }, Some(op)));
        }
        if self.try_map(map).is_none() {
            log::error!("Trying to insert in null-map!\n{}", self.object_dump(Some(op)));
            return Err(ObjectError::NoSuchMap { map });
        }
        let (x, y) = (self.obj(op).x, self.obj(op).y);
        if self.map(map).out_of_map(x, y) {
            log::error!("Trying to insert object outside the map.");
            return Err(self.violation(ObjectError::OutOfMap { map, x, y }, Some(op)));
        }
        if !self.obj(op).is_removed() {
            log::error!("Trying to insert (map) inserted object.");
            return Err(self.violation(ObjectError::NotRemoved { id: op }, Some(op)));
        }

        // a player in a transport is not on the map itself
        let originator = originator.map(|o| {
            self.obj(o)
                .player
                .as_ref()
                .and_then(|p| p.transport)
                .unwrap_or(o)
        });
        let below = if flags.contains(InsertFlags::BELOW_ORIGINATOR) {
            match originator.filter(|&o| self.on_tile(o, map, x, y)) {
                Some(o) => Some(o),
                None => {
                    log::error!("insert_in_map called with BELOW_ORIGINATOR when originator not on same space!");
                    let originator = originator.unwrap_or(op);
                    return Err(self.violation(
                        ObjectError::BelowOriginatorMismatch { id: op, originator },
                        Some(op),
                    ));
                }
            }
        } else {
            None
        };

        if let Some(more) = self.obj(op).links.more {
            let more_map = *self.obj_mut(more).links.map.get_or_insert(map);
            if self.insert_in_map(more, more_map, originator, flags)?.is_none() {
                if self.obj(op).links.head.is_none() {
                    log::error!("BUG: insert_in_map(): inserting op->more killed op");
                }
                return Ok(None);
            }
        }

        {
            let ob = self.obj_mut(op);
            ob.clear_flag(Flag::Removed);
            ob.ox = x;
            ob.oy = y;
            ob.links.map = Some(map);
        }

        let (nrof, type_) = (self.obj(op).nrof, self.obj(op).type_);
        if nrof > 0 && !flags.contains(InsertFlags::NO_MERGE) && type_ != ObjectType::SpellEffect {
            for tmp in self.tile_objects(map, x, y) {
                if !self.on_tile(tmp, map, x, y) || !self.can_merge(op, tmp) {
                    continue;
                }
                let add = self.obj(tmp).nrof;
                self.obj_mut(op).nrof += add;
                self.remove(tmp)?;
                self.free(tmp, FreeFlags::FREE_INVENTORY | FreeFlags::NO_DESTROY_CALLBACK)?;
            }
        } else if type_ == ObjectType::SpellEffect {
            let ob = self.obj(op);
            if ob.range == 0 && ob.other_arch.is_none() && ob.speed_left + ob.speed < 0.0 {
                self.merge_spell(op, x, y)?;
            }
        }

        {
            let ob = self.obj_mut(op);
            // lamps keep their lit state in the applied flag
            if ob.type_ != ObjectType::Lamp {
                ob.clear_flag(Flag::Applied);
            }
            ob.clear_flag(Flag::InvLocked);
            if !ob.has(Flag::Alive) {
                ob.clear_flag(Flag::NoSteal);
            }
        }

        let floor = match below.filter(|&o| self.on_tile(o, map, x, y)) {
            Some(orig) => {
                self.link_below(op, orig, map, x, y);
                None
            }
            None => self.link_in_stack(op, map, x, y, flags),
        };

        if let Some(p) = self.obj_mut(op).player.as_mut() {
            p.do_los = true;
        }

        if !flags.contains(InsertFlags::MAP_LOAD) {
            let mut cur = floor.or(self.map(map).tile(x, y).bottom);
            while let Some(c) = cur {
                let ob = self.obj_mut(c);
                if ob.type_ == ObjectType::Player
                    && let Some(p) = ob.player.as_mut()
                {
                    p.update_look = true;
                }
                cur = ob.links.above;
            }
        }

        let hooks = self.hooks();
        if self.map(map).darkness != 0 && self.obj(op).glow_radius != 0 {
            hooks.update_all_los(self, map, x, y);
        }

        self.object_update(op, UpdateAction::Insert);

        if self.obj(op).player.as_ref().is_some_and(|p| !p.hidden) {
            self.map_mut(map).players += 1;
        }

        if !flags.contains(InsertFlags::NO_WALK_ON) && self.obj(op).links.head.is_none() {
            if self.check_move_on(op, originator) {
                return Ok(None);
            }
            let mut part = self.obj(op).links.more;
            while let Some(p) = part {
                if self.check_move_on(p, originator) {
                    return Ok(None);
                }
                part = self.obj(p).links.more;
            }
        }
        Ok(Some(op))
    }

    fn link_below(&mut self, op: ObjectId, orig: ObjectId, map: MapId, x: i32, y: i32) {
        let below = self.obj(orig).links.below;
        {
            let l = &mut self.obj_mut(op).links;
            l.above = Some(orig);
            l.below = below;
        }
        match below {
            Some(b) => self.obj_mut(b).links.above = Some(op),
            None => self.map_mut(map).tile_mut(x, y).bottom = Some(op),
        }
        self.obj_mut(orig).links.below = Some(op);
    }

    /// Link `op` into the stack at (x, y) and return the last floor seen.
    ///
    /// The new object normally goes above everything except a run of flying
    /// unpickable objects (spell effects) at the top.
    fn link_in_stack(
        &mut self,
        op: ObjectId,
        map: MapId,
        x: i32,
        y: i32,
        flags: InsertFlags,
    ) -> Option<ObjectId> {
        let mut floor = None;
        let mut last = None;
        let mut cur = self.map(map).tile(x, y).bottom;
        while let Some(tmp) = cur {
            let t = self.obj(tmp);
            if t.has(Flag::IsFloor) || t.has(Flag::OverlayFloor) {
                floor = Some(tmp);
            }
            if t.has(Flag::NoPick) && t.move_type.intersects(MoveType::FLYING) && !t.has(Flag::IsFloor)
            {
                break;
            }
            last = Some(tmp);
            cur = t.links.above;
        }

        let mut top = last;
        if flags.intersects(InsertFlags::MAP_LOAD | InsertFlags::ON_TOP) {
            top = self.map(map).tile(x, y).top;
        }
        if flags.contains(InsertFlags::ABOVE_FLOOR_ONLY) {
            top = floor;
        }

        let above = match top {
            None => {
                let above = self.map(map).tile(x, y).bottom;
                self.map_mut(map).tile_mut(x, y).bottom = Some(op);
                above
            }
            Some(t) => {
                let above = self.obj(t).links.above;
                self.obj_mut(t).links.above = Some(op);
                above
            }
        };
        {
            let l = &mut self.obj_mut(op).links;
            l.above = above;
            l.below = top;
        }
        match above {
            Some(a) => self.obj_mut(a).links.below = Some(op),
            None => self.map_mut(map).tile_mut(x, y).top = Some(op),
        }
        floor
    }

    /// Place `op` with its head at (x, y), laying out the other parts by
    /// their archetype offsets.
    pub fn insert_in_map_at(
        &mut self,
        op: ObjectId,
        map: MapId,
        originator: Option<ObjectId>,
        flags: InsertFlags,
        x: i32,
        y: i32,
    ) -> Result<Option<ObjectId>> {
        let op = self.head_of(op);
        let (hx, hy) = (self.obj(op).x, self.obj(op).y);
        for part in self.parts(op) {
            let ob = self.obj_mut(part);
            let (dx, dy) = match ob.arch.as_ref() {
                Some(arch) => (arch.clone.x, arch.clone.y),
                None if part == op => (0, 0),
                None => (ob.x - hx, ob.y - hy),
            };
            ob.x = x + dx;
            ob.y = y + dy;
            ob.links.map = Some(map);
        }
        self.insert_in_map(op, map, originator, flags)
    }

    /// Replace every object of archetype `arch_name` on the tile of `op` by
    /// a fresh one, inserted right below `op`.
    pub fn replace_insert_in_map(&mut self, arch_name: &str, op: ObjectId) -> Result<ObjectId> {
        let Some(map) = self.obj(op).links.map else {
            return Err(self.violation(ObjectError::NotOnMap { id: op }, Some(op)));
        };
        let (x, y) = (self.obj(op).x, self.obj(op).y);
        for tmp in self.tile_objects(map, x, y) {
            if !self.on_tile(tmp, map, x, y) {
                continue;
            }
            let same = self.obj(tmp).arch.as_ref().is_some_and(|a| a.name.as_str() == arch_name);
            if same {
                self.remove(tmp)?;
                self.free_drop_inventory(tmp)?;
            }
        }

        let Some(arch) = self.archetypes.find(arch_name) else {
            log::error!("replace_insert_in_map: no archetype {arch_name}");
            return Err(ObjectError::UnknownArchetype {
                name: arch_name.to_string(),
            });
        };
        let fresh = self.arch_to_object(&arch);
        self.insert_in_map_at(fresh, map, Some(op), InsertFlags::BELOW_ORIGINATOR, x, y)?;
        Ok(fresh)
    }

    /// Put `op` on a free spot around (x, y), searching ring indices
    /// `start..stop`. If there is none, `op` is freed.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_to_free_spot_or_free(
        &mut self,
        op: ObjectId,
        map: MapId,
        x: i32,
        y: i32,
        start: usize,
        stop: usize,
        originator: Option<ObjectId>,
    ) -> Result<Option<ObjectId>> {
        match self.find_free_spot(Some(op), map, x, y, start, stop) {
            Some(i) => self.insert_in_map_at(
                op,
                map,
                originator,
                InsertFlags::empty(),
                x + FREEARR_X[i],
                y + FREEARR_Y[i],
            ),
            None => {
                self.free_drop_inventory(op)?;
                Ok(None)
            }
        }
    }

    /// Create and place the missing parts of `op`, a single object on a map
    /// whose archetype has several parts.
    pub fn fix_multipart(&mut self, op: ObjectId) -> Result<()> {
        let Some(map) = self.obj(op).links.map else {
            log::error!("fix_multipart: not on a map!");
            return Err(ObjectError::NotOnMap { id: op });
        };
        let ob = self.obj(op);
        if ob.links.head.is_some() || ob.links.more.is_some() {
            return Ok(());
        }
        let Some(first) = ob.arch.as_ref().and_then(|a| a.more.clone()) else {
            return Ok(());
        };
        let (x, y) = (ob.x, ob.y);
        let (name, title) = (ob.name.clone(), ob.title.clone());

        let mut last = op;
        for at in Archetype::parts(&first) {
            let part = self.arch_to_object(&at);
            {
                let p = self.obj_mut(part);
                p.x += x;
                p.y += y;
                p.links.head = Some(op);
                p.links.map = Some(map);
                p.name = name.clone();
                p.title = title.clone();
            }
            self.obj_mut(last).links.more = Some(part);
            self.insert_in_map(
                part,
                map,
                Some(op),
                InsertFlags::NO_MERGE | InsertFlags::ABOVE_FLOOR_ONLY | InsertFlags::NO_WALK_ON,
            )?;
            last = part;
        }
        Ok(())
    }
}
