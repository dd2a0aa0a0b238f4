//! Removal from maps and inventories

use super::flags::Flag;
use super::obj::ObjectId;
use crate::map::{TileFlags, UpdateAction};
use crate::world::{ObjectError, Result, World};

impl World {
    /// Take `op` (and all its parts) out of the map stack or inventory it
    /// is in.
    ///
    /// The object keeps its last map and coordinates, so the caller can put
    /// it back down or drop it nearby. Objects on the tile get their
    /// walk-off triggers run; a player watching the inventory is told.
    pub fn remove(&mut self, op: ObjectId) -> Result<()> {
        if self.obj(op).is_removed() {
            return Err(self.violation(ObjectError::AlreadyRemoved { id: op }, Some(op)));
        }
        if let Some(more) = self.obj(op).links.more {
            self.remove(more)?;
        }
        self.obj_mut(op).set_flag(Flag::Removed);

        if let Some(env) = self.obj(op).links.env {
            self.remove_from_inventory(op, env);
            return Ok(());
        }

        let Some(map) = self.obj(op).links.map else {
            return Ok(());
        };
        self.remove_from_map(op, map)
    }

    fn remove_from_inventory(&mut self, op: ObjectId, env: ObjectId) {
        let weight = self.carried_weight(op);
        self.sub_weight(env, weight);

        let watcher = self.inventory_watcher(env, op);

        let (above, below) = {
            let l = &self.obj(op).links;
            (l.above, l.below)
        };
        match above {
            Some(a) => self.obj_mut(a).links.below = below,
            None => self.obj_mut(env).links.inv = below,
        }
        if let Some(b) = below {
            self.obj_mut(b).links.above = above;
        }

        let (x, y, map) = {
            let e = self.obj(env);
            (e.x, e.y, e.links.map)
        };
        {
            let ob = self.obj_mut(op);
            ob.x = x;
            ob.y = y;
            ob.ox = x;
            ob.oy = y;
            ob.links.map = map;
            ob.links.above = None;
            ob.links.below = None;
        }

        let hooks = self.hooks();
        let visible = {
            let ob = self.obj(op);
            ob.invisible == 0 && !ob.is_player()
        };
        if let Some(pl) = watcher
            && visible
        {
            hooks.item_removed(self, pl, op);
        }
        self.obj_mut(op).links.env = None;

        if let Some(pl) = self.player_container(env) {
            let p = self.obj(pl);
            if p.is_controlled() && !p.has(Flag::NoFixPlayer) {
                hooks.fix_player(self, pl);
            }
        }
    }

    fn remove_from_map(&mut self, op: ObjectId, map: crate::map::MapId) -> Result<()> {
        let (x, y) = (self.obj(op).x, self.obj(op).y);
        if self.map(map).out_of_map(x, y) {
            return Err(self.violation(ObjectError::OutOfMap { map, x, y }, Some(op)));
        }

        if self.obj(op).player.as_ref().is_some_and(|p| !p.hidden) {
            self.map_mut(map).players -= 1;
        }

        let (above, below) = {
            let l = &self.obj(op).links;
            (l.above, l.below)
        };
        match above {
            Some(a) => self.obj_mut(a).links.below = below,
            None => self.map_mut(map).tile_mut(x, y).top = below,
        }
        match below {
            Some(b) => self.obj_mut(b).links.above = above,
            None => {
                if self.map(map).tile(x, y).bottom != Some(op) {
                    log::error!(
                        "remove: bottom of {} ({x},{y}) is not the object being removed\n{}",
                        self.map(map).name,
                        self.object_dump(Some(op))
                    );
                }
                self.map_mut(map).tile_mut(x, y).bottom = above;
            }
        }
        {
            let l = &mut self.obj_mut(op).links;
            l.above = None;
            l.below = None;
        }

        if self.map(map).is_saving() {
            return Ok(());
        }

        let tag = self.obj(op).count;
        let check_walk_off = !self.obj(op).has(Flag::NoApply);
        let hooks = self.hooks();
        let mut last = None;
        let mut cur = self.map(map).tile(x, y).bottom;
        while let Some(tmp) = cur {
            cur = self.obj(tmp).links.above;

            if self.obj(tmp).is_player() && tmp != op {
                if self.obj(tmp).links.container == Some(op) {
                    self.obj_mut(op).clear_flag(Flag::Applied);
                    self.obj_mut(tmp).links.container = None;
                }
                if let Some(p) = self.obj_mut(tmp).player.as_mut() {
                    p.update_look = true;
                }
            }

            let (mt, off, block) = {
                let (o, t) = (self.obj(op), self.obj(tmp));
                (o.move_type, t.move_off, t.move_block)
            };
            if check_walk_off && mt.intersects(off) && (mt & !off & !block).is_empty() {
                hooks.move_on(self, tmp, op, None);
                if !self.is_valid(op, tag) {
                    log::error!("remove: {:?} destroyed leaving object {:?}", op, tmp);
                }
                if let Some(next) = cur
                    && !self.on_tile(next, map, x, y)
                {
                    log::debug!("remove: stack at ({x},{y}) changed under a walk-off trigger");
                    cur = None;
                }
                if !self.on_tile(tmp, map, x, y) {
                    continue;
                }
            }
            last = Some(tmp);
        }

        match last {
            None => {
                self.map_mut(map).tile_mut(x, y).flags = TileFlags::NEED_UPDATE;
                self.update_position(map, x, y);
            }
            Some(last) => self.object_update(last, UpdateAction::Remove),
        }

        let ob = self.obj(op);
        if ob.has(Flag::BlocksView) || ob.glow_radius != 0 {
            hooks.update_all_los(self, map, x, y);
        }
        Ok(())
    }
}
