//! Structural self-check
//!
//! Walks every chain the engine maintains and reports the first link that
//! does not agree with its counterpart. Meant for tests and soak runs; it
//! visits every object and tile.

use hashbrown::HashSet;
use thiserror::Error;

use super::World;
use crate::map::MapId;
use crate::object::ObjectId;

/// First inconsistency found by [`World::check_integrity`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("used chain broken at {id:?}")]
    UsedChain { id: ObjectId },

    #[error("free chain holds live object {id:?}")]
    FreeChain { id: ObjectId },

    #[error("active chain broken at {id:?}")]
    ActiveChain { id: ObjectId },

    #[error("{id:?} has speed {speed} but active membership is {active}")]
    ActiveMembership { id: ObjectId, speed: f32, active: bool },

    #[error("tile ({x}, {y}) of {map:?} is inconsistent at {id:?}")]
    TileStack { map: MapId, x: i32, y: i32, id: ObjectId },

    #[error("tile ({x}, {y}) of {map:?} has a stale top")]
    TileTop { map: MapId, x: i32, y: i32 },

    #[error("inventory of {container:?} is inconsistent at {id:?}")]
    Inventory { container: ObjectId, id: ObjectId },

    #[error("part chain broken at {id:?}")]
    PartChain { id: ObjectId },

    #[error("placed object {id:?} is on no tile and in no inventory")]
    Unreachable { id: ObjectId },

    #[error("object {id:?} appears in more than one place")]
    Duplicate { id: ObjectId },
}

impl World {
    /// Verify the used, free and active chains, every tile stack, every
    /// inventory and every part chain.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        self.check_used_chain()?;
        self.check_free_chain()?;
        self.check_active_chain()?;

        let mut placed = HashSet::new();
        for (index, map) in self.maps.iter().enumerate() {
            let map_id = MapId(index as u32);
            for y in 0..map.height {
                for x in 0..map.width {
                    self.check_tile(map_id, x, y, &mut placed)?;
                }
            }
        }
        for id in self.objects.used() {
            self.check_inventory(id, &mut placed)?;
            self.check_parts(id)?;
        }
        for id in self.objects.used() {
            if !self.obj(id).is_removed() && !placed.contains(&id) {
                return Err(IntegrityError::Unreachable { id });
            }
        }
        Ok(())
    }

    fn check_used_chain(&self) -> Result<(), IntegrityError> {
        let mut prev = None;
        for id in self.objects.used() {
            let ob = self.obj(id);
            if ob.is_freed() || ob.links.prev != prev {
                return Err(IntegrityError::UsedChain { id });
            }
            prev = Some(id);
        }
        Ok(())
    }

    fn check_free_chain(&self) -> Result<(), IntegrityError> {
        let mut cur = self.objects.free_head();
        let mut seen = 0;
        while let Some(id) = cur {
            if !self.obj(id).is_freed() || seen > self.objects.capacity() {
                return Err(IntegrityError::FreeChain { id });
            }
            seen += 1;
            cur = self.obj(id).links.next;
        }
        Ok(())
    }

    fn check_active_chain(&self) -> Result<(), IntegrityError> {
        let mut prev = None;
        let mut members = HashSet::new();
        for id in self.objects.active() {
            let ob = self.obj(id);
            if ob.is_freed() || ob.links.active_prev != prev || !members.insert(id) {
                return Err(IntegrityError::ActiveChain { id });
            }
            prev = Some(id);
        }
        let min_speed = self.settings.min_active_speed;
        for id in self.objects.used() {
            let speed = self.obj(id).speed;
            let active = members.contains(&id);
            if active != (speed.abs() > min_speed) {
                return Err(IntegrityError::ActiveMembership { id, speed, active });
            }
        }
        Ok(())
    }

    fn check_tile(&self, map: MapId, x: i32, y: i32, placed: &mut HashSet<ObjectId>) -> Result<(), IntegrityError> {
        let tile = self.map(map).tile(x, y);
        let mut below = None;
        let mut cur = tile.bottom;
        while let Some(id) = cur {
            let ob = self.obj(id);
            let on_tile = !ob.is_freed()
                && !ob.is_removed()
                && ob.links.env.is_none()
                && ob.links.map == Some(map)
                && (ob.x, ob.y) == (x, y);
            if !on_tile || ob.links.below != below {
                return Err(IntegrityError::TileStack { map, x, y, id });
            }
            if !placed.insert(id) {
                return Err(IntegrityError::Duplicate { id });
            }
            below = Some(id);
            cur = ob.links.above;
        }
        if tile.top != below {
            return Err(IntegrityError::TileTop { map, x, y });
        }
        Ok(())
    }

    fn check_inventory(&self, container: ObjectId, placed: &mut HashSet<ObjectId>) -> Result<(), IntegrityError> {
        let mut above = None;
        let mut cur = self.obj(container).links.inv;
        while let Some(id) = cur {
            let ob = self.obj(id);
            let inside = !ob.is_freed()
                && !ob.is_removed()
                && ob.links.env == Some(container)
                && ob.links.map.is_none();
            if !inside || ob.links.above != above {
                return Err(IntegrityError::Inventory { container, id });
            }
            if !placed.insert(id) {
                return Err(IntegrityError::Duplicate { id });
            }
            above = Some(id);
            cur = ob.links.below;
        }
        Ok(())
    }

    fn check_parts(&self, id: ObjectId) -> Result<(), IntegrityError> {
        let ob = self.obj(id);
        let head = ob.links.head.unwrap_or(id);
        if let Some(h) = ob.links.head
            && (self.obj(h).is_freed() || self.obj(h).links.head.is_some())
        {
            return Err(IntegrityError::PartChain { id });
        }
        if let Some(more) = ob.links.more {
            let m = self.obj(more);
            if m.is_freed() || m.links.head != Some(head) {
                return Err(IntegrityError::PartChain { id: more });
            }
        }
        Ok(())
    }
}
