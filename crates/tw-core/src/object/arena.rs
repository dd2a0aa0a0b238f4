//! Object pool
//!
//! Records live in one growable vector and are addressed by [`ObjectId`].
//! Unused records are chained into a free list through `links.next`; records
//! in use form the used chain (`next`/`prev`); records with speed form the
//! active chain (`active_next`/`active_prev`). The pool grows by whole
//! batches and never shrinks.

use super::flags::Flag;
use super::obj::{Object, ObjectId, Tag};

/// Pool of object records
#[derive(Debug)]
pub struct ObjectArena {
    slots: Vec<Object>,
    free_head: Option<ObjectId>,
    used_head: Option<ObjectId>,
    active_head: Option<ObjectId>,
    next_tag: u32,
    nroffree: usize,
    nrofalloc: usize,
    batch: usize,
    /// Scrub released records and never hand them out again
    scrub: bool,
}

impl ObjectArena {
    pub fn new(batch: usize, scrub: bool) -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            used_head: None,
            active_head: None,
            next_tag: 1,
            nroffree: 0,
            nrofalloc: 0,
            batch: batch.max(1),
            scrub,
        }
    }

    /// Record at `id`. Handles only come from this arena, so the slot exists.
    #[inline]
    pub fn get(&self, id: ObjectId) -> &Object {
        &self.slots[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.slots[id.index()]
    }

    /// True if `id` names a slot of this arena
    pub fn contains(&self, id: ObjectId) -> bool {
        id.index() < self.slots.len()
    }

    /// Add a batch of blank records to the free list.
    ///
    /// Running out of memory here is fatal: there is no state the world can
    /// fall back to without object records.
    fn expand(&mut self) {
        if self.slots.try_reserve(self.batch).is_err() {
            log::error!("fatal: cannot allocate {} more objects", self.batch);
            panic!("object pool exhausted");
        }
        let first = self.slots.len();
        let last = first + self.batch;
        for i in first..last {
            let mut ob = Object::blank();
            ob.set_flag(Flag::Freed);
            ob.links.next = if i + 1 < last {
                Some(ObjectId(i as u32 + 1))
            } else {
                self.free_head
            };
            self.slots.push(ob);
        }
        self.free_head = Some(ObjectId(first as u32));
        self.nroffree += self.batch;
        self.nrofalloc += self.batch;
        log::debug!("object pool expanded to {} records", self.nrofalloc);
    }

    fn fresh_tag(&mut self) -> Tag {
        let tag = Tag(self.next_tag);
        self.next_tag = self.next_tag.wrapping_add(1);
        if self.next_tag == 0 {
            self.next_tag = 1;
        }
        tag
    }

    /// Take a record from the free list, growing the pool if it is empty.
    ///
    /// The record is blank, flagged removed, carries a fresh tag and sits at
    /// the head of the used chain.
    pub fn allocate(&mut self) -> ObjectId {
        if self.free_head.is_none() {
            self.expand();
        }
        let Some(id) = self.free_head else {
            panic!("object pool exhausted");
        };
        self.free_head = self.slots[id.index()].links.next;
        self.nroffree -= 1;

        let tag = self.fresh_tag();
        let old_head = self.used_head;
        {
            let ob = &mut self.slots[id.index()];
            *ob = Object::blank();
            ob.count = tag;
            ob.links.next = old_head;
        }
        if let Some(h) = old_head {
            self.slots[h.index()].links.prev = Some(id);
        }
        self.used_head = Some(id);
        id
    }

    /// Return a detached record to the pool.
    ///
    /// The caller has already removed the object and emptied its inventory.
    /// Fails on records that are already free or still placed.
    pub fn release(&mut self, id: ObjectId) -> Result<(), ReleaseError> {
        let ob = &self.slots[id.index()];
        if ob.is_freed() {
            return Err(ReleaseError::AlreadyFree);
        }
        if !ob.is_removed() {
            return Err(ReleaseError::StillPlaced);
        }
        let (next, prev) = (ob.links.next, ob.links.prev);
        self.unlink_active(id);

        match prev {
            Some(p) => self.slots[p.index()].links.next = next,
            None => self.used_head = next,
        }
        if let Some(n) = next {
            self.slots[n.index()].links.prev = prev;
        }

        let mut blank = Object::blank();
        blank.set_flag(Flag::Freed);
        self.slots[id.index()] = blank;

        if self.scrub {
            // never handed out again: stale handles keep seeing a freed record
            return Ok(());
        }
        self.slots[id.index()].links.next = self.free_head;
        self.free_head = Some(id);
        self.nroffree += 1;
        Ok(())
    }

    /// Link into the active chain if not already there.
    pub fn link_active(&mut self, id: ObjectId) {
        if self.is_active(id) {
            return;
        }
        let old = self.active_head;
        {
            let l = &mut self.slots[id.index()].links;
            l.active_next = old;
            l.active_prev = None;
        }
        if let Some(h) = old {
            self.slots[h.index()].links.active_prev = Some(id);
        }
        self.active_head = Some(id);
    }

    /// Unlink from the active chain. No-op if not a member.
    pub fn unlink_active(&mut self, id: ObjectId) {
        if !self.is_active(id) {
            return;
        }
        let (next, prev) = {
            let l = &self.slots[id.index()].links;
            (l.active_next, l.active_prev)
        };
        match prev {
            Some(p) => self.slots[p.index()].links.active_next = next,
            None => self.active_head = next,
        }
        if let Some(n) = next {
            self.slots[n.index()].links.active_prev = prev;
        }
        let l = &mut self.slots[id.index()].links;
        l.active_next = None;
        l.active_prev = None;
    }

    pub fn is_active(&self, id: ObjectId) -> bool {
        self.active_head == Some(id) || self.slots[id.index()].links.active_prev.is_some()
    }

    /// Objects in use, newest first
    pub fn used(&self) -> ChainIter<'_> {
        ChainIter {
            arena: self,
            next: self.used_head,
            active: false,
        }
    }

    /// Objects in the active chain, most recently activated first
    pub fn active(&self) -> ChainIter<'_> {
        ChainIter {
            arena: self,
            next: self.active_head,
            active: true,
        }
    }

    /// Every slot with its handle, free ones included
    pub fn slots(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, ob)| (ObjectId(i as u32), ob))
    }

    pub fn count_free(&self) -> usize {
        self.nroffree
    }

    pub fn count_used(&self) -> usize {
        self.used().count()
    }

    pub fn count_active(&self) -> usize {
        self.active().count()
    }

    /// Records ever allocated by pool expansion
    pub fn capacity(&self) -> usize {
        self.nrofalloc
    }

    pub fn used_head(&self) -> Option<ObjectId> {
        self.used_head
    }

    pub fn active_head(&self) -> Option<ObjectId> {
        self.active_head
    }

    pub fn free_head(&self) -> Option<ObjectId> {
        self.free_head
    }
}

/// Why a record could not go back to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseError {
    AlreadyFree,
    StillPlaced,
}

/// Iterator over the used or active chain
pub struct ChainIter<'a> {
    arena: &'a ObjectArena,
    next: Option<ObjectId>,
    active: bool,
}

impl Iterator for ChainIter<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let cur = self.next?;
        let links = &self.arena.get(cur).links;
        self.next = if self.active {
            links.active_next
        } else {
            links.next
        };
        Some(cur)
    }
}
