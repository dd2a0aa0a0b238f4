//! Object flags and movement types (define.h)
//!
//! Flags are stored as four 32-bit words so the merge rules can compare
//! them word by word.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Number of 32-bit words in a [`FlagSet`]
pub const FLAG_WORDS: usize = 4;

/// Bits of the last word that never block a merge (client-sent, original).
pub const MERGE_IGNORED_WORD3: u32 = 0x84;

/// Object flag. The discriminant is the bit number in the flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum Flag {
    Alive = 0,
    Wiz = 1,
    Removed = 2,
    Freed = 3,
    WasWiz = 4,
    Applied = 5,
    Unpaid = 6,
    NoPick = 8,
    ClientAnimSync = 9,
    ClientAnimRandom = 10,
    Animate = 11,
    Monster = 14,
    Friendly = 15,
    Generator = 16,
    IsThrown = 17,
    OverlayFloor = 23,
    IsTurnable = 24,
    Identified = 29,
    StartEquip = 34,
    BlocksView = 35,
    Undead = 36,
    NoMagic = 41,
    NoFixPlayer = 42,
    IsLightable = 43,
    Unique = 49,
    NoDrop = 50,
    NoApply = 62,
    IsFloor = 63,
    WizPass = 72,
    IsLinked = 73,
    Cursed = 74,
    Damned = 75,
    KnownCursed = 78,
    BeenApplied = 80,
    InvLocked = 86,
    IsWooded = 87,
    IsHilly = 88,
    NoSteal = 96,
    ClientSent = 98,
    ObjOriginal = 103,
    IsATemplate = 109,
    Blessed = 112,
}

impl Flag {
    #[inline]
    fn word_and_mask(self) -> (usize, u32) {
        let bit = self as usize;
        (bit / 32, 1u32 << (bit % 32))
    }
}

/// Fixed-size set of [`Flag`]s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagSet([u32; FLAG_WORDS]);

impl FlagSet {
    pub const fn empty() -> Self {
        Self([0; FLAG_WORDS])
    }

    #[inline]
    pub fn contains(&self, flag: Flag) -> bool {
        let (w, m) = flag.word_and_mask();
        self.0[w] & m != 0
    }

    #[inline]
    pub fn insert(&mut self, flag: Flag) {
        let (w, m) = flag.word_and_mask();
        self.0[w] |= m;
    }

    #[inline]
    pub fn remove(&mut self, flag: Flag) {
        let (w, m) = flag.word_and_mask();
        self.0[w] &= !m;
    }

    pub fn set(&mut self, flag: Flag, on: bool) {
        if on {
            self.insert(flag);
        } else {
            self.remove(flag);
        }
    }

    /// Raw word access
    pub fn words(&self) -> &[u32; FLAG_WORDS] {
        &self.0
    }

    /// Equality for stacking purposes: the first three words exactly,
    /// the last one ignoring [`MERGE_IGNORED_WORD3`].
    pub fn merge_equal(&self, other: &FlagSet) -> bool {
        self.0[..3] == other.0[..3]
            && (self.0[3] & !MERGE_IGNORED_WORD3) == (other.0[3] & !MERGE_IGNORED_WORD3)
    }
}

bitflags! {
    /// Movement types. An object with an empty type is treated as walking
    /// in most checks.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MoveType: u8 {
        const WALK = 0x01;
        const FLY_LOW = 0x02;
        const FLY_HIGH = 0x04;
        const FLYING = 0x06;
        const SWIM = 0x08;
        const BOAT = 0x10;
        const ALL = 0x1f;
    }
}

impl Serialize for MoveType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MoveType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(MoveType::from_bits_truncate(bits))
    }
}

impl MoveType {
    /// True if every movement type of `mover` is in `block` (and `mover` moves at all).
    #[inline]
    pub fn blocked_by(self, block: MoveType) -> bool {
        !block.is_empty() && (self & block) == self
    }

    /// The shared trigger/slow test: `mover` is affected by `mask` unless it has
    /// an alternative movement type that is neither in `mask` nor blocked.
    /// A mover without a movement type is treated as walking.
    #[inline]
    pub fn affected_by(self, mask: MoveType, block: MoveType) -> bool {
        if self.is_empty() {
            return mask.contains(MoveType::WALK);
        }
        self.intersects(mask) && (self & !mask & !block).is_empty()
    }
}

bitflags! {
    /// Insertion behaviour for map placement
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct InsertFlags: u8 {
        /// Do not try to merge with objects on the tile
        const NO_MERGE = 0x01;
        /// Insert directly above the last floor object
        const ABOVE_FLOOR_ONLY = 0x02;
        /// Do not run move-on triggers
        const NO_WALK_ON = 0x04;
        /// Insert at the top of the stack
        const ON_TOP = 0x08;
        /// Insert directly below the originator
        const BELOW_ORIGINATOR = 0x10;
        /// Map is being loaded; objects go on top in file order
        const MAP_LOAD = 0x20;
    }
}

bitflags! {
    /// Disposal behaviour for [`crate::World::free`]
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct FreeFlags: u8 {
        /// Free the inventory instead of dropping it
        const FREE_INVENTORY = 0x01;
        /// Do not fire the destroy hook
        const NO_DESTROY_CALLBACK = 0x02;
        /// Dropped inventory lands directly above the floor
        const DROP_ABOVE_FLOOR = 0x04;
    }
}
