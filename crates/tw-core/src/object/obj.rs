//! Object instances (object.h)
//!
//! The record every in-game entity is stored as, plus the handle types
//! used to address it inside the world arena.

use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

use super::archetype::Archetype;
use super::flags::{Flag, FlagSet, MoveType};
use super::kv::KeyValues;
use crate::consts::{NROFATTACKS, SPELL_TAG_SIZE};
use crate::map::MapId;
use crate::shstr::SharedStr;

/// Arena slot of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity number of a live object.
///
/// Assigned from a monotonically increasing counter on allocation and reset
/// to [`Tag::NONE`] when the object is freed, so a (slot, tag) pair never
/// matches a later occupant of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Tag(pub u32);

impl Tag {
    pub const NONE: Tag = Tag(0);
}

/// Tag-validated weak reference to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub tag: Tag,
}

/// Object kind. Unlisted kinds are carried as [`ObjectType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, FromRepr, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectType {
    #[default]
    Other = 0,
    Player = 1,
    Transport = 2,
    Rod = 3,
    Treasure = 4,
    Potion = 5,
    Food = 6,
    Book = 8,
    Arrow = 13,
    Bow = 14,
    Weapon = 15,
    Armour = 16,
    Altar = 18,
    Door = 23,
    Key = 24,
    Money = 36,
    Amulet = 39,
    Creator = 42,
    Skill = 43,
    Gem = 60,
    Exit = 66,
    Ring = 70,
    Floor = 71,
    Wall = 77,
    Monster = 80,
    Lamp = 82,
    Button = 92,
    Sign = 98,
    Spell = 101,
    SpellEffect = 102,
    Wand = 109,
    Scroll = 111,
    Force = 114,
    Container = 122,
    CheckInv = 64,
    Rune = 154,
    Trap = 155,
    Corpse = 157,
}

/// Base statistics block, compared bitwise when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Living {
    pub str: i8,
    pub dex: i8,
    pub con: i8,
    pub wis: i8,
    pub cha: i8,
    pub int: i8,
    pub pow: i8,
    pub wc: i8,
    pub ac: i8,
    pub luck: i8,
    pub hp: i16,
    pub maxhp: i16,
    pub sp: i16,
    pub maxsp: i16,
    pub grace: i16,
    pub maxgrace: i16,
    pub dam: i16,
    pub food: i32,
    pub exp: i64,
}

bitflags! {
    /// Terrain skills that reduce the slow penalty of matching terrain.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TerrainSkills: u8 {
        const CLIMBING = 0x01;
        const WOODSMAN = 0x02;
    }
}

/// State an object carries while a player controls it.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub hidden: bool,
    /// Client must resend the ground view
    pub update_look: bool,
    /// Line of sight must be recomputed
    pub do_los: bool,
    pub transport: Option<ObjectId>,
    pub skills: TerrainSkills,
}

/// Structural links. These are never copied between objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    /// Used/free chain
    pub next: Option<ObjectId>,
    pub prev: Option<ObjectId>,
    /// Active chain
    pub active_next: Option<ObjectId>,
    pub active_prev: Option<ObjectId>,
    /// Tile stack or inventory neighbours
    pub above: Option<ObjectId>,
    pub below: Option<ObjectId>,
    /// Topmost contained object
    pub inv: Option<ObjectId>,
    /// Containing object
    pub env: Option<ObjectId>,
    /// Container a player has open
    pub container: Option<ObjectId>,
    /// Multi-part chain
    pub more: Option<ObjectId>,
    pub head: Option<ObjectId>,
    pub map: Option<MapId>,
}

/// A live object record
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub links: Links,
    /// Identity, [`Tag::NONE`] while free
    pub count: Tag,
    pub player: Option<Box<PlayerState>>,

    pub arch: Option<Rc<Archetype>>,
    pub other_arch: Option<Rc<Archetype>>,
    pub name: Option<SharedStr>,
    pub name_pl: Option<SharedStr>,
    pub title: Option<SharedStr>,
    pub race: Option<SharedStr>,
    pub slaying: Option<SharedStr>,
    pub skill: Option<SharedStr>,
    pub msg: Option<SharedStr>,
    pub lore: Option<SharedStr>,
    pub materialname: Option<SharedStr>,
    pub custom_name: Option<SharedStr>,

    pub x: i32,
    pub y: i32,
    /// Last coordinates before the most recent move
    pub ox: i32,
    pub oy: i32,

    pub speed: f32,
    pub speed_left: f32,
    pub nrof: u32,
    pub weight: i32,
    pub carrying: i32,
    pub value: i32,
    pub item_power: i8,
    pub magic: i8,
    pub glow_radius: i8,
    pub direction: i8,
    pub facing: i8,
    pub level: i16,
    pub invisible: i16,
    pub duration: i16,
    pub range: i16,

    pub type_: ObjectType,
    pub subtype: u8,
    pub client_type: u16,
    pub animation_id: u16,
    pub map_layer: u8,
    pub attacktype: u32,

    pub stats: Living,
    pub resist: [i16; NROFATTACKS],
    pub flags: FlagSet,

    pub move_type: MoveType,
    pub move_block: MoveType,
    pub move_allow: MoveType,
    pub move_on: MoveType,
    pub move_off: MoveType,
    pub move_slow: MoveType,
    pub move_slow_penalty: f32,

    pub owner: Option<ObjectId>,
    pub ownercount: Tag,
    pub enemy: Option<ObjectId>,
    pub enemy_count: Tag,

    pub key_values: KeyValues,
    pub spell_tags: Option<Box<[Tag; SPELL_TAG_SIZE]>>,
}

impl Object {
    /// A blank record flagged removed, as handed out by the arena.
    pub fn blank() -> Self {
        let mut ob = Self::default();
        ob.flags.insert(Flag::Removed);
        ob
    }

    #[inline]
    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flag) {
        self.flags.insert(flag);
    }

    #[inline]
    pub fn clear_flag(&mut self, flag: Flag) {
        self.flags.remove(flag);
    }

    pub fn is_removed(&self) -> bool {
        self.has(Flag::Removed)
    }

    pub fn is_freed(&self) -> bool {
        self.has(Flag::Freed)
    }

    /// Quantity with the singular sentinel resolved
    pub fn quantity(&self) -> u32 {
        self.nrof.max(1)
    }

    /// Weight this object contributes to its container before reduction
    pub fn total_weight(&self) -> i32 {
        if self.nrof > 0 {
            self.weight.saturating_mul(self.nrof as i32)
        } else {
            self.weight + self.carrying
        }
    }

    pub fn is_player(&self) -> bool {
        self.type_ == ObjectType::Player
    }

    /// True if controlled by a player session
    pub fn is_controlled(&self) -> bool {
        self.player.is_some()
    }

    /// Name for diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(null)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_removed() {
        let ob = Object::blank();
        assert!(ob.is_removed());
        assert!(!ob.is_freed());
        assert_eq!(ob.count, Tag::NONE);
    }

    #[test]
    fn test_quantity_sentinel() {
        let mut ob = Object::blank();
        assert_eq!(ob.quantity(), 1);
        ob.nrof = 7;
        assert_eq!(ob.quantity(), 7);
    }

    #[test]
    fn test_total_weight() {
        let mut ob = Object::blank();
        ob.weight = 10;
        ob.carrying = 25;
        assert_eq!(ob.total_weight(), 35);
        ob.nrof = 3;
        assert_eq!(ob.total_weight(), 30);
    }

    #[test]
    fn test_type_from_repr() {
        assert_eq!(ObjectType::from_repr(122), Some(ObjectType::Container));
        assert_eq!(ObjectType::from_repr(250), None);
    }
}
