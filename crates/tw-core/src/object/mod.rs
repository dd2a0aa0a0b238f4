//! Objects
//!
//! Object records, their pool, and every operation that links, unlinks,
//! merges or disposes of them. Operations are methods on [`crate::World`],
//! split across this module's files by concern.

mod active;
mod archetype;
mod arena;
mod container;
mod dump;
mod flags;
mod inventory;
mod kv;
mod lifecycle;
mod merge;
mod move_on;
mod obj;
mod owner;
mod place;
mod quantity;
mod remove;
mod weight;

pub use archetype::{ArchParts, Archetype, ArchetypeRegistry};
pub use arena::{ChainIter, ObjectArena, ReleaseError};
pub use flags::{FLAG_WORDS, Flag, FlagSet, FreeFlags, InsertFlags, MERGE_IGNORED_WORD3, MoveType};
pub use kv::{KeyValue, KeyValues};
pub use obj::{Links, Living, Object, ObjectId, ObjectRef, ObjectType, PlayerState, Tag, TerrainSkills};
