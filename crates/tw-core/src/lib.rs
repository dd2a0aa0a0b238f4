//! tw-core: live object engine for a tile-based multiplayer world
//!
//! This crate owns every in-game object: their pool, their placement on
//! map tiles and inside containers, merging of stacks, weight bookkeeping
//! and the spatial searches gameplay code uses to place and chase things.
//!
//! Everything hangs off a [`World`]. Gameplay, networking and persistence
//! layers plug in through [`WorldHooks`].

pub mod consts;
pub mod map;
pub mod object;
pub mod rng;
pub mod search;
pub mod shstr;
pub mod world;

pub use map::{MapId, TileMap};
pub use object::{Flag, InsertFlags, Object, ObjectId, ObjectType, Tag};
pub use rng::GameRng;
pub use search::{MultiSize, RangeVector};
pub use shstr::{SharedStr, StringTable};
pub use world::{IntegrityError, ObjectError, Settings, World, WorldHooks};
