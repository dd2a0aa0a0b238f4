//! Engine errors
//!
//! Contract violations and malformed requests. Search misses and merge
//! rejections are not errors and are reported as `None`/`false`.

use thiserror::Error;

use crate::map::MapId;
use crate::object::ObjectId;

/// Error returned by object operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    #[error("Trying to remove removed object {id:?}")]
    AlreadyRemoved { id: ObjectId },

    #[error("Object {id:?} is still placed")]
    NotRemoved { id: ObjectId },

    #[error("Trying to use freed object {id:?}")]
    AlreadyFreed { id: ObjectId },

    #[error("Position ({x}, {y}) is outside map {map:?}")]
    OutOfMap { map: MapId, x: i32, y: i32 },

    #[error("No map {map:?}")]
    NoSuchMap { map: MapId },

    #[error("Object {id:?} is not on a map")]
    NotOnMap { id: ObjectId },

    #[error("Tried to insert multipart object {id:?} in a container")]
    MultipartInContainer { id: ObjectId },

    #[error("Object {id:?} cannot own itself")]
    SelfOwnership { id: ObjectId },

    #[error("Originator {originator:?} is not on the same space as {id:?}")]
    BelowOriginatorMismatch { id: ObjectId, originator: ObjectId },

    #[error("There are only {available} of {id:?}, {requested} requested")]
    InsufficientQuantity {
        id: ObjectId,
        available: u32,
        requested: u32,
    },

    #[error("Handle {id:?} does not refer to a live object")]
    StaleHandle { id: ObjectId },

    #[error("No archetype named '{name}'")]
    UnknownArchetype { name: String },
}

/// Result type for object operations
pub type Result<T> = core::result::Result<T, ObjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_object() {
        let err = ObjectError::AlreadyRemoved { id: ObjectId(7) };
        assert!(err.to_string().contains("ObjectId(7)"));

        let err = ObjectError::OutOfMap {
            map: MapId(0),
            x: 9,
            y: -1,
        };
        assert_eq!(err.to_string(), "Position (9, -1) is outside map MapId(0)");
    }
}
