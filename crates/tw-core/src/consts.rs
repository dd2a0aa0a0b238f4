//! Engine constants
//!
//! Ring-search tables, speed thresholds and pool sizing.

/// Objects whose |speed| is at or below this never enter the active chain.
pub const MIN_ACTIVE_SPEED: f32 = 0.00001;

/// Objects allocated per pool expansion
pub const OBJ_EXPAND: usize = 500;

/// Number of resistance slots on an object
pub const NROFATTACKS: usize = 26;

/// Size of the per-object spell tag table
pub const SPELL_TAG_SIZE: usize = 16;

/// Total entries in the free-spot ring tables
pub const SIZEOFFREE: usize = 49;
/// Last index of the first ring (8 neighbours)
pub const SIZEOFFREE1: usize = 8;
/// Last index of the second ring
pub const SIZEOFFREE2: usize = 24;

/// Side-step angles tried on each side when a path is blocked
pub const DETOUR_AMOUNT: i32 = 2;
/// Step budget for path search
pub const MAX_SPACES: i32 = 50;

/// Quantity ceiling for a merged stack
pub const MAX_MERGED_NROF: u64 = 1 << 31;

/// X offsets of the ring search, center first, then rings of 8, 16 and 24 tiles.
pub const FREEARR_X: [i32; SIZEOFFREE] = [
    0, 0, 1, 1, 1, 0, -1, -1, -1, 0, 1, 2, 2, 2, 2, 2, 1, 0, -1, -2, -2, -2, -2, -2, -1, 0, 1, 2,
    3, 3, 3, 3, 3, 3, 3, 2, 1, 0, -1, -2, -3, -3, -3, -3, -3, -3, -3, -2, -1,
];

/// Y offsets of the ring search
pub const FREEARR_Y: [i32; SIZEOFFREE] = [
    0, -1, -1, 0, 1, 1, 1, 0, -1, -2, -2, -2, -1, 0, 1, 2, 2, 2, 2, 2, 1, 0, -1, -2, -2, -3, -3,
    -3, -3, -2, -1, 0, 1, 2, 3, 3, 3, 3, 3, 3, 3, 2, 1, 0, -1, -2, -3, -3, -3,
];

/// Search boundary to fall back to when the entry at this index is blocked.
pub const MAXFREE: [usize; SIZEOFFREE] = [
    0, 9, 10, 13, 14, 17, 18, 21, 22, 25, 26, 27, 30, 31, 32, 33, 36, 37, 39, 39, 42, 43, 44, 45,
    48, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49, 49,
    49, 49,
];

/// Compass direction (1..=8) of each ring entry, 0 for the center.
pub const FREEDIR: [i32; SIZEOFFREE] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 2, 2, 3, 4, 4, 4, 5, 6, 6, 6, 7, 8, 8, 8, 1, 2, 2, 2, 2, 2,
    3, 4, 4, 4, 4, 4, 5, 6, 6, 6, 6, 6, 7, 8, 8, 8, 8, 8,
];

/// For each ring entry beyond the first ring, up to three entries on the same or
/// an inner ring that a line of sight may pass through. At least one of them lies
/// on an inner ring. -1 marks an unused slot.
pub const REDUCTION_DIR: [[i32; 3]; SIZEOFFREE] = [
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [0, 0, 0],
    [8, 1, 2],
    [1, 2, -1],
    [2, 10, 12],
    [2, 3, -1],
    [2, 3, 4],
    [3, 4, -1],
    [4, 14, 16],
    [5, 4, -1],
    [4, 5, 6],
    [6, 5, -1],
    [6, 20, 18],
    [7, 6, -1],
    [6, 7, 8],
    [7, 8, -1],
    [8, 22, 24],
    [8, 1, -1],
    [24, 9, 10],
    [9, 10, -1],
    [10, 11, -1],
    [27, 11, 29],
    [11, 12, -1],
    [12, 13, -1],
    [12, 13, 14],
    [13, 14, -1],
    [14, 15, -1],
    [33, 15, 35],
    [16, 15, -1],
    [17, 16, -1],
    [18, 17, 16],
    [18, 17, -1],
    [18, 19, -1],
    [41, 19, 39],
    [19, 20, -1],
    [20, 21, -1],
    [20, 21, 22],
    [21, 22, -1],
    [23, 22, -1],
    [45, 47, 23],
    [23, 24, -1],
    [24, 9, -1],
];
