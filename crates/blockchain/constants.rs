// === HEADER CONSTANTS ===

pub const GAS_LIMIT_ADJUSTMENT_FACTOR: u64 = 1024;

pub const GAS_LIMIT_MINIMUM: u64 = 5000;

pub const MAX_EXTRA_DATA_SIZE: usize = 32;

// === DIFFICULTY CONSTANTS ===

/// Difficulty never drops below the genesis minimum.
pub const MINIMUM_DIFFICULTY: u64 = 131_072;

pub const DIFFICULTY_BOUND_DIVISOR: u64 = 2048;

/// Frontier raises difficulty when a block arrives sooner than this after its parent.
pub const FRONTIER_DURATION_LIMIT: u64 = 13;

pub const HOMESTEAD_DURATION_DIVISOR: u64 = 10;

pub const HOMESTEAD_MAX_DOWNWARD_STEPS: i64 = 99;

pub const BOMB_PERIOD: u64 = 100_000;

// === OMMER CONSTANTS ===

pub const MAX_OMMERS: usize = 2;

/// Oldest ancestor an ommer may branch from, counted from the including block.
pub const MAX_OMMER_DEPTH: u64 = 6;

// === CHAIN CONSTANTS ===

/// Blocks retained after each import. Together with the head hash they cover the 256
/// hashes BLOCKHASH can reach.
pub const HISTORY_WINDOW: usize = 255;
