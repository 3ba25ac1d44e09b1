//! Proof-of-work difficulty adjustment.

use crate::constants::{
    BOMB_PERIOD, DIFFICULTY_BOUND_DIVISOR, FRONTIER_DURATION_LIMIT, HOMESTEAD_DURATION_DIVISOR,
    HOMESTEAD_MAX_DOWNWARD_STEPS, MINIMUM_DIFFICULTY,
};
use ferrite_common::U256;

/// Frontier moves difficulty one step up when the block came fast and one step down
/// otherwise.
pub fn frontier_difficulty(
    block_number: u64,
    block_timestamp: u64,
    parent_timestamp: u64,
    parent_difficulty: U256,
) -> U256 {
    let step = parent_difficulty / DIFFICULTY_BOUND_DIVISOR;
    let difficulty =
        if block_timestamp < parent_timestamp.saturating_add(FRONTIER_DURATION_LIMIT) {
            parent_difficulty.saturating_add(step)
        } else {
            parent_difficulty.saturating_sub(step)
        };
    finalize(difficulty, block_number)
}

/// EIP-2: the adjustment scales with how late the block is, down to at most 99 steps.
pub fn homestead_difficulty(
    block_number: u64,
    block_timestamp: u64,
    parent_timestamp: u64,
    parent_difficulty: U256,
) -> U256 {
    let step = parent_difficulty / DIFFICULTY_BOUND_DIVISOR;
    let periods = block_timestamp.saturating_sub(parent_timestamp) / HOMESTEAD_DURATION_DIVISOR;
    let periods = i64::try_from(periods).unwrap_or(i64::MAX);
    let steps = 1i64
        .saturating_sub(periods)
        .max(-HOMESTEAD_MAX_DOWNWARD_STEPS);

    let adjustment = step.saturating_mul(U256::from(steps.unsigned_abs()));
    let difficulty = if steps >= 0 {
        parent_difficulty.saturating_add(adjustment)
    } else {
        parent_difficulty.saturating_sub(adjustment)
    };
    finalize(difficulty, block_number)
}

/// Exponential term that starts doubling every period from block 200000 on.
pub fn bomb(block_number: u64) -> U256 {
    match (block_number / BOMB_PERIOD).checked_sub(2) {
        None => U256::zero(),
        Some(exponent) if exponent < 256 => U256::from(2).pow(U256::from(exponent)),
        Some(_) => U256::MAX,
    }
}

fn finalize(difficulty: U256, block_number: u64) -> U256 {
    difficulty
        .saturating_add(bomb(block_number))
        .max(U256::from(MINIMUM_DIFFICULTY))
}
