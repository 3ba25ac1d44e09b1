use ferrite_common::{Address, H160, U256};

pub const WORD_SIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

pub const STACK_LIMIT: usize = 1024;
/// Deepest nesting a message call may reach.
pub const STACK_DEPTH_LIMIT: usize = 1024;

pub const SUCCESS: U256 = U256([1, 0, 0, 0]);
pub const FAIL: U256 = U256([0, 0, 0, 0]);

/// EIP-170 limit on deployed code.
pub const MAX_CODE_SIZE: usize = 0x6000;

/// BLOCKHASH only sees this many ancestors.
pub const LAST_AVAILABLE_BLOCK_LIMIT: u64 = 256;

pub const ECRECOVER_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01,
]);
pub const SHA2_256_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02,
]);
pub const RIPEMD_160_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x03,
]);
pub const IDENTITY_ADDRESS: Address = H160([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x04,
]);
