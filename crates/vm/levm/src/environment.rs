use ferrite_common::{Address, H256, U256, types::Fork};
use std::sync::Arc;

/// Fork-dependent execution rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EVMConfig {
    pub fork: Fork,
}

impl EVMConfig {
    pub const fn new(fork: Fork) -> Self {
        Self { fork }
    }
}

/// Block and transaction context shared by every frame of a transaction.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// The sender address of the external transaction.
    pub origin: Address,
    /// Gas limit of the transaction.
    pub gas_limit: u64,
    pub config: EVMConfig,
    pub block_number: u64,
    pub coinbase: Address,
    pub timestamp: u64,
    pub difficulty: U256,
    pub block_gas_limit: u64,
    pub gas_price: U256,
    pub chain_id: u64,
    /// Hashes of the most recent ancestors, oldest first. The last entry is the parent.
    pub block_hashes: Arc<[H256]>,
}
