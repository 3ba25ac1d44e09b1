pub mod levm;
use levm::LEVM;

use crate::errors::EvmError;
use ferrite_common::{
    Address, H256,
    types::{Block, BlockHeader, ChainConfig, Receipt, Transaction},
};
use ferrite_levm::{db::WorldState, errors::ExecutionReport};
use std::sync::Arc;
use tracing::instrument;

/// Block executor over a [`WorldState`] borrowed from the chain.
///
/// Every write goes straight to the world state; undoing a rejected block is the
/// caller's job, through a checkpoint opened before execution starts.
pub struct Evm<'a> {
    pub db: &'a mut WorldState,
    pub chain_config: ChainConfig,
    /// Hashes of the most recent canonical blocks, oldest first, for BLOCKHASH.
    pub block_hashes: Arc<[H256]>,
}

impl core::fmt::Debug for Evm<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LEVM")
    }
}

impl<'a> Evm<'a> {
    pub fn new(db: &'a mut WorldState, chain_config: ChainConfig, block_hashes: Arc<[H256]>) -> Self {
        Evm {
            db,
            chain_config,
            block_hashes,
        }
    }

    /// Runs every transaction of `block` in order and pays the mining rewards.
    #[instrument(
        level = "trace",
        name = "Block execution",
        skip_all,
        fields(namespace = "block_execution", number = block.header.number)
    )]
    pub fn execute_block(&mut self, block: &Block) -> Result<BlockExecutionResult, EvmError> {
        LEVM::execute_block(block, self.db, &self.chain_config, &self.block_hashes)
    }

    /// Wraps [LEVM::execute_tx] and builds the receipt of the transaction.
    ///
    /// `cumulative_gas_used` is the block gas used before this transaction and is
    /// advanced past it.
    pub fn execute_tx(
        &mut self,
        tx: &Transaction,
        sender: Address,
        block_header: &BlockHeader,
        cumulative_gas_used: &mut u64,
    ) -> Result<(Receipt, ExecutionReport), EvmError> {
        let report = LEVM::execute_tx(
            tx,
            sender,
            block_header,
            self.db,
            &self.chain_config,
            &self.block_hashes,
        )?;
        *cumulative_gas_used = cumulative_gas_used
            .checked_add(report.gas_used)
            .ok_or_else(|| EvmError::Custom("Block gas used overflow".to_string()))?;

        let receipt = Receipt::new(
            self.db.state_root(),
            *cumulative_gas_used,
            report.logs.clone(),
        );
        Ok((receipt, report))
    }

    /// Wraps [LEVM::pay_rewards].
    pub fn pay_rewards(&mut self, block: &Block) -> Result<(), EvmError> {
        LEVM::pay_rewards(block, self.db)
    }
}

#[derive(Clone, Debug, Default)]
pub struct BlockExecutionResult {
    pub receipts: Vec<Receipt>,
    pub block_gas_used: u64,
}
