use super::BlockExecutionResult;
use crate::EvmError;
use ferrite_common::{
    Address, H256, U256,
    types::{Block, BlockHeader, ChainConfig, Receipt, Transaction},
};
use ferrite_levm::{
    EVMConfig, Environment,
    db::WorldState,
    errors::{ExecutionReport, TxValidationError},
    vm::VM,
};
use std::sync::Arc;
use tracing::debug;

/// Reward for mining a block: 5 ether.
pub const BLOCK_REWARD: U256 = U256([5_000_000_000_000_000_000, 0, 0, 0]);

/// The struct implements the following functions:
/// [LEVM::execute_block]
/// [LEVM::execute_tx]
/// [LEVM::pay_rewards]
#[derive(Debug)]
pub struct LEVM;

/// Checks that adding `tx_gas_limit` to `block_gas_used` doesn't exceed `block_gas_limit`.
fn check_gas_limit(
    block_gas_used: u64,
    tx_gas_limit: u64,
    block_gas_limit: u64,
) -> Result<(), EvmError> {
    let needed = block_gas_used.saturating_add(tx_gas_limit);
    if needed > block_gas_limit {
        return Err(TxValidationError::GasAllowanceExceeded {
            block_gas_limit,
            needed,
        }
        .into());
    }
    Ok(())
}

impl LEVM {
    /// Execute a block and return the execution result.
    ///
    /// Transactions run in order, each one settled before the next starts. A
    /// transaction that cannot be admitted aborts the whole block; failed executions
    /// only produce a receipt. Mining rewards are paid last.
    pub fn execute_block(
        block: &Block,
        db: &mut WorldState,
        chain_config: &ChainConfig,
        block_hashes: &Arc<[H256]>,
    ) -> Result<BlockExecutionResult, EvmError> {
        let fork = chain_config.fork(block.header.number);
        let mut receipts = Vec::with_capacity(block.body.transactions.len());
        let mut block_gas_used = 0_u64;

        for (index, tx) in block.body.transactions.iter().enumerate() {
            check_gas_limit(block_gas_used, tx.gas, block.header.gas_limit)?;

            let sender = tx
                .sender(chain_config.chain_id, fork)
                .map_err(|source| EvmError::InvalidSignature { index, source })?;

            let report = Self::execute_tx(tx, sender, &block.header, db, chain_config, block_hashes)?;
            debug!(
                index,
                %sender,
                success = report.is_success(),
                gas_used = report.gas_used,
                "Executed transaction"
            );

            block_gas_used = block_gas_used
                .checked_add(report.gas_used)
                .ok_or_else(|| EvmError::Custom("Block gas used overflow".to_string()))?;
            receipts.push(Receipt::new(db.state_root(), block_gas_used, report.logs));
        }

        Self::pay_rewards(block, db)?;

        Ok(BlockExecutionResult {
            receipts,
            block_gas_used,
        })
    }

    pub(crate) fn setup_env(
        tx: &Transaction,
        tx_sender: Address,
        block_header: &BlockHeader,
        chain_config: &ChainConfig,
        block_hashes: &Arc<[H256]>,
    ) -> Environment {
        Environment {
            origin: tx_sender,
            gas_limit: tx.gas,
            config: EVMConfig::new(chain_config.fork(block_header.number)),
            block_number: block_header.number,
            coinbase: block_header.coinbase,
            timestamp: block_header.timestamp,
            difficulty: block_header.difficulty,
            block_gas_limit: block_header.gas_limit,
            gas_price: tx.gas_price,
            chain_id: chain_config.chain_id,
            block_hashes: Arc::clone(block_hashes),
        }
    }

    /// Admits, runs and settles one transaction whose sender is already known.
    pub fn execute_tx(
        tx: &Transaction,
        tx_sender: Address,
        block_header: &BlockHeader,
        db: &mut WorldState,
        chain_config: &ChainConfig,
        block_hashes: &Arc<[H256]>,
    ) -> Result<ExecutionReport, EvmError> {
        let env = Self::setup_env(tx, tx_sender, block_header, chain_config, block_hashes);
        let mut vm = VM::new(env, db, tx);
        Ok(vm.execute()?)
    }

    /// Mints the block and ommer rewards.
    ///
    /// The miner gets [`BLOCK_REWARD`] plus a 32nd of it per ommer. Each ommer's miner
    /// gets `(8 - age) / 8` of it, where `age` is how many blocks the ommer is behind.
    pub fn pay_rewards(block: &Block, db: &mut WorldState) -> Result<(), EvmError> {
        let ommer_count = U256::from(block.body.ommers.len());
        let inclusion_reward = (BLOCK_REWARD / 32)
            .checked_mul(ommer_count)
            .ok_or_else(|| EvmError::Custom("Ommer inclusion reward overflow".to_string()))?;
        let miner_reward = BLOCK_REWARD
            .checked_add(inclusion_reward)
            .ok_or_else(|| EvmError::Custom("Miner reward overflow".to_string()))?;
        db.increase_balance(block.header.coinbase, miner_reward)?;

        for ommer in &block.body.ommers {
            let age = block
                .header
                .number
                .checked_sub(ommer.number)
                .filter(|age| *age < 8)
                .ok_or_else(|| {
                    EvmError::Custom(format!(
                        "Ommer {} cannot be rewarded in block {}",
                        ommer.number, block.header.number
                    ))
                })?;
            let ommer_reward = BLOCK_REWARD * U256::from(8 - age) / 8;
            db.increase_balance(ommer.coinbase, ommer_reward)?;
        }
        Ok(())
    }
}
