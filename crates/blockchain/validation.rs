//! Consensus checks on a block before and after its body is executed.

use crate::{
    chain::Chain,
    constants::{
        GAS_LIMIT_ADJUSTMENT_FACTOR, GAS_LIMIT_MINIMUM, MAX_EXTRA_DATA_SIZE, MAX_OMMER_DEPTH,
        MAX_OMMERS,
    },
    error::{ChainError, InvalidBlockError},
    fork_rules::ruleset,
    pow::ProofOfWork,
};
use ferrite_common::{
    Bloom, H256,
    types::{
        Block, BlockHeader, Receipt, compute_ommers_hash, compute_receipts_root,
        compute_transactions_root,
    },
};
use ferrite_vm::BlockExecutionResult;
use rustc_hash::FxHashSet;

/// Checks of `header` against its parent that do not depend on the protocol version.
pub fn validate_header_against_parent(
    header: &BlockHeader,
    parent: &BlockHeader,
) -> Result<(), InvalidBlockError> {
    if header.gas_used > header.gas_limit {
        return Err(InvalidBlockError::GasUsedExceedsGasLimit {
            gas_used: header.gas_used,
            gas_limit: header.gas_limit,
        });
    }
    if header.timestamp <= parent.timestamp {
        return Err(InvalidBlockError::TimestampNotIncreasing {
            timestamp: header.timestamp,
            parent_timestamp: parent.timestamp,
        });
    }
    if parent.number.checked_add(1) != Some(header.number) {
        return Err(InvalidBlockError::InvalidBlockNumber {
            number: header.number,
            parent_number: parent.number,
        });
    }
    if !check_gas_limit(header.gas_limit, parent.gas_limit) {
        return Err(InvalidBlockError::InvalidGasLimit {
            gas_limit: header.gas_limit,
            parent_gas_limit: parent.gas_limit,
        });
    }
    if header.extra_data.len() > MAX_EXTRA_DATA_SIZE {
        return Err(InvalidBlockError::ExtraDataTooLong(header.extra_data.len()));
    }
    Ok(())
}

/// The gas limit moves strictly less than 1/1024 of the parent's per block and never
/// goes below the floor.
pub fn check_gas_limit(gas_limit: u64, parent_gas_limit: u64) -> bool {
    let max_delta = parent_gas_limit / GAS_LIMIT_ADJUSTMENT_FACTOR;
    gas_limit < parent_gas_limit.saturating_add(max_delta)
        && gas_limit > parent_gas_limit.saturating_sub(max_delta)
        && gas_limit >= GAS_LIMIT_MINIMUM
}

pub fn validate_parent_hash(header: &BlockHeader, parent: &BlockHeader) -> Result<(), InvalidBlockError> {
    let parent_hash = parent.hash();
    if header.parent_hash != parent_hash {
        return Err(InvalidBlockError::ParentHashMismatch(parent_hash));
    }
    Ok(())
}

/// Validates the ommers of `block` against the history retained by `chain`.
///
/// Each ommer header must be valid against its own parent, which has to be a recent
/// canonical block, and no ommer may be canonical or already rewarded.
pub fn validate_ommers(
    block: &Block,
    chain: &Chain,
    pow: &dyn ProofOfWork,
) -> Result<(), ChainError> {
    let header = &block.header;
    let ommers = &block.body.ommers;

    if compute_ommers_hash(ommers) != header.ommers_hash {
        return Err(InvalidBlockError::OmmersHashMismatch.into());
    }
    if ommers.is_empty() {
        return Ok(());
    }

    for ommer in ommers {
        if ommer.number < 1 || ommer.number >= header.number {
            return Err(invalid_ommer(ommer.hash(), "number is not below the block's"));
        }
        let age = header.number.saturating_sub(ommer.number);
        let ommer_parent = age
            .checked_add(1)
            .and_then(|depth| chain.ancestor(depth))
            .ok_or_else(|| invalid_ommer(ommer.hash(), "parent is outside the history window"))?;
        ruleset(chain.config.fork(ommer.number)).validate_header(
            ommer,
            &ommer_parent.header,
            pow,
        )?;
    }

    if ommers.len() > MAX_OMMERS {
        return Err(InvalidBlockError::TooManyOmmers(ommers.len()).into());
    }

    let ommer_hashes: Vec<H256> = ommers.iter().map(BlockHeader::hash).collect();
    let mut seen = FxHashSet::default();
    for hash in &ommer_hashes {
        if !seen.insert(*hash) {
            return Err(InvalidBlockError::DuplicateOmmer(*hash).into());
        }
    }

    let recent_blocks = chain.recent_blocks(MAX_OMMER_DEPTH as usize + 1);
    let recent_hashes: FxHashSet<H256> = recent_blocks.iter().map(|block| block.hash()).collect();
    let recent_ommer_hashes: FxHashSet<H256> = recent_blocks
        .iter()
        .flat_map(|block| block.body.ommers.iter().map(BlockHeader::hash))
        .collect();
    let block_hash = block.hash();

    for (ommer, hash) in ommers.iter().zip(ommer_hashes) {
        if hash == block_hash {
            return Err(invalid_ommer(hash, "is the including block"));
        }
        if recent_hashes.contains(&hash) {
            return Err(invalid_ommer(hash, "is a canonical block"));
        }
        if recent_ommer_hashes.contains(&hash) {
            return Err(invalid_ommer(hash, "was already included"));
        }
        let age = header.number.saturating_sub(ommer.number);
        if !(1..=MAX_OMMER_DEPTH).contains(&age) {
            return Err(invalid_ommer(hash, "is too old"));
        }
        if !recent_hashes.contains(&ommer.parent_hash) {
            return Err(invalid_ommer(hash, "parent is not a recent canonical block"));
        }
        if ommer.parent_hash == header.parent_hash {
            return Err(invalid_ommer(hash, "is a sibling of the including block"));
        }
    }
    Ok(())
}

fn invalid_ommer(hash: H256, reason: &str) -> ChainError {
    InvalidBlockError::InvalidOmmer {
        hash,
        reason: reason.to_string(),
    }
    .into()
}

/// Checks the header commitments against the outcome of executing the body.
pub fn validate_execution_result(
    block: &Block,
    result: &BlockExecutionResult,
    state_root: H256,
) -> Result<(), ChainError> {
    let header = &block.header;
    validate_gas_used(header, result.block_gas_used)?;
    if compute_transactions_root(&block.body.transactions) != header.transactions_root {
        return Err(InvalidBlockError::TransactionsRootMismatch.into());
    }
    validate_receipts_root(header, &result.receipts)?;
    if logs_bloom(&result.receipts) != header.logs_bloom {
        return Err(InvalidBlockError::LogsBloomMismatch.into());
    }
    validate_state_root(header, state_root)?;
    if compute_ommers_hash(&block.body.ommers) != header.ommers_hash {
        return Err(InvalidBlockError::OmmersHashMismatch.into());
    }
    Ok(())
}

pub fn validate_gas_used(header: &BlockHeader, block_gas_used: u64) -> Result<(), ChainError> {
    if header.gas_used != block_gas_used {
        return Err(InvalidBlockError::GasUsedMismatch {
            expected: header.gas_used,
            got: block_gas_used,
        }
        .into());
    }
    Ok(())
}

pub fn validate_receipts_root(header: &BlockHeader, receipts: &[Receipt]) -> Result<(), ChainError> {
    if compute_receipts_root(receipts) != header.receipts_root {
        return Err(InvalidBlockError::ReceiptsRootMismatch.into());
    }
    Ok(())
}

pub fn validate_state_root(header: &BlockHeader, new_state_root: H256) -> Result<(), ChainError> {
    // Compare state root
    if new_state_root == header.state_root {
        Ok(())
    } else {
        Err(ChainError::InvalidBlock(
            InvalidBlockError::StateRootMismatch,
        ))
    }
}

/// Union of the receipt blooms.
pub fn logs_bloom(receipts: &[Receipt]) -> Bloom {
    receipts.iter().fold(Bloom::zero(), |mut bloom, receipt| {
        bloom.accrue_bloom(&receipt.bloom);
        bloom
    })
}
