use ferrite_common::{H256, U256};
use ferrite_levm::errors::StateError;
use ferrite_vm::EvmError;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid Block: {0}")]
    InvalidBlock(#[from] InvalidBlockError),
    #[error("Parent block not found")]
    ParentNotFound,
    #[error("EVM error: {0}")]
    EvmError(EvmError),
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("{0}")]
    Custom(String),
}

impl From<EvmError> for ChainError {
    /// Transactions that cannot be admitted make the whole block invalid.
    fn from(error: EvmError) -> Self {
        match error {
            EvmError::Transaction(error) => {
                ChainError::InvalidBlock(InvalidBlockError::InvalidTransaction(error.to_string()))
            }
            EvmError::InvalidSignature { index, source } => {
                ChainError::InvalidBlock(InvalidBlockError::InvalidSignature {
                    index,
                    reason: source.to_string(),
                })
            }
            other => ChainError::EvmError(other),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidBlockError {
    #[error("Gas used {gas_used} exceeds gas limit {gas_limit}")]
    GasUsedExceedsGasLimit { gas_used: u64, gas_limit: u64 },
    #[error("Block number {number} does not follow parent number {parent_number}")]
    InvalidBlockNumber { number: u64, parent_number: u64 },
    #[error("Timestamp {timestamp} is not after parent timestamp {parent_timestamp}")]
    TimestampNotIncreasing {
        timestamp: u64,
        parent_timestamp: u64,
    },
    #[error("Gas limit {gas_limit} is out of bounds for parent gas limit {parent_gas_limit}")]
    InvalidGasLimit {
        gas_limit: u64,
        parent_gas_limit: u64,
    },
    #[error("Extra data is {0} bytes long")]
    ExtraDataTooLong(usize),
    #[error("Difficulty mismatch: expected {expected}, got {got}")]
    DifficultyMismatch { expected: U256, got: U256 },
    #[error("Parent hash does not match the stored parent {0:#x}")]
    ParentHashMismatch(H256),
    #[error("Mix digest mismatch")]
    MixDigestMismatch,
    #[error("Proof of work result is above the difficulty target")]
    InvalidProofOfWork,
    #[error("Ommers hash mismatch")]
    OmmersHashMismatch,
    #[error("Too many ommers: {0}")]
    TooManyOmmers(usize),
    #[error("Duplicate ommer {0:#x}")]
    DuplicateOmmer(H256),
    #[error("Invalid ommer {hash:#x}: {reason}")]
    InvalidOmmer { hash: H256, reason: String },
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid signature on transaction {index}: {reason}")]
    InvalidSignature { index: usize, reason: String },
    #[error("Gas used mismatch: header says {expected}, execution used {got}")]
    GasUsedMismatch { expected: u64, got: u64 },
    #[error("Transactions root mismatch")]
    TransactionsRootMismatch,
    #[error("Receipts root mismatch")]
    ReceiptsRootMismatch,
    #[error("Logs bloom mismatch")]
    LogsBloomMismatch,
    #[error("World State Root does not match the one in the header after executing")]
    StateRootMismatch,
}
