use bytes::Bytes;
use ferrite_common::{U256, types::Log};
use serde::{Deserialize, Serialize};

/// Errors that halt a frame or reject a transaction.
///
/// Only [`VMError::TxValidation`] escapes a frame boundary; every other variant is
/// absorbed into an erred [`ContextResult`] for the frame that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VMError {
    #[error("Exceptional halt: {0}")]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error("Invalid transaction: {0}")]
    TxValidation(#[from] TxValidationError),
    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),
    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl VMError {
    /// Whether the error must abort the whole transaction instead of erring a frame.
    pub fn should_propagate(&self) -> bool {
        matches!(self, VMError::TxValidation(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, VMError::Internal(_) | VMError::State(_))
    }
}

/// Recoverable conditions. Each one forfeits the frame's remaining gas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ExceptionalHalt {
    #[error("Stack Underflow")]
    StackUnderflow,
    #[error("Stack Overflow")]
    StackOverflow,
    #[error("Invalid Jump")]
    InvalidJump,
    #[error("Invalid Opcode")]
    InvalidOpcode,
    #[error("Out Of Gas")]
    OutOfGas,
    #[error("Insufficient funds for value transfer")]
    InsufficientFunds,
    #[error("Call depth limit exceeded")]
    StackDepthLimit,
    #[error("Contract output too big")]
    ContractOutputTooBig,
    #[error("Address collision on contract creation")]
    AddressCollision,
}

/// Admission failures. Any of these makes the enclosing block invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TxValidationError {
    #[error("Intrinsic gas too low: intrinsic {intrinsic}, gas limit {gas_limit}")]
    IntrinsicGasTooLow { intrinsic: u64, gas_limit: u64 },
    #[error("Nonce is max")]
    NonceIsMax,
    #[error("Nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: u64, actual: u64 },
    #[error("Insufficient account funds")]
    InsufficientAccountFunds,
    #[error("Sender is not an EOA")]
    SenderNotEOA,
    #[error("Gas allowance exceeded: block gas limit {block_gas_limit}, needed {needed}")]
    GasAllowanceExceeded { block_gas_limit: u64, needed: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum InternalError {
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Arithmetic underflow")]
    Underflow,
    #[error("Type conversion failed")]
    TypeConversion,
    #[error("Slicing out of bounds")]
    Slicing,
    #[error("No call frame to return to")]
    CallFrame,
    #[error("{0}")]
    Custom(String),
}

/// Broken invariants of the world state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StateError {
    #[error("Insufficient funds to move {amount}")]
    InsufficientFunds { amount: U256 },
    #[error("Code already set")]
    CodeAlreadySet,
    #[error("No checkpoint to resolve")]
    NoCheckpoint,
    #[error("Balance overflow")]
    BalanceOverflow,
    #[error("Nonce overflow")]
    NonceOverflow,
}

/// What an opcode handler tells the interpreter loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeResult {
    Continue,
    Halt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxResult {
    Success,
    Revert(VMError),
}

impl TxResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TxResult::Success)
    }
}

/// Outcome of a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextResult {
    pub result: TxResult,
    pub gas_used: u64,
    pub output: Bytes,
}

impl ContextResult {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Outcome of a whole transaction after settlement.
///
/// `gas_used + gas_left + gas_refunded` always adds up to the transaction gas limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub result: TxResult,
    /// Gas charged to the sender, net of the refund.
    pub gas_used: u64,
    /// Gas the sender got back because execution did not spend it.
    pub gas_left: u64,
    /// Gas the sender got back from the refund counter.
    pub gas_refunded: u64,
    pub output: Bytes,
    pub logs: Vec<Log>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}
