use ferrite_common::errors::EcdsaError;
use ferrite_levm::errors::{StateError, TxValidationError, VMError};

#[derive(Debug, thiserror::Error)]
pub enum EvmError {
    /// The transaction could not be admitted. The block carrying it is invalid.
    #[error("Invalid Transaction: {0}")]
    Transaction(#[from] TxValidationError),
    #[error("Couldn't recover sender of transaction {index}: {source}")]
    InvalidSignature { index: usize, source: EcdsaError },
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("LEVM error: {0}")]
    Levm(VMError),
    #[error("{0}")]
    Custom(String),
}

impl From<VMError> for EvmError {
    fn from(error: VMError) -> Self {
        match error {
            VMError::TxValidation(error) => EvmError::Transaction(error),
            VMError::State(error) => EvmError::State(error),
            other => EvmError::Levm(other),
        }
    }
}
