use ethereum_types::U256;
use ferrite_crypto::CryptoError;

#[derive(Debug, thiserror::Error)]
pub enum EcdsaError {
    #[error("Invalid signature v value {0}")]
    InvalidV(U256),
    #[error("Signature r value out of range")]
    InvalidR,
    #[error("Signature s value out of range")]
    InvalidS,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
