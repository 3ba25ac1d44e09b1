pub mod ecdsa;
pub mod keccak;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
}
