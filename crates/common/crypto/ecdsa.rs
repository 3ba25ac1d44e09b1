use ethereum_types::Address;
use hex_literal::hex;
use secp256k1::{
    Message, PublicKey, SECP256K1, SecretKey,
    ecdsa::{RecoverableSignature, RecoveryId},
};

use crate::{CryptoError, keccak::keccak_hash};

/// Order of the secp256k1 curve.
pub const SECP256K1_N: [u8; 32] =
    hex!("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141");

// Upper bound for a canonical `s` value since Homestead (EIP-2).
pub const SECP256K1_N_HALF: [u8; 32] =
    hex!("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0");

pub fn signature_has_high_s(s: &[u8; 32]) -> bool {
    s[..] > SECP256K1_N_HALF[..]
}

/// Recovers the address whose key produced `signature` over `msg_hash`.
///
/// The signature is laid out as `r || s || recovery_id`, with the recovery id in `0..=3`.
/// No bound is placed on `s` here; callers enforcing the low-s rule check it themselves.
pub fn recover_address(msg_hash: &[u8; 32], signature: &[u8; 65]) -> Result<Address, CryptoError> {
    let recovery_id = RecoveryId::try_from(i32::from(signature[64]))
        .map_err(|_| CryptoError::InvalidRecoveryId(signature[64]))?;
    let signature = RecoverableSignature::from_compact(&signature[..64], recovery_id)?;
    let public = SECP256K1.recover_ecdsa(&Message::from_digest(*msg_hash), &signature)?;
    Ok(public_key_to_address(&public))
}

/// Produces a recoverable signature laid out as `r || s || recovery_id`.
pub fn sign_hash(secret_key: &[u8; 32], msg_hash: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
    let secret_key = SecretKey::from_slice(secret_key)?;
    let (recovery_id, compact) = SECP256K1
        .sign_ecdsa_recoverable(&Message::from_digest(*msg_hash), &secret_key)
        .serialize_compact();
    let mut signature = [0u8; 65];
    signature[..64].copy_from_slice(&compact);
    // recovery ids are always in 0..=3
    signature[64] = i32::from(recovery_id) as u8;
    Ok(signature)
}

pub fn address_from_secret_key(secret_key: &[u8; 32]) -> Result<Address, CryptoError> {
    let secret_key = SecretKey::from_slice(secret_key)?;
    Ok(public_key_to_address(&PublicKey::from_secret_key(
        SECP256K1,
        &secret_key,
    )))
}

fn public_key_to_address(public: &PublicKey) -> Address {
    let hash = keccak_hash(&public.serialize_uncompressed()[1..]);
    Address::from_slice(&hash[12..])
}
