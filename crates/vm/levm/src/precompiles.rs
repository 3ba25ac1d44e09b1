use crate::{
    constants::{ECRECOVER_ADDRESS, IDENTITY_ADDRESS, RIPEMD_160_ADDRESS, SHA2_256_ADDRESS},
    errors::{ExceptionalHalt, InternalError, VMError},
    gas_cost::{self, ECRECOVER_COST},
    utils::read_padded,
};
use bytes::Bytes;
use ferrite_common::{Address, H256, U256};
use ferrite_crypto::ecdsa::{SECP256K1_N, recover_address};
use lazy_static::lazy_static;
use ripemd::Ripemd160;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

/// A native contract: consumes gas from the budget and returns its output.
pub type PrecompileFn = fn(&Bytes, &mut u64) -> Result<Bytes, VMError>;

/// Address to native implementation mapping. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct PrecompileTable {
    entries: FxHashMap<Address, PrecompileFn>,
}

impl PrecompileTable {
    /// The four precompiles available from Frontier through SpuriousDragon.
    pub fn frontier() -> Self {
        let entries: [(Address, PrecompileFn); 4] = [
            (ECRECOVER_ADDRESS, ecrecover),
            (SHA2_256_ADDRESS, sha2_256),
            (RIPEMD_160_ADDRESS, ripemd_160),
            (IDENTITY_ADDRESS, identity),
        ];
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn is_precompile(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<PrecompileFn> {
        self.entries.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    pub static ref PRECOMPILES: PrecompileTable = PrecompileTable::frontier();
}

/// Runs the precompile at `address`, charging `gas_remaining`.
pub fn execute_precompile(
    table: &PrecompileTable,
    address: Address,
    calldata: &Bytes,
    gas_remaining: &mut u64,
) -> Result<Bytes, VMError> {
    let precompile = table
        .get(&address)
        .ok_or_else(|| InternalError::Custom(format!("No precompile at {address:#x}")))?;
    precompile(calldata, gas_remaining)
}

fn increase_precompile_consumed_gas(gas_cost: u64, gas_remaining: &mut u64) -> Result<(), VMError> {
    *gas_remaining = gas_remaining
        .checked_sub(gas_cost)
        .ok_or(ExceptionalHalt::OutOfGas)?;
    Ok(())
}

fn word_at(input: &[u8], index: usize) -> Result<[u8; 32], VMError> {
    let start = index.checked_mul(32).ok_or(InternalError::Overflow)?;
    let end = start.checked_add(32).ok_or(InternalError::Overflow)?;
    let word = input.get(start..end).ok_or(InternalError::Slicing)?;
    Ok(word.try_into().map_err(|_| InternalError::TypeConversion)?)
}

/// ECDSA public key recovery.
///
/// Input is `hash || v || r || s`, zero-padded to 128 bytes. Malformed signatures are not
/// an error: they return empty output and still cost the full price.
pub fn ecrecover(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    increase_precompile_consumed_gas(ECRECOVER_COST, gas_remaining)?;

    let input = read_padded(calldata, U256::zero(), 128);
    let hash = word_at(&input, 0)?;
    let v = U256::from_big_endian(&word_at(&input, 1)?);
    let r = word_at(&input, 2)?;
    let s = word_at(&input, 3)?;

    let recovery_id = if v == U256::from(27) {
        0u8
    } else if v == U256::from(28) {
        1u8
    } else {
        return Ok(Bytes::new());
    };

    let order = U256::from_big_endian(&SECP256K1_N);
    let in_range = |scalar: &[u8; 32]| {
        let scalar = U256::from_big_endian(scalar);
        !scalar.is_zero() && scalar < order
    };
    if !in_range(&r) || !in_range(&s) {
        return Ok(Bytes::new());
    }

    let signature: [u8; 65] = [r.as_slice(), s.as_slice(), &[recovery_id]]
        .concat()
        .try_into()
        .map_err(|_| InternalError::TypeConversion)?;

    match recover_address(&hash, &signature) {
        Ok(address) => Ok(Bytes::copy_from_slice(H256::from(address).as_bytes())),
        Err(_) => Ok(Bytes::new()),
    }
}

pub fn sha2_256(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    increase_precompile_consumed_gas(gas_cost::sha2_256(calldata.len())?, gas_remaining)?;
    Ok(Bytes::copy_from_slice(&Sha256::digest(calldata)))
}

/// RIPEMD-160 digest, left-padded to a full word.
pub fn ripemd_160(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    increase_precompile_consumed_gas(gas_cost::ripemd_160(calldata.len())?, gas_remaining)?;
    let mut output = vec![0u8; 12];
    output.extend_from_slice(&Ripemd160::digest(calldata));
    Ok(Bytes::from(output))
}

pub fn identity(calldata: &Bytes, gas_remaining: &mut u64) -> Result<Bytes, VMError> {
    increase_precompile_consumed_gas(gas_cost::identity(calldata.len())?, gas_remaining)?;
    Ok(calldata.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_crypto::{ecdsa::sign_hash, keccak::keccak_hash};
    use hex_literal::hex;

    #[test]
    fn table_holds_the_four_frontier_precompiles() {
        assert_eq!(PRECOMPILES.len(), 4);
        assert!(PRECOMPILES.is_precompile(&IDENTITY_ADDRESS));
        assert!(!PRECOMPILES.is_precompile(&Address::from_low_u64_be(5)));
    }

    #[test]
    fn sha256_of_empty_input() {
        let mut gas = 100;
        let output = sha2_256(&Bytes::new(), &mut gas).unwrap();
        assert_eq!(
            output.as_ref(),
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(gas, 40);
    }

    #[test]
    fn ripemd_output_is_left_padded() {
        let mut gas = 1000;
        let output = ripemd_160(&Bytes::new(), &mut gas).unwrap();
        assert_eq!(
            output.as_ref(),
            hex!("0000000000000000000000009c1185a5c5e9fc54612808977ee8f548b2258d31")
        );
        assert_eq!(gas, 400);
    }

    #[test]
    fn identity_runs_out_of_gas() {
        let mut gas = 17;
        let input = Bytes::from_static(&[1; 33]);
        assert_eq!(
            identity(&input, &mut gas),
            Err(VMError::ExceptionalHalt(ExceptionalHalt::OutOfGas))
        );
    }

    #[test]
    fn ecrecover_recovers_signer() {
        let secret_key = [0x42u8; 32];
        let hash = keccak_hash(b"ferrite");
        let signature = sign_hash(&secret_key, &hash).unwrap();
        let signer = ferrite_crypto::ecdsa::address_from_secret_key(&secret_key).unwrap();

        let mut input = Vec::with_capacity(128);
        input.extend_from_slice(&hash);
        input.extend_from_slice(&[0u8; 31]);
        input.push(signature[64] + 27);
        input.extend_from_slice(&signature[..64]);

        let mut gas = 3000;
        let output = ecrecover(&Bytes::from(input), &mut gas).unwrap();
        assert_eq!(gas, 0);
        assert_eq!(output.as_ref(), H256::from(signer).as_bytes());
    }

    #[test]
    fn ecrecover_rejects_bad_v_with_empty_output() {
        let mut input = vec![0u8; 128];
        input[63] = 29;
        let mut gas = 5000;
        let output = ecrecover(&Bytes::from(input), &mut gas).unwrap();
        assert!(output.is_empty());
        assert_eq!(gas, 2000);
    }
}
