use crate::errors::{ExceptionalHalt, InternalError, VMError};
use ferrite_common::{Address, H256, U256};

/// Lowest 20 bytes of a stack word.
pub fn word_to_address(word: U256) -> Address {
    Address::from_slice(&word.to_big_endian()[12..])
}

pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(H256::from(address).as_bytes())
}

/// Converts a memory `(size, offset)` pair. A zero size ignores the offset; anything
/// that does not fit a `usize` could never be paid for and runs out of gas.
pub fn size_offset_to_usize(size: U256, offset: U256) -> Result<(usize, usize), VMError> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    Ok((u256_to_usize(size)?, u256_to_usize(offset)?))
}

pub fn u256_to_usize(value: U256) -> Result<usize, VMError> {
    Ok(usize::try_from(value).map_err(|_| ExceptionalHalt::OutOfGas)?)
}

pub fn u256_to_u64(value: U256) -> Result<u64, VMError> {
    Ok(u64::try_from(value).map_err(|_| InternalError::TypeConversion)?)
}

/// Reads `size` bytes of `data` starting at `offset`, padding with zeros past its end.
pub fn read_padded(data: &[u8], offset: U256, size: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; size];
    let Ok(offset) = usize::try_from(offset) else {
        return buffer;
    };
    if let Some(available) = data.get(offset..) {
        let len = available.len().min(size);
        if let (Some(dst), Some(src)) = (buffer.get_mut(..len), available.get(..len)) {
            dst.copy_from_slice(src);
        }
    }
    buffer
}
