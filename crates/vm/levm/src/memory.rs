use crate::{
    constants::{WORD_SIZE, WORD_SIZE_IN_BYTES_U64},
    errors::{ExceptionalHalt, InternalError, VMError},
};
use bytes::Bytes;
use ferrite_common::U256;

/// Byte-addressed memory of one frame. It only ever grows, one word at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    buffer: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Grows the memory to `new_memory_size` bytes, zero-filled. Never shrinks.
    #[inline]
    pub fn resize(&mut self, new_memory_size: usize) {
        if new_memory_size > self.buffer.len() {
            self.buffer.resize(new_memory_size, 0);
        }
    }

    /// Copies `size` bytes starting at `offset`, growing the memory to cover them.
    pub fn load_range(&mut self, offset: usize, size: usize) -> Result<Bytes, VMError> {
        if size == 0 {
            return Ok(Bytes::new());
        }
        self.resize(calculate_memory_size(offset, size)?);
        let end = offset.checked_add(size).ok_or(InternalError::Overflow)?;
        let slice = self.buffer.get(offset..end).ok_or(InternalError::Slicing)?;
        Ok(Bytes::copy_from_slice(slice))
    }

    pub fn load_word(&mut self, offset: usize) -> Result<U256, VMError> {
        let word = self.load_range(offset, WORD_SIZE)?;
        Ok(U256::from_big_endian(&word))
    }

    pub fn store_data(&mut self, offset: usize, data: &[u8]) -> Result<(), VMError> {
        if data.is_empty() {
            return Ok(());
        }
        self.resize(calculate_memory_size(offset, data.len())?);
        let end = offset
            .checked_add(data.len())
            .ok_or(InternalError::Overflow)?;
        self.buffer
            .get_mut(offset..end)
            .ok_or(InternalError::Slicing)?
            .copy_from_slice(data);
        Ok(())
    }

    pub fn store_word(&mut self, offset: usize, word: U256) -> Result<(), VMError> {
        self.store_data(offset, &word.to_big_endian())
    }
}

/// Memory size, in bytes, needed to access `size` bytes at `offset`. Accesses of zero
/// bytes need no memory at all.
pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, VMError> {
    if size == 0 {
        return Ok(0);
    }
    offset
        .checked_add(size)
        .and_then(|end| end.checked_next_multiple_of(WORD_SIZE))
        .ok_or(ExceptionalHalt::OutOfGas.into())
}

/// Gas to grow memory from `current_memory_size` to `new_memory_size` bytes.
pub fn expansion_cost(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    if new_memory_size <= current_memory_size {
        return Ok(0);
    }
    let new_cost = cost(new_memory_size)?;
    let current_cost = cost(current_memory_size)?;
    Ok(new_cost
        .checked_sub(current_cost)
        .ok_or(InternalError::Underflow)?)
}

/// `3 * words + words² / 512`.
fn cost(memory_size: usize) -> Result<u64, VMError> {
    let memory_size: u64 = memory_size
        .try_into()
        .map_err(|_| ExceptionalHalt::OutOfGas)?;
    let words = memory_size.div_ceil(WORD_SIZE_IN_BYTES_U64);
    let quadratic = words
        .checked_mul(words)
        .map(|square| square / 512)
        .ok_or(ExceptionalHalt::OutOfGas)?;
    let linear = words.checked_mul(3).ok_or(ExceptionalHalt::OutOfGas)?;
    Ok(quadratic
        .checked_add(linear)
        .ok_or(ExceptionalHalt::OutOfGas)?)
}
