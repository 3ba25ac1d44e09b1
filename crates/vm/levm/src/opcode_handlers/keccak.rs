use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    utils::size_offset_to_usize,
    vm::VM,
};
use ferrite_common::U256;
use ferrite_crypto::keccak::keccak_hash;

// KECCAK256 (1)
// Opcodes: KECCAK256

impl<'a> VM<'a> {
    pub fn op_keccak256(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, size] = frame.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        let new_memory_size = calculate_memory_size(offset, size)?;

        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::keccak256(
            new_memory_size,
            current_memory_size,
            size,
        )?)?;

        let data = frame.memory.load_range(offset, size)?;
        frame.stack.push(U256::from_big_endian(&keccak_hash(&data)))?;
        Ok(OpcodeResult::Continue)
    }
}
