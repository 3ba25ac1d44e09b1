use crate::{
    errors::{InternalError, OpcodeResult, VMError},
    gas_cost,
    utils::read_padded,
    vm::VM,
};
use ferrite_common::U256;

// Push Operations
// Opcodes: PUSH1 ... PUSH32

impl<'a> VM<'a> {
    // PUSHn operation
    // Immediate bytes that run past the end of the code read as zero.
    #[inline]
    pub fn op_push<const N: usize>(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::PUSHN)?;

        let immediate = read_padded(&frame.bytecode, U256::from(frame.pc), N);
        frame.stack.push(U256::from_big_endian(&immediate))?;

        frame.pc = frame.pc.checked_add(N).ok_or(InternalError::Overflow)?;
        Ok(OpcodeResult::Continue)
    }
}
