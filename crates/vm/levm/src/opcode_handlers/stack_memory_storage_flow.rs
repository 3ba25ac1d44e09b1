use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    utils::u256_to_usize,
    vm::VM,
};
use ferrite_common::U256;

// Stack, Memory, Storage and Flow Operations (12)
// Opcodes: POP, MLOAD, MSTORE, MSTORE8, SLOAD, SSTORE, JUMP, JUMPI, PC, MSIZE, GAS, JUMPDEST

impl<'a> VM<'a> {
    // POP operation
    #[inline]
    pub fn op_pop(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::POP)?;
        frame.stack.pop1()?;
        Ok(OpcodeResult::Continue)
    }

    // MLOAD operation
    pub fn op_mload(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let offset = u256_to_usize(frame.stack.pop1()?)?;
        let new_memory_size = calculate_memory_size(offset, 32)?;
        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::mload(new_memory_size, current_memory_size)?)?;

        let word = frame.memory.load_word(offset)?;
        frame.stack.push(word)?;
        Ok(OpcodeResult::Continue)
    }

    // MSTORE operation
    pub fn op_mstore(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, value] = frame.stack.pop()?;
        let offset = u256_to_usize(offset)?;
        let new_memory_size = calculate_memory_size(offset, 32)?;
        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::mstore(new_memory_size, current_memory_size)?)?;

        frame.memory.store_word(offset, value)?;
        Ok(OpcodeResult::Continue)
    }

    // MSTORE8 operation
    pub fn op_mstore8(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, value] = frame.stack.pop()?;
        let offset = u256_to_usize(offset)?;
        let new_memory_size = calculate_memory_size(offset, 1)?;
        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::mstore8(new_memory_size, current_memory_size)?)?;

        frame.memory.store_data(offset, &[value.byte(0)])?;
        Ok(OpcodeResult::Continue)
    }

    // SLOAD operation
    pub fn op_sload(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        self.current_call_frame
            .increase_consumed_gas(gas_cost::sload(fork))?;
        let key = self.current_call_frame.stack.pop1()?;
        let value = self.db.get_storage(self.current_call_frame.to, key);
        self.current_call_frame.stack.push(value)?;
        Ok(OpcodeResult::Continue)
    }

    // SSTORE operation
    pub fn op_sstore(&mut self) -> Result<OpcodeResult, VMError> {
        let [key, new_value] = self.current_call_frame.stack.pop()?;
        let address = self.current_call_frame.to;
        let current_value = self.db.get_storage(address, key);

        self.current_call_frame
            .increase_consumed_gas(gas_cost::sstore(current_value, new_value))?;

        if !current_value.is_zero() && new_value.is_zero() {
            self.substate.refunded_gas = self
                .substate
                .refunded_gas
                .saturating_add(gas_cost::SSTORE_CLEAR_REFUND);
        }
        self.db.set_storage(address, key, new_value);
        Ok(OpcodeResult::Continue)
    }

    // JUMP operation
    pub fn op_jump(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::JUMP)?;
        let target = frame.stack.pop1()?;
        self.jump(target)?;
        Ok(OpcodeResult::Continue)
    }

    // JUMPI operation
    pub fn op_jumpi(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::JUMPI)?;
        let [target, condition] = frame.stack.pop()?;
        if !condition.is_zero() {
            self.jump(target)?;
        }
        Ok(OpcodeResult::Continue)
    }

    /// Moves `pc` to `target`, which must be a `JUMPDEST` outside push data.
    fn jump(&mut self, target: U256) -> Result<(), VMError> {
        let frame = &mut self.current_call_frame;
        let target = usize::try_from(target)
            .ok()
            .filter(|target| frame.is_valid_jump_target(*target))
            .ok_or(ExceptionalHalt::InvalidJump)?;
        frame.pc = target;
        Ok(())
    }

    // PC operation
    pub fn op_pc(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::PC)?;
        // pc already points past this instruction
        let pc = frame.pc.saturating_sub(1);
        frame.stack.push(U256::from(pc))?;
        Ok(OpcodeResult::Continue)
    }

    // MSIZE operation
    pub fn op_msize(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::MSIZE)?;
        frame.stack.push(U256::from(frame.memory.len()))?;
        Ok(OpcodeResult::Continue)
    }

    // GAS operation
    pub fn op_gas(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::GAS)?;
        frame.stack.push(U256::from(frame.gas_remaining))?;
        Ok(OpcodeResult::Continue)
    }

    // JUMPDEST operation
    pub fn op_jumpdest(&mut self) -> Result<OpcodeResult, VMError> {
        self.current_call_frame
            .increase_consumed_gas(gas_cost::JUMPDEST)?;
        Ok(OpcodeResult::Continue)
    }
}
