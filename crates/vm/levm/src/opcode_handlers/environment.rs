use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    utils::{address_to_word, read_padded, size_offset_to_usize, word_to_address},
    vm::VM,
};
use ferrite_common::U256;

// Environmental Information (13)
// Opcodes: ADDRESS, BALANCE, ORIGIN, CALLER, CALLVALUE, CALLDATALOAD, CALLDATASIZE,
// CALLDATACOPY, CODESIZE, CODECOPY, GASPRICE, EXTCODESIZE, EXTCODECOPY

impl<'a> VM<'a> {
    // ADDRESS operation
    pub fn op_address(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::ADDRESS)?;
        frame.stack.push(address_to_word(frame.to))?;
        Ok(OpcodeResult::Continue)
    }

    // BALANCE operation
    pub fn op_balance(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        self.current_call_frame
            .increase_consumed_gas(gas_cost::balance(fork))?;
        let address = word_to_address(self.current_call_frame.stack.pop1()?);
        let balance = self.db.get_account(address).balance;
        self.current_call_frame.stack.push(balance)?;
        Ok(OpcodeResult::Continue)
    }

    // ORIGIN operation
    pub fn op_origin(&mut self) -> Result<OpcodeResult, VMError> {
        let origin = self.env.origin;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::ORIGIN)?;
        frame.stack.push(address_to_word(origin))?;
        Ok(OpcodeResult::Continue)
    }

    // CALLER operation
    pub fn op_caller(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::CALLER)?;
        frame.stack.push(address_to_word(frame.msg_sender))?;
        Ok(OpcodeResult::Continue)
    }

    // CALLVALUE operation
    pub fn op_callvalue(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::CALLVALUE)?;
        frame.stack.push(frame.msg_value)?;
        Ok(OpcodeResult::Continue)
    }

    // CALLDATALOAD operation
    #[inline]
    pub fn op_calldataload(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::CALLDATALOAD)?;
        let offset = frame.stack.pop1()?;
        let word = read_padded(&frame.calldata, offset, 32);
        frame.stack.push(U256::from_big_endian(&word))?;
        Ok(OpcodeResult::Continue)
    }

    // CALLDATASIZE operation
    pub fn op_calldatasize(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::CALLDATASIZE)?;
        frame.stack.push(U256::from(frame.calldata.len()))?;
        Ok(OpcodeResult::Continue)
    }

    // CALLDATACOPY operation
    pub fn op_calldatacopy(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [dest_offset, calldata_offset, size] = frame.stack.pop()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let new_memory_size = calculate_memory_size(dest_offset, size)?;

        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::calldatacopy(
            new_memory_size,
            current_memory_size,
            size,
        )?)?;

        if size != 0 {
            let data = read_padded(&frame.calldata, calldata_offset, size);
            frame.memory.store_data(dest_offset, &data)?;
        }
        Ok(OpcodeResult::Continue)
    }

    // CODESIZE operation
    pub fn op_codesize(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::CODESIZE)?;
        frame.stack.push(U256::from(frame.bytecode.len()))?;
        Ok(OpcodeResult::Continue)
    }

    // CODECOPY operation
    pub fn op_codecopy(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [dest_offset, code_offset, size] = frame.stack.pop()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let new_memory_size = calculate_memory_size(dest_offset, size)?;

        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::codecopy(
            new_memory_size,
            current_memory_size,
            size,
        )?)?;

        if size != 0 {
            let code = read_padded(&frame.bytecode, code_offset, size);
            frame.memory.store_data(dest_offset, &code)?;
        }
        Ok(OpcodeResult::Continue)
    }

    // GASPRICE operation
    pub fn op_gasprice(&mut self) -> Result<OpcodeResult, VMError> {
        let gas_price = self.env.gas_price;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::GASPRICE)?;
        frame.stack.push(gas_price)?;
        Ok(OpcodeResult::Continue)
    }

    // EXTCODESIZE operation
    pub fn op_extcodesize(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        self.current_call_frame
            .increase_consumed_gas(gas_cost::extcodesize(fork))?;
        let address = word_to_address(self.current_call_frame.stack.pop1()?);
        let code_size = self
            .db
            .account(&address)
            .map(|account| account.code.len())
            .unwrap_or_default();
        self.current_call_frame.stack.push(U256::from(code_size))?;
        Ok(OpcodeResult::Continue)
    }

    // EXTCODECOPY operation
    pub fn op_extcodecopy(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let [address, dest_offset, code_offset, size] = self.current_call_frame.stack.pop()?;
        let address = word_to_address(address);
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let new_memory_size = calculate_memory_size(dest_offset, size)?;

        let current_memory_size = self.current_call_frame.memory.len();
        self.current_call_frame
            .increase_consumed_gas(gas_cost::extcodecopy(
                new_memory_size,
                current_memory_size,
                size,
                fork,
            )?)?;

        if size != 0 {
            let code = match self.db.account(&address) {
                Some(account) => read_padded(&account.code, code_offset, size),
                None => vec![0; size],
            };
            self.current_call_frame
                .memory
                .store_data(dest_offset, &code)?;
        }
        Ok(OpcodeResult::Continue)
    }
}
