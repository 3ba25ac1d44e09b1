use crate::{
    constants::LAST_AVAILABLE_BLOCK_LIMIT,
    errors::{OpcodeResult, VMError},
    gas_cost,
    utils::{address_to_word, u256_to_u64},
    vm::VM,
};
use ferrite_common::{H256, U256};

// Block Information (6)
// Opcodes: BLOCKHASH, COINBASE, TIMESTAMP, NUMBER, DIFFICULTY, GASLIMIT

impl<'a> VM<'a> {
    // BLOCKHASH operation
    pub fn op_blockhash(&mut self) -> Result<OpcodeResult, VMError> {
        self.current_call_frame
            .increase_consumed_gas(gas_cost::BLOCKHASH)?;
        let requested = self.current_call_frame.stack.pop1()?;

        let hash = match u256_to_u64(requested) {
            Ok(requested) => self.ancestor_hash(requested),
            Err(_) => H256::zero(),
        };
        self.current_call_frame
            .stack
            .push(U256::from_big_endian(hash.as_bytes()))?;
        Ok(OpcodeResult::Continue)
    }

    /// Hash of block `number` if it is one of the last 256 ancestors, zero otherwise.
    fn ancestor_hash(&self, number: u64) -> H256 {
        let current = self.env.block_number;
        let Some(age) = current.checked_sub(number).filter(|age| *age > 0) else {
            return H256::zero();
        };
        if age > LAST_AVAILABLE_BLOCK_LIMIT {
            return H256::zero();
        }
        let hashes = &self.env.block_hashes;
        usize::try_from(age)
            .ok()
            .and_then(|age| hashes.len().checked_sub(age))
            .and_then(|index| hashes.get(index))
            .copied()
            .unwrap_or_default()
    }

    // COINBASE operation
    pub fn op_coinbase(&mut self) -> Result<OpcodeResult, VMError> {
        let coinbase = self.env.coinbase;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::COINBASE)?;
        frame.stack.push(address_to_word(coinbase))?;
        Ok(OpcodeResult::Continue)
    }

    // TIMESTAMP operation
    pub fn op_timestamp(&mut self) -> Result<OpcodeResult, VMError> {
        let timestamp = self.env.timestamp;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::TIMESTAMP)?;
        frame.stack.push(U256::from(timestamp))?;
        Ok(OpcodeResult::Continue)
    }

    // NUMBER operation
    pub fn op_number(&mut self) -> Result<OpcodeResult, VMError> {
        let block_number = self.env.block_number;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::NUMBER)?;
        frame.stack.push(U256::from(block_number))?;
        Ok(OpcodeResult::Continue)
    }

    // DIFFICULTY operation
    pub fn op_difficulty(&mut self) -> Result<OpcodeResult, VMError> {
        let difficulty = self.env.difficulty;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::DIFFICULTY)?;
        frame.stack.push(difficulty)?;
        Ok(OpcodeResult::Continue)
    }

    // GASLIMIT operation
    pub fn op_gaslimit(&mut self) -> Result<OpcodeResult, VMError> {
        let block_gas_limit = self.env.block_gas_limit;
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::GASLIMIT)?;
        frame.stack.push(U256::from(block_gas_limit))?;
        Ok(OpcodeResult::Continue)
    }
}
