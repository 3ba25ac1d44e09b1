use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    vm::VM,
};
use ferrite_common::U256;

// Comparison and Bitwise Logic Operations (11)
// Opcodes: LT, GT, SLT, SGT, EQ, ISZERO, AND, OR, XOR, NOT, BYTE

impl<'a> VM<'a> {
    // LT operation
    #[inline]
    pub fn op_lt(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::LT)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(u256_from_bool(lhs < rhs))?;
        Ok(OpcodeResult::Continue)
    }

    // GT operation
    #[inline]
    pub fn op_gt(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::GT)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(u256_from_bool(lhs > rhs))?;
        Ok(OpcodeResult::Continue)
    }

    // SLT operation
    pub fn op_slt(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::SLT)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(u256_from_bool(signed_lt(lhs, rhs)))?;
        Ok(OpcodeResult::Continue)
    }

    // SGT operation
    pub fn op_sgt(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::SGT)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(u256_from_bool(signed_lt(rhs, lhs)))?;
        Ok(OpcodeResult::Continue)
    }

    // EQ operation
    #[inline]
    pub fn op_eq(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::EQ)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(u256_from_bool(lhs == rhs))?;
        Ok(OpcodeResult::Continue)
    }

    // ISZERO operation
    #[inline]
    pub fn op_iszero(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::ISZERO)?;
        let value = frame.stack.pop1()?;
        frame.stack.push(u256_from_bool(value.is_zero()))?;
        Ok(OpcodeResult::Continue)
    }

    // AND operation
    #[inline]
    pub fn op_and(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::AND)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(lhs & rhs)?;
        Ok(OpcodeResult::Continue)
    }

    // OR operation
    #[inline]
    pub fn op_or(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::OR)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(lhs | rhs)?;
        Ok(OpcodeResult::Continue)
    }

    // XOR operation
    #[inline]
    pub fn op_xor(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::XOR)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(lhs ^ rhs)?;
        Ok(OpcodeResult::Continue)
    }

    // NOT operation
    #[inline]
    pub fn op_not(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::NOT)?;
        let value = frame.stack.pop1()?;
        frame.stack.push(!value)?;
        Ok(OpcodeResult::Continue)
    }

    // BYTE operation
    // Index 0 is the most significant byte; anything past 31 yields zero.
    pub fn op_byte(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::BYTE)?;
        let [index, value] = frame.stack.pop()?;

        let byte = usize::try_from(index)
            .ok()
            .and_then(|index| 31usize.checked_sub(index))
            .map(|little_endian_index| value.byte(little_endian_index))
            .unwrap_or_default();
        frame.stack.push(U256::from(byte))?;
        Ok(OpcodeResult::Continue)
    }
}

#[inline]
fn u256_from_bool(value: bool) -> U256 {
    if value { U256::one() } else { U256::zero() }
}

/// Two's complement `lhs < rhs`.
fn signed_lt(lhs: U256, rhs: U256) -> bool {
    match (lhs.bit(255), rhs.bit(255)) {
        (true, false) => true,
        (false, true) => false,
        _ => lhs < rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_comparison_orders_negatives_first() {
        let minus_one = U256::MAX;
        let minus_two = U256::MAX - 1;
        assert!(signed_lt(minus_one, U256::zero()));
        assert!(!signed_lt(U256::one(), minus_one));
        assert!(signed_lt(minus_two, minus_one));
        assert!(!signed_lt(U256::one(), U256::one()));
    }
}
