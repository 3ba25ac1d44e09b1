use crate::{
    errors::{InternalError, OpcodeResult, VMError},
    gas_cost,
    vm::VM,
};
use ferrite_common::{U256, U512};

// Arithmetic Operations (11)
// Opcodes: ADD, SUB, MUL, DIV, SDIV, MOD, SMOD, ADDMOD, MULMOD, EXP, SIGNEXTEND

impl<'a> VM<'a> {
    // ADD operation
    #[inline]
    pub fn op_add(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::ADD)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(lhs.overflowing_add(rhs).0)?;
        Ok(OpcodeResult::Continue)
    }

    // SUB operation
    #[inline]
    pub fn op_sub(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::SUB)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(lhs.overflowing_sub(rhs).0)?;
        Ok(OpcodeResult::Continue)
    }

    // MUL operation
    #[inline]
    pub fn op_mul(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::MUL)?;
        let [lhs, rhs] = frame.stack.pop()?;
        frame.stack.push(lhs.overflowing_mul(rhs).0)?;
        Ok(OpcodeResult::Continue)
    }

    // DIV operation
    pub fn op_div(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::DIV)?;
        let [dividend, divisor] = frame.stack.pop()?;
        frame
            .stack
            .push(dividend.checked_div(divisor).unwrap_or_default())?;
        Ok(OpcodeResult::Continue)
    }

    // SDIV operation
    pub fn op_sdiv(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::SDIV)?;
        let [dividend, divisor] = frame.stack.pop()?;

        let quotient = match abs(dividend).checked_div(abs(divisor)) {
            Some(magnitude) if is_negative(dividend) != is_negative(divisor) => negate(magnitude),
            Some(magnitude) => magnitude,
            None => U256::zero(),
        };
        frame.stack.push(quotient)?;
        Ok(OpcodeResult::Continue)
    }

    // MOD operation
    pub fn op_mod(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::MOD)?;
        let [dividend, divisor] = frame.stack.pop()?;
        frame
            .stack
            .push(dividend.checked_rem(divisor).unwrap_or_default())?;
        Ok(OpcodeResult::Continue)
    }

    // SMOD operation
    // The result takes the sign of the dividend.
    pub fn op_smod(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::SMOD)?;
        let [dividend, divisor] = frame.stack.pop()?;

        let remainder = match abs(dividend).checked_rem(abs(divisor)) {
            Some(magnitude) if is_negative(dividend) => negate(magnitude),
            Some(magnitude) => magnitude,
            None => U256::zero(),
        };
        frame.stack.push(remainder)?;
        Ok(OpcodeResult::Continue)
    }

    // ADDMOD operation
    pub fn op_addmod(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::ADDMOD)?;
        let [augend, addend, modulus] = frame.stack.pop()?;

        if modulus.is_zero() {
            frame.stack.push_zero()?;
            return Ok(OpcodeResult::Continue);
        }

        #[allow(
            clippy::arithmetic_side_effects,
            reason = "the sum of two U256 fits a U512 and the modulus is not zero"
        )]
        let wide = (U512::from(augend) + U512::from(addend)) % U512::from(modulus);
        let result = U256::try_from(wide).map_err(|_| InternalError::TypeConversion)?;
        frame.stack.push(result)?;
        Ok(OpcodeResult::Continue)
    }

    // MULMOD operation
    pub fn op_mulmod(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::MULMOD)?;
        let [multiplicand, multiplier, modulus] = frame.stack.pop()?;

        if modulus.is_zero() {
            frame.stack.push_zero()?;
            return Ok(OpcodeResult::Continue);
        }

        #[allow(clippy::arithmetic_side_effects, reason = "modulus is not zero")]
        let wide = multiplicand.full_mul(multiplier) % U512::from(modulus);
        let result = U256::try_from(wide).map_err(|_| InternalError::TypeConversion)?;
        frame.stack.push(result)?;
        Ok(OpcodeResult::Continue)
    }

    // EXP operation
    // Gas depends on the byte length of the exponent, so operands come off first.
    pub fn op_exp(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let frame = &mut self.current_call_frame;
        let [base, exponent] = frame.stack.pop()?;
        frame.increase_consumed_gas(gas_cost::exp(exponent, fork)?)?;
        frame.stack.push(base.overflowing_pow(exponent).0)?;
        Ok(OpcodeResult::Continue)
    }

    // SIGNEXTEND operation
    pub fn op_signextend(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::SIGNEXTEND)?;
        let [byte_index, value] = frame.stack.pop()?;

        if byte_index >= U256::from(31) {
            frame.stack.push(value)?;
            return Ok(OpcodeResult::Continue);
        }

        let sign_bit = byte_index
            .low_u64()
            .saturating_mul(8)
            .saturating_add(7);
        let sign_bit = usize::try_from(sign_bit).map_err(|_| InternalError::TypeConversion)?;

        #[allow(clippy::arithmetic_side_effects, reason = "sign_bit is at most 247")]
        let mask = (U256::one() << sign_bit) - U256::one();
        let extended = if value.bit(sign_bit) {
            value | !mask
        } else {
            value & mask
        };
        frame.stack.push(extended)?;
        Ok(OpcodeResult::Continue)
    }
}

/// Two's complement sign bit.
fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Negates a number in two's complement
fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_helpers() {
        let minus_one = U256::MAX;
        assert!(is_negative(minus_one));
        assert_eq!(negate(minus_one), U256::one());
        assert_eq!(abs(negate(U256::from(5))), U256::from(5));
        assert_eq!(abs(U256::from(5)), U256::from(5));
        // The most negative value is its own negation.
        let min = U256::one() << 255;
        assert_eq!(negate(min), min);
    }
}
