use crate::{
    constants::WORD_SIZE_IN_BYTES_U64,
    errors::{ExceptionalHalt, InternalError, VMError},
    memory,
};
use ferrite_common::{U256, types::Fork};

// Opcodes cost
pub const STOP: u64 = 0;
pub const ADD: u64 = 3;
pub const MUL: u64 = 5;
pub const SUB: u64 = 3;
pub const DIV: u64 = 5;
pub const SDIV: u64 = 5;
pub const MOD: u64 = 5;
pub const SMOD: u64 = 5;
pub const ADDMOD: u64 = 8;
pub const MULMOD: u64 = 8;
pub const EXP_STATIC: u64 = 10;
pub const EXP_DYNAMIC_BASE: u64 = 10;
pub const EXP_DYNAMIC_BASE_SPURIOUS_DRAGON: u64 = 50;
pub const SIGNEXTEND: u64 = 5;
pub const LT: u64 = 3;
pub const GT: u64 = 3;
pub const SLT: u64 = 3;
pub const SGT: u64 = 3;
pub const EQ: u64 = 3;
pub const ISZERO: u64 = 3;
pub const AND: u64 = 3;
pub const OR: u64 = 3;
pub const XOR: u64 = 3;
pub const NOT: u64 = 3;
pub const BYTE: u64 = 3;
pub const KECCAK25_STATIC: u64 = 30;
pub const KECCAK25_DYNAMIC_BASE: u64 = 6;
pub const ADDRESS: u64 = 2;
pub const BALANCE_FRONTIER: u64 = 20;
pub const BALANCE_TANGERINE_WHISTLE: u64 = 400;
pub const ORIGIN: u64 = 2;
pub const CALLER: u64 = 2;
pub const CALLVALUE: u64 = 2;
pub const CALLDATALOAD: u64 = 3;
pub const CALLDATASIZE: u64 = 2;
pub const CALLDATACOPY_STATIC: u64 = 3;
pub const CALLDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const CODESIZE: u64 = 2;
pub const CODECOPY_STATIC: u64 = 3;
pub const CODECOPY_DYNAMIC_BASE: u64 = 3;
pub const GASPRICE: u64 = 2;
pub const EXTCODESIZE_FRONTIER: u64 = 20;
pub const EXTCODESIZE_TANGERINE_WHISTLE: u64 = 700;
pub const EXTCODECOPY_STATIC_FRONTIER: u64 = 20;
pub const EXTCODECOPY_STATIC_TANGERINE_WHISTLE: u64 = 700;
pub const EXTCODECOPY_DYNAMIC_BASE: u64 = 3;
pub const BLOCKHASH: u64 = 20;
pub const COINBASE: u64 = 2;
pub const TIMESTAMP: u64 = 2;
pub const NUMBER: u64 = 2;
pub const DIFFICULTY: u64 = 2;
pub const GASLIMIT: u64 = 2;
pub const POP: u64 = 2;
pub const MLOAD_STATIC: u64 = 3;
pub const MSTORE_STATIC: u64 = 3;
pub const MSTORE8_STATIC: u64 = 3;
pub const SLOAD_FRONTIER: u64 = 50;
pub const SLOAD_TANGERINE_WHISTLE: u64 = 200;
pub const SSTORE_SET: u64 = 20000;
pub const SSTORE_RESET: u64 = 5000;
pub const SSTORE_CLEAR_REFUND: u64 = 15000;
pub const JUMP: u64 = 8;
pub const JUMPI: u64 = 10;
pub const PC: u64 = 2;
pub const MSIZE: u64 = 2;
pub const GAS: u64 = 2;
pub const JUMPDEST: u64 = 1;
pub const PUSHN: u64 = 3;
pub const DUPN: u64 = 3;
pub const SWAPN: u64 = 3;
pub const LOGN_STATIC: u64 = 375;
pub const LOGN_DYNAMIC_BASE: u64 = 375;
pub const LOGN_DYNAMIC_BYTE_BASE: u64 = 8;
pub const CREATE_BASE_COST: u64 = 32000;
pub const CODE_DEPOSIT_COST: u64 = 200;
pub const CALL_FRONTIER: u64 = 40;
pub const CALL_TANGERINE_WHISTLE: u64 = 700;
pub const CALL_POSITIVE_VALUE: u64 = 9000;
pub const CALL_POSITIVE_VALUE_STIPEND: u64 = 2300;
pub const CALL_TO_EMPTY_ACCOUNT: u64 = 25000;
pub const RETURN: u64 = 0;
pub const SELFDESTRUCT_FRONTIER: u64 = 0;
pub const SELFDESTRUCT_TANGERINE_WHISTLE: u64 = 5000;
pub const SELFDESTRUCT_NEW_ACCOUNT: u64 = 25000;
pub const SELFDESTRUCT_REFUND: u64 = 24000;

// Transaction costs
pub const TX_BASE_COST: u64 = 21000;
pub const TX_DATA_COST_PER_ZERO: u64 = 4;
pub const TX_DATA_COST_PER_NON_ZERO: u64 = 68;
pub const TX_CREATE_COST: u64 = 32000;

// Precompiles
pub const ECRECOVER_COST: u64 = 3000;
pub const SHA2_256_STATIC_COST: u64 = 60;
pub const SHA2_256_DYNAMIC_BASE: u64 = 12;
pub const RIPEMD_160_STATIC_COST: u64 = 600;
pub const RIPEMD_160_DYNAMIC_BASE: u64 = 120;
pub const IDENTITY_STATIC_COST: u64 = 15;
pub const IDENTITY_DYNAMIC_BASE: u64 = 3;

fn words(size: usize) -> Result<u64, VMError> {
    let size: u64 = size.try_into().map_err(|_| ExceptionalHalt::OutOfGas)?;
    Ok(size.div_ceil(WORD_SIZE_IN_BYTES_U64))
}

fn checked(value: Option<u64>) -> Result<u64, VMError> {
    Ok(value.ok_or(ExceptionalHalt::OutOfGas)?)
}

/// `static_cost + dynamic_base * words(size)` plus the memory expansion.
fn memory_access_cost(
    new_memory_size: usize,
    current_memory_size: usize,
    static_cost: u64,
    dynamic_base: u64,
    size: usize,
) -> Result<u64, VMError> {
    let dynamic_cost = checked(dynamic_base.checked_mul(words(size)?))?;
    let expansion = memory::expansion_cost(new_memory_size, current_memory_size)?;
    checked(
        static_cost
            .checked_add(dynamic_cost)
            .and_then(|cost| cost.checked_add(expansion)),
    )
}

pub fn exp(exponent: U256, fork: Fork) -> Result<u64, VMError> {
    let exponent_byte_size: u64 = exponent
        .bits()
        .div_ceil(8)
        .try_into()
        .map_err(|_| InternalError::TypeConversion)?;
    let per_byte = if fork >= Fork::SpuriousDragon {
        EXP_DYNAMIC_BASE_SPURIOUS_DRAGON
    } else {
        EXP_DYNAMIC_BASE
    };
    checked(
        per_byte
            .checked_mul(exponent_byte_size)
            .and_then(|cost| cost.checked_add(EXP_STATIC)),
    )
}

pub fn keccak256(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    memory_access_cost(
        new_memory_size,
        current_memory_size,
        KECCAK25_STATIC,
        KECCAK25_DYNAMIC_BASE,
        size,
    )
}

pub fn calldatacopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    memory_access_cost(
        new_memory_size,
        current_memory_size,
        CALLDATACOPY_STATIC,
        CALLDATACOPY_DYNAMIC_BASE,
        size,
    )
}

pub fn codecopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    memory_access_cost(
        new_memory_size,
        current_memory_size,
        CODECOPY_STATIC,
        CODECOPY_DYNAMIC_BASE,
        size,
    )
}

pub fn extcodecopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    fork: Fork,
) -> Result<u64, VMError> {
    let static_cost = if fork >= Fork::TangerineWhistle {
        EXTCODECOPY_STATIC_TANGERINE_WHISTLE
    } else {
        EXTCODECOPY_STATIC_FRONTIER
    };
    memory_access_cost(
        new_memory_size,
        current_memory_size,
        static_cost,
        EXTCODECOPY_DYNAMIC_BASE,
        size,
    )
}

pub fn mload(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory_access_cost(new_memory_size, current_memory_size, MLOAD_STATIC, 0, 0)
}

pub fn mstore(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory_access_cost(new_memory_size, current_memory_size, MSTORE_STATIC, 0, 0)
}

pub fn mstore8(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory_access_cost(new_memory_size, current_memory_size, MSTORE8_STATIC, 0, 0)
}

pub fn return_op(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory_access_cost(new_memory_size, current_memory_size, RETURN, 0, 0)
}

pub fn log(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    number_of_topics: u8,
) -> Result<u64, VMError> {
    let size: u64 = size.try_into().map_err(|_| ExceptionalHalt::OutOfGas)?;
    let topics_cost = LOGN_DYNAMIC_BASE
        .checked_mul(u64::from(number_of_topics))
        .ok_or(InternalError::Overflow)?;
    let bytes_cost = checked(LOGN_DYNAMIC_BYTE_BASE.checked_mul(size))?;
    let expansion = memory::expansion_cost(new_memory_size, current_memory_size)?;
    checked(
        LOGN_STATIC
            .checked_add(topics_cost)
            .and_then(|cost| cost.checked_add(bytes_cost))
            .and_then(|cost| cost.checked_add(expansion)),
    )
}

pub fn create(new_memory_size: usize, current_memory_size: usize) -> Result<u64, VMError> {
    memory_access_cost(
        new_memory_size,
        current_memory_size,
        CREATE_BASE_COST,
        0,
        0,
    )
}

pub fn balance(fork: Fork) -> u64 {
    if fork >= Fork::TangerineWhistle {
        BALANCE_TANGERINE_WHISTLE
    } else {
        BALANCE_FRONTIER
    }
}

pub fn extcodesize(fork: Fork) -> u64 {
    if fork >= Fork::TangerineWhistle {
        EXTCODESIZE_TANGERINE_WHISTLE
    } else {
        EXTCODESIZE_FRONTIER
    }
}

pub fn sload(fork: Fork) -> u64 {
    if fork >= Fork::TangerineWhistle {
        SLOAD_TANGERINE_WHISTLE
    } else {
        SLOAD_FRONTIER
    }
}

/// Setting a zero slot costs [`SSTORE_SET`]; any other write costs [`SSTORE_RESET`].
pub fn sstore(current_value: U256, new_value: U256) -> u64 {
    if current_value.is_zero() && !new_value.is_zero() {
        SSTORE_SET
    } else {
        SSTORE_RESET
    }
}

/// Base cost of the CALL family before value, account and forwarded gas.
pub fn call_base(fork: Fork) -> u64 {
    if fork >= Fork::TangerineWhistle {
        CALL_TANGERINE_WHISTLE
    } else {
        CALL_FRONTIER
    }
}

pub fn selfdestruct(fork: Fork, creates_beneficiary: bool) -> u64 {
    let base = if fork >= Fork::TangerineWhistle {
        SELFDESTRUCT_TANGERINE_WHISTLE
    } else {
        SELFDESTRUCT_FRONTIER
    };
    if creates_beneficiary && fork >= Fork::TangerineWhistle {
        base.saturating_add(SELFDESTRUCT_NEW_ACCOUNT)
    } else {
        base
    }
}

/// All but one 64th of `gas` (EIP-150).
pub fn max_message_call_gas(gas: u64) -> u64 {
    gas.saturating_sub(gas / 64)
}

/// Gas charged to the caller of a message call and gas handed to the callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCallGas {
    pub cost: u64,
    pub gas_limit: u64,
}

/// Splits a CALL-family request of `gas` into what the caller pays and what the callee
/// receives.
///
/// Before TangerineWhistle the full request is forwarded. From TangerineWhistle on the
/// request is capped to all but one 64th of what the caller has left after paying for
/// memory and `extra_gas`. A value transfer adds the stipend to the callee's allowance
/// for free.
pub fn message_call_gas(
    value: U256,
    gas: U256,
    gas_left: u64,
    memory_cost: u64,
    extra_gas: u64,
    fork: Fork,
) -> Result<MessageCallGas, VMError> {
    let stipend = if value.is_zero() {
        0
    } else {
        CALL_POSITIVE_VALUE_STIPEND
    };
    let requested = |gas: U256| -> Result<u64, VMError> {
        Ok(u64::try_from(gas).map_err(|_| ExceptionalHalt::OutOfGas)?)
    };

    let forwarded = if fork < Fork::TangerineWhistle {
        requested(gas)?
    } else {
        let overhead = checked(extra_gas.checked_add(memory_cost))?;
        match gas_left.checked_sub(overhead) {
            Some(available) => {
                let cap = max_message_call_gas(available);
                if gas > U256::from(cap) {
                    cap
                } else {
                    requested(gas)?
                }
            }
            None => requested(gas)?,
        }
    };

    Ok(MessageCallGas {
        cost: checked(forwarded.checked_add(extra_gas))?,
        gas_limit: checked(forwarded.checked_add(stipend))?,
    })
}

/// Intrinsic gas of a transaction: base cost, calldata and, from Homestead, the
/// creation surcharge.
pub fn intrinsic_gas(data: &[u8], is_create: bool, fork: Fork) -> Result<u64, VMError> {
    let mut cost = TX_BASE_COST;
    for byte in data {
        let byte_cost = if *byte == 0 {
            TX_DATA_COST_PER_ZERO
        } else {
            TX_DATA_COST_PER_NON_ZERO
        };
        cost = cost.checked_add(byte_cost).ok_or(InternalError::Overflow)?;
    }
    if is_create && fork >= Fork::Homestead {
        cost = cost
            .checked_add(TX_CREATE_COST)
            .ok_or(InternalError::Overflow)?;
    }
    Ok(cost)
}

fn precompile_cost(data_size: usize, static_cost: u64, dynamic_base: u64) -> Result<u64, VMError> {
    checked(
        dynamic_base
            .checked_mul(words(data_size)?)
            .and_then(|cost| cost.checked_add(static_cost)),
    )
}

pub fn sha2_256(data_size: usize) -> Result<u64, VMError> {
    precompile_cost(data_size, SHA2_256_STATIC_COST, SHA2_256_DYNAMIC_BASE)
}

pub fn ripemd_160(data_size: usize) -> Result<u64, VMError> {
    precompile_cost(data_size, RIPEMD_160_STATIC_COST, RIPEMD_160_DYNAMIC_BASE)
}

pub fn identity(data_size: usize) -> Result<u64, VMError> {
    precompile_cost(data_size, IDENTITY_STATIC_COST, IDENTITY_DYNAMIC_BASE)
}
