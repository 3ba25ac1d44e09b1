use crate::{
    errors::{ContextResult, InternalError, TxValidationError, VMError},
    gas_cost,
    hooks::hook::Hook,
    vm::VM,
};
use ferrite_common::{Address, U256, types::Fork};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Admission and settlement of a proof-of-work transaction.
///
/// Before execution it checks the sender can run the transaction at all and buys its
/// gas. Afterwards it applies the refund, pays the miner and removes the accounts the
/// transaction destroyed or left empty.
pub struct DefaultHook;

impl Hook for DefaultHook {
    fn prepare_execution(&mut self, vm: &mut VM<'_>) -> Result<(), VMError> {
        let fork = vm.env.config.fork;
        let sender_address = vm.env.origin;
        let sender = vm.db.get_account(sender_address);

        // (1) INTRINSIC_GAS_TOO_LOW
        let intrinsic = gas_cost::intrinsic_gas(&vm.tx.data, vm.tx.is_create(), fork)?;
        if intrinsic > vm.tx.gas {
            return Err(TxValidationError::IntrinsicGasTooLow {
                intrinsic,
                gas_limit: vm.tx.gas,
            }
            .into());
        }

        // (2) NONCE_IS_MAX
        if vm.tx.nonce == u64::MAX {
            return Err(TxValidationError::NonceIsMax.into());
        }

        // (3) NONCE_MISMATCH
        if sender.nonce != vm.tx.nonce {
            return Err(TxValidationError::NonceMismatch {
                expected: sender.nonce,
                actual: vm.tx.nonce,
            }
            .into());
        }

        // (4) INSUFFICIENT_ACCOUNT_FUNDS
        let gas_cost = gas_fee(vm.tx.gas, vm.env.gas_price)?;
        let upfront_cost = gas_cost
            .checked_add(vm.tx.value)
            .ok_or(TxValidationError::InsufficientAccountFunds)?;
        if sender.balance < upfront_cost {
            return Err(TxValidationError::InsufficientAccountFunds.into());
        }

        // (5) SENDER_NOT_EOA
        if sender.has_code() {
            return Err(TxValidationError::SenderNotEOA.into());
        }

        // The value itself moves when the outermost frame starts.
        vm.db.increment_nonce(sender_address)?;
        let balance = sender
            .balance
            .checked_sub(gas_cost)
            .ok_or(InternalError::Underflow)?;
        vm.db.set_balance(sender_address, balance);
        Ok(())
    }

    fn finalize_execution(
        &mut self,
        vm: &mut VM<'_>,
        ctx_result: &mut ContextResult,
    ) -> Result<(), VMError> {
        let gas_used = ctx_result.gas_used;
        let refund = (gas_used / 2).min(vm.substate.refunded_gas);
        vm.substate.refunded_gas = refund;

        let gas_left = vm
            .tx
            .gas
            .checked_sub(gas_used)
            .ok_or(InternalError::Underflow)?;
        ctx_result.gas_used = gas_used
            .checked_sub(refund)
            .ok_or(InternalError::Underflow)?;

        refund_sender(vm, gas_left, refund)?;
        pay_coinbase(vm, ctx_result.gas_used)?;
        delete_self_destruct_accounts(vm);
        if vm.env.config.fork >= Fork::SpuriousDragon {
            delete_touched_empty_accounts(vm);
        }
        Ok(())
    }
}

fn gas_fee(gas: u64, gas_price: U256) -> Result<U256, VMError> {
    Ok(U256::from(gas)
        .checked_mul(gas_price)
        .ok_or(InternalError::Overflow)?)
}

fn refund_sender(vm: &mut VM<'_>, gas_left: u64, refund: u64) -> Result<(), VMError> {
    let returned_gas = gas_left.checked_add(refund).ok_or(InternalError::Overflow)?;
    let amount = gas_fee(returned_gas, vm.env.gas_price)?;
    vm.db.increase_balance(vm.env.origin, amount)?;
    Ok(())
}

/// Before SpuriousDragon the coinbase is always credited, which creates it even for a
/// zero fee. From SpuriousDragon on a zero fee leaves a missing coinbase missing and
/// removes one that is empty.
fn pay_coinbase(vm: &mut VM<'_>, gas_used: u64) -> Result<(), VMError> {
    let coinbase = vm.env.coinbase;
    let fee = gas_fee(gas_used, vm.env.gas_price)?;

    if vm.env.config.fork < Fork::SpuriousDragon {
        vm.db.increase_balance(coinbase, fee)?;
        return Ok(());
    }

    let balance = vm
        .db
        .get_account(coinbase)
        .balance
        .checked_add(fee)
        .ok_or(InternalError::Overflow)?;
    if !balance.is_zero() {
        vm.db.set_balance(coinbase, balance);
    } else if vm.db.account_exists_and_is_empty(coinbase) {
        debug!(%coinbase, "Destroying empty coinbase");
        vm.db.destroy_account(coinbase);
    }
    Ok(())
}

fn delete_self_destruct_accounts(vm: &mut VM<'_>) {
    for address in vm.substate.selfdestructs() {
        vm.db.destroy_account(address);
    }
}

/// EIP-161: accounts touched by frames that did not err, and left empty, are removed.
fn delete_touched_empty_accounts(vm: &mut VM<'_>) {
    let mut touched: FxHashSet<Address> = FxHashSet::default();
    if let Some(trace) = vm.root_trace.take() {
        trace.collect_touched(false, &mut touched);
    }
    for address in touched {
        if vm.db.account_exists_and_is_empty(address) {
            debug!(%address, "Destroying touched empty account");
            vm.db.destroy_account(address);
        }
    }
}
