use crate::{
    call_frame::CallFrame,
    constants::{FAIL, STACK_DEPTH_LIMIT, SUCCESS},
    errors::{ContextResult, ExceptionalHalt, InternalError, OpcodeResult, VMError},
    gas_cost::{self, max_message_call_gas},
    memory::{self, calculate_memory_size},
    message::prepare_message,
    utils::{address_to_word, size_offset_to_usize, word_to_address},
    vm::VM,
};
use bytes::Bytes;
use ferrite_common::{
    Address, U256,
    evm::calculate_create_address,
    types::{Fork, TxKind},
};
use tracing::trace;

// System Operations (7)
// Opcodes: STOP, CREATE, CALL, CALLCODE, RETURN, DELEGATECALL, SELFDESTRUCT

impl<'a> VM<'a> {
    // STOP operation
    pub fn op_stop(&mut self) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Halt)
    }

    // CALL operation
    pub fn op_call(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let [gas, callee, value, args_offset, args_size, ret_offset, ret_size] =
            self.current_call_frame.stack.pop()?;
        let callee = word_to_address(callee);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;
        let new_memory_size = call_memory_size(args_offset, args_size, ret_offset, ret_size)?;

        // Before SpuriousDragon any call to a missing account pays for creating it.
        let creates_account = if fork >= Fork::SpuriousDragon {
            !value.is_zero() && !self.db.is_account_alive(callee)
        } else {
            !self.db.account_exists(callee)
        };
        let mut extra_gas = gas_cost::call_base(fork);
        if creates_account {
            extra_gas = extra_gas.saturating_add(gas_cost::CALL_TO_EMPTY_ACCOUNT);
        }
        if !value.is_zero() {
            extra_gas = extra_gas.saturating_add(gas_cost::CALL_POSITIVE_VALUE);
        }

        let gas_limit = self.charge_message_call(value, gas, new_memory_size, extra_gas)?;

        let caller = self.current_call_frame.to;
        let calldata = self
            .current_call_frame
            .memory
            .load_range(args_offset, args_size)?;
        self.generic_call(
            gas_limit, value, caller, callee, callee, true, calldata, ret_offset, ret_size,
        )
    }

    // CALLCODE operation
    // Runs the callee's code against the current account's storage and balance.
    pub fn op_callcode(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let [gas, code_address, value, args_offset, args_size, ret_offset, ret_size] =
            self.current_call_frame.stack.pop()?;
        let code_address = word_to_address(code_address);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;
        let new_memory_size = call_memory_size(args_offset, args_size, ret_offset, ret_size)?;

        let mut extra_gas = gas_cost::call_base(fork);
        if !value.is_zero() {
            extra_gas = extra_gas.saturating_add(gas_cost::CALL_POSITIVE_VALUE);
        }

        let gas_limit = self.charge_message_call(value, gas, new_memory_size, extra_gas)?;

        let current_target = self.current_call_frame.to;
        let calldata = self
            .current_call_frame
            .memory
            .load_range(args_offset, args_size)?;
        self.generic_call(
            gas_limit,
            value,
            current_target,
            current_target,
            code_address,
            true,
            calldata,
            ret_offset,
            ret_size,
        )
    }

    // RETURN operation
    pub fn op_return(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, size] = frame.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        let new_memory_size = calculate_memory_size(offset, size)?;
        let current_memory_size = frame.memory.len();

        frame.increase_consumed_gas(gas_cost::return_op(new_memory_size, current_memory_size)?)?;
        frame.output = frame.memory.load_range(offset, size)?;
        Ok(OpcodeResult::Halt)
    }

    // DELEGATECALL operation
    // Keeps the caller and value of the current frame and never moves ether.
    pub fn op_delegatecall(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let [gas, code_address, args_offset, args_size, ret_offset, ret_size] =
            self.current_call_frame.stack.pop()?;
        let code_address = word_to_address(code_address);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;
        let new_memory_size = call_memory_size(args_offset, args_size, ret_offset, ret_size)?;

        let gas_limit = self.charge_message_call(
            U256::zero(),
            gas,
            new_memory_size,
            gas_cost::call_base(fork),
        )?;

        let frame = &mut self.current_call_frame;
        let (msg_sender, msg_value, current_target) = (frame.msg_sender, frame.msg_value, frame.to);
        let calldata = frame.memory.load_range(args_offset, args_size)?;
        self.generic_call(
            gas_limit,
            msg_value,
            msg_sender,
            current_target,
            code_address,
            false,
            calldata,
            ret_offset,
            ret_size,
        )
    }

    // CREATE operation
    pub fn op_create(&mut self) -> Result<OpcodeResult, VMError> {
        let [value, code_offset, code_size] = self.current_call_frame.stack.pop()?;
        let (code_size, code_offset) = size_offset_to_usize(code_size, code_offset)?;
        self.generic_create(value, code_offset, code_size)
    }

    // SELFDESTRUCT operation
    pub fn op_selfdestruct(&mut self) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let beneficiary = word_to_address(self.current_call_frame.stack.pop1()?);
        let originator = self.current_call_frame.to;
        let balance = self.db.get_account(originator).balance;

        let creates_beneficiary = if fork >= Fork::SpuriousDragon {
            !self.db.is_account_alive(beneficiary) && !balance.is_zero()
        } else {
            !self.db.account_exists(beneficiary)
        };
        self.current_call_frame
            .increase_consumed_gas(gas_cost::selfdestruct(fork, creates_beneficiary))?;

        if !self.substate.is_selfdestruct(&originator) {
            self.substate.refunded_gas = self
                .substate
                .refunded_gas
                .saturating_add(gas_cost::SELFDESTRUCT_REFUND);
        }

        self.db.increase_balance(beneficiary, balance)?;
        self.db.set_balance(originator, U256::zero());
        self.substate.add_selfdestruct(originator);

        if fork >= Fork::SpuriousDragon && self.db.account_exists_and_is_empty(beneficiary) {
            self.current_call_frame.trace.touched.push(beneficiary);
        }

        Ok(OpcodeResult::Halt)
    }

    /// Charges a CALL-family instruction and grows memory. Returns the gas handed to the
    /// callee, stipend included.
    fn charge_message_call(
        &mut self,
        value: U256,
        gas: U256,
        new_memory_size: usize,
        extra_gas: u64,
    ) -> Result<u64, VMError> {
        let fork = self.env.config.fork;
        let frame = &mut self.current_call_frame;
        let memory_cost = memory::expansion_cost(new_memory_size, frame.memory.len())?;
        let call_gas = gas_cost::message_call_gas(
            value,
            gas,
            frame.gas_remaining,
            memory_cost,
            extra_gas,
            fork,
        )?;
        frame.increase_consumed_gas(
            call_gas
                .cost
                .checked_add(memory_cost)
                .ok_or(ExceptionalHalt::OutOfGas)?,
        )?;
        frame.memory.resize(new_memory_size);
        Ok(call_gas.gas_limit)
    }

    /// Common behavior of CALL, CALLCODE and DELEGATECALL once gas has been paid.
    ///
    /// A call the caller cannot fund, or one that would go past the depth limit, fails
    /// without running: the forwarded gas comes back and zero is pushed.
    #[allow(clippy::too_many_arguments)]
    pub fn generic_call(
        &mut self,
        gas_limit: u64,
        value: U256,
        msg_sender: Address,
        to: Address,
        code_address: Address,
        should_transfer_value: bool,
        calldata: Bytes,
        ret_offset: usize,
        ret_size: usize,
    ) -> Result<OpcodeResult, VMError> {
        if should_transfer_value && self.db.get_account(msg_sender).balance < value {
            self.early_revert_message_call(gas_limit, "OutOfFund")?;
            return Ok(OpcodeResult::Continue);
        }

        let new_depth = self
            .current_call_frame
            .depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;
        if new_depth > STACK_DEPTH_LIMIT {
            self.early_revert_message_call(gas_limit, "MaxDepth")?;
            return Ok(OpcodeResult::Continue);
        }

        let message = prepare_message(
            msg_sender,
            TxKind::Call(to),
            value,
            calldata,
            gas_limit,
            new_depth,
            Some(code_address),
            should_transfer_value,
            self.db,
        )?;
        self.start_child(CallFrame::from_message(message, ret_offset, ret_size))
    }

    /// Common behavior of CREATE once the operands are known.
    pub fn generic_create(
        &mut self,
        value: U256,
        code_offset: usize,
        code_size: usize,
    ) -> Result<OpcodeResult, VMError> {
        let fork = self.env.config.fork;
        let new_memory_size = calculate_memory_size(code_offset, code_size)?;
        let current_memory_size = self.current_call_frame.memory.len();
        self.current_call_frame
            .increase_consumed_gas(gas_cost::create(new_memory_size, current_memory_size)?)?;

        let gas_left = self.current_call_frame.gas_remaining;
        let gas_limit = if fork >= Fork::TangerineWhistle {
            max_message_call_gas(gas_left)
        } else {
            gas_left
        };
        self.current_call_frame.increase_consumed_gas(gas_limit)?;
        let init_code = self
            .current_call_frame
            .memory
            .load_range(code_offset, code_size)?;

        let deployer = self.current_call_frame.to;
        let deployer_account = self.db.get_account(deployer);
        let new_depth = self
            .current_call_frame
            .depth
            .checked_add(1)
            .ok_or(InternalError::Overflow)?;

        let checks = [
            (deployer_account.balance < value, "OutOfFund"),
            (deployer_account.nonce == u64::MAX, "MaxNonce"),
            (new_depth > STACK_DEPTH_LIMIT, "MaxDepth"),
        ];
        for (failed, reason) in checks {
            if failed {
                self.early_revert_message_call(gas_limit, reason)?;
                return Ok(OpcodeResult::Continue);
            }
        }

        // The reserved gas is lost on a collision, but the nonce still moves.
        let new_address = calculate_create_address(deployer, deployer_account.nonce);
        self.db.increment_nonce(deployer)?;
        if self.db.account_has_code_or_nonce(new_address) {
            trace!(%new_address, "CREATE collides with an existing account");
            self.current_call_frame.stack.push(FAIL)?;
            return Ok(OpcodeResult::Continue);
        }

        let message = prepare_message(
            deployer,
            TxKind::Create,
            value,
            init_code,
            gas_limit,
            new_depth,
            None,
            true,
            self.db,
        )?;
        self.start_child(CallFrame::from_message(message, 0, 0))
    }

    /// Makes `child` the running frame. A child that finishes without running code (a
    /// precompile, or a frame that failed to start) is returned to its parent at once.
    fn start_child(&mut self, child: CallFrame) -> Result<OpcodeResult, VMError> {
        trace!(
            depth = child.depth,
            to = %child.to,
            is_create = child.is_create,
            "Entering child frame"
        );
        self.add_callframe(child);
        if let Some(result) = self.start_frame()? {
            let result = self.finish_frame(result)?;
            self.handle_return(&result)?;
        }
        Ok(OpcodeResult::Continue)
    }

    /// Hands a finished child back to its parent: unspent gas, the execution trace and
    /// the value pushed for the calling instruction.
    pub fn handle_return(&mut self, ctx_result: &ContextResult) -> Result<(), VMError> {
        let child = self.pop_call_frame()?;
        trace!(
            depth = child.depth,
            success = ctx_result.is_success(),
            gas_used = ctx_result.gas_used,
            "Child frame returned"
        );

        let parent = &mut self.current_call_frame;
        parent.gas_remaining = parent
            .gas_remaining
            .checked_add(child.gas_remaining)
            .ok_or(InternalError::Overflow)?;
        parent.trace.children.push(child.trace);

        if child.is_create {
            let pushed = if ctx_result.is_success() {
                address_to_word(child.to)
            } else {
                FAIL
            };
            parent.stack.push(pushed)?;
            return Ok(());
        }

        if ctx_result.is_success() {
            let len = child.ret_size.min(ctx_result.output.len());
            let output = ctx_result
                .output
                .get(..len)
                .ok_or(InternalError::Slicing)?;
            parent.memory.store_data(child.ret_offset, output)?;
            parent.stack.push(SUCCESS)?;
        } else {
            parent.stack.push(FAIL)?;
        }
        Ok(())
    }

    fn early_revert_message_call(&mut self, gas_limit: u64, reason: &str) -> Result<(), VMError> {
        trace!(reason, "Message call skipped");
        let frame = &mut self.current_call_frame;
        frame.gas_remaining = frame
            .gas_remaining
            .checked_add(gas_limit)
            .ok_or(InternalError::Overflow)?;
        frame.stack.push(FAIL)?;
        Ok(())
    }
}

/// Memory needed for both the input and the output window of a call.
fn call_memory_size(
    args_offset: usize,
    args_size: usize,
    ret_offset: usize,
    ret_size: usize,
) -> Result<usize, VMError> {
    Ok(calculate_memory_size(args_offset, args_size)?
        .max(calculate_memory_size(ret_offset, ret_size)?))
}
