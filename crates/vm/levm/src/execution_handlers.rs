use crate::{
    constants::{MAX_CODE_SIZE, STACK_DEPTH_LIMIT},
    errors::{ContextResult, ExceptionalHalt, InternalError, TxResult, VMError},
    gas_cost::CODE_DEPOSIT_COST,
    precompiles::execute_precompile,
    vm::VM,
};
use bytes::Bytes;
use ferrite_common::types::Fork;
use tracing::warn;

impl<'a> VM<'a> {
    /// Result of a frame that halted normally.
    pub fn handle_opcode_result(&mut self) -> Result<ContextResult, VMError> {
        let frame = &self.current_call_frame;
        Ok(ContextResult {
            result: TxResult::Success,
            gas_used: frame.gas_used()?,
            output: frame.output.clone(),
        })
    }

    /// Turns an error raised inside a frame into an erred result that forfeits all of the
    /// frame's gas. Only admission errors escape.
    pub fn handle_opcode_error(&mut self, error: VMError) -> Result<ContextResult, VMError> {
        if error.should_propagate() {
            return Err(error);
        }
        let frame = &mut self.current_call_frame;
        if error.is_internal() {
            warn!(%error, depth = frame.depth, to = %frame.to, "Internal error contained at frame boundary");
        }
        frame.gas_remaining = 0;
        Ok(ContextResult {
            result: TxResult::Revert(error),
            gas_used: frame.gas_limit,
            output: Bytes::new(),
        })
    }

    /// [`VM::enter_frame`] with its internal and state errors contained in the frame it
    /// was starting.
    pub fn start_frame(&mut self) -> Result<Option<ContextResult>, VMError> {
        self.enter_frame()
            .or_else(|error| self.handle_opcode_error(error).map(Some))
    }

    /// Starts the current frame: opens its checkpoints, prepares a new contract account,
    /// touches the target and moves the value.
    ///
    /// Returns the result right away for frames that never reach the interpreter loop:
    /// those that fail to start and precompiles.
    pub fn enter_frame(&mut self) -> Result<Option<ContextResult>, VMError> {
        self.db.begin_checkpoint();
        self.substate.push_backup();

        let frame = &self.current_call_frame;
        let (to, sender, value) = (frame.to, frame.msg_sender, frame.msg_value);

        if frame.depth > STACK_DEPTH_LIMIT {
            return Ok(Some(
                self.handle_opcode_error(ExceptionalHalt::StackDepthLimit.into())?,
            ));
        }

        if frame.is_create {
            self.db.destroy_storage(to);
            if self.env.config.fork >= Fork::SpuriousDragon {
                if let Err(error) = self.db.increment_nonce(to) {
                    return Ok(Some(self.handle_opcode_error(error.into())?));
                }
            }
        }

        self.db.touch(to);

        if self.current_call_frame.should_transfer_value
            && !value.is_zero()
            && self.db.move_ether(sender, to, value).is_err()
        {
            return Ok(Some(
                self.handle_opcode_error(ExceptionalHalt::InsufficientFunds.into())?,
            ));
        }

        let frame = &self.current_call_frame;
        if !frame.is_create && self.precompiles.is_precompile(&frame.code_address) {
            return Ok(Some(self.execute_precompile_frame()?));
        }
        Ok(None)
    }

    fn execute_precompile_frame(&mut self) -> Result<ContextResult, VMError> {
        let frame = &mut self.current_call_frame;
        let mut gas_remaining = frame.gas_remaining;
        match execute_precompile(
            self.precompiles,
            frame.code_address,
            &frame.calldata,
            &mut gas_remaining,
        ) {
            Ok(output) => {
                frame.gas_remaining = gas_remaining;
                frame.output = output;
                self.handle_opcode_result()
            }
            Err(error) => self.handle_opcode_error(error),
        }
    }

    /// Closes the current frame: deploys the code of a successful creation, then commits
    /// or rolls back the frame's checkpoints.
    ///
    /// Internal and state errors raised here err the frame instead of escaping it.
    pub fn finish_frame(&mut self, mut result: ContextResult) -> Result<ContextResult, VMError> {
        if self.current_call_frame.is_create && result.is_success() {
            result = self
                .deposit_code(result)
                .or_else(|error| self.handle_opcode_error(error))?;
        }

        let resolved = if result.is_success() {
            self.db.commit()
        } else {
            self.db.rollback()
        };
        match resolved {
            Ok(()) if result.is_success() => self.substate.commit_backup(),
            Ok(()) => self.substate.revert_backup(),
            Err(error) => {
                self.substate.revert_backup();
                result = self.handle_opcode_error(error.into())?;
            }
        }
        self.current_call_frame.trace.has_erred = !result.is_success();
        Ok(result)
    }

    /// Charges for and stores the code returned by init code.
    ///
    /// In Frontier a deposit the frame cannot pay for leaves the new account without code
    /// and the creation still succeeds. From Homestead on it fails the creation, as does
    /// code over [`MAX_CODE_SIZE`] from SpuriousDragon on.
    fn deposit_code(&mut self, mut result: ContextResult) -> Result<ContextResult, VMError> {
        let fork = self.env.config.fork;
        let code_length =
            u64::try_from(result.output.len()).map_err(|_| InternalError::TypeConversion)?;
        let deposit_cost = CODE_DEPOSIT_COST
            .checked_mul(code_length)
            .ok_or(ExceptionalHalt::OutOfGas);

        if let Err(error) =
            deposit_cost.and_then(|cost| self.current_call_frame.increase_consumed_gas(cost))
        {
            if fork < Fork::Homestead {
                result.output = Bytes::new();
                return Ok(result);
            }
            return self.handle_opcode_error(error.into());
        }

        if fork >= Fork::SpuriousDragon && result.output.len() > MAX_CODE_SIZE {
            return self.handle_opcode_error(ExceptionalHalt::ContractOutputTooBig.into());
        }

        let address = self.current_call_frame.to;
        if let Err(error) = self.db.set_code(address, result.output.clone()) {
            return self.handle_opcode_error(error.into());
        }
        result.gas_used = self.current_call_frame.gas_used()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EVMConfig, Environment, call_frame::CallFrame, constants::STACK_LIMIT, db::WorldState,
        errors::StateError,
    };
    use ferrite_common::{Address, U256, types::Transaction};

    fn env() -> Environment {
        Environment {
            config: EVMConfig::new(Fork::Homestead),
            ..Default::default()
        }
    }

    fn frame(gas: u64, bytecode: &'static [u8]) -> CallFrame {
        CallFrame {
            gas_limit: gas,
            gas_remaining: gas,
            bytecode: Bytes::from_static(bytecode),
            ..Default::default()
        }
    }

    #[test]
    fn unbalanced_checkpoint_errs_the_frame() {
        let mut db = WorldState::new();
        let tx = Transaction::default();
        let mut vm = VM::new(env(), &mut db, &tx);
        vm.current_call_frame = frame(100, &[]);
        vm.current_call_frame.gas_remaining = 40;

        let success = ContextResult {
            result: TxResult::Success,
            gas_used: 60,
            output: Bytes::new(),
        };
        let result = vm.finish_frame(success).unwrap();

        assert_eq!(
            result.result,
            TxResult::Revert(StateError::NoCheckpoint.into())
        );
        assert_eq!(result.gas_used, 100);
        assert_eq!(vm.current_call_frame.gas_remaining, 0);
        assert!(vm.current_call_frame.trace.has_erred);
    }

    #[test]
    fn parent_that_cannot_take_the_result_errs() {
        let mut db = WorldState::new();
        let tx = Transaction::default();
        let mut vm = VM::new(env(), &mut db, &tx);

        let mut parent = frame(1_000, &[]);
        parent.gas_remaining = 950;
        for _ in 0..STACK_LIMIT {
            parent.stack.push(U256::zero()).unwrap();
        }
        vm.current_call_frame = parent;
        vm.db.begin_checkpoint();
        vm.substate.push_backup();
        vm.db.set_storage(Address::repeat_byte(1), U256::one(), U256::one());

        // The child halts at once; pushing its success flag overflows the parent's stack.
        let mut child = frame(50, &[0x00]);
        child.depth = 1;
        vm.add_callframe(child);
        vm.db.begin_checkpoint();
        vm.substate.push_backup();

        let result = vm.run_execution().unwrap();

        assert_eq!(
            result.result,
            TxResult::Revert(ExceptionalHalt::StackOverflow.into())
        );
        assert_eq!(result.gas_used, 1_000);
        assert!(vm.call_frames.is_empty());
        assert_eq!(vm.db.checkpoint_depth(), 0);
        assert_eq!(
            vm.db.get_storage(Address::repeat_byte(1), U256::one()),
            U256::zero()
        );
    }
}
