use crate::{
    call_frame::{CallFrame, FrameTrace},
    db::WorldState,
    environment::Environment,
    errors::{
        ContextResult, ExceptionalHalt, ExecutionReport, InternalError, OpcodeResult,
        TxResult, TxValidationError, VMError,
    },
    gas_cost,
    hooks::hook::{Hook, default_hooks},
    message::{Message, prepare_message},
    precompiles::{PRECOMPILES, PrecompileTable},
};
use bytes::Bytes;
use ferrite_common::{
    Address,
    types::{Log, Transaction},
};
use rustc_hash::FxHashSet;
use std::{cell::RefCell, mem, rc::Rc};
use tracing::trace;

/// Transaction-wide side effects that follow the call stack: self-destructs, the refund
/// counter and logs.
///
/// Every frame pushes a backup when it starts and either commits it into its parent or
/// reverts to it when it finishes, so an erred frame leaves nothing behind.
#[derive(Debug, Default)]
pub struct Substate {
    parent: Option<Box<Self>>,
    selfdestruct_set: FxHashSet<Address>,
    pub refunded_gas: u64,
    logs: Vec<Log>,
}

impl Substate {
    /// Push a checkpoint that can be either reverted or committed. All data up to this
    /// point is still accessible.
    pub fn push_backup(&mut self) {
        let parent = mem::take(self);
        self.refunded_gas = parent.refunded_gas;
        self.parent = Some(Box::new(parent));
    }

    /// Pop and merge with the last backup.
    ///
    /// Does nothing if the substate has no backup.
    pub fn commit_backup(&mut self) {
        if let Some(parent) = self.parent.as_mut() {
            let mut delta = mem::take(parent);
            mem::swap(self, &mut delta);

            self.selfdestruct_set.extend(delta.selfdestruct_set);
            self.refunded_gas = delta.refunded_gas;
            self.logs.extend(delta.logs);
        }
    }

    /// Discard current changes and revert to last backup.
    ///
    /// Does nothing if the substate has no backup.
    pub fn revert_backup(&mut self) {
        if let Some(parent) = self.parent.as_mut() {
            *self = mem::take(parent);
        }
    }

    /// Mark an address as selfdestructed and return whether it was already marked.
    pub fn add_selfdestruct(&mut self, address: Address) -> bool {
        let already_marked = self.is_selfdestruct(&address);
        self.selfdestruct_set.insert(address);
        already_marked
    }

    /// Return whether an address is already marked as selfdestructed.
    pub fn is_selfdestruct(&self, address: &Address) -> bool {
        self.selfdestruct_set.contains(address)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_selfdestruct(address))
    }

    /// Every address marked as selfdestructed, backups included.
    pub fn selfdestructs(&self) -> FxHashSet<Address> {
        let mut addresses = self
            .parent
            .as_deref()
            .map(Substate::selfdestructs)
            .unwrap_or_default();
        addresses.extend(self.selfdestruct_set.iter().copied());
        addresses
    }

    /// Extract all logs in order.
    pub fn extract_logs(&self) -> Vec<Log> {
        fn inner(substate: &Substate, target: &mut Vec<Log>) {
            if let Some(parent) = substate.parent.as_deref() {
                inner(parent, target);
            }
            target.extend_from_slice(&substate.logs);
        }

        let mut logs = Vec::new();
        inner(self, &mut logs);
        logs
    }

    pub fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }
}

/// Executes one external transaction, including all the message calls it makes.
///
/// Frames live on an explicit stack: `current_call_frame` is running and `call_frames`
/// holds its ancestors. CALL and CREATE push a child and the interpreter loop keeps
/// going with it; when a frame halts its result is handed back to the parent.
pub struct VM<'a> {
    /// Stack of parent call frames.
    pub call_frames: Vec<CallFrame>,
    /// The currently executing call frame.
    pub current_call_frame: CallFrame,
    pub env: Environment,
    pub substate: Substate,
    pub db: &'a mut WorldState,
    pub tx: Transaction,
    /// Transaction admission and settlement.
    pub hooks: Vec<Rc<RefCell<dyn Hook>>>,
    pub precompiles: &'a PrecompileTable,
    /// Trace of the outermost frame once it has finished.
    pub root_trace: Option<FrameTrace>,
}

impl<'a> VM<'a> {
    pub fn new(env: Environment, db: &'a mut WorldState, tx: &Transaction) -> Self {
        Self {
            call_frames: Vec::new(),
            current_call_frame: CallFrame::default(),
            env,
            substate: Substate::default(),
            db,
            tx: tx.clone(),
            hooks: default_hooks(),
            precompiles: &*PRECOMPILES,
            root_trace: None,
        }
    }

    /// Validates, runs and settles the transaction.
    ///
    /// A [`VMError::TxValidation`] means the transaction could not be admitted and
    /// nothing was written. Every other outcome, including a failed execution, is
    /// reported in the returned [`ExecutionReport`].
    pub fn execute(&mut self) -> Result<ExecutionReport, VMError> {
        self.prepare_execution()?;

        let intrinsic_gas =
            gas_cost::intrinsic_gas(&self.tx.data, self.tx.is_create(), self.env.config.fork)?;
        let message_gas =
            self.tx
                .gas
                .checked_sub(intrinsic_gas)
                .ok_or(TxValidationError::IntrinsicGasTooLow {
                    intrinsic: intrinsic_gas,
                    gas_limit: self.tx.gas,
                })?;

        let message = prepare_message(
            self.env.origin,
            self.tx.to,
            self.tx.value,
            self.tx.data.clone(),
            message_gas,
            0,
            None,
            true,
            self.db,
        )?;
        let mut ctx_result = self.process_message_call(message)?;
        ctx_result.gas_used = ctx_result
            .gas_used
            .checked_add(intrinsic_gas)
            .ok_or(InternalError::Overflow)?;

        self.finalize_execution(ctx_result)
    }

    /// Runs the outermost message of the transaction.
    pub fn process_message_call(&mut self, message: Message) -> Result<ContextResult, VMError> {
        if message.is_create() {
            self.process_create_message(message)
        } else {
            self.process_message(message)
        }
    }

    /// A creation aimed at an account with code or a nonce never starts; its gas is lost.
    pub fn process_create_message(&mut self, message: Message) -> Result<ContextResult, VMError> {
        if self.db.account_has_code_or_nonce(message.current_target) {
            trace!(address = %message.current_target, "Creation collides with an existing account");
            return Ok(ContextResult {
                result: TxResult::Revert(ExceptionalHalt::AddressCollision.into()),
                gas_used: message.gas,
                output: Bytes::new(),
            });
        }
        self.process_message(message)
    }

    pub fn process_message(&mut self, message: Message) -> Result<ContextResult, VMError> {
        self.current_call_frame = CallFrame::from_message(message, 0, 0);
        let result = match self.start_frame()? {
            Some(result) => self.finish_frame(result)?,
            None => self.run_execution()?,
        };
        self.root_trace = Some(mem::take(&mut self.current_call_frame.trace));
        Ok(result)
    }

    /// Interpreter loop. Runs until the outermost frame finishes.
    pub fn run_execution(&mut self) -> Result<ContextResult, VMError> {
        let fork = self.env.config.fork;
        loop {
            let opcode = self.current_call_frame.next_opcode();
            let op_result = self
                .advance_pc(1)
                .and_then(|()| VM::opcode_handler(fork, opcode).call(self));

            let mut result = match op_result {
                Ok(OpcodeResult::Continue) => continue,
                Ok(OpcodeResult::Halt) => self
                    .handle_opcode_result()
                    .or_else(|error| self.handle_opcode_error(error))?,
                Err(error) => self.handle_opcode_error(error)?,
            };

            // A parent that cannot take its child's result errs in turn.
            loop {
                let finished = self.finish_frame(result)?;
                if self.call_frames.is_empty() {
                    return Ok(finished);
                }
                match self.handle_return(&finished) {
                    Ok(()) => break,
                    Err(error) => result = self.handle_opcode_error(error)?,
                }
            }
        }
    }

    pub fn add_callframe(&mut self, new_call_frame: CallFrame) {
        let parent = mem::replace(&mut self.current_call_frame, new_call_frame);
        self.call_frames.push(parent);
    }

    /// Replaces the current frame with its parent and returns it.
    pub fn pop_call_frame(&mut self) -> Result<CallFrame, VMError> {
        let parent = self.call_frames.pop().ok_or(InternalError::CallFrame)?;
        Ok(mem::replace(&mut self.current_call_frame, parent))
    }

    #[inline]
    pub fn advance_pc(&mut self, count: usize) -> Result<(), VMError> {
        self.current_call_frame.pc = self
            .current_call_frame
            .pc
            .checked_add(count)
            .ok_or(InternalError::Overflow)?;
        Ok(())
    }

    fn prepare_execution(&mut self) -> Result<(), VMError> {
        for hook in self.hooks.clone() {
            hook.borrow_mut().prepare_execution(self)?;
        }
        Ok(())
    }

    fn finalize_execution(
        &mut self,
        mut ctx_result: ContextResult,
    ) -> Result<ExecutionReport, VMError> {
        for hook in self.hooks.clone() {
            hook.borrow_mut()
                .finalize_execution(self, &mut ctx_result)?;
        }

        let gas_refunded = self.substate.refunded_gas;
        let gas_left = self
            .tx
            .gas
            .checked_sub(ctx_result.gas_used)
            .and_then(|gas| gas.checked_sub(gas_refunded))
            .ok_or(InternalError::Underflow)?;

        Ok(ExecutionReport {
            result: ctx_result.result,
            gas_used: ctx_result.gas_used,
            gas_left,
            gas_refunded,
            output: ctx_result.output,
            logs: self.substate.extract_logs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverted_backup_drops_selfdestructs_logs_and_refunds() {
        let mut substate = Substate::default();
        substate.refunded_gas = 10;
        substate.push_backup();
        substate.add_selfdestruct(Address::repeat_byte(1));
        substate.refunded_gas = 24_010;
        substate.add_log(Log {
            address: Address::repeat_byte(1),
            topics: vec![],
            data: Bytes::new(),
        });
        substate.revert_backup();

        assert!(!substate.is_selfdestruct(&Address::repeat_byte(1)));
        assert_eq!(substate.refunded_gas, 10);
        assert!(substate.extract_logs().is_empty());
    }

    #[test]
    fn committed_backup_merges_into_parent() {
        let mut substate = Substate::default();
        substate.push_backup();
        substate.add_selfdestruct(Address::repeat_byte(1));
        substate.push_backup();
        assert!(substate.add_selfdestruct(Address::repeat_byte(1)));
        assert!(!substate.add_selfdestruct(Address::repeat_byte(2)));
        substate.refunded_gas = 48_000;
        substate.commit_backup();
        substate.commit_backup();

        assert_eq!(substate.refunded_gas, 48_000);
        assert_eq!(substate.selfdestructs().len(), 2);
    }
}
