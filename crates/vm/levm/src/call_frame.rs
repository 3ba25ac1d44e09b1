use crate::{
    constants::{RIPEMD_160_ADDRESS, STACK_LIMIT},
    errors::{ExceptionalHalt, InternalError, VMError},
    memory::Memory,
    message::Message,
    opcodes::Opcode,
};
use bitvec::{bitvec, order::Lsb0, vec::BitVec};
use bytes::Bytes;
use ferrite_common::{Address, U256};
use rustc_hash::FxHashSet;

/// Operand stack, capped at [`STACK_LIMIT`] items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    values: Vec<U256>,
}

impl Stack {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pops `N` items, the top of the stack first.
    #[inline]
    pub fn pop<const N: usize>(&mut self) -> Result<[U256; N], ExceptionalHalt> {
        let start = self
            .values
            .len()
            .checked_sub(N)
            .ok_or(ExceptionalHalt::StackUnderflow)?;
        let mut popped = [U256::zero(); N];
        for (slot, value) in popped.iter_mut().zip(self.values.drain(start..).rev()) {
            *slot = value;
        }
        Ok(popped)
    }

    #[inline]
    pub fn pop1(&mut self) -> Result<U256, ExceptionalHalt> {
        self.values.pop().ok_or(ExceptionalHalt::StackUnderflow)
    }

    #[inline]
    pub fn push(&mut self, value: U256) -> Result<(), ExceptionalHalt> {
        if self.values.len() >= STACK_LIMIT {
            return Err(ExceptionalHalt::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    #[inline]
    pub fn push_zero(&mut self) -> Result<(), ExceptionalHalt> {
        self.push(U256::zero())
    }

    /// Item `depth` positions below the top. `get(0)` is the top.
    pub fn get(&self, depth: usize) -> Result<U256, ExceptionalHalt> {
        let index = self
            .values
            .len()
            .checked_sub(depth)
            .and_then(|len| len.checked_sub(1))
            .ok_or(ExceptionalHalt::StackUnderflow)?;
        self.values
            .get(index)
            .copied()
            .ok_or(ExceptionalHalt::StackUnderflow)
    }

    /// Swaps the top with the item `depth` positions below it.
    pub fn swap(&mut self, depth: usize) -> Result<(), ExceptionalHalt> {
        let top = self
            .values
            .len()
            .checked_sub(1)
            .ok_or(ExceptionalHalt::StackUnderflow)?;
        let other = top
            .checked_sub(depth)
            .ok_or(ExceptionalHalt::StackUnderflow)?;
        self.values.swap(top, other);
        Ok(())
    }
}

/// What a finished frame leaves behind for touched-account collection.
///
/// Parents own their children, so the whole call tree of a transaction hangs from the
/// root frame's trace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTrace {
    /// `false` for creation frames.
    pub is_call: bool,
    pub current_target: Address,
    /// Self-destruct beneficiaries that were empty when credited.
    pub touched: Vec<Address>,
    pub has_erred: bool,
    pub children: Vec<FrameTrace>,
}

impl FrameTrace {
    /// Accounts touched by this frame and its descendants.
    ///
    /// Frames that erred, or that ran under an erred ancestor, contribute nothing, except
    /// for the RIPEMD160 precompile which is collected regardless.
    pub fn collect_touched(&self, ancestor_erred: bool, touched: &mut FxHashSet<Address>) {
        let erred = ancestor_erred || self.has_erred;
        for child in &self.children {
            child.collect_touched(erred, touched);
        }
        for beneficiary in &self.touched {
            if !erred || *beneficiary == RIPEMD_160_ADDRESS {
                touched.insert(*beneficiary);
            }
        }
        if (self.is_call && !erred) || self.current_target == RIPEMD_160_ADDRESS {
            touched.insert(self.current_target);
        }
    }
}

/// Execution context of one call or creation.
#[derive(Debug, Clone, Default)]
pub struct CallFrame {
    /// Caller of this frame.
    pub msg_sender: Address,
    /// Account whose storage and balance this frame works on.
    pub to: Address,
    /// Account whose code is running.
    pub code_address: Address,
    pub bytecode: Bytes,
    /// Valid `JUMPDEST` positions of `bytecode`.
    pub jump_targets: BitVec<u8, Lsb0>,
    pub msg_value: U256,
    pub stack: Stack,
    pub memory: Memory,
    pub calldata: Bytes,
    pub output: Bytes,
    pub pc: usize,
    /// Gas the frame started with.
    pub gas_limit: u64,
    pub gas_remaining: u64,
    pub depth: usize,
    pub should_transfer_value: bool,
    pub is_create: bool,
    /// Memory window of the caller that receives this frame's output.
    pub ret_offset: usize,
    pub ret_size: usize,
    pub trace: FrameTrace,
}

impl CallFrame {
    pub fn from_message(message: Message, ret_offset: usize, ret_size: usize) -> Self {
        let is_create = message.is_create();
        let jump_targets = analyze_jump_targets(&message.code);
        Self {
            msg_sender: message.caller,
            to: message.current_target,
            code_address: message.code_address.unwrap_or(message.current_target),
            bytecode: message.code,
            jump_targets,
            msg_value: message.value,
            stack: Stack::default(),
            memory: Memory::new(),
            calldata: message.data,
            output: Bytes::new(),
            pc: 0,
            gas_limit: message.gas,
            gas_remaining: message.gas,
            depth: message.depth,
            should_transfer_value: message.should_transfer_value,
            is_create,
            ret_offset,
            ret_size,
            trace: FrameTrace {
                is_call: !is_create,
                current_target: message.current_target,
                ..Default::default()
            },
        }
    }

    /// Opcode at `pc`. Running off the end of the code reads as `STOP`.
    #[inline]
    pub fn next_opcode(&self) -> u8 {
        self.bytecode
            .get(self.pc)
            .copied()
            .unwrap_or(u8::from(Opcode::STOP))
    }

    #[inline]
    pub fn increase_consumed_gas(&mut self, gas: u64) -> Result<(), ExceptionalHalt> {
        self.gas_remaining = self
            .gas_remaining
            .checked_sub(gas)
            .ok_or(ExceptionalHalt::OutOfGas)?;
        Ok(())
    }

    pub fn gas_used(&self) -> Result<u64, VMError> {
        Ok(self
            .gas_limit
            .checked_sub(self.gas_remaining)
            .ok_or(InternalError::Underflow)?)
    }

    pub fn is_valid_jump_target(&self, target: usize) -> bool {
        self.jump_targets.get(target).is_some_and(|bit| *bit)
    }
}

/// Marks every `JUMPDEST` byte that is not part of `PUSH` data.
pub fn analyze_jump_targets(code: &[u8]) -> BitVec<u8, Lsb0> {
    let mut targets = bitvec![u8, Lsb0; 0; code.len()];
    let mut pc = 0usize;
    while let Some(&byte) = code.get(pc) {
        if byte == u8::from(Opcode::JUMPDEST) {
            targets.set(pc, true);
        }
        let push_data = if (u8::from(Opcode::PUSH1)..=u8::from(Opcode::PUSH32)).contains(&byte) {
            usize::from(byte.wrapping_sub(u8::from(Opcode::PUSH1))).wrapping_add(1)
        } else {
            0
        };
        pc = pc.saturating_add(push_data).saturating_add(1);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_returns_top_first() {
        let mut stack = Stack::default();
        for value in 1u64..=3 {
            stack.push(U256::from(value)).unwrap();
        }
        let [a, b] = stack.pop().unwrap();
        assert_eq!((a, b), (U256::from(3), U256::from(2)));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pop::<2>(), Err(ExceptionalHalt::StackUnderflow));
    }

    #[test]
    fn stack_is_capped() {
        let mut stack = Stack::default();
        for _ in 0..STACK_LIMIT {
            stack.push_zero().unwrap();
        }
        assert_eq!(stack.push_zero(), Err(ExceptionalHalt::StackOverflow));
    }

    #[test]
    fn get_and_swap_index_from_top() {
        let mut stack = Stack::default();
        for value in 1u64..=3 {
            stack.push(U256::from(value)).unwrap();
        }
        assert_eq!(stack.get(0).unwrap(), U256::from(3));
        assert_eq!(stack.get(2).unwrap(), U256::from(1));
        assert!(stack.get(3).is_err());
        stack.swap(2).unwrap();
        assert_eq!(stack.get(0).unwrap(), U256::from(1));
        assert_eq!(stack.get(2).unwrap(), U256::from(3));
    }

    #[test]
    fn jumpdest_inside_push_data_is_not_a_target() {
        // PUSH1 0x5b, JUMPDEST, PUSH2 0x5b5b
        let code = [0x60, 0x5b, 0x5b, 0x61, 0x5b, 0x5b];
        let targets = analyze_jump_targets(&code);
        let valid: Vec<usize> = targets.iter_ones().collect();
        assert_eq!(valid, vec![2]);
    }

    #[test]
    fn touched_walk_skips_erred_subtrees_except_ripemd() {
        let ok_target = Address::repeat_byte(1);
        let erred_target = Address::repeat_byte(2);
        let under_erred = Address::repeat_byte(3);
        let beneficiary = Address::repeat_byte(4);

        let root = FrameTrace {
            is_call: true,
            current_target: ok_target,
            touched: vec![beneficiary],
            has_erred: false,
            children: vec![FrameTrace {
                is_call: true,
                current_target: erred_target,
                has_erred: true,
                children: vec![
                    FrameTrace {
                        is_call: true,
                        current_target: under_erred,
                        ..Default::default()
                    },
                    FrameTrace {
                        is_call: true,
                        current_target: RIPEMD_160_ADDRESS,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
        };

        let mut touched = FxHashSet::default();
        root.collect_touched(false, &mut touched);
        let mut touched: Vec<Address> = touched.into_iter().collect();
        touched.sort();
        assert_eq!(touched, vec![RIPEMD_160_ADDRESS, ok_target, beneficiary]);
    }

    #[test]
    fn creation_targets_are_not_collected() {
        let trace = FrameTrace {
            is_call: false,
            current_target: Address::repeat_byte(7),
            ..Default::default()
        };
        let mut touched = FxHashSet::default();
        trace.collect_touched(false, &mut touched);
        assert!(touched.is_empty());
    }
}
