use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    vm::VM,
};

// Duplication Operation (16)
// Opcodes: DUP1 ... DUP16

impl<'a> VM<'a> {
    // DUPn operation, `N` counted from the top starting at zero
    #[inline]
    pub fn op_dup<const N: usize>(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        frame.increase_consumed_gas(gas_cost::DUPN)?;
        let value = frame.stack.get(N)?;
        frame.stack.push(value)?;
        Ok(OpcodeResult::Continue)
    }
}
