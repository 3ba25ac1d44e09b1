use crate::{
    errors::{InternalError, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    utils::size_offset_to_usize,
    vm::VM,
};
use ferrite_common::{H256, types::Log};

// Logging Operations (5)
// Opcodes: LOG0 ... LOG4

impl<'a> VM<'a> {
    // LOGn operation
    pub fn op_log<const N: usize>(&mut self) -> Result<OpcodeResult, VMError> {
        let frame = &mut self.current_call_frame;
        let [offset, size] = frame.stack.pop()?;
        let topics = frame.stack.pop::<N>()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;
        let new_memory_size = calculate_memory_size(offset, size)?;

        let number_of_topics = u8::try_from(N).map_err(|_| InternalError::TypeConversion)?;
        let current_memory_size = frame.memory.len();
        frame.increase_consumed_gas(gas_cost::log(
            new_memory_size,
            current_memory_size,
            size,
            number_of_topics,
        )?)?;

        let log = Log {
            address: frame.to,
            topics: topics
                .iter()
                .map(|topic| H256::from(topic.to_big_endian()))
                .collect(),
            data: frame.memory.load_range(offset, size)?,
        };
        self.substate.add_log(log);
        Ok(OpcodeResult::Continue)
    }
}
