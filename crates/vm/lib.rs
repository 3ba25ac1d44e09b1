mod errors;

pub mod backends;

pub use backends::{BlockExecutionResult, Evm};
pub use errors::EvmError;
pub use ferrite_levm::{account::AccountInfo, db::WorldState, errors::ExecutionReport};
