mod account;
mod block;
mod chain_config;
mod genesis;
mod receipt;
mod transaction;

pub use account::*;
pub use block::*;
pub use chain_config::*;
pub use genesis::*;
pub use receipt::*;
pub use transaction::*;
