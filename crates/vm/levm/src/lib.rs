//! # LEVM
//!
//! The Ethereum Virtual Machine as it ran on the proof-of-work chain, from Frontier
//! through SpuriousDragon.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           VM                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │  CallFrame  │  │   Memory    │  │       Stack         │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! │                                                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │  Substate   │  │ Precompiles │  │   Environment       │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        WorldState                            │
//! │          (accounts, storage, checkpoint journal)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`vm::VM`]: executes one transaction, including every nested message call
//! - [`message::prepare_message`]: builds the [`message::Message`] a frame runs
//! - [`call_frame::CallFrame`]: execution context for each call or creation
//! - [`db::WorldState`]: account store with nested checkpoints
//! - [`precompiles`]: ECRECOVER, SHA256, RIPEMD160 and IDENTITY
//! - [`hooks`]: transaction admission and settlement
//!
//! ## Usage
//!
//! ```ignore
//! let mut vm = VM::new(env, &mut world_state, &tx);
//! let report = vm.execute()?;
//! if report.is_success() {
//!     println!("Gas used: {}", report.gas_used);
//! }
//! ```

pub mod account;
pub mod call_frame;
pub mod constants;
pub mod db;
pub mod environment;
pub mod errors;
pub mod execution_handlers;
pub mod gas_cost;
pub mod hooks;
pub mod memory;
pub mod message;
pub mod opcode_handlers;
pub mod opcodes;
pub mod precompiles;
pub mod utils;
pub mod vm;

pub use environment::*;
