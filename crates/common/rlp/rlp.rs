//! Recursive Length Prefix serialization.
//!
//! Only the encoding half is provided: every consumer in the workspace hashes or
//! commits to RLP output (headers, transactions, receipts, trie nodes) but never
//! needs to read it back.

pub mod constants;
pub mod encode;
pub mod structs;
