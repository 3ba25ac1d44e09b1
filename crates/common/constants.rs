use ethereum_types::H256;
use hex_literal::hex;

pub use ferrite_trie::EMPTY_TRIE_HASH;

/// Hash of empty code, `keccak("")`.
pub const EMPTY_KECCAK_HASH: H256 = H256(hex!(
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
));

/// Ommers hash of a block without ommers, `keccak(rlp([]))`.
pub const DEFAULT_OMMERS_HASH: H256 = H256(hex!(
    "1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
));
