use std::collections::BTreeMap;

use bytes::Bytes;
use ethereum_types::{Address, Bloom, H64, H256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_OMMERS_HASH, EMPTY_TRIE_HASH},
    types::{Block, BlockBody, BlockHeader, ChainConfig},
};

/// Genesis description in the layout used by geth-style `genesis.json` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    pub config: ChainConfig,
    pub alloc: BTreeMap<Address, GenesisAccount>,
    #[serde(default)]
    pub coinbase: Address,
    pub difficulty: U256,
    #[serde(default, with = "crate::serde_utils::bytes")]
    pub extra_data: Bytes,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas_limit: u64,
    #[serde(default)]
    pub nonce: H64,
    #[serde(default)]
    pub mix_hash: H256,
    #[serde(default, with = "crate::serde_utils::u64::hex_str")]
    pub timestamp: u64,
    /// When present, the state root the allocation is expected to produce.
    #[serde(default)]
    pub state_root: Option<H256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    #[serde(default, with = "crate::serde_utils::bytes")]
    pub code: Bytes,
    #[serde(default)]
    pub storage: BTreeMap<U256, U256>,
    pub balance: U256,
    #[serde(default, with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
}

impl Genesis {
    pub fn get_block_header(&self, state_root: H256) -> BlockHeader {
        BlockHeader {
            parent_hash: H256::zero(),
            ommers_hash: DEFAULT_OMMERS_HASH,
            coinbase: self.coinbase,
            state_root,
            transactions_root: EMPTY_TRIE_HASH,
            receipts_root: EMPTY_TRIE_HASH,
            logs_bloom: Bloom::zero(),
            difficulty: self.difficulty,
            number: 0,
            gas_limit: self.gas_limit,
            gas_used: 0,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: self.nonce,
        }
    }

    pub fn get_block(&self, state_root: H256) -> Block {
        Block::new(self.get_block_header(state_root), BlockBody::default())
    }
}
