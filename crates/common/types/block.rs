use bytes::Bytes;
use ethereum_types::{Address, Bloom, H64, H256, U256};
use ferrite_rlp::{
    encode::{RLPEncode, encode_length},
    structs::Encoder,
};
use ferrite_trie::Trie;
use serde::{Deserialize, Serialize};

use crate::{
    types::{Receipt, Transaction},
    utils::keccak,
};

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub parent_hash: H256,
    #[serde(rename = "sha3Uncles")]
    pub ommers_hash: H256,
    #[serde(rename = "miner")]
    pub coinbase: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub number: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas_limit: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas_used: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub timestamp: u64,
    #[serde(with = "crate::serde_utils::bytes")]
    pub extra_data: Bytes,
    pub mix_hash: H256,
    pub nonce: H64,
}

impl BlockHeader {
    fn encode_fields<'a>(&self, encoder: Encoder<'a>) -> Encoder<'a> {
        encoder
            .encode_field(&self.parent_hash)
            .encode_field(&self.ommers_hash)
            .encode_field(&self.coinbase)
            .encode_field(&self.state_root)
            .encode_field(&self.transactions_root)
            .encode_field(&self.receipts_root)
            .encode_field(&self.logs_bloom)
            .encode_field(&self.difficulty)
            .encode_field(&self.number)
            .encode_field(&self.gas_limit)
            .encode_field(&self.gas_used)
            .encode_field(&self.timestamp)
            .encode_field(&self.extra_data)
    }

    pub fn hash(&self) -> H256 {
        keccak(self.encode_to_vec())
    }

    /// Hash of the header without its seal (`mix_hash` and `nonce`), the input to the
    /// proof-of-work function.
    pub fn seal_hash(&self) -> H256 {
        let mut buf = vec![];
        self.encode_fields(Encoder::new(&mut buf)).finish();
        keccak(buf)
    }
}

impl RLPEncode for BlockHeader {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.encode_fields(Encoder::new(buf))
            .encode_field(&self.mix_hash)
            .encode_field(&self.nonce)
            .finish();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockBody {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub ommers: Vec<BlockHeader>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    pub fn hash(&self) -> H256 {
        self.header.hash()
    }
}

impl RLPEncode for Block {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.header)
            .encode_field(&self.body.transactions)
            .encode_field(&self.body.ommers)
            .finish();
    }
}

pub fn compute_ommers_hash(ommers: &[BlockHeader]) -> H256 {
    let payload: Vec<u8> = ommers.iter().flat_map(|ommer| ommer.encode_to_vec()).collect();
    let mut buf = vec![];
    encode_length(payload.len(), &mut buf);
    buf.extend_from_slice(&payload);
    keccak(buf)
}

/// Root of the trie mapping `rlp(index)` to each item's encoding.
fn compute_indexed_root<T: RLPEncode>(items: &[T]) -> H256 {
    let mut trie = Trie::new();
    for (index, item) in items.iter().enumerate() {
        trie.insert(&index.encode_to_vec(), item.encode_to_vec());
    }
    trie.hash()
}

pub fn compute_transactions_root(transactions: &[Transaction]) -> H256 {
    compute_indexed_root(transactions)
}

pub fn compute_receipts_root(receipts: &[Receipt]) -> H256 {
    compute_indexed_root(receipts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_OMMERS_HASH, EMPTY_TRIE_HASH};
    use hex_literal::hex;

    #[test]
    fn empty_lists_hash_to_well_known_roots() {
        assert_eq!(compute_ommers_hash(&[]), DEFAULT_OMMERS_HASH);
        assert_eq!(compute_transactions_root(&[]), EMPTY_TRIE_HASH);
        assert_eq!(compute_receipts_root(&[]), EMPTY_TRIE_HASH);
    }

    #[test]
    fn mainnet_genesis_header_hash() {
        let header = BlockHeader {
            parent_hash: H256::zero(),
            ommers_hash: DEFAULT_OMMERS_HASH,
            coinbase: Address::zero(),
            state_root: H256(hex!(
                "d7f8974fb5ac78d9ac099b9ad5018bedc2ce0a72dad1827a1709da30580f0544"
            )),
            transactions_root: EMPTY_TRIE_HASH,
            receipts_root: EMPTY_TRIE_HASH,
            logs_bloom: Bloom::zero(),
            difficulty: U256::from(0x4_0000_0000u64),
            number: 0,
            gas_limit: 5000,
            gas_used: 0,
            timestamp: 0,
            extra_data: Bytes::from_static(&hex!(
                "11bbe8db4e347b4e8c937c1c8370e4b5ed33adb3db69cbdb7a38e1e50b1b82fa"
            )),
            mix_hash: H256::zero(),
            nonce: H64(hex!("0000000000000042")),
        };
        assert_eq!(
            header.hash(),
            H256(hex!(
                "d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"
            ))
        );
        assert_ne!(header.seal_hash(), header.hash());
    }
}
