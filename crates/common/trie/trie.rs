//! Root computation for Merkle Patricia Tries.
//!
//! The trie keeps its entries in a sorted map and folds them into nodes only when a root
//! is requested. Nodes are never persisted, which is all block validation needs: state,
//! storage, transaction and receipt roots are recomputed from the live data every time.

pub mod nibbles;
mod node;

use std::collections::BTreeMap;

use ethereum_types::H256;
use ferrite_crypto::keccak::keccak_hash;
use hex_literal::hex;

pub use nibbles::Nibbles;

/// Root of a trie with no entries, `keccak(rlp(""))`.
pub const EMPTY_TRIE_HASH: H256 = H256(hex!(
    "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
));

#[derive(Debug, Clone, Default)]
pub struct Trie {
    entries: BTreeMap<Nibbles, Vec<u8>>,
    secured: bool,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trie whose paths are the keccak hash of the inserted keys, as used for the
    /// account and storage tries.
    pub fn new_secured() -> Self {
        Self {
            entries: BTreeMap::new(),
            secured: true,
        }
    }

    fn path(&self, key: &[u8]) -> Nibbles {
        if self.secured {
            Nibbles::from_bytes(&keccak_hash(key))
        } else {
            Nibbles::from_bytes(key)
        }
    }

    /// Inserting an empty value removes the key.
    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) {
        let path = self.path(key);
        if value.is_empty() {
            self.entries.remove(&path);
        } else {
            self.entries.insert(path, value);
        }
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let path = self.path(key);
        self.entries.remove(&path)
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(&self.path(key)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hash(&self) -> H256 {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|(path, value)| (path, value.as_slice()))
            .collect();
        match node::encode_node(&entries, 0) {
            Some(root) => H256(keccak_hash(root)),
            None => EMPTY_TRIE_HASH,
        }
    }

    pub fn compute_hash_from_unsorted_iter(
        iter: impl Iterator<Item = (Vec<u8>, Vec<u8>)>,
        secured: bool,
    ) -> H256 {
        let mut trie = if secured {
            Self::new_secured()
        } else {
            Self::new()
        };
        for (key, value) in iter {
            trie.insert(&key, value);
        }
        trie.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(pairs: &[(&str, &str)]) -> String {
        let mut trie = Trie::new();
        for (key, value) in pairs {
            trie.insert(key.as_bytes(), value.as_bytes().to_vec());
        }
        hex::encode(trie.hash())
    }

    #[test]
    fn empty_trie_root() {
        assert_eq!(Trie::new().hash(), EMPTY_TRIE_HASH);
        assert_eq!(Trie::new_secured().hash(), EMPTY_TRIE_HASH);
    }

    #[test]
    fn root_with_shared_prefixes() {
        assert_eq!(
            root_of(&[
                ("doe", "reindeer"),
                ("dog", "puppy"),
                ("dogglesworth", "cat"),
            ]),
            "8aad789dff2f538bca5d8ea56e8abe10f4c7ba3a5dea95fea4cd6e7c3a1168d3"
        );
    }

    #[test]
    fn root_with_single_long_value() {
        assert_eq!(
            root_of(&[("A", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")]),
            "d23786fb4a010da3ce639d66d5e904a11dbc02746d1ce25029e53290cabf28ab"
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = root_of(&[("do", "verb"), ("horse", "stallion"), ("doge", "coin")]);
        let backward = root_of(&[("doge", "coin"), ("horse", "stallion"), ("do", "verb")]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_value_removes_key() {
        let mut trie = Trie::new_secured();
        trie.insert(b"key", b"value".to_vec());
        assert_ne!(trie.hash(), EMPTY_TRIE_HASH);
        trie.insert(b"key", Vec::new());
        assert!(trie.is_empty());
        assert_eq!(trie.hash(), EMPTY_TRIE_HASH);
    }
}
