use ethereum_types::{H256, U256};
use ferrite_crypto::keccak::keccak_hash;

pub fn keccak(data: impl AsRef<[u8]>) -> H256 {
    H256(keccak_hash(data))
}

pub fn u256_from_big_endian(slice: &[u8]) -> U256 {
    U256::from_big_endian(slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_KECCAK_HASH;

    #[test]
    fn keccak_of_empty_input_is_empty_code_hash() {
        assert_eq!(keccak([]), EMPTY_KECCAK_HASH);
    }
}
