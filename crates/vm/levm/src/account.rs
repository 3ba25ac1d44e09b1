use bytes::Bytes;
use ferrite_common::{H256, U256, constants::EMPTY_KECCAK_HASH, utils::keccak};

/// Balance, nonce and code of an account. Storage lives next to it in the
/// [`WorldState`](crate::db::WorldState).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
}

impl AccountInfo {
    pub fn new(balance: U256, nonce: u64, code: Bytes) -> Self {
        Self {
            balance,
            nonce,
            code,
        }
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn has_nonce(&self) -> bool {
        self.nonce != 0
    }

    /// Nonce 0, balance 0 and no code (EIP-161).
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && !self.has_nonce() && !self.has_code()
    }

    pub fn code_hash(&self) -> H256 {
        if self.code.is_empty() {
            EMPTY_KECCAK_HASH
        } else {
            keccak(&self.code)
        }
    }
}
