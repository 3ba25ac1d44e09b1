use crate::{account::AccountInfo, errors::StateError};
use bytes::Bytes;
use ferrite_common::{Address, H256, U256, types::AccountState};
use ferrite_rlp::encode::RLPEncode;
use ferrite_trie::Trie;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Values a scope saw before its first write to them.
#[derive(Debug, Default, Clone)]
struct Checkpoint {
    accounts: FxHashMap<Address, Option<AccountInfo>>,
    storage: FxHashMap<(Address, U256), U256>,
}

/// In-memory account store with nested checkpoints.
///
/// Writes made while a checkpoint is open are journaled in the topmost one, so that
/// [`WorldState::rollback`] restores every account and slot exactly as they were when the matching [`WorldState::begin_checkpoint`] ran. Writes made with no
/// open checkpoint (genesis allocation) are applied without a journal.
#[derive(Debug, Default, Clone)]
pub struct WorldState {
    accounts: FxHashMap<Address, AccountInfo>,
    storage: FxHashMap<Address, FxHashMap<U256, U256>>,
    checkpoints: Vec<Checkpoint>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account with its storage, replacing whatever was there.
    pub fn insert_account(
        &mut self,
        address: Address,
        info: AccountInfo,
        storage: impl IntoIterator<Item = (U256, U256)>,
    ) {
        self.journal_account(address);
        self.accounts.insert(address, info);
        self.destroy_storage(address);
        for (key, value) in storage {
            self.set_storage(address, key, value);
        }
    }

    // Checkpoints

    pub fn begin_checkpoint(&mut self) {
        self.checkpoints.push(Checkpoint::default());
    }

    /// Folds the topmost scope into its parent. The oldest recorded value of each entry wins.
    pub fn commit(&mut self) -> Result<(), StateError> {
        let checkpoint = self.checkpoints.pop().ok_or(StateError::NoCheckpoint)?;
        let Some(parent) = self.checkpoints.last_mut() else {
            return Ok(());
        };
        for (address, original) in checkpoint.accounts {
            parent.accounts.entry(address).or_insert(original);
        }
        for (slot, original) in checkpoint.storage {
            parent.storage.entry(slot).or_insert(original);
        }
        Ok(())
    }

    /// Discards every write made since the matching [`WorldState::begin_checkpoint`].
    pub fn rollback(&mut self) -> Result<(), StateError> {
        let checkpoint = self.checkpoints.pop().ok_or(StateError::NoCheckpoint)?;
        for (address, original) in checkpoint.accounts {
            match original {
                Some(info) => {
                    self.accounts.insert(address, info);
                }
                None => {
                    self.accounts.remove(&address);
                }
            }
        }
        for ((address, key), original) in checkpoint.storage {
            Self::write_slot(&mut self.storage, address, key, original);
        }
        Ok(())
    }

    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    fn journal_account(&mut self, address: Address) {
        if let Some(checkpoint) = self.checkpoints.last_mut() {
            if let Entry::Vacant(entry) = checkpoint.accounts.entry(address) {
                entry.insert(self.accounts.get(&address).cloned());
            }
        }
    }

    fn journal_slot(&mut self, address: Address, key: U256) {
        if let Some(checkpoint) = self.checkpoints.last_mut() {
            if let Entry::Vacant(entry) = checkpoint.storage.entry((address, key)) {
                let current = self
                    .storage
                    .get(&address)
                    .and_then(|slots| slots.get(&key))
                    .copied()
                    .unwrap_or_default();
                entry.insert(current);
            }
        }
    }

    fn write_slot(
        storage: &mut FxHashMap<Address, FxHashMap<U256, U256>>,
        address: Address,
        key: U256,
        value: U256,
    ) {
        if value.is_zero() {
            if let Some(slots) = storage.get_mut(&address) {
                slots.remove(&key);
                if slots.is_empty() {
                    storage.remove(&address);
                }
            }
        } else {
            storage.entry(address).or_default().insert(key, value);
        }
    }

    fn modify_account(&mut self, address: Address, f: impl FnOnce(&mut AccountInfo)) {
        self.journal_account(address);
        f(self.accounts.entry(address).or_default());
    }

    // Reads

    pub fn account(&self, address: &Address) -> Option<&AccountInfo> {
        self.accounts.get(address)
    }

    /// The account at `address`, or an empty one if it does not exist.
    pub fn get_account(&self, address: Address) -> AccountInfo {
        self.accounts.get(&address).cloned().unwrap_or_default()
    }

    pub fn get_storage(&self, address: Address, key: U256) -> U256 {
        self.storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or_default()
    }

    pub fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    pub fn account_exists_and_is_empty(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .is_some_and(|account| account.is_empty())
    }

    /// Exists and is not empty.
    pub fn is_account_alive(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .is_some_and(|account| !account.is_empty())
    }

    pub fn account_has_code_or_nonce(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .is_some_and(|account| account.has_code() || account.has_nonce())
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &AccountInfo)> {
        self.accounts.iter()
    }

    // Writes

    pub fn set_storage(&mut self, address: Address, key: U256, value: U256) {
        self.journal_slot(address, key);
        Self::write_slot(&mut self.storage, address, key, value);
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.modify_account(address, |account| account.balance = balance);
    }

    /// Credits `amount`, creating the account if needed.
    pub fn increase_balance(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let balance = self
            .get_account(address)
            .balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow)?;
        self.set_balance(address, balance);
        Ok(())
    }

    pub fn increment_nonce(&mut self, address: Address) -> Result<(), StateError> {
        let nonce = self
            .get_account(address)
            .nonce
            .checked_add(1)
            .ok_or(StateError::NonceOverflow)?;
        self.modify_account(address, |account| account.nonce = nonce);
        Ok(())
    }

    /// Code is write-once.
    pub fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), StateError> {
        if self.get_account(address).has_code() {
            return Err(StateError::CodeAlreadySet);
        }
        self.modify_account(address, |account| account.code = code);
        Ok(())
    }

    /// Moves `amount` from `from` to `to`. Fails without writing anything when `from`
    /// cannot afford it.
    pub fn move_ether(&mut self, from: Address, to: Address, amount: U256) -> Result<(), StateError> {
        let sender_balance = self.get_account(from).balance;
        let remaining = sender_balance
            .checked_sub(amount)
            .ok_or(StateError::InsufficientFunds { amount })?;
        self.set_balance(from, remaining);
        self.increase_balance(to, amount)
    }

    /// Creates `address` empty if it does not exist yet. Which accounts a transaction
    /// touched is read from its frame traces, not from here.
    pub fn touch(&mut self, address: Address) {
        if !self.account_exists(address) {
            self.modify_account(address, |_| {});
        }
    }

    /// Wipes the storage of `address`, keeping the account itself.
    pub fn destroy_storage(&mut self, address: Address) {
        let keys: Vec<U256> = self
            .storage
            .get(&address)
            .map(|slots| slots.keys().copied().collect())
            .unwrap_or_default();
        for key in keys {
            self.set_storage(address, key, U256::zero());
        }
    }

    pub fn destroy_account(&mut self, address: Address) {
        self.destroy_storage(address);
        self.journal_account(address);
        self.accounts.remove(&address);
    }

    // Commitment

    pub fn storage_root(&self, address: Address) -> H256 {
        let mut trie = Trie::new_secured();
        if let Some(slots) = self.storage.get(&address) {
            for (key, value) in slots {
                trie.insert(&key.to_big_endian(), value.encode_to_vec());
            }
        }
        trie.hash()
    }

    /// Root of the secured account trie.
    pub fn state_root(&self) -> H256 {
        let mut trie = Trie::new_secured();
        for (address, info) in &self.accounts {
            let account_state = AccountState {
                nonce: info.nonce,
                balance: info.balance,
                storage_root: self.storage_root(*address),
                code_hash: info.code_hash(),
            };
            trie.insert(address.as_bytes(), account_state.encode_to_vec());
        }
        trie.hash()
    }
}
