use crate::error::{ChainError, InvalidBlockError};
use ferrite_common::{
    H256,
    types::{Block, ChainConfig, Genesis},
};
use ferrite_levm::{account::AccountInfo, db::WorldState};
use std::{collections::VecDeque, sync::Arc};

/// The recent canonical history and the world state after its head.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Oldest first, head last.
    pub blocks: VecDeque<Block>,
    pub state: WorldState,
    pub config: ChainConfig,
}

impl Chain {
    /// Builds the genesis state from the allocation. When the genesis file states a
    /// root, the allocation has to produce it.
    pub fn from_genesis(genesis: &Genesis) -> Result<Self, ChainError> {
        let mut state = WorldState::new();
        for (address, account) in &genesis.alloc {
            state.insert_account(
                *address,
                AccountInfo::new(account.balance, account.nonce, account.code.clone()),
                account
                    .storage
                    .iter()
                    .filter(|(_, value)| !value.is_zero())
                    .map(|(key, value)| (*key, *value)),
            );
        }

        let state_root = state.state_root();
        if genesis.state_root.is_some_and(|expected| expected != state_root) {
            return Err(InvalidBlockError::StateRootMismatch.into());
        }

        Ok(Self {
            blocks: VecDeque::from([genesis.get_block(state_root)]),
            state,
            config: genesis.config,
        })
    }

    pub fn head(&self) -> Option<&Block> {
        self.blocks.back()
    }

    /// The block `depth` positions back from the head, which sits at depth 1.
    pub fn ancestor(&self, depth: u64) -> Option<&Block> {
        let depth = usize::try_from(depth).ok()?;
        let index = self.blocks.len().checked_sub(depth)?;
        self.blocks.get(index)
    }

    /// The last `count` blocks, oldest first.
    pub fn recent_blocks(&self, count: usize) -> Vec<&Block> {
        let skip = self.blocks.len().saturating_sub(count);
        self.blocks.iter().skip(skip).collect()
    }

    /// Hashes reachable by BLOCKHASH, oldest first with the head last.
    ///
    /// Every retained block contributes its parent hash, so the window reaches one
    /// block further back than the blocks kept.
    pub fn block_hashes(&self) -> Arc<[H256]> {
        let mut hashes: Vec<H256> = self
            .blocks
            .iter()
            .map(|block| block.header.parent_hash)
            .collect();
        if let Some(head) = self.head() {
            hashes.push(head.hash());
        }
        hashes.into()
    }

    /// Appends `block` as the new head and drops blocks beyond `history_window`.
    pub(crate) fn push_block(&mut self, block: Block, history_window: usize) {
        self.blocks.push_back(block);
        while self.blocks.len() > history_window.max(1) {
            self.blocks.pop_front();
        }
    }
}
