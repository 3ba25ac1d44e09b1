use serde::{Deserialize, Serialize};

/// Protocol versions, ordered by activation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Fork {
    #[default]
    Frontier,
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    #[serde(default)]
    pub homestead_block: Option<u64>,
    /// TangerineWhistle activation.
    #[serde(default, rename = "eip150Block")]
    pub eip150_block: Option<u64>,
    /// SpuriousDragon activation.
    #[serde(default, rename = "eip155Block")]
    pub eip155_block: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainConfig {
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 1,
            homestead_block: Some(1_150_000),
            eip150_block: Some(2_463_000),
            eip155_block: Some(2_675_000),
        }
    }

    /// A chain where every fork is active from genesis on.
    pub const fn with_fork_from_genesis(chain_id: u64, fork: Fork) -> Self {
        Self {
            chain_id,
            homestead_block: genesis_activation(fork, Fork::Homestead),
            eip150_block: genesis_activation(fork, Fork::TangerineWhistle),
            eip155_block: genesis_activation(fork, Fork::SpuriousDragon),
        }
    }

    fn is_activated(activation: Option<u64>, block_number: u64) -> bool {
        activation.is_some_and(|activation| block_number >= activation)
    }

    pub fn is_homestead_activated(&self, block_number: u64) -> bool {
        Self::is_activated(self.homestead_block, block_number)
    }

    pub fn is_tangerine_whistle_activated(&self, block_number: u64) -> bool {
        Self::is_activated(self.eip150_block, block_number)
    }

    pub fn is_spurious_dragon_activated(&self, block_number: u64) -> bool {
        Self::is_activated(self.eip155_block, block_number)
    }

    pub fn fork(&self, block_number: u64) -> Fork {
        if self.is_spurious_dragon_activated(block_number) {
            Fork::SpuriousDragon
        } else if self.is_tangerine_whistle_activated(block_number) {
            Fork::TangerineWhistle
        } else if self.is_homestead_activated(block_number) {
            Fork::Homestead
        } else {
            Fork::Frontier
        }
    }
}

const fn genesis_activation(target: Fork, activation: Fork) -> Option<u64> {
    if (target as u8) >= (activation as u8) {
        Some(0)
    } else {
        None
    }
}
