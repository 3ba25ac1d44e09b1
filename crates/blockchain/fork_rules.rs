//! Per-protocol-version consensus rules.
//!
//! Each fork gets a [`Ruleset`]; [`ruleset`] picks the one active for a block. Forks
//! only override what they change, everything else comes from the trait defaults.

use crate::{
    difficulty::{frontier_difficulty, homestead_difficulty},
    error::{ChainError, InvalidBlockError},
    pow::ProofOfWork,
    validation::{validate_header_against_parent, validate_parent_hash},
};
use ferrite_common::{
    U256,
    types::{Block, BlockHeader, Fork},
};
use ferrite_vm::{BlockExecutionResult, Evm};

pub trait Ruleset: Sync {
    fn fork(&self) -> Fork;

    fn calculate_difficulty(&self, header: &BlockHeader, parent: &BlockHeader) -> U256;

    /// Validates `header` against its stored `parent`, including the seal.
    fn validate_header(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        pow: &dyn ProofOfWork,
    ) -> Result<(), ChainError> {
        validate_header_against_parent(header, parent)?;
        let expected = self.calculate_difficulty(header, parent);
        if header.difficulty != expected {
            return Err(InvalidBlockError::DifficultyMismatch {
                expected,
                got: header.difficulty,
            }
            .into());
        }
        validate_parent_hash(header, parent)?;
        pow.verify(header)
    }

    /// Executes the transactions of `block` and settles its rewards.
    fn apply_body(
        &self,
        evm: &mut Evm<'_>,
        block: &Block,
    ) -> Result<BlockExecutionResult, ChainError> {
        Ok(evm.execute_block(block)?)
    }
}

pub struct FrontierRules;

impl Ruleset for FrontierRules {
    fn fork(&self) -> Fork {
        Fork::Frontier
    }

    fn calculate_difficulty(&self, header: &BlockHeader, parent: &BlockHeader) -> U256 {
        frontier_difficulty(
            header.number,
            header.timestamp,
            parent.timestamp,
            parent.difficulty,
        )
    }
}

/// Homestead and the two repricing forks after it share header rules. Their execution
/// differences are carried by the EVM configuration.
pub struct HomesteadRules(Fork);

impl Ruleset for HomesteadRules {
    fn fork(&self) -> Fork {
        self.0
    }

    fn calculate_difficulty(&self, header: &BlockHeader, parent: &BlockHeader) -> U256 {
        homestead_difficulty(
            header.number,
            header.timestamp,
            parent.timestamp,
            parent.difficulty,
        )
    }
}

static FRONTIER: FrontierRules = FrontierRules;
static HOMESTEAD: HomesteadRules = HomesteadRules(Fork::Homestead);
static TANGERINE_WHISTLE: HomesteadRules = HomesteadRules(Fork::TangerineWhistle);
static SPURIOUS_DRAGON: HomesteadRules = HomesteadRules(Fork::SpuriousDragon);

pub fn ruleset(fork: Fork) -> &'static dyn Ruleset {
    match fork {
        Fork::Frontier => &FRONTIER,
        Fork::Homestead => &HOMESTEAD,
        Fork::TangerineWhistle => &TANGERINE_WHISTLE,
        Fork::SpuriousDragon => &SPURIOUS_DRAGON,
    }
}
