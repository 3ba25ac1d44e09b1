pub mod chain;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod fork_rules;
pub mod pow;
pub mod validation;

use ::tracing::{debug, info, instrument};
use chain::Chain;
use constants::HISTORY_WINDOW;
use error::ChainError;
use ferrite_common::types::Block;
use ferrite_vm::{BlockExecutionResult, Evm};
use fork_rules::ruleset;
use pow::{NoProofOfWork, ProofOfWork};
use std::{sync::Arc, time::Instant};
use validation::{validate_execution_result, validate_ommers};

/// Configuration options for the blockchain.
#[derive(Debug, Clone)]
pub struct BlockchainOptions {
    /// Whether proof-of-work seals are checked. When off, every seal is accepted.
    pub verify_seal: bool,
    /// Number of recent blocks the chain keeps after each import.
    pub history_window: usize,
    /// Whether to emit performance logging.
    pub perf_logs_enabled: bool,
}

impl Default for BlockchainOptions {
    fn default() -> Self {
        Self {
            verify_seal: true,
            history_window: HISTORY_WINDOW,
            perf_logs_enabled: false,
        }
    }
}

pub struct Blockchain {
    pow: Arc<dyn ProofOfWork>,
    pub options: BlockchainOptions,
}

impl std::fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blockchain")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

struct ImportTimings {
    validated: Instant,
    executed: Instant,
}

impl Blockchain {
    pub fn new(pow: Arc<dyn ProofOfWork>, options: BlockchainOptions) -> Self {
        Self { pow, options }
    }

    pub fn default_with_pow(pow: Arc<dyn ProofOfWork>) -> Self {
        Self::new(pow, BlockchainOptions::default())
    }

    /// A blockchain for chains whose headers carry no real seal.
    pub fn without_seal_verification() -> Self {
        Self::new(
            Arc::new(NoProofOfWork),
            BlockchainOptions {
                verify_seal: false,
                ..Default::default()
            },
        )
    }

    fn pow(&self) -> &dyn ProofOfWork {
        if self.options.verify_seal {
            self.pow.as_ref()
        } else {
            &NoProofOfWork
        }
    }

    /// Validates and executes `block` on top of `chain`, then appends it.
    ///
    /// The whole import runs inside one world state checkpoint. On error the
    /// checkpoint is rolled back and `chain` is left as it was.
    #[instrument(
        level = "trace",
        name = "Block import",
        skip_all,
        fields(namespace = "block_import", number = block.header.number)
    )]
    pub fn state_transition(&self, chain: &mut Chain, block: Block) -> Result<(), ChainError> {
        let since = Instant::now();

        chain.state.begin_checkpoint();
        let (result, timings) = match self.apply_block(chain, &block) {
            Ok(applied) => {
                chain.state.commit()?;
                applied
            }
            Err(error) => {
                chain.state.rollback()?;
                debug!(number = block.header.number, %error, "Rejected block");
                return Err(error);
            }
        };
        let checked = Instant::now();

        let block_hash = block.hash();
        info!(
            number = block.header.number,
            hash = %format!("{block_hash:#x}"),
            gas_used = result.block_gas_used,
            txs = block.body.transactions.len(),
            "Imported block"
        );
        if self.options.perf_logs_enabled {
            Self::print_add_block_logs(
                result.block_gas_used,
                block.header.gas_limit,
                block.header.number,
                block.body.transactions.len(),
                since,
                timings,
                checked,
            );
        }

        chain.push_block(block, self.options.history_window);
        Ok(())
    }

    fn apply_block(
        &self,
        chain: &mut Chain,
        block: &Block,
    ) -> Result<(BlockExecutionResult, ImportTimings), ChainError> {
        let parent = chain
            .head()
            .ok_or(ChainError::ParentNotFound)?
            .header
            .clone();
        let rules = ruleset(chain.config.fork(block.header.number));

        rules.validate_header(&block.header, &parent, self.pow())?;
        validate_ommers(block, chain, self.pow())?;
        let validated = Instant::now();

        let block_hashes = chain.block_hashes();
        let mut evm = Evm::new(&mut chain.state, chain.config, block_hashes);
        let result = rules.apply_body(&mut evm, block)?;
        let executed = Instant::now();

        validate_execution_result(block, &result, chain.state.state_root())?;
        Ok((
            result,
            ImportTimings {
                validated,
                executed,
            },
        ))
    }

    fn print_add_block_logs(
        gas_used: u64,
        gas_limit: u64,
        block_number: u64,
        transactions_count: usize,
        since: Instant,
        timings: ImportTimings,
        checked: Instant,
    ) {
        let interval = checked.duration_since(since).as_millis() as f64;
        if interval != 0f64 {
            let as_gigas = gas_used as f64 / 10_f64.powf(9_f64);
            let throughput = as_gigas / interval * 1000_f64;

            let base_log = format!(
                "[METRIC] BLOCK EXECUTION THROUGHPUT ({}): {:.3} Ggas/s TIME SPENT: {:.0} ms. Gas Used: {:.3} ({:.0}%), #Txs: {}.",
                block_number,
                throughput,
                interval,
                as_gigas,
                (gas_used as f64 / gas_limit as f64) * 100.0,
                transactions_count
            );

            fn percentage(init: Instant, end: Instant, total: f64) -> f64 {
                (end.duration_since(init).as_millis() as f64 / total * 100.0).round()
            }
            let extra_log = format!(
                " validate: {}% exec: {}% check: {}%",
                percentage(since, timings.validated, interval),
                percentage(timings.validated, timings.executed, interval),
                percentage(timings.executed, checked, interval)
            );
            info!("{}{}", base_log, extra_log);
        }
    }
}
