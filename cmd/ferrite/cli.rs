use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use clap::{ArgAction, Parser as ClapParser, Subcommand as ClapSubcommand};
use ferrite_blockchain::{Blockchain, chain::Chain, error::ChainError};
use tracing::{Level, error, info};

use crate::{
    initializers::{init_blockchain, init_tracing},
    utils::{ChainFile, read_chain_file},
};

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(name = "ferrite", version, about = "Proof-of-work block importer")]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(ClapParser, Debug, Clone)]
pub struct Options {
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        env = "FERRITE_LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        global = true
    )]
    pub log_level: Level,
    #[arg(
        long = "perf-logs",
        action = ArgAction::SetTrue,
        env = "FERRITE_PERF_LOGS",
        help = "Log execution throughput for every imported block.",
        global = true
    )]
    pub perf_logs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            perf_logs: false,
        }
    }
}

#[derive(ClapSubcommand, Debug, Clone)]
pub enum Subcommand {
    #[command(name = "import", about = "Import the blocks of a chain file on top of its genesis")]
    Import {
        #[arg(
            required = true,
            value_name = "CHAIN_FILE",
            help = "Path to a JSON chain file with a `genesis` and its `blocks`"
        )]
        path: PathBuf,
        #[arg(
            long = "no-seal",
            action = ArgAction::SetTrue,
            env = "FERRITE_NO_SEAL",
            help = "Skip proof-of-work seal verification"
        )]
        no_seal: bool,
    },
    #[command(
        name = "state-root",
        about = "Import a chain file and print the resulting state root and head hash"
    )]
    StateRoot {
        #[arg(required = true, value_name = "CHAIN_FILE")]
        path: PathBuf,
        #[arg(
            long = "no-seal",
            action = ArgAction::SetTrue,
            env = "FERRITE_NO_SEAL",
            help = "Skip proof-of-work seal verification"
        )]
        no_seal: bool,
    },
}

impl Subcommand {
    pub fn run(self, opts: &Options) -> eyre::Result<()> {
        init_tracing(opts);

        match self {
            Subcommand::Import { path, no_seal } => {
                let blockchain = init_blockchain(no_seal, opts.perf_logs)?;
                let chain = import_chain_file(&path, &blockchain)?;
                if let Some(head) = chain.head() {
                    info!(
                        number = head.header.number,
                        hash = %format!("{:#x}", head.hash()),
                        "Import finished"
                    );
                }
            }
            Subcommand::StateRoot { path, no_seal } => {
                let blockchain = init_blockchain(no_seal, opts.perf_logs)?;
                let chain = import_chain_file(&path, &blockchain)?;
                let head = chain
                    .head()
                    .ok_or_else(|| eyre::eyre!("Chain has no blocks"))?;
                println!("state root: {:#x}", chain.state.state_root());
                println!("head hash:  {:#x}", head.hash());
            }
        }
        Ok(())
    }
}

pub fn import_chain_file(path: &Path, blockchain: &Blockchain) -> eyre::Result<Chain> {
    info!(path = %path.display(), "Importing blocks from file");
    let chain_file = read_chain_file(path)?;
    Ok(import_blocks(chain_file, blockchain)?)
}

/// Builds the genesis state and applies every block in order, stopping at the first
/// invalid one.
pub fn import_blocks(chain_file: ChainFile, blockchain: &Blockchain) -> Result<Chain, ChainError> {
    let start_time = Instant::now();
    let mut chain = Chain::from_genesis(&chain_file.genesis)?;
    let size = chain_file.blocks.len();

    let mut last_progress_log = Instant::now();
    for (index, block) in chain_file.blocks.into_iter().enumerate() {
        let hash = block.hash();
        let number = block.header.number;

        // Log progress every 10 seconds
        if last_progress_log.elapsed() >= Duration::from_secs(10) {
            let processed = index + 1;
            let percent = (((processed as f64 / size as f64) * 100.0) * 10.0).round() / 10.0;
            info!(processed, total = size, percent, "Import progress");
            last_progress_log = Instant::now();
        }

        if let Err(err) = blockchain.state_transition(&mut chain, block) {
            error!(number, hash = %format!("{hash:#x}"), %err, "Failed to import block");
            return Err(err);
        }
    }

    info!(
        blocks = size,
        seconds = start_time.elapsed().as_secs_f64(),
        "Import completed"
    );
    Ok(chain)
}
