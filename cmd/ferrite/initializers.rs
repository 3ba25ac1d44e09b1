use crate::cli::Options;
use ferrite_blockchain::Blockchain;
use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::Directive, fmt, prelude::*};

/// Installs the global subscriber. `RUST_LOG` overrides the level given on the
/// command line.
pub fn init_tracing(opts: &Options) {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();

    let include_target = matches!(opts.log_level, Level::DEBUG | Level::TRACE);
    let fmt_layer = fmt::layer().with_target(include_target);

    // A second call (tests running several commands) keeps the first subscriber.
    if let Err(err) = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(log_filter))
        .try_init()
    {
        tracing::debug!(%err, "Tracing subscriber already installed");
    }
}

/// Ethash is not bundled, so sealed chains cannot be verified here.
pub fn init_blockchain(no_seal: bool, perf_logs_enabled: bool) -> eyre::Result<Blockchain> {
    if !no_seal {
        eyre::bail!(
            "no proof-of-work engine is bundled, seals cannot be verified; pass --no-seal to import without seal verification"
        );
    }
    let mut blockchain = Blockchain::without_seal_verification();
    blockchain.options.perf_logs_enabled = perf_logs_enabled;
    Ok(blockchain)
}
