use clap::Parser;
use ferrite::cli::CLI;

fn main() -> eyre::Result<()> {
    let CLI { opts, command } = CLI::parse();
    command.run(&opts)
}
