mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{build_weights, run};

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logger(cli.verbose);

    match &cli.command {
        Commands::Run(args) => run::run(&cli, args),
        Commands::BuildWeights(args) => build_weights::run(&cli, args),
    }
}
