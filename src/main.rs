use anyhow::Result;
use clap::Parser;

use beaver_zones::cli::{Cli, Commands};
use beaver_zones::commands::{capacity, habitat};

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Capacity(args) => capacity::run(&cli, args),
        Commands::Habitat(args) => habitat::run(&cli, args),
    }
}
