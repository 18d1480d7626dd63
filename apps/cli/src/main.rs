//! docgraph CLI: run a single indexing verb over JSON tables.
//!
//! Loads the primary and secondary tables from disk, applies the verb with
//! arguments from the config file and the command line, and prints the
//! resulting table as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
