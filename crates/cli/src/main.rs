//! Command-line entry point for matmul-rl.

use anyhow::Result;
use clap::Parser;
use matmul_rl_training::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
