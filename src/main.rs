use anyhow::Result;
use clap::Parser;

use chatcache::{app, cli};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli)
}
