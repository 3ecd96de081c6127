use clap::Parser;

use silt_engine::{Engine, EngineOptions};

mod cli;
mod repl;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = cli::Cli::parse();

    let mut engine = Engine::open(EngineOptions {
        root_dir: cli.root_dir,
        memtable_flush_limit: cli.flush_limit,
    })?;
    repl::run(&mut engine)?;
    engine.close()?;
    Ok(())
}
