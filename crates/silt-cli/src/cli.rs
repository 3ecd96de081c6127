use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "silt",
    about = "silt — embedded ordered key-value store",
    version,
)]
pub struct Cli {
    /// Root directory for the database files (created if absent)
    pub root_dir: PathBuf,

    /// Memtable entry count before freeze and flush
    #[arg(long, default_value_t = 1024)]
    pub flush_limit: usize,
}
