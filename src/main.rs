//! msatrim - Multiple Sequence Alignment Trimmer
//!
//! ## Usage
//!
//! ```bash
//! msatrim aln.fa                          # smart-gap, writes aln.fa.msatrim
//! msatrim aln.fa -m kpic-gappy -g 0.8 -o trimmed.fa
//! msatrim aln.phy --input-format phylip -c -l
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::Result;
use clap::Parser;

use msatrim::cli::{self, Args, RunConfig};

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    // RUST_LOG, when set, overrides the default level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    let config = RunConfig::from_args(args)?;
    let report = cli::run(&config)?;

    for line in report.summary.to_string().lines() {
        log::info!("{}", line);
    }
    if !report.warnings.is_empty() {
        log::warn!("Run finished with {} warning(s)", report.warnings.len());
    }

    Ok(())
}
