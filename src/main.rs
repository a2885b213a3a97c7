//! Command-line shell: argument parsing, trace-file open, replay, summary.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use cache_simulator::cache::{Cache, CacheConfig};
use cache_simulator::replay::Replayer;
use cache_simulator::trace::TraceReader;

#[derive(Parser)]
#[command(
    name = "cache-simulator",
    version,
    about = "Set-associative cache simulator with LRU replacement"
)]
struct Args {
    /// Number of set index bits (S = 2^s is the number of sets)
    #[arg(short = 's')]
    set_bits: u32,
    /// Associativity (number of lines per set)
    #[arg(short = 'E')]
    associativity: usize,
    /// Number of block bits (B = 2^b is the block size)
    #[arg(short = 'b')]
    block_bits: u32,
    /// Name of the valgrind trace to replay
    #[arg(short = 't')]
    trace: PathBuf,
    /// Display trace info for every load, store, and modify
    #[arg(short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    debug!(
        "geometry: s={} E={} b={}, trace {}",
        args.set_bits,
        args.associativity,
        args.block_bits,
        args.trace.display()
    );

    let cache = Cache::new(CacheConfig {
        set_bits: args.set_bits,
        associativity: args.associativity,
        block_bits: args.block_bits,
    })?;

    let file = File::open(&args.trace)
        .with_context(|| format!("failed to open trace {}", args.trace.display()))?;
    let records = TraceReader::new(BufReader::new(file));

    let mut replayer = Replayer::new(cache);
    let stats = if args.verbose {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        replayer.run(records, Some(&mut out as &mut dyn Write))?
    } else {
        replayer.run(records, None)?
    };

    println!(
        "hits:{} misses:{} evictions:{}",
        stats.hits, stats.misses, stats.evictions
    );
    Ok(())
}
