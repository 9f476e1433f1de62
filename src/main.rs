#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use brc_pipeline::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_LINE_LENGTH};
use brc_pipeline::profile::{run_profiled, ElapsedProfiler, NoopProfiler, Profiler};
use brc_pipeline::{process_file, Config};

/// Prints min/mean/max per station of a `name;value` measurements file.
#[derive(Parser, Debug)]
#[command(name = "brc", version)]
struct Args {
    /// Measurements file, one `name;value` record per line.
    #[arg(default_value = "measurements.txt")]
    input: PathBuf,
    /// Lines per batch handed to a worker.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Aggregation workers. Defaults to the number of logical cores.
    #[arg(long)]
    workers: Option<usize>,
    /// Longest accepted line in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_len: usize,
    /// Log pipeline statistics and the wall-clock time of the run.
    #[arg(long)]
    profile: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.profile { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = Config::default()
        .with_chunk_size(args.chunk_size)
        .with_max_line_len(args.max_line_len);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let mut profiler: Box<dyn Profiler> = if args.profile {
        Box::new(ElapsedProfiler::new())
    } else {
        Box::new(NoopProfiler)
    };
    let report = run_profiled(profiler.as_mut(), || process_file(&args.input, &config))
        .with_context(|| format!("failed processing {}", args.input.display()))?;

    let mut out = BufWriter::new(stdout().lock());
    writeln!(out, "{report}")?;
    out.flush()?;
    Ok(())
}
