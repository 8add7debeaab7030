use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use treesum::{ReduceConfig, ReductionRequest, TreeReducer};

#[derive(Parser, Debug)]
#[command(
    name = "treesum",
    about = "Sum an integer array across a tree of parallel workers"
)]
struct Cli {
    /// Input with `H M v1 .. vM` as whitespace-separated integers
    /// (stdin when omitted).
    input: Option<PathBuf>,

    /// Override the tree height given in the input stream.
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let request = read_request(cli.input.as_deref())?;
    let height = cli.height.unwrap_or(request.height);

    let config = ReduceConfig::new(height)?;
    let outcome = TreeReducer::new(config)
        .run(&request.values)
        .context("reduction failed")?;

    println!("{}", outcome.sum);
    Ok(())
}

fn read_request(path: Option<&Path>) -> Result<ReductionRequest> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            ReductionRequest::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse request from {}", path.display()))
        }
        None => ReductionRequest::from_reader(io::stdin().lock())
            .context("failed to parse request from stdin"),
    }
}
