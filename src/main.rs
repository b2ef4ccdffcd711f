use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use haui::au::{
    Checkpoint, IncrementalMiner, Item, LogSink, MinerConfig, ReportSink, Threshold,
    TransactionReader,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "haui", about = "Incremental high average-utility itemset mining")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct ThresholdArgs {
    /// Minimum average utility.
    #[arg(long)]
    min_au: Option<f64>,
    /// Minimum average utility as a fraction of total database utility.
    #[arg(long)]
    min_ratio: Option<f64>,
}

impl ThresholdArgs {
    fn threshold(&self) -> Option<Threshold> {
        match (self.min_au, self.min_ratio) {
            (Some(value), _) => Some(Threshold::Absolute(value)),
            (None, Some(ratio)) => Some(Threshold::Relative(ratio)),
            (None, None) => None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert transactions one by one, logging every change to the result set.
    Mine {
        /// Transactions, one per line (`item:utility ...` or SPMF utility format).
        input: PathBuf,
        #[command(flatten)]
        threshold: ThresholdArgs,
        /// Resume from a checkpoint written by a previous run; the threshold
        /// stored in the checkpoint applies.
        #[arg(long, conflicts_with_all = ["min_au", "min_ratio"])]
        resume: Option<PathBuf>,
        /// Write a checkpoint after the last transaction.
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Re-derive every bound after each insertion.
        #[arg(long)]
        verify: bool,
    },
    /// Mine the whole input from scratch.
    Batch {
        input: PathBuf,
        #[command(flatten)]
        threshold: ThresholdArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mine {
            input,
            threshold,
            resume,
            checkpoint,
            verify,
        } => run_mine(input, threshold.threshold(), resume, checkpoint, verify)?,
        Commands::Batch { input, threshold } => {
            let threshold = threshold
                .threshold()
                .context("one of --min-au or --min-ratio is required")?;
            run_batch(input, threshold)?
        }
    }

    Ok(())
}

fn run_mine(
    input: PathBuf,
    threshold: Option<Threshold>,
    resume: Option<PathBuf>,
    checkpoint: Option<PathBuf>,
    verify: bool,
) -> Result<()> {
    let mut miner = match (resume, threshold) {
        (Some(path), None) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open checkpoint {}", path.display()))?;
            let mut restored = Checkpoint::read_json(BufReader::new(file))
                .and_then(IncrementalMiner::restore)
                .with_context(|| format!("failed to restore checkpoint {}", path.display()))?;
            if verify {
                restored.set_verification(true);
            }
            info!(
                transactions = restored.stats().transactions,
                results = restored.stats().results,
                "resumed from checkpoint"
            );
            restored
        }
        (None, Some(threshold)) => {
            let config = MinerConfig {
                threshold,
                verify_after_insert: verify,
            };
            IncrementalMiner::new(config).context("invalid threshold")?
        }
        (Some(_), Some(_)) => bail!("--resume takes its threshold from the checkpoint"),
        (None, None) => bail!("one of --min-au, --min-ratio or --resume is required"),
    };

    let start = Instant::now();
    let mut sink = LogSink;
    for (idx, transaction) in open_transactions(&input)?.enumerate() {
        let transaction =
            transaction.with_context(|| format!("failed to read {}", input.display()))?;
        let report = miner
            .insert(&transaction)
            .with_context(|| format!("transaction {} rejected", idx + 1))?;
        sink.accept(&report);
    }

    let stats = miner.stats();
    info!(
        transactions = stats.transactions,
        items = stats.items,
        tree_nodes = stats.tree_nodes,
        expanded = stats.expanded_nodes,
        results = stats.results,
        min_average_utility = stats.min_average_utility,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "mining finished"
    );

    if let Some(path) = checkpoint {
        let file = File::create(&path)
            .with_context(|| format!("failed to create checkpoint {}", path.display()))?;
        miner
            .checkpoint()
            .write_json(BufWriter::new(file))
            .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
    }

    print_results(&miner.current_results())
}

fn run_batch(input: PathBuf, threshold: Threshold) -> Result<()> {
    let transactions = open_transactions(&input)?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to read {}", input.display()))?;

    let start = Instant::now();
    let results = haui::au::mine_map(&transactions, threshold).context("batch mining failed")?;
    info!(
        transactions = transactions.len(),
        results = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch mining finished"
    );

    print_results(&results)
}

fn open_transactions(path: &Path) -> Result<TransactionReader<BufReader<File>>> {
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    Ok(TransactionReader::new(BufReader::new(file)))
}

fn print_results(results: &BTreeMap<Vec<Item>, f64>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for (itemset, average) in results {
        let items: Vec<String> = itemset.iter().map(|item| item.to_string()).collect();
        writeln!(out, "{}\t#AUTIL: {:.4}", items.join(" "), average)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_rejects_a_second_threshold() {
        let args = ["haui", "mine", "in.txt", "--resume", "cp.json", "--min-au", "2"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["haui", "mine", "in.txt", "--resume", "cp.json", "--min-ratio", "0.1"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn resume_accepts_verification() {
        let args = ["haui", "mine", "in.txt", "--resume", "cp.json", "--verify"];
        match Cli::try_parse_from(args).map(|cli| cli.command) {
            Ok(Commands::Mine { resume, verify, threshold, .. }) => {
                assert_eq!(resume, Some(PathBuf::from("cp.json")));
                assert!(verify);
                assert_eq!(threshold.threshold(), None);
            }
            other => panic!("unexpected parse {:?}", other),
        }
    }
}
