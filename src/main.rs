//! Log Anomaly CLI - Main Entry Point
//!
//! `normalize`: merge a folder of `*.log` files into the input CSV.
//! `detect`: run the three detection approaches over that CSV.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use log_anomaly_core::constants::APP_VERSION;
use log_anomaly_core::logic::normalizer::{normalize_log_dir, write_records_csv};
use log_anomaly_core::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "log-anomaly")]
#[command(version, about = "Request log anomaly detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge and normalize raw log files into a CSV
    Normalize {
        /// Folder containing *.log files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Normalized CSV to write
        #[arg(short, long, default_value = "normalized_logs.csv")]
        output: PathBuf,
    },

    /// Detect anomalies in a normalized CSV
    Detect(DetectArgs),
}

#[derive(Args)]
struct DetectArgs {
    /// Normalized CSV (Timestamp, Trace-id, Path, HTTP Status Code, User Agent)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON config file; missing keys keep their defaults
    #[arg(short, long, env = "ANOMALY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the anomaly CSVs and summary
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    chunk_size: Option<usize>,

    /// Isolation contamination, structural features
    #[arg(long)]
    contamination: Option<f64>,

    /// Isolation contamination, lexical + structural features
    #[arg(long)]
    lexical_contamination: Option<f64>,

    /// DBSCAN eps
    #[arg(long)]
    radius: Option<f64>,

    /// DBSCAN min_samples
    #[arg(long)]
    min_neighbors: Option<usize>,

    #[arg(long)]
    tfidf_vocab: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// User agent denylist, one signature per line
    #[arg(long)]
    user_agent_file: Option<PathBuf>,
}

impl DetectArgs {
    /// defaults -> config file -> environment -> flags
    fn resolve_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        config.apply_env().context("reading ANOMALY_* environment")?;

        if let Some(v) = self.chunk_size {
            config.chunk_size = v;
        }
        if let Some(v) = self.contamination {
            config.contamination = v;
        }
        if let Some(v) = self.lexical_contamination {
            config.lexical_contamination = v;
        }
        if let Some(v) = self.radius {
            config.neighborhood_radius = v;
        }
        if let Some(v) = self.min_neighbors {
            config.min_neighbors = v;
        }
        if let Some(v) = self.tfidf_vocab {
            config.tfidf_vocab_size = v;
        }
        if let Some(v) = self.seed {
            config.random_seed = v;
        }
        if let Some(path) = &self.user_agent_file {
            config.suspicious_user_agent_file = Some(path.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Normalize { input_dir, output } => {
            let (records, stats) = normalize_log_dir(&input_dir)
                .with_context(|| format!("normalizing logs in {}", input_dir.display()))?;
            write_records_csv(&output, &records)?;
            log::info!(
                "{} lines read, {} records, {} parse failures",
                stats.lines_read,
                stats.records,
                stats.parse_failures()
            );
        }
        Commands::Detect(args) => {
            let config = args.resolve_config()?;
            let pipeline = Pipeline::new(config).context("invalid pipeline configuration")?;
            pipeline
                .run(&args.input)
                .with_context(|| format!("detecting anomalies in {}", args.input.display()))?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting log-anomaly v{}", APP_VERSION);

    if let Err(e) = run(Cli::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
