//! pitchfx command line: inspect pitch files and the tensors they project to.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use pitchfx::data::dataset::{Batch, Dataset};
use pitchfx::data::loader::{ErrorPolicy, PitchFile};
use pitchfx::data::samples::reference_feature_maps;
use pitchfx::{Config, Projection, ProjectorKind, PITCH_SCHEMA};

#[derive(Parser)]
#[command(name = "pitchfx")]
#[command(about = "Decode pitch-tracking CSV files into classifier tensors", long_about = None)]
struct Cli {
    /// Config file path (TOML); defaults apply when absent
    #[arg(short, long, default_value = "pitchfx.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print each record's decoded fields as a JSON array
    Decode {
        file: Option<PathBuf>,
        #[arg(long, value_enum)]
        on_error: Option<ErrorPolicy>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print each record's projection as a JSON object
    Project {
        file: Option<PathBuf>,
        #[arg(long, value_enum)]
        policy: Option<ProjectorKind>,
        #[arg(long, value_enum)]
        on_error: Option<ErrorPolicy>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Build shuffled batches and report their shapes
    Batches {
        file: Option<PathBuf>,
        #[arg(long, value_enum)]
        policy: Option<ProjectorKind>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        shuffle: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Restart the file when exhausted (requires --max-batches)
        #[arg(long, requires = "max_batches")]
        repeat: bool,
        #[arg(long)]
        max_batches: Option<usize>,
    },
    /// Print the pitch class vocabulary
    Classes,
    /// Print the reference estimator pitches
    Samples,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)
            .with_context(|| format!("loading config {}", cli.config.display()))?
    } else {
        Config::default()
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Decode { file, on_error, limit } => {
            apply_input(&mut config, file, on_error);
            let source = PitchFile::new(&config.input.path, config.input.options.clone()).open()?;
            for record in source.take(limit.unwrap_or(usize::MAX)) {
                let record = record?;
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
            }
        }
        Commands::Project {
            file,
            policy,
            on_error,
            limit,
        } => {
            apply_input(&mut config, file, on_error);
            let kind = policy.unwrap_or(config.dataset.policy);
            let source = PitchFile::new(&config.input.path, config.input.options.clone())
                .open()?
                .projected(kind);
            for projection in source.take(limit.unwrap_or(usize::MAX)) {
                writeln!(out, "{}", projection_json(&projection?))?;
            }
        }
        Commands::Batches {
            file,
            policy,
            batch_size,
            shuffle,
            seed,
            repeat,
            max_batches,
        } => {
            apply_input(&mut config, file, None);
            let ds = &mut config.dataset;
            if let Some(policy) = policy {
                ds.policy = policy;
            }
            if let Some(size) = batch_size {
                ds.batch_size = size;
            }
            if let Some(buffer) = shuffle {
                ds.shuffle_buffer = buffer;
            }
            if let Some(seed) = seed {
                ds.seed = seed;
            }
            ds.repeat |= repeat;
            if ds.repeat && max_batches.is_none() {
                anyhow::bail!("a repeating dataset needs --max-batches");
            }

            let file = PitchFile::new(&config.input.path, config.input.options.clone());
            let dataset = Dataset::new(file, config.dataset.clone())?;
            let mut records = 0;
            for (i, batch) in dataset
                .batches()?
                .take(max_batches.unwrap_or(usize::MAX))
                .enumerate()
            {
                let batch = batch.with_context(|| format!("batch {i}"))?;
                records += batch.len();
                writeln!(out, "{}", batch_json(i, &batch))?;
            }
            log::info!("{records} records batched from {}", config.input.path.display());
        }
        Commands::Classes => {
            for (index, code) in PITCH_SCHEMA.vocabulary.codes().iter().enumerate() {
                writeln!(out, "{index:>2}  {code}")?;
            }
        }
        Commands::Samples => {
            for features in reference_feature_maps() {
                writeln!(out, "{}", serde_json::to_string(&features)?)?;
            }
        }
    }

    Ok(())
}

fn apply_input(config: &mut Config, file: Option<PathBuf>, on_error: Option<ErrorPolicy>) {
    if let Some(path) = file {
        config.input.path = path;
    }
    if let Some(policy) = on_error {
        config.input.options.on_error = policy;
    }
}

fn projection_json(projection: &Projection) -> serde_json::Value {
    match projection {
        Projection::Training(t) => json!({
            "label": t.label.to_vec(),
            "features": t.features.to_vec(),
        }),
        Projection::Estimator(e) => json!({
            "features": e.features,
            "pitch_code": e.pitch_code,
        }),
    }
}

fn batch_json(index: usize, batch: &Batch) -> serde_json::Value {
    match batch {
        Batch::Training(b) => json!({
            "batch": index,
            "labels": b.labels.shape(),
            "features": b.features.shape(),
        }),
        Batch::Estimator(b) => json!({
            "batch": index,
            "features": b.features.iter().map(|(name, col)| (*name, col.len())).collect::<Vec<_>>(),
            "codes": b.codes.len(),
        }),
    }
}
