use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cellomics_core::frame::ChannelOrder;
use cellomics_core::io::FileCodec;
use cellomics_core::pipeline::config::PipelineConfig;
use cellomics_core::pipeline::{run_pipeline_reported, PipelineStage, ProgressReporter};
use cellomics_core::rescale::TargetBitDepth;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::summary::{print_batch_summary, print_pipeline_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Plate export directory containing Cellomics tiles
    pub input: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output bit depth: 8, 16 or none (normalized float) [default: 8]
    #[arg(long)]
    pub bit_depth: Option<TargetBitDepth>,

    /// Source channel for each output slot, comma-separated [default: 0,1,2]
    #[arg(long)]
    pub order: Option<ChannelOrder>,

    /// Lower clip percentile for the contrast stretch (fraction, 0-1) [default: 0.001]
    #[arg(long)]
    pub low_percentile: Option<f64>,

    /// Upper clip percentile (fraction, 0-1); defaults to 1 - low
    #[arg(long)]
    pub high_percentile: Option<f64>,

    /// Process wells one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Output root directory [default: stitched]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

const DEFAULT_OUTPUT: &str = "stitched";

/// Drives an indicatif bar from pipeline progress events.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_position(0);
        self.bar.set_length(total_items.unwrap_or(0) as u64);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish_stage(&self) {
        let len = self.bar.length().unwrap_or(0);
        self.bar.set_position(len);
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let base = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        PipelineConfig {
            output: PathBuf::from(DEFAULT_OUTPUT),
            ..Default::default()
        }
    };
    let config = layer_args(base, args);

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    debug!(?config, "Pipeline config");
    print_pipeline_summary(&config);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: pb.clone() });

    let report = run_pipeline_reported(&config, Arc::new(FileCodec), reporter)?;
    pb.finish_with_message("Done");

    print_batch_summary(&report, &config);

    if !report.is_success() {
        bail!(
            "{} of {} wells failed",
            report.failure_count(),
            report.wells.len()
        );
    }
    Ok(())
}

/// Apply command-line flags on top of `base`. Flags left unset keep the
/// value from the config file (or the built-in default).
fn layer_args(mut config: PipelineConfig, args: &RunArgs) -> PipelineConfig {
    config.input = args.input.clone();
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    if let Some(depth) = args.bit_depth {
        config.target_bit_depth = depth;
    }
    if let Some(order) = args.order {
        config.order = order;
    }
    if let Some(low) = args.low_percentile {
        config.stretch.low_percentile = low;
    }
    if args.high_percentile.is_some() {
        config.stretch.high_percentile = args.high_percentile;
    }
    if args.sequential {
        config.parallel = false;
    }
    config
}
