use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::Result;
use crate::filename::AcquisitionKey;
use crate::group::{group_by_acquisition, AcquisitionGroups, TileRef};
use crate::io::{discover_tiles, ImageCodec};

use super::config::PipelineConfig;
use super::types::{BatchReport, NoOpReporter, PipelineStage, ProgressReporter};
use super::well::process_well;

/// Process every well in `groups`.
///
/// Wells are independent: a failing well is recorded in the report and the
/// remaining wells still run.
pub fn run_batch(
    groups: &AcquisitionGroups,
    config: &PipelineConfig,
    codec: &dyn ImageCodec,
    reporter: &Arc<dyn ProgressReporter>,
) -> BatchReport {
    reporter.begin_stage(PipelineStage::Processing, Some(groups.len()));

    let process = |(key, tiles): (&AcquisitionKey, &Vec<TileRef>)| {
        let result = process_well(key, tiles, config, codec);
        if let Err(ref e) = result {
            warn!(well = %key, error = %e, "Well failed");
        }
        reporter.advance();
        (key.clone(), result)
    };

    let wells: Vec<_> = if config.parallel {
        groups.par_iter().map(process).collect()
    } else {
        groups.iter().map(process).collect()
    };
    reporter.finish_stage();

    let report = BatchReport { wells };
    info!(
        wells = report.wells.len(),
        failed = report.failure_count(),
        "Batch complete"
    );
    report
}

/// Discover, group and process every tile under `config.input`, with a
/// thread-safe progress reporter.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    codec: Arc<dyn ImageCodec>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::Discovering, None);
    let paths = discover_tiles(&config.input, &config.extensions)?;
    reporter.finish_stage();
    info!(
        input = %config.input.display(),
        tiles = paths.len(),
        "Discovered tiles"
    );

    reporter.begin_stage(PipelineStage::Grouping, Some(paths.len()));
    let groups = group_by_acquisition(paths)?;
    reporter.finish_stage();
    info!(wells = groups.len(), "Grouped tiles by well");

    Ok(run_batch(&groups, config, codec.as_ref(), &reporter))
}

/// Run the full pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig, codec: Arc<dyn ImageCodec>) -> Result<BatchReport> {
    let reporter: Arc<dyn ProgressReporter> = Arc::new(NoOpReporter);
    run_pipeline_reported(config, codec, reporter)
}
