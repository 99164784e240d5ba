use std::path::PathBuf;

use crate::error::{CellomicsError, Result};
use crate::filename::AcquisitionKey;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Discovering,
    Grouping,
    Processing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovering => write!(f, "Discovering tiles"),
            Self::Grouping => write!(f, "Grouping wells"),
            Self::Processing => write!(f, "Processing wells"),
        }
    }
}

/// A composite written for one well.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellOutput {
    pub key: AcquisitionKey,
    pub path: PathBuf,
    /// Source channels that contributed tiles (absent ones are zero-filled).
    pub channels: Vec<usize>,
}

/// Per-well results of a batch, in well order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub wells: Vec<(AcquisitionKey, Result<WellOutput>)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &WellOutput> {
        self.wells.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&AcquisitionKey, &CellomicsError)> {
        self.wells
            .iter()
            .filter_map(|(k, r)| r.as_ref().err().map(|e| (k, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., well count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One more work item within the current stage has completed.
    fn advance(&self) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
