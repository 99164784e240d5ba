pub mod config;
mod orchestrator;
mod types;
mod well;

pub use orchestrator::{run_batch, run_pipeline, run_pipeline_reported};
pub use types::{BatchReport, NoOpReporter, PipelineStage, ProgressReporter, WellOutput};
pub use well::process_well;
