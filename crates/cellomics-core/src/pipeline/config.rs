use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::ChannelOrder;
use crate::rescale::{StretchConfig, TargetBitDepth};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Plate export directory, scanned recursively for tiles.
    pub input: PathBuf,
    /// Output root; composites land in `<output>/<plate>/`.
    pub output: PathBuf,
    #[serde(default)]
    pub target_bit_depth: TargetBitDepth,
    /// Source channel for each output slot.
    #[serde(default)]
    pub order: ChannelOrder,
    /// Tile file extensions, matched case-insensitively.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Process wells on the Rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub stretch: StretchConfig,
}

fn default_extensions() -> Vec<String> {
    vec!["tif".to_string(), "tiff".to_string()]
}

fn default_parallel() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            target_bit_depth: TargetBitDepth::default(),
            order: ChannelOrder::default(),
            extensions: default_extensions(),
            parallel: default_parallel(),
            stretch: StretchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject settings that would fail every well, before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.stretch.bounds()?;
        Ok(())
    }
}
