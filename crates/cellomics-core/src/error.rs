use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CellomicsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed Cellomics filename {name:?}: {reason}")]
    MalformedFilename { name: String, reason: String },

    #[error("Expected {expected} tiles for stitching, found {found}")]
    TileCount { expected: usize, found: usize },

    #[error("Tile {} has shape {found:?}, expected {expected:?}", .path.display())]
    TileShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Channel image mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("Unsupported target bit depth: {0} (expected 8, 16 or none)")]
    UnsupportedBitDepth(String),

    #[error("Invalid channel order {0:?}: must be a permutation of [0, 1, 2]")]
    InvalidChannelOrder(String),

    #[error("Invalid stretch percentiles: low={low}, high={high}")]
    InvalidStretch { low: f64, high: f64 },

    #[error("Cannot composite: every channel is absent")]
    EmptyComposite,

    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl CellomicsError {
    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFilename {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CellomicsError>;
