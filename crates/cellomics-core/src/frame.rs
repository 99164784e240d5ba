use std::fmt;

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::consts::COMPOSITE_CHANNEL_COUNT;
use crate::error::{CellomicsError, Result};

/// One channel of one well after stitching, shape = (5 * tile_h, 5 * tile_w).
/// Values keep the source range (12-bit for Cellomics exports).
pub type StitchedImage = Array2<u16>;

/// A rescaled single-channel image.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelImage {
    U8(Array2<u8>),
    U16(Array2<u16>),
    /// Normalized to [0.0, 1.0].
    F32(Array2<f32>),
}

impl ChannelImage {
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::U8(a) => a.dim(),
            Self::U16(a) => a.dim(),
            Self::F32(a) => a.dim(),
        }
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U8(_) => PixelType::U8,
            Self::U16(_) => PixelType::U16,
            Self::F32(_) => PixelType::F32,
        }
    }
}

/// A three-channel image, shape = (height, width, 3).
#[derive(Clone, Debug, PartialEq)]
pub enum CompositeImage {
    U8(Array3<u8>),
    U16(Array3<u16>),
    F32(Array3<f32>),
}

impl CompositeImage {
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Self::U8(a) => a.dim(),
            Self::U16(a) => a.dim(),
            Self::F32(a) => a.dim(),
        }
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U8(_) => PixelType::U8,
            Self::U16(_) => PixelType::U16,
            Self::F32(_) => PixelType::F32,
        }
    }
}

/// Element type of a channel or composite image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelType {
    U8,
    U16,
    F32,
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::F32 => write!(f, "f32"),
        }
    }
}

/// Maps each output slot of a composite to a source channel.
///
/// `order[c]` is the source channel written into output slot `c`, so
/// `[2, 1, 0]` reverses the channels. Always a permutation of `[0, 1, 2]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct ChannelOrder([usize; COMPOSITE_CHANNEL_COUNT]);

impl ChannelOrder {
    pub const IDENTITY: Self = Self([0, 1, 2]);

    pub fn new(order: [usize; COMPOSITE_CHANNEL_COUNT]) -> Result<Self> {
        let mut seen = [false; COMPOSITE_CHANNEL_COUNT];
        for &c in &order {
            if c >= COMPOSITE_CHANNEL_COUNT || seen[c] {
                return Err(CellomicsError::InvalidChannelOrder(format!("{order:?}")));
            }
            seen[c] = true;
        }
        Ok(Self(order))
    }

    /// Source channel for output slot `slot`.
    pub fn source(&self, slot: usize) -> usize {
        self.0[slot]
    }

    pub fn as_array(&self) -> [usize; COMPOSITE_CHANNEL_COUNT] {
        self.0
    }
}

impl Default for ChannelOrder {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<Vec<usize>> for ChannelOrder {
    type Error = CellomicsError;

    fn try_from(order: Vec<usize>) -> Result<Self> {
        let array: [usize; COMPOSITE_CHANNEL_COUNT] = order
            .as_slice()
            .try_into()
            .map_err(|_| CellomicsError::InvalidChannelOrder(format!("{order:?}")))?;
        Self::new(array)
    }
}

impl From<ChannelOrder> for Vec<usize> {
    fn from(order: ChannelOrder) -> Self {
        order.0.to_vec()
    }
}

impl std::str::FromStr for ChannelOrder {
    type Err = CellomicsError;

    /// Parse a comma-separated order such as `2,1,0`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CellomicsError::InvalidChannelOrder(s.to_string());
        let order: Vec<usize> = s
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid())?;
        Self::try_from(order).map_err(|_| invalid())
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a},{b},{c}")
    }
}
