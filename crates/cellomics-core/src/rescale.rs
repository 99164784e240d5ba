//! Percentile contrast stretch and bit-depth quantization.
//!
//! Cellomics tiles hold 12-bit intensities in 16-bit containers. Before
//! compositing, each stitched channel is stretched into [0, 1] between two
//! intensity percentiles and quantized to the requested output depth.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_LOW_PERCENTILE, PARALLEL_PIXEL_THRESHOLD, U16_HISTOGRAM_BINS};
use crate::error::{CellomicsError, Result};
use crate::frame::{ChannelImage, StitchedImage};

/// Output depth of a rescaled channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetBitDepth {
    #[default]
    Eight,
    Sixteen,
    /// Keep the normalized [0, 1] floating-point image.
    Float,
}

impl TargetBitDepth {
    /// Bit count, or `None` for float output.
    pub fn bits(&self) -> Option<u32> {
        match self {
            Self::Eight => Some(8),
            Self::Sixteen => Some(16),
            Self::Float => None,
        }
    }
}

impl TryFrom<u32> for TargetBitDepth {
    type Error = CellomicsError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(CellomicsError::UnsupportedBitDepth(other.to_string())),
        }
    }
}

impl TryFrom<Option<u32>> for TargetBitDepth {
    type Error = CellomicsError;

    fn try_from(bits: Option<u32>) -> Result<Self> {
        bits.map_or(Ok(Self::Float), Self::try_from)
    }
}

impl FromStr for TargetBitDepth {
    type Err = CellomicsError;

    /// Accepts `8`, `16`, `none` or `float`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("float") {
            return Ok(Self::Float);
        }
        match s.parse::<u32>() {
            Ok(bits) => Self::try_from(bits),
            Err(_) => Err(CellomicsError::UnsupportedBitDepth(s.to_string())),
        }
    }
}

impl TryFrom<String> for TargetBitDepth {
    type Error = CellomicsError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TargetBitDepth> for String {
    fn from(depth: TargetBitDepth) -> Self {
        depth.to_string()
    }
}

impl fmt::Display for TargetBitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            Some(bits) => write!(f, "{bits}"),
            None => write!(f, "none"),
        }
    }
}

/// Percentile clip bounds for the contrast stretch, as fractions in [0, 1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchConfig {
    pub low_percentile: f64,
    /// Defaults to `1.0 - low_percentile` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_percentile: Option<f64>,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            low_percentile: DEFAULT_LOW_PERCENTILE,
            high_percentile: None,
        }
    }
}

impl StretchConfig {
    /// Stretch between the true minimum and maximum.
    pub fn full_range() -> Self {
        Self {
            low_percentile: 0.0,
            high_percentile: Some(1.0),
        }
    }

    /// Resolved `(low, high)` bounds, validated to satisfy
    /// `0 <= low < high <= 1`.
    pub fn bounds(&self) -> Result<(f64, f64)> {
        let low = self.low_percentile;
        let high = self.high_percentile.unwrap_or(1.0 - low);
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low >= high {
            return Err(CellomicsError::InvalidStretch { low, high });
        }
        Ok((low, high))
    }
}

/// Percentile `q` in [0, 1] of the values counted in `histogram`, linearly
/// interpolated between neighbouring order statistics.
fn histogram_percentile(histogram: &[usize], total: usize, q: f64) -> f64 {
    let rank = q * (total - 1) as f64;
    let lo_rank = rank.floor() as usize;
    let hi_rank = rank.ceil() as usize;
    let lo = order_statistic(histogram, lo_rank);
    let hi = if hi_rank == lo_rank {
        lo
    } else {
        order_statistic(histogram, hi_rank)
    };
    lo + (hi - lo) * (rank - lo_rank as f64)
}

/// Value of the `k`-th smallest element (0-based) counted in `histogram`.
fn order_statistic(histogram: &[usize], k: usize) -> f64 {
    let mut cumulative = 0usize;
    for (value, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative > k {
            return value as f64;
        }
    }
    (histogram.len() - 1) as f64
}

/// Linear contrast stretch into [0, 1].
///
/// Values at or below the low percentile map to 0, values at or above the
/// high percentile map to 1. A flat image maps to all zeros.
pub fn stretch(image: &StitchedImage, config: &StretchConfig) -> Result<Array2<f32>> {
    Ok(stretch_f64(image, config)?.mapv(|v| v as f32))
}

/// Double-precision stretch. Quantization to 16 bits needs the headroom:
/// `f32` spacing near 65535 is coarse enough to flip rounding.
fn stretch_f64(image: &StitchedImage, config: &StretchConfig) -> Result<Array2<f64>> {
    let (low, high) = config.bounds()?;
    if image.is_empty() {
        return Ok(Array2::zeros(image.dim()));
    }

    let mut histogram = vec![0usize; U16_HISTOGRAM_BINS];
    for &v in image.iter() {
        histogram[v as usize] += 1;
    }
    let total = image.len();
    let q0 = histogram_percentile(&histogram, total, low);
    let q1 = histogram_percentile(&histogram, total, high);
    let range = q1 - q0;

    let normalize = |v: u16| -> f64 {
        if range <= 0.0 {
            0.0
        } else {
            ((v as f64 - q0) / range).clamp(0.0, 1.0)
        }
    };

    let mut out = Array2::<f64>::zeros(image.dim());
    let zip = Zip::from(&mut out).and(image);
    if image.len() >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(|d, &s| *d = normalize(s));
    } else {
        zip.for_each(|d, &s| *d = normalize(s));
    }
    Ok(out)
}

/// Stretch a stitched channel and quantize it to `target`.
///
/// Quantization rounds half to even, so a full-range stretch of
/// `[0, 2047, 4095]` to 8 bits gives `[0, 127, 255]`.
pub fn rescale(
    image: &StitchedImage,
    target: TargetBitDepth,
    config: &StretchConfig,
) -> Result<ChannelImage> {
    let normalized = stretch_f64(image, config)?;
    let rescaled = match target {
        TargetBitDepth::Eight => {
            ChannelImage::U8(normalized.mapv(|v| (v * 255.0).round_ties_even() as u8))
        }
        TargetBitDepth::Sixteen => {
            ChannelImage::U16(normalized.mapv(|v| (v * 65535.0).round_ties_even() as u16))
        }
        TargetBitDepth::Float => ChannelImage::F32(normalized.mapv(|v| v as f32)),
    };
    Ok(rescaled)
}
