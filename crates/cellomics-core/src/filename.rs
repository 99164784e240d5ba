//! Cellomics filename convention.
//!
//! Tiles exported by the instrument are named
//! `<prefix>_<plate>_<well>f<field>d<channel>[_stitched].<suffix>`, e.g.
//! `MFGTMP_140206180002_A01f00d0.TIF`. Everything the pipeline knows about a
//! tile comes from decoding that name.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{OUTPUT_SEPARATOR, SEGMENT_SEPARATOR};
use crate::error::{CellomicsError, Result};

/// Decoded identity of one tile image.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilenameRecord {
    /// Parent directory as given in the path; empty for bare filenames.
    pub directory: String,
    /// Instrument/run tag.
    pub prefix: String,
    pub plate: u64,
    /// Row letter followed by a two-digit column, e.g. `A01`.
    pub well: String,
    /// Tile index within the well's 5x5 grid.
    pub field: u32,
    pub channel: u32,
    /// Everything after the first period of the base name.
    pub suffix: String,
}

/// Identifies one physical well on one physical plate.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AcquisitionKey {
    pub plate: u64,
    pub well: String,
}

impl fmt::Display for AcquisitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plate, self.well)
    }
}

impl FilenameRecord {
    /// Decode a Cellomics tile path.
    ///
    /// A trailing fourth segment (the `_stitched` tag) is ignored.
    pub fn decode(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.to_string_lossy().into_owned();

        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CellomicsError::malformed(&display, "missing UTF-8 file name"))?;
        let directory = match path.parent() {
            Some(parent) => parent
                .to_str()
                .ok_or_else(|| CellomicsError::malformed(&display, "directory is not UTF-8"))?
                .to_string(),
            None => String::new(),
        };

        let (stem, suffix) = base.split_once('.').unwrap_or((base, ""));

        let mut segments: Vec<&str> = stem.split(SEGMENT_SEPARATOR).collect();
        if segments.len() == 4 {
            segments.pop();
        }
        let &[prefix, plate, code] = segments.as_slice() else {
            return Err(CellomicsError::malformed(
                &display,
                format!("expected 3 '_'-separated segments, found {}", segments.len()),
            ));
        };

        let plate = plate.parse::<u64>().map_err(|_| {
            CellomicsError::malformed(&display, format!("plate {plate:?} is not numeric"))
        })?;
        let (well, field, channel) =
            decode_code(code).map_err(|reason| CellomicsError::malformed(&display, reason))?;

        Ok(Self {
            directory,
            prefix: prefix.to_string(),
            plate,
            well: well.to_string(),
            field,
            channel,
            suffix: suffix.to_string(),
        })
    }

    /// Two-digit column of the well, e.g. `01` for `A01`.
    pub fn column(&self) -> &str {
        &self.well[1..]
    }

    pub fn acquisition_key(&self) -> AcquisitionKey {
        AcquisitionKey {
            plate: self.plate,
            well: self.well.clone(),
        }
    }

    /// Name of the composite image built from this tile's well:
    /// `<prefix>-<plate>-<well>.<suffix>`.
    pub fn output_filename(&self) -> String {
        let stem = format!(
            "{prefix}{sep}{plate}{sep}{well}",
            prefix = self.prefix,
            plate = self.plate,
            well = self.well,
            sep = OUTPUT_SEPARATOR,
        );
        if self.suffix.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.suffix)
        }
    }
}

impl FromStr for FilenameRecord {
    type Err = CellomicsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Split the `A01f00d0` code segment into (well, field, channel).
fn decode_code(code: &str) -> std::result::Result<(&str, u32, u32), String> {
    if !code.is_ascii() || code.len() < 7 {
        return Err(format!(
            "well/field/channel code {code:?} is too short or not ASCII"
        ));
    }

    let well = &code[..3];
    let bytes = well.as_bytes();
    if !(bytes[0].is_ascii_alphabetic()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit())
    {
        return Err(format!("well {well:?} is not a row letter and two-digit column"));
    }

    let field = code[4..6]
        .parse::<u32>()
        .map_err(|_| format!("field {:?} is not numeric", &code[4..6]))?;

    let last = code.chars().next_back().unwrap_or_default();
    let channel = last
        .to_digit(10)
        .ok_or_else(|| format!("channel {last:?} is not a digit"))?;

    Ok((well, field, channel))
}

/// Channel index encoded in a tile filename.
pub fn channel_of(path: impl AsRef<Path>) -> Result<u32> {
    FilenameRecord::decode(path).map(|r| r.channel)
}

/// Two-digit column encoded in a tile filename.
pub fn column_of(path: impl AsRef<Path>) -> Result<String> {
    FilenameRecord::decode(path).map(|r| r.column().to_string())
}

/// `(plate, well)` grouping key of a tile filename.
pub fn acquisition_key_of(path: impl AsRef<Path>) -> Result<AcquisitionKey> {
    FilenameRecord::decode(path).map(|r| r.acquisition_key())
}

/// Plate id from an export directory named `<prefix>_<plate>[_...]`.
pub fn plate_from_directory_name(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let display = path.to_string_lossy().into_owned();
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CellomicsError::malformed(&display, "missing UTF-8 directory name"))?;

    let plate = base.split(SEGMENT_SEPARATOR).nth(1).ok_or_else(|| {
        CellomicsError::malformed(&display, "directory name has no '_' separator")
    })?;
    plate.parse::<u64>().map_err(|_| {
        CellomicsError::malformed(&display, format!("plate {plate:?} is not numeric"))
    })
}
