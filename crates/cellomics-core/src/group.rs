use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::consts::COMPOSITE_CHANNEL_COUNT;
use crate::error::Result;
use crate::filename::{AcquisitionKey, FilenameRecord};

/// A tile path together with its decoded filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRef {
    pub path: PathBuf,
    pub record: FilenameRecord,
}

impl TileRef {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let record = FilenameRecord::decode(&path)?;
        Ok(Self { path, record })
    }
}

/// Tiles of every well, keyed by `(plate, well)`. Within a well, tiles keep
/// their input order.
pub type AcquisitionGroups = BTreeMap<AcquisitionKey, Vec<TileRef>>;

/// Group tile paths by the well they were acquired in.
pub fn group_by_acquisition<I, P>(paths: I) -> Result<AcquisitionGroups>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut groups = AcquisitionGroups::new();
    for path in paths {
        let tile = TileRef::new(path)?;
        groups
            .entry(tile.record.acquisition_key())
            .or_default()
            .push(tile);
    }
    debug!(wells = groups.len(), "Grouped tiles by acquisition");
    Ok(groups)
}

/// Tiles of one well split by channel.
///
/// Holds a slot for every channel index in `0..=max(2, highest channel)`.
/// Slots with no tiles are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelGroups {
    slots: Vec<Option<Vec<TileRef>>>,
}

impl ChannelGroups {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Tiles of `channel`, or `None` if the channel was not acquired.
    pub fn get(&self, channel: usize) -> Option<&[TileRef]> {
        self.slots.get(channel)?.as_deref()
    }

    pub fn is_present(&self, channel: usize) -> bool {
        self.get(channel).is_some()
    }

    /// Channel indices that have at least one tile.
    pub fn present_channels(&self) -> Vec<usize> {
        (0..self.slots.len())
            .filter(|&c| self.is_present(c))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&[TileRef]>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(c, slot)| (c, slot.as_deref()))
    }
}

/// Split one well's tiles by channel, padding missing channels with absent
/// slots so at least three channels are always available for compositing.
pub fn group_by_channel(tiles: &[TileRef]) -> ChannelGroups {
    let highest = tiles
        .iter()
        .map(|t| t.record.channel as usize)
        .max()
        .unwrap_or(0);
    let slot_count = highest.max(COMPOSITE_CHANNEL_COUNT - 1) + 1;

    let mut slots: Vec<Option<Vec<TileRef>>> = vec![None; slot_count];
    for tile in tiles {
        slots[tile.record.channel as usize]
            .get_or_insert_with(Vec::new)
            .push(tile.clone());
    }

    ChannelGroups { slots }
}
