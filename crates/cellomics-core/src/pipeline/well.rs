use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::composite::stack;
use crate::consts::{COMPOSITE_CHANNEL_COUNT, TILE_COUNT};
use crate::error::{CellomicsError, Result};
use crate::filename::AcquisitionKey;
use crate::frame::ChannelImage;
use crate::group::{group_by_channel, TileRef};
use crate::io::{ensure_output_dir, ImageCodec};
use crate::rescale::rescale;
use crate::stitch::stitch;

use super::config::PipelineConfig;
use super::types::WellOutput;

/// Stitch, rescale and composite every channel of one well, then write the
/// composite to `<output>/<plate>/<prefix>-<plate>-<well>.<suffix>`.
///
/// Nothing is written unless every present channel stitched and rescaled.
pub fn process_well(
    key: &AcquisitionKey,
    tiles: &[TileRef],
    config: &PipelineConfig,
    codec: &dyn ImageCodec,
) -> Result<WellOutput> {
    let first = tiles.first().ok_or(CellomicsError::TileCount {
        expected: TILE_COUNT,
        found: 0,
    })?;
    let out_dir = config.output.join(first.record.plate.to_string());
    let out_path = out_dir.join(first.record.output_filename());

    let channels = group_by_channel(tiles);
    if channels.len() > COMPOSITE_CHANNEL_COUNT {
        warn!(
            well = %key,
            ignored = ?(COMPOSITE_CHANNEL_COUNT..channels.len()).collect::<Vec<_>>(),
            "Well has more than three channels; extra channels are not composited"
        );
    }

    let processed: Vec<Option<ChannelImage>> = (0..COMPOSITE_CHANNEL_COUNT)
        .into_par_iter()
        .map(|channel| match channels.get(channel) {
            Some(channel_tiles) => {
                let stitched = stitch(channel_tiles, codec)?;
                let image = rescale(&stitched, config.target_bit_depth, &config.stretch)?;
                debug!(well = %key, channel, "Channel rescaled");
                Ok(Some(image))
            }
            None => {
                debug!(well = %key, channel, "Channel absent, zero-filling");
                Ok(None)
            }
        })
        .collect::<Result<_>>()?;

    let mut images: [Option<ChannelImage>; COMPOSITE_CHANNEL_COUNT] = Default::default();
    for (slot, image) in images.iter_mut().zip(processed) {
        *slot = image;
    }

    let composite = stack(&images, config.order)?;

    ensure_output_dir(&out_dir)?;
    codec.write_composite(&out_path, &composite)?;
    info!(well = %key, output = %out_path.display(), "Composite saved");

    Ok(WellOutput {
        key: key.clone(),
        path: out_path,
        channels: channels
            .present_channels()
            .into_iter()
            .filter(|&c| c < COMPOSITE_CHANNEL_COUNT)
            .collect(),
    })
}
