use ndarray::{s, Array2};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{GRID_SIZE, SPIRAL_ORDER, TILE_COUNT};
use crate::error::{CellomicsError, Result};
use crate::frame::StitchedImage;
use crate::group::TileRef;
use crate::io::ImageCodec;

/// Grid cell `(row, col)` occupied by the tile at sorted position `index`,
/// or `None` if `index` is outside the 25-tile grid.
pub fn spiral_position(index: usize) -> Option<(usize, usize)> {
    (0..GRID_SIZE)
        .flat_map(|row| (0..GRID_SIZE).map(move |col| (row, col)))
        .find(|&(row, col)| SPIRAL_ORDER[row][col] == index)
}

/// Reassemble one channel of one well from its 25 tiles.
///
/// Tiles are sorted by path, which orders them by field thanks to the
/// fixed-width field encoding, then placed edge-to-edge following
/// [`SPIRAL_ORDER`]: field 0 at the centre, winding clockwise outwards.
pub fn stitch(tiles: &[TileRef], codec: &dyn ImageCodec) -> Result<StitchedImage> {
    if tiles.len() != TILE_COUNT {
        return Err(CellomicsError::TileCount {
            expected: TILE_COUNT,
            found: tiles.len(),
        });
    }

    let mut sorted: Vec<&TileRef> = tiles.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let images: Vec<Array2<u16>> = sorted
        .par_iter()
        .map(|tile| codec.read_tile(&tile.path))
        .collect::<Result<_>>()?;

    let (th, tw) = images[0].dim();
    for (tile, image) in sorted.iter().zip(&images) {
        if image.dim() != (th, tw) {
            return Err(CellomicsError::TileShapeMismatch {
                path: tile.path.clone(),
                expected: (th, tw),
                found: image.dim(),
            });
        }
    }

    let mut stitched = StitchedImage::zeros((GRID_SIZE * th, GRID_SIZE * tw));
    for (row, order_row) in SPIRAL_ORDER.iter().enumerate() {
        for (col, &index) in order_row.iter().enumerate() {
            stitched
                .slice_mut(s![th * row..th * (row + 1), tw * col..tw * (col + 1)])
                .assign(&images[index]);
        }
    }

    debug!(
        well = %sorted[0].record.acquisition_key(),
        channel = sorted[0].record.channel,
        height = stitched.nrows(),
        width = stitched.ncols(),
        "Stitched channel"
    );
    Ok(stitched)
}
