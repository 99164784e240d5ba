/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Side length of the acquisition grid, in tiles.
pub const GRID_SIZE: usize = 5;

/// Number of tiles (fields) per channel of one well.
pub const TILE_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Sorted-tile index placed at each grid cell.
///
/// Field 0 sits at the centre; the spiral moves right, then winds clockwise
/// through the inner ring (1-8) and the outer ring (9-24).
pub const SPIRAL_ORDER: [[usize; GRID_SIZE]; GRID_SIZE] = [
    [20, 21, 22, 23, 24],
    [19, 6, 7, 8, 9],
    [18, 5, 0, 1, 10],
    [17, 4, 3, 2, 11],
    [16, 15, 14, 13, 12],
];

/// Number of channels in a composite image.
pub const COMPOSITE_CHANNEL_COUNT: usize = 3;

/// Default lower clip fraction for the contrast stretch (0.1%).
/// The upper fraction defaults to `1.0 - DEFAULT_LOW_PERCENTILE`.
pub const DEFAULT_LOW_PERCENTILE: f64 = 0.001;

/// Number of histogram bins needed to cover every u16 value.
pub const U16_HISTOGRAM_BINS: usize = 65_536;

/// Separator between filename segments.
pub const SEGMENT_SEPARATOR: char = '_';

/// Separator between segments of the output filename.
pub const OUTPUT_SEPARATOR: char = '-';
