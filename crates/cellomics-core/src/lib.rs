//! Reconstruct full-well images from tiled Cellomics high-content-screening
//! exports: decode tile filenames, group them by well and channel, stitch the
//! 5x5 spiral, rescale from 12 bits and composite up to three channels.

pub mod composite;
pub mod consts;
pub mod error;
pub mod filename;
pub mod frame;
pub mod group;
pub mod io;
pub mod pipeline;
pub mod rescale;
pub mod stitch;
