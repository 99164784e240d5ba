pub mod discover;
pub mod image_io;

pub use discover::{discover_tiles, ensure_output_dir};
pub use image_io::{FileCodec, ImageCodec};
