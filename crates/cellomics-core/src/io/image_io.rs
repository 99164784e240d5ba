use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use ndarray::{Array2, Array3};
use tracing::debug;

use crate::error::{CellomicsError, Result};
use crate::frame::CompositeImage;

/// Image decode/encode seam used by the stitcher and the batch pipeline.
///
/// Implementors must be shareable across the Rayon pool; wells and tiles are
/// read concurrently.
pub trait ImageCodec: Send + Sync {
    /// Read one grayscale tile as raw integer intensities.
    fn read_tile(&self, path: &Path) -> Result<Array2<u16>>;

    /// Write a composite, creating or overwriting `path`. Parent directories
    /// must already exist.
    fn write_composite(&self, path: &Path, image: &CompositeImage) -> Result<()>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileCodec;

impl ImageCodec for FileCodec {
    fn read_tile(&self, path: &Path) -> Result<Array2<u16>> {
        load_tile(path)
    }

    fn write_composite(&self, path: &Path, image: &CompositeImage) -> Result<()> {
        save_composite(image, path)
    }
}

/// Load a grayscale tile. 8- and 16-bit luma keep their raw values; any other
/// layout is converted to 16-bit luma first.
pub fn load_tile(path: &Path) -> Result<Array2<u16>> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);

    let data = match img {
        DynamicImage::ImageLuma16(gray) => Array2::from_shape_vec((h, w), gray.into_raw())?,
        DynamicImage::ImageLuma8(gray) => {
            Array2::from_shape_vec((h, w), gray.into_raw())?.mapv(u16::from)
        }
        other => {
            debug!(
                path = %path.display(),
                color = ?other.color(),
                "Converting tile to 16-bit luma"
            );
            Array2::from_shape_vec((h, w), other.to_luma16().into_raw())?
        }
    };
    Ok(data)
}

/// Save a composite, choosing the format from the file extension (TIFF when
/// the extension is unknown).
pub fn save_composite(image: &CompositeImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Tiff);
    let dynamic = match image {
        CompositeImage::U8(data) => DynamicImage::ImageRgb8(to_rgb_buffer(data)?),
        CompositeImage::U16(data) => DynamicImage::ImageRgb16(to_rgb_buffer(data)?),
        CompositeImage::F32(data) => DynamicImage::ImageRgb32F(to_rgb_buffer(data)?),
    };
    dynamic
        .save_with_format(path, format)
        .map_err(|e| match e {
            image::ImageError::Unsupported(u) => {
                CellomicsError::UnsupportedPixelFormat(u.to_string())
            }
            other => other.into(),
        })?;
    Ok(())
}

fn to_rgb_buffer<T>(data: &Array3<T>) -> Result<ImageBuffer<Rgb<T>, Vec<T>>>
where
    T: image::Primitive,
    Rgb<T>: image::Pixel<Subpixel = T>,
{
    let (h, w, channels) = data.dim();
    if channels != 3 {
        return Err(CellomicsError::UnsupportedPixelFormat(format!(
            "{channels}-channel composite"
        )));
    }
    let pixels: Vec<T> = data.as_standard_layout().iter().copied().collect();
    ImageBuffer::from_raw(w as u32, h as u32, pixels).ok_or_else(|| {
        CellomicsError::UnsupportedPixelFormat(format!("{w}x{h} buffer size mismatch"))
    })
}
