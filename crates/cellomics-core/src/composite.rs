use ndarray::{s, Array2, Array3};
use num_traits::Zero;

use crate::consts::COMPOSITE_CHANNEL_COUNT;
use crate::error::{CellomicsError, Result};
use crate::frame::{ChannelImage, ChannelOrder, CompositeImage, PixelType};

/// Stack three optional same-shaped channels into an (H, W, 3) array.
///
/// Output slot `c` receives `images[order.source(c)]`, or zeros when that
/// channel is absent.
pub fn stack_channels<T>(
    images: [Option<&Array2<T>>; COMPOSITE_CHANNEL_COUNT],
    order: ChannelOrder,
) -> Result<Array3<T>>
where
    T: Copy + Zero,
{
    let (h, w) = images
        .iter()
        .flatten()
        .next()
        .map(|img| img.dim())
        .ok_or(CellomicsError::EmptyComposite)?;

    for img in images.iter().flatten() {
        if img.dim() != (h, w) {
            return Err(CellomicsError::ShapeMismatch {
                expected: format!("{h}x{w}"),
                found: format!("{}x{}", img.nrows(), img.ncols()),
            });
        }
    }

    let mut out = Array3::<T>::zeros((h, w, COMPOSITE_CHANNEL_COUNT));
    for slot in 0..COMPOSITE_CHANNEL_COUNT {
        if let Some(img) = images[order.source(slot)] {
            out.slice_mut(s![.., .., slot]).assign(img);
        }
    }
    Ok(out)
}

/// Composite rescaled channels, any of which may be absent.
///
/// Present channels must share both shape and pixel type.
pub fn stack(
    images: &[Option<ChannelImage>; COMPOSITE_CHANNEL_COUNT],
    order: ChannelOrder,
) -> Result<CompositeImage> {
    let pixel_type = images
        .iter()
        .flatten()
        .next()
        .map(ChannelImage::pixel_type)
        .ok_or(CellomicsError::EmptyComposite)?;

    for img in images.iter().flatten() {
        if img.pixel_type() != pixel_type {
            let (h, w) = img.dim();
            return Err(CellomicsError::ShapeMismatch {
                expected: pixel_type.to_string(),
                found: format!("{h}x{w} {}", img.pixel_type()),
            });
        }
    }

    let composite = match pixel_type {
        PixelType::U8 => CompositeImage::U8(stack_channels(
            images.each_ref().map(|i| match i {
                Some(ChannelImage::U8(a)) => Some(a),
                _ => None,
            }),
            order,
        )?),
        PixelType::U16 => CompositeImage::U16(stack_channels(
            images.each_ref().map(|i| match i {
                Some(ChannelImage::U16(a)) => Some(a),
                _ => None,
            }),
            order,
        )?),
        PixelType::F32 => CompositeImage::F32(stack_channels(
            images.each_ref().map(|i| match i {
                Some(ChannelImage::F32(a)) => Some(a),
                _ => None,
            }),
            order,
        )?),
    };
    Ok(composite)
}
