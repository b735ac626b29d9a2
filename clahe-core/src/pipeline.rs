//! Image-level pipeline:
//! load image -> EXIF orientation -> split alpha -> CLAHE -> merge alpha -> save

use image::{DynamicImage, GrayImage, ImageBuffer, LumaA, Rgba};
use std::path::Path;
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::clahe::{clahe, ClaheParams};
use crate::error::{ClaheError, ClaheResult};
use crate::exif_orientation::apply_exif_orientation;

/// Open an image file and rotate it upright.
pub fn load_image(path: &Path) -> ClaheResult<DynamicImage> {
    let img = image::open(path)?;
    Ok(apply_exif_orientation(img, path))
}

/// Convert a decoded image into an 8-bit buffer of 1 or 3 channels plus an
/// optional alpha plane. Alpha is carried alongside and never equalized.
pub fn split_alpha(img: &DynamicImage) -> ClaheResult<(PixelBuffer, Option<Vec<u8>>)> {
    let (width, height) = (img.width(), img.height());
    let color = img.color();
    let gray = color.channel_count() <= 2;

    let (channels, data, alpha) = match (gray, color.has_alpha()) {
        (true, false) => (1, img.to_luma8().into_raw(), None),
        (true, true) => {
            let (luma, alpha) = deinterleave(&img.to_luma_alpha8().into_raw(), 1);
            (1, luma, Some(alpha))
        }
        (false, false) => (3, img.to_rgb8().into_raw(), None),
        (false, true) => {
            let (rgb, alpha) = deinterleave(&img.to_rgba8().into_raw(), 3);
            (3, rgb, Some(alpha))
        }
    };
    Ok((PixelBuffer::from_raw(width, height, channels, data)?, alpha))
}

/// Reassemble an image from an equalized buffer and its alpha plane.
pub fn merge_alpha(pixels: PixelBuffer, alpha: Option<Vec<u8>>) -> ClaheResult<DynamicImage> {
    let (width, height) = pixels.dimensions();
    let channels = pixels.channels();
    let mismatch = |expected: usize, actual: usize| ClaheError::BufferSizeMismatch { expected, actual };

    let img = match (channels, alpha) {
        (1, None) => {
            let len = pixels.as_raw().len();
            GrayImage::from_raw(width, height, pixels.into_raw())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| mismatch(width as usize * height as usize, len))?
        }
        (3, None) => {
            let len = pixels.as_raw().len();
            image::RgbImage::from_raw(width, height, pixels.into_raw())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| mismatch(width as usize * height as usize * 3, len))?
        }
        (1, Some(alpha)) => {
            let data = interleave(pixels.as_raw(), &alpha, 1)?;
            let len = data.len();
            ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, data)
                .map(DynamicImage::ImageLumaA8)
                .ok_or_else(|| mismatch(width as usize * height as usize * 2, len))?
        }
        (3, Some(alpha)) => {
            let data = interleave(pixels.as_raw(), &alpha, 3)?;
            let len = data.len();
            ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| mismatch(width as usize * height as usize * 4, len))?
        }
        (other, _) => return Err(ClaheError::UnsupportedChannels(other)),
    };
    Ok(img)
}

/// Equalize a decoded image, preserving its alpha channel.
pub fn process_image(img: &DynamicImage, params: &ClaheParams) -> ClaheResult<DynamicImage> {
    let (mut pixels, alpha) = split_alpha(img)?;
    debug!(
        width = pixels.width(),
        height = pixels.height(),
        channels = pixels.channels(),
        has_alpha = alpha.is_some(),
        "equalizing image"
    );
    clahe(&mut pixels, params)?;
    merge_alpha(pixels, alpha)
}

/// Load, equalize and save a single image file. The output format follows
/// the output path's extension.
pub fn process_file(input_path: &Path, output_path: &Path, params: &ClaheParams) -> ClaheResult<()> {
    let img = load_image(input_path)?;
    let result = process_image(&img, params)?;
    result.save(output_path)?;
    Ok(())
}

/// Split `color` samples per pixel from a trailing alpha sample.
fn deinterleave(samples: &[u8], color: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color + 1;
    let pixels = samples.len() / stride;
    let mut colors = Vec::with_capacity(pixels * color);
    let mut alpha = Vec::with_capacity(pixels);
    for px in samples.chunks_exact(stride) {
        colors.extend_from_slice(&px[..color]);
        alpha.push(px[color]);
    }
    (colors, alpha)
}

fn interleave(colors: &[u8], alpha: &[u8], color: usize) -> ClaheResult<Vec<u8>> {
    let pixels = colors.len() / color;
    if alpha.len() != pixels {
        return Err(ClaheError::BufferSizeMismatch {
            expected: pixels,
            actual: alpha.len(),
        });
    }
    let mut out = Vec::with_capacity(pixels * (color + 1));
    for (px, &a) in colors.chunks_exact(color).zip(alpha) {
        out.extend_from_slice(px);
        out.push(a);
    }
    Ok(out)
}
