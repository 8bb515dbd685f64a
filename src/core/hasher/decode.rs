//! In-memory image decoding.
//!
//! The format is sniffed from the byte stream rather than trusted from the
//! entry name. JPEG goes through zune-jpeg (1.5-2x faster than the image
//! crate), everything else through the image crate.

use crate::error::EntryError;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, Rgba};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode an archive entry's bytes into pixels.
///
/// `path` is only used for error messages.
pub fn decode_image(path: &str, bytes: &[u8]) -> Result<DynamicImage, EntryError> {
    let format = image::guess_format(bytes).map_err(|e| EntryError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let image = match format {
        ImageFormat::Jpeg => decode_jpeg(path, bytes).or_else(|_| decode_fallback(path, bytes))?,
        _ => decode_fallback(path, bytes)?,
    };

    if image.width() == 0 || image.height() == 0 {
        return Err(EntryError::EmptyImage {
            path: path.to_string(),
        });
    }

    Ok(image)
}

fn decode_jpeg(path: &str, bytes: &[u8]) -> Result<DynamicImage, EntryError> {
    let decode_error = |reason: String| EntryError::Decode {
        path: path.to_string(),
        reason,
    };

    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder
        .decode()
        .map_err(|e| decode_error(format!("zune-jpeg decode failed: {:?}", e)))?;

    let info = decoder
        .info()
        .ok_or_else(|| decode_error("missing JPEG header info".to_string()))?;
    let width = info.width as u32;
    let height = info.height as u32;

    let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
        ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8),
        ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8),
        ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8),
        other => return Err(decode_error(format!("unhandled colorspace {:?}", other))),
    };

    image.ok_or_else(|| decode_error("pixel buffer does not match dimensions".to_string()))
}

fn decode_fallback(path: &str, bytes: &[u8]) -> Result<DynamicImage, EntryError> {
    image::load_from_memory(bytes).map_err(|e| EntryError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
