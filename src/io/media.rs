// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image pipeline.
//!
//! Decodes uploaded photos into upright RGBA bitmaps and flattens the drawing
//! overlay onto them for export.

use crate::error::{CompositeError, DecodeError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// Decode image bytes into an upright RGBA bitmap.
///
/// Embedded orientation metadata (EXIF) is applied, so the bitmap matches
/// what the user sees in a photo viewer rather than the raw sensor layout.
pub fn load(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(DecodeError::UnsupportedFormat);
    }

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    log::debug!(
        "Decoded image {}x{} ({:?}, {:?})",
        image.width(),
        image.height(),
        image.color(),
        orientation
    );

    Ok(image.into_rgba8())
}

/// Flatten `overlay` onto `base` and drop the alpha channel.
///
/// The overlay is resized to the base dimensions when the drawing surface
/// rasterized at a different resolution. Blending is the usual "over"
/// operator on straight alpha. The result depends only on the two inputs.
pub fn composite(base: &RgbaImage, overlay: &RgbaImage) -> Result<RgbImage, CompositeError> {
    for (layer, bitmap) in [("base", base), ("overlay", overlay)] {
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(CompositeError::EmptyBitmap {
                layer,
                width: bitmap.width(),
                height: bitmap.height(),
            });
        }
    }

    let resized;
    let overlay = if overlay.dimensions() == base.dimensions() {
        overlay
    } else {
        log::debug!(
            "Resizing overlay {:?} to base {:?}",
            overlay.dimensions(),
            base.dimensions()
        );
        resized = imageops::resize(overlay, base.width(), base.height(), FilterType::Triangle);
        &resized
    };

    let mut output = RgbImage::new(base.width(), base.height());
    for ((dst, under), over) in output.pixels_mut().zip(base.pixels()).zip(overlay.pixels()) {
        let src_a = f32::from(over[3]) / 255.0;
        let dst_a = f32::from(under[3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);

        let mut rgb = [0u8; 3];
        if out_a > 0.0 {
            for (c, value) in rgb.iter_mut().enumerate() {
                let blended = (f32::from(over[c]) * src_a
                    + f32::from(under[c]) * dst_a * (1.0 - src_a))
                    / out_a;
                *value = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
        *dst = Rgb(rgb);
    }

    Ok(output)
}
