// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decode/encode helpers between encoded image files and `RasterImage`, using
// the `image` crate. The engine itself never touches encoded data; these are
// for callers that own file I/O.

use std::io::Cursor;

use image::ImageFormat;
use scanwerk_core::{Result, ScanError};
use tracing::{debug, info, instrument};

use crate::image::buffer::RasterImage;

/// Decode raw encoded bytes (JPEG, PNG, TIFF, etc.) into an RGBA raster.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<RasterImage> {
    let img = image::load_from_memory(data)
        .map_err(|err| ScanError::Image(format!("failed to decode image: {err}")))?;
    debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
    RasterImage::try_from(img.to_rgba8())
}

/// Load and decode an image file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<std::path::Path>) -> Result<RasterImage> {
    let img = image::open(path.as_ref()).map_err(|err| {
        ScanError::Image(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    RasterImage::try_from(img.to_rgba8())
}

/// Encode a raster as PNG bytes.
pub fn to_png_bytes(raster: RasterImage) -> Result<Vec<u8>> {
    let rgba = raster.into_rgba_image()?;
    let mut buffer = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| ScanError::Image(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}

/// Write a raster to disk. The format is inferred from the file extension.
pub fn save(raster: RasterImage, path: impl AsRef<std::path::Path>) -> Result<()> {
    let rgba = raster.into_rgba_image()?;
    rgba.save(path.as_ref()).map_err(|err| {
        ScanError::Image(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip_is_lossless() {
        let mut bytes = Vec::new();
        for i in 0..6u8 {
            bytes.extend_from_slice(&[i * 40, 255 - i * 40, i, 128 + i]);
        }
        let raster = RasterImage::new(3, 2, bytes).unwrap();
        let png = to_png_bytes(raster.clone()).unwrap();
        assert_eq!(decode(&png).unwrap(), raster);
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(ScanError::Image(_))
        ));
    }
}
