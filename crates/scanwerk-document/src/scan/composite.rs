// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositor — blends a processed luma plane back over the original raster
// at a given intensity. This is the only place enhancement strength is
// applied.

use scanwerk_core::{Result, ScanError};

use crate::image::buffer::{CHANNELS, LumaBuffer, RasterImage};
use crate::image::luma::to_byte;

/// Highest intensity; 100 yields the processed plane exactly.
pub const MAX_INTENSITY: u8 = 100;

/// `out = original + (processed - original) * intensity / 100` for R, G and B.
/// Alpha is copied unchanged.
///
/// `processed` is rounded to a byte before blending, so intensity 100
/// reproduces it channel-exact and intensity 0 returns `original` unchanged.
pub fn composite(original: &RasterImage, processed: &LumaBuffer, intensity: u8) -> Result<RasterImage> {
    let (w, h) = (original.width() as usize, original.height() as usize);
    if processed.width() != w || processed.height() != h {
        return Err(ScanError::InvalidDimensions(format!(
            "processed plane is {}x{}, original is {w}x{h}",
            processed.width(),
            processed.height()
        )));
    }

    let t = intensity.min(MAX_INTENSITY) as f32 / MAX_INTENSITY as f32;
    let mut out = Vec::with_capacity(original.as_bytes().len());
    for (px, &value) in original
        .as_bytes()
        .chunks_exact(CHANNELS)
        .zip(processed.as_slice())
    {
        let v = to_byte(value) as f32;
        for &channel in &px[..3] {
            let c = channel as f32;
            out.push(to_byte(c + (v - c) * t));
        }
        out.push(px[3]);
    }
    RasterImage::new(original.width(), original.height(), out)
}
