// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale reducer — RGBA raster to an f32 luma plane.

use crate::image::buffer::{CHANNELS, LumaBuffer, RasterImage};

/// Rec. 601 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Reduce an RGBA raster to luma. Alpha is ignored.
pub fn to_luma(raster: &RasterImage) -> LumaBuffer {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    let data = raster
        .as_bytes()
        .chunks_exact(CHANNELS)
        .map(|px| wr * px[0] as f32 + wg * px[1] as f32 + wb * px[2] as f32)
        .collect();
    LumaBuffer::from_samples(raster.width() as usize, raster.height() as usize, data)
}

/// Round and clamp a float intensity into the byte range.
///
/// NaN maps to 0.
#[inline]
pub fn to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Clamp a float intensity to `[0, 255]` and truncate it to a histogram bin.
#[inline]
pub fn to_bin(value: f32) -> usize {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as usize
}
