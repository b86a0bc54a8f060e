// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive binarizer (Sauvola).
//
//   T(x, y) = mean * (1 + k * (stddev / R - 1))
//
// Local mean and deviation come from the integral image pair, so the cost per
// pixel is constant whatever the window size.

use tracing::{debug, instrument};

use crate::image::buffer::LumaBuffer;
use crate::image::integral::IntegralImage;

/// Smallest Sauvola window edge.
const MIN_WINDOW: usize = 15;

/// Window edge for a `width x height` plane: `max(15, min(w, h) / 8)`,
/// forced odd.
pub fn sauvola_window(width: usize, height: usize) -> usize {
    ((width.min(height) / 8) | 1).max(MIN_WINDOW)
}

/// Binarize `luma`: 255 where a sample exceeds its local threshold, else 0.
#[instrument(skip(luma), fields(width = luma.width(), height = luma.height()))]
pub fn sauvola_binarize(luma: &LumaBuffer, k: f64, dynamic_range: f64) -> LumaBuffer {
    let (w, h) = (luma.width(), luma.height());
    let integral = IntegralImage::new(luma);
    let window = sauvola_window(w, h);
    let half = window / 2;
    debug!(window, "Sauvola window selected");

    let mut out = LumaBuffer::new(w, h);
    for y in 0..h {
        let y1 = y.saturating_sub(half);
        let y2 = (y + half).min(h - 1);
        for x in 0..w {
            let x1 = x.saturating_sub(half);
            let x2 = (x + half).min(w - 1);
            let (mean, stddev) = integral.window_stats(x1, y1, x2, y2);
            let threshold = mean * (1.0 + k * (stddev / dynamic_range - 1.0));
            let value = if luma.get(x, y) as f64 > threshold {
                255.0
            } else {
                0.0
            };
            out.set(x, y, value);
        }
    }
    out
}
