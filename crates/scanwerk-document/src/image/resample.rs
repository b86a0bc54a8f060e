// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolution reducer/expander: 2x box downsample and bilinear upsample,
// used to bound the cost of background estimation on large photos.

use crate::image::buffer::LumaBuffer;

/// Halve both dimensions by averaging 2x2 blocks.
///
/// Odd dimensions round up; the trailing block averages only the samples
/// that exist.
pub fn downsample_half(src: &LumaBuffer) -> LumaBuffer {
    let (w, h) = (src.width(), src.height());
    let (sw, sh) = (w.div_ceil(2), h.div_ceil(2));
    let mut out = LumaBuffer::new(sw, sh);

    for y in 0..sh {
        let y0 = 2 * y;
        let y1 = (y0 + 1).min(h - 1);
        for x in 0..sw {
            let x0 = 2 * x;
            let x1 = (x0 + 1).min(w - 1);
            let mut total = 0.0f32;
            let mut count = 0.0f32;
            for yy in y0..=y1 {
                for xx in x0..=x1 {
                    total += src.get(xx, yy);
                    count += 1.0;
                }
            }
            out.set(x, y, total / count);
        }
    }
    out
}

/// Resize `src` to exactly `width x height` with bilinear interpolation,
/// sampling at pixel centres.
pub fn upsample_bilinear(src: &LumaBuffer, width: usize, height: usize) -> LumaBuffer {
    let (sw, sh) = (src.width(), src.height());
    let scale_x = sw as f32 / width as f32;
    let scale_y = sh as f32 / height as f32;
    let mut out = LumaBuffer::new(width, height);

    for y in 0..height {
        let fy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (sh - 1) as f32);
        let y0 = fy as usize;
        let y1 = (y0 + 1).min(sh - 1);
        let ty = fy - y0 as f32;
        for x in 0..width {
            let fx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (sw - 1) as f32);
            let x0 = fx as usize;
            let x1 = (x0 + 1).min(sw - 1);
            let tx = fx - x0 as f32;

            let top = src.get(x0, y0) + (src.get(x1, y0) - src.get(x0, y0)) * tx;
            let bottom = src.get(x0, y1) + (src.get(x1, y1) - src.get(x0, y1)) * tx;
            out.set(x, y, top + (bottom - top) * ty);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_averages_blocks() {
        let src = LumaBuffer::from_vec(4, 2, vec![0.0, 4.0, 8.0, 8.0, 4.0, 0.0, 8.0, 8.0]).unwrap();
        let out = downsample_half(&src);
        assert_eq!((out.width(), out.height()), (2, 1));
        assert_eq!(out.as_slice(), &[2.0, 8.0]);
    }

    #[test]
    fn odd_dimensions_round_up() {
        let out = downsample_half(&LumaBuffer::filled(5, 3, 10.0));
        assert_eq!((out.width(), out.height()), (3, 2));
        assert!(out.as_slice().iter().all(|&v| v == 10.0));
    }

    #[test]
    fn round_trip_restores_dimensions() {
        let src = LumaBuffer::filled(37, 23, 50.0);
        let back = upsample_bilinear(&downsample_half(&src), 37, 23);
        assert_eq!((back.width(), back.height()), (37, 23));
        assert!(back.as_slice().iter().all(|&v| (v - 50.0).abs() < 1e-4));
    }

    #[test]
    fn upsample_interpolates_between_samples() {
        let src = LumaBuffer::from_vec(2, 1, vec![0.0, 100.0]).unwrap();
        let out = upsample_bilinear(&src, 4, 1);
        let row = out.row(0);
        assert_eq!(row[0], 0.0);
        assert_eq!(row[3], 100.0);
        assert!(row[1] > 0.0 && row[1] < row[2] && row[2] < 100.0);
    }
}
