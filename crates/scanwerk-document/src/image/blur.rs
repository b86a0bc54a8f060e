// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Separable box blur. Each 1-D pass keeps a running sum over `2r + 1`
// samples, so cost is O(width * height) whatever the radius. Three
// horizontal+vertical passes approximate a Gaussian.

use crate::image::buffer::LumaBuffer;

/// Number of box passes used to approximate a Gaussian.
pub const GAUSSIAN_PASSES: usize = 3;

/// Horizontal moving average of radius `r` from `src` into `dst`.
///
/// Out-of-range source indices clamp to the nearest edge sample.
pub fn box_blur_horizontal(src: &LumaBuffer, dst: &mut LumaBuffer, r: usize) {
    assert!(src.same_size(dst), "blur planes must match");
    let diameter = (2 * r + 1) as f64;
    for y in 0..src.height() {
        let row = src.row(y);
        let out = dst.row_mut(y);
        let last = row.len() - 1;

        // Window for x = 0, minus the sample entering at x + r.
        let mut acc = row[0] as f64 * r as f64;
        for i in 0..r {
            acc += row[i.min(last)] as f64;
        }
        for x in 0..row.len() {
            acc += row[(x + r).min(last)] as f64;
            out[x] = (acc / diameter) as f32;
            acc -= row[x.saturating_sub(r)] as f64;
        }
    }
}

/// Vertical moving average of radius `r` from `src` into `dst`.
pub fn box_blur_vertical(src: &LumaBuffer, dst: &mut LumaBuffer, r: usize) {
    assert!(src.same_size(dst), "blur planes must match");
    let diameter = (2 * r + 1) as f64;
    let (w, h) = (src.width(), src.height());
    let last = h - 1;
    let mut column = vec![0.0f32; h];

    for x in 0..w {
        for (y, slot) in column.iter_mut().enumerate() {
            *slot = src.get(x, y);
        }
        let mut acc = column[0] as f64 * r as f64;
        for i in 0..r {
            acc += column[i.min(last)] as f64;
        }
        for y in 0..h {
            acc += column[(y + r).min(last)] as f64;
            dst.set(x, y, (acc / diameter) as f32);
            acc -= column[y.saturating_sub(r)] as f64;
        }
    }
}

/// Blur `plane` in place with three box passes of radius `r`.
///
/// The plane must be exclusively owned by the caller; a private scratch plane
/// holds the horizontal result between passes.
pub fn gaussian_approx_blur(plane: &mut LumaBuffer, r: usize) {
    if r == 0 || plane.is_empty() {
        return;
    }
    let mut scratch = LumaBuffer::new(plane.width(), plane.height());
    for _ in 0..GAUSSIAN_PASSES {
        box_blur_horizontal(plane, &mut scratch, r);
        box_blur_vertical(&scratch, plane, r);
    }
}

/// Blurred copy of `plane`.
pub fn blurred(plane: &LumaBuffer, r: usize) -> LumaBuffer {
    let mut out = plane.clone();
    gaussian_approx_blur(&mut out, r);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_plane_is_a_fixed_point() {
        let (w, h) = (12, 9);
        for r in 1..=w.min(h) / 2 {
            let out = blurred(&LumaBuffer::filled(w, h, 100.0), r);
            for &v in out.as_slice() {
                assert!((v - 100.0).abs() < 1e-4, "radius {r} produced {v}");
            }
        }
    }

    #[test]
    fn radius_larger_than_plane_stays_finite() {
        let plane = LumaBuffer::from_vec(3, 1, vec![0.0, 30.0, 60.0]).unwrap();
        let out = blurred(&plane, 10);
        assert!(out.as_slice().iter().all(|v| v.is_finite() && (0.0..=60.0).contains(v)));
    }

    #[test]
    fn horizontal_pass_replicates_edges() {
        let plane = LumaBuffer::from_vec(3, 1, vec![30.0, 0.0, 0.0]).unwrap();
        let mut out = LumaBuffer::new(3, 1);
        box_blur_horizontal(&plane, &mut out, 1);
        // x = 0 sees [30 (replicated), 30, 0].
        assert!((out.get(0, 0) - 20.0).abs() < 1e-5);
        assert!((out.get(1, 0) - 10.0).abs() < 1e-5);
        assert!((out.get(2, 0) - 0.0).abs() < 1e-5);
    }

    #[test]
    fn vertical_pass_matches_transposed_horizontal() {
        let column = LumaBuffer::from_vec(1, 4, vec![0.0, 40.0, 80.0, 120.0]).unwrap();
        let row = LumaBuffer::from_vec(4, 1, vec![0.0, 40.0, 80.0, 120.0]).unwrap();
        let mut out_v = LumaBuffer::new(1, 4);
        let mut out_h = LumaBuffer::new(4, 1);
        box_blur_vertical(&column, &mut out_v, 1);
        box_blur_horizontal(&row, &mut out_h, 1);
        assert_eq!(out_v.as_slice(), out_h.as_slice());
    }

    #[test]
    fn blur_preserves_mean_of_symmetric_step() {
        let mut plane = LumaBuffer::filled(8, 8, 0.0);
        for y in 0..8 {
            for x in 4..8 {
                plane.set(x, y, 200.0);
            }
        }
        let out = blurred(&plane, 2);
        assert!(out.get(0, 4) < out.get(3, 4));
        assert!(out.get(3, 4) < out.get(4, 4));
        assert!(out.get(4, 4) < out.get(7, 4));
    }
}
