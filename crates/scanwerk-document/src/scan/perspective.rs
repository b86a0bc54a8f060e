// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective correction — solves the eight-coefficient homography between
// the output rectangle and the selected source quadrilateral, then fills the
// output by inverse mapping with bilinear sampling.

use scanwerk_core::{Quad, Result, ScanError};
use tracing::{debug, instrument};

use crate::image::buffer::{CHANNELS, RasterImage};

/// Pivots and denominators smaller than this are treated as zero.
const EPSILON: f64 = 1e-10;

/// How far past the last source sample a mapped coordinate may land and
/// still be sampled (clamped) instead of painted white.
const EDGE_TOLERANCE: f64 = 1e-4;

const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Projective transform with `h22` fixed at 1:
///
/// ```text
/// x' = (h0 x + h1 y + h2) / (h6 x + h7 y + 1)
/// y' = (h3 x + h4 y + h5) / (h6 x + h7 y + 1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography([f64; 8]);

impl Homography {
    pub const IDENTITY: Homography = Homography([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

    /// Solve the transform taking each corner of `from` to the matching
    /// corner of `to`.
    pub fn from_quads(from: &Quad, to: &Quad) -> Result<Self> {
        let mut system = [[0.0f64; 9]; 8];
        for (i, (s, d)) in from.corners().iter().zip(to.corners()).enumerate() {
            system[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y, d.x];
            system[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y, d.y];
        }
        solve(system).map(Self).ok_or(ScanError::SingularHomography)
    }

    pub fn coefficients(&self) -> &[f64; 8] {
        &self.0
    }

    /// Map `(x, y)` through the transform. `None` where the projective
    /// denominator vanishes.
    pub fn map(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let h = &self.0;
        let denom = h[6] * x + h[7] * y + 1.0;
        if denom.abs() < EPSILON {
            return None;
        }
        Some((
            (h[0] * x + h[1] * y + h[2]) / denom,
            (h[3] * x + h[4] * y + h[5]) / denom,
        ))
    }
}

/// Gaussian elimination with partial pivoting on an augmented 8x9 system.
fn solve(mut aug: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;
    for col in 0..N {
        let pivot = (col..N)
            .max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))
            .unwrap_or(col);
        aug.swap(col, pivot);
        if aug[col][col].abs() < EPSILON {
            return None;
        }
        for row in col + 1..N {
            let factor = aug[row][col] / aug[col][col];
            for j in col..=N {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = [0.0f64; N];
    for row in (0..N).rev() {
        let tail: f64 = (row + 1..N).map(|col| aug[row][col] * x[col]).sum();
        x[row] = (aug[row][N] - tail) / aug[row][row];
    }
    Some(x)
}

/// Sample grid position `v` on an axis of `len` samples.
///
/// Returns the lower index, the upper index and the blend weight, or `None`
/// when `v` falls outside the axis.
fn axis_sample(v: f64, len: u32) -> Option<(usize, usize, f64)> {
    let last = f64::from(len - 1);
    if !(-EDGE_TOLERANCE..=last + EDGE_TOLERANCE).contains(&v) {
        return None;
    }
    let lo = v.floor().clamp(0.0, last);
    let hi = (lo + 1.0).min(last);
    let t = (v - lo).clamp(0.0, 1.0);
    Some((lo as usize, hi as usize, t))
}

/// Warp the `corners` region of `source` into an `output_width x
/// output_height` raster.
///
/// Output `(0,0)`, `(w,0)`, `(w,h)`, `(0,h)` correspond to the four corners
/// in order. Each output pixel is mapped back into the source and sampled
/// bilinearly on all four channels; pixels that land outside the source,
/// or where the mapping is undefined, are opaque white.
#[instrument(skip(source, corners), fields(source_width = source.width(), source_height = source.height()))]
pub fn warp_perspective(
    source: &RasterImage,
    corners: &Quad,
    output_width: u32,
    output_height: u32,
) -> Result<RasterImage> {
    let target = Quad::rectangle(f64::from(output_width), f64::from(output_height));
    let homography = Homography::from_quads(&target, corners)?;
    debug!(coefficients = ?homography.coefficients(), "Homography solved");

    let (sw, sh) = (source.width(), source.height());
    let stride = sw as usize * CHANNELS;
    let src = source.as_bytes();
    let mut out = Vec::with_capacity(output_width as usize * output_height as usize * CHANNELS);

    for y in 0..output_height {
        for x in 0..output_width {
            let Some((sx, sy)) = homography.map(f64::from(x), f64::from(y)) else {
                out.extend_from_slice(&WHITE);
                continue;
            };
            let (Some((x0, x1, fx)), Some((y0, y1, fy))) = (axis_sample(sx, sw), axis_sample(sy, sh))
            else {
                out.extend_from_slice(&WHITE);
                continue;
            };

            let (row0, row1) = (y0 * stride, y1 * stride);
            for c in 0..CHANNELS {
                let v00 = f64::from(src[row0 + x0 * CHANNELS + c]);
                let v10 = f64::from(src[row0 + x1 * CHANNELS + c]);
                let v01 = f64::from(src[row1 + x0 * CHANNELS + c]);
                let v11 = f64::from(src[row1 + x1 * CHANNELS + c]);
                let value = v00 * (1.0 - fx) * (1.0 - fy)
                    + v10 * fx * (1.0 - fy)
                    + v01 * (1.0 - fx) * fy
                    + v11 * fx * fy;
                out.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    RasterImage::new(output_width, output_height, out)
}
