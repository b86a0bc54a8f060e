// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tiled contrast equalizer (CLAHE).
//
// The plane is split into a grid of tiles. Each tile gets a clipped 256-bin
// histogram whose excess is spread evenly over all bins, and the cumulative
// distribution becomes that tile's lookup table. Output samples blend the
// four nearest tile tables bilinearly by tile centre, so tile seams never
// show.

use tracing::{debug, instrument};

use crate::image::buffer::LumaBuffer;
use crate::image::luma::to_bin;

const BINS: usize = 256;

/// Grid size and clip limit for one equalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheParams {
    pub tiles_x: usize,
    pub tiles_y: usize,
    /// Multiple of the uniform bin height at which bins are clipped.
    pub clip_limit: f32,
}

impl ClaheParams {
    pub const fn new(tiles_x: usize, tiles_y: usize, clip_limit: f32) -> Self {
        Self {
            tiles_x,
            tiles_y,
            clip_limit,
        }
    }
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self::new(8, 8, 2.0)
    }
}

/// Tile edge and effective tile count along one axis.
///
/// The count is recomputed from the rounded-up edge so that no tile starts
/// past the end of the plane.
fn tile_layout(extent: usize, tiles: usize) -> (usize, usize) {
    let tiles = tiles.clamp(1, extent.max(1));
    let edge = extent.div_ceil(tiles);
    (edge, extent.div_ceil(edge))
}

/// Flat `tiles_y * tiles_x * 256` arena of per-tile lookup tables.
struct TileLuts {
    tiles_x: usize,
    table: Vec<f32>,
}

impl TileLuts {
    fn lut(&self, tx: usize, ty: usize) -> &[f32] {
        let start = (ty * self.tiles_x + tx) * BINS;
        &self.table[start..start + BINS]
    }

    fn lut_mut(&mut self, tx: usize, ty: usize) -> &mut [f32] {
        let start = (ty * self.tiles_x + tx) * BINS;
        &mut self.table[start..start + BINS]
    }
}

/// Clip `hist` at `limit`, spreading the excess uniformly, then write its
/// CDF scaled to `[0, 255]` into `lut`.
fn build_lut(hist: &mut [f32; BINS], area: f32, limit: f32, lut: &mut [f32]) {
    let mut excess = 0.0f32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let per_bin = excess / BINS as f32;

    let mut cumulative = 0.0f32;
    for (slot, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count + per_bin;
        *slot = (cumulative / area * 255.0).min(255.0);
    }
}

/// Equalize `luma` with contrast-limited adaptive histogram equalization.
#[instrument(skip(luma), fields(width = luma.width(), height = luma.height()))]
pub fn clahe(luma: &LumaBuffer, params: ClaheParams) -> LumaBuffer {
    let (w, h) = (luma.width(), luma.height());
    let (tile_w, tiles_x) = tile_layout(w, params.tiles_x);
    let (tile_h, tiles_y) = tile_layout(h, params.tiles_y);
    debug!(tile_w, tile_h, tiles_x, tiles_y, "CLAHE tile grid");

    let mut luts = TileLuts {
        tiles_x,
        table: vec![0.0; tiles_x * tiles_y * BINS],
    };

    for ty in 0..tiles_y {
        let y0 = ty * tile_h;
        let y1 = (y0 + tile_h).min(h);
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let x1 = (x0 + tile_w).min(w);
            let area = ((x1 - x0) * (y1 - y0)) as f32;

            let mut hist = [0.0f32; BINS];
            for y in y0..y1 {
                for &v in &luma.row(y)[x0..x1] {
                    hist[to_bin(v)] += 1.0;
                }
            }

            let limit = (params.clip_limit * area / BINS as f32).max(1.0);
            build_lut(&mut hist, area, limit, luts.lut_mut(tx, ty));
        }
    }

    let mut out = LumaBuffer::new(w, h);
    for y in 0..h {
        let fy = y as f32 / tile_h as f32 - 0.5;
        let ty0 = (fy.floor().max(0.0) as usize).min(tiles_y - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let y_alpha = (fy - ty0 as f32).clamp(0.0, 1.0);

        for x in 0..w {
            let fx = x as f32 / tile_w as f32 - 0.5;
            let tx0 = (fx.floor().max(0.0) as usize).min(tiles_x - 1);
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let x_alpha = (fx - tx0 as f32).clamp(0.0, 1.0);

            let bin = to_bin(luma.get(x, y));
            let tl = luts.lut(tx0, ty0)[bin];
            let tr = luts.lut(tx1, ty0)[bin];
            let bl = luts.lut(tx0, ty1)[bin];
            let br = luts.lut(tx1, ty1)[bin];

            let top = tl + (tr - tl) * x_alpha;
            let bottom = bl + (br - bl) * x_alpha;
            out.set(x, y, top + (bottom - top) * y_alpha);
        }
    }
    out
}
