// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integral image builder — summed-area tables of value and squared value,
// giving O(1) window sums for the Sauvola threshold.

use crate::image::buffer::LumaBuffer;

/// Summed-area tables for one luma plane.
///
/// `sum[y * width + x]` is the total of all samples in the closed rectangle
/// `(0, 0)-(x, y)`. Accumulation is in `f64` so large planes of squared
/// values do not lose integer precision.
pub struct IntegralImage {
    width: usize,
    height: usize,
    sum: Vec<f64>,
    sq_sum: Vec<f64>,
}

impl IntegralImage {
    pub fn new(luma: &LumaBuffer) -> Self {
        let (w, h) = (luma.width(), luma.height());
        let mut sum = vec![0.0f64; w * h];
        let mut sq_sum = vec![0.0f64; w * h];

        for y in 0..h {
            let row = luma.row(y);
            let mut row_sum = 0.0f64;
            let mut row_sq_sum = 0.0f64;
            for (x, &v) in row.iter().enumerate() {
                let v = v as f64;
                row_sum += v;
                row_sq_sum += v * v;
                let i = y * w + x;
                let (above, above_sq) = if y > 0 {
                    (sum[i - w], sq_sum[i - w])
                } else {
                    (0.0, 0.0)
                };
                sum[i] = row_sum + above;
                sq_sum[i] = row_sq_sum + above_sq;
            }
        }

        Self {
            width: w,
            height: h,
            sum,
            sq_sum,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum of samples over the closed rectangle `(x1, y1)-(x2, y2)`.
    pub fn query(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        self.rect(&self.sum, x1, y1, x2, y2)
    }

    /// Sum of squared samples over the closed rectangle `(x1, y1)-(x2, y2)`.
    pub fn query_squares(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        self.rect(&self.sq_sum, x1, y1, x2, y2)
    }

    /// Mean and population standard deviation over the closed rectangle.
    pub fn window_stats(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> (f64, f64) {
        let count = ((x2 - x1 + 1) * (y2 - y1 + 1)) as f64;
        let mean = self.query(x1, y1, x2, y2) / count;
        let variance = self.query_squares(x1, y1, x2, y2) / count - mean * mean;
        (mean, variance.max(0.0).sqrt())
    }

    /// Inclusion-exclusion over four corners. Corners left of column 0 or
    /// above row 0 contribute zero.
    fn rect(&self, table: &[f64], x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        assert!(
            x1 <= x2 && y1 <= y2 && x2 < self.width && y2 < self.height,
            "window ({x1}, {y1})-({x2}, {y2}) invalid for {}x{} table",
            self.width,
            self.height
        );
        let at = |x: usize, y: usize| table[y * self.width + x];
        let d = at(x2, y2);
        let a = if x1 > 0 && y1 > 0 { at(x1 - 1, y1 - 1) } else { 0.0 };
        let b = if y1 > 0 { at(x2, y1 - 1) } else { 0.0 };
        let c = if x1 > 0 { at(x1 - 1, y2) } else { 0.0 };
        d - b - c + a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_plane(rng: &mut StdRng, w: usize, h: usize) -> LumaBuffer {
        let data = (0..w * h).map(|_| rng.gen_range(0..=255) as f32).collect();
        LumaBuffer::from_vec(w, h, data).unwrap()
    }

    fn brute_sum(luma: &LumaBuffer, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        let mut total = 0.0;
        for y in y1..=y2 {
            for x in x1..=x2 {
                total += luma.get(x, y) as f64;
            }
        }
        total
    }

    #[test]
    fn full_query_equals_total() {
        let mut rng = StdRng::seed_from_u64(7);
        let luma = random_plane(&mut rng, 13, 9);
        let integral = IntegralImage::new(&luma);
        let total: f64 = luma.as_slice().iter().map(|&v| v as f64).sum();
        assert_eq!(integral.query(0, 0, 12, 8), total);
    }

    #[test]
    fn sub_rectangles_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let (w, h) = (17, 11);
        let luma = random_plane(&mut rng, w, h);
        let integral = IntegralImage::new(&luma);

        for _ in 0..200 {
            let (xa, xb) = (rng.gen_range(0..w), rng.gen_range(0..w));
            let (ya, yb) = (rng.gen_range(0..h), rng.gen_range(0..h));
            let (x1, x2) = (xa.min(xb), xa.max(xb));
            let (y1, y2) = (ya.min(yb), ya.max(yb));
            assert_eq!(
                integral.query(x1, y1, x2, y2),
                brute_sum(&luma, x1, y1, x2, y2),
                "rect ({x1},{y1})-({x2},{y2})"
            );
        }
    }

    #[test]
    fn squares_table_tracks_squared_values() {
        let luma = LumaBuffer::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let integral = IntegralImage::new(&luma);
        assert_eq!(integral.query_squares(0, 0, 1, 1), 30.0);
        assert_eq!(integral.query_squares(1, 1, 1, 1), 16.0);
    }

    #[test]
    fn uniform_window_has_zero_deviation() {
        let luma = LumaBuffer::filled(6, 6, 100.0);
        let (mean, stddev) = IntegralImage::new(&luma).window_stats(1, 1, 4, 4);
        assert_eq!(mean, 100.0);
        assert_eq!(stddev, 0.0);
    }
}
