// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sliding-window max filter (morphological dilation) using a monotonic
// deque, O(width * height) independent of the radius.

use std::collections::VecDeque;

use crate::image::buffer::LumaBuffer;

/// Running maximum over `[i - r, i + r]` (clamped to the line) for every `i`.
///
/// The deque holds indices whose values are strictly decreasing from front to
/// back, so the front is always the window maximum.
fn sliding_max(line: &[f32], r: usize, out: &mut [f32], deque: &mut VecDeque<usize>) {
    deque.clear();
    let n = line.len();
    let mut next = 0;

    for i in 0..n {
        let hi = (i + r).min(n - 1);
        while next <= hi {
            let incoming = line[next];
            while deque.back().is_some_and(|&b| line[b] <= incoming) {
                deque.pop_back();
            }
            deque.push_back(next);
            next += 1;
        }

        let lo = i.saturating_sub(r);
        while deque.front().is_some_and(|&f| f < lo) {
            deque.pop_front();
        }

        if let Some(&front) = deque.front() {
            out[i] = line[front];
        }
    }
}

/// Horizontal max filter of radius `r` from `src` into `dst`.
pub fn max_filter_horizontal(src: &LumaBuffer, dst: &mut LumaBuffer, r: usize) {
    assert!(src.same_size(dst), "max filter planes must match");
    let mut deque = VecDeque::with_capacity(2 * r + 1);
    for y in 0..src.height() {
        sliding_max(src.row(y), r, dst.row_mut(y), &mut deque);
    }
}

/// Vertical max filter of radius `r` from `src` into `dst`.
pub fn max_filter_vertical(src: &LumaBuffer, dst: &mut LumaBuffer, r: usize) {
    assert!(src.same_size(dst), "max filter planes must match");
    let (w, h) = (src.width(), src.height());
    let mut deque = VecDeque::with_capacity(2 * r + 1);
    let mut column = vec![0.0f32; h];
    let mut filtered = vec![0.0f32; h];

    for x in 0..w {
        for (y, slot) in column.iter_mut().enumerate() {
            *slot = src.get(x, y);
        }
        sliding_max(&column, r, &mut filtered, &mut deque);
        for (y, &v) in filtered.iter().enumerate() {
            dst.set(x, y, v);
        }
    }
}

/// Square dilation of radius `r`: each sample becomes the maximum of its
/// `(2r + 1)^2` neighbourhood, clipped to the plane.
pub fn dilate(src: &LumaBuffer, r: usize) -> LumaBuffer {
    let mut temp = LumaBuffer::new(src.width(), src.height());
    let mut out = LumaBuffer::new(src.width(), src.height());
    max_filter_horizontal(src, &mut temp, r);
    max_filter_vertical(&temp, &mut out, r);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_dilate(src: &LumaBuffer, r: usize) -> LumaBuffer {
        let (w, h) = (src.width(), src.height());
        let mut out = LumaBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let mut best = f32::MIN;
                for yy in y.saturating_sub(r)..=(y + r).min(h - 1) {
                    for xx in x.saturating_sub(r)..=(x + r).min(w - 1) {
                        best = best.max(src.get(xx, yy));
                    }
                }
                out.set(x, y, best);
            }
        }
        out
    }

    #[test]
    fn matches_brute_force_on_random_planes() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..25 {
            let w = rng.gen_range(1..20);
            let h = rng.gen_range(1..20);
            let r = rng.gen_range(0..8);
            let data = (0..w * h).map(|_| rng.gen_range(0..=255) as f32).collect();
            let plane = LumaBuffer::from_vec(w, h, data).unwrap();
            assert_eq!(dilate(&plane, r), brute_dilate(&plane, r), "{w}x{h} r={r}");
        }
    }

    #[test]
    fn equal_values_do_not_starve_the_window() {
        let line = [5.0, 5.0, 5.0, 1.0, 1.0, 1.0];
        let mut out = [0.0; 6];
        sliding_max(&line, 1, &mut out, &mut VecDeque::new());
        assert_eq!(out, [5.0, 5.0, 5.0, 5.0, 1.0, 1.0]);
    }

    #[test]
    fn zero_radius_is_identity() {
        let plane = LumaBuffer::from_vec(3, 2, vec![1.0, 9.0, 3.0, 7.0, 2.0, 8.0]).unwrap();
        assert_eq!(dilate(&plane, 0), plane);
    }

    #[test]
    fn huge_radius_spreads_global_max() {
        let mut plane = LumaBuffer::filled(9, 7, 10.0);
        plane.set(4, 3, 250.0);
        let out = dilate(&plane, 100);
        assert!(out.as_slice().iter().all(|&v| v == 250.0));
    }
}
