// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unsharp mask — amplifies the residual between the plane and its blur.

use crate::image::blur::blurred;
use crate::image::buffer::LumaBuffer;

/// `clamp(v + (v - blur(v)) * amount, 0, 255)` with a blur of `radius`.
pub fn unsharp_mask(luma: &LumaBuffer, amount: f32, radius: usize) -> LumaBuffer {
    let soft = blurred(luma, radius);
    luma.zip_map(&soft, |v, b| (v + (v - b) * amount).clamp(0.0, 255.0))
}
