// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — buffers, luma reduction, and the O(n) filters every scan
// pipeline is built from.

pub mod blur;
pub mod buffer;
pub mod codec;
pub mod integral;
pub mod luma;
pub mod morphology;
pub mod resample;

pub use buffer::{LumaBuffer, RasterImage};
pub use integral::IntegralImage;
