// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — The pixel-buffer engine behind Scanwerk.
//
// Provides the numeric building blocks (luma reduction, integral images,
// separable box blur, sliding-window max filter, 2x resampling) and the scan
// pipelines composed from them: shadow removal, Sauvola binarization, CLAHE,
// unsharp masking, intensity compositing, and homography-based perspective
// correction.

pub mod image;
pub mod scan;

// Re-export the primary types so callers can use `scanwerk_document::ScanEnhancer` etc.
pub use crate::image::buffer::{LumaBuffer, RasterImage};
pub use crate::scan::enhance::ScanEnhancer;
pub use crate::scan::perspective::Homography;
