// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — illumination correction, adaptive binarization,
// local contrast equalization, sharpening, compositing, and perspective
// correction.

pub mod background;
pub mod binarize;
pub mod clahe;
pub mod composite;
pub mod enhance;
pub mod perspective;
pub mod shadow;
pub mod sharpen;

pub use enhance::{ScanEnhancer, Stage};
pub use perspective::Homography;
