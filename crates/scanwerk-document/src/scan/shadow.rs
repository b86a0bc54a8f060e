// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shadow remover — divides luma by the estimated background so paper reads
// as uniform white under uneven lighting.

use scanwerk_core::EngineConfig;
use tracing::{info, instrument};

use crate::image::buffer::LumaBuffer;
use crate::scan::background::estimate_background;

/// Normalise `luma` against its estimated background.
#[instrument(skip_all, fields(width = luma.width(), height = luma.height()))]
pub fn remove_shadows(luma: &LumaBuffer, config: &EngineConfig) -> LumaBuffer {
    info!("Removing shadows");
    let background = estimate_background(luma, config);
    normalize_by_background(luma, &background)
}

/// `clamp(luma / max(background, 1) * 255, 0, 255)` per sample.
pub fn normalize_by_background(luma: &LumaBuffer, background: &LumaBuffer) -> LumaBuffer {
    luma.zip_map(background, |v, bg| (v / bg.max(1.0) * 255.0).clamp(0.0, 255.0))
}
