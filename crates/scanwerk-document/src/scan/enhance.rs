// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — each enhancement mode maps to a fixed ordered
// list of stages run over the luma plane, followed by intensity compositing
// against the original raster. Perspective correction lives here too, as
// the second entry point of the engine.

use scanwerk_core::{EngineConfig, EnhanceMode, Quad, Result, validate_output_size};
use tracing::{debug, info, instrument};

use crate::image::buffer::{LumaBuffer, RasterImage};
use crate::image::luma::to_luma;
use crate::scan::binarize::sauvola_binarize;
use crate::scan::clahe::{ClaheParams, clahe};
use crate::scan::composite::composite;
use crate::scan::perspective::warp_perspective;
use crate::scan::shadow::remove_shadows;
use crate::scan::sharpen::unsharp_mask;

/// One step of an enhancement pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Normalise by the estimated illumination background.
    RemoveShadows,
    /// Sauvola binarization with sensitivity `k`.
    Sauvola { k: f64 },
    /// Contrast-limited adaptive histogram equalization.
    Clahe(ClaheParams),
    /// Unsharp mask with the given amount and blur radius.
    Unsharp { amount: f32, radius: usize },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveShadows => "remove_shadows",
            Self::Sauvola { .. } => "sauvola",
            Self::Clahe(_) => "clahe",
            Self::Unsharp { .. } => "unsharp",
        }
    }
}

const AUTO_STAGES: &[Stage] = &[Stage::RemoveShadows, Stage::Sauvola { k: 0.18 }];
const SCAN_STAGES: &[Stage] = &[Stage::RemoveShadows, Stage::Sauvola { k: 0.12 }];
const LIGHTEN_STAGES: &[Stage] = &[Stage::RemoveShadows, Stage::Clahe(ClaheParams::new(8, 8, 2.0))];
const SHARPEN_STAGES: &[Stage] = &[
    Stage::Clahe(ClaheParams::new(8, 8, 2.5)),
    Stage::Unsharp {
        amount: 1.5,
        radius: 4,
    },
];

/// The stage list for `mode`. `Grayscale` has none.
pub fn stages(mode: EnhanceMode) -> &'static [Stage] {
    match mode {
        EnhanceMode::Auto => AUTO_STAGES,
        EnhanceMode::Scan => SCAN_STAGES,
        EnhanceMode::Lighten => LIGHTEN_STAGES,
        EnhanceMode::Sharpen => SHARPEN_STAGES,
        EnhanceMode::Grayscale => &[],
    }
}

/// Runs enhancement and perspective correction over caller-owned rasters.
///
/// Holds only configuration. Every call allocates its own intermediate
/// planes.
#[derive(Debug, Clone, Default)]
pub struct ScanEnhancer {
    config: EngineConfig,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -- Enhancement pipeline -------------------------------------------------

    /// Run the `mode` pipeline and blend the result over `original` at
    /// `intensity` percent (clamped to 100).
    ///
    /// Output dimensions always equal the input's.
    #[instrument(skip(self, original), fields(width = original.width(), height = original.height()))]
    pub fn enhance(&self, original: &RasterImage, mode: EnhanceMode, intensity: u8) -> Result<RasterImage> {
        original.ensure_within(&self.config)?;
        if intensity > 100 {
            debug!(intensity, "Intensity above 100 clamped");
        }
        info!(%mode, intensity, "Running enhancement pipeline");

        let processed = self.process(&to_luma(original), mode);
        composite(original, &processed, intensity)
    }

    /// Apply the `mode` stages to a luma plane.
    pub fn process(&self, luma: &LumaBuffer, mode: EnhanceMode) -> LumaBuffer {
        let mut plane = luma.clone();
        for stage in stages(mode) {
            debug!(stage = stage.name(), "Running stage");
            plane = self.run_stage(&plane, stage);
        }
        plane
    }

    fn run_stage(&self, plane: &LumaBuffer, stage: &Stage) -> LumaBuffer {
        match *stage {
            Stage::RemoveShadows => remove_shadows(plane, &self.config),
            Stage::Sauvola { k } => sauvola_binarize(plane, k, self.config.sauvola_dynamic_range),
            Stage::Clahe(params) => clahe(plane, params),
            Stage::Unsharp { amount, radius } => unsharp_mask(plane, amount, radius),
        }
    }

    // -- Perspective correction -----------------------------------------------

    /// Map the `corners` quadrilateral of `source` onto an
    /// `output_width x output_height` rectangle.
    ///
    /// Fails with `SingularHomography` for degenerate quads. Output regions
    /// that fall outside the source are opaque white.
    #[instrument(skip(self, source), fields(source_width = source.width(), source_height = source.height()))]
    pub fn correct_perspective(
        &self,
        source: &RasterImage,
        corners: &Quad,
        output_width: u32,
        output_height: u32,
    ) -> Result<RasterImage> {
        source.ensure_within(&self.config)?;
        validate_output_size(output_width, output_height, self.config.max_output_dimension)?;
        info!(output_width, output_height, "Starting perspective correction");

        let output = warp_perspective(source, corners, output_width, output_height)?;
        debug!("Perspective correction applied");
        Ok(output)
    }
}
