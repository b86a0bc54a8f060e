// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Tunables shared by the enhancement and geometry pipelines.
///
/// Per-mode algorithm constants (Sauvola `k`, CLAHE clip limits, unsharp
/// amount) are fixed by the mode table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pixel count above which background estimation runs at half resolution.
    pub large_image_pixels: u64,
    /// Disable to always estimate the background at full resolution.
    pub downsample_large_images: bool,
    /// Reject unrecognised mode strings instead of falling back to grayscale.
    pub strict_modes: bool,
    /// Largest accepted input buffer, in pixels.
    pub max_input_pixels: u64,
    /// Largest accepted transform output edge, in pixels.
    pub max_output_dimension: u32,
    /// Sauvola dynamic range of the standard deviation (`R`).
    pub sauvola_dynamic_range: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            large_image_pixels: 1500 * 1500,
            downsample_large_images: true,
            strict_modes: false,
            max_input_pixels: 100_000_000,
            max_output_dimension: 10_000,
            sauvola_dynamic_range: 128.0,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipelines cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_input_pixels == 0 {
            return Err(ScanError::InvalidDimensions(
                "max_input_pixels must be positive".into(),
            ));
        }
        if self.max_output_dimension == 0 {
            return Err(ScanError::InvalidDimensions(
                "max_output_dimension must be positive".into(),
            ));
        }
        if !(self.sauvola_dynamic_range > 0.0) {
            return Err(ScanError::InvalidDimensions(format!(
                "sauvola_dynamic_range must be positive, got {}",
                self.sauvola_dynamic_range
            )));
        }
        Ok(())
    }
}
