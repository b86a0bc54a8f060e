// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background estimator — dilation followed by a Gaussian-like blur, giving a
// smooth upper envelope of the paper's illumination. Large photos are
// estimated at half resolution and expanded back.

use scanwerk_core::EngineConfig;
use tracing::debug;

use crate::image::blur::gaussian_approx_blur;
use crate::image::buffer::LumaBuffer;
use crate::image::morphology::dilate;
use crate::image::resample::{downsample_half, upsample_bilinear};

/// Smallest dilation radius, in pixels of the plane being filtered.
const MIN_DILATION_RADIUS: usize = 10;

/// Dilation radius divisor at full resolution.
const FULL_RES_DIVISOR: usize = 25;

/// Dilation radius divisor at half resolution.
const REDUCED_RES_DIVISOR: usize = 20;

/// Radii used for one envelope estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeRadii {
    pub dilation: usize,
    pub blur: usize,
}

impl EnvelopeRadii {
    /// Radii for a `width x height` plane; `reduced` selects the
    /// half-resolution divisor.
    pub fn for_size(width: usize, height: usize, reduced: bool) -> Self {
        let divisor = if reduced {
            REDUCED_RES_DIVISOR
        } else {
            FULL_RES_DIVISOR
        };
        let dilation = (width.min(height) / divisor).max(MIN_DILATION_RADIUS);
        Self {
            dilation,
            blur: dilation / 2,
        }
    }
}

/// Whether `config` routes a `width x height` plane through the reduced path.
pub fn uses_reduced_resolution(width: usize, height: usize, config: &EngineConfig) -> bool {
    config.downsample_large_images && (width as u64 * height as u64) > config.large_image_pixels
}

/// Estimate the illumination background of `luma`.
///
/// The result always has the same dimensions as `luma`.
pub fn estimate_background(luma: &LumaBuffer, config: &EngineConfig) -> LumaBuffer {
    let (w, h) = (luma.width(), luma.height());

    if uses_reduced_resolution(w, h, config) {
        let small = downsample_half(luma);
        let radii = EnvelopeRadii::for_size(small.width(), small.height(), true);
        debug!(
            width = w,
            height = h,
            reduced_width = small.width(),
            reduced_height = small.height(),
            dilation = radii.dilation,
            blur = radii.blur,
            "Estimating background at half resolution"
        );
        let envelope = envelope(&small, radii);
        return upsample_bilinear(&envelope, w, h);
    }

    let radii = EnvelopeRadii::for_size(w, h, false);
    debug!(
        width = w,
        height = h,
        dilation = radii.dilation,
        blur = radii.blur,
        "Estimating background"
    );
    envelope(luma, radii)
}

fn envelope(luma: &LumaBuffer, radii: EnvelopeRadii) -> LumaBuffer {
    let mut background = dilate(luma, radii.dilation);
    gaussian_approx_blur(&mut background, radii.blur);
    background
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radii_follow_image_size() {
        assert_eq!(
            EnvelopeRadii::for_size(100, 80, false),
            EnvelopeRadii {
                dilation: 10,
                blur: 5
            }
        );
        assert_eq!(EnvelopeRadii::for_size(2000, 1000, false).dilation, 40);
        assert_eq!(EnvelopeRadii::for_size(1000, 800, true).dilation, 40);
    }

    #[test]
    fn uniform_plane_background_is_uniform() {
        let luma = LumaBuffer::filled(30, 20, 180.0);
        let bg = estimate_background(&luma, &EngineConfig::default());
        assert!(bg.as_slice().iter().all(|&v| (v - 180.0).abs() < 1e-3));
    }

    #[test]
    fn background_covers_dark_text_strokes() {
        let mut luma = LumaBuffer::filled(40, 40, 200.0);
        for x in 5..35 {
            luma.set(x, 20, 20.0);
        }
        let bg = estimate_background(&luma, &EngineConfig::default());
        assert!(bg.get(20, 20) > 190.0, "stroke leaked into background");
    }

    #[test]
    fn reduced_path_keeps_dimensions_for_odd_sizes() {
        let config = EngineConfig {
            large_image_pixels: 100,
            ..EngineConfig::default()
        };
        assert!(uses_reduced_resolution(41, 37, &config));
        let bg = estimate_background(&LumaBuffer::filled(41, 37, 90.0), &config);
        assert_eq!((bg.width(), bg.height()), (41, 37));
        assert!(bg.as_slice().iter().all(|&v| (v - 90.0).abs() < 1e-3));
    }

    #[test]
    fn large_image_takes_reduced_path_with_same_dimensions() {
        let (w, h) = (1501, 1500);
        let config = EngineConfig::default();
        assert!(uses_reduced_resolution(w, h, &config));
        assert!(!uses_reduced_resolution(1500, 1500, &config));

        let mut luma = LumaBuffer::filled(w, h, 220.0);
        luma.set(700, 700, 10.0);
        let bg = estimate_background(&luma, &config);
        assert_eq!((bg.width(), bg.height()), (w, h));
    }

    #[test]
    fn downsampling_can_be_disabled() {
        let config = EngineConfig {
            large_image_pixels: 100,
            downsample_large_images: false,
            ..EngineConfig::default()
        };
        assert!(!uses_reduced_resolution(41, 37, &config));
    }
}
