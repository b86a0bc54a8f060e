// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Owned pixel buffers: interleaved RGBA rasters and single-channel float
// planes with bounds-checked 2-D access.

use image::RgbaImage;
use scanwerk_core::{EngineConfig, Result, ScanError};

/// Number of interleaved channels in a raster (R, G, B, A).
pub const CHANNELS: usize = 4;

/// An interleaved 8-bit RGBA raster, `width * height * 4` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    // -- Construction ---------------------------------------------------------

    /// Wrap caller-supplied RGBA bytes, checking the length against the
    /// dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = rgba_len(width, height)?;
        if pixels.len() != expected {
            return Err(ScanError::InvalidBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = rgba_len(width, height)?;
        let pixels = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA value at `(x, y)`. Panics outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Reject rasters larger than the configured input limit.
    pub fn ensure_within(&self, config: &EngineConfig) -> Result<()> {
        let pixels = self.pixel_count() as u64;
        if pixels > config.max_input_pixels {
            return Err(ScanError::InvalidDimensions(format!(
                "{}x{} exceeds the {} pixel input limit",
                self.width, self.height, config.max_input_pixels
            )));
        }
        Ok(())
    }

    // -- `image` crate interop ------------------------------------------------

    /// Convert into an `image::RgbaImage` without copying.
    pub fn into_rgba_image(self) -> Result<RgbaImage> {
        let (width, height) = (self.width, self.height);
        RgbaImage::from_raw(width, height, self.pixels).ok_or_else(|| {
            ScanError::Image(format!("raster does not fit {width}x{height} RGBA image"))
        })
    }
}

impl TryFrom<RgbaImage> for RasterImage {
    type Error = ScanError;

    fn try_from(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }
}

/// Byte length of a `width x height` RGBA raster, rejecting empty or
/// overflowing sizes.
fn rgba_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(ScanError::InvalidDimensions(format!(
            "{width}x{height} has no pixels"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| ScanError::InvalidDimensions(format!("{width}x{height} overflows")))
}

/// A single-channel `f32` plane with explicit row stride.
///
/// Used for luma, background, and every intermediate stage result. Each stage
/// allocates and fully initialises the plane it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct LumaBuffer {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl LumaBuffer {
    /// A zeroed plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap row-major data; the length must equal `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(ScanError::InvalidBuffer {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap data whose length the caller has already derived from the
    /// dimensions.
    pub(crate) fn from_samples(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// A plane of the same size with `f` applied to every sample.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two same-sized planes sample by sample.
    pub fn zip_map(&self, other: &LumaBuffer, f: impl Fn(f32, f32) -> f32) -> Self {
        assert!(self.same_size(other), "plane size mismatch");
        Self {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_size(&self, other: &LumaBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "sample ({x}, {y}) outside {}x{} plane",
            self.width,
            self.height
        );
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    pub fn row(&self, y: usize) -> &[f32] {
        assert!(y < self.height, "row {y} outside plane of height {}", self.height);
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        assert!(y < self.height, "row {y} outside plane of height {}", self.height);
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
