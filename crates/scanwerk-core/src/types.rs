// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Correlation id for one job. Allocated monotonically by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Enhancement pipeline selector.
///
/// `Grayscale` is the fallback pipeline: plain luma, no enhancement. It is
/// what an unrecognised wire mode resolves to unless strict mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceMode {
    /// Shadow removal, then Sauvola with k = 0.18.
    Auto,
    /// Shadow removal, then a tighter Sauvola with k = 0.12.
    Scan,
    /// Shadow removal, then CLAHE. Stays grayscale.
    Lighten,
    /// CLAHE, then unsharp mask.
    Sharpen,
    Grayscale,
}

impl EnhanceMode {
    pub const ALL: [EnhanceMode; 5] = [
        Self::Auto,
        Self::Scan,
        Self::Lighten,
        Self::Sharpen,
        Self::Grayscale,
    ];

    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Scan => "scan",
            Self::Lighten => "lighten",
            Self::Sharpen => "sharpen",
            Self::Grayscale => "grayscale",
        }
    }

    /// Look up a wire name. Matching is exact (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == name)
    }

    /// Resolve a wire name, either falling back to `Grayscale` or failing
    /// with `UnknownMode` when `strict` is set.
    pub fn resolve(name: &str, strict: bool) -> Result<Self> {
        match Self::from_name(name) {
            Some(mode) => Ok(mode),
            None if strict => Err(ScanError::UnknownMode(name.to_string())),
            None => Ok(Self::Grayscale),
        }
    }

    /// Whether the pipeline ends in a binary (0/255) image.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Auto | Self::Scan)
    }
}

impl std::fmt::Display for EnhanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Smallest crop edge the output-size check accepts.
pub const MIN_OUTPUT_DIMENSION: u32 = 10;

/// Minimum enclosed area, in square pixels, for a quad to count as valid.
pub const MIN_QUAD_AREA: f64 = 100.0;

/// Four document corners in winding order: top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self([top_left, top_right, bottom_right, bottom_left])
    }

    /// Build from a slice that must hold exactly four corners.
    pub fn from_slice(points: &[Point]) -> Result<Self> {
        let corners: [Point; 4] = points.try_into().map_err(|_| {
            ScanError::InvalidQuad(format!("expected 4 corners, got {}", points.len()))
        })?;
        Ok(Self(corners))
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.0
    }

    /// Axis-aligned rectangle `(0,0),(w,0),(w,h),(0,h)`.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        )
    }

    /// Enclosed area via the shoelace formula. Winding-independent.
    pub fn area(&self) -> f64 {
        let p = &self.0;
        let twice = p[0].x * (p[1].y - p[3].y)
            + p[1].x * (p[2].y - p[0].y)
            + p[2].x * (p[3].y - p[1].y)
            + p[3].x * (p[0].y - p[2].y);
        twice.abs() / 2.0
    }

    /// Caller-side validity check: neither pair of opposite edges crosses
    /// and the enclosed area is at least [`MIN_QUAD_AREA`].
    ///
    /// The transform pipeline does not call this; it only reports a
    /// singular homography.
    pub fn is_valid(&self) -> bool {
        let p = &self.0;
        if segments_cross(p[0], p[1], p[2], p[3]) || segments_cross(p[1], p[2], p[3], p[0]) {
            return false;
        }
        self.area() >= MIN_QUAD_AREA
    }

    /// Output size that preserves the longer of each pair of opposite edges.
    pub fn suggested_output_size(&self) -> (u32, u32) {
        let p = &self.0;
        let width = p[0].distance(&p[1]).max(p[3].distance(&p[2]));
        let height = p[0].distance(&p[3]).max(p[1].distance(&p[2]));
        (width.round() as u32, height.round() as u32)
    }
}

/// Engine-side output size check: both edges non-zero and at most `max`.
pub fn validate_output_size(width: u32, height: u32, max: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ScanError::InvalidDimensions(format!(
            "output size must be non-zero: {width}x{height}"
        )));
    }
    if width > max || height > max {
        return Err(ScanError::InvalidDimensions(format!(
            "crop area too large: {width}x{height} (max {max})"
        )));
    }
    Ok(())
}

/// Caller-side crop check: both edges at least [`MIN_OUTPUT_DIMENSION`].
///
/// Like [`Quad::is_valid`], the transform pipeline does not call this.
pub fn check_crop_size(width: u32, height: u32) -> Result<()> {
    if width < MIN_OUTPUT_DIMENSION || height < MIN_OUTPUT_DIMENSION {
        return Err(ScanError::InvalidDimensions(format!(
            "crop area too small: {width}x{height}"
        )));
    }
    Ok(())
}

fn ccw(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// Proper intersection test for segments `p1p2` and `p3p4`.
fn segments_cross(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}
