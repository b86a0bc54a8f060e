// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job protocol — the request and response messages exchanged with the
// worker. Field names follow the camelCase wire format.

use serde::{Deserialize, Serialize};

use scanwerk_core::{JobId, Point, Result, ScanError};
use scanwerk_document::RasterImage;

/// Payload of an `enhance` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancePayload {
    /// RGBA bytes, `4 * width * height` long.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Wire mode name. Unrecognised names fall back to grayscale unless the
    /// worker runs with strict modes.
    pub mode: String,
    /// Blend strength in percent. Values above 100 are clamped.
    pub intensity: u32,
}

/// Payload of a `transform` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPayload {
    pub pixels: Vec<u8>,
    pub source_width: u32,
    pub source_height: u32,
    /// Exactly four corners: top-left, top-right, bottom-right, bottom-left.
    pub corners: Vec<Point>,
    pub output_width: u32,
    pub output_height: u32,
}

/// One unit of work sent to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobRequest {
    Enhance { id: JobId, payload: EnhancePayload },
    Transform { id: JobId, payload: TransformPayload },
}

impl JobRequest {
    pub fn enhance(id: JobId, image: RasterImage, mode: &str, intensity: u32) -> Self {
        let (width, height) = (image.width(), image.height());
        Self::Enhance {
            id,
            payload: EnhancePayload {
                pixels: image.into_bytes(),
                width,
                height,
                mode: mode.to_string(),
                intensity,
            },
        }
    }

    pub fn transform(id: JobId, source: RasterImage, corners: &[Point], output_width: u32, output_height: u32) -> Self {
        let (source_width, source_height) = (source.width(), source.height());
        Self::Transform {
            id,
            payload: TransformPayload {
                pixels: source.into_bytes(),
                source_width,
                source_height,
                corners: corners.to_vec(),
                output_width,
                output_height,
            },
        }
    }

    pub fn id(&self) -> JobId {
        match self {
            Self::Enhance { id, .. } | Self::Transform { id, .. } => *id,
        }
    }

    /// Wire name of the job kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Enhance { .. } => "enhance",
            Self::Transform { .. } => "transform",
        }
    }

    /// Replace the correlation id, returning the previous one.
    pub fn replace_id(&mut self, new_id: JobId) -> JobId {
        match self {
            Self::Enhance { id, .. } | Self::Transform { id, .. } => std::mem::replace(id, new_id),
        }
    }
}

/// The worker's answer to exactly one request, matched by `id`.
///
/// Either `ok` with `pixels`, `width` and `height`, or not `ok` with `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: JobId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixels: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResponse {
    pub fn success(id: JobId, image: RasterImage) -> Self {
        let (width, height) = (image.width(), image.height());
        Self {
            id,
            ok: true,
            pixels: Some(image.into_bytes()),
            width: Some(width),
            height: Some(height),
            error: None,
        }
    }

    pub fn failure(id: JobId, error: &ScanError) -> Self {
        Self {
            id,
            ok: false,
            pixels: None,
            width: None,
            height: None,
            error: Some(error.to_string()),
        }
    }

    /// Convert into the result raster, or `JobFailed` with the worker's
    /// error message.
    pub fn into_result(self) -> Result<RasterImage> {
        if !self.ok {
            let message = self.error.unwrap_or_else(|| "unspecified worker error".to_string());
            return Err(ScanError::JobFailed(message));
        }
        match (self.pixels, self.width, self.height) {
            (Some(pixels), Some(width), Some(height)) => RasterImage::new(width, height, pixels),
            _ => Err(ScanError::JobFailed(format!(
                "success response for job {} is missing its raster",
                self.id
            ))),
        }
    }
}
