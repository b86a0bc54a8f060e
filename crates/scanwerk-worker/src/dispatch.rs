// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request dispatch — turns one JobRequest into exactly one JobResponse.
//
// Every failure, including a panic inside a pipeline stage, becomes a
// failure response for that job only; the caller's worker loop keeps going.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info, instrument, warn};

use scanwerk_core::{EnhanceMode, Quad, Result, ScanError};
use scanwerk_document::scan::composite::MAX_INTENSITY;
use scanwerk_document::{RasterImage, ScanEnhancer};

use crate::protocol::{EnhancePayload, JobRequest, JobResponse, TransformPayload};

/// Run `request` to completion on the current thread.
#[instrument(skip_all, fields(id = %request.id(), kind = request.kind()))]
pub fn handle_request(enhancer: &ScanEnhancer, request: JobRequest) -> JobResponse {
    let id = request.id();
    let outcome = guarded(|| match request {
        JobRequest::Enhance { payload, .. } => run_enhance(enhancer, payload),
        JobRequest::Transform { payload, .. } => run_transform(enhancer, payload),
    });

    match outcome {
        Ok(image) => {
            info!(width = image.width(), height = image.height(), "Job completed");
            JobResponse::success(id, image)
        }
        Err(err) => {
            warn!(error = %err, "Job failed");
            JobResponse::failure(id, &err)
        }
    }
}

/// Run `job`, converting a panic into `WorkerFault`.
fn guarded(job: impl FnOnce() -> Result<RasterImage>) -> Result<RasterImage> {
    panic::catch_unwind(AssertUnwindSafe(job))
        .unwrap_or_else(|payload| Err(ScanError::WorkerFault(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "pipeline panicked".to_string()
    }
}

/// Resolve a wire mode name, logging the grayscale fallback.
pub fn resolve_mode(name: &str, strict: bool) -> Result<EnhanceMode> {
    let mode = EnhanceMode::resolve(name, strict)?;
    if EnhanceMode::from_name(name).is_none() {
        warn!(requested = name, "Unknown enhancement mode, falling back to grayscale");
    }
    Ok(mode)
}

fn run_enhance(enhancer: &ScanEnhancer, payload: EnhancePayload) -> Result<RasterImage> {
    let mode = resolve_mode(&payload.mode, enhancer.config().strict_modes)?;
    let intensity = clamp_intensity(payload.intensity);
    let image = RasterImage::new(payload.width, payload.height, payload.pixels)?;
    enhancer.enhance(&image, mode, intensity)
}

fn run_transform(enhancer: &ScanEnhancer, payload: TransformPayload) -> Result<RasterImage> {
    let corners = Quad::from_slice(&payload.corners)?;
    let source = RasterImage::new(payload.source_width, payload.source_height, payload.pixels)?;
    enhancer.correct_perspective(&source, &corners, payload.output_width, payload.output_height)
}

fn clamp_intensity(intensity: u32) -> u8 {
    if intensity > u32::from(MAX_INTENSITY) {
        debug!(intensity, "Intensity above 100 clamped");
        return MAX_INTENSITY;
    }
    intensity as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::{EngineConfig, JobId, Point};

    fn gray(width: u32, height: u32) -> RasterImage {
        RasterImage::filled(width, height, [100, 100, 100, 255]).unwrap()
    }

    #[test]
    fn enhance_request_succeeds_with_same_dimensions() {
        let request = JobRequest::enhance(JobId(1), gray(4, 4), "auto", 100);
        let response = handle_request(&ScanEnhancer::default(), request);
        assert!(response.ok);
        assert_eq!(response.id, JobId(1));
        assert_eq!((response.width, response.height), (Some(4), Some(4)));
        assert!(response.pixels.unwrap().iter().all(|&b| b == 255));
    }

    #[test]
    fn unknown_mode_falls_back_to_grayscale() {
        let image = RasterImage::filled(3, 3, [255, 0, 0, 255]).unwrap();
        let request = JobRequest::enhance(JobId(2), image, "sepia", 100);
        let out = handle_request(&ScanEnhancer::default(), request)
            .into_result()
            .unwrap();
        assert_eq!(out.pixel(0, 0), [76, 76, 76, 255]);
    }

    #[test]
    fn strict_modes_reject_unknown_names() {
        let enhancer = ScanEnhancer::new(EngineConfig {
            strict_modes: true,
            ..EngineConfig::default()
        });
        let response = handle_request(&enhancer, JobRequest::enhance(JobId(3), gray(4, 4), "AUTO", 50));
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("AUTO"));
    }

    #[test]
    fn oversized_intensity_is_clamped() {
        let enhancer = ScanEnhancer::default();
        let at_100 = handle_request(&enhancer, JobRequest::enhance(JobId(1), gray(5, 5), "lighten", 100));
        let at_900 = handle_request(&enhancer, JobRequest::enhance(JobId(1), gray(5, 5), "lighten", 900));
        assert_eq!(at_100, at_900);
    }

    #[test]
    fn mismatched_buffer_is_a_failure_response() {
        let request = JobRequest::Enhance {
            id: JobId(5),
            payload: EnhancePayload {
                pixels: vec![0; 10],
                width: 2,
                height: 2,
                mode: "auto".into(),
                intensity: 100,
            },
        };
        let response = handle_request(&ScanEnhancer::default(), request);
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("pixel buffer has 10 bytes, expected 16"));
    }

    #[test]
    fn degenerate_quad_reports_singular_homography() {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        ];
        let request = JobRequest::transform(JobId(6), gray(40, 40), &corners, 20, 20);
        let response = handle_request(&ScanEnhancer::default(), request);
        assert!(!response.ok);
        assert_eq!(response.error, Some(ScanError::SingularHomography.to_string()));
    }

    #[test]
    fn wrong_corner_count_is_invalid_quad() {
        let corners = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let request = JobRequest::transform(JobId(7), gray(20, 20), &corners, 10, 10);
        let response = handle_request(&ScanEnhancer::default(), request);
        assert!(response.error.unwrap().contains("expected 4 corners"));
    }

    #[test]
    fn transform_produces_requested_size() {
        let corners = Quad::rectangle(19.0, 19.0).0;
        let request = JobRequest::transform(JobId(8), gray(20, 20), &corners, 15, 11);
        let out = handle_request(&ScanEnhancer::default(), request)
            .into_result()
            .unwrap();
        assert_eq!((out.width(), out.height()), (15, 11));
    }

    #[test]
    fn small_identity_transform_returns_source() {
        let bytes: Vec<u8> = (0..16u8).flat_map(|i| [i, i * 3, 200 - i, 255]).collect();
        let source = RasterImage::new(4, 4, bytes).unwrap();
        let request = JobRequest::transform(JobId(1), source.clone(), &Quad::rectangle(4.0, 4.0).0, 4, 4);
        let response = handle_request(&ScanEnhancer::default(), request);
        assert!(response.ok, "{:?}", response.error);
        assert_eq!(response.into_result().unwrap(), source);
    }

    #[test]
    fn panics_become_worker_faults() {
        let result = guarded(|| panic!("stage exploded"));
        match result {
            Err(ScanError::WorkerFault(message)) => assert_eq!(message, "stage exploded"),
            other => panic!("expected worker fault, got {other:?}"),
        }
        let formatted = guarded(|| panic!("bad index {}", 3));
        assert!(matches!(formatted, Err(ScanError::WorkerFault(m)) if m == "bad index 3"));
    }
}
