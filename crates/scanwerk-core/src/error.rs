// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Caller input --
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("unknown enhancement mode: {0}")]
    UnknownMode(String),

    #[error("invalid quadrilateral: {0}")]
    InvalidQuad(String),

    // -- Geometry --
    #[error("transform failed: quadrilateral is degenerate (singular homography)")]
    SingularHomography,

    // -- Worker / job protocol --
    #[error("worker fault: {0}")]
    WorkerFault(String),

    #[error("worker is not running")]
    WorkerUnavailable,

    #[error("job failed: {0}")]
    JobFailed(String),

    // -- Encoding / I/O --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
