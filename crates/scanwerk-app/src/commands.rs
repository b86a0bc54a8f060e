// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-based subcommands. Both decode the input on the caller side, send
// the raster through the worker client, and encode whatever comes back.

use std::path::Path;

use tracing::{info, instrument};

use scanwerk_core::{EngineConfig, Point, Quad, Result, ScanError, check_crop_size};
use scanwerk_document::image::codec;
use scanwerk_worker::WorkerClient;

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let config = EngineConfig::from_json(&text)?;
            info!(path = %path.display(), "Loaded engine configuration");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

#[instrument(skip(client), fields(input = %input.display(), output = %output.display()))]
pub async fn enhance(client: &WorkerClient, input: &Path, output: &Path, mode: &str, intensity: u32) -> Result<()> {
    let image = codec::open(input)?;
    let enhanced = client.enhance_named(image, mode, intensity).await?;
    codec::save(enhanced, output)?;
    info!("Enhanced image written");
    Ok(())
}

#[instrument(skip(client, corners), fields(input = %input.display(), output = %output.display()))]
pub async fn transform(
    client: &WorkerClient,
    input: &Path,
    output: &Path,
    corners: &[Point],
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    let quad = checked_quad(corners)?;
    let (width, height) = output_size(&quad, width, height);
    check_crop_size(width, height)?;
    info!(width, height, "Output size");

    let source = codec::open(input)?;
    let corrected = client.transform(source, quad.corners(), width, height).await?;
    codec::save(corrected, output)?;
    info!("Corrected image written");
    Ok(())
}

/// Caller-side polygon check before a transform job is sent.
fn checked_quad(corners: &[Point]) -> Result<Quad> {
    let quad = Quad::from_slice(corners)?;
    if !quad.is_valid() {
        return Err(ScanError::InvalidQuad(
            "corners cross each other or enclose too small an area".into(),
        ));
    }
    Ok(quad)
}

/// Explicit dimensions win; missing ones come from the quad's edge lengths.
fn output_size(quad: &Quad, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let (suggested_width, suggested_height) = quad.suggested_output_size();
    (width.unwrap_or(suggested_width), height.unwrap_or(suggested_height))
}
