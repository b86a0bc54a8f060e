// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface of the `scanwerk` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use scanwerk_core::Point;

#[derive(Debug, Parser)]
#[command(name = "scanwerk")]
#[command(version, about = "Document photo enhancement and perspective correction")]
pub struct Cli {
    /// Engine configuration as JSON; defaults apply to missing fields
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enhance a document photo
    Enhance {
        /// Input image (any format the decoder supports)
        input: PathBuf,

        /// Output image; the format follows the extension
        output: PathBuf,

        /// auto, scan, lighten, sharpen or grayscale
        #[arg(short, long, default_value = "auto")]
        mode: String,

        /// Blend strength in percent; values above 100 are clamped
        #[arg(short, long, default_value_t = 100)]
        intensity: u32,
    },
    /// Crop and dewarp a document by its four corners
    Transform {
        input: PathBuf,

        output: PathBuf,

        /// Corners as x,y in order top-left, top-right, bottom-right, bottom-left
        #[arg(short, long, num_args = 4, required = true, allow_hyphen_values = true, value_parser = parse_point)]
        corners: Vec<Point>,

        /// Output width; defaults to the longer of the top and bottom edges
        #[arg(long)]
        width: Option<u32>,

        /// Output height; defaults to the longer of the left and right edges
        #[arg(long)]
        height: Option<u32>,
    },
    /// Answer JSON-lines job requests on stdin with responses on stdout
    Serve,
}

/// Parse `x,y` into a point.
pub fn parse_point(text: &str) -> Result<Point, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got `{text}`"))?;
    let coord = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate `{part}`: {e}"))
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}
