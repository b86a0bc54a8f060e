// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — Document Photo Enhancement and Perspective Correction
//
// Entry point. Initialises logging, loads the engine configuration, starts
// the background worker, and runs the requested subcommand through it.

mod cli;
mod commands;
mod serve;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use scanwerk_core::{Result, ScanError};
use scanwerk_worker::WorkerClient;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `serve` keeps stdout for protocol messages.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Scanwerk failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;
    tracing::info!("Scanwerk starting");
    let mut client = WorkerClient::spawn(config)?;

    let outcome = match cli.command {
        Command::Enhance {
            input,
            output,
            mode,
            intensity,
        } => commands::enhance(&client, &input, &output, &mode, intensity).await,
        Command::Transform {
            input,
            output,
            corners,
            width,
            height,
        } => commands::transform(&client, &input, &output, &corners, width, height).await,
        Command::Serve => {
            let shared = Arc::new(client);
            let stdin = BufReader::new(tokio::io::stdin());
            let served = serve::serve(Arc::clone(&shared), stdin, tokio::io::stdout()).await;
            client = Arc::try_unwrap(shared)
                .map_err(|_| ScanError::WorkerFault("worker client still shared after serve".into()))?;
            served
        }
    };

    client.shutdown().await?;
    outcome
}
