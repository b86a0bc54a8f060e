// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON-lines protocol loop.
//
// Each input line is one JobRequest; each output line is the matching
// JobResponse. Requests are queued as soon as they are read, so responses
// are written in completion order and callers correlate them by id.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use scanwerk_core::{JobId, Result, ScanError};
use scanwerk_worker::{JobRequest, JobResponse, WorkerClient};

/// Serve requests from `input` until EOF, writing responses to `output`.
///
/// Returns once every request read has been answered.
pub async fn serve<R, W>(client: Arc<WorkerClient>, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut in_flight = JoinSet::new();
    let mut lines = input.lines();
    let mut received = 0u64;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        received += 1;

        let request = match serde_json::from_str::<JobRequest>(&line) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Malformed request line");
                let id = request_id(&line);
                send_response(&line_tx, id, Ok(JobResponse::failure(id, &ScanError::Serialization(err))));
                continue;
            }
        };

        let id = request.id();
        debug!(%id, kind = request.kind(), "Request received");
        match client.enqueue(request) {
            Ok(job) => {
                let tx = line_tx.clone();
                in_flight.spawn(async move {
                    let response = job.wait().await;
                    send_response(&tx, id, response);
                });
            }
            Err(err) => send_response(&line_tx, id, Err(err)),
        }
    }

    while in_flight.join_next().await.is_some() {}
    drop(line_tx);
    writer
        .await
        .map_err(|e| ScanError::WorkerFault(format!("response writer failed: {e}")))??;
    info!(received, "Input closed, all requests answered");
    Ok(())
}

/// Write `response`, answering a client-side failure under the request's `id`.
fn send_response(tx: &mpsc::UnboundedSender<String>, id: JobId, response: Result<JobResponse>) {
    let response = response.unwrap_or_else(|err| JobResponse::failure(id, &err));
    match serde_json::to_string(&response) {
        Ok(line) => {
            if tx.send(line).is_err() {
                warn!(id = %response.id, "Response writer gone");
            }
        }
        Err(err) => warn!(id = %response.id, error = %err, "Response could not be serialized"),
    }
}

/// Best-effort id of a line that failed to parse as a request.
fn request_id(line: &str) -> JobId {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|value| value.get("id").and_then(serde_json::Value::as_u64))
        .map_or(JobId(0), JobId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::EngineConfig;
    use serde_json::{Value, json};

    async fn run(lines: &[Value]) -> Vec<Value> {
        let client = Arc::new(WorkerClient::spawn(EngineConfig::default()).unwrap());
        let input: String = lines.iter().map(|v| format!("{v}\n")).collect();
        let (reader, writer) = tokio::io::duplex(1 << 20);
        serve(client, input.as_bytes(), writer).await.unwrap();

        let mut output = String::new();
        let mut reader = tokio::io::BufReader::new(reader);
        tokio::io::AsyncReadExt::read_to_string(&mut reader, &mut output).await.unwrap();
        output.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    fn gray_pixels(count: usize) -> Vec<u8> {
        [100, 100, 100, 255].repeat(count)
    }

    #[tokio::test]
    async fn every_request_gets_one_response() {
        let responses = run(&[
            json!({"kind": "enhance", "id": 1,
                   "payload": {"pixels": gray_pixels(16), "width": 4, "height": 4, "mode": "auto", "intensity": 100}}),
            json!({"kind": "transform", "id": 2,
                   "payload": {"pixels": gray_pixels(1600), "sourceWidth": 40, "sourceHeight": 40,
                               "corners": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 20, "y": 0}, {"x": 30, "y": 0}],
                               "outputWidth": 20, "outputHeight": 20}}),
        ])
        .await;

        assert_eq!(responses.len(), 2);
        let by_id = |id: u64| responses.iter().find(|r| r["id"] == json!(id)).unwrap();
        assert_eq!(by_id(1)["ok"], json!(true));
        assert_eq!(by_id(2)["ok"], json!(false));
    }

    #[tokio::test]
    async fn malformed_lines_are_answered_with_failures() {
        let responses = run(&[json!({"kind": "enhance", "id": 77, "payload": {"width": 4}})]).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], json!(77));
        assert_eq!(responses[0]["ok"], json!(false));
        assert!(responses[0]["error"].as_str().unwrap().starts_with("serialization error"));
    }

    #[test]
    fn client_side_failures_keep_the_request_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        send_response(&tx, JobId(42), Err(ScanError::WorkerUnavailable));
        let line: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(line["id"], json!(42));
        assert_eq!(line["ok"], json!(false));
    }

    #[tokio::test]
    async fn stopped_worker_answers_under_the_request_id() {
        let mut client = WorkerClient::spawn(EngineConfig::default()).unwrap();
        client.shutdown().await.unwrap();
        let request = json!({"kind": "enhance", "id": 9,
                             "payload": {"pixels": gray_pixels(1), "width": 1, "height": 1, "mode": "auto", "intensity": 100}});
        let input = format!("{request}\n");
        let (reader, writer) = tokio::io::duplex(1 << 16);
        serve(Arc::new(client), input.as_bytes(), writer).await.unwrap();

        let mut output = String::new();
        let mut reader = tokio::io::BufReader::new(reader);
        tokio::io::AsyncReadExt::read_to_string(&mut reader, &mut output).await.unwrap();
        let response: Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(response["id"], json!(9));
        assert_eq!(response["ok"], json!(false));
    }

    #[test]
    fn request_id_falls_back_to_zero() {
        assert_eq!(request_id(r#"{"id": 12, "kind": "bogus"}"#), JobId(12));
        assert_eq!(request_id("not json"), JobId(0));
    }
}
