// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end checks of the JSON wire protocol through a live worker.

use serde_json::{Value, json};

use scanwerk_core::{EngineConfig, JobId};
use scanwerk_worker::{JobRequest, JobResponse, WorkerClient};

async fn round_trip(client: &WorkerClient, request: Value) -> Value {
    let request: JobRequest = serde_json::from_value(request).unwrap();
    let response = client.submit(request).await.unwrap();
    serde_json::to_value(&response).unwrap()
}

fn opaque_gray(pixels: usize, value: u8) -> Vec<u8> {
    [value, value, value, 255].repeat(pixels)
}

#[tokio::test]
async fn enhance_message_gets_matching_success_message() {
    let client = WorkerClient::spawn(EngineConfig::default()).unwrap();
    let response = round_trip(
        &client,
        json!({
            "kind": "enhance",
            "id": 41,
            "payload": { "pixels": opaque_gray(16, 100), "width": 4, "height": 4, "mode": "auto", "intensity": 100 }
        }),
    )
    .await;

    assert_eq!(response["id"], json!(41));
    assert_eq!(response["ok"], json!(true));
    assert_eq!(response["width"], json!(4));
    assert_eq!(response["height"], json!(4));
    assert!(response.get("error").is_none());
    let pixels = response["pixels"].as_array().unwrap();
    assert_eq!(pixels.len(), 64);
    assert!(pixels.iter().all(|v| v == &json!(255)));
}

#[tokio::test]
async fn transform_message_with_degenerate_quad_fails_distinctly() {
    let client = WorkerClient::spawn(EngineConfig::default()).unwrap();
    let response = round_trip(
        &client,
        json!({
            "kind": "transform",
            "id": 9,
            "payload": {
                "pixels": opaque_gray(40 * 40, 0),
                "sourceWidth": 40, "sourceHeight": 40,
                "corners": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 20, "y": 0}, {"x": 30, "y": 0}],
                "outputWidth": 20, "outputHeight": 20
            }
        }),
    )
    .await;

    assert_eq!(response["id"], json!(9));
    assert_eq!(response["ok"], json!(false));
    assert!(response.get("pixels").is_none());
    assert!(response["error"].as_str().unwrap().contains("degenerate"));
}

#[tokio::test]
async fn many_requests_in_flight_resolve_by_id() {
    let client = WorkerClient::spawn(EngineConfig::default()).unwrap();
    let jobs: Vec<_> = (0..8u8)
        .map(|i| {
            let request = JobRequest::Enhance {
                id: JobId(100 + u64::from(i)),
                payload: scanwerk_worker::EnhancePayload {
                    pixels: opaque_gray(4, i * 10),
                    width: 2,
                    height: 2,
                    mode: "grayscale".into(),
                    intensity: 100,
                },
            };
            client.enqueue(request).unwrap()
        })
        .collect();

    for (i, job) in jobs.into_iter().enumerate().rev() {
        let response: JobResponse = job.wait().await.unwrap();
        assert_eq!(response.id, JobId(100 + i as u64));
        assert_eq!(response.pixels.unwrap()[0], (i * 10) as u8);
    }
}

#[tokio::test]
async fn malformed_buffer_fails_without_killing_worker() {
    let mut client = WorkerClient::spawn(EngineConfig::default()).unwrap();
    let bad = round_trip(
        &client,
        json!({
            "kind": "enhance", "id": 1,
            "payload": { "pixels": [1, 2, 3], "width": 4, "height": 4, "mode": "scan", "intensity": 100 }
        }),
    )
    .await;
    assert_eq!(bad["ok"], json!(false));

    let good = round_trip(
        &client,
        json!({
            "kind": "enhance", "id": 2,
            "payload": { "pixels": opaque_gray(4, 200), "width": 2, "height": 2, "mode": "sharpen", "intensity": 0 }
        }),
    )
    .await;
    assert_eq!(good["ok"], json!(true));
    assert_eq!(good["pixels"][0], json!(200));

    client.shutdown().await.unwrap();
}
