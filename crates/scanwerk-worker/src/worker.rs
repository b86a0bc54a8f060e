// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background worker and its async client.
//
// The worker is one dedicated OS thread that pulls requests off a tokio
// channel and runs each to completion in arrival order. The client assigns
// monotonically increasing job ids, parks a oneshot sender per request in
// the pending map, and a routing task resolves each one when the matching
// response comes back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use scanwerk_core::{EngineConfig, EnhanceMode, JobId, Point, Result, ScanError};
use scanwerk_document::{RasterImage, ScanEnhancer};

use crate::dispatch::handle_request;
use crate::protocol::{JobRequest, JobResponse};

type PendingMap = Arc<Mutex<HashMap<JobId, oneshot::Sender<JobResponse>>>>;

/// A request that has been handed to the worker and awaits its response.
#[derive(Debug)]
pub struct PendingJob {
    id: JobId,
    caller_id: JobId,
    response: oneshot::Receiver<JobResponse>,
}

impl PendingJob {
    /// The id the client assigned to this job.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Wait for the response. Its `id` is restored to the one the request
    /// carried when it was queued.
    ///
    /// Resolves to `WorkerUnavailable` if the worker stops first.
    pub async fn wait(self) -> Result<JobResponse> {
        let mut response = self.response.await.map_err(|_| ScanError::WorkerUnavailable)?;
        response.id = self.caller_id;
        Ok(response)
    }
}

/// Async handle to the background worker.
///
/// The response router runs as a task on the tokio runtime that spawned
/// the client.
#[derive(Debug)]
pub struct WorkerClient {
    requests: Option<mpsc::UnboundedSender<JobRequest>>,
    pending: PendingMap,
    next_id: AtomicU64,
    thread: Option<thread::JoinHandle<()>>,
    router: Option<JoinHandle<()>>,
}

impl WorkerClient {
    // -- Lifecycle ------------------------------------------------------------

    /// Start the worker thread and the response router.
    ///
    /// Fails with `WorkerUnavailable` outside a tokio runtime.
    #[instrument(skip(config))]
    pub fn spawn(config: EngineConfig) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            warn!(error = %err, "No async runtime for the response router");
            ScanError::WorkerUnavailable
        })?;
        let (request_tx, request_rx) = mpsc::unbounded_channel::<JobRequest>();
        let (response_tx, response_rx) = mpsc::unbounded_channel::<JobResponse>();

        let thread = thread::Builder::new()
            .name("scanwerk-worker".into())
            .spawn(move || run_worker(config, request_rx, response_tx))?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let router = runtime.spawn(route_responses(response_rx, Arc::clone(&pending)));
        info!("Worker started");

        Ok(Self {
            requests: Some(request_tx),
            pending,
            next_id: AtomicU64::new(1),
            thread: Some(thread),
            router: Some(router),
        })
    }

    /// Stop accepting jobs, let the worker drain its queue, and join it.
    ///
    /// Jobs already queued still complete. Submissions after shutdown fail
    /// with `WorkerUnavailable`.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.requests.take();
        if let Some(handle) = self.thread.take() {
            tokio::task::spawn_blocking(move || handle.join())
                .await
                .map_err(|e| ScanError::WorkerFault(format!("join task failed: {e}")))?
                .map_err(|_| ScanError::WorkerFault("worker thread panicked".into()))?;
        }
        if let Some(router) = self.router.take() {
            router
                .await
                .map_err(|e| ScanError::WorkerFault(format!("response router failed: {e}")))?;
        }
        info!("Worker stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.requests.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Number of jobs queued or running that have not been answered yet.
    pub fn pending_jobs(&self) -> usize {
        lock(&self.pending).len()
    }

    // -- Submission -----------------------------------------------------------

    /// Queue `request` without waiting for it.
    ///
    /// The request's own id is replaced by a client-assigned one for
    /// correlation and restored on the response.
    pub fn enqueue(&self, mut request: JobRequest) -> Result<PendingJob> {
        let requests = self.requests.as_ref().ok_or(ScanError::WorkerUnavailable)?;
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let caller_id = request.replace_id(id);

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);
        if requests.send(request).is_err() {
            lock(&self.pending).remove(&id);
            return Err(ScanError::WorkerUnavailable);
        }
        debug!(%id, %caller_id, "Job queued");

        Ok(PendingJob {
            id,
            caller_id,
            response: rx,
        })
    }

    /// Queue `request` and wait for its response.
    pub async fn submit(&self, request: JobRequest) -> Result<JobResponse> {
        self.enqueue(request)?.wait().await
    }

    /// Enhance one raster. Failure responses surface as `JobFailed`.
    pub async fn enhance(&self, image: RasterImage, mode: EnhanceMode, intensity: u32) -> Result<RasterImage> {
        self.enhance_named(image, mode.as_str(), intensity).await
    }

    /// Enhance with a wire mode name, subject to the worker's fallback rules.
    pub async fn enhance_named(&self, image: RasterImage, mode: &str, intensity: u32) -> Result<RasterImage> {
        let request = JobRequest::enhance(JobId(0), image, mode, intensity);
        self.submit(request).await?.into_result()
    }

    /// Warp the `corners` region of `source` to `output_width x output_height`.
    pub async fn transform(
        &self,
        source: RasterImage,
        corners: &[Point],
        output_width: u32,
        output_height: u32,
    ) -> Result<RasterImage> {
        let request = JobRequest::transform(JobId(0), source, corners, output_width, output_height);
        self.submit(request).await?.into_result()
    }

    /// Enhance every page with the same settings.
    ///
    /// All pages are queued before the first result is awaited, and results
    /// come back in page order. A failed page does not affect its siblings.
    pub async fn enhance_all(&self, pages: Vec<RasterImage>, mode: EnhanceMode, intensity: u32) -> Vec<Result<RasterImage>> {
        let queued: Vec<Result<PendingJob>> = pages
            .into_iter()
            .map(|page| self.enqueue(JobRequest::enhance(JobId(0), page, mode.as_str(), intensity)))
            .collect();

        let mut results = Vec::with_capacity(queued.len());
        for job in queued {
            let result = match job {
                Ok(job) => job.wait().await.and_then(JobResponse::into_result),
                Err(err) => Err(err),
            };
            results.push(result);
        }
        results
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker thread body: one job at a time, strictly in arrival order.
fn run_worker(
    config: EngineConfig,
    mut requests: mpsc::UnboundedReceiver<JobRequest>,
    responses: mpsc::UnboundedSender<JobResponse>,
) {
    let enhancer = ScanEnhancer::new(config);
    while let Some(request) = requests.blocking_recv() {
        let response = handle_request(&enhancer, request);
        if responses.send(response).is_err() {
            warn!("Response channel closed, worker exiting");
            break;
        }
    }
    debug!("Worker loop finished");
}

/// Resolve pending entries as responses arrive. When the worker goes away
/// the remaining senders are dropped, which wakes their waiters with
/// `WorkerUnavailable`.
async fn route_responses(mut responses: mpsc::UnboundedReceiver<JobResponse>, pending: PendingMap) {
    while let Some(response) = responses.recv().await {
        let id = response.id;
        match lock(&pending).remove(&id) {
            Some(slot) => {
                if slot.send(response).is_err() {
                    debug!(%id, "Caller stopped waiting for job");
                }
            }
            None => warn!(%id, "Response for unknown job id dropped"),
        }
    }

    let orphaned = {
        let mut map = lock(&pending);
        let count = map.len();
        map.clear();
        count
    };
    if orphaned > 0 {
        warn!(orphaned, "Worker stopped with jobs outstanding");
    }
}
