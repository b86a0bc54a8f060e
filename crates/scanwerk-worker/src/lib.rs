// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk Worker — the job protocol and the background dispatcher that runs
// enhancement and perspective jobs off the caller's thread.  Requests and
// responses are correlated by job id; the worker handles one job at a time.

pub mod dispatch;
pub mod protocol;
pub mod worker;

pub use dispatch::handle_request;
pub use protocol::{EnhancePayload, JobRequest, JobResponse, TransformPayload};
pub use worker::{PendingJob, WorkerClient};
