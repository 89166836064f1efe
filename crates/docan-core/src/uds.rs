//! Upper-edge consumer: routing completed messages to diagnostic jobs.
//!
//! The transport hands every reassembled message to its upper layer;
//! this module is the thin edge of that layer. Jobs register for the
//! service identifiers they answer, the dispatcher routes requests by
//! the first request byte and queues responses for the embedder to
//! hand back to [`TransportLayer::send`](crate::TransportLayer::send).
//! Diagnostic semantics beyond routing live above this crate.

use std::collections::VecDeque;

use bytes::Bytes;
use docan_frame::TransportAddress;
use tracing::{debug, warn};

use crate::{error::ProcessingResult, job::JobHandle, upper::UpperLayer};

/// Negative response service identifier.
const NEGATIVE_RESPONSE: u8 = 0x7F;

/// Negative response code: service not supported.
const SERVICE_NOT_SUPPORTED: u8 = 0x11;

/// One diagnostic job answering a set of service identifiers.
pub trait DiagnosticJob {
    /// Service identifiers (first request byte) this job answers.
    fn service_ids(&self) -> &[u8];

    /// Handle a request addressed to this node.
    ///
    /// Returns the response payload, or `None` when the request is to
    /// be answered with a negative response.
    fn handle_request(
        &mut self,
        source: TransportAddress,
        target: TransportAddress,
        request: &[u8],
    ) -> Option<Vec<u8>>;
}

/// A response owed to a diagnostic tester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResponse {
    /// Local node the response is sent from.
    pub source: TransportAddress,
    /// Tester node the response is sent to.
    pub target: TransportAddress,
    /// Response payload.
    pub payload: Bytes,
}

/// Routes completed messages to registered jobs.
///
/// Responses are queued rather than sent directly: the embedder drains
/// [`take_responses`](Self::take_responses) and feeds them back into
/// the transport, which keeps the dispatcher free of any transport
/// reference and callable from within transport callbacks.
#[derive(Default)]
pub struct ServiceDispatcher {
    jobs: Vec<Box<dyn DiagnosticJob>>,
    responses: VecDeque<PendingResponse>,
    outcomes: Vec<(JobHandle, ProcessingResult)>,
}

impl ServiceDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job for its service identifiers.
    pub fn register(&mut self, job: Box<dyn DiagnosticJob>) {
        self.jobs.push(job);
    }

    /// Drain the responses produced by handled requests.
    pub fn take_responses(&mut self) -> Vec<PendingResponse> {
        self.responses.drain(..).collect()
    }

    /// Outcomes of messages previously handed to the transport.
    #[must_use]
    pub fn outcomes(&self) -> &[(JobHandle, ProcessingResult)] {
        &self.outcomes
    }
}

impl UpperLayer for ServiceDispatcher {
    fn message_received(
        &mut self,
        source: TransportAddress,
        target: TransportAddress,
        data: &[u8],
    ) {
        let Some(&service) = data.first() else {
            warn!(source, target, "empty diagnostic request dropped");
            return;
        };
        let job = self
            .jobs
            .iter_mut()
            .find(|job| job.service_ids().contains(&service));
        let response = match job {
            Some(job) => job.handle_request(source, target, data),
            None => None,
        };
        let payload = response.map_or_else(
            || {
                debug!(source, service, "negative response: service not supported");
                Bytes::from(vec![NEGATIVE_RESPONSE, service, SERVICE_NOT_SUPPORTED])
            },
            Bytes::from,
        );
        // answer flows back towards the requester
        self.responses.push_back(PendingResponse { source: target, target: source, payload });
    }

    fn message_processed(&mut self, handle: JobHandle, result: ProcessingResult) {
        if !result.is_success() {
            warn!(handle = %handle, ?result, "diagnostic response not delivered");
        }
        self.outcomes.push((handle, result));
    }
}
