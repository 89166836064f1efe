//! Error and outcome types of the protocol core.
//!
//! `ProcessingResult` is the single word the upper layer receives about
//! every accepted message, success or failure. `SendError` covers
//! synchronous rejection before a message is accepted, so the two never
//! overlap and the processed listener fires exactly once per accepted
//! message.

use docan_frame::TransportAddress;
use thiserror::Error;

/// Outcome reported through the processed listener for every accepted
/// outgoing message, and logged for every incoming transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingResult {
    /// The message was fully transferred.
    NoError,
    /// The CAN driver refused the frame with a non-retryable error.
    TxFailed,
    /// The driver never confirmed transmission of a queued frame.
    TxCallbackTimeout,
    /// No flow control arrived in answer to the first frame.
    FlowControlTimeout,
    /// The gap between consecutive frames exceeded the receive timeout.
    RxTimeout,
    /// The frame codec rejected the message mid-transfer.
    GeneralProgrammingFailure,
    /// A consecutive frame carried an unexpected sequence number.
    WrongBlockSequenceCounter,
    /// The flow-control wait budget was exhausted.
    GeneralReject,
    /// No resources to accept the transfer; answered with FC overflow.
    UploadDownloadNotAccepted,
    /// The message was aborted by a session change or cancellation.
    ConditionsNotCorrect,
}

impl ProcessingResult {
    /// True for the success outcome.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::NoError)
    }
}

/// Synchronous rejection of [`send`](crate::TransportLayer::send).
///
/// A rejected message was never accepted, so no processed-listener
/// call follows.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The transport address pair is not in the addressing table.
    #[error("no connection for transport pair {from:#06x} -> {target:#06x}")]
    UnknownAddress {
        /// Local source node.
        from: TransportAddress,
        /// Remote target node.
        target: TransportAddress,
    },

    /// The message size cannot be carried on this link (empty, or the
    /// frame count overflows).
    #[error("message of {size} bytes is not sendable on this link")]
    InvalidMessageSize {
        /// Rejected message size.
        size: usize,
    },

    /// A message for the same transport pair is already in flight.
    #[error("transport pair {from:#06x} -> {target:#06x} already has a message in flight")]
    ConnectionBusy {
        /// Local source node.
        from: TransportAddress,
        /// Remote target node.
        target: TransportAddress,
    },

    /// The transmitter pool is exhausted.
    #[error("no transmitter slot available")]
    NoResourceAvailable,
}

/// Enqueue failure of the CAN driver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanWriteError {
    /// The transmit hardware queue is momentarily full; the frame may
    /// be retried.
    #[error("transmit hardware queue is full")]
    QueueFull,

    /// The frame cannot be queued; retrying will not help.
    #[error("frame could not be queued")]
    Failed,
}

impl CanWriteError {
    /// True if a later retry of the same frame can succeed.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::QueueFull)
    }
}
