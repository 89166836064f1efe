//! Contract between the transport core and the diagnostic layer above.

use docan_frame::TransportAddress;

use crate::{error::ProcessingResult, job::JobHandle};

/// Upper-edge consumer of the transport.
///
/// The transport promises at most one in-flight message per transport
/// address pair and exactly one `message_processed` call per accepted
/// outgoing message. Both callbacks are issued outside the container's
/// critical section, so an implementation may call back into the
/// transport (for instance to send a response).
pub trait UpperLayer {
    /// A complete reassembled message arrived.
    fn message_received(
        &mut self,
        source: TransportAddress,
        target: TransportAddress,
        data: &[u8],
    );

    /// The outgoing message accepted under `handle` finished.
    fn message_processed(&mut self, handle: JobHandle, result: ProcessingResult);
}

/// Session-dependent addressing policy of the diagnostic layer.
///
/// Consulted during [session
/// changes](crate::TransportLayer::session_changed): in-flight messages
/// whose pair is no longer allowed are aborted with
/// [`ProcessingResult::ConditionsNotCorrect`].
pub trait SessionPolicy {
    /// True if messages between `source` and `target` may continue in
    /// the new session.
    fn is_allowed(&self, source: TransportAddress, target: TransportAddress) -> bool;
}

/// Policy allowing every pair; useful as the default session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SessionPolicy for AllowAll {
    fn is_allowed(&self, _source: TransportAddress, _target: TransportAddress) -> bool {
        true
    }
}
