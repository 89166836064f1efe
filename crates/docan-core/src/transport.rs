//! Session container: pools, lock discipline and the cyclic task.
//!
//! One [`TransportLayer`] multiplexes every connection of one physical
//! CAN link. Two principals drive it: the CAN interrupt path
//! ([`can_frame_received`](TransportLayer::can_frame_received) and
//! [`can_frame_sent`](TransportLayer::can_frame_sent)) and the periodic
//! [`cyclic_task`](TransportLayer::cyclic_task). A single internal
//! mutex protects the pools, the parked first frame and the
//! transceiver's pending slot. The guard is never held across an
//! upper-layer callback; the CAN driver is only entered through its
//! non-blocking enqueue.

use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use docan_frame::{
    AddressingFilter, AddressingScheme, Connection, ConnectionInfo, DataLinkAddress, FlowStatus,
    FrameIndex, FrameSize, FrameListener, MessageSize, TransportAddress, decode_frame,
};
use tracing::{debug, trace, warn};

use crate::{
    driver::{CanDriver, TickGenerator},
    error::{ProcessingResult, SendError},
    job::JobHandle,
    params::Parameters,
    pool::SlotPool,
    receiver::{CfVerdict, PendingFirstFrame, RxMessage},
    transceiver::{PhysicalTransceiver, SendFramesResult},
    transmitter::{FcVerdict, TxMessage, TxProgress, TxState},
    upper::{SessionPolicy, UpperLayer},
};

/// Pool and buffer sizing of one transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportLayerConfig {
    /// Number of concurrent incoming segmented messages.
    pub receiver_pool_size: usize,
    /// Number of concurrent outgoing messages.
    pub transmitter_pool_size: usize,
    /// Largest accepted incoming message; larger announcements are
    /// answered with FC overflow.
    pub max_rx_message_size: MessageSize,
}

impl Default for TransportLayerConfig {
    fn default() -> Self {
        Self { receiver_pool_size: 8, transmitter_pool_size: 8, max_rx_message_size: 4095 }
    }
}

/// Live counters of one transport layer, for observation in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Reassemblies in progress.
    pub receivers: usize,
    /// Outgoing messages in progress.
    pub transmitters: usize,
    /// True while a first frame is parked for allocation.
    pub pending_first_frame: bool,
    /// True while a data frame awaits its transmit confirmation.
    pub send_pending: bool,
}

struct Inner {
    transceiver: PhysicalTransceiver,
    receivers: SlotPool<RxMessage>,
    transmitters: SlotPool<TxMessage>,
    pending_rx: Option<PendingFirstFrame>,
}

/// Outcome of one transmit attempt.
enum AttemptOutcome {
    /// A frame was handed to the driver.
    Queued,
    /// Transceiver slot or hardware queue busy; retry from the tick.
    Busy,
    /// Nothing to send right now.
    NotDue,
    /// The message is dead; report the result to the upper layer.
    Fatal(ProcessingResult),
    /// The handle no longer resolves.
    Gone,
}

/// Answer owed to the sender of a first frame.
enum FirstFrameAnswer {
    ClearToSend(ConnectionInfo),
    Wait(ConnectionInfo),
    Overflow(ConnectionInfo),
    RejectSilently(ConnectionInfo),
}

/// Transport layer of one physical CAN link.
pub struct TransportLayer<'f> {
    filter: &'f AddressingFilter,
    addressing: AddressingScheme,
    tick: &'f dyn TickGenerator,
    params: Parameters,
    config: TransportLayerConfig,
    inner: Mutex<Inner>,
}

impl<'f> TransportLayer<'f> {
    /// Create a transport layer over an addressing filter.
    #[must_use]
    pub fn new(
        filter: &'f AddressingFilter,
        addressing: AddressingScheme,
        tick: &'f dyn TickGenerator,
        config: TransportLayerConfig,
        params: Parameters,
    ) -> Self {
        Self {
            filter,
            addressing,
            tick,
            params,
            config,
            inner: Mutex::new(Inner {
                transceiver: PhysicalTransceiver::new(addressing),
                receivers: SlotPool::new(config.receiver_pool_size),
                transmitters: SlotPool::new(config.transmitter_pool_size),
                pending_rx: None,
            }),
        }
    }

    /// Protocol parameters of this layer.
    #[must_use]
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Live counters for observation.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        let inner = self.lock();
        TransportStats {
            receivers: inner.receivers.len(),
            transmitters: inner.transmitters.len(),
            pending_first_frame: inner.pending_rx.is_some(),
            send_pending: inner.transceiver.is_send_pending(),
        }
    }

    /// Accept an outgoing message.
    ///
    /// On success the message is in flight and the upper layer will see
    /// exactly one `message_processed` call for the returned handle.
    ///
    /// # Errors
    ///
    /// Synchronous rejections ([`SendError`]) mean the message was not
    /// accepted and no listener call follows.
    pub fn send(
        &self,
        now_us: u32,
        source: TransportAddress,
        target: TransportAddress,
        payload: Bytes,
        driver: &mut dyn CanDriver,
        upper: &mut dyn UpperLayer,
    ) -> Result<JobHandle, SendError> {
        let info = self
            .filter
            .resolve_transmission(source, target)
            .ok_or(SendError::UnknownAddress { from: source, target })?;
        let codec = self
            .filter
            .codec(info.codec_index)
            .ok_or(SendError::UnknownAddress { from: source, target })?;
        if payload.is_empty() || payload.len() > MessageSize::MAX as usize {
            return Err(SendError::InvalidMessageSize { size: payload.len() });
        }
        let size = payload.len();
        let (frame_count, consecutive_frame_data_size) = codec
            .encoded_frame_count(size as MessageSize)
            .map_err(|_| SendError::InvalidMessageSize { size })?;

        let handle = {
            let mut inner = self.lock();
            if inner.transmitters.find(|tx| tx.info.transport == info.transport).is_some() {
                return Err(SendError::ConnectionBusy { from: source, target });
            }
            inner
                .transmitters
                .allocate(TxMessage::new(
                    info,
                    payload,
                    frame_count,
                    consecutive_frame_data_size,
                    now_us,
                ))
                .ok_or(SendError::NoResourceAvailable)?
        };
        debug!(
            source,
            target,
            size,
            frames = frame_count,
            handle = %handle,
            "outgoing message accepted"
        );
        self.service_transmitter(handle, now_us, driver, upper);
        Ok(handle)
    }

    /// Abort an outgoing message.
    ///
    /// Idempotent: a stale handle is a no-op. An aborted message
    /// reports [`ProcessingResult::ConditionsNotCorrect`].
    pub fn cancel_send(
        &self,
        handle: JobHandle,
        upper: &mut dyn UpperLayer,
    ) -> bool {
        let cancelled = {
            let mut inner = self.lock();
            if inner.transmitters.release(handle).is_some() {
                inner.transceiver.cancel_send_data_frames(handle);
                true
            } else {
                false
            }
        };
        if cancelled {
            debug!(handle = %handle, "outgoing message cancelled");
            upper.message_processed(handle, ProcessingResult::ConditionsNotCorrect);
        }
        cancelled
    }

    /// Apply a diagnostic session change.
    ///
    /// Every in-flight message whose transport pair the new session
    /// does not allow is aborted with
    /// [`ProcessingResult::ConditionsNotCorrect`].
    pub fn session_changed(&self, policy: &dyn SessionPolicy, upper: &mut dyn UpperLayer) {
        let aborted = {
            let mut inner = self.lock();
            let aborted: Vec<JobHandle> = inner
                .transmitters
                .iter()
                .filter(|(_, tx)| {
                    !policy.is_allowed(tx.info.transport.source, tx.info.transport.target)
                })
                .map(|(handle, _)| handle)
                .collect();
            for handle in &aborted {
                inner.transceiver.cancel_send_data_frames(*handle);
                inner.transmitters.release(*handle);
            }

            let dropped: Vec<JobHandle> = inner
                .receivers
                .iter()
                .filter(|(_, rx)| {
                    !policy.is_allowed(rx.info.transport.source, rx.info.transport.target)
                })
                .map(|(handle, _)| handle)
                .collect();
            for handle in dropped {
                if let Some(rx) = inner.receivers.release(handle) {
                    warn!(
                        source = rx.info.transport.source,
                        target = rx.info.transport.target,
                        received = rx.buffer.len(),
                        expected = rx.expected_size,
                        "reassembly aborted by session change"
                    );
                }
            }
            if inner.pending_rx.as_ref().is_some_and(|pending| {
                !policy.is_allowed(pending.info.transport.source, pending.info.transport.target)
            }) {
                inner.pending_rx = None;
            }
            aborted
        };
        for handle in aborted {
            warn!(handle = %handle, "outgoing message aborted by session change");
            upper.message_processed(handle, ProcessingResult::ConditionsNotCorrect);
        }
    }

    /// Deliver one received CAN frame.
    ///
    /// Called from the CAN interrupt path. Frames that resolve to no
    /// connection or fail to decode are dropped.
    pub fn can_frame_received(
        &self,
        now_us: u32,
        can_id: u32,
        payload: &[u8],
        driver: &mut dyn CanDriver,
        upper: &mut dyn UpperLayer,
    ) {
        let Some(reception) = self.addressing.decode_reception_address(can_id, payload) else {
            return;
        };
        let Some(info) = self.filter.resolve_reception(reception) else {
            trace!(can_id, "frame for unknown address dropped");
            return;
        };
        let Some(connection) = self.filter.connection(info) else {
            return;
        };
        let mut router = FrameRouter { layer: self, now_us, driver, upper };
        if let Err(error) = decode_frame(&connection, payload, &mut router) {
            debug!(?error, reception, "undecodable frame dropped");
        }
    }

    /// Deliver the driver's transmit confirmation.
    ///
    /// Called from the CAN interrupt path after a queued frame went out
    /// on the bus.
    pub fn can_frame_sent(
        &self,
        now_us: u32,
        driver: &mut dyn CanDriver,
        upper: &mut dyn UpperLayer,
    ) {
        let mut completed: Option<JobHandle> = None;
        let mut follow_up: Option<JobHandle> = None;
        {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let Some((job, consumed)) = inner.transceiver.frame_sent() else {
                trace!("transmit confirmation without pending frame");
                return;
            };
            let Some(tx) = inner.transmitters.get_mut(job) else {
                trace!(handle = %job, "transmit confirmation for cancelled message");
                return;
            };
            match tx.frame_confirmed(consumed, &self.params, now_us) {
                None => trace!(handle = %job, "confirmation without frame in flight"),
                Some(TxProgress::Done) => {
                    inner.transmitters.release(job);
                    completed = Some(job);
                },
                Some(TxProgress::AwaitFlowControl) => {},
                Some(TxProgress::NextConsecutive) => follow_up = Some(job),
            }
        }
        if let Some(handle) = completed {
            debug!(handle = %handle, "outgoing message complete");
            upper.message_processed(handle, ProcessingResult::NoError);
        }
        if let Some(handle) = follow_up {
            self.service_transmitter(handle, now_us, driver, upper);
        }
    }

    /// Periodic maintenance: deadlines, allocation retries, separation
    /// gated consecutive frames and transmit retries.
    pub fn cyclic_task(&self, now_us: u32, driver: &mut dyn CanDriver, upper: &mut dyn UpperLayer) {
        let (failures, answer, due) = {
            let mut guard = self.lock();
            let inner = &mut *guard;

            let timed_out: Vec<JobHandle> = inner
                .receivers
                .iter()
                .filter(|(_, rx)| rx.deadline.is_expired(now_us))
                .map(|(handle, _)| handle)
                .collect();
            for handle in timed_out {
                if let Some(rx) = inner.receivers.release(handle) {
                    warn!(
                        source = rx.info.transport.source,
                        target = rx.info.transport.target,
                        received = rx.buffer.len(),
                        expected = rx.expected_size,
                        frames = rx.frame_count,
                        segment = rx.consecutive_frame_data_size,
                        "reassembly timed out"
                    );
                }
            }

            let failures: Vec<(JobHandle, ProcessingResult)> = inner
                .transmitters
                .iter()
                .filter(|(_, tx)| tx.deadline_expired(now_us))
                .filter_map(|(handle, tx)| match tx.state {
                    TxState::WaitTxDone => Some((handle, ProcessingResult::TxCallbackTimeout)),
                    TxState::WaitFlowControl => {
                        Some((handle, ProcessingResult::FlowControlTimeout))
                    },
                    TxState::Queued | TxState::SendConsecutive => None,
                })
                .collect();
            for (handle, _) in &failures {
                inner.transceiver.cancel_send_data_frames(*handle);
                inner.transmitters.release(*handle);
            }

            let answer = self.retry_pending_first_frame(inner, now_us);

            let due: Vec<JobHandle> = inner
                .transmitters
                .iter()
                .filter(|(_, tx)| tx.wants_frame(now_us))
                .map(|(handle, _)| handle)
                .collect();
            (failures, answer, due)
        };

        for (handle, result) in failures {
            warn!(handle = %handle, ?result, "outgoing message timed out");
            upper.message_processed(handle, result);
        }
        if let Some(answer) = answer {
            self.answer_first_frame(answer, driver);
        }
        for handle in due {
            self.service_transmitter(handle, now_us, driver, upper);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retry allocating a parked first frame. Returns the flow-control
    /// answer owed to the sender, if any.
    fn retry_pending_first_frame(
        &self,
        inner: &mut Inner,
        now_us: u32,
    ) -> Option<FirstFrameAnswer> {
        if !inner.pending_rx.as_ref().is_some_and(|pending| pending.retry_at.is_expired(now_us)) {
            return None;
        }
        if !inner.receivers.is_full() {
            let pending = inner.pending_rx.take()?;
            let message = RxMessage::new(
                pending.info,
                pending.message_size,
                pending.frame_count,
                pending.consecutive_frame_data_size,
                pending.first_frame_data(),
                &self.params,
                now_us,
            );
            inner.receivers.allocate(message);
            return Some(FirstFrameAnswer::ClearToSend(pending.info));
        }
        let exhausted_retries =
            inner.pending_rx.as_ref().is_some_and(|pending| pending.retries_left == 0);
        if exhausted_retries {
            let pending = inner.pending_rx.take()?;
            return Some(FirstFrameAnswer::Overflow(pending.info));
        }
        let exhausted_waits =
            inner.pending_rx.as_ref().is_some_and(|pending| pending.waits_left == 0);
        if exhausted_waits {
            let pending = inner.pending_rx.take()?;
            return Some(FirstFrameAnswer::RejectSilently(pending.info));
        }
        let pending = inner.pending_rx.as_mut()?;
        pending.retries_left -= 1;
        pending.waits_left -= 1;
        pending.retry_at = PendingFirstFrame::next_retry(&self.params, now_us);
        Some(FirstFrameAnswer::Wait(pending.info))
    }

    /// Open a reassembly for a decoded first frame.
    fn open_reassembly(
        &self,
        info: ConnectionInfo,
        message_size: MessageSize,
        frame_count: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        data: &[u8],
        now_us: u32,
        driver: &mut dyn CanDriver,
    ) {
        if message_size > self.config.max_rx_message_size {
            warn!(
                size = message_size,
                limit = self.config.max_rx_message_size,
                "announced message exceeds receive capacity"
            );
            self.answer_first_frame(FirstFrameAnswer::Overflow(info), driver);
            return;
        }
        let answer = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            if let Some(stale) = inner
                .receivers
                .find(|rx| rx.info.data_link.reception == info.data_link.reception)
            {
                if let Some(rx) = inner.receivers.release(stale) {
                    warn!(
                        source = rx.info.transport.source,
                        received = rx.buffer.len(),
                        expected = rx.expected_size,
                        "first frame during reassembly, restarting"
                    );
                }
            }
            if !inner.receivers.is_full() {
                inner.receivers.allocate(RxMessage::new(
                    info,
                    message_size,
                    frame_count,
                    consecutive_frame_data_size,
                    data,
                    &self.params,
                    now_us,
                ));
                FirstFrameAnswer::ClearToSend(info)
            } else if inner.pending_rx.is_some() {
                FirstFrameAnswer::Overflow(info)
            } else if self.params.flow_control_wait_count == 0 {
                FirstFrameAnswer::RejectSilently(info)
            } else {
                let mut pending = PendingFirstFrame::new(
                    info,
                    message_size,
                    frame_count,
                    consecutive_frame_data_size,
                    data,
                    &self.params,
                    now_us,
                );
                pending.waits_left -= 1;
                inner.pending_rx = Some(pending);
                FirstFrameAnswer::Wait(info)
            }
        };
        if matches!(answer, FirstFrameAnswer::Wait(_)) {
            self.tick.tick_needed();
        }
        trace!(
            size = message_size,
            frames = frame_count,
            segment = consecutive_frame_data_size,
            "first frame received"
        );
        self.answer_first_frame(answer, driver);
    }

    /// Send the flow-control frame a first frame decision calls for.
    fn answer_first_frame(&self, answer: FirstFrameAnswer, driver: &mut dyn CanDriver) {
        let (info, status) = match answer {
            FirstFrameAnswer::ClearToSend(info) => (info, FlowStatus::ContinueToSend),
            FirstFrameAnswer::Wait(info) => (info, FlowStatus::Wait),
            FirstFrameAnswer::Overflow(info) => {
                warn!(
                    source = info.transport.source,
                    target = info.transport.target,
                    result = ?ProcessingResult::UploadDownloadNotAccepted,
                    "transfer rejected"
                );
                (info, FlowStatus::Overflow)
            },
            FirstFrameAnswer::RejectSilently(info) => {
                warn!(
                    source = info.transport.source,
                    target = info.transport.target,
                    result = ?ProcessingResult::GeneralReject,
                    "transfer abandoned"
                );
                return;
            },
        };
        let Some(codec) = self.filter.codec(info.codec_index) else { return };
        let sent = {
            let mut inner = self.lock();
            inner.transceiver.send_flow_control(
                driver,
                codec,
                info.data_link.transmission,
                status,
                self.params.block_size,
                self.params.advertised_min_separation_time(),
            )
        };
        if !sent {
            warn!(?status, "flow control could not be sent");
        }
    }

    /// Feed a decoded consecutive frame into its reassembly.
    fn consecutive_frame(
        &self,
        reception: DataLinkAddress,
        sequence_number: u8,
        data: &[u8],
        now_us: u32,
        driver: &mut dyn CanDriver,
        upper: &mut dyn UpperLayer,
    ) {
        let mut completed: Option<(ConnectionInfo, Vec<u8>)> = None;
        let mut block_full: Option<ConnectionInfo> = None;
        {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let Some(handle) =
                inner.receivers.find(|rx| rx.info.data_link.reception == reception)
            else {
                trace!(reception, sequence_number, "unexpected consecutive frame dropped");
                return;
            };
            let Some(rx) = inner.receivers.get_mut(handle) else {
                return;
            };
            let info = rx.info;
            match rx.accept_consecutive(sequence_number, data, &self.params, now_us) {
                CfVerdict::SequenceMismatch { expected, received } => {
                    warn!(
                        expected,
                        received,
                        result = ?ProcessingResult::WrongBlockSequenceCounter,
                        "reassembly aborted"
                    );
                    inner.receivers.release(handle);
                },
                CfVerdict::Complete => {
                    if let Some(rx) = inner.receivers.release(handle) {
                        completed = Some((info, rx.buffer));
                    }
                },
                CfVerdict::BlockComplete => block_full = Some(info),
                CfVerdict::Continue => {},
            }
        }
        if let Some(info) = block_full {
            self.answer_first_frame(FirstFrameAnswer::ClearToSend(info), driver);
        }
        if let Some((info, data)) = completed {
            debug!(
                source = info.transport.source,
                target = info.transport.target,
                size = data.len(),
                "incoming message complete"
            );
            upper.message_received(info.transport.source, info.transport.target, &data);
        }
    }

    /// Route a decoded flow-control frame to its transmitter.
    fn flow_control_frame(
        &self,
        reception: DataLinkAddress,
        flow_status: FlowStatus,
        block_size: u8,
        encoded_min_separation_time: u8,
        now_us: u32,
        driver: &mut dyn CanDriver,
        upper: &mut dyn UpperLayer,
    ) {
        let mut fatal: Option<(JobHandle, ProcessingResult)> = None;
        let mut follow_up: Option<JobHandle> = None;
        {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let Some(handle) =
                inner.transmitters.find(|tx| tx.info.data_link.reception == reception)
            else {
                trace!(reception, "flow control without transmission dropped");
                return;
            };
            let Some(tx) = inner.transmitters.get_mut(handle) else {
                return;
            };
            match tx.flow_control(
                flow_status,
                block_size,
                encoded_min_separation_time,
                &self.params,
                now_us,
            ) {
                FcVerdict::Ignored => {
                    trace!(handle = %handle, ?flow_status, "flow control ignored");
                },
                FcVerdict::SendNow => follow_up = Some(handle),
                FcVerdict::WaitAgain => {
                    debug!(handle = %handle, waits = tx.wait_count, "receiver asked to wait");
                },
                FcVerdict::WaitLimitExceeded => {
                    fatal = Some((handle, ProcessingResult::GeneralReject));
                },
                FcVerdict::Overflow => {
                    fatal = Some((handle, ProcessingResult::UploadDownloadNotAccepted));
                },
            }
            if let Some((handle, _)) = fatal {
                inner.transceiver.cancel_send_data_frames(handle);
                inner.transmitters.release(handle);
            }
        }
        if let Some((handle, result)) = fatal {
            warn!(handle = %handle, ?result, "outgoing message aborted by flow control");
            upper.message_processed(handle, result);
        }
        if let Some(handle) = follow_up {
            self.service_transmitter(handle, now_us, driver, upper);
        }
    }

    /// Try to push the next frame of one transmitter.
    fn service_transmitter(
        &self,
        handle: JobHandle,
        now_us: u32,
        driver: &mut dyn CanDriver,
        upper: &mut dyn UpperLayer,
    ) {
        let outcome = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let outcome = self.attempt_frame(inner, handle, now_us, driver);
            if let AttemptOutcome::Fatal(_) = outcome {
                inner.transceiver.cancel_send_data_frames(handle);
                inner.transmitters.release(handle);
            }
            outcome
        };
        match outcome {
            AttemptOutcome::Queued | AttemptOutcome::NotDue | AttemptOutcome::Gone => {},
            AttemptOutcome::Busy => self.tick.tick_needed(),
            AttemptOutcome::Fatal(result) => {
                warn!(handle = %handle, ?result, "transmit attempt failed");
                upper.message_processed(handle, result);
            },
        }
    }

    fn attempt_frame(
        &self,
        inner: &mut Inner,
        handle: JobHandle,
        now_us: u32,
        driver: &mut dyn CanDriver,
    ) -> AttemptOutcome {
        let Some(tx) = inner.transmitters.get_mut(handle) else {
            return AttemptOutcome::Gone;
        };
        if !tx.wants_frame(now_us) {
            return AttemptOutcome::NotDue;
        }
        let Some(codec) = self.filter.codec(tx.info.codec_index) else {
            return AttemptOutcome::Gone;
        };
        let kind = tx.next_frame_kind();
        let result = inner.transceiver.start_send_data_frames(
            driver,
            codec,
            handle,
            tx.info.data_link.transmission,
            tx.next_index,
            tx.frame_count.saturating_sub(1),
            tx.consecutive_frame_data_size,
            tx.remaining(),
        );
        match result {
            SendFramesResult::QueuedFull => {
                tx.frame_queued(kind, &self.params, now_us);
                trace!(handle = %handle, index = tx.next_index.wrapping_sub(1), "frame queued");
                AttemptOutcome::Queued
            },
            SendFramesResult::Full => AttemptOutcome::Busy,
            SendFramesResult::Invalid => {
                AttemptOutcome::Fatal(ProcessingResult::GeneralProgrammingFailure)
            },
            SendFramesResult::Failed => AttemptOutcome::Fatal(ProcessingResult::TxFailed),
        }
    }
}

/// Routes decoded frames into the container.
struct FrameRouter<'a, 'f> {
    layer: &'a TransportLayer<'f>,
    now_us: u32,
    driver: &'a mut dyn CanDriver,
    upper: &'a mut dyn UpperLayer,
}

impl FrameListener for FrameRouter<'_, '_> {
    fn first_data_frame_received(
        &mut self,
        connection: &Connection<'_>,
        message_size: MessageSize,
        frame_count: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        data: &[u8],
    ) {
        if frame_count == 1 {
            let pair = connection.transport();
            trace!(
                source = pair.source,
                target = pair.target,
                size = message_size,
                "single frame message"
            );
            self.upper.message_received(pair.source, pair.target, data);
            return;
        }
        self.layer.open_reassembly(
            connection.info(),
            message_size,
            frame_count,
            consecutive_frame_data_size,
            data,
            self.now_us,
            self.driver,
        );
    }

    fn consecutive_data_frame_received(
        &mut self,
        reception_address: DataLinkAddress,
        sequence_number: u8,
        data: &[u8],
    ) {
        self.layer.consecutive_frame(
            reception_address,
            sequence_number,
            data,
            self.now_us,
            self.driver,
            self.upper,
        );
    }

    fn flow_control_frame_received(
        &mut self,
        reception_address: DataLinkAddress,
        flow_status: FlowStatus,
        block_size: u8,
        encoded_min_separation_time: u8,
    ) {
        self.layer.flow_control_frame(
            reception_address,
            flow_status,
            block_size,
            encoded_min_separation_time,
            self.now_us,
            self.driver,
            self.upper,
        );
    }
}
