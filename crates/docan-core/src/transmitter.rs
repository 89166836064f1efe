//! Transmit-side state of one in-flight message.
//!
//! ```text
//! Queued ──frame queued──▶ WaitTxDone
//! WaitTxDone ──confirmed (single)──▶ done
//! WaitTxDone ──confirmed (first)──▶ WaitFlowControl
//! WaitTxDone ──confirmed (consecutive, block open)──▶ SendConsecutive
//! WaitTxDone ──confirmed (consecutive, block full)──▶ WaitFlowControl
//! WaitTxDone ──confirmed (all data out)──▶ done
//! WaitFlowControl ──CTS──▶ SendConsecutive
//! WaitFlowControl ──Wait──▶ WaitFlowControl (bounded)
//! SendConsecutive ──STmin gate──▶ Queued frame ──▶ WaitTxDone
//! ```
//!
//! A full transmit queue leaves the state untouched; the container
//! retries from the tick.

use bytes::Bytes;
use docan_frame::{ConnectionInfo, FlowStatus, FrameIndex, FrameSize};

use crate::{params::Parameters, timer::Deadline};

/// Kind of the frame currently awaiting its transmit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// Single frame carrying the whole message.
    Single,
    /// First frame of a segmented message.
    First,
    /// Consecutive frame.
    Consecutive,
}

/// Lifecycle state of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxState {
    /// Next frame not yet accepted by the transceiver.
    Queued,
    /// A frame is queued and awaits its transmit confirmation.
    WaitTxDone,
    /// Waiting for the receiver's flow control.
    WaitFlowControl,
    /// Between consecutive frames, gated by the separation time.
    SendConsecutive,
}

/// Progress made by a transmit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxProgress {
    /// All message data is on the wire.
    Done,
    /// A flow control is now expected.
    AwaitFlowControl,
    /// The next consecutive frame may start after the separation time.
    NextConsecutive,
}

/// Reaction to a received flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FcVerdict {
    /// Not waiting for flow control; the frame is dropped.
    Ignored,
    /// Clear to send; the next consecutive frame may go out now.
    SendNow,
    /// The receiver asked to wait; the timer was restarted.
    WaitAgain,
    /// Too many consecutive waits; abort the message.
    WaitLimitExceeded,
    /// The receiver rejected the transfer.
    Overflow,
}

/// Segmentation state of one outgoing message.
#[derive(Debug)]
pub(crate) struct TxMessage {
    pub(crate) info: ConnectionInfo,
    pub(crate) payload: Bytes,
    pub(crate) offset: usize,
    pub(crate) frame_count: FrameIndex,
    pub(crate) next_index: FrameIndex,
    pub(crate) consecutive_frame_data_size: FrameSize,
    pub(crate) block_size: u8,
    pub(crate) block_remaining: u8,
    pub(crate) st_min_us: u32,
    pub(crate) wait_count: u8,
    pub(crate) state: TxState,
    pub(crate) in_flight: Option<FrameKind>,
    pub(crate) deadline: Deadline,
    pub(crate) next_cf_at: Deadline,
}

impl TxMessage {
    /// Accept a message for transmission.
    pub(crate) fn new(
        info: ConnectionInfo,
        payload: Bytes,
        frame_count: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        now_us: u32,
    ) -> Self {
        Self {
            info,
            payload,
            offset: 0,
            frame_count,
            next_index: 0,
            consecutive_frame_data_size,
            block_size: 0,
            block_remaining: 0,
            st_min_us: 0,
            wait_count: 0,
            state: TxState::Queued,
            in_flight: None,
            deadline: Deadline::after(now_us, 0),
            next_cf_at: Deadline::after(now_us, 0),
        }
    }

    /// Message bytes not yet handed to the transceiver.
    pub(crate) fn remaining(&self) -> &[u8] {
        &self.payload[self.offset..]
    }

    /// Kind of the frame the next transceiver call will produce.
    pub(crate) fn next_frame_kind(&self) -> FrameKind {
        if self.next_index == 0 {
            if self.frame_count == 1 { FrameKind::Single } else { FrameKind::First }
        } else {
            FrameKind::Consecutive
        }
    }

    /// True while the state machine wants the transceiver at `now_us`.
    pub(crate) fn wants_frame(&self, now_us: u32) -> bool {
        match self.state {
            TxState::Queued => true,
            TxState::SendConsecutive => self.next_cf_at.is_expired(now_us),
            TxState::WaitTxDone | TxState::WaitFlowControl => false,
        }
    }

    /// Commit a frame accepted by the transceiver.
    pub(crate) fn frame_queued(&mut self, kind: FrameKind, params: &Parameters, now_us: u32) {
        self.in_flight = Some(kind);
        self.next_index = self.next_index.wrapping_add(1);
        self.state = TxState::WaitTxDone;
        self.deadline = Deadline::after(now_us, params.tx_callback_timeout_us);
    }

    /// Apply a transmit confirmation carrying `consumed` message bytes.
    ///
    /// Returns `None` for a confirmation that matches no queued frame.
    pub(crate) fn frame_confirmed(
        &mut self,
        consumed: FrameSize,
        params: &Parameters,
        now_us: u32,
    ) -> Option<TxProgress> {
        let kind = self.in_flight.take()?;
        self.offset += usize::from(consumed);
        match kind {
            FrameKind::Single => Some(TxProgress::Done),
            FrameKind::First => {
                self.state = TxState::WaitFlowControl;
                self.deadline = Deadline::after(now_us, params.flow_control_timeout_us);
                Some(TxProgress::AwaitFlowControl)
            },
            FrameKind::Consecutive => {
                if self.offset >= self.payload.len() {
                    return Some(TxProgress::Done);
                }
                if self.block_size != 0 {
                    self.block_remaining = self.block_remaining.saturating_sub(1);
                    if self.block_remaining == 0 {
                        self.state = TxState::WaitFlowControl;
                        self.deadline = Deadline::after(now_us, params.flow_control_timeout_us);
                        return Some(TxProgress::AwaitFlowControl);
                    }
                }
                self.state = TxState::SendConsecutive;
                self.next_cf_at = Deadline::after(now_us, self.st_min_us);
                Some(TxProgress::NextConsecutive)
            },
        }
    }

    /// Apply a received flow control.
    pub(crate) fn flow_control(
        &mut self,
        flow_status: FlowStatus,
        block_size: u8,
        encoded_min_separation_time: u8,
        params: &Parameters,
        now_us: u32,
    ) -> FcVerdict {
        if self.state != TxState::WaitFlowControl {
            return FcVerdict::Ignored;
        }
        match flow_status {
            FlowStatus::ContinueToSend => {
                self.block_size = block_size;
                self.block_remaining = block_size;
                self.st_min_us =
                    params.effective_min_separation_time_us(encoded_min_separation_time);
                self.wait_count = 0;
                self.state = TxState::SendConsecutive;
                self.next_cf_at = Deadline::after(now_us, 0);
                FcVerdict::SendNow
            },
            FlowStatus::Wait => {
                self.wait_count = self.wait_count.saturating_add(1);
                if self.wait_count > params.flow_control_wait_count {
                    return FcVerdict::WaitLimitExceeded;
                }
                self.deadline = Deadline::after(now_us, params.flow_control_timeout_us);
                FcVerdict::WaitAgain
            },
            FlowStatus::Overflow => FcVerdict::Overflow,
        }
    }

    /// True if a state deadline is armed and expired.
    pub(crate) fn deadline_expired(&self, now_us: u32) -> bool {
        matches!(self.state, TxState::WaitTxDone | TxState::WaitFlowControl)
            && self.deadline.is_expired(now_us)
    }
}
