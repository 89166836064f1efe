//! Receive-side state of one in-flight message.
//!
//! A live [`RxMessage`] is always waiting for consecutive frames; the
//! allocate/overflow/wait choreography around first frames is handled
//! by the session container with at most one parked
//! [`PendingFirstFrame`].

use docan_frame::{ConnectionInfo, FrameIndex, FrameSize, MAX_FRAME_SIZE, MessageSize};

use crate::{params::Parameters, timer::Deadline};

/// Verdict of feeding one consecutive frame into a reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CfVerdict {
    /// Sequence number mismatch; the transfer must be aborted.
    SequenceMismatch {
        /// Expected sequence number.
        expected: u8,
        /// Received sequence number.
        received: u8,
    },
    /// The message is complete.
    Complete,
    /// The current block is full; another flow control is due.
    BlockComplete,
    /// More consecutive frames are expected.
    Continue,
}

/// Reassembly state of one incoming segmented message.
#[derive(Debug)]
pub(crate) struct RxMessage {
    pub(crate) info: ConnectionInfo,
    pub(crate) expected_size: MessageSize,
    pub(crate) frame_count: FrameIndex,
    pub(crate) consecutive_frame_data_size: FrameSize,
    pub(crate) next_sequence: u8,
    pub(crate) buffer: Vec<u8>,
    pub(crate) block_remaining: u8,
    pub(crate) deadline: Deadline,
}

impl RxMessage {
    /// Open a reassembly from a decoded first frame.
    pub(crate) fn new(
        info: ConnectionInfo,
        message_size: MessageSize,
        frame_count: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        first_frame_data: &[u8],
        params: &Parameters,
        now_us: u32,
    ) -> Self {
        let mut buffer = Vec::with_capacity(message_size as usize);
        let take = first_frame_data.len().min(message_size as usize);
        buffer.extend_from_slice(&first_frame_data[..take]);
        Self {
            info,
            expected_size: message_size,
            frame_count,
            consecutive_frame_data_size,
            next_sequence: 1,
            buffer,
            block_remaining: params.block_size,
            deadline: Deadline::after(now_us, params.rx_timeout_us),
        }
    }

    /// Bytes still missing.
    pub(crate) fn remaining(&self) -> usize {
        self.expected_size as usize - self.buffer.len()
    }

    /// Feed one consecutive frame.
    ///
    /// Data beyond the announced message size is padding and dropped.
    pub(crate) fn accept_consecutive(
        &mut self,
        sequence_number: u8,
        data: &[u8],
        params: &Parameters,
        now_us: u32,
    ) -> CfVerdict {
        if sequence_number != self.next_sequence {
            return CfVerdict::SequenceMismatch {
                expected: self.next_sequence,
                received: sequence_number,
            };
        }
        self.next_sequence = (self.next_sequence + 1) & 0x0F;
        let take = self.remaining().min(data.len());
        self.buffer.extend_from_slice(&data[..take]);
        self.deadline = Deadline::after(now_us, params.rx_timeout_us);
        if self.buffer.len() == self.expected_size as usize {
            return CfVerdict::Complete;
        }
        if params.block_size != 0 {
            self.block_remaining = self.block_remaining.saturating_sub(1);
            if self.block_remaining == 0 {
                self.block_remaining = params.block_size;
                return CfVerdict::BlockComplete;
            }
        }
        CfVerdict::Continue
    }
}

/// First frame parked while the receiver pool is exhausted.
///
/// Retried on each tick within the allocate budget; every retry that
/// still finds no slot answers the sender with FC=Wait until the wait
/// budget runs out.
#[derive(Debug)]
pub(crate) struct PendingFirstFrame {
    pub(crate) info: ConnectionInfo,
    pub(crate) message_size: MessageSize,
    pub(crate) frame_count: FrameIndex,
    pub(crate) consecutive_frame_data_size: FrameSize,
    pub(crate) data: [u8; MAX_FRAME_SIZE],
    pub(crate) data_len: u8,
    pub(crate) retries_left: u8,
    pub(crate) waits_left: u8,
    pub(crate) retry_at: Deadline,
}

impl PendingFirstFrame {
    /// Park a first frame for later allocation.
    pub(crate) fn new(
        info: ConnectionInfo,
        message_size: MessageSize,
        frame_count: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        first_frame_data: &[u8],
        params: &Parameters,
        now_us: u32,
    ) -> Self {
        let mut data = [0u8; MAX_FRAME_SIZE];
        let data_len = first_frame_data.len().min(MAX_FRAME_SIZE);
        data[..data_len].copy_from_slice(&first_frame_data[..data_len]);
        Self {
            info,
            message_size,
            frame_count,
            consecutive_frame_data_size,
            data,
            data_len: data_len as u8,
            retries_left: params.allocate_retry_count,
            waits_left: params.flow_control_wait_count,
            retry_at: Self::next_retry(params, now_us),
        }
    }

    /// Deadline of the next allocation retry, spacing the configured
    /// allocate budget evenly over the retry count.
    pub(crate) fn next_retry(params: &Parameters, now_us: u32) -> Deadline {
        let spacing = params.allocate_timeout_us / u32::from(params.allocate_retry_count.max(1));
        Deadline::after(now_us, spacing)
    }

    /// First-frame data bytes.
    pub(crate) fn first_frame_data(&self) -> &[u8] {
        &self.data[..usize::from(self.data_len)]
    }
}
