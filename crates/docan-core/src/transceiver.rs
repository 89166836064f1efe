//! Physical transceiver: one CAN controller bridged to one DoCAN link.
//!
//! A single physical frame may be in flight at any time. A second send
//! attempt while the previous frame has not been confirmed yields
//! [`SendFramesResult::Full`], and the caller rearms itself through the
//! tick generator. Flow-control frames bypass the pending slot and are
//! fire-and-forget.

use docan_frame::{
    AddressingScheme, DataLinkAddress, FlowStatus, FrameCodec, FrameIndex, FrameSize,
    MAX_FRAME_SIZE,
};

use crate::{
    driver::{CanDriver, CanFrame},
    error::CanWriteError,
    job::JobHandle,
};

/// Outcome of a data-frame send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFramesResult {
    /// The frame was queued; the single in-flight slot is now taken.
    QueuedFull,
    /// The slot or the hardware queue is busy; retry later.
    Full,
    /// The codec rejected the data; retrying cannot help.
    Invalid,
    /// The driver rejected the frame with a non-retryable error.
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct PendingSend {
    job: JobHandle,
    data_size: FrameSize,
}

/// Send discipline and addressing glue of one CAN controller.
#[derive(Debug)]
pub struct PhysicalTransceiver {
    addressing: AddressingScheme,
    pending: Option<PendingSend>,
}

impl PhysicalTransceiver {
    /// Create a transceiver for one addressing scheme.
    #[must_use]
    pub fn new(addressing: AddressingScheme) -> Self {
        Self { addressing, pending: None }
    }

    /// Addressing scheme of the link.
    #[must_use]
    pub fn addressing(&self) -> AddressingScheme {
        self.addressing
    }

    /// True while a data frame awaits its transmit confirmation.
    #[must_use]
    pub fn is_send_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Encode and enqueue one data frame of a message.
    ///
    /// Encodes the frame at `first_frame_index` only; `last_frame_index`
    /// is accepted for interface compatibility and ignored, the caller
    /// issues one call per frame.
    #[allow(clippy::too_many_arguments)]
    pub fn start_send_data_frames(
        &mut self,
        driver: &mut dyn CanDriver,
        codec: &FrameCodec,
        job: JobHandle,
        transmission_address: DataLinkAddress,
        first_frame_index: FrameIndex,
        _last_frame_index: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        data: &[u8],
    ) -> SendFramesResult {
        if self.pending.is_some() {
            return SendFramesResult::Full;
        }
        let mut payload = [0u8; MAX_FRAME_SIZE];
        let encoded = match codec.encode_data_frame(
            &mut payload,
            data,
            first_frame_index,
            consecutive_frame_data_size,
        ) {
            Ok(encoded) => encoded,
            Err(_) => return SendFramesResult::Invalid,
        };
        let frame_payload = &mut payload[..usize::from(encoded.frame_size)];
        let can_id = self.addressing.encode_transmission_address(transmission_address, frame_payload);
        match driver.write(&CanFrame::new(can_id, frame_payload)) {
            Ok(()) => {
                self.pending = Some(PendingSend { job, data_size: encoded.consumed });
                SendFramesResult::QueuedFull
            },
            Err(CanWriteError::QueueFull) => SendFramesResult::Full,
            Err(CanWriteError::Failed) => SendFramesResult::Failed,
        }
    }

    /// Clear the pending slot if it belongs to `job`.
    ///
    /// A non-matching or stale cancel is a silent no-op; the frame
    /// itself may still appear on the bus, but no confirmation upcall
    /// will be issued for it.
    pub fn cancel_send_data_frames(&mut self, job: JobHandle) {
        if self.pending.is_some_and(|pending| pending.job == job) {
            self.pending = None;
        }
    }

    /// Encode and enqueue a flow-control frame, bypassing the pending
    /// slot.
    ///
    /// Returns false if the codec or the driver rejected the frame.
    pub fn send_flow_control(
        &mut self,
        driver: &mut dyn CanDriver,
        codec: &FrameCodec,
        transmission_address: DataLinkAddress,
        flow_status: FlowStatus,
        block_size: u8,
        encoded_min_separation_time: u8,
    ) -> bool {
        let mut payload = [0u8; MAX_FRAME_SIZE];
        let Ok(frame_size) = codec.encode_flow_control_frame(
            &mut payload,
            flow_status,
            block_size,
            encoded_min_separation_time,
        ) else {
            return false;
        };
        let frame_payload = &mut payload[..usize::from(frame_size)];
        let can_id = self.addressing.encode_transmission_address(transmission_address, frame_payload);
        driver.write(&CanFrame::new(can_id, frame_payload)).is_ok()
    }

    /// Consume the transmit confirmation of the pending frame.
    ///
    /// Returns the job and the number of message bytes the frame
    /// carried, or `None` if a cancel raced ahead of the confirmation.
    pub fn frame_sent(&mut self) -> Option<(JobHandle, FrameSize)> {
        self.pending.take().map(|pending| (pending.job, pending.data_size))
    }

    /// Resolve the reception address of an incoming frame.
    #[must_use]
    pub fn decode_reception_address(&self, can_id: u32, payload: &[u8]) -> Option<DataLinkAddress> {
        self.addressing.decode_reception_address(can_id, payload)
    }
}

#[cfg(test)]
mod tests {
    use docan_frame::{FlowStatus, FrameCodecConfig, FrameSizeMapper};

    use super::*;

    #[derive(Default)]
    struct ScriptedDriver {
        written: Vec<CanFrame>,
        fail_with: Option<CanWriteError>,
    }

    impl CanDriver for ScriptedDriver {
        fn write(&mut self, frame: &CanFrame) -> Result<(), CanWriteError> {
            if let Some(error) = self.fail_with.take() {
                return Err(error);
            }
            self.written.push(*frame);
            Ok(())
        }
    }

    fn codec() -> FrameCodec {
        FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity)
    }

    #[test]
    fn queued_full_exactly_once_between_confirmations() {
        let mut driver = ScriptedDriver::default();
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Normal);
        let codec = codec();
        let job = JobHandle::new(0, 0);
        let message = [0u8; 20];

        let first = transceiver
            .start_send_data_frames(&mut driver, &codec, job, 0x414, 0, 0, 7, &message);
        assert_eq!(first, SendFramesResult::QueuedFull);
        assert!(transceiver.is_send_pending());

        let second = transceiver
            .start_send_data_frames(&mut driver, &codec, job, 0x414, 1, 1, 7, &message[6..]);
        assert_eq!(second, SendFramesResult::Full);
        assert_eq!(driver.written.len(), 1);

        assert_eq!(transceiver.frame_sent(), Some((job, 6)));
        let third = transceiver
            .start_send_data_frames(&mut driver, &codec, job, 0x414, 1, 1, 7, &message[6..]);
        assert_eq!(third, SendFramesResult::QueuedFull);
    }

    #[test]
    fn hardware_queue_full_leaves_the_slot_free() {
        let mut driver = ScriptedDriver { fail_with: Some(CanWriteError::QueueFull), ..Default::default() };
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Normal);
        let job = JobHandle::new(0, 0);

        let result = transceiver
            .start_send_data_frames(&mut driver, &codec(), job, 0x414, 0, 0, 7, &[1, 2, 3]);
        assert_eq!(result, SendFramesResult::Full);
        assert!(!transceiver.is_send_pending());
        assert_eq!(transceiver.frame_sent(), None);
    }

    #[test]
    fn driver_failure_is_not_retryable() {
        let mut driver = ScriptedDriver { fail_with: Some(CanWriteError::Failed), ..Default::default() };
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Normal);
        let result = transceiver.start_send_data_frames(
            &mut driver,
            &codec(),
            JobHandle::new(0, 0),
            0x414,
            0,
            0,
            7,
            &[1, 2, 3],
        );
        assert_eq!(result, SendFramesResult::Failed);
        assert!(!transceiver.is_send_pending());
    }

    #[test]
    fn codec_rejection_is_invalid() {
        let mut driver = ScriptedDriver::default();
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Normal);
        let result = transceiver.start_send_data_frames(
            &mut driver,
            &codec(),
            JobHandle::new(0, 0),
            0x414,
            0,
            0,
            7,
            &[],
        );
        assert_eq!(result, SendFramesResult::Invalid);
        assert!(driver.written.is_empty());
    }

    #[test]
    fn cancel_suppresses_the_confirmation_upcall() {
        let mut driver = ScriptedDriver::default();
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Normal);
        let codec = codec();
        let job = JobHandle::new(3, 1);
        transceiver.start_send_data_frames(&mut driver, &codec, job, 0x414, 0, 0, 7, &[1, 2]);

        // stale handle: different generation of the same slot
        transceiver.cancel_send_data_frames(JobHandle::new(3, 0));
        assert!(transceiver.is_send_pending());

        transceiver.cancel_send_data_frames(job);
        assert!(!transceiver.is_send_pending());
        assert_eq!(transceiver.frame_sent(), None);

        // double cancel is a no-op
        transceiver.cancel_send_data_frames(job);
    }

    #[test]
    fn flow_control_bypasses_the_pending_slot() {
        let mut driver = ScriptedDriver::default();
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Normal);
        let codec = codec();
        let job = JobHandle::new(0, 0);
        transceiver.start_send_data_frames(&mut driver, &codec, job, 0x414, 0, 0, 7, &[1u8; 20]);

        assert!(transceiver.send_flow_control(
            &mut driver,
            &codec,
            0x414,
            FlowStatus::ContinueToSend,
            4,
            0x14
        ));
        assert_eq!(driver.written.len(), 2);
        assert_eq!(driver.written[1].payload()[0], 0x30);
        assert!(transceiver.is_send_pending());
    }

    #[test]
    fn extended_addressing_writes_the_address_byte() {
        let mut driver = ScriptedDriver::default();
        let mut transceiver = PhysicalTransceiver::new(AddressingScheme::Extended);
        let config = FrameCodecConfig::optimized_classic().with_offset(1).unwrap();
        let codec = FrameCodec::new(config, FrameSizeMapper::Identity);
        let result = transceiver.start_send_data_frames(
            &mut driver,
            &codec,
            JobHandle::new(0, 0),
            (0x414 << 8) | 0xEA,
            0,
            0,
            6,
            &[0x3E, 0x00],
        );
        assert_eq!(result, SendFramesResult::QueuedFull);
        let frame = &driver.written[0];
        assert_eq!(frame.id(), 0x414);
        assert_eq!(frame.payload(), &[0xEA, 0x02, 0x3E, 0x00]);
    }
}
