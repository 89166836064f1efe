//! Seams towards the CAN controller and the scheduler.

use docan_frame::MAX_FRAME_SIZE;

use crate::error::CanWriteError;

/// One CAN frame as exchanged with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: u32,
    length: u8,
    data: [u8; MAX_FRAME_SIZE],
}

impl CanFrame {
    /// Build a frame from an identifier and payload.
    ///
    /// Payloads longer than [`MAX_FRAME_SIZE`] are truncated; the codec
    /// never produces one.
    #[must_use]
    pub fn new(id: u32, payload: &[u8]) -> Self {
        let mut data = [0u8; MAX_FRAME_SIZE];
        let length = payload.len().min(MAX_FRAME_SIZE);
        data[..length].copy_from_slice(&payload[..length]);
        Self { id, length: length as u8, data }
    }

    /// CAN identifier of the frame.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Payload bytes of the frame.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.length)]
    }
}

/// Non-blocking enqueue interface of one CAN controller.
///
/// `write` must only push the frame into a transmit mailbox and return;
/// it is called from the container's critical section. Transmit
/// completion is reported back through
/// [`TransportLayer::can_frame_sent`](crate::TransportLayer::can_frame_sent).
pub trait CanDriver {
    /// Enqueue one frame for transmission.
    fn write(&mut self, frame: &CanFrame) -> Result<(), CanWriteError>;
}

/// Hook for requesting an early run of the cyclic task.
///
/// Invoked when a transmit attempt hit a full hardware queue and the
/// retry should not wait for the regular tick period.
pub trait TickGenerator {
    /// Ask the scheduler to run the cyclic task soon.
    fn tick_needed(&self);
}

/// Tick generator that relies on the regular tick period alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTickGenerator;

impl TickGenerator for NoTickGenerator {
    fn tick_needed(&self) {}
}
