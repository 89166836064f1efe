//! Scripted seam implementations and the two-node bus pump.

use std::{cell::Cell, collections::VecDeque};

use bytes::Bytes;
use docan_core::{
    CanDriver, CanFrame, CanWriteError, JobHandle, ProcessingResult, SendError, TickGenerator,
    TransportLayer, UpperLayer,
};
use docan_frame::{
    AddressEntry, AddressingFilter, FrameCodec, FrameCodecConfig, FrameSizeMapper,
    TransportAddress,
};
use tracing::trace;

/// CAN driver that records every written frame and can be scripted to
/// fail upcoming writes.
#[derive(Default)]
pub struct SimCanDriver {
    written: Vec<CanFrame>,
    failures: VecDeque<CanWriteError>,
}

impl SimCanDriver {
    /// Create an empty driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next write to fail with `error`.
    pub fn fail_next(&mut self, error: CanWriteError) {
        self.failures.push_back(error);
    }

    /// Frames written so far.
    #[must_use]
    pub fn written(&self) -> &[CanFrame] {
        &self.written
    }

    /// Drain the written frames.
    pub fn take_written(&mut self) -> Vec<CanFrame> {
        std::mem::take(&mut self.written)
    }
}

impl CanDriver for SimCanDriver {
    fn write(&mut self, frame: &CanFrame) -> Result<(), CanWriteError> {
        if let Some(error) = self.failures.pop_front() {
            trace!(?error, "scripted write failure");
            return Err(error);
        }
        self.written.push(*frame);
        Ok(())
    }
}

/// Tick generator counting how often an early tick was requested.
#[derive(Debug, Default)]
pub struct CountingTick {
    kicks: Cell<u32>,
}

impl CountingTick {
    /// Number of early-tick requests so far.
    #[must_use]
    pub fn kicks(&self) -> u32 {
        self.kicks.get()
    }
}

impl TickGenerator for CountingTick {
    fn tick_needed(&self) {
        self.kicks.set(self.kicks.get() + 1);
    }
}

/// Upper layer recording every delivery and outcome.
#[derive(Debug, Default)]
pub struct RecordingUpperLayer {
    /// Completed incoming messages as `(source, target, data)`.
    pub received: Vec<(TransportAddress, TransportAddress, Vec<u8>)>,
    /// Outcomes of accepted outgoing messages.
    pub processed: Vec<(JobHandle, ProcessingResult)>,
}

impl UpperLayer for RecordingUpperLayer {
    fn message_received(
        &mut self,
        source: TransportAddress,
        target: TransportAddress,
        data: &[u8],
    ) {
        self.received.push((source, target, data.to_vec()));
    }

    fn message_processed(&mut self, handle: JobHandle, result: ProcessingResult) {
        self.processed.push((handle, result));
    }
}

/// Virtual microsecond clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimClock {
    now_us: u32,
}

impl SimClock {
    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> u32 {
        self.now_us
    }

    /// Advance the clock.
    pub fn advance(&mut self, delta_us: u32) {
        self.now_us = self.now_us.wrapping_add(delta_us);
    }
}

/// Driver, upper layer and clock of one simulated node.
#[derive(Default)]
pub struct SimNode<U: UpperLayer = RecordingUpperLayer> {
    /// Scripted CAN driver of the node.
    pub driver: SimCanDriver,
    /// Upper layer of the node.
    pub upper: U,
    /// Virtual clock of the node.
    pub clock: SimClock,
}

impl SimNode<RecordingUpperLayer> {
    /// Create a recording node at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U: UpperLayer> SimNode<U> {
    /// Create a node with a custom upper layer.
    #[must_use]
    pub fn with_upper(upper: U) -> Self {
        Self { driver: SimCanDriver::new(), upper, clock: SimClock::default() }
    }

    /// Hand an outgoing message to the layer.
    pub fn send(
        &mut self,
        layer: &TransportLayer<'_>,
        source: TransportAddress,
        target: TransportAddress,
        payload: &[u8],
    ) -> Result<JobHandle, SendError> {
        layer.send(
            self.clock.now(),
            source,
            target,
            Bytes::copy_from_slice(payload),
            &mut self.driver,
            &mut self.upper,
        )
    }

    /// Deliver one received CAN frame to the layer.
    pub fn deliver(&mut self, layer: &TransportLayer<'_>, frame: &CanFrame) {
        layer.can_frame_received(
            self.clock.now(),
            frame.id(),
            frame.payload(),
            &mut self.driver,
            &mut self.upper,
        );
    }

    /// Deliver the driver's transmit confirmation.
    pub fn confirm_transmit(&mut self, layer: &TransportLayer<'_>) {
        layer.can_frame_sent(self.clock.now(), &mut self.driver, &mut self.upper);
    }

    /// Advance the clock and run the cyclic task.
    pub fn tick_after(&mut self, layer: &TransportLayer<'_>, delta_us: u32) {
        self.clock.advance(delta_us);
        layer.cyclic_task(self.clock.now(), &mut self.driver, &mut self.upper);
    }
}

/// Shuttle frames between two nodes until the bus is idle.
///
/// Each drained frame is first confirmed to its sender (transmit done)
/// and then delivered to the peer, like a zero-latency error-free bus.
/// Returns the number of frames moved.
pub fn pump<A: UpperLayer, B: UpperLayer>(
    a_layer: &TransportLayer<'_>,
    a_node: &mut SimNode<A>,
    b_layer: &TransportLayer<'_>,
    b_node: &mut SimNode<B>,
) -> usize {
    let mut moved = 0;
    loop {
        let from_a = a_node.driver.take_written();
        let from_b = b_node.driver.take_written();
        if from_a.is_empty() && from_b.is_empty() {
            return moved;
        }
        for frame in from_a {
            moved += 1;
            a_node.confirm_transmit(a_layer);
            b_node.deliver(b_layer, &frame);
        }
        for frame in from_b {
            moved += 1;
            b_node.confirm_transmit(b_layer);
            a_node.deliver(a_layer, &frame);
        }
    }
}

fn classic_codec() -> FrameCodec {
    FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity)
}

fn fd_codec() -> FrameCodec {
    FrameCodec::new(FrameCodecConfig::optimized_fd(), FrameSizeMapper::CanFd)
}

/// Addressing filter of the tester node (0x11): transmits on 0x414,
/// receives on 0x415. Codec 0 is classic CAN, codec 1 CAN-FD.
#[must_use]
pub fn tester_filter() -> AddressingFilter {
    filter_for(0x415, 0x414, 0x10, 0x11)
}

/// Addressing filter of the ECU node (0x10): transmits on 0x415,
/// receives on 0x414. Codec 0 is classic CAN, codec 1 CAN-FD.
#[must_use]
pub fn ecu_filter() -> AddressingFilter {
    filter_for(0x414, 0x415, 0x11, 0x10)
}

fn filter_for(
    reception: u32,
    transmission: u32,
    remote: TransportAddress,
    local: TransportAddress,
) -> AddressingFilter {
    build_filter(reception, transmission, remote, local, 0)
}

/// Filter variant using the CAN-FD codec for both directions.
#[must_use]
pub fn fd_filter(
    reception: u32,
    transmission: u32,
    remote: TransportAddress,
    local: TransportAddress,
) -> AddressingFilter {
    build_filter(reception, transmission, remote, local, 1)
}

// single entry referencing codecs 0 and 1; cannot fail validation
#[allow(clippy::unwrap_used)]
fn build_filter(
    reception: u32,
    transmission: u32,
    remote: TransportAddress,
    local: TransportAddress,
    codec: u16,
) -> AddressingFilter {
    AddressingFilter::new(
        vec![AddressEntry {
            reception_address: reception,
            transmission_address: transmission,
            transport_source: remote,
            transport_target: local,
            reception_codec: codec,
            transmission_codec: codec,
        }],
        vec![classic_codec(), fd_codec()],
    )
    .unwrap()
}
