//! Pumps arbitrary frame sequences through a live transport layer.
//!
//! The container must survive any interleaving of received frames,
//! transmit confirmations, ticks and sends without panicking, and its
//! pools must stay within their configured bounds.

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use docan_core::{
    CanDriver, CanFrame, CanWriteError, JobHandle, Parameters, ProcessingResult, TickGenerator,
    TransportLayer, TransportLayerConfig, UpperLayer,
};
use docan_frame::{
    AddressEntry, AddressingFilter, AddressingScheme, FrameCodec, FrameCodecConfig,
    FrameSizeMapper, TransportAddress,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Event {
    Frame { other_link: bool, payload: Vec<u8> },
    TransmitDone,
    Tick { advance_us: u16 },
    Send { other_link: bool, size: u8 },
    QueueFullNext,
}

struct FuzzDriver {
    fail_next: bool,
}

impl CanDriver for FuzzDriver {
    fn write(&mut self, _frame: &CanFrame) -> Result<(), CanWriteError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(CanWriteError::QueueFull);
        }
        Ok(())
    }
}

#[derive(Default)]
struct CountingUpper {
    received: usize,
    processed: usize,
}

impl UpperLayer for CountingUpper {
    fn message_received(&mut self, _: TransportAddress, _: TransportAddress, _: &[u8]) {
        self.received += 1;
    }

    fn message_processed(&mut self, _: JobHandle, _: ProcessingResult) {
        self.processed += 1;
    }
}

struct SilentTick;

impl TickGenerator for SilentTick {
    fn tick_needed(&self) {}
}

fuzz_target!(|events: Vec<Event>| {
    let codec = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
    let filter = AddressingFilter::new(
        vec![
            AddressEntry {
                reception_address: 0x415,
                transmission_address: 0x414,
                transport_source: 0x11,
                transport_target: 0x10,
                reception_codec: 0,
                transmission_codec: 0,
            },
            AddressEntry {
                reception_address: 0x425,
                transmission_address: 0x424,
                transport_source: 0x21,
                transport_target: 0x10,
                reception_codec: 0,
                transmission_codec: 0,
            },
        ],
        vec![codec],
    )
    .expect("static table is valid");
    let tick = SilentTick;
    let config =
        TransportLayerConfig { receiver_pool_size: 2, transmitter_pool_size: 2, max_rx_message_size: 512 };
    let layer =
        TransportLayer::new(&filter, AddressingScheme::Normal, &tick, config, Parameters::default());
    let mut driver = FuzzDriver { fail_next: false };
    let mut upper = CountingUpper::default();

    let mut now: u32 = 0;
    for event in events {
        match event {
            Event::Frame { other_link, payload } => {
                let id = if other_link { 0x425 } else { 0x415 };
                layer.can_frame_received(now, id, &payload, &mut driver, &mut upper);
            },
            Event::TransmitDone => layer.can_frame_sent(now, &mut driver, &mut upper),
            Event::Tick { advance_us } => {
                now = now.wrapping_add(u32::from(advance_us));
                layer.cyclic_task(now, &mut driver, &mut upper);
            },
            Event::Send { other_link, size } => {
                let target = if other_link { 0x21 } else { 0x11 };
                let payload = Bytes::from(vec![0xA5u8; usize::from(size).max(1)]);
                let _ = layer.send(now, 0x10, target, payload, &mut driver, &mut upper);
            },
            Event::QueueFullNext => driver.fail_next = true,
        }
        let stats = layer.stats();
        assert!(stats.receivers <= 2);
        assert!(stats.transmitters <= 2);
    }
});
