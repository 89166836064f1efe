//! Protocol timing and flow-control parameters.

/// Largest minimum separation time expressible on the wire: 127 ms.
pub const MAX_MIN_SEPARATION_TIME_US: u32 = 127_000;

/// Tunable parameters of one transport layer instance.
///
/// All timeouts are in microseconds of the injected time base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    /// Budget for parking a first frame while waiting for a free
    /// receiver slot.
    pub allocate_timeout_us: u32,
    /// Longest accepted gap between incoming consecutive frames.
    pub rx_timeout_us: u32,
    /// Longest wait for the driver's transmit confirmation.
    pub tx_callback_timeout_us: u32,
    /// Longest wait for a flow control answering a first frame.
    pub flow_control_timeout_us: u32,
    /// Allocation retries before a parked first frame is abandoned.
    pub allocate_retry_count: u8,
    /// Consecutive FC=Wait frames tolerated (and emitted) per message.
    pub flow_control_wait_count: u8,
    /// Sender-side floor for the minimum separation time, and the gap
    /// advertised by the receiver in its flow controls.
    pub min_separation_time_us: u32,
    /// Consecutive frames per flow control advertised by the receiver;
    /// 0 requests the whole rest of the message.
    pub block_size: u8,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            allocate_timeout_us: 800_000,
            rx_timeout_us: 1_000_000,
            tx_callback_timeout_us: 1_000_000,
            flow_control_timeout_us: 1_000_000,
            allocate_retry_count: 15,
            flow_control_wait_count: 15,
            min_separation_time_us: 20,
            block_size: 0,
        }
    }
}

impl Parameters {
    /// Decode a wire minimum separation time into microseconds.
    ///
    /// Values 0..=127 are milliseconds, 0xF1..=0xF9 are 100..900 µs;
    /// every other value is reserved and clamps to the 127 ms ceiling.
    #[must_use]
    pub fn decode_min_separation_time_us(encoded: u8) -> u32 {
        match encoded {
            0..=0x7F => u32::from(encoded) * 1_000,
            0xF1..=0xF9 => u32::from(encoded - 0xF0) * 100,
            _ => MAX_MIN_SEPARATION_TIME_US,
        }
    }

    /// Encode a microsecond separation time for the wire, rounding up
    /// and saturating at 127 ms.
    #[must_use]
    pub fn encode_min_separation_time(us: u32) -> u8 {
        if us == 0 {
            0
        } else if us <= 900 {
            0xF0 + us.div_ceil(100) as u8
        } else {
            us.div_ceil(1_000).min(127) as u8
        }
    }

    /// Separation time the sender must honour for a received encoding:
    /// the decoded value, floored by the configured minimum.
    #[must_use]
    pub fn effective_min_separation_time_us(&self, encoded: u8) -> u32 {
        Self::decode_min_separation_time_us(encoded).max(self.min_separation_time_us)
    }

    /// Separation time advertised in outgoing flow controls.
    #[must_use]
    pub fn advertised_min_separation_time(&self) -> u8 {
        Self::encode_min_separation_time(self.min_separation_time_us)
    }
}
