//! Per-link frame sizing and padding configuration.

use crate::{
    datalink::FrameSize,
    errors::ConfigError,
};

/// Inclusive frame size bounds for one frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    /// Smallest accepted (and emitted) frame size in bytes.
    pub min: FrameSize,
    /// Largest accepted frame size in bytes.
    pub max: FrameSize,
}

impl SizeRange {
    /// Create a new size range.
    #[must_use]
    pub const fn new(min: FrameSize, max: FrameSize) -> Self {
        Self { min, max }
    }
}

/// Frame sizing and padding configuration of one link.
///
/// `offset` reserves leading payload bytes for the addressing scheme
/// (1 for extended addressing, 0 otherwise); all protocol bytes are
/// shifted behind it. `filler` pads frames grown to a minimum size or
/// to the next legal CAN-FD DLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodecConfig {
    /// Bounds for single frames.
    pub single: SizeRange,
    /// Bounds for first frames.
    pub first: SizeRange,
    /// Bounds for consecutive frames.
    pub consecutive: SizeRange,
    /// Bounds for flow-control frames.
    pub flow_control: SizeRange,
    /// Byte used to pad short frames.
    pub filler: u8,
    /// Leading bytes reserved for the addressing scheme.
    pub offset: u8,
}

impl FrameCodecConfig {
    /// Validate and build a configuration.
    ///
    /// # Errors
    ///
    /// Rejects ranges with `min > max`, and maxima that cannot hold the
    /// protocol header behind the addressing offset: single and
    /// consecutive frames need `offset + 2` bytes, first frames
    /// `offset + 3`.
    pub fn new(
        single: SizeRange,
        first: SizeRange,
        consecutive: SizeRange,
        flow_control: SizeRange,
        filler: u8,
        offset: u8,
    ) -> Result<Self, ConfigError> {
        let ranges = [
            ("single", single),
            ("first", first),
            ("consecutive", consecutive),
            ("flow control", flow_control),
        ];
        for (kind, range) in ranges {
            if range.min > range.max {
                return Err(ConfigError::InvalidSizeRange { kind, min: range.min, max: range.max });
            }
        }
        let bounds = [("single", single.max, 2u8), ("consecutive", consecutive.max, 2u8), ("first", first.max, 3u8)];
        for (kind, max, header) in bounds {
            let required = offset.saturating_add(header);
            if max < required {
                return Err(ConfigError::FrameSizeBelowHeader { kind, max, required, offset });
            }
        }
        Ok(Self { single, first, consecutive, flow_control, filler, offset })
    }

    /// Classic CAN configuration without enforced padding: first frames
    /// are always full, everything else is emitted at its natural size.
    #[must_use]
    pub const fn optimized_classic() -> Self {
        Self {
            single: SizeRange::new(0, 8),
            first: SizeRange::new(8, 8),
            consecutive: SizeRange::new(0, 8),
            flow_control: SizeRange::new(0, 8),
            filler: 0xCC,
            offset: 0,
        }
    }

    /// Classic CAN configuration with every frame padded to 8 bytes.
    #[must_use]
    pub const fn padded_classic() -> Self {
        Self {
            single: SizeRange::new(8, 8),
            first: SizeRange::new(8, 8),
            consecutive: SizeRange::new(8, 8),
            flow_control: SizeRange::new(8, 8),
            filler: 0xCC,
            offset: 0,
        }
    }

    /// CAN-FD configuration without enforced padding; sizes are still
    /// rounded up to a legal DLC by the size mapper.
    #[must_use]
    pub const fn optimized_fd() -> Self {
        Self {
            single: SizeRange::new(0, 64),
            first: SizeRange::new(64, 64),
            consecutive: SizeRange::new(0, 64),
            flow_control: SizeRange::new(0, 64),
            filler: 0xCC,
            offset: 0,
        }
    }

    /// CAN-FD configuration with every frame padded to 64 bytes.
    #[must_use]
    pub const fn padded_fd() -> Self {
        Self {
            single: SizeRange::new(64, 64),
            first: SizeRange::new(64, 64),
            consecutive: SizeRange::new(64, 64),
            flow_control: SizeRange::new(64, 64),
            filler: 0xCC,
            offset: 0,
        }
    }

    /// The same configuration with an addressing offset, re-validated.
    ///
    /// # Errors
    ///
    /// Fails if a maximum frame size cannot hold the protocol header
    /// behind the new offset.
    pub fn with_offset(self, offset: u8) -> Result<Self, ConfigError> {
        Self::new(self.single, self.first, self.consecutive, self.flow_control, self.filler, offset)
    }

    /// The same configuration with a different filler byte.
    #[must_use]
    pub const fn with_filler(mut self, filler: u8) -> Self {
        self.filler = filler;
        self
    }
}
