//! Error types for the wire layer.
//!
//! Codec failures are per-frame and recoverable by dropping the frame;
//! configuration failures are construction-time and indicate a sizing
//! table that can never carry a legal frame.

use thiserror::Error;

/// Errors produced while encoding or decoding a single frame payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The payload length is outside the configured frame size bounds,
    /// or an encoded frame cannot be padded to a legal frame size.
    #[error("frame size is not valid")]
    InvalidFrameSize,

    /// The message size carried by the frame is out of range (zero,
    /// escape sequence below the 4096-byte threshold, single-frame
    /// sized payload announced as segmented, or frame-count overflow).
    #[error("message size is not valid")]
    InvalidMessageSize,

    /// The frame index passed to the encoder cannot produce a frame
    /// (no data left, or a consecutive frame without a data size).
    #[error("frame index is not valid")]
    InvalidFrameIndex,

    /// The frame type nibble is not one of the four known frame types,
    /// or a flow-control status nibble is reserved.
    #[error("frame type is not known")]
    InvalidFrameType,
}

/// Errors raised when assembling codec configurations or address tables.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A frame size range has `min > max`.
    #[error("invalid {kind} frame size range: min {min} > max {max}")]
    InvalidSizeRange {
        /// Frame kind the range belongs to.
        kind: &'static str,
        /// Configured minimum frame size.
        min: u8,
        /// Configured maximum frame size.
        max: u8,
    },

    /// A maximum frame size cannot hold the protocol header bytes plus
    /// the addressing offset.
    #[error("{kind} frame max size {max} below minimum {required} for offset {offset}")]
    FrameSizeBelowHeader {
        /// Frame kind the bound belongs to.
        kind: &'static str,
        /// Configured maximum frame size.
        max: u8,
        /// Smallest legal maximum for the configured offset.
        required: u8,
        /// Configured addressing offset.
        offset: u8,
    },

    /// An address table entry references a codec index that is not in
    /// the codec list.
    #[error("address entry {entry} references codec {index} of {count}")]
    CodecIndexOutOfRange {
        /// Index of the offending table entry.
        entry: usize,
        /// Referenced codec index.
        index: u16,
        /// Number of codecs in the list.
        count: usize,
    },

    /// Two address table entries share the same reception address.
    #[error("duplicate reception address {address:#x} in address table")]
    DuplicateReceptionAddress {
        /// The duplicated data-link reception address.
        address: u32,
    },
}
