//! Frame codec: translation between byte payloads and typed frames.
//!
//! One codec instance describes one link flavour (classic CAN or
//! CAN-FD, with or without enforced padding, with or without an
//! addressing offset). Decoding borrows the frame data from the
//! payload; encoding writes into a caller-provided buffer, pads it to
//! the configured minimum and rounds the result to a legal frame size
//! through the [`FrameSizeMapper`].

use crate::{
    config::FrameCodecConfig,
    datalink::{FrameIndex, FrameSize, MessageSize},
    errors::CodecError,
    size_mapper::FrameSizeMapper,
    types::{FlowStatus, FrameType},
};

/// Payload size at and below which the short single-frame encoding is
/// used; above it the long encoding with a dedicated length octet.
pub const EXTENDED_SF_EDGE: FrameSize = 8;

/// Largest message size expressible in the 12-bit first-frame length
/// field; larger messages use the 32-bit escape sequence.
pub const ESCAPE_SEQUENCE_THRESHOLD: MessageSize = 4095;

/// Decoded single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleFrame<'a> {
    /// Complete message size in bytes.
    pub message_size: MessageSize,
    /// Message data carried by the frame.
    pub data: &'a [u8],
}

/// Decoded first frame of a segmented message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstFrame<'a> {
    /// Announced size of the complete message.
    pub message_size: MessageSize,
    /// Expected total number of frames including this one.
    pub frame_count: FrameIndex,
    /// Data bytes each following consecutive frame may carry.
    pub consecutive_frame_data_size: FrameSize,
    /// Message data carried by the first frame.
    pub data: &'a [u8],
}

/// Decoded consecutive frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsecutiveFrame<'a> {
    /// Sequence number (low nibble, 0..15).
    pub sequence_number: u8,
    /// Data bytes including any trailing padding.
    pub data: &'a [u8],
}

/// Decoded flow-control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControlFrame {
    /// Receiver's answer to the first frame.
    pub flow_status: FlowStatus,
    /// Consecutive frames allowed before the next flow control; 0 means
    /// the whole rest of the message.
    pub block_size: u8,
    /// Encoded minimum separation time between consecutive frames.
    pub encoded_min_separation_time: u8,
}

/// Result of encoding one data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Final frame size after padding and size mapping.
    pub frame_size: FrameSize,
    /// Message bytes consumed from the input data.
    pub consumed: FrameSize,
}

/// Encoder/decoder for the frame payloads of one link.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    config: FrameCodecConfig,
    mapper: FrameSizeMapper,
}

impl FrameCodec {
    /// Create a codec from a validated configuration and size mapper.
    #[must_use]
    pub const fn new(config: FrameCodecConfig, mapper: FrameSizeMapper) -> Self {
        Self { config, mapper }
    }

    /// The sizing configuration of this codec.
    #[must_use]
    pub const fn config(&self) -> &FrameCodecConfig {
        &self.config
    }

    /// Extract the frame type from a received payload.
    pub fn decode_frame_type(&self, payload: &[u8]) -> Result<FrameType, CodecError> {
        let offset = usize::from(self.config.offset);
        let byte = payload.get(offset).ok_or(CodecError::InvalidFrameSize)?;
        FrameType::from_nibble(byte >> 4).ok_or(CodecError::InvalidFrameType)
    }

    /// Extract message size and data from a single frame.
    ///
    /// Two encodings are recognised: the short form with the length in
    /// the low nibble of the first protocol byte (payloads up to 8
    /// bytes) and the long form with a zero nibble and a dedicated
    /// length octet (payloads above 8 bytes).
    pub fn decode_single_frame<'a>(&self, payload: &'a [u8]) -> Result<SingleFrame<'a>, CodecError> {
        if !self.check_frame_size(payload, 2, self.config.single) {
            return Err(CodecError::InvalidFrameSize);
        }
        let offset = usize::from(self.config.offset);
        let size = usize::from(payload[offset] & 0x0F);
        let extended = payload.len() > usize::from(EXTENDED_SF_EDGE);
        if size == 0 && extended {
            let size = usize::from(payload[offset + 1]);
            let end = offset + 2 + size;
            if size > 0 && end <= usize::from(self.config.single.max) && end <= payload.len() {
                return Ok(SingleFrame {
                    message_size: size as MessageSize,
                    data: &payload[offset + 2..end],
                });
            }
        } else if size > 0 && !extended {
            let end = offset + 1 + size;
            if end <= payload.len() {
                return Ok(SingleFrame {
                    message_size: size as MessageSize,
                    data: &payload[offset + 1..end],
                });
            }
        }
        Err(CodecError::InvalidMessageSize)
    }

    /// Extract message size, expected frame count, consecutive-frame
    /// data size and data from a first frame.
    ///
    /// A 12-bit length of zero switches to the 32-bit big-endian escape
    /// sequence, which must announce strictly more than 4095 bytes. A
    /// first frame announcing a message that would have fit into a
    /// single frame is rejected.
    pub fn decode_first_frame<'a>(&self, payload: &'a [u8]) -> Result<FirstFrame<'a>, CodecError> {
        if !self.check_frame_size(payload, 3, self.config.first) {
            return Err(CodecError::InvalidFrameSize);
        }
        let offset = usize::from(self.config.offset);
        let mut message_size =
            (MessageSize::from(payload[offset] & 0x0F) << 8) | MessageSize::from(payload[offset + 1]);
        let mut data_start = 2usize;
        let consecutive_frame_data_size = (payload.len() - (offset + 1)) as FrameSize;
        if message_size == 0 {
            if !self.check_frame_size(payload, 6, self.config.first) {
                return Err(CodecError::InvalidFrameSize);
            }
            let escaped = u32::from_be_bytes([
                payload[offset + 2],
                payload[offset + 3],
                payload[offset + 4],
                payload[offset + 5],
            ]);
            if escaped <= ESCAPE_SEQUENCE_THRESHOLD {
                return Err(CodecError::InvalidMessageSize);
            }
            message_size = escaped;
            data_start = 6;
        }
        let count = message_size / MessageSize::from(consecutive_frame_data_size);
        if count >= MessageSize::from(FrameIndex::MAX) {
            return Err(CodecError::InvalidMessageSize);
        }
        let frame_count = (count + 1) as FrameIndex;
        if frame_count > 1
            && !self.fits_short_single_frame(message_size)
            && !self.fits_long_single_frame(message_size)
        {
            Ok(FirstFrame {
                message_size,
                frame_count,
                consecutive_frame_data_size,
                data: &payload[offset + data_start..],
            })
        } else {
            Err(CodecError::InvalidMessageSize)
        }
    }

    /// Extract sequence number and data from a consecutive frame.
    ///
    /// The returned data still contains any trailing padding; the
    /// receiver truncates it against the announced message size.
    pub fn decode_consecutive_frame<'a>(
        &self,
        payload: &'a [u8],
    ) -> Result<ConsecutiveFrame<'a>, CodecError> {
        if !self.check_frame_size(payload, 2, self.config.consecutive) {
            return Err(CodecError::InvalidFrameSize);
        }
        let offset = usize::from(self.config.offset);
        Ok(ConsecutiveFrame {
            sequence_number: payload[offset] & 0x0F,
            data: &payload[offset + 1..],
        })
    }

    /// Extract status, block size and encoded minimum separation time
    /// from a flow-control frame.
    pub fn decode_flow_control_frame(&self, payload: &[u8]) -> Result<FlowControlFrame, CodecError> {
        if !self.check_frame_size(payload, 3, self.config.flow_control) {
            return Err(CodecError::InvalidFrameSize);
        }
        let offset = usize::from(self.config.offset);
        let flow_status =
            FlowStatus::from_nibble(payload[offset] & 0x0F).ok_or(CodecError::InvalidFrameType)?;
        Ok(FlowControlFrame {
            flow_status,
            block_size: payload[offset + 1],
            encoded_min_separation_time: payload[offset + 2],
        })
    }

    /// Number of frames and consecutive-frame data size needed to send
    /// a message of the given size.
    ///
    /// Single-frame messages yield `(1, 0)`.
    pub fn encoded_frame_count(
        &self,
        message_size: MessageSize,
    ) -> Result<(FrameIndex, FrameSize), CodecError> {
        if message_size == 0 {
            return Err(CodecError::InvalidMessageSize);
        }
        if self.fits_short_single_frame(message_size) || self.fits_long_single_frame(message_size) {
            return Ok((1, 0));
        }
        let consecutive_frame_data_size = self.config.consecutive.max - (self.config.offset + 1);
        let count = message_size / MessageSize::from(consecutive_frame_data_size);
        if count >= MessageSize::from(FrameIndex::MAX) {
            return Err(CodecError::InvalidMessageSize);
        }
        Ok(((count + 1) as FrameIndex, consecutive_frame_data_size))
    }

    /// Encode the frame at `frame_index` of a message into `payload`.
    ///
    /// `data` is the remaining message data. At index 0 the encoder
    /// picks the short or long single-frame form, or a (possibly
    /// escaped) first frame consuming `consecutive_frame_data_size - 1`
    /// bytes (`- 5` for the escape form). At higher indices it emits a
    /// consecutive frame with `sequence = frame_index mod 16` consuming
    /// `min(consecutive_frame_data_size, remaining)` bytes.
    pub fn encode_data_frame(
        &self,
        payload: &mut [u8],
        data: &[u8],
        frame_index: FrameIndex,
        consecutive_frame_data_size: FrameSize,
    ) -> Result<EncodedFrame, CodecError> {
        if data.is_empty() || data.len() > MessageSize::MAX as usize {
            return Err(CodecError::InvalidFrameIndex);
        }
        let pending = data.len() as MessageSize;
        let offset = usize::from(self.config.offset);

        let mut header = [0u8; 6];
        let (header_len, consumed, min_frame) = if frame_index == 0 {
            if self.fits_short_single_frame(pending) {
                header[0] = FrameType::Single.to_high_nibble() | (pending as u8 & 0x0F);
                (1, pending as usize, self.config.single.min)
            } else if self.fits_long_single_frame(pending) {
                header[0] = FrameType::Single.to_high_nibble();
                header[1] = pending as u8;
                (2, pending as usize, self.config.single.min)
            } else if consecutive_frame_data_size > 0 {
                let (header_len, consumed) = if pending <= ESCAPE_SEQUENCE_THRESHOLD {
                    header[0] = FrameType::First.to_high_nibble() | ((pending >> 8) as u8 & 0x0F);
                    header[1] = (pending & 0xFF) as u8;
                    let consumed = usize::from(consecutive_frame_data_size)
                        .checked_sub(1)
                        .ok_or(CodecError::InvalidFrameIndex)?;
                    (2, consumed)
                } else {
                    header[0] = FrameType::First.to_high_nibble();
                    header[1] = 0;
                    header[2..6].copy_from_slice(&pending.to_be_bytes());
                    let consumed = usize::from(consecutive_frame_data_size)
                        .checked_sub(5)
                        .ok_or(CodecError::InvalidFrameIndex)?;
                    (6, consumed)
                };
                if consumed > data.len() {
                    return Err(CodecError::InvalidFrameIndex);
                }
                (header_len, consumed, self.config.first.min)
            } else {
                return Err(CodecError::InvalidFrameIndex);
            }
        } else if consecutive_frame_data_size > 0 {
            header[0] = FrameType::Consecutive.to_high_nibble() | (frame_index as u8 & 0x0F);
            (1, usize::from(consecutive_frame_data_size).min(data.len()), self.config.consecutive.min)
        } else {
            return Err(CodecError::InvalidFrameIndex);
        };

        let payload_size = offset + header_len + consumed;
        if payload_size > payload.len() {
            return Err(CodecError::InvalidFrameSize);
        }
        payload[offset..offset + header_len].copy_from_slice(&header[..header_len]);
        payload[offset + header_len..payload_size].copy_from_slice(&data[..consumed]);
        let frame_size = self.adjust_frame(payload, payload_size, min_frame)?;
        Ok(EncodedFrame { frame_size, consumed: consumed as FrameSize })
    }

    /// Encode a flow-control frame into `payload`.
    ///
    /// Returns the final frame size after padding and size mapping.
    pub fn encode_flow_control_frame(
        &self,
        payload: &mut [u8],
        flow_status: FlowStatus,
        block_size: u8,
        encoded_min_separation_time: u8,
    ) -> Result<FrameSize, CodecError> {
        let offset = usize::from(self.config.offset);
        if payload.len() < offset + 3 {
            return Err(CodecError::InvalidFrameSize);
        }
        payload[offset] = FrameType::FlowControl.to_high_nibble() | flow_status.to_nibble();
        payload[offset + 1] = block_size;
        payload[offset + 2] = encoded_min_separation_time;
        self.adjust_frame(payload, offset + 3, self.config.flow_control.min)
    }

    /// Grow the frame to `max(payload_size, min_frame)`, round the
    /// result through the size mapper and fill the gap with the filler
    /// byte. Returns the final frame size.
    fn adjust_frame(
        &self,
        payload: &mut [u8],
        payload_size: usize,
        min_frame: FrameSize,
    ) -> Result<FrameSize, CodecError> {
        let requested = FrameSize::try_from(payload_size.max(usize::from(min_frame)))
            .map_err(|_| CodecError::InvalidFrameSize)?;
        let padded = self.mapper.map(requested).ok_or(CodecError::InvalidFrameSize)?;
        let padded_len = usize::from(padded);
        if padded_len > payload_size {
            if padded_len > payload.len() {
                return Err(CodecError::InvalidFrameSize);
            }
            for byte in &mut payload[payload_size..padded_len] {
                *byte = self.config.filler;
            }
        }
        Ok(padded)
    }

    fn check_frame_size(&self, payload: &[u8], min_payload: usize, range: crate::config::SizeRange) -> bool {
        payload.len() >= usize::from(self.config.offset) + min_payload
            && payload.len() >= usize::from(range.min)
            && payload.len() <= usize::from(range.max)
    }

    fn fits_short_single_frame(&self, message_size: MessageSize) -> bool {
        // a link padding single frames beyond 8 bytes always decodes as
        // the long form, so the short form is unusable on it
        if self.config.single.min > EXTENDED_SF_EDGE {
            return false;
        }
        let edge = EXTENDED_SF_EDGE.min(self.config.single.max);
        message_size <= MessageSize::from(edge.saturating_sub(self.config.offset + 1))
    }

    fn fits_long_single_frame(&self, message_size: MessageSize) -> bool {
        message_size <= MessageSize::from(self.config.single.max - (self.config.offset + 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeRange;

    fn codec(config: FrameCodecConfig) -> FrameCodec {
        FrameCodec::new(config, FrameSizeMapper::Identity)
    }

    fn custom(
        single: (u8, u8),
        first: (u8, u8),
        consecutive: (u8, u8),
        flow_control: (u8, u8),
        offset: u8,
    ) -> FrameCodec {
        let config = FrameCodecConfig::new(
            SizeRange::new(single.0, single.1),
            SizeRange::new(first.0, first.1),
            SizeRange::new(consecutive.0, consecutive.1),
            SizeRange::new(flow_control.0, flow_control.1),
            0xCC,
            offset,
        )
        .unwrap();
        codec(config)
    }

    #[test]
    fn decode_frame_type_reads_upper_nibble_behind_offset() {
        let cut = custom((0, 8), (8, 8), (0, 8), (0, 8), 1);
        assert_eq!(cut.decode_frame_type(&[0xAB, 0x21, 0x00]), Ok(FrameType::Consecutive));
        assert_eq!(cut.decode_frame_type(&[0xAB]), Err(CodecError::InvalidFrameSize));
        assert_eq!(cut.decode_frame_type(&[0xAB, 0x90]), Err(CodecError::InvalidFrameType));
    }

    #[test]
    fn decode_short_single_frame() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        let frame = cut.decode_single_frame(&[0x02, 0x13, 0x24]).unwrap();
        assert_eq!(frame.message_size, 2);
        assert_eq!(frame.data, &[0x13, 0x24]);
    }

    #[test]
    fn decode_single_frame_with_enforced_padding() {
        let cut = custom((6, 6), (6, 6), (6, 6), (6, 6), 1);
        let frame = cut.decode_single_frame(&[0xAB, 0x01, 0x12, 0xAA, 0xAA, 0xAA]).unwrap();
        assert_eq!(frame.message_size, 1);
        assert_eq!(frame.data, &[0x12]);

        let frame = cut.decode_single_frame(&[0xAB, 0x04, 0x12, 0x34, 0x56, 0x78]).unwrap();
        assert_eq!(frame.message_size, 4);
        assert_eq!(frame.data, &[0x12, 0x34, 0x56, 0x78]);

        // payload outside the configured bounds
        assert_eq!(
            cut.decode_single_frame(&[0xAB, 0x06, 0x12, 0x34, 0x56]),
            Err(CodecError::InvalidFrameSize)
        );
        assert_eq!(
            cut.decode_single_frame(&[0xAB, 0x06, 0x12, 0x34, 0x56, 0x78, 0x9A]),
            Err(CodecError::InvalidFrameSize)
        );
    }

    #[test]
    fn decode_single_frame_length_beyond_payload_is_rejected() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        assert_eq!(
            cut.decode_single_frame(&[0x07, 0x12, 0x34]),
            Err(CodecError::InvalidMessageSize)
        );
    }

    #[test]
    fn decode_long_single_frame_needs_large_payload() {
        let cut = custom((0, 62), (62, 62), (0, 62), (0, 62), 0);
        let mut payload = vec![0u8; 12];
        payload[0] = 0x00;
        payload[1] = 10;
        for (i, byte) in payload.iter_mut().skip(2).enumerate() {
            *byte = i as u8;
        }
        let frame = cut.decode_single_frame(&payload).unwrap();
        assert_eq!(frame.message_size, 10);
        assert_eq!(frame.data.len(), 10);

        // zero nibble on a short payload is not a long single frame
        let cut8 = codec(FrameCodecConfig::optimized_classic());
        assert_eq!(
            cut8.decode_single_frame(&[0x00, 0x05, 0x01, 0x02]),
            Err(CodecError::InvalidMessageSize)
        );
    }

    #[test]
    fn decode_first_frame_with_twelve_bit_length() {
        let cut = custom((6, 6), (6, 6), (6, 6), (6, 6), 1);
        let frame = cut.decode_first_frame(&[0xAB, 0x10, 0x05, 0x12, 0x34, 0x56]).unwrap();
        assert_eq!(frame.message_size, 5);
        assert_eq!(frame.frame_count, 2);
        assert_eq!(frame.consecutive_frame_data_size, 4);
        assert_eq!(frame.data, &[0x12, 0x34, 0x56]);
    }

    #[test]
    fn decode_first_frame_escape_sequences() {
        let cut = custom((0, 8), (6, 8), (0, 8), (0, 8), 1);

        // escape sequence needs six protocol bytes behind the offset
        assert_eq!(
            cut.decode_first_frame(&[0xAB, 0x10, 0x00, 0x12, 0x34, 0x56]),
            Err(CodecError::InvalidFrameSize)
        );

        // plain 12-bit length
        let frame = cut.decode_first_frame(&[0xAB, 0x11, 0x23, 0xDE, 0xAD, 0xEF]).unwrap();
        assert_eq!(frame.message_size, 0x123);
        assert_eq!(frame.frame_count, 73);
        assert_eq!(frame.consecutive_frame_data_size, 4);
        assert_eq!(frame.data, &[0xDE, 0xAD, 0xEF]);

        // escaped size just above the 16-bit range
        let frame =
            cut.decode_first_frame(&[0xAB, 0x10, 0x00, 0x00, 0x01, 0x00, 0x00, 0xA5]).unwrap();
        assert_eq!(frame.message_size, 0x10000);
        assert_eq!(frame.frame_count, 10923);
        assert_eq!(frame.consecutive_frame_data_size, 6);
        assert_eq!(frame.data, &[0xA5]);

        // largest escaped size still fitting the frame index type
        let frame =
            cut.decode_first_frame(&[0xAB, 0x10, 0x00, 0x00, 0x05, 0xFF, 0xF9, 0xA5]).unwrap();
        assert_eq!(frame.message_size, 0x5_FFF9);
        assert_eq!(frame.frame_count, 65535);

        // frame count overflowing the frame index type
        assert_eq!(
            cut.decode_first_frame(&[0xAB, 0x10, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xA5]),
            Err(CodecError::InvalidMessageSize)
        );

        // escaped size within the 12-bit range
        assert_eq!(
            cut.decode_first_frame(&[0xAB, 0x10, 0x00, 0x00, 0x00, 0x0F, 0xFF, 0xA5]),
            Err(CodecError::InvalidMessageSize)
        );
    }

    #[test]
    fn decode_first_frame_escape_without_offset() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        let frame = cut.decode_first_frame(&[0x10, 0x00, 0x00, 0x01, 0x00, 0x00, 0xD0]).unwrap();
        assert_eq!(frame.message_size, 0x10000);
        assert_eq!(frame.frame_count, 10923);
        assert_eq!(frame.consecutive_frame_data_size, 6);
        assert_eq!(frame.data, &[0xD0]);
    }

    #[test]
    fn decode_first_frame_rejects_single_frame_sized_message() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        assert_eq!(
            cut.decode_first_frame(&[0x10, 0x06, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]),
            Err(CodecError::InvalidMessageSize)
        );
    }

    #[test]
    fn decode_consecutive_frame() {
        let cut = custom((6, 6), (6, 6), (6, 6), (6, 6), 1);
        let frame = cut.decode_consecutive_frame(&[0xAB, 0x23, 0x12, 0xAA, 0xAA, 0xAA]).unwrap();
        assert_eq!(frame.sequence_number, 3);
        assert_eq!(frame.data, &[0x12, 0xAA, 0xAA, 0xAA]);

        assert_eq!(
            cut.decode_consecutive_frame(&[0xAB, 0x23, 0x12, 0xAA, 0xAA]),
            Err(CodecError::InvalidFrameSize)
        );
    }

    #[test]
    fn decode_flow_control_frame() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        let frame = cut.decode_flow_control_frame(&[0x32, 0x14, 0x56]).unwrap();
        assert_eq!(frame.flow_status, FlowStatus::Overflow);
        assert_eq!(frame.block_size, 0x14);
        assert_eq!(frame.encoded_min_separation_time, 0x56);

        assert_eq!(
            cut.decode_flow_control_frame(&[0x32, 0x14]),
            Err(CodecError::InvalidFrameSize)
        );
        // reserved status nibble
        assert_eq!(
            cut.decode_flow_control_frame(&[0x3F, 0x14, 0x56]),
            Err(CodecError::InvalidFrameType)
        );
    }

    #[test]
    fn encoded_frame_count_boundaries_at_offset_one() {
        let config = FrameCodecConfig::optimized_classic().with_offset(1).unwrap();
        let cut = codec(config);
        // six bytes ride in one short single frame
        assert_eq!(cut.encoded_frame_count(6), Ok((1, 0)));
        // seven bytes are segmented into a first and one consecutive frame
        assert_eq!(cut.encoded_frame_count(7), Ok((2, 6)));
        assert_eq!(cut.encoded_frame_count(0), Err(CodecError::InvalidMessageSize));
    }

    #[test]
    fn encode_data_frames_with_offset() {
        let cut = custom((3, 8), (8, 8), (3, 8), (3, 8), 1);
        let mut frame = [0u8; 10];
        frame[0] = 0xDC;

        // short single frame
        let data = [0x12, 0x34, 0x78];
        let enc = cut.encode_data_frame(&mut frame, &data, 0, 0).unwrap();
        assert_eq!(enc.consumed, 3);
        assert_eq!(&frame[..usize::from(enc.frame_size)], &[0xDC, 0x03, 0x12, 0x34, 0x78]);

        // first frame of a seven byte message
        let message = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];
        let enc = cut.encode_data_frame(&mut frame, &message, 0, 6).unwrap();
        assert_eq!(enc.consumed, 5);
        assert_eq!(
            &frame[..usize::from(enc.frame_size)],
            &[0xDC, 0x10, 0x07, 0x12, 0x34, 0x56, 0x78, 0x9A]
        );

        // consecutive frame with the remainder
        let enc = cut.encode_data_frame(&mut frame, &message[5..], 1, 6).unwrap();
        assert_eq!(enc.consumed, 2);
        assert_eq!(&frame[..usize::from(enc.frame_size)], &[0xDC, 0x21, 0xBC, 0xDE]);
    }

    #[test]
    fn encode_data_frames_with_minimum_segment_size() {
        let cut = custom((3, 8), (8, 8), (3, 8), (3, 8), 1);
        let mut frame = [0u8; 10];
        frame[0] = 0xDC;
        let message = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];

        // first frame consumes nothing and is padded out
        let enc = cut.encode_data_frame(&mut frame, &message, 0, 1).unwrap();
        assert_eq!(enc.consumed, 0);
        assert_eq!(
            &frame[..usize::from(enc.frame_size)],
            &[0xDC, 0x10, 0x07, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC]
        );

        // consecutive frames carry one byte each
        let enc = cut.encode_data_frame(&mut frame, &message, 1, 1).unwrap();
        assert_eq!(enc.consumed, 1);
        assert_eq!(&frame[..usize::from(enc.frame_size)], &[0xDC, 0x21, 0x12]);

        let enc = cut.encode_data_frame(&mut frame, &message[1..], 2, 1).unwrap();
        assert_eq!(enc.consumed, 1);
        assert_eq!(&frame[..usize::from(enc.frame_size)], &[0xDC, 0x22, 0x34]);
    }

    #[test]
    fn encode_segmented_message_padded_consecutive() {
        // seven bytes over classic CAN with a padded link
        let config = FrameCodecConfig::new(
            SizeRange::new(0, 7),
            SizeRange::new(8, 8),
            SizeRange::new(8, 8),
            SizeRange::new(0, 8),
            0xCC,
            0,
        )
        .unwrap();
        let cut = codec(config);
        let message = [0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6];
        assert_eq!(cut.encoded_frame_count(7), Ok((2, 7)));

        let mut frame = [0u8; 8];
        let enc = cut.encode_data_frame(&mut frame, &message, 0, 7).unwrap();
        assert_eq!(enc.consumed, 6);
        assert_eq!(
            &frame[..usize::from(enc.frame_size)],
            &[0x10, 0x07, 0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5]
        );

        let enc = cut.encode_data_frame(&mut frame, &message[6..], 1, 7).unwrap();
        assert_eq!(enc.consumed, 1);
        assert_eq!(
            &frame[..usize::from(enc.frame_size)],
            &[0x21, 0xD6, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC]
        );
    }

    #[test]
    fn encode_first_frame_escape_edge() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        let mut frame = [0u8; 8];

        // 4095 bytes use the 12-bit length
        let message = vec![0x55u8; 4095];
        let enc = cut.encode_data_frame(&mut frame, &message, 0, 7).unwrap();
        assert_eq!(enc.consumed, 6);
        assert_eq!(&frame[..2], &[0x1F, 0xFF]);

        // 4096 bytes switch to the 32-bit escape sequence
        let message = vec![0x55u8; 4096];
        let enc = cut.encode_data_frame(&mut frame, &message, 0, 7).unwrap();
        assert_eq!(enc.consumed, 2);
        assert_eq!(&frame[..6], &[0x10, 0x00, 0x00, 0x00, 0x10, 0x00]);
        assert_eq!(&frame[6..8], &[0x55, 0x55]);
    }

    #[test]
    fn encode_rejects_empty_data_and_missing_segment_size() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        let mut frame = [0u8; 8];
        assert_eq!(
            cut.encode_data_frame(&mut frame, &[], 0, 7),
            Err(CodecError::InvalidFrameIndex)
        );
        let message = [0u8; 100];
        assert_eq!(
            cut.encode_data_frame(&mut frame, &message, 0, 0),
            Err(CodecError::InvalidFrameIndex)
        );
        assert_eq!(
            cut.encode_data_frame(&mut frame, &message, 1, 0),
            Err(CodecError::InvalidFrameIndex)
        );
    }

    #[test]
    fn encode_into_short_buffer_is_rejected() {
        let cut = codec(FrameCodecConfig::optimized_classic());
        let mut frame = [0u8; 4];
        let message = [0u8; 100];
        assert_eq!(
            cut.encode_data_frame(&mut frame, &message, 0, 7),
            Err(CodecError::InvalidFrameSize)
        );
    }

    #[test]
    fn encode_flow_control_with_padding() {
        let config = FrameCodecConfig::padded_classic();
        let cut = codec(config);
        let mut frame = [0u8; 8];
        let size = cut
            .encode_flow_control_frame(&mut frame, FlowStatus::ContinueToSend, 0x14, 0x20)
            .unwrap();
        assert_eq!(size, 8);
        assert_eq!(&frame, &[0x30, 0x14, 0x20, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC]);

        let mut frame = [0u8; 8];
        let cut = codec(FrameCodecConfig::optimized_classic());
        let size = cut.encode_flow_control_frame(&mut frame, FlowStatus::Wait, 0, 0).unwrap();
        assert_eq!(size, 3);
        assert_eq!(&frame[..3], &[0x31, 0x00, 0x00]);
    }

    #[test]
    fn fd_size_mapper_rounds_encoded_frames() {
        let config = FrameCodecConfig::optimized_fd();
        let cut = FrameCodec::new(config, FrameSizeMapper::CanFd);
        let mut frame = [0u8; 64];
        // nine data bytes need a 10 byte long single frame, rounded to 12
        let message = [0x11u8; 9];
        let enc = cut.encode_data_frame(&mut frame, &message, 0, 0).unwrap();
        assert_eq!(enc.frame_size, 12);
        assert_eq!(enc.consumed, 9);
        assert_eq!(frame[0], 0x00);
        assert_eq!(frame[1], 9);
        assert_eq!(&frame[11..12], &[0xCC]);
    }
}
