//! Feeds arbitrary payloads through every codec decode path.
//!
//! Decoding must never panic and never hand out data longer than the
//! payload, whatever the bytes look like.

#![no_main]

use arbitrary::Arbitrary;
use docan_frame::{FrameCodec, FrameCodecConfig, FrameSizeMapper};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    offset: bool,
    fd: bool,
    padded: bool,
    payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let config = match (input.fd, input.padded) {
        (false, false) => FrameCodecConfig::optimized_classic(),
        (false, true) => FrameCodecConfig::padded_classic(),
        (true, false) => FrameCodecConfig::optimized_fd(),
        (true, true) => FrameCodecConfig::padded_fd(),
    };
    let config = if input.offset {
        match config.with_offset(1) {
            Ok(config) => config,
            Err(_) => return,
        }
    } else {
        config
    };
    let mapper = if input.fd { FrameSizeMapper::CanFd } else { FrameSizeMapper::Identity };
    let codec = FrameCodec::new(config, mapper);

    let payload = &input.payload;
    let _ = codec.decode_frame_type(payload);
    if let Ok(frame) = codec.decode_single_frame(payload) {
        assert!(frame.data.len() <= payload.len());
        assert_eq!(frame.data.len(), frame.message_size as usize);
    }
    if let Ok(frame) = codec.decode_first_frame(payload) {
        assert!(frame.data.len() <= payload.len());
        assert!(frame.frame_count > 1);
        assert!(u32::from(frame.consecutive_frame_data_size) <= 64);
    }
    if let Ok(frame) = codec.decode_consecutive_frame(payload) {
        assert!(frame.sequence_number < 16);
        assert!(frame.data.len() < payload.len());
    }
    let _ = codec.decode_flow_control_frame(payload);
});
