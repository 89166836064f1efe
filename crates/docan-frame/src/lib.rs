//! Wire layer of an ISO 15765-2 (DoCAN) transport stack.
//!
//! This crate owns everything that touches raw CAN frame payloads:
//!
//! - the frame codec: single / first / consecutive / flow-control frame
//!   encoding and decoding, including padding and CAN-FD DLC rounding
//! - the addressing schemes (normal, normal fixed, extended) that map a
//!   data-link address to a CAN identifier and back
//! - the addressing filter that resolves an incoming CAN frame to a
//!   connection (codec + address pairs)
//! - the frame decoder that classifies a payload and routes it to a
//!   [`FrameListener`]
//!
//! The crate is pure: no I/O, no time, no logging. State machines and
//! scheduling live in `docan-core`.

pub mod address;
pub mod codec;
pub mod config;
pub mod connection;
pub mod datalink;
pub mod decoder;
pub mod errors;
pub mod filter;
pub mod size_mapper;
pub mod types;

pub use address::{AddressingScheme, normal_fixed_can_id};
pub use codec::{ConsecutiveFrame, EncodedFrame, FirstFrame, FlowControlFrame, FrameCodec, SingleFrame};
pub use config::{FrameCodecConfig, SizeRange};
pub use connection::{Connection, ConnectionInfo};
pub use datalink::{
    DataLinkAddress, DataLinkAddressPair, FrameIndex, FrameSize, MAX_FRAME_SIZE, MessageSize,
    TransportAddress, TransportAddressPair, INVALID_DATA_LINK_ADDRESS,
};
pub use decoder::{decode_frame, FrameListener};
pub use errors::{CodecError, ConfigError};
pub use filter::{AddressEntry, AddressingFilter};
pub use size_mapper::FrameSizeMapper;
pub use types::{FlowStatus, FrameType};
