//! Connection descriptors binding codec and address pairs.

use crate::{
    codec::FrameCodec,
    datalink::{DataLinkAddressPair, TransportAddressPair},
};

/// Storable connection description: the codec is referenced by its
/// index in the owning [`crate::AddressingFilter`], so the descriptor
/// stays free of lifetimes and can live inside pool slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Index of the frame codec in the addressing filter's codec list.
    pub codec_index: u16,
    /// Data-link addresses of the connection.
    pub data_link: DataLinkAddressPair,
    /// Transport addresses of the connection.
    pub transport: TransportAddressPair,
}

/// Immutable connection bundle passed along with every decoded frame.
#[derive(Debug, Clone, Copy)]
pub struct Connection<'a> {
    codec: &'a FrameCodec,
    info: ConnectionInfo,
}

impl<'a> Connection<'a> {
    /// Create a connection from a resolved codec and its description.
    #[must_use]
    pub fn new(codec: &'a FrameCodec, info: ConnectionInfo) -> Self {
        Self { codec, info }
    }

    /// Frame codec of the link.
    #[must_use]
    pub fn codec(&self) -> &'a FrameCodec {
        self.codec
    }

    /// Data-link address pair.
    #[must_use]
    pub fn data_link(&self) -> DataLinkAddressPair {
        self.info.data_link
    }

    /// Transport address pair.
    #[must_use]
    pub fn transport(&self) -> TransportAddressPair {
        self.info.transport
    }

    /// Lifetime-free description of this connection.
    #[must_use]
    pub fn info(&self) -> ConnectionInfo {
        self.info
    }
}
