//! Static addressing filter resolving frames to connections.

use crate::{
    codec::FrameCodec,
    connection::{Connection, ConnectionInfo},
    datalink::{DataLinkAddress, DataLinkAddressPair, TransportAddress, TransportAddressPair},
    errors::ConfigError,
};

/// One row of the addressing table.
///
/// The transport pair describes the *incoming* direction: `source` is
/// the remote node whose frames arrive on `reception_address`, `target`
/// the local node. Outgoing messages match the swapped pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressEntry {
    /// Data-link address incoming frames carry.
    pub reception_address: DataLinkAddress,
    /// Data-link address outgoing frames carry.
    pub transmission_address: DataLinkAddress,
    /// Remote transport node (source of incoming messages).
    pub transport_source: TransportAddress,
    /// Local transport node (target of incoming messages).
    pub transport_target: TransportAddress,
    /// Codec index for the reception direction.
    pub reception_codec: u16,
    /// Codec index for the transmission direction.
    pub transmission_codec: u16,
}

/// Addressing filter: a static table plus the codecs it references.
///
/// Reception lookups are `O(log N)` over the table sorted by reception
/// address; a miss means the frame is not for this stack and is dropped
/// by the caller.
#[derive(Debug)]
pub struct AddressingFilter {
    entries: Vec<AddressEntry>,
    codecs: Vec<FrameCodec>,
}

impl AddressingFilter {
    /// Build a filter from a table and the codec list it references.
    ///
    /// # Errors
    ///
    /// Rejects codec indices outside the list and duplicate reception
    /// addresses.
    pub fn new(mut entries: Vec<AddressEntry>, codecs: Vec<FrameCodec>) -> Result<Self, ConfigError> {
        for (index, entry) in entries.iter().enumerate() {
            for codec in [entry.reception_codec, entry.transmission_codec] {
                if usize::from(codec) >= codecs.len() {
                    return Err(ConfigError::CodecIndexOutOfRange {
                        entry: index,
                        index: codec,
                        count: codecs.len(),
                    });
                }
            }
        }
        entries.sort_unstable_by_key(|entry| entry.reception_address);
        for pair in entries.windows(2) {
            if pair[0].reception_address == pair[1].reception_address {
                return Err(ConfigError::DuplicateReceptionAddress {
                    address: pair[0].reception_address,
                });
            }
        }
        Ok(Self { entries, codecs })
    }

    /// Codec at the given table index.
    #[must_use]
    pub fn codec(&self, index: u16) -> Option<&FrameCodec> {
        self.codecs.get(usize::from(index))
    }

    /// Resolve an incoming frame's reception address to its connection.
    #[must_use]
    pub fn resolve_reception(&self, reception: DataLinkAddress) -> Option<ConnectionInfo> {
        let index = self
            .entries
            .binary_search_by_key(&reception, |entry| entry.reception_address)
            .ok()?;
        let entry = &self.entries[index];
        Some(ConnectionInfo {
            codec_index: entry.reception_codec,
            data_link: DataLinkAddressPair::new(entry.reception_address, entry.transmission_address),
            transport: TransportAddressPair::new(entry.transport_source, entry.transport_target),
        })
    }

    /// Resolve an outgoing message's transport pair to its connection.
    ///
    /// `source` is the local node, `target` the remote node, so the
    /// match is against the table entry's swapped pair.
    #[must_use]
    pub fn resolve_transmission(
        &self,
        source: TransportAddress,
        target: TransportAddress,
    ) -> Option<ConnectionInfo> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.transport_target == source && entry.transport_source == target)?;
        Some(ConnectionInfo {
            codec_index: entry.transmission_codec,
            data_link: DataLinkAddressPair::new(entry.reception_address, entry.transmission_address),
            transport: TransportAddressPair::new(source, target),
        })
    }

    /// Materialise a [`Connection`] from a stored description.
    #[must_use]
    pub fn connection(&self, info: ConnectionInfo) -> Option<Connection<'_>> {
        Some(Connection::new(self.codec(info.codec_index)?, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::FrameCodecConfig, size_mapper::FrameSizeMapper};

    fn filter() -> AddressingFilter {
        let classic = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
        let fd = FrameCodec::new(FrameCodecConfig::optimized_fd(), FrameSizeMapper::CanFd);
        AddressingFilter::new(
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
                    reception_address: 0x125,
                    transmission_address: 0x124,
                    transport_source: 0x21,
                    transport_target: 0x10,
                    reception_codec: 1,
                    transmission_codec: 1,
                },
            ],
            vec![classic, fd],
        )
        .unwrap()
    }

    #[test]
    fn reception_lookup_returns_the_full_connection() {
        let filter = filter();
        let info = filter.resolve_reception(0x415).unwrap();
        assert_eq!(info.data_link, DataLinkAddressPair::new(0x415, 0x414));
        assert_eq!(info.transport, TransportAddressPair::new(0x11, 0x10));
        assert_eq!(info.codec_index, 0);
        assert!(filter.connection(info).is_some());
    }

    #[test]
    fn unknown_reception_address_misses() {
        assert_eq!(filter().resolve_reception(0x7FF), None);
    }

    #[test]
    fn transmission_lookup_swaps_the_pair() {
        let filter = filter();
        let info = filter.resolve_transmission(0x10, 0x21).unwrap();
        assert_eq!(info.codec_index, 1);
        assert_eq!(info.data_link, DataLinkAddressPair::new(0x125, 0x124));
        assert_eq!(info.transport, TransportAddressPair::new(0x10, 0x21));
        assert_eq!(filter.resolve_transmission(0x21, 0x10), None);
    }

    #[test]
    fn invalid_codec_index_is_rejected() {
        let classic = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
        let err = AddressingFilter::new(
            vec![AddressEntry {
                reception_address: 0x415,
                transmission_address: 0x414,
                transport_source: 0x11,
                transport_target: 0x10,
                reception_codec: 0,
                transmission_codec: 3,
            }],
            vec![classic],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CodecIndexOutOfRange { index: 3, .. }));
    }

    #[test]
    fn duplicate_reception_address_is_rejected() {
        let classic = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
        let entry = AddressEntry {
            reception_address: 0x415,
            transmission_address: 0x414,
            transport_source: 0x11,
            transport_target: 0x10,
            reception_codec: 0,
            transmission_codec: 0,
        };
        let err = AddressingFilter::new(vec![entry, entry], vec![classic]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateReceptionAddress { address: 0x415 }));
    }
}
