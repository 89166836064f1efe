//! Addressing schemes mapping data-link addresses to CAN identifiers.
//!
//! Three interchangeable variants:
//!
//! - **Normal**: the CAN identifier alone is the data-link address.
//! - **Normal fixed**: the 29-bit identifier is derived from the
//!   transport source and target through the fixed-identifier formula;
//!   the address is computed, not tabulated.
//! - **Extended**: the first payload byte carries the target address;
//!   the data-link address packs `(can id << 8) | address byte` and the
//!   frame codec runs with an offset of one.

use crate::datalink::DataLinkAddress;

/// Base of the 29-bit fixed identifier for physically addressed
/// diagnostics.
const NORMAL_FIXED_PHYSICAL_BASE: u32 = 0x18DA_0000;

/// Derive the 29-bit fixed CAN identifier for a physically addressed
/// link between two nodes.
#[must_use]
pub fn normal_fixed_can_id(source: u8, target: u8) -> u32 {
    NORMAL_FIXED_PHYSICAL_BASE | (u32::from(target) << 8) | u32::from(source)
}

/// Addressing variant of one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingScheme {
    /// CAN identifier is the data-link address.
    #[default]
    Normal,
    /// CAN identifier derived from the transport pair; behaves like
    /// [`AddressingScheme::Normal`] on the wire once the table is built
    /// with [`normal_fixed_can_id`].
    NormalFixed,
    /// Target address in the first payload byte.
    Extended,
}

impl AddressingScheme {
    /// Payload bytes this scheme reserves ahead of the protocol bytes.
    #[must_use]
    pub fn codec_offset(self) -> u8 {
        match self {
            Self::Normal | Self::NormalFixed => 0,
            Self::Extended => 1,
        }
    }

    /// Apply a transmission address to an outgoing frame.
    ///
    /// Returns the CAN identifier to send under; for extended
    /// addressing the address byte is written into payload byte 0.
    #[must_use]
    pub fn encode_transmission_address(self, address: DataLinkAddress, payload: &mut [u8]) -> u32 {
        match self {
            Self::Normal | Self::NormalFixed => address,
            Self::Extended => {
                if let Some(first) = payload.first_mut() {
                    *first = (address & 0xFF) as u8;
                }
                address >> 8
            },
        }
    }

    /// Recover the data-link reception address of an incoming frame.
    ///
    /// Returns `None` for an extended-addressed frame without payload.
    #[must_use]
    pub fn decode_reception_address(self, can_id: u32, payload: &[u8]) -> Option<DataLinkAddress> {
        match self {
            Self::Normal | Self::NormalFixed => Some(can_id),
            Self::Extended => payload.first().map(|byte| (can_id << 8) | DataLinkAddress::from(*byte)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_addressing_is_the_can_id() {
        let mut payload = [0x02, 0x3E, 0x00];
        let id = AddressingScheme::Normal.encode_transmission_address(0x414, &mut payload);
        assert_eq!(id, 0x414);
        assert_eq!(payload, [0x02, 0x3E, 0x00]);
        assert_eq!(AddressingScheme::Normal.decode_reception_address(0x415, &payload), Some(0x415));
    }

    #[test]
    fn fixed_id_formula() {
        assert_eq!(normal_fixed_can_id(0xF1, 0x10), 0x18DA_10F1);
        assert_eq!(normal_fixed_can_id(0x10, 0xF1), 0x18DA_F110);
    }

    #[test]
    fn extended_addressing_claims_first_byte() {
        let mut payload = [0u8; 4];
        let id = AddressingScheme::Extended.encode_transmission_address(0x0041_45EA, &mut payload);
        assert_eq!(id, 0x4145);
        assert_eq!(payload[0], 0xEA);

        let address = AddressingScheme::Extended.decode_reception_address(0x4145, &payload);
        assert_eq!(address, Some(0x0041_45EA));
        assert_eq!(AddressingScheme::Extended.decode_reception_address(0x4145, &[]), None);
    }

    #[test]
    fn extended_codec_offset_reserves_one_byte() {
        assert_eq!(AddressingScheme::Extended.codec_offset(), 1);
        assert_eq!(AddressingScheme::Normal.codec_offset(), 0);
        assert_eq!(AddressingScheme::NormalFixed.codec_offset(), 0);
    }
}
