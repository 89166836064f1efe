//! Frame decoder: classify a payload and route it to a listener.

use crate::{
    codec::FrameCodec,
    connection::Connection,
    datalink::{DataLinkAddress, FrameIndex, FrameSize, MessageSize},
    errors::CodecError,
    types::{FlowStatus, FrameType},
};

/// Receiver callbacks invoked by [`decode_frame`].
///
/// A single frame is delivered through `first_data_frame_received` with
/// `frame_count = 1` and a consecutive-frame data size of zero, so the
/// listener has one entry point for everything that opens a message.
pub trait FrameListener {
    /// A single or first frame arrived on `connection`.
    fn first_data_frame_received(
        &mut self,
        connection: &Connection<'_>,
        message_size: MessageSize,
        frame_count: FrameIndex,
        consecutive_frame_data_size: FrameSize,
        data: &[u8],
    );

    /// A consecutive frame arrived on the link with the given reception
    /// address.
    fn consecutive_data_frame_received(
        &mut self,
        reception_address: DataLinkAddress,
        sequence_number: u8,
        data: &[u8],
    );

    /// A flow-control frame arrived on the link with the given
    /// reception address.
    fn flow_control_frame_received(
        &mut self,
        reception_address: DataLinkAddress,
        flow_status: FlowStatus,
        block_size: u8,
        encoded_min_separation_time: u8,
    );
}

/// Decode one frame payload and deliver it to the listener.
///
/// # Errors
///
/// Returns the codec error of the failing decode step; the listener is
/// not invoked in that case and the caller drops the frame.
pub fn decode_frame(
    connection: &Connection<'_>,
    payload: &[u8],
    listener: &mut dyn FrameListener,
) -> Result<(), CodecError> {
    let codec: &FrameCodec = connection.codec();
    match codec.decode_frame_type(payload)? {
        FrameType::Single => {
            let frame = codec.decode_single_frame(payload)?;
            listener.first_data_frame_received(connection, frame.message_size, 1, 0, frame.data);
        },
        FrameType::First => {
            let frame = codec.decode_first_frame(payload)?;
            listener.first_data_frame_received(
                connection,
                frame.message_size,
                frame.frame_count,
                frame.consecutive_frame_data_size,
                frame.data,
            );
        },
        FrameType::Consecutive => {
            let frame = codec.decode_consecutive_frame(payload)?;
            listener.consecutive_data_frame_received(
                connection.data_link().reception,
                frame.sequence_number,
                frame.data,
            );
        },
        FrameType::FlowControl => {
            let frame = codec.decode_flow_control_frame(payload)?;
            listener.flow_control_frame_received(
                connection.data_link().reception,
                frame.flow_status,
                frame.block_size,
                frame.encoded_min_separation_time,
            );
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::FrameCodecConfig,
        connection::ConnectionInfo,
        datalink::{DataLinkAddressPair, TransportAddressPair},
        size_mapper::FrameSizeMapper,
    };

    #[derive(Debug, PartialEq, Eq)]
    enum Event {
        First { message_size: MessageSize, frame_count: FrameIndex, cf_size: FrameSize, data: Vec<u8> },
        Consecutive { reception: DataLinkAddress, sequence: u8, data: Vec<u8> },
        FlowControl { reception: DataLinkAddress, status: FlowStatus, block_size: u8, st_min: u8 },
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl FrameListener for Recorder {
        fn first_data_frame_received(
            &mut self,
            _connection: &Connection<'_>,
            message_size: MessageSize,
            frame_count: FrameIndex,
            consecutive_frame_data_size: FrameSize,
            data: &[u8],
        ) {
            self.events.push(Event::First {
                message_size,
                frame_count,
                cf_size: consecutive_frame_data_size,
                data: data.to_vec(),
            });
        }

        fn consecutive_data_frame_received(
            &mut self,
            reception_address: DataLinkAddress,
            sequence_number: u8,
            data: &[u8],
        ) {
            self.events.push(Event::Consecutive {
                reception: reception_address,
                sequence: sequence_number,
                data: data.to_vec(),
            });
        }

        fn flow_control_frame_received(
            &mut self,
            reception_address: DataLinkAddress,
            flow_status: FlowStatus,
            block_size: u8,
            encoded_min_separation_time: u8,
        ) {
            self.events.push(Event::FlowControl {
                reception: reception_address,
                status: flow_status,
                block_size,
                st_min: encoded_min_separation_time,
            });
        }
    }

    fn connection(codec: &FrameCodec) -> Connection<'_> {
        Connection::new(
            codec,
            ConnectionInfo {
                codec_index: 0,
                data_link: DataLinkAddressPair::new(0x415, 0x414),
                transport: TransportAddressPair::new(0x11, 0x10),
            },
        )
    }

    #[test]
    fn single_frame_is_routed_as_first_event() {
        let codec = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
        let mut recorder = Recorder::default();
        decode_frame(&connection(&codec), &[0x02, 0x13, 0x24], &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![Event::First { message_size: 2, frame_count: 1, cf_size: 0, data: vec![0x13, 0x24] }]
        );
    }

    #[test]
    fn first_consecutive_and_flow_control_are_routed() {
        let codec = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
        let mut recorder = Recorder::default();
        let conn = connection(&codec);
        decode_frame(&conn, &[0x10, 0x0A, 1, 2, 3, 4, 5, 6], &mut recorder).unwrap();
        decode_frame(&conn, &[0x21, 7, 8, 9, 10, 0xCC, 0xCC, 0xCC], &mut recorder).unwrap();
        decode_frame(&conn, &[0x30, 0x04, 0x14], &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                Event::First { message_size: 10, frame_count: 2, cf_size: 7, data: vec![1, 2, 3, 4, 5, 6] },
                Event::Consecutive {
                    reception: 0x415,
                    sequence: 1,
                    data: vec![7, 8, 9, 10, 0xCC, 0xCC, 0xCC]
                },
                Event::FlowControl {
                    reception: 0x415,
                    status: FlowStatus::ContinueToSend,
                    block_size: 0x04,
                    st_min: 0x14
                },
            ]
        );
    }

    #[test]
    fn decode_failure_suppresses_the_listener() {
        let codec = FrameCodec::new(FrameCodecConfig::optimized_classic(), FrameSizeMapper::Identity);
        let mut recorder = Recorder::default();
        let result = decode_frame(&connection(&codec), &[0x90, 0x00], &mut recorder);
        assert_eq!(result, Err(CodecError::InvalidFrameType));
        assert!(recorder.events.is_empty());
    }
}
