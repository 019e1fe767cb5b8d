use bytes::{Bytes, BytesMut};
use obex_pbap::codec::UnicodeCodec;
use obex_pbap::protocol::{
    build_request, decode_all, decode_next, parse_packet, Cursor, Header, HeaderId,
};
use obex_pbap::ParseError;
use proptest::prelude::*;

fn header_strategy() -> impl Strategy<Value = Header> {
    prop_oneof![
        any::<u32>().prop_map(Header::connection_id),
        "[a-zA-Z0-9/._ -]{0,24}".prop_map(|name| Header::name(&name).unwrap()),
        "[ -~]{0,24}".prop_map(|mime| Header::mime_type(&mime).unwrap()),
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(|b| Header::body(b).unwrap()),
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(|b| Header::end_of_body(b).unwrap()),
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|b| Header::application_parameters(b).unwrap()),
        // unknown byte-sequence header
        (0x50u8..0x7F, prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(id, b)| Header::new(HeaderId::from(id), b).unwrap()),
        // unknown single-byte header
        (0x90u8..0xBF, any::<u8>())
            .prop_map(|(id, v)| Header::new(HeaderId::from(id), vec![v]).unwrap()),
    ]
}

proptest! {
    #[test]
    fn prop_headers_roundtrip_in_order(headers in prop::collection::vec(header_strategy(), 0..12)) {
        let mut buf = BytesMut::new();
        for header in &headers {
            header.encode_into(&mut buf).unwrap();
        }
        let decoded = decode_all(&buf.freeze()).unwrap();
        prop_assert_eq!(decoded, headers);
    }

    #[test]
    fn prop_packet_length_prefix_matches(
        opcode in any::<u8>(),
        headers in prop::collection::vec(header_strategy(), 0..12),
    ) {
        let bytes = build_request(opcode, &headers).unwrap();
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
        prop_assert_eq!(declared, bytes.len());
        prop_assert_eq!(bytes[0], opcode);

        let expected: usize = 3 + headers.iter().map(Header::encoded_len).sum::<usize>();
        prop_assert_eq!(bytes.len(), expected);

        let packet = parse_packet(bytes, 0).unwrap();
        prop_assert_eq!(packet.headers(), &headers[..]);
    }

    #[test]
    fn prop_cursor_advances_by_encoded_len(
        header in header_strategy(),
        trailing in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut buf = BytesMut::new();
        header.encode_into(&mut buf).unwrap();
        buf.extend_from_slice(&trailing);
        let (decoded, cursor) = decode_next(&buf.freeze(), Cursor::start()).unwrap();
        prop_assert_eq!(cursor.position(), header.encoded_len());
        prop_assert_eq!(decoded, header);
    }

    #[test]
    fn prop_short_length_never_panics(
        id in 0u8..0x80,
        length in 0u16..3,
        tail in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut raw = vec![id];
        raw.extend_from_slice(&length.to_be_bytes());
        raw.extend_from_slice(&tail);
        let err = decode_next(&Bytes::from(raw), Cursor::start()).unwrap_err();
        prop_assert_eq!(err, ParseError::HeaderLengthUnderflow { id, length });
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(raw in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_all(&Bytes::from(raw.clone()));
        let _ = parse_packet(Bytes::from(raw), 0);
    }

    #[test]
    fn prop_unicode_roundtrip(text in "\\PC{0,32}") {
        let encoded = UnicodeCodec::encode(&text);
        prop_assert_eq!(encoded.len(), UnicodeCodec::encoded_len(&text));
        prop_assert_eq!(UnicodeCodec::decode(&encoded).unwrap(), text);
    }
}
