extern crate rand;
extern crate tk_reactor;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use tk_reactor::websocket::{Assembler, FrameDecoder, FrameEvent, Opcode};
use tk_reactor::websocket::{Packet, Key, Accept, negotiate};
use tk_reactor::websocket::{write_frame, write_packet};

fn decode_split(data: &[u8], rng: &mut StdRng) -> Vec<FrameEvent> {
    let mut dec = FrameDecoder::with_limits(1 << 20, true);
    let mut events = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let n = rng.gen_range(1..=(data.len() - pos).min(4096));
        dec.decode(&data[pos..pos+n], &mut events).unwrap();
        pos += n;
    }
    assert!(dec.is_idle());
    events
}

#[test]
fn masked_frames_of_boundary_lengths() {
    let mut rng = StdRng::seed_from_u64(1);
    for &len in &[0usize, 1, 125, 126, 65535, 65536] {
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let key: [u8; 4] = rng.gen();
        let mut buf = Vec::new();
        write_frame(&mut buf, true, Opcode::Binary, &payload, Some(key));
        let header_len = match len {
            0..=125 => 2,
            126..=65535 => 4,
            _ => 10,
        } + 4;
        assert_eq!(buf.len(), header_len + len);
        if len > 0 {
            assert_ne!(&buf[header_len..], &payload[..]);
        }

        let events = decode_split(&buf, &mut rng);
        let header = match events[0] {
            FrameEvent::Header(header) => header,
            ref e => panic!("expected header, got {:?}", e),
        };
        assert!(header.fin);
        assert_eq!(header.opcode, Opcode::Binary);
        assert_eq!(header.payload_length, len as u64);
        assert_eq!(header.masking_key, Some(key));
        let mut data: Vec<u8> = Vec::new();
        for ev in &events[1..] {
            match *ev {
                FrameEvent::Payload { data: ref chunk, .. } => {
                    data.extend(chunk)
                }
                ref e => panic!("expected payload, got {:?}", e),
            }
        }
        assert!(matches!(events.last(),
                         Some(&FrameEvent::Payload { last: true, .. })));
        assert_eq!(data, payload);
    }
}

#[test]
fn fragmented_message_with_ping() {
    let key = [9, 8, 7, 6];
    let mut buf = Vec::new();
    write_frame(&mut buf, false, Opcode::Text, b"Hel", Some(key));
    write_packet(&mut buf, &Packet::Ping(b"ping".to_vec()), Some(key));
    write_frame(&mut buf, false, Opcode::Continuation, b"lo, ", Some(key));
    write_frame(&mut buf, true, Opcode::Continuation, b"world", Some(key));
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let mut asm = Assembler::new(1024);
        let mut packets = Vec::new();
        for ev in decode_split(&buf, &mut rng) {
            asm.push(ev, &mut packets).unwrap();
        }
        assert_eq!(packets, vec![
            Packet::Ping(b"ping".to_vec()),
            Packet::Text("Hello, world".into()),
        ]);
    }
}

#[test]
fn handshake_vector() {
    let fields: Vec<(&str, &[u8])> = vec![
        ("Host", &b"server.example.com"[..]),
        ("Upgrade", &b"websocket"[..]),
        ("Connection", &b"Upgrade"[..]),
        ("Sec-WebSocket-Key", &b"dGhlIHNhbXBsZSBub25jZQ=="[..]),
        ("Sec-WebSocket-Version", &b"13"[..]),
        ("Sec-WebSocket-Protocol", &b"chat, superchat"[..]),
    ];
    let hs = negotiate("GET", fields, &["superchat"]).unwrap();
    assert_eq!(hs.accept.to_string(), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    assert_eq!(hs.protocols, vec!["superchat"]);
}

#[test]
fn client_key_matches_accept() {
    let key = Key::new();
    let encoded = key.to_string();
    assert_eq!(encoded.len(), 24);
    let parsed = Key::from_header(encoded.as_bytes()).unwrap();
    assert_eq!(parsed.accept(),
               Accept::from_key_bytes(encoded.as_bytes()));
}
