use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};

use super::state::AssociationState;
use super::timer::Timer;
use super::*;
use crate::chunk::chunk_cookie_ack::ChunkCookieAck;
use crate::chunk::chunk_init::ChunkInit;
use crate::chunk::chunk_payload_data::{ChunkPayloadData, PayloadProtocolIdentifier};
use crate::chunk::chunk_selective_ack::{ChunkSelectiveAck, GapAckBlock};
use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::packet::Packet;
use crate::param::Param;

struct FixedTagGenerator {
    tag: u32,
}

impl VerificationTagGenerator for FixedTagGenerator {
    fn generate_tag(&mut self) -> u32 {
        self.tag
    }
}

const MTU: usize = 1200;

fn create_association(local_port: u16, remote_port: u16, tag: u32) -> Association {
    Association::new(AssociationConfig {
        local_port,
        remote_port,
        tag_generator: Box::new(FixedTagGenerator { tag }),
        ..Default::default()
    })
}

fn established_association() -> Association {
    let mut a = create_association(5000, 5001, 1);
    a.state = AssociationState::Established;
    a.local_verification_tag = 1;
    a.remote_verification_tag = 2;
    a
}

/// Serializes `chunks` into a packet addressed to association `a`.
fn packet_to(a: &Association, verification_tag: u32, chunks: Vec<Chunk>) -> Result<Bytes> {
    Packet {
        source_port: a.remote_port,
        destination_port: a.local_port,
        verification_tag,
        chunks,
    }
    .marshal()
}

fn data_chunk(tsn: u32, stream_identifier: u16, payload: &'static [u8]) -> Chunk {
    Chunk::PayloadData(ChunkPayloadData {
        unordered: false,
        beginning_fragment: true,
        ending_fragment: true,
        immediate_sack: false,
        tsn,
        stream_identifier,
        stream_sequence_number: 0,
        payload_type: PayloadProtocolIdentifier::Binary,
        user_data: Bytes::from_static(payload),
    })
}

fn sole_sack(a: &mut Association) -> ChunkSelectiveAck {
    let raw = a.read_packet(MTU).unwrap().unwrap();
    let pkt = Packet::unmarshal(&raw).unwrap();
    assert_eq!(1, pkt.chunks.len());
    match pkt.chunks.into_iter().next() {
        Some(Chunk::SelectiveAck(sack)) => sack,
        other => panic!("expected SACK, got {:?}", other),
    }
}

#[test]
fn test_associate_enqueues_init_and_arms_timer() -> Result<()> {
    let now = Instant::now();
    let mut a = create_association(5000, 5001, 0x01020304);

    a.associate(now)?;
    assert_eq!(AssociationState::CookieWait, a.state());
    assert_eq!(0x01020304, a.local_verification_tag);
    assert_eq!(
        Some(now + INIT_RETRANSMIT_TIMEOUT),
        a.poll_timeout(),
        "T1-init must be armed"
    );

    let raw = a.read_packet(MTU)?.unwrap();
    let pkt = Packet::unmarshal(&raw)?;
    assert_eq!(0, pkt.verification_tag, "INIT packet must carry a zero tag");
    assert_eq!(1, pkt.chunks.len());
    match &pkt.chunks[0] {
        Chunk::Init(init) => {
            assert!(!init.is_ack);
            assert_eq!(0x01020304, init.initiate_tag);
        }
        other => panic!("expected INIT, got {:?}", other),
    }

    assert_eq!(
        Error::ErrAssociationNotClosed,
        a.associate(now).unwrap_err(),
        "second associate() must be rejected"
    );
    Ok(())
}

#[test]
fn test_handshake_between_two_associations() -> Result<()> {
    let now = Instant::now();
    let mut client = create_association(5000, 5001, 11);
    let mut server = create_association(5001, 5000, 22);

    client.associate(now)?;

    // INIT ->
    let init = client.read_packet(MTU)?.unwrap();
    server.write_packet(&init, now)?;
    assert_eq!(AssociationState::Closed, server.state());
    assert_eq!(22, server.local_verification_tag);
    assert_eq!(11, server.remote_verification_tag);

    // <- INIT ACK
    let init_ack = server.read_packet(MTU)?.unwrap();
    client.write_packet(&init_ack, now)?;
    assert_eq!(AssociationState::CookieEchoed, client.state());
    assert_eq!(22, client.remote_verification_tag);
    assert_eq!(
        Some(now + INIT_RETRANSMIT_TIMEOUT),
        client.poll_timeout(),
        "T1-cookie must be armed"
    );

    // COOKIE ECHO ->
    let cookie_echo = client.read_packet(MTU)?.unwrap();
    server.write_packet(&cookie_echo, now)?;
    assert_eq!(AssociationState::Established, server.state());
    assert_eq!(Some(Event::Connected), server.poll_event());

    // <- COOKIE ACK
    let cookie_ack = server.read_packet(MTU)?.unwrap();
    client.write_packet(&cookie_ack, now)?;
    assert_eq!(AssociationState::Established, client.state());
    assert_eq!(Some(Event::Connected), client.poll_event());
    assert_eq!(None, client.poll_timeout(), "all timers must be stopped");

    Ok(())
}

#[test]
fn test_cookie_echo_retains_server_cookie() -> Result<()> {
    let now = Instant::now();
    let mut client = create_association(5000, 5001, 11);
    client.associate(now)?;
    client.read_packet(MTU)?; // discard INIT

    let cookie = Bytes::from_static(b"0123456789abcdef");
    let mut init_ack = ChunkInit {
        is_ack: true,
        initiate_tag: 99,
        advertised_receiver_window_credit: 0xffff,
        num_outbound_streams: 10,
        num_inbound_streams: 10,
        initial_tsn: 0,
        params: vec![Param::StateCookie {
            cookie: cookie.clone(),
        }],
    };
    init_ack.set_supported_extensions();
    let raw = packet_to(&client, 11, vec![Chunk::Init(init_ack)])?;
    client.write_packet(&raw, now)?;

    let echoed = client.read_packet(MTU)?.unwrap();
    let pkt = Packet::unmarshal(&echoed)?;
    assert_eq!(99, pkt.verification_tag, "COOKIE ECHO carries the peer tag");
    match &pkt.chunks[0] {
        Chunk::CookieEcho(ce) => assert_eq!(cookie, ce.cookie),
        other => panic!("expected COOKIE ECHO, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_init_ack_without_cookie_is_ignored() -> Result<()> {
    let now = Instant::now();
    let mut client = create_association(5000, 5001, 11);
    client.associate(now)?;
    client.read_packet(MTU)?;

    let init_ack = ChunkInit {
        is_ack: true,
        initiate_tag: 99,
        advertised_receiver_window_credit: 0xffff,
        num_outbound_streams: 10,
        num_inbound_streams: 10,
        initial_tsn: 0,
        params: vec![],
    };
    let raw = packet_to(&client, 11, vec![Chunk::Init(init_ack)])?;
    client.write_packet(&raw, now)?;

    assert_eq!(AssociationState::CookieWait, client.state());
    assert!(
        client.timers.get(Timer::T1Init).is_some(),
        "T1-init must stay armed while waiting for a usable INIT ACK"
    );
    Ok(())
}

#[test]
fn test_init_ack_echoes_reportable_unknown_param() -> Result<()> {
    let now = Instant::now();
    let mut server = create_association(5001, 5000, 22);

    // bit 15 set: keep processing; bit 14 set: report to the sender
    let unknown = Param::Unknown {
        typ: 0xc123,
        value: Bytes::from_static(&[0xab, 0xcd]),
    };
    let init = ChunkInit {
        is_ack: false,
        initiate_tag: 11,
        advertised_receiver_window_credit: 0xffff,
        num_outbound_streams: 10,
        num_inbound_streams: 10,
        initial_tsn: 0,
        params: vec![unknown.clone()],
    };
    let raw = packet_to(&server, 0, vec![Chunk::Init(init)])?;
    server.write_packet(&raw, now)?;

    let reply = server.read_packet(MTU)?.unwrap();
    let pkt = Packet::unmarshal(&reply)?;
    let init_ack = match &pkt.chunks[0] {
        Chunk::Init(init_ack) => {
            assert!(init_ack.is_ack);
            init_ack
        }
        other => panic!("expected INIT ACK, got {:?}", other),
    };

    let echo = init_ack.params.iter().find_map(|p| match p {
        Param::Unrecognized { raw } => Some(raw.clone()),
        _ => None,
    });
    assert_eq!(
        Some(unknown.marshal()?),
        echo,
        "INIT ACK must echo the full TLV of the unrecognized parameter"
    );
    Ok(())
}

#[test]
fn test_init_stop_class_unknown_param_halts_without_echo() -> Result<()> {
    let now = Instant::now();
    let mut server = create_association(5001, 5000, 22);

    // bit 15 clear: stop processing; bit 14 clear: no report either
    let init = ChunkInit {
        is_ack: false,
        initiate_tag: 11,
        advertised_receiver_window_credit: 0xffff,
        num_outbound_streams: 10,
        num_inbound_streams: 10,
        initial_tsn: 0,
        params: vec![
            Param::Unknown {
                typ: 0x0123,
                value: Bytes::from_static(&[0xab, 0xcd]),
            },
            Param::ForwardTsnSupported,
        ],
    };
    let raw = packet_to(&server, 0, vec![Chunk::Init(init)])?;
    server.write_packet(&raw, now)?;

    let reply = server.read_packet(MTU)?.unwrap();
    let pkt = Packet::unmarshal(&reply)?;
    match &pkt.chunks[0] {
        Chunk::Init(init_ack) => {
            assert!(init_ack.is_ack);
            assert!(
                !init_ack
                    .params
                    .iter()
                    .any(|p| matches!(p, Param::Unrecognized { .. })),
                "a stop-class parameter must not be echoed"
            );
        }
        other => panic!("expected INIT ACK, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_first_data_triggers_immediate_sack() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    let raw = packet_to(&a, 1, vec![data_chunk(5, 0, b"hello")])?;
    a.write_packet(&raw, now)?;

    let sack = sole_sack(&mut a);
    assert_eq!(5, sack.cumulative_tsn_ack);
    assert!(sack.gap_ack_blocks.is_empty());
    assert!(sack.duplicate_tsn.is_empty());
    assert_eq!(None, a.poll_timeout(), "no delayed SACK must be scheduled");
    Ok(())
}

#[test]
fn test_in_order_data_defers_sack() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();
    a.last_received_tsn = Some(4);

    let raw = packet_to(&a, 1, vec![data_chunk(5, 0, b"hello")])?;
    a.write_packet(&raw, now)?;

    assert!(a.read_packet(MTU)?.is_none(), "SACK must be delayed");
    assert_eq!(Some(now + SACK_TIMEOUT), a.poll_timeout());

    a.handle_timeout(now + SACK_TIMEOUT);
    let sack = sole_sack(&mut a);
    assert_eq!(5, sack.cumulative_tsn_ack);
    Ok(())
}

#[test]
fn test_second_data_while_sack_pending_forces_immediate_send() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();
    a.last_received_tsn = Some(4);

    let raw = packet_to(&a, 1, vec![data_chunk(5, 0, b"one")])?;
    a.write_packet(&raw, now)?;
    assert!(a.read_packet(MTU)?.is_none());

    let raw = packet_to(&a, 1, vec![data_chunk(6, 0, b"two")])?;
    a.write_packet(&raw, now)?;

    let sack = sole_sack(&mut a);
    assert_eq!(6, sack.cumulative_tsn_ack);
    assert_eq!(None, a.poll_timeout(), "SACK timer must be cleared");
    Ok(())
}

#[test]
fn test_gap_and_duplicate_sack() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    // TSN 5, then 7 skipping 6, then 5 again
    let raw = packet_to(
        &a,
        1,
        vec![
            data_chunk(5, 0, b"five"),
            data_chunk(7, 0, b"seven"),
            data_chunk(5, 0, b"five"),
        ],
    )?;
    a.write_packet(&raw, now)?;

    let sack = sole_sack(&mut a);
    assert_eq!(5, sack.cumulative_tsn_ack);
    assert_eq!(vec![GapAckBlock { start: 2, end: 2 }], sack.gap_ack_blocks);
    assert_eq!(vec![5], sack.duplicate_tsn);

    // TSN 6 closes the gap; the sequence is contiguous again so the SACK is
    // delayed until the timer fires
    let raw = packet_to(&a, 1, vec![data_chunk(6, 0, b"six")])?;
    a.write_packet(&raw, now)?;
    assert_eq!(Some(now + SACK_TIMEOUT), a.poll_timeout());
    a.handle_timeout(now + SACK_TIMEOUT);

    let sack = sole_sack(&mut a);
    assert_eq!(7, sack.cumulative_tsn_ack);
    assert!(sack.gap_ack_blocks.is_empty());
    assert!(sack.duplicate_tsn.is_empty());
    Ok(())
}

#[test]
fn test_duplicate_of_acknowledged_tsn_is_reported() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    let raw = packet_to(&a, 1, vec![data_chunk(5, 0, b"five")])?;
    a.write_packet(&raw, now)?;
    assert_eq!(5, sole_sack(&mut a).cumulative_tsn_ack);

    // the same TSN arrives again after it was consolidated
    let raw = packet_to(&a, 1, vec![data_chunk(5, 0, b"five")])?;
    a.write_packet(&raw, now)?;

    let sack = sole_sack(&mut a);
    assert_eq!(5, sack.cumulative_tsn_ack);
    assert_eq!(vec![5], sack.duplicate_tsn);
    Ok(())
}

#[test]
fn test_alone_chunk_packing() -> Result<()> {
    let mut a = create_association(5000, 5001, 1);

    let init = ChunkInit {
        is_ack: false,
        initiate_tag: 1,
        advertised_receiver_window_credit: 0xffff,
        num_outbound_streams: 10,
        num_inbound_streams: 10,
        initial_tsn: 0,
        params: vec![],
    };
    a.enqueue(Chunk::Init(init));
    a.enqueue(Chunk::SelectiveAck(ChunkSelectiveAck {
        cumulative_tsn_ack: 3,
        advertised_receiver_window_credit: 0xffff,
        gap_ack_blocks: vec![],
        duplicate_tsn: vec![],
    }));

    let first = Packet::unmarshal(&a.read_packet(MTU)?.unwrap())?;
    assert_eq!(1, first.chunks.len());
    assert!(matches!(first.chunks[0], Chunk::Init(_)));

    let second = Packet::unmarshal(&a.read_packet(MTU)?.unwrap())?;
    assert_eq!(1, second.chunks.len());
    assert!(matches!(second.chunks[0], Chunk::SelectiveAck(_)));

    assert!(a.read_packet(MTU)?.is_none());
    Ok(())
}

#[test]
fn test_control_chunks_are_bundled() -> Result<()> {
    let mut a = established_association();

    a.enqueue(Chunk::CookieAck(ChunkCookieAck));
    a.enqueue(Chunk::SelectiveAck(ChunkSelectiveAck {
        cumulative_tsn_ack: 3,
        advertised_receiver_window_credit: 0xffff,
        gap_ack_blocks: vec![],
        duplicate_tsn: vec![],
    }));

    let pkt = Packet::unmarshal(&a.read_packet(MTU)?.unwrap())?;
    assert_eq!(2, pkt.chunks.len());
    Ok(())
}

#[test]
fn test_read_packet_respects_capacity() -> Result<()> {
    let mut a = established_association();

    let mut payload = BytesMut::new();
    payload.resize(512, 0xab);
    let chunk = match data_chunk(1, 0, b"") {
        Chunk::PayloadData(mut d) => {
            d.user_data = payload.freeze();
            Chunk::PayloadData(d)
        }
        _ => unreachable!(),
    };
    a.enqueue(chunk.clone());
    a.enqueue(chunk);

    // both chunks fit in MTU but not in 600 bytes
    let first = Packet::unmarshal(&a.read_packet(600)?.unwrap())?;
    assert_eq!(1, first.chunks.len());
    let second = Packet::unmarshal(&a.read_packet(600)?.unwrap())?;
    assert_eq!(1, second.chunks.len());
    assert!(a.read_packet(600)?.is_none());
    Ok(())
}

#[test]
fn test_pending_data_callback_is_edge_triggered() -> Result<()> {
    let mut a = established_association();
    let calls = Rc::new(RefCell::new(0));

    let calls_tx = Rc::clone(&calls);
    a.set_on_pending_data(move || {
        *calls_tx.borrow_mut() += 1;
    });

    a.enqueue(Chunk::CookieAck(ChunkCookieAck));
    a.enqueue(Chunk::CookieAck(ChunkCookieAck));
    assert_eq!(1, *calls.borrow(), "only the empty->nonempty edge fires");

    a.read_packet(MTU)?;
    a.enqueue(Chunk::CookieAck(ChunkCookieAck));
    assert_eq!(2, *calls.borrow(), "draining re-arms the edge");
    Ok(())
}

#[test]
fn test_init_retransmission_until_failure() -> Result<()> {
    let mut now = Instant::now();
    let mut a = create_association(5000, 5001, 1);
    a.associate(now)?;
    a.read_packet(MTU)?;

    for i in 0..MAX_INIT_RETRANSMITS {
        now += INIT_RETRANSMIT_TIMEOUT;
        a.handle_timeout(now);
        assert_eq!(
            AssociationState::CookieWait,
            a.state(),
            "retry {} must keep waiting",
            i
        );

        let pkt = Packet::unmarshal(&a.read_packet(MTU)?.unwrap())?;
        assert!(matches!(pkt.chunks[0], Chunk::Init(_)));
    }

    now += INIT_RETRANSMIT_TIMEOUT;
    a.handle_timeout(now);
    assert_eq!(AssociationState::Closed, a.state());
    assert_eq!(Some(Event::HandshakeFailed), a.poll_event());
    assert_eq!(None, a.poll_timeout());
    assert!(a.read_packet(MTU)?.is_none(), "no further INIT is queued");
    Ok(())
}

#[test]
fn test_cookie_echo_retransmission() -> Result<()> {
    let now = Instant::now();
    let mut client = create_association(5000, 5001, 11);
    client.associate(now)?;
    client.read_packet(MTU)?;

    let init_ack = ChunkInit {
        is_ack: true,
        initiate_tag: 99,
        advertised_receiver_window_credit: 0xffff,
        num_outbound_streams: 10,
        num_inbound_streams: 10,
        initial_tsn: 0,
        params: vec![Param::StateCookie {
            cookie: Bytes::from_static(b"cookie"),
        }],
    };
    let raw = packet_to(&client, 11, vec![Chunk::Init(init_ack)])?;
    client.write_packet(&raw, now)?;
    client.read_packet(MTU)?; // first COOKIE ECHO

    client.handle_timeout(now + INIT_RETRANSMIT_TIMEOUT);
    let pkt = Packet::unmarshal(&client.read_packet(MTU)?.unwrap())?;
    match &pkt.chunks[0] {
        Chunk::CookieEcho(ce) => assert_eq!(Bytes::from_static(b"cookie"), ce.cookie),
        other => panic!("expected retransmitted COOKIE ECHO, got {:?}", other),
    }
    assert_eq!(AssociationState::CookieEchoed, client.state());
    Ok(())
}

#[test]
fn test_write_packet_rejects_port_mismatch() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    let raw = Packet {
        source_port: 9999,
        destination_port: a.local_port,
        verification_tag: 1,
        chunks: vec![data_chunk(5, 0, b"hello")],
    }
    .marshal()?;

    assert_eq!(
        Error::ErrPacketPortMismatch,
        a.write_packet(&raw, now).unwrap_err()
    );
    Ok(())
}

#[test]
fn test_write_packet_rejects_verification_tag_mismatch() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    let raw = packet_to(&a, 0xdead_beef, vec![data_chunk(5, 0, b"hello")])?;
    assert_eq!(
        Error::ErrPacketVerificationTagMismatch,
        a.write_packet(&raw, now).unwrap_err()
    );
    assert!(a.received_tsns.is_empty(), "no partial processing");
    Ok(())
}

#[test]
fn test_chunk_invalid_for_state_is_ignored() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    // a stray COOKIE ACK in Established changes nothing
    let raw = packet_to(&a, 1, vec![Chunk::CookieAck(ChunkCookieAck)])?;
    a.write_packet(&raw, now)?;
    assert_eq!(AssociationState::Established, a.state());
    assert!(a.read_packet(MTU)?.is_none());
    Ok(())
}

#[test]
fn test_inbound_data_reaches_stream_callback() -> Result<()> {
    let now = Instant::now();
    let mut a = established_association();

    let received = Rc::new(RefCell::new(vec![]));
    let received_tx = Rc::clone(&received);
    a.stream_mut(3).set_on_message(move |ppid, payload| {
        received_tx.borrow_mut().push((ppid, payload.clone()));
    });

    let raw = packet_to(&a, 1, vec![data_chunk(1, 3, b"hello")])?;
    a.write_packet(&raw, now)?;

    let received = received.borrow();
    assert_eq!(1, received.len());
    assert_eq!(PayloadProtocolIdentifier::Binary, received[0].0);
    assert_eq!(Bytes::from_static(b"hello"), received[0].1);
    Ok(())
}

#[test]
fn test_abort_discards_everything() -> Result<()> {
    let now = Instant::now();
    let mut a = create_association(5000, 5001, 1);
    a.associate(now)?;

    a.abort();
    assert_eq!(AssociationState::Closed, a.state());
    assert_eq!(None, a.poll_timeout());
    assert!(a.read_packet(MTU)?.is_none());
    Ok(())
}
