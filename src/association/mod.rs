#[cfg(test)]
mod association_test;

pub(crate) mod state;
pub(crate) mod timer;

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, trace, warn};
use rand::Rng;

use crate::chunk::chunk_cookie_ack::ChunkCookieAck;
use crate::chunk::chunk_cookie_echo::ChunkCookieEcho;
use crate::chunk::chunk_header::CHUNK_HEADER_SIZE;
use crate::chunk::chunk_init::ChunkInit;
use crate::chunk::chunk_payload_data::ChunkPayloadData;
use crate::chunk::chunk_selective_ack::{ChunkSelectiveAck, GapAckBlock};
use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::packet::{Packet, PACKET_HEADER_SIZE};
use crate::param::Param;
use crate::sequence_number::TsnWrapper;
use crate::stream::Stream;
use crate::util::get_padding_size;

use state::AssociationState;
use timer::{Timer, TimerTable};

/// Retry ceiling shared by the INIT and COOKIE ECHO phases.
pub const MAX_INIT_RETRANSMITS: usize = 10;
/// Fixed retransmission interval for INIT and COOKIE ECHO.
pub const INIT_RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(100);
/// Delayed-SACK interval.
pub const SACK_TIMEOUT: Duration = Duration::from_millis(100);

const DEFAULT_ADVERTISED_RECEIVER_WINDOW_CREDIT: u32 = 0xffff_ffff;
const DEFAULT_NUM_STREAMS: u16 = 0xffff;
const STATE_COOKIE_SIZE: usize = 32;

/// Source of local verification tags.
///
/// Injectable so tests can use a deterministic tag sequence; tags must be
/// drawn from the full nonzero 32-bit range.
pub trait VerificationTagGenerator: Send {
    fn generate_tag(&mut self) -> u32;
}

/// Generates purely random nonzero verification tags.
#[derive(Default, Debug, Clone, Copy)]
pub struct RandomTagGenerator;

impl VerificationTagGenerator for RandomTagGenerator {
    fn generate_tag(&mut self) -> u32 {
        rand::thread_rng().gen_range(1..=u32::MAX)
    }
}

/// Observable association-level events, drained with
/// [`Association::poll_event`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// The four-way handshake completed and the association is Established.
    Connected,
    /// INIT or COOKIE ECHO retransmission hit the retry ceiling; the
    /// association is Closed.
    HandshakeFailed,
}

/// Collects the arguments to `Association::new` into a single structure.
pub struct AssociationConfig {
    pub local_port: u16,
    pub remote_port: u16,
    pub advertised_receiver_window_credit: u32,
    pub tag_generator: Box<dyn VerificationTagGenerator>,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        AssociationConfig {
            local_port: 5000,
            remote_port: 5000,
            advertised_receiver_window_credit: DEFAULT_ADVERTISED_RECEIVER_WINDOW_CREDIT,
            tag_generator: Box::new(RandomTagGenerator),
        }
    }
}

/// A deterministic SCTP association state machine.
///
/// The association performs no I/O and never reads the clock. The embedder
/// feeds received datagrams into [`Association::write_packet`], drains
/// outgoing datagrams with [`Association::read_packet`], and drives timers by
/// calling [`Association::handle_timeout`] when the deadline returned by
/// [`Association::poll_timeout`] passes. All entry points must be invoked
/// from a single logical thread of control.
pub struct Association {
    state: AssociationState,

    local_port: u16,
    remote_port: u16,
    local_verification_tag: u32,
    remote_verification_tag: u32,
    tag_generator: Box<dyn VerificationTagGenerator>,
    advertised_receiver_window_credit: u32,

    queue: VecDeque<Chunk>,
    pending_data: bool,
    on_pending_data: Option<Box<dyn FnMut()>>,

    // extended received TSNs awaiting consolidation into the cumulative ack,
    // kept sorted; duplicates are retained until the next SACK reports them
    received_tsns: Vec<u64>,
    last_received_tsn: Option<u64>,
    tsn_wrapper: TsnWrapper,
    pending_acknowledge: bool,
    acknowledge_now: bool,

    timers: TimerTable,
    stored_init: Option<ChunkInit>,
    stored_cookie_echo: Option<ChunkCookieEcho>,

    events: VecDeque<Event>,
    streams: HashMap<u16, Stream>,
}

impl Association {
    pub fn new(config: AssociationConfig) -> Self {
        Association {
            state: AssociationState::Closed,
            local_port: config.local_port,
            remote_port: config.remote_port,
            local_verification_tag: 0,
            remote_verification_tag: 0,
            tag_generator: config.tag_generator,
            advertised_receiver_window_credit: config.advertised_receiver_window_credit,
            queue: VecDeque::new(),
            pending_data: false,
            on_pending_data: None,
            received_tsns: vec![],
            last_received_tsn: None,
            tsn_wrapper: TsnWrapper::default(),
            pending_acknowledge: false,
            acknowledge_now: false,
            timers: TimerTable::new(MAX_INIT_RETRANSMITS),
            stored_init: None,
            stored_cookie_echo: None,
            events: VecDeque::new(),
            streams: HashMap::new(),
        }
    }

    pub fn state(&self) -> AssociationState {
        self.state
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn remote_port(&self) -> u16 {
        self.remote_port
    }

    /// Registers the edge-triggered callback invoked when the outgoing queue
    /// transitions from empty to nonempty.
    pub fn set_on_pending_data<F>(&mut self, on_pending_data: F)
    where
        F: FnMut() + 'static,
    {
        self.on_pending_data = Some(Box::new(on_pending_data));
    }

    /// Next association-level event, if any.
    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Earliest pending timer deadline, if any.
    pub fn poll_timeout(&self) -> Option<Instant> {
        self.timers.next_timeout()
    }

    pub fn stream(&self, stream_identifier: u16) -> Option<&Stream> {
        self.streams.get(&stream_identifier)
    }

    /// The stream with the given identifier, created on first use.
    pub fn stream_mut(&mut self, stream_identifier: u16) -> &mut Stream {
        self.streams
            .entry(stream_identifier)
            .or_insert_with(|| Stream::new(stream_identifier))
    }

    /// Starts the active open: generates a fresh nonzero local verification
    /// tag, enqueues INIT and arms the T1-init timer.
    pub fn associate(&mut self, now: Instant) -> Result<()> {
        if self.state != AssociationState::Closed {
            return Err(Error::ErrAssociationNotClosed);
        }

        self.local_verification_tag = self.tag_generator.generate_tag();

        let mut init = ChunkInit {
            is_ack: false,
            initiate_tag: self.local_verification_tag,
            advertised_receiver_window_credit: self.advertised_receiver_window_credit,
            num_outbound_streams: DEFAULT_NUM_STREAMS,
            num_inbound_streams: DEFAULT_NUM_STREAMS,
            initial_tsn: 0,
            params: vec![],
        };
        init.set_supported_extensions();

        self.stored_init = Some(init.clone());
        self.enqueue(Chunk::Init(init));
        self.timers.start(Timer::T1Init, now, INIT_RETRANSMIT_TIMEOUT);
        self.set_state(AssociationState::CookieWait);
        Ok(())
    }

    /// Closes the association unconditionally. No further chunks are sent or
    /// accepted, queued data is discarded and all timers stop.
    pub fn abort(&mut self) {
        debug!("[{}] aborting association", self.local_port);
        self.queue.clear();
        self.pending_data = false;
        for timer in Timer::VALUES {
            self.timers.stop(timer);
        }
        self.stored_init = None;
        self.stored_cookie_echo = None;
        self.pending_acknowledge = false;
        self.acknowledge_now = false;
        self.set_state(AssociationState::Closed);
    }

    /// Ingests one received datagram.
    ///
    /// The packet is rejected as a whole on checksum, port or
    /// verification-tag mismatch. Parsed chunks are dispatched to the state
    /// machine; afterwards a pending acknowledgement is either emitted
    /// immediately or deferred to the delayed-SACK timer.
    pub fn write_packet(&mut self, raw: &Bytes, now: Instant) -> Result<()> {
        let packet = Packet::unmarshal(raw)?;
        packet.check_packet()?;

        if packet.source_port != self.remote_port || packet.destination_port != self.local_port {
            return Err(Error::ErrPacketPortMismatch);
        }

        // An INIT carries a zero verification tag since our tag is not yet
        // known to the peer; everything else must carry our local tag.
        let has_init = packet
            .chunks
            .iter()
            .any(|c| matches!(c, Chunk::Init(ci) if !ci.is_ack));
        if !has_init && packet.verification_tag != self.local_verification_tag {
            return Err(Error::ErrPacketVerificationTagMismatch);
        }

        for chunk in packet.chunks {
            self.process(chunk, now);
        }

        if self.pending_acknowledge {
            if self.acknowledge_now {
                self.acknowledge();
            } else if self.timers.get(Timer::Ack).is_none() {
                self.timers.start(Timer::Ack, now, SACK_TIMEOUT);
            }
        }

        Ok(())
    }

    /// Drains queued chunks into one serialized packet of at most `capacity`
    /// bytes, or `None` when nothing is pending.
    ///
    /// INIT, INIT ACK and COOKIE ECHO are emitted as the sole chunk of their
    /// packet; the fill stops early when one is queued behind other chunks.
    pub fn read_packet(&mut self, capacity: usize) -> Result<Option<Bytes>> {
        if self.queue.is_empty() || capacity < PACKET_HEADER_SIZE {
            return Ok(None);
        }

        let mut chunks = vec![];
        let mut remaining = capacity - PACKET_HEADER_SIZE;
        while let Some(front) = self.queue.front() {
            let padded_size =
                CHUNK_HEADER_SIZE + front.value_length() + get_padding_size(front.value_length());
            if padded_size > remaining {
                break;
            }
            let alone = front.must_be_sent_alone();
            if alone && !chunks.is_empty() {
                break;
            }

            if let Some(chunk) = self.queue.pop_front() {
                remaining -= padded_size;
                chunks.push(chunk);
            }
            if alone {
                break;
            }
        }

        if chunks.is_empty() {
            return Ok(None);
        }

        let packet = Packet {
            source_port: self.local_port,
            destination_port: self.remote_port,
            verification_tag: self.remote_verification_tag,
            chunks,
        };
        let raw = packet.marshal()?;

        if self.queue.is_empty() {
            self.pending_data = false;
        }
        Ok(Some(raw))
    }

    /// Fires every expired timer.
    ///
    /// T1-init and T1-cookie re-enqueue their stored chunk and re-arm while
    /// retries remain, otherwise the handshake fails and the association
    /// closes. The Ack timer emits the delayed SACK.
    pub fn handle_timeout(&mut self, now: Instant) {
        for timer in Timer::VALUES {
            let (expired, failure, n_rtos) = self.timers.is_expired(timer, now);
            if !expired {
                continue;
            }

            match timer {
                Timer::T1Init => {
                    if failure {
                        self.handshake_failed(timer);
                    } else {
                        debug!("[{}] retransmitting INIT, try {}", self.local_port, n_rtos);
                        if let Some(init) = self.stored_init.clone() {
                            self.enqueue(Chunk::Init(init));
                        }
                        self.timers.start(timer, now, INIT_RETRANSMIT_TIMEOUT);
                    }
                }
                Timer::T1Cookie => {
                    if failure {
                        self.handshake_failed(timer);
                    } else {
                        debug!(
                            "[{}] retransmitting COOKIE-ECHO, try {}",
                            self.local_port, n_rtos
                        );
                        if let Some(cookie_echo) = self.stored_cookie_echo.clone() {
                            self.enqueue(Chunk::CookieEcho(cookie_echo));
                        }
                        self.timers.start(timer, now, INIT_RETRANSMIT_TIMEOUT);
                    }
                }
                Timer::Ack => {
                    self.timers.stop(timer);
                    if self.pending_acknowledge {
                        self.acknowledge();
                    }
                }
            }
        }
    }

    fn handshake_failed(&mut self, timer: Timer) {
        warn!(
            "[{}] handshake failed, {:?} retransmission limit reached",
            self.local_port, timer
        );
        self.timers.stop(timer);
        self.stored_init = None;
        self.stored_cookie_echo = None;
        self.set_state(AssociationState::Closed);
        self.events.push_back(Event::HandshakeFailed);
    }

    fn set_state(&mut self, new_state: AssociationState) {
        if new_state != self.state {
            debug!(
                "[{}] state change: {} => {}",
                self.local_port, self.state, new_state
            );
        }
        self.state = new_state;
    }

    /// Appends a chunk to the outgoing queue, invoking the pending-data
    /// callback on the empty to nonempty transition only.
    fn enqueue(&mut self, chunk: Chunk) {
        self.queue.push_back(chunk);
        if !self.pending_data {
            self.pending_data = true;
            if let Some(on_pending_data) = &mut self.on_pending_data {
                on_pending_data();
            }
        }
    }

    /// Dispatches one parsed chunk according to the current state. Chunk
    /// types not valid for the state are logged and ignored.
    fn process(&mut self, chunk: Chunk, now: Instant) {
        trace!("[{}] processing chunk {}", self.local_port, chunk);
        match (self.state, chunk) {
            (AssociationState::Closed, Chunk::Init(init)) if !init.is_ack => {
                self.handle_init(&init);
            }
            (AssociationState::Closed, Chunk::CookieEcho(_)) => {
                self.enqueue(Chunk::CookieAck(ChunkCookieAck));
                self.set_state(AssociationState::Established);
                self.events.push_back(Event::Connected);
            }
            (AssociationState::CookieWait, Chunk::Init(init_ack)) if init_ack.is_ack => {
                self.handle_init_ack(&init_ack, now);
            }
            (AssociationState::CookieEchoed, Chunk::CookieAck(_)) => {
                self.timers.stop(Timer::T1Cookie);
                self.stored_cookie_echo = None;
                self.set_state(AssociationState::Established);
                self.events.push_back(Event::Connected);
            }
            (AssociationState::Established, Chunk::PayloadData(data)) => {
                self.handle_data(&data);
            }
            (state, chunk) => {
                warn!(
                    "[{}] ignoring chunk {} in state {}",
                    self.local_port, chunk, state
                );
            }
        }
    }

    /// Passive open: adopts the peer's initiate tag, generates our own and
    /// answers with an INIT ACK carrying the state cookie. The association
    /// stays Closed until the COOKIE ECHO arrives.
    fn handle_init(&mut self, init: &ChunkInit) {
        if let Err(err) = init.check() {
            warn!("[{}] invalid INIT, ignoring: {}", self.local_port, err);
            return;
        }

        self.remote_verification_tag = init.initiate_tag;
        self.local_verification_tag = self.tag_generator.generate_tag();

        // The cookie is opaque to the peer; peer authentication is delegated
        // to the outer DTLS transport, so random bytes suffice.
        let mut cookie = vec![0u8; STATE_COOKIE_SIZE];
        rand::thread_rng().fill(&mut cookie[..]);

        let mut init_ack = ChunkInit {
            is_ack: true,
            initiate_tag: self.local_verification_tag,
            advertised_receiver_window_credit: self.advertised_receiver_window_credit,
            num_outbound_streams: DEFAULT_NUM_STREAMS,
            num_inbound_streams: DEFAULT_NUM_STREAMS,
            initial_tsn: 0,
            params: vec![Param::StateCookie {
                cookie: Bytes::from(cookie),
            }],
        };
        init_ack.set_supported_extensions();
        match init.unrecognized_param_echoes() {
            Ok(echoes) => init_ack.params.extend(echoes),
            Err(err) => warn!(
                "[{}] failed to echo unrecognized INIT params: {}",
                self.local_port, err
            ),
        }

        self.enqueue(Chunk::Init(init_ack));
    }

    fn handle_init_ack(&mut self, init_ack: &ChunkInit, now: Instant) {
        if let Err(err) = init_ack.check() {
            warn!("[{}] invalid INIT ACK, ignoring: {}", self.local_port, err);
            return;
        }
        let cookie = match init_ack.state_cookie() {
            Some(cookie) => cookie,
            None => {
                warn!(
                    "[{}] INIT ACK without state cookie, ignoring: {}",
                    self.local_port,
                    Error::ErrInitAckNoCookie
                );
                return;
            }
        };

        self.timers.stop(Timer::T1Init);
        self.stored_init = None;
        self.remote_verification_tag = init_ack.initiate_tag;

        let cookie_echo = ChunkCookieEcho { cookie };
        self.stored_cookie_echo = Some(cookie_echo.clone());
        self.enqueue(Chunk::CookieEcho(cookie_echo));
        self.timers.start(Timer::T1Cookie, now, INIT_RETRANSMIT_TIMEOUT);
        self.set_state(AssociationState::CookieEchoed);
    }

    /// SACK bookkeeping for one received DATA chunk, then delivery to the
    /// addressed stream.
    ///
    /// The acknowledgement is sent immediately when this is the first DATA
    /// ever received, the received sequence has a gap, the TSN is a
    /// duplicate, or a delayed SACK is already scheduled; otherwise it is
    /// deferred by `SACK_TIMEOUT`.
    fn handle_data(&mut self, data: &ChunkPayloadData) {
        let first_data = self.last_received_tsn.is_none() && self.received_tsns.is_empty();
        let ext = self.tsn_wrapper.wrap(u64::from(data.tsn));

        let pos = self.received_tsns.partition_point(|&x| x < ext);
        let duplicate = self.received_tsns.get(pos) == Some(&ext)
            || self.last_received_tsn.map_or(false, |cum| ext <= cum);
        self.received_tsns.insert(pos, ext);

        let gap = self.has_gap();
        let sack_pending = self.timers.get(Timer::Ack).is_some();

        self.pending_acknowledge = true;
        if first_data || gap || duplicate || sack_pending {
            self.acknowledge_now = true;
        }
        trace!(
            "[{}] DATA tsn={} first={} gap={} duplicate={}",
            self.local_port,
            data.tsn,
            first_data,
            gap,
            duplicate
        );

        let stream = self
            .streams
            .entry(data.stream_identifier)
            .or_insert_with(|| Stream::new(data.stream_identifier));
        stream.recv(data.payload_type, &data.user_data);
    }

    fn has_gap(&self) -> bool {
        let mut prev = self.last_received_tsn;
        for &ext in &self.received_tsns {
            if let Some(p) = prev {
                if ext > p + 1 {
                    return true;
                }
            }
            prev = Some(ext);
        }
        false
    }

    /// Emits one SACK consolidating everything received so far.
    ///
    /// Walks the sorted received TSNs advancing the cumulative ack while the
    /// sequence is contiguous, collecting gap-ack blocks as 16-bit offsets
    /// relative to the cumulative ack and duplicates into the duplicate-TSN
    /// list. Entries covered by the cumulative ack are erased; gap-covered
    /// entries remain until the sequence becomes contiguous.
    fn acknowledge(&mut self) {
        let mut cumulative = self.last_received_tsn;
        let mut gap_blocks: Vec<(u64, u64)> = vec![];
        let mut open_block: Option<(u64, u64)> = None;
        let mut duplicate_tsn: Vec<u32> = vec![];
        let mut prev: Option<u64> = None;

        for &ext in &self.received_tsns {
            if prev == Some(ext) {
                duplicate_tsn.push(self.tsn_wrapper.unwrap(ext) as u32);
                continue;
            }
            prev = Some(ext);

            match cumulative {
                None => cumulative = Some(ext),
                Some(cum) if ext <= cum => {
                    duplicate_tsn.push(self.tsn_wrapper.unwrap(ext) as u32);
                }
                Some(cum) => {
                    if open_block.is_none() && ext == cum + 1 {
                        cumulative = Some(ext);
                    } else {
                        match &mut open_block {
                            Some((_, end)) if ext == *end + 1 => *end = ext,
                            Some(block) => {
                                gap_blocks.push(*block);
                                open_block = Some((ext, ext));
                            }
                            None => open_block = Some((ext, ext)),
                        }
                    }
                }
            }
        }
        if let Some(block) = open_block {
            gap_blocks.push(block);
        }

        let cumulative = match cumulative {
            Some(cumulative) => cumulative,
            // no DATA received yet, nothing to acknowledge
            None => return,
        };

        self.last_received_tsn = Some(cumulative);
        self.received_tsns.retain(|&ext| ext > cumulative);

        // Gap offsets are 16-bit relative to the cumulative ack; a receive
        // window wider than 65535 TSNs cannot be represented on the wire.
        let gap_ack_blocks = gap_blocks
            .iter()
            .map(|&(start, end)| GapAckBlock {
                start: (start - cumulative) as u16,
                end: (end - cumulative) as u16,
            })
            .collect::<Vec<_>>();

        let sack = ChunkSelectiveAck {
            cumulative_tsn_ack: self.tsn_wrapper.unwrap(cumulative) as u32,
            advertised_receiver_window_credit: self.advertised_receiver_window_credit,
            gap_ack_blocks,
            duplicate_tsn,
        };
        debug!("[{}] sending SACK {}", self.local_port, sack);
        self.enqueue(Chunk::SelectiveAck(sack));

        self.timers.stop(Timer::Ack);
        self.pending_acknowledge = false;
        self.acknowledge_now = false;
    }
}
