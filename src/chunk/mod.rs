
pub(crate) mod chunk_abort;
pub(crate) mod chunk_cookie_ack;
pub(crate) mod chunk_cookie_echo;
pub(crate) mod chunk_error;
pub(crate) mod chunk_forward_tsn;
pub(crate) mod chunk_header;
pub(crate) mod chunk_heartbeat;
pub(crate) mod chunk_heartbeat_ack;
pub(crate) mod chunk_init;
pub(crate) mod chunk_padding;
pub mod chunk_payload_data;
pub(crate) mod chunk_reconfig;
pub(crate) mod chunk_selective_ack;
pub(crate) mod chunk_shutdown;
pub(crate) mod chunk_shutdown_ack;
pub(crate) mod chunk_shutdown_complete;
pub(crate) mod chunk_type;
pub(crate) mod chunk_unknown;

use std::fmt;

use bytes::{Bytes, BytesMut};
use chunk_header::*;
use chunk_type::*;

use crate::error::Result;

use chunk_abort::ChunkAbort;
use chunk_cookie_ack::ChunkCookieAck;
use chunk_cookie_echo::ChunkCookieEcho;
use chunk_error::ChunkError;
use chunk_forward_tsn::ChunkForwardTsn;
use chunk_heartbeat::ChunkHeartbeat;
use chunk_heartbeat_ack::ChunkHeartbeatAck;
use chunk_init::ChunkInit;
use chunk_padding::ChunkPadding;
use chunk_payload_data::ChunkPayloadData;
use chunk_reconfig::ChunkReconfig;
use chunk_selective_ack::ChunkSelectiveAck;
use chunk_shutdown::ChunkShutdown;
use chunk_shutdown_ack::ChunkShutdownAck;
use chunk_shutdown_complete::ChunkShutdownComplete;
use chunk_unknown::ChunkUnknown;

/// Chunk is the closed set of chunk bodies the engine understands.
///
/// Each variant owns its decoded body; a chunk moves from the packet
/// parser into the association without copying the payload. Types not
/// listed here land in [`Chunk::Unknown`] and are skipped.
#[derive(Debug, Clone)]
pub(crate) enum Chunk {
    PayloadData(ChunkPayloadData),
    /// INIT and INIT ACK share a body, discriminated by `is_ack`.
    Init(ChunkInit),
    SelectiveAck(ChunkSelectiveAck),
    Heartbeat(ChunkHeartbeat),
    HeartbeatAck(ChunkHeartbeatAck),
    Abort(ChunkAbort),
    Shutdown(ChunkShutdown),
    ShutdownAck(ChunkShutdownAck),
    CtError(ChunkError),
    CookieEcho(ChunkCookieEcho),
    CookieAck(ChunkCookieAck),
    ShutdownComplete(ChunkShutdownComplete),
    Padding(ChunkPadding),
    Reconfig(ChunkReconfig),
    ForwardTsn(ChunkForwardTsn),
    Unknown(ChunkUnknown),
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::PayloadData(c) => c.fmt(f),
            Chunk::Init(c) => c.fmt(f),
            Chunk::SelectiveAck(c) => c.fmt(f),
            Chunk::Heartbeat(c) => c.fmt(f),
            Chunk::HeartbeatAck(c) => c.fmt(f),
            Chunk::Abort(c) => c.fmt(f),
            Chunk::Shutdown(c) => c.fmt(f),
            Chunk::ShutdownAck(c) => c.fmt(f),
            Chunk::CtError(c) => c.fmt(f),
            Chunk::CookieEcho(c) => c.fmt(f),
            Chunk::CookieAck(c) => c.fmt(f),
            Chunk::ShutdownComplete(c) => c.fmt(f),
            Chunk::Padding(c) => c.fmt(f),
            Chunk::Reconfig(c) => c.fmt(f),
            Chunk::ForwardTsn(c) => c.fmt(f),
            Chunk::Unknown(c) => c.fmt(f),
        }
    }
}

impl Chunk {
    /// Parses one chunk from the front of `raw`. `raw` may extend past the
    /// chunk; the caller advances by `value_length` plus padding.
    pub(crate) fn unmarshal(raw: &Bytes) -> Result<Self> {
        let header = ChunkHeader::unmarshal(raw)?;
        let c = match header.typ {
            CT_PAYLOAD_DATA => Chunk::PayloadData(ChunkPayloadData::unmarshal(raw)?),
            CT_INIT | CT_INIT_ACK => Chunk::Init(ChunkInit::unmarshal(raw)?),
            CT_SACK => Chunk::SelectiveAck(ChunkSelectiveAck::unmarshal(raw)?),
            CT_HEARTBEAT => Chunk::Heartbeat(ChunkHeartbeat::unmarshal(raw)?),
            CT_HEARTBEAT_ACK => Chunk::HeartbeatAck(ChunkHeartbeatAck::unmarshal(raw)?),
            CT_ABORT => Chunk::Abort(ChunkAbort::unmarshal(raw)?),
            CT_SHUTDOWN => Chunk::Shutdown(ChunkShutdown::unmarshal(raw)?),
            CT_SHUTDOWN_ACK => Chunk::ShutdownAck(ChunkShutdownAck::unmarshal(raw)?),
            CT_ERROR => Chunk::CtError(ChunkError::unmarshal(raw)?),
            CT_COOKIE_ECHO => Chunk::CookieEcho(ChunkCookieEcho::unmarshal(raw)?),
            CT_COOKIE_ACK => Chunk::CookieAck(ChunkCookieAck::unmarshal(raw)?),
            CT_SHUTDOWN_COMPLETE => {
                Chunk::ShutdownComplete(ChunkShutdownComplete::unmarshal(raw)?)
            }
            CT_PAD => Chunk::Padding(ChunkPadding::unmarshal(raw)?),
            CT_RECONFIG => Chunk::Reconfig(ChunkReconfig::unmarshal(raw)?),
            CT_FORWARD_TSN => Chunk::ForwardTsn(ChunkForwardTsn::unmarshal(raw)?),
            _ => Chunk::Unknown(ChunkUnknown::unmarshal(raw)?),
        };
        Ok(c)
    }

    pub(crate) fn header(&self) -> ChunkHeader {
        match self {
            Chunk::PayloadData(c) => c.header(),
            Chunk::Init(c) => c.header(),
            Chunk::SelectiveAck(c) => c.header(),
            Chunk::Heartbeat(c) => c.header(),
            Chunk::HeartbeatAck(c) => c.header(),
            Chunk::Abort(c) => c.header(),
            Chunk::Shutdown(c) => c.header(),
            Chunk::ShutdownAck(c) => c.header(),
            Chunk::CtError(c) => c.header(),
            Chunk::CookieEcho(c) => c.header(),
            Chunk::CookieAck(c) => c.header(),
            Chunk::ShutdownComplete(c) => c.header(),
            Chunk::Padding(c) => c.header(),
            Chunk::Reconfig(c) => c.header(),
            Chunk::ForwardTsn(c) => c.header(),
            Chunk::Unknown(c) => c.header(),
        }
    }

    pub(crate) fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        match self {
            Chunk::PayloadData(c) => c.marshal_to(buf),
            Chunk::Init(c) => c.marshal_to(buf),
            Chunk::SelectiveAck(c) => c.marshal_to(buf),
            Chunk::Heartbeat(c) => c.marshal_to(buf),
            Chunk::HeartbeatAck(c) => c.marshal_to(buf),
            Chunk::Abort(c) => c.marshal_to(buf),
            Chunk::Shutdown(c) => c.marshal_to(buf),
            Chunk::ShutdownAck(c) => c.marshal_to(buf),
            Chunk::CtError(c) => c.marshal_to(buf),
            Chunk::CookieEcho(c) => c.marshal_to(buf),
            Chunk::CookieAck(c) => c.marshal_to(buf),
            Chunk::ShutdownComplete(c) => c.marshal_to(buf),
            Chunk::Padding(c) => c.marshal_to(buf),
            Chunk::Reconfig(c) => c.marshal_to(buf),
            Chunk::ForwardTsn(c) => c.marshal_to(buf),
            Chunk::Unknown(c) => c.marshal_to(buf),
        }
    }

    pub(crate) fn value_length(&self) -> usize {
        match self {
            Chunk::PayloadData(c) => c.value_length(),
            Chunk::Init(c) => c.value_length(),
            Chunk::SelectiveAck(c) => c.value_length(),
            Chunk::Heartbeat(c) => c.value_length(),
            Chunk::HeartbeatAck(c) => c.value_length(),
            Chunk::Abort(c) => c.value_length(),
            Chunk::Shutdown(c) => c.value_length(),
            Chunk::ShutdownAck(c) => c.value_length(),
            Chunk::CtError(c) => c.value_length(),
            Chunk::CookieEcho(c) => c.value_length(),
            Chunk::CookieAck(c) => c.value_length(),
            Chunk::ShutdownComplete(c) => c.value_length(),
            Chunk::Padding(c) => c.value_length(),
            Chunk::Reconfig(c) => c.value_length(),
            Chunk::ForwardTsn(c) => c.value_length(),
            Chunk::Unknown(c) => c.value_length(),
        }
    }

    pub(crate) fn marshal(&self) -> Result<Bytes> {
        let capacity = CHUNK_HEADER_SIZE + self.value_length();
        let mut buf = BytesMut::with_capacity(capacity);
        self.marshal_to(&mut buf)?;
        Ok(buf.freeze())
    }

    /// INIT, INIT ACK and COOKIE ECHO must be the only chunk in the packet
    /// that carries them.
    pub(crate) fn must_be_sent_alone(&self) -> bool {
        matches!(self, Chunk::Init(_) | Chunk::CookieEcho(_))
    }
}
