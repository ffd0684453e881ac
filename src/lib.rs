//! Sans-IO SCTP association engine for WebRTC data channels
//!
//! [SCTP](https://en.wikipedia.org/wiki/Stream_Control_Transmission_Protocol), defined in RFC 4960,
//! is used in WebRTC for peer-to-peer arbitrary data delivery across browsers. WebRTC runs it as an
//! application layer protocol on top of a DTLS connection.
//!
//! This crate contains a deterministic implementation of the association state
//! machine: the four-way handshake, selective acknowledgement with gap-block
//! reporting, and duplicate/gap detection over an unreliable datagram transport
//! supplied by the caller. It performs no networking of its own and never reads
//! the system clock. The embedder feeds received datagrams into
//! [`Association::write_packet`], drains outgoing datagrams with
//! [`Association::read_packet`], and drives retransmission and delayed-SACK
//! timers through [`Association::poll_timeout`] / [`Association::handle_timeout`].

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

mod association;
mod error;
mod error_cause;
mod packet;
mod sequence_number;
mod stream;
mod util;

pub(crate) mod chunk;
pub(crate) mod param;

pub use crate::association::state::AssociationState;
pub use crate::association::{
    Association, AssociationConfig, Event, RandomTagGenerator, VerificationTagGenerator,
    INIT_RETRANSMIT_TIMEOUT, MAX_INIT_RETRANSMITS, SACK_TIMEOUT,
};
pub use crate::chunk::chunk_payload_data::PayloadProtocolIdentifier;
pub use crate::error::{Error, Result};
pub use crate::sequence_number::{SequenceNumberWrapper, SsnWrapper, TsnWrapper};
pub use crate::stream::{Stream, MAX_OUTGOING_MESSAGES};
