use std::collections::VecDeque;
use std::fmt;

use bytes::Bytes;

use crate::chunk::chunk_payload_data::PayloadProtocolIdentifier;
use crate::error::{Error, Result};

/// Upper bound on messages queued per stream before `send` starts failing.
pub const MAX_OUTGOING_MESSAGES: usize = 128;

pub(crate) type OnMessageFn = Box<dyn FnMut(PayloadProtocolIdentifier, &Bytes)>;

/// One SCTP stream inside an association.
///
/// Streams hold an outgoing message queue the embedder drains with
/// [`Stream::poll_outgoing`] and a receive callback the association invokes
/// for inbound DATA addressed to the stream's identifier.
#[derive(Default)]
pub struct Stream {
    stream_identifier: u16,
    outgoing: VecDeque<(PayloadProtocolIdentifier, Bytes)>,
    on_message: Option<OnMessageFn>,
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("stream_identifier", &self.stream_identifier)
            .field("outgoing", &self.outgoing.len())
            .finish()
    }
}

impl Stream {
    pub(crate) fn new(stream_identifier: u16) -> Self {
        Stream {
            stream_identifier,
            ..Default::default()
        }
    }

    pub fn stream_identifier(&self) -> u16 {
        self.stream_identifier
    }

    /// Queues one outgoing message.
    ///
    /// SCTP DATA payloads cannot be empty, so an empty message is replaced by
    /// a single zero byte with the matching Empty payload protocol identifier
    /// per draft-ietf-rtcweb-data-channel.
    pub fn send(&mut self, ppid: PayloadProtocolIdentifier, data: Bytes) -> Result<()> {
        if self.outgoing.len() >= MAX_OUTGOING_MESSAGES {
            return Err(Error::ErrStreamQueueFull);
        }

        let (ppid, data) = if data.is_empty() {
            let ppid = match ppid {
                PayloadProtocolIdentifier::String => PayloadProtocolIdentifier::StringEmpty,
                PayloadProtocolIdentifier::Binary => PayloadProtocolIdentifier::BinaryEmpty,
                other => other,
            };
            (ppid, Bytes::from_static(&[0]))
        } else {
            (ppid, data)
        };

        self.outgoing.push_back((ppid, data));
        Ok(())
    }

    /// Next queued outgoing message, if any.
    pub fn poll_outgoing(&mut self) -> Option<(PayloadProtocolIdentifier, Bytes)> {
        self.outgoing.pop_front()
    }

    pub fn set_on_message<F>(&mut self, on_message: F)
    where
        F: FnMut(PayloadProtocolIdentifier, &Bytes) + 'static,
    {
        self.on_message = Some(Box::new(on_message));
    }

    /// Hands an inbound DATA payload to the registered callback, if any.
    pub(crate) fn recv(&mut self, ppid: PayloadProtocolIdentifier, payload: &Bytes) {
        if let Some(on_message) = &mut self.on_message {
            on_message(ppid, payload);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_stream_send_empty_message_placeholder() -> Result<()> {
        let mut s = Stream::new(1);
        s.send(PayloadProtocolIdentifier::String, Bytes::new())?;
        s.send(PayloadProtocolIdentifier::Binary, Bytes::new())?;

        let (ppid, data) = s.poll_outgoing().unwrap();
        assert_eq!(PayloadProtocolIdentifier::StringEmpty, ppid);
        assert_eq!(Bytes::from_static(&[0]), data);

        let (ppid, data) = s.poll_outgoing().unwrap();
        assert_eq!(PayloadProtocolIdentifier::BinaryEmpty, ppid);
        assert_eq!(Bytes::from_static(&[0]), data);

        assert!(s.poll_outgoing().is_none());
        Ok(())
    }

    #[test]
    fn test_stream_send_queue_bound() -> Result<()> {
        let mut s = Stream::new(1);
        for _ in 0..MAX_OUTGOING_MESSAGES {
            s.send(PayloadProtocolIdentifier::Binary, Bytes::from_static(&[1, 2, 3]))?;
        }
        let result = s.send(PayloadProtocolIdentifier::Binary, Bytes::from_static(&[4]));
        assert_eq!(Error::ErrStreamQueueFull, result.unwrap_err());

        s.poll_outgoing();
        s.send(PayloadProtocolIdentifier::Binary, Bytes::from_static(&[4]))?;
        Ok(())
    }

    #[test]
    fn test_stream_recv_invokes_callback() {
        let mut s = Stream::new(7);
        let received = Rc::new(RefCell::new(vec![]));

        let received_tx = Rc::clone(&received);
        s.set_on_message(move |ppid, payload| {
            received_tx.borrow_mut().push((ppid, payload.clone()));
        });

        let payload = Bytes::from_static(b"ping");
        s.recv(PayloadProtocolIdentifier::Binary, &payload);

        let received = received.borrow();
        assert_eq!(1, received.len());
        assert_eq!(PayloadProtocolIdentifier::Binary, received[0].0);
        assert_eq!(payload, received[0].1);
    }
}
