use std::fmt::{Debug, Display, Formatter};

use bytes::{Bytes, BytesMut};

use crate::chunk::chunk_header::{ChunkHeader, CHUNK_HEADER_SIZE};
use crate::error::Result;

/// A chunk whose type the engine does not implement. The raw value is
/// kept so the chunk can be skipped without losing packet framing.
#[derive(Clone, Debug)]
pub(crate) struct ChunkUnknown {
    pub(crate) hdr: ChunkHeader,
    pub(crate) value: Bytes,
}

impl Display for ChunkUnknown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChunkUnknown( {} {:?} )", self.hdr, self.value)
    }
}

impl ChunkUnknown {
    pub(crate) fn header(&self) -> ChunkHeader {
        self.hdr.clone()
    }

    pub(crate) fn unmarshal(raw: &Bytes) -> Result<Self> {
        let header = ChunkHeader::unmarshal(raw)?;
        let len = header.value_length();
        Ok(Self {
            hdr: header,
            value: raw.slice(CHUNK_HEADER_SIZE..CHUNK_HEADER_SIZE + len),
        })
    }

    pub(crate) fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        self.header().marshal_to(buf)?;
        buf.extend(&self.value);
        Ok(buf.len())
    }

    pub(crate) fn value_length(&self) -> usize {
        self.value.len()
    }
}
