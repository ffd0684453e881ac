use std::fmt;

use bytes::{Bytes, BytesMut};

use super::chunk_header::*;
use super::chunk_type::*;
use crate::error::{Error, Result};
use crate::param::param_header::*;
use crate::util::get_padding_size;

///https://tools.ietf.org/html/rfc6525#section-3.1
///chunkReconfig represents an SCTP Chunk used to reconfigure streams.
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///| Type = 130    |  Chunk Flags  |      Chunk Length             |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                                                               |
///|                  Re-configuration Parameter                   |
///|                                                               |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                                                               |
///|             Re-configuration Parameter (optional)             |
///|                                                               |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// Each parameter is kept as its raw TLV. Request and response parameter
/// interpretation is left to the association layer.
#[derive(Default, Debug, Clone)]
pub(crate) struct ChunkReconfig {
    pub(crate) param_a: Option<Bytes>,
    pub(crate) param_b: Option<Bytes>,
}

/// makes chunkReconfig printable
impl fmt::Display for ChunkReconfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut res = String::new();
        if let Some(param_a) = &self.param_a {
            res += format!("Param A: {} bytes", param_a.len()).as_str();
        }
        if let Some(param_b) = &self.param_b {
            res += format!(" Param B: {} bytes", param_b.len()).as_str()
        }
        write!(f, "{}", res)
    }
}

impl ChunkReconfig {
    pub(crate) fn header(&self) -> ChunkHeader {
        ChunkHeader {
            typ: CT_RECONFIG,
            flags: 0,
            value_length: self.value_length() as u16,
        }
    }

    pub(crate) fn unmarshal(raw: &Bytes) -> Result<Self> {
        let header = ChunkHeader::unmarshal(raw)?;

        if header.typ != CT_RECONFIG {
            return Err(Error::ErrChunkTypeNotReconfig);
        }

        let value_end = CHUNK_HEADER_SIZE + header.value_length();

        let param_a_header = ParamHeader::unmarshal(&raw.slice(CHUNK_HEADER_SIZE..value_end))?;
        let param_a_len = PARAM_HEADER_LENGTH + param_a_header.value_length();
        let param_a = raw.slice(CHUNK_HEADER_SIZE..CHUNK_HEADER_SIZE + param_a_len);

        let padding = get_padding_size(param_a_len);
        let offset = CHUNK_HEADER_SIZE + param_a_len + padding;
        let param_b = if value_end > offset {
            let param_b_header = ParamHeader::unmarshal(&raw.slice(offset..value_end))?;
            let param_b_len = PARAM_HEADER_LENGTH + param_b_header.value_length();
            Some(raw.slice(offset..offset + param_b_len))
        } else {
            None
        };

        Ok(ChunkReconfig {
            param_a: Some(param_a),
            param_b,
        })
    }

    pub(crate) fn marshal_to(&self, writer: &mut BytesMut) -> Result<usize> {
        self.header().marshal_to(writer)?;

        let param_a_length = if let Some(param_a) = &self.param_a {
            writer.extend_from_slice(param_a);
            param_a.len()
        } else {
            return Err(Error::ErrChunkReconfigInvalidParamA);
        };

        if let Some(param_b) = &self.param_b {
            // Pad param A
            let padding = get_padding_size(param_a_length);
            writer.extend(vec![0u8; padding]);
            writer.extend_from_slice(param_b);
        }
        Ok(writer.len())
    }

    pub(crate) fn value_length(&self) -> usize {
        let param_a_length = self.param_a.as_ref().map_or(0, |p| p.len());
        let mut l = param_a_length;
        if let Some(param_b) = &self.param_b {
            l += param_b.len() + get_padding_size(param_a_length);
        }
        l
    }
}
