#[cfg(test)]
mod param_test;

pub(crate) mod param_header;
pub(crate) mod param_type;

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use param_header::*;
use param_type::*;

use crate::chunk::chunk_type::ChunkType;
use crate::error::{Error, Result};

/// Param is one type-length-value parameter carried in an INIT, INIT ACK or
/// HEARTBEAT chunk.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Parameter Type       |       Parameter Length        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// \                                                               \
/// /                       Parameter Value                         /
/// \                                                               \
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// The length field covers type, length and value but not the padding that
/// aligns the next parameter to a 4-byte boundary. Parameter types the
/// receiver does not implement become [`Param::Unknown`] so they can be
/// echoed back where the type's upper bits ask for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Param {
    HeartbeatInfo {
        value: Bytes,
    },
    Ipv4Address {
        addr: [u8; 4],
    },
    Ipv6Address {
        addr: [u8; 16],
    },
    StateCookie {
        cookie: Bytes,
    },
    /// Carries the raw TLV of a parameter the sender did not recognize.
    Unrecognized {
        raw: Bytes,
    },
    CookiePreservative {
        life_span_increment: u32,
    },
    HostName {
        name: Bytes,
    },
    SupportedAddressTypes {
        address_types: Vec<u16>,
    },
    Padding {
        length: usize,
    },
    SupportedExtensions {
        chunk_types: Vec<ChunkType>,
    },
    ForwardTsnSupported,
    Unknown {
        typ: u16,
        value: Bytes,
    },
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.param_type())
    }
}

impl Param {
    pub(crate) fn param_type(&self) -> ParamType {
        match self {
            Param::HeartbeatInfo { .. } => ParamType::HeartbeatInfo,
            Param::Ipv4Address { .. } => ParamType::Ipv4Addr,
            Param::Ipv6Address { .. } => ParamType::Ipv6Addr,
            Param::StateCookie { .. } => ParamType::StateCookie,
            Param::Unrecognized { .. } => ParamType::UnrecognizedParam,
            Param::CookiePreservative { .. } => ParamType::CookiePreservative,
            Param::HostName { .. } => ParamType::HostNameAddr,
            Param::SupportedAddressTypes { .. } => ParamType::SupportedAddrTypes,
            Param::Padding { .. } => ParamType::Padding,
            Param::SupportedExtensions { .. } => ParamType::SupportedExt,
            Param::ForwardTsnSupported => ParamType::ForwardTsnSupp,
            Param::Unknown { typ, .. } => ParamType::Unknown { param_type: *typ },
        }
    }

    pub(crate) fn header(&self) -> ParamHeader {
        ParamHeader {
            typ: self.param_type(),
            value_length: self.value_length() as u16,
        }
    }

    pub(crate) fn value_length(&self) -> usize {
        match self {
            Param::HeartbeatInfo { value } => value.len(),
            Param::Ipv4Address { .. } => 4,
            Param::Ipv6Address { .. } => 16,
            Param::StateCookie { cookie } => cookie.len(),
            Param::Unrecognized { raw } => raw.len(),
            Param::CookiePreservative { .. } => 4,
            Param::HostName { name } => name.len(),
            Param::SupportedAddressTypes { address_types } => 2 * address_types.len(),
            Param::Padding { length } => *length,
            Param::SupportedExtensions { chunk_types } => chunk_types.len(),
            Param::ForwardTsnSupported => 0,
            Param::Unknown { value, .. } => value.len(),
        }
    }

    /// Parses one parameter from the front of `raw`. `raw` may extend past
    /// the parameter; the caller advances by `value_length` plus padding.
    pub(crate) fn unmarshal(raw: &Bytes) -> Result<Self> {
        let header = ParamHeader::unmarshal(raw)?;
        let value = raw.slice(PARAM_HEADER_LENGTH..PARAM_HEADER_LENGTH + header.value_length());

        let param = match header.typ {
            ParamType::HeartbeatInfo => Param::HeartbeatInfo { value },
            ParamType::Ipv4Addr => {
                if value.len() != 4 {
                    return Err(Error::ErrParamValueInvalidLength);
                }
                let mut addr = [0u8; 4];
                addr.copy_from_slice(&value);
                Param::Ipv4Address { addr }
            }
            ParamType::Ipv6Addr => {
                if value.len() != 16 {
                    return Err(Error::ErrParamValueInvalidLength);
                }
                let mut addr = [0u8; 16];
                addr.copy_from_slice(&value);
                Param::Ipv6Address { addr }
            }
            ParamType::StateCookie => Param::StateCookie { cookie: value },
            ParamType::UnrecognizedParam => Param::Unrecognized { raw: value },
            ParamType::CookiePreservative => {
                if value.len() != 4 {
                    return Err(Error::ErrParamValueInvalidLength);
                }
                let reader = &mut value.clone();
                Param::CookiePreservative {
                    life_span_increment: reader.get_u32(),
                }
            }
            ParamType::HostNameAddr => Param::HostName { name: value },
            ParamType::SupportedAddrTypes => {
                if value.len() % 2 != 0 {
                    return Err(Error::ErrParamValueInvalidLength);
                }
                let reader = &mut value.clone();
                let mut address_types = Vec::with_capacity(value.len() / 2);
                while reader.remaining() >= 2 {
                    address_types.push(reader.get_u16());
                }
                Param::SupportedAddressTypes { address_types }
            }
            ParamType::Padding => Param::Padding {
                length: value.len(),
            },
            ParamType::SupportedExt => Param::SupportedExtensions {
                chunk_types: value.iter().map(|b| ChunkType(*b)).collect(),
            },
            ParamType::ForwardTsnSupp => {
                if !value.is_empty() {
                    return Err(Error::ErrParamValueInvalidLength);
                }
                Param::ForwardTsnSupported
            }
            typ => Param::Unknown {
                typ: typ.into(),
                value,
            },
        };

        Ok(param)
    }

    /// Writes the parameter without trailing padding. The caller pads the
    /// stream to the next 4-byte boundary.
    pub(crate) fn marshal_to(&self, writer: &mut BytesMut) -> Result<usize> {
        self.header().marshal_to(writer)?;
        match self {
            Param::HeartbeatInfo { value } => writer.extend_from_slice(value),
            Param::Ipv4Address { addr } => writer.extend_from_slice(addr),
            Param::Ipv6Address { addr } => writer.extend_from_slice(addr),
            Param::StateCookie { cookie } => writer.extend_from_slice(cookie),
            Param::Unrecognized { raw } => writer.extend_from_slice(raw),
            Param::CookiePreservative {
                life_span_increment,
            } => writer.put_u32(*life_span_increment),
            Param::HostName { name } => writer.extend_from_slice(name),
            Param::SupportedAddressTypes { address_types } => {
                for at in address_types {
                    writer.put_u16(*at);
                }
            }
            Param::Padding { length } => writer.extend_from_slice(&vec![0u8; *length]),
            Param::SupportedExtensions { chunk_types } => {
                for ct in chunk_types {
                    writer.put_u8(ct.0);
                }
            }
            Param::ForwardTsnSupported => {}
            Param::Unknown { value, .. } => writer.extend_from_slice(value),
        }
        Ok(writer.len())
    }

    pub(crate) fn marshal(&self) -> Result<Bytes> {
        let capacity = PARAM_HEADER_LENGTH + self.value_length();
        let mut buf = BytesMut::with_capacity(capacity);
        self.marshal_to(&mut buf)?;
        Ok(buf.freeze())
    }
}
