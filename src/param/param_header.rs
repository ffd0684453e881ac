use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::param_type::ParamType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParamHeader {
    pub(crate) typ: ParamType,
    pub(crate) value_length: u16,
}

pub(crate) const PARAM_HEADER_LENGTH: usize = 4;

/// String makes paramHeader printable
impl fmt::Display for ParamHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl ParamHeader {
    pub(crate) fn unmarshal(raw: &Bytes) -> Result<Self> {
        if raw.len() < PARAM_HEADER_LENGTH {
            return Err(Error::ErrParamHeaderTooShort);
        }

        let reader = &mut raw.clone();

        let typ: ParamType = reader.get_u16().into();

        let len = reader.get_u16() as usize;
        if len < PARAM_HEADER_LENGTH {
            return Err(Error::ErrParamHeaderTooShort);
        }
        if raw.len() < len {
            return Err(Error::ErrParamHeaderSelfReportedLengthLonger);
        }

        Ok(ParamHeader {
            typ,
            value_length: (len - PARAM_HEADER_LENGTH) as u16,
        })
    }

    pub(crate) fn marshal_to(&self, writer: &mut BytesMut) -> Result<usize> {
        writer.put_u16(self.typ.into());
        writer.put_u16(self.value_length + PARAM_HEADER_LENGTH as u16);
        Ok(writer.len())
    }

    pub(crate) fn value_length(&self) -> usize {
        self.value_length as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_header_unmarshal() -> Result<()> {
        let raw = Bytes::from_static(&[0x00, 0x07, 0x00, 0x08, 0xde, 0xad, 0xbe, 0xef]);
        let header = ParamHeader::unmarshal(&raw)?;
        assert_eq!(ParamType::StateCookie, header.typ);
        assert_eq!(4, header.value_length());
        Ok(())
    }

    #[test]
    fn test_param_header_rejects_bad_lengths() {
        // shorter than the header itself
        let result = ParamHeader::unmarshal(&Bytes::from_static(&[0x00, 0x07]));
        assert_eq!(Error::ErrParamHeaderTooShort, result.unwrap_err());

        // self reported length below the fixed header size
        let result = ParamHeader::unmarshal(&Bytes::from_static(&[0x00, 0x07, 0x00, 0x02]));
        assert_eq!(Error::ErrParamHeaderTooShort, result.unwrap_err());

        // self reported length longer than the buffer
        let result = ParamHeader::unmarshal(&Bytes::from_static(&[0x00, 0x07, 0x00, 0x10]));
        assert_eq!(
            Error::ErrParamHeaderSelfReportedLengthLonger,
            result.unwrap_err()
        );
    }
}
