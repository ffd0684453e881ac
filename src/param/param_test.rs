use super::param_type::ParamType;
use super::Param;
use crate::chunk::chunk_type::ChunkType;
use crate::error::{Error, Result};

use bytes::{Buf, Bytes};

///////////////////////////////////////////////////////////////////
//param_type_test
///////////////////////////////////////////////////////////////////

#[test]
fn test_parse_param_type_success() -> Result<()> {
    let tests = vec![
        (Bytes::from_static(&[0x0, 0x1]), ParamType::HeartbeatInfo),
        (Bytes::from_static(&[0x0, 0xd]), ParamType::OutSsnResetReq),
        (Bytes::from_static(&[0xc0, 0x0]), ParamType::ForwardTsnSupp),
    ];

    for (mut binary, expected) in tests {
        let pt: ParamType = binary.get_u16().into();
        assert_eq!(pt, expected);
    }

    Ok(())
}

///////////////////////////////////////////////////////////////////
//param unmarshal
///////////////////////////////////////////////////////////////////

static PARAM_FORWARD_TSN_SUPPORTED_BYTES: Bytes = Bytes::from_static(&[0xc0, 0x0, 0x0, 0x4]);
static PARAM_STATE_COOKIE_BYTES: Bytes =
    Bytes::from_static(&[0x0, 0x7, 0x0, 0x8, 0x64, 0x74, 0x6c, 0x73]);

#[test]
fn test_param_forward_tsn_supported_success() -> Result<()> {
    let param = Param::unmarshal(&PARAM_FORWARD_TSN_SUPPORTED_BYTES)?;
    assert_eq!(Param::ForwardTsnSupported, param);
    assert_eq!(0, param.value_length());
    assert_eq!(PARAM_FORWARD_TSN_SUPPORTED_BYTES, param.marshal()?);
    Ok(())
}

#[test]
fn test_param_state_cookie_success() -> Result<()> {
    let param = Param::unmarshal(&PARAM_STATE_COOKIE_BYTES)?;
    assert_eq!(
        Param::StateCookie {
            cookie: Bytes::from_static(b"dtls"),
        },
        param
    );
    assert_eq!(PARAM_STATE_COOKIE_BYTES, param.marshal()?);
    Ok(())
}

#[test]
fn test_param_addresses() -> Result<()> {
    let raw = Bytes::from_static(&[0x0, 0x5, 0x0, 0x8, 192, 168, 0, 1]);
    let param = Param::unmarshal(&raw)?;
    assert_eq!(
        Param::Ipv4Address {
            addr: [192, 168, 0, 1],
        },
        param
    );
    assert_eq!(raw, param.marshal()?);

    // IPv4 address param with a truncated address
    let raw = Bytes::from_static(&[0x0, 0x5, 0x0, 0x6, 192, 168, 0, 0]);
    let result = Param::unmarshal(&raw);
    assert_eq!(Error::ErrParamValueInvalidLength, result.unwrap_err());

    let raw = Bytes::from_static(&[0x0, 0xc, 0x0, 0x8, 0x0, 0x5, 0x0, 0x6]);
    let param = Param::unmarshal(&raw)?;
    assert_eq!(
        Param::SupportedAddressTypes {
            address_types: vec![5, 6],
        },
        param
    );
    Ok(())
}

#[test]
fn test_param_supported_extensions() -> Result<()> {
    let raw = Bytes::from_static(&[0x80, 0x8, 0x0, 0x6, 0xc0, 0x82, 0x0, 0x0]);
    let param = Param::unmarshal(&raw)?;
    assert_eq!(
        Param::SupportedExtensions {
            chunk_types: vec![ChunkType(0xc0), ChunkType(0x82)],
        },
        param
    );
    assert_eq!(2, param.value_length());
    // marshal writes without padding
    assert_eq!(raw.slice(..6), param.marshal()?);
    Ok(())
}

#[test]
fn test_param_unknown_is_preserved() -> Result<()> {
    // type 0xc123 asks the receiver to skip and report
    let raw = Bytes::from_static(&[0xc1, 0x23, 0x0, 0x6, 0xaa, 0xbb]);
    let param = Param::unmarshal(&raw)?;
    assert_eq!(
        Param::Unknown {
            typ: 0xc123,
            value: Bytes::from_static(&[0xaa, 0xbb]),
        },
        param
    );
    assert!(!ParamType::stop_processing(0xc123));
    assert!(ParamType::report_unrecognized(0xc123));
    assert_eq!(raw, param.marshal()?);
    Ok(())
}

#[test]
fn test_param_unmarshal_failure() {
    let tests = vec![
        ("header too short", Bytes::from_static(&[0x0, 0x1])),
        (
            "reported length below header length",
            Bytes::from_static(&[0x0, 0xd, 0x0, 0x3]),
        ),
        (
            "reported length past the buffer",
            Bytes::from_static(&[0x0, 0x7, 0x0, 0x10, 0x1, 0x2, 0x3, 0x4]),
        ),
        (
            "cookie preservative with short value",
            Bytes::from_static(&[0x0, 0x9, 0x0, 0x6, 0x1, 0x2]),
        ),
    ];

    for (name, binary) in tests {
        let result = Param::unmarshal(&binary);
        assert!(result.is_err(), "expected unmarshal: {} to fail.", name);
    }
}
