use std::fmt;

/// paramType represents a SCTP INIT/INITACK parameter
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ParamType {
    /// Heartbeat Info [RFC4960]
    HeartbeatInfo,
    /// IPv4 Address [RFC4960]
    Ipv4Addr,
    /// IPv6 Address [RFC4960]
    Ipv6Addr,
    /// State Cookie [RFC4960]
    StateCookie,
    /// Unrecognized Parameters [RFC4960]
    UnrecognizedParam,
    /// Cookie Preservative [RFC4960]
    CookiePreservative,
    /// Host Name Address [RFC4960]
    HostNameAddr,
    /// Supported Address Types [RFC4960]
    SupportedAddrTypes,
    /// Outgoing SSN Reset Request Parameter [RFC6525]
    OutSsnResetReq,
    /// Incoming SSN Reset Request Parameter [RFC6525]
    IncSsnResetReq,
    /// SSN/TSN Reset Request Parameter [RFC6525]
    SsnTsnResetReq,
    /// Re-configuration Response Parameter [RFC6525]
    ReconfigResp,
    /// Add Outgoing Streams Request Parameter [RFC6525]
    AddOutStreamsReq,
    /// Add Incoming Streams Request Parameter [RFC6525]
    AddIncStreamsReq,
    /// Padding (0x8005)
    Padding,
    /// Supported Extensions (0x8008) [RFC5061]
    SupportedExt,
    /// Forward TSN supported (0xC000) [RFC3758]
    ForwardTsnSupp,
    Unknown { param_type: u16 },
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ParamType::HeartbeatInfo => "Heartbeat Info",
            ParamType::Ipv4Addr => "IPv4 Address",
            ParamType::Ipv6Addr => "IPv6 Address",
            ParamType::StateCookie => "State Cookie",
            ParamType::UnrecognizedParam => "Unrecognized Parameters",
            ParamType::CookiePreservative => "Cookie Preservative",
            ParamType::HostNameAddr => "Host Name Address",
            ParamType::SupportedAddrTypes => "Supported Address Types",
            ParamType::OutSsnResetReq => "Outgoing SSN Reset Request Parameter",
            ParamType::IncSsnResetReq => "Incoming SSN Reset Request Parameter",
            ParamType::SsnTsnResetReq => "SSN/TSN Reset Request Parameter",
            ParamType::ReconfigResp => "Re-configuration Response Parameter",
            ParamType::AddOutStreamsReq => "Add Outgoing Streams Request Parameter",
            ParamType::AddIncStreamsReq => "Add Incoming Streams Request Parameter",
            ParamType::Padding => "Padding",
            ParamType::SupportedExt => "Supported Extensions",
            ParamType::ForwardTsnSupp => "Forward TSN supported",
            _ => "Unknown ParamType",
        };
        write!(f, "{}", s)
    }
}

impl From<u16> for ParamType {
    fn from(v: u16) -> ParamType {
        match v {
            1 => ParamType::HeartbeatInfo,
            5 => ParamType::Ipv4Addr,
            6 => ParamType::Ipv6Addr,
            7 => ParamType::StateCookie,
            8 => ParamType::UnrecognizedParam,
            9 => ParamType::CookiePreservative,
            11 => ParamType::HostNameAddr,
            12 => ParamType::SupportedAddrTypes,
            13 => ParamType::OutSsnResetReq,
            14 => ParamType::IncSsnResetReq,
            15 => ParamType::SsnTsnResetReq,
            16 => ParamType::ReconfigResp,
            17 => ParamType::AddOutStreamsReq,
            18 => ParamType::AddIncStreamsReq,
            32773 => ParamType::Padding,
            32776 => ParamType::SupportedExt,
            49152 => ParamType::ForwardTsnSupp,
            unknown => ParamType::Unknown {
                param_type: unknown,
            },
        }
    }
}

impl From<ParamType> for u16 {
    fn from(v: ParamType) -> u16 {
        match v {
            ParamType::HeartbeatInfo => 1,
            ParamType::Ipv4Addr => 5,
            ParamType::Ipv6Addr => 6,
            ParamType::StateCookie => 7,
            ParamType::UnrecognizedParam => 8,
            ParamType::CookiePreservative => 9,
            ParamType::HostNameAddr => 11,
            ParamType::SupportedAddrTypes => 12,
            ParamType::OutSsnResetReq => 13,
            ParamType::IncSsnResetReq => 14,
            ParamType::SsnTsnResetReq => 15,
            ParamType::ReconfigResp => 16,
            ParamType::AddOutStreamsReq => 17,
            ParamType::AddIncStreamsReq => 18,
            ParamType::Padding => 32773,
            ParamType::SupportedExt => 32776,
            ParamType::ForwardTsnSupp => 49152,
            ParamType::Unknown { param_type } => param_type,
        }
    }
}

impl ParamType {
    /// Upper two bits of the type govern handling of parameters the receiver
    /// does not implement. Bit 15 clear means stop processing the rest of the
    /// chunk, bit 14 set means report the parameter back to the sender.
    pub(crate) fn stop_processing(raw_type: u16) -> bool {
        ((raw_type >> 15) & 0x01) == 0
    }

    pub(crate) fn report_unrecognized(raw_type: u16) -> bool {
        ((raw_type >> 14) & 0x01) == 1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_type_conversions() {
        for raw in [1u16, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15, 16, 17, 18, 32773, 32776, 49152] {
            let typ: ParamType = raw.into();
            assert_ne!(ParamType::Unknown { param_type: raw }, typ);
            assert_eq!(raw, u16::from(typ));
        }

        let typ: ParamType = 0x4242u16.into();
        assert_eq!(ParamType::Unknown { param_type: 0x4242 }, typ);
        assert_eq!(0x4242u16, u16::from(typ));
    }

    #[test]
    fn test_unrecognized_handling_bits() {
        // 0x0004: stop, do not report
        assert!(ParamType::stop_processing(0x0004));
        assert!(!ParamType::report_unrecognized(0x0004));
        // 0x4004: stop and report
        assert!(ParamType::stop_processing(0x4004));
        assert!(ParamType::report_unrecognized(0x4004));
        // 0x8004: skip, do not report
        assert!(!ParamType::stop_processing(0x8004));
        assert!(!ParamType::report_unrecognized(0x8004));
        // 0xc004: skip and report
        assert!(!ParamType::stop_processing(0xc004));
        assert!(ParamType::report_unrecognized(0xc004));
    }
}
