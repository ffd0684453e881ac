use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("raw is too small for a SCTP chunk")]
    ErrChunkHeaderTooSmall,
    #[error("not enough data left in SCTP packet to satisfy requested length")]
    ErrChunkHeaderNotEnoughSpace,
    #[error("chunk has invalid length")]
    ErrChunkHeaderInvalidLength,
    #[error("chunk too short")]
    ErrChunkTooShort,

    #[error("ChunkType is not of type INIT")]
    ErrChunkTypeNotTypeInit,
    #[error("chunk value isn't long enough for mandatory parameters")]
    ErrChunkValueNotLongEnough,
    #[error("ChunkType of type INIT flags must be all 0")]
    ErrChunkTypeInitFlagZero,
    #[error("ChunkType of type INIT Initiate Tag must not be 0")]
    ErrChunkTypeInitInitateTagZero,
    #[error("INIT inbound stream request must be greater than 0")]
    ErrInitInboundStreamRequestZero,
    #[error("INIT outbound stream request must be greater than 0")]
    ErrInitOutboundStreamRequestZero,
    #[error("ChunkType is not of type ABORT")]
    ErrChunkTypeNotAbort,
    #[error("ChunkType is not of type COOKIEACK")]
    ErrChunkTypeNotCookieAck,
    #[error("ChunkType is not of type COOKIEECHO")]
    ErrChunkTypeNotCookieEcho,
    #[error("ChunkType is not of type ctError")]
    ErrChunkTypeNotCtError,
    #[error("ChunkType is not of type HEARTBEAT")]
    ErrChunkTypeNotHeartbeat,
    #[error("ChunkType is not of type HEARTBEATACK")]
    ErrChunkTypeNotHeartbeatAck,
    #[error("ChunkType is not of type ForwardTsn")]
    ErrChunkTypeNotForwardTsn,
    #[error("ChunkType is not of type PayloadData")]
    ErrChunkTypeNotPayloadData,
    #[error("ChunkType is not of type Reconfig")]
    ErrChunkTypeNotReconfig,
    #[error("ChunkReconfig has invalid ParamA")]
    ErrChunkReconfigInvalidParamA,
    #[error("ChunkType is not of type SACK")]
    ErrChunkTypeNotSack,
    #[error("ChunkType is not of type SHUTDOWN")]
    ErrChunkTypeNotShutdown,
    #[error("ChunkType is not of type SHUTDOWN-ACK")]
    ErrChunkTypeNotShutdownAck,
    #[error("ChunkType is not of type SHUTDOWN-COMPLETE")]
    ErrChunkTypeNotShutdownComplete,
    #[error("ChunkType is not of type PAD")]
    ErrChunkTypeNotPadding,

    #[error("SACK Chunk size is not large enough to contain header")]
    ErrSackSizeNotLargeEnoughInfo,
    #[error("packet is smaller than the header size")]
    ErrChunkPayloadSmall,
    #[error("heartbeat is not long enough to contain Heartbeat Info")]
    ErrHeartbeatNotLongEnoughInfo,
    #[error("heartbeat should only have HEARTBEAT param")]
    ErrHeartbeatParam,

    #[error("raw is too small for error cause")]
    ErrErrorCauseTooSmall,

    #[error("param header too short")]
    ErrParamHeaderTooShort,
    #[error("param self reported length is longer than header length")]
    ErrParamHeaderSelfReportedLengthLonger,
    #[error("param has unconsumed trailing bytes")]
    ErrParamTrailingBytes,
    #[error("param value has invalid length")]
    ErrParamValueInvalidLength,

    #[error("raw is smaller than the minimum length for a SCTP packet")]
    ErrPacketRawTooSmall,
    #[error("unable to parse SCTP chunk, not enough data for complete header")]
    ErrParseSctpChunkNotEnoughData,
    #[error("checksum mismatch theirs")]
    ErrChecksumMismatch,
    #[error("packet source or destination port mismatch")]
    ErrPacketPortMismatch,
    #[error("packet verification tag mismatch")]
    ErrPacketVerificationTagMismatch,
    #[error("INIT, INIT ACK and COOKIE ECHO chunks must not be bundled")]
    ErrInitChunkBundled,
    #[error("INIT chunk must have a zero verification tag")]
    ErrInitChunkVerifyTagNotZero,

    #[error("association is not in Closed state")]
    ErrAssociationNotClosed,
    #[error("no cookie in InitAck")]
    ErrInitAckNoCookie,
    #[error("stream outgoing message queue is full")]
    ErrStreamQueueFull,

    #[error("{0}")]
    Other(String),
}
