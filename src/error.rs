use std::io;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Socket failure or premature end of stream. The connection is unusable afterwards.
    #[error("io error; {0}")]
    Io(#[from] io::Error),
    /// The server answered with a `-` reply.
    #[error("{0}")]
    Server(String),
    #[error("protocol error; {0}")]
    Protocol(#[from] ProtocolError),
    #[error("usage error; {0}")]
    Usage(#[from] UsageError),
    /// A cursor scan has no more pages. This is the normal way a scan ends.
    #[error("iterator end")]
    IteratorEnd,
    #[error("key not exist")]
    KeyNotExist,
    #[error("connection closed after a previous failure")]
    ConnectionClosed,
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ProtocolError {
    #[error("unsupported reply type {0:#04x}")]
    UnsupportedReplyType(u8),
    #[error("invalid integer {0:?}")]
    InvalidInteger(String),
    #[error("invalid length {0}")]
    InvalidLength(i64),
    #[error("bulk string of {length} bytes exceeds the limit of {limit} bytes")]
    BulkTooLarge { length: i64, limit: usize },
    #[error("line longer than {0} bytes")]
    LineTooLong(usize),
    #[error("missing line terminator after bulk string")]
    MissingTerminator,
    #[error("arrays nested deeper than {0} levels")]
    DepthExceeded(usize),
    #[error("invalid UTF-8 string")]
    InvalidUtf8,
    #[error("expected {expected}, got {actual}")]
    UnexpectedReply { expected: &'static str, actual: String },
    #[error("expected key/value pairs, got {0} elements")]
    OddLength(usize),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("malformed push message: {0}")]
    MalformedPush(String),
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum UsageError {
    #[error("empty command")]
    EmptyCommand,
    #[error("must have 0 or 1 option, got {0}")]
    TooManyOptions(usize),
    #[error("cannot set NX and XX option at the same time")]
    ConflictingOptions,
    #[error("{0} requires at least one topic")]
    NoTopics(&'static str),
    #[error("already subscribed to {0}")]
    AlreadySubscribed(String),
    #[error("geo point requires a member")]
    MissingMember,
    #[error("{0} requires at least one key")]
    NoKeys(&'static str),
    #[error("BITOP NOT takes exactly one source key, got {0}")]
    NotArity(usize),
    #[error("invalid bitfield type {0}")]
    InvalidBitFieldType(String),
    #[error("got {weights} weights for {keys} keys")]
    WeightsMismatch { keys: usize, weights: usize },
    #[error("only (P)SUBSCRIBE / (P)UNSUBSCRIBE are allowed on a subscribed connection")]
    Subscribed,
}

impl Error {
    /// Whether the connection that produced this error must be discarded.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Io(_) | Error::ConnectionClosed => true,
            Error::Protocol(err) => err.is_framing(),
            _ => false,
        }
    }
}

impl ProtocolError {
    /// Whether the error left the byte stream at an unknown position. Shape mismatches found by
    /// the accessors are not, since the reply was read in full.
    pub fn is_framing(&self) -> bool {
        !matches!(
            self,
            ProtocolError::UnexpectedReply { .. }
                | ProtocolError::OddLength(_)
                | ProtocolError::InvalidNumber(_)
        )
    }
}

// Push errors are fanned out to every subscription queue, so they have to be duplicated.
impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::Io(err) => Error::Io(io::Error::new(err.kind(), err.to_string())),
            Error::Server(msg) => Error::Server(msg.clone()),
            Error::Protocol(err) => Error::Protocol(err.clone()),
            Error::Usage(err) => Error::Usage(err.clone()),
            Error::IteratorEnd => Error::IteratorEnd,
            Error::KeyNotExist => Error::KeyNotExist,
            Error::ConnectionClosed => Error::ConnectionClosed,
        }
    }
}
