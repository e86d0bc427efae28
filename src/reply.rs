// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Bytes;

use crate::error::ProtocolError;

pub(crate) static CRLF: &[u8; 2] = b"\r\n";

/// A single decoded RESP2 value.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Simple(String),
    /// A `-` reply. Accessors turn it into [`crate::Error::Server`] instead of interpreting it.
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// The null bulk string, `$-1`.
    Null,
    Array(Vec<Reply>),
}

impl Reply {
    /// Short name of the variant, used in mismatch errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Simple(_) => "simple string",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk string",
            Reply::Null => "null",
            Reply::Array(_) => "array",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Reply::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Reply::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Reply::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Reply::Bulk(data) => {
                let length_str = data.len().to_string();
                let mut result = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + data.len() + CRLF.len(),
                );
                result.push(u8::from(DataType::BulkString));
                result.extend_from_slice(length_str.as_bytes());
                result.extend_from_slice(CRLF);
                result.extend_from_slice(data);
                result.extend_from_slice(CRLF);
                result
            }
            Reply::Null => b"$-1\r\n".to_vec(),
            Reply::Array(arr) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for reply in arr {
                    bytes.extend(reply.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Reply> for Vec<u8> {
    fn from(reply: Reply) -> Self {
        reply.serialize()
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<i64> for Reply {
    fn from(i: i64) -> Self {
        Reply::Integer(i)
    }
}

// Rendered the way redis-cli prints replies.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl Reply {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "{}", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(i) => write!(f, "(integer) {}", i),
            Reply::Bulk(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Reply::Null => write!(f, "(nil)"),
            Reply::Array(arr) if arr.is_empty() => write!(f, "(empty array)"),
            Reply::Array(arr) => {
                for (i, reply) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:width$}", "", width = indent)?;
                    }
                    let prefix = format!("{}) ", i + 1);
                    write!(f, "{}", prefix)?;
                    reply.fmt_indented(f, indent + prefix.len())?;
                }
                Ok(())
            }
        }
    }
}

/// A string position that the server may leave empty (`nil`).
///
/// `present == false` always comes with an empty `value`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NullString {
    pub value: String,
    pub present: bool,
}

impl NullString {
    pub fn present(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            present: true,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn into_option(self) -> Option<String> {
        self.present.then_some(self.value)
    }
}

impl From<NullString> for Option<String> {
    fn from(s: NullString) -> Self {
        s.into_option()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortedSetEntry {
    pub member: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub member: Option<String>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64, member: impl Into<String>) -> Self {
        Self {
            longitude,
            latitude,
            member: Some(member.into()),
        }
    }
}

/// The RESP2 type byte that starts every value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(ProtocolError::UnsupportedReplyType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}
