use std::str;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::io::AsyncRead;

use crate::error::ProtocolError;
use crate::reader::FrameReader;
use crate::reply::{DataType, Reply};
use crate::Result;

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    /// Reads exactly one complete reply from the stream.
    ///
    /// A `-` reply is returned as [`Reply::Error`]; only I/O and framing problems are `Err`.
    pub async fn decode_one(&mut self) -> Result<Reply> {
        self.decode_value(0).await
    }

    fn decode_value(&mut self, depth: usize) -> BoxFuture<'_, Result<Reply>> {
        async move {
            // The first byte in an RESP-serialized payload always identifies its type.
            let first_byte = self.read_byte().await?;
            let data_type = DataType::try_from(first_byte)?;

            match data_type {
                DataType::SimpleString => {
                    let line = self.read_line().await?;
                    Ok(Reply::Simple(utf8(line)?))
                }
                DataType::SimpleError => {
                    let line = self.read_line().await?;
                    Ok(Reply::Error(String::from_utf8_lossy(&line).into_owned()))
                }
                DataType::Integer => {
                    let line = self.read_line().await?;
                    Ok(Reply::Integer(parse_integer(&line)?))
                }
                // $<length>\r\n<data>\r\n
                DataType::BulkString => {
                    let length = parse_integer(&self.read_line().await?)?;

                    if length == -1 {
                        return Ok(Reply::Null);
                    }
                    if length < 0 {
                        return Err(ProtocolError::InvalidLength(length).into());
                    }
                    if length as u64 > self.max_bulk_len as u64 {
                        return Err(ProtocolError::BulkTooLarge {
                            length,
                            limit: self.max_bulk_len,
                        }
                        .into());
                    }

                    let data = self.read_exact(length as usize).await?;
                    if !self.read_line().await?.is_empty() {
                        return Err(ProtocolError::MissingTerminator.into());
                    }

                    Ok(Reply::Bulk(data))
                }
                // *<number-of-elements>\r\n<element-1>...<element-n>
                DataType::Array => {
                    let length = parse_integer(&self.read_line().await?)?;

                    // No client call distinguishes a null array from an empty one.
                    if length == -1 {
                        return Ok(Reply::Array(Vec::new()));
                    }
                    if length < 0 {
                        return Err(ProtocolError::InvalidLength(length).into());
                    }
                    if depth >= self.max_depth {
                        return Err(ProtocolError::DepthExceeded(self.max_depth).into());
                    }

                    // The length comes from the peer; don't trust it for the allocation.
                    let mut replies = Vec::with_capacity((length as usize).min(1024));
                    for _ in 0..length {
                        replies.push(self.decode_value(depth + 1).await?);
                    }

                    Ok(Reply::Array(replies))
                }
            }
        }
        .boxed()
    }
}

fn utf8(bytes: Bytes) -> std::result::Result<String, ProtocolError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

pub(crate) fn parse_integer(line: &[u8]) -> std::result::Result<i64, ProtocolError> {
    str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ProtocolError::InvalidInteger(String::from_utf8_lossy(line).into_owned()))
}
