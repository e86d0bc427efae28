use std::io;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::error::ProtocolError;
use crate::Result;

/// Maximum nesting of arrays accepted from the server.
pub const DEFAULT_MAX_DEPTH: usize = 32;
/// Same ceiling Redis applies to a single bulk string (`proto-max-bulk-len`).
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;
/// Longest status, error or length line accepted, the same bound Redis puts on inline requests.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Buffered reader over the read half of a connection.
///
/// Any error returned here leaves the stream at an unknown position, so the owner must stop using
/// it.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    pub(crate) max_depth: usize,
    pub(crate) max_bulk_len: usize,
    pub(crate) max_line_len: usize,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    pub fn new(inner: R) -> FrameReader<R> {
        FrameReader {
            // Allocate the buffer with 4kb of capacity.
            inner: BufReader::with_capacity(4096, inner),
            max_depth: DEFAULT_MAX_DEPTH,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    pub fn with_limits(mut self, max_depth: usize, max_bulk_len: usize) -> FrameReader<R> {
        self.max_depth = max_depth;
        self.max_bulk_len = max_bulk_len;
        self
    }

    pub fn with_line_limit(mut self, max_line_len: usize) -> FrameReader<R> {
        self.max_line_len = max_line_len;
        self
    }

    pub async fn read_byte(&mut self) -> io::Result<u8> {
        self.inner.read_u8().await
    }

    /// Reads up to and including the next `\n`, returning the line without `\n` or a preceding
    /// `\r`. Lines longer than the line limit fail with [`ProtocolError::LineTooLong`].
    pub async fn read_line(&mut self) -> Result<Bytes> {
        let mut line = Vec::new();
        // Room for the terminator on top of the limit.
        let limit = self.max_line_len as u64 + 2;
        let n = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut line)
            .await?;

        if line.last() != Some(&b'\n') {
            if n as u64 == limit {
                return Err(ProtocolError::LineTooLong(self.max_line_len).into());
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed in the middle of a line",
            )
            .into());
        }

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(Bytes::from(line))
    }

    pub async fn read_exact(&mut self, n: usize) -> io::Result<Bytes> {
        let mut data = vec![0; n];
        self.inner.read_exact(&mut data).await?;
        Ok(Bytes::from(data))
    }
}
