use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use crate::command::Command;
use crate::error::{Error, UsageError};
use crate::reply::CRLF;
use crate::Result;

/// Encodes a request as an array of bulk strings:
///
/// ```text
/// *<argc>\r\n
/// $<byte length of argument 1>\r\n<argument 1>\r\n
/// ...
/// ```
pub fn encode(args: &[Bytes]) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode_into(args, &mut dst)?;
    Ok(dst.freeze())
}

pub fn encode_into(args: &[Bytes], dst: &mut BytesMut) -> Result<()> {
    if args.is_empty() {
        return Err(UsageError::EmptyCommand.into());
    }

    let argc = args.len().to_string();
    dst.reserve(1 + argc.len() + CRLF.len() + args.iter().map(|a| a.len() + 16).sum::<usize>());

    dst.put_u8(b'*');
    dst.put_slice(argc.as_bytes());
    dst.put_slice(CRLF);

    for arg in args {
        // Lengths are byte counts, so binary payloads survive untouched.
        dst.put_u8(b'$');
        dst.put_slice(arg.len().to_string().as_bytes());
        dst.put_slice(CRLF);
        dst.put_slice(arg);
        dst.put_slice(CRLF);
    }

    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommandCodec;

impl<'a> Encoder<&'a Command> for CommandCodec {
    type Error = Error;

    fn encode(&mut self, item: &'a Command, dst: &mut BytesMut) -> Result<()> {
        encode_into(item.as_args(), dst)
    }
}
