use std::fmt;
use std::str::FromStr;

use strum_macros::Display;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::error::UsageError;
use crate::Result;

/// Operation of `BITOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BitOp {
    And,
    Or,
    Xor,
    Not,
}

/// How `BITFIELD` handles `SET` and `INCRBY` results that do not fit their type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Overflow {
    /// Wrap around, the server default.
    #[default]
    Wrap,
    /// Saturate at the minimum or maximum value.
    Sat,
    /// Skip the operation and return `nil` for it.
    Fail,
}

/// Integer encoding of one `BITFIELD` slot: `i1` to `i64`, or `u1` to `u63`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFieldType {
    signed: bool,
    bits: u8,
}

impl BitFieldType {
    pub fn signed(bits: u8) -> std::result::Result<BitFieldType, UsageError> {
        BitFieldType::checked(true, bits)
    }

    /// At most 63 bits, since the server cannot reply with a 64-bit unsigned integer.
    pub fn unsigned(bits: u8) -> std::result::Result<BitFieldType, UsageError> {
        BitFieldType::checked(false, bits)
    }

    fn checked(signed: bool, bits: u8) -> std::result::Result<BitFieldType, UsageError> {
        let max = if signed { 64 } else { 63 };
        if bits == 0 || bits > max {
            return Err(UsageError::InvalidBitFieldType(format!(
                "{}{}",
                if signed { 'i' } else { 'u' },
                bits
            )));
        }
        Ok(BitFieldType { signed, bits })
    }
}

impl fmt::Display for BitFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.signed { 'i' } else { 'u' };
        write!(f, "{}{}", sign, self.bits)
    }
}

impl FromStr for BitFieldType {
    type Err = UsageError;

    fn from_str(s: &str) -> std::result::Result<BitFieldType, UsageError> {
        let invalid = || UsageError::InvalidBitFieldType(s.to_string());
        let (signed, bits) = if let Some(bits) = s.strip_prefix('i') {
            (true, bits)
        } else if let Some(bits) = s.strip_prefix('u') {
            (false, bits)
        } else {
            return Err(invalid());
        };
        let bits = bits.parse::<u8>().map_err(|_| invalid())?;
        BitFieldType::checked(signed, bits).map_err(|_| invalid())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Subcommand {
    Get(BitFieldType, u64),
    Set(BitFieldType, u64, i64),
    IncrBy(BitFieldType, u64, i64),
    Overflow(Overflow),
}

/// The subcommands of one `BITFIELD` call, run by the server in the order they were added.
///
/// ```
/// # use respire::{BitField, BitFieldType, Overflow};
/// # fn build() -> Result<BitField, respire::UsageError> {
/// let counters = BitField::new()
///     .overflow(Overflow::Sat)
///     .incr_by(BitFieldType::unsigned(8)?, 0, 10)
///     .get(BitFieldType::signed(4)?, 8);
/// # Ok(counters)
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitField {
    subcommands: Vec<Subcommand>,
}

impl BitField {
    pub fn new() -> BitField {
        BitField::default()
    }

    pub fn get(mut self, ty: BitFieldType, offset: u64) -> BitField {
        self.subcommands.push(Subcommand::Get(ty, offset));
        self
    }

    pub fn set(mut self, ty: BitFieldType, offset: u64, value: i64) -> BitField {
        self.subcommands.push(Subcommand::Set(ty, offset, value));
        self
    }

    pub fn incr_by(mut self, ty: BitFieldType, offset: u64, increment: i64) -> BitField {
        self.subcommands.push(Subcommand::IncrBy(ty, offset, increment));
        self
    }

    /// Applies to every `SET` and `INCRBY` added after it.
    pub fn overflow(mut self, overflow: Overflow) -> BitField {
        self.subcommands.push(Subcommand::Overflow(overflow));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.subcommands.is_empty()
    }

    pub(crate) fn apply(&self, cmd: Command) -> Command {
        self.subcommands
            .iter()
            .fold(cmd, |cmd, subcommand| match subcommand {
                Subcommand::Get(ty, offset) => cmd.arg("GET").arg(ty.to_string()).arg(*offset),
                Subcommand::Set(ty, offset, value) => cmd
                    .arg("SET")
                    .arg(ty.to_string())
                    .arg(*offset)
                    .arg(*value),
                Subcommand::IncrBy(ty, offset, increment) => cmd
                    .arg("INCRBY")
                    .arg(ty.to_string())
                    .arg(*offset)
                    .arg(*increment),
                Subcommand::Overflow(overflow) => cmd.arg("OVERFLOW").arg(overflow.to_string()),
            })
    }
}

impl Connection {
    /// Returns the bit previously stored at `offset`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/setbit/>
    pub async fn set_bit(&self, key: impl ToArg, offset: u64, value: bool) -> Result<i64> {
        self.run(Command::new("SETBIT").arg(key).arg(offset).arg(i64::from(value)))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/getbit/>
    pub async fn get_bit(&self, key: impl ToArg, offset: u64) -> Result<i64> {
        self.run(Command::new("GETBIT").arg(key).arg(offset))
            .await?
            .as_integer()
    }

    /// Set bits in the whole string, or in the bytes `start..=end` when a range is given.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitcount/>
    pub async fn bit_count(&self, key: impl ToArg, range: Option<(i64, i64)>) -> Result<i64> {
        let mut cmd = Command::new("BITCOUNT").arg(key);
        if let Some((start, end)) = range {
            cmd = cmd.arg(start).arg(end);
        }
        self.run(cmd).await?.as_integer()
    }

    /// Stores the result of `op` over `keys` at `destination`, returning its length in bytes.
    /// [`BitOp::Not`] takes exactly one key.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitop/>
    pub async fn bit_op<K: ToArg>(
        &self,
        op: BitOp,
        destination: impl ToArg,
        keys: &[K],
    ) -> Result<i64> {
        match (op, keys.len()) {
            (_, 0) => return Err(UsageError::NoKeys("BITOP").into()),
            (BitOp::Not, n) if n > 1 => return Err(UsageError::NotArity(n).into()),
            _ => {}
        }

        let cmd = Command::new("BITOP")
            .arg(op.to_string())
            .arg(destination)
            .args(keys);
        self.run(cmd).await?.as_integer()
    }

    /// One result per `GET`, `SET` and `INCRBY`, in order. `None` marks an operation skipped by
    /// [`Overflow::Fail`].
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitfield/>
    pub async fn bit_field(&self, key: impl ToArg, field: &BitField) -> Result<Vec<Option<i64>>> {
        self.run(field.apply(Command::new("BITFIELD").arg(key)))
            .await?
            .as_optional_integer_sequence()
    }
}
