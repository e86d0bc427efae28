use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::convert::mismatch;
use crate::options::{single, SetOptions};
use crate::reply::{NullString, Reply};
use crate::Result;

impl Connection {
    /// Ref: <https://redis.io/docs/latest/commands/get/>
    pub async fn get(&self, key: impl ToArg) -> Result<NullString> {
        self.run(Command::new("GET").arg(key))
            .await?
            .as_optional_string()
    }

    /// Stores `value` at `key`.
    ///
    /// Returns `false` when an `NX` or `XX` condition kept the value from being written. At most
    /// one [`SetOptions`] is accepted, and `nx` together with `xx` is rejected before anything is
    /// sent.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/set/>
    pub async fn set(
        &self,
        key: impl ToArg,
        value: impl ToArg,
        options: &[SetOptions],
    ) -> Result<bool> {
        let mut cmd = Command::new("SET").arg(key).arg(value);
        if let Some(options) = single(options)? {
            cmd = options.apply(cmd)?;
        }

        match self.run(cmd).await?.into_result()? {
            Reply::Simple(status) if status == "OK" => Ok(true),
            Reply::Null => Ok(false),
            reply => Err(mismatch("OK or null", &reply)),
        }
    }

    /// Ref: <https://redis.io/docs/latest/commands/getset/>
    pub async fn get_set(&self, key: impl ToArg, value: impl ToArg) -> Result<NullString> {
        self.run(Command::new("GETSET").arg(key).arg(value))
            .await?
            .as_optional_string()
    }

    /// Returns the length of the string after the append.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/append/>
    pub async fn append(&self, key: impl ToArg, value: impl ToArg) -> Result<i64> {
        self.run(Command::new("APPEND").arg(key).arg(value))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/strlen/>
    pub async fn strlen(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("STRLEN").arg(key)).await?.as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/incr/>
    pub async fn incr(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("INCR").arg(key)).await?.as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/incrby/>
    pub async fn incr_by(&self, key: impl ToArg, increment: i64) -> Result<i64> {
        self.run(Command::new("INCRBY").arg(key).arg(increment))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/incrbyfloat/>
    pub async fn incr_by_float(&self, key: impl ToArg, increment: f64) -> Result<f64> {
        self.run(Command::new("INCRBYFLOAT").arg(key).arg(increment))
            .await?
            .as_float()
    }

    /// Ref: <https://redis.io/docs/latest/commands/decr/>
    pub async fn decr(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("DECR").arg(key)).await?.as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/decrby/>
    pub async fn decr_by(&self, key: impl ToArg, decrement: i64) -> Result<i64> {
        self.run(Command::new("DECRBY").arg(key).arg(decrement))
            .await?
            .as_integer()
    }

    /// Substring between the byte offsets `start` and `end`, both inclusive. Negative offsets
    /// count from the end. A missing key reads as the empty string.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/getrange/>
    pub async fn get_range(&self, key: impl ToArg, start: i64, end: i64) -> Result<String> {
        self.run(Command::new("GETRANGE").arg(key).arg(start).arg(end))
            .await?
            .as_string()
    }

    /// Overwrites the string from byte `offset` on, padding with zero bytes as needed. Returns
    /// the new length.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/setrange/>
    pub async fn set_range(&self, key: impl ToArg, offset: u64, value: impl ToArg) -> Result<i64> {
        self.run(Command::new("SETRANGE").arg(key).arg(offset).arg(value))
            .await?
            .as_integer()
    }

    /// One entry per key, absent for keys that do not hold a value.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/mget/>
    pub async fn mget<K: ToArg>(&self, keys: &[K]) -> Result<Vec<NullString>> {
        self.run(Command::new("MGET").args(keys))
            .await?
            .as_optional_string_sequence()
    }

    /// Ref: <https://redis.io/docs/latest/commands/mset/>
    pub async fn mset<K: ToArg, V: ToArg>(&self, pairs: &[(K, V)]) -> Result<()> {
        let cmd = pairs
            .iter()
            .fold(Command::new("MSET"), |cmd, (key, value)| cmd.arg(key).arg(value));
        self.run(cmd).await?.ok()
    }

    /// Sets every pair, or none of them if any key already exists. `true` when the values were
    /// written.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/msetnx/>
    pub async fn msetnx<K: ToArg, V: ToArg>(&self, pairs: &[(K, V)]) -> Result<bool> {
        let cmd = pairs
            .iter()
            .fold(Command::new("MSETNX"), |cmd, (key, value)| cmd.arg(key).arg(value));
        self.run(cmd).await?.as_bool()
    }
}
