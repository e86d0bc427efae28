use std::time::Duration;

use strum_macros::Display;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::error::UsageError;
use crate::reply::{NullString, Reply};
use crate::Result;

/// Where `LINSERT` puts the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum InsertPosition {
    Before,
    After,
}

impl Connection {
    /// Returns the length of the list after the push.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lpush/>
    pub async fn lpush<V: ToArg>(&self, key: impl ToArg, values: &[V]) -> Result<i64> {
        self.run(Command::new("LPUSH").arg(key).args(values))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpush/>
    pub async fn rpush<V: ToArg>(&self, key: impl ToArg, values: &[V]) -> Result<i64> {
        self.run(Command::new("RPUSH").arg(key).args(values))
            .await?
            .as_integer()
    }

    /// Like [`Connection::lpush`], but only when the list already exists. Returns 0 otherwise.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lpushx/>
    pub async fn lpushx<V: ToArg>(&self, key: impl ToArg, values: &[V]) -> Result<i64> {
        self.run(Command::new("LPUSHX").arg(key).args(values))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpushx/>
    pub async fn rpushx<V: ToArg>(&self, key: impl ToArg, values: &[V]) -> Result<i64> {
        self.run(Command::new("RPUSHX").arg(key).args(values))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/lpop/>
    pub async fn lpop(&self, key: impl ToArg) -> Result<NullString> {
        self.run(Command::new("LPOP").arg(key))
            .await?
            .as_optional_string()
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpop/>
    pub async fn rpop(&self, key: impl ToArg) -> Result<NullString> {
        self.run(Command::new("RPOP").arg(key))
            .await?
            .as_optional_string()
    }

    /// Pops the head of the first non-empty list among `keys`, waiting up to `timeout` for one
    /// to appear. Returns `(key, element)`, or `None` when the timeout ran out.
    ///
    /// The timeout has a resolution of one second and zero waits forever. The connection stays
    /// locked while the server blocks, so other clones of it wait too.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/blpop/>
    pub async fn blpop<K: ToArg>(
        &self,
        keys: &[K],
        timeout: Duration,
    ) -> Result<Option<(String, String)>> {
        self.blocking_pop("BLPOP", keys, timeout).await
    }

    /// The tail-popping counterpart of [`Connection::blpop`].
    ///
    /// Ref: <https://redis.io/docs/latest/commands/brpop/>
    pub async fn brpop<K: ToArg>(
        &self,
        keys: &[K],
        timeout: Duration,
    ) -> Result<Option<(String, String)>> {
        self.blocking_pop("BRPOP", keys, timeout).await
    }

    async fn blocking_pop<K: ToArg>(
        &self,
        name: &'static str,
        keys: &[K],
        timeout: Duration,
    ) -> Result<Option<(String, String)>> {
        if keys.is_empty() {
            return Err(UsageError::NoKeys(name).into());
        }
        self.run(Command::new(name).args(keys).arg(timeout.as_secs()))
            .await?
            .as_optional_pair()
    }

    /// Moves the tail of `source` to the head of `destination` and returns it.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/rpoplpush/>
    pub async fn rpoplpush(&self, source: impl ToArg, destination: impl ToArg) -> Result<NullString> {
        self.run(Command::new("RPOPLPUSH").arg(source).arg(destination))
            .await?
            .as_optional_string()
    }

    /// Blocking [`Connection::rpoplpush`]. Absent when the timeout ran out.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/brpoplpush/>
    pub async fn brpoplpush(
        &self,
        source: impl ToArg,
        destination: impl ToArg,
        timeout: Duration,
    ) -> Result<NullString> {
        let cmd = Command::new("BRPOPLPUSH")
            .arg(source)
            .arg(destination)
            .arg(timeout.as_secs());
        match self.run(cmd).await?.into_result()? {
            // A timeout arrives as a null array.
            Reply::Array(items) if items.is_empty() => Ok(NullString::absent()),
            reply => reply.as_optional_string(),
        }
    }

    /// Ref: <https://redis.io/docs/latest/commands/llen/>
    pub async fn llen(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("LLEN").arg(key)).await?.as_integer()
    }

    /// Elements between `start` and `stop`, both inclusive. Negative indexes count from the end.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lrange/>
    pub async fn lrange(&self, key: impl ToArg, start: i64, stop: i64) -> Result<Vec<String>> {
        self.run(Command::new("LRANGE").arg(key).arg(start).arg(stop))
            .await?
            .as_string_sequence()
    }

    /// Ref: <https://redis.io/docs/latest/commands/lindex/>
    pub async fn lindex(&self, key: impl ToArg, index: i64) -> Result<NullString> {
        self.run(Command::new("LINDEX").arg(key).arg(index))
            .await?
            .as_optional_string()
    }

    /// Inserts `value` next to the first occurrence of `pivot`. Returns the new length, or -1
    /// when `pivot` is not in the list.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/linsert/>
    pub async fn linsert(
        &self,
        key: impl ToArg,
        position: InsertPosition,
        pivot: impl ToArg,
        value: impl ToArg,
    ) -> Result<i64> {
        let cmd = Command::new("LINSERT")
            .arg(key)
            .arg(position.to_string())
            .arg(pivot)
            .arg(value);
        self.run(cmd).await?.as_integer()
    }

    /// Removes up to `count` occurrences of `value`: from the head for a positive count, from
    /// the tail for a negative one, and all of them for zero.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lrem/>
    pub async fn lrem(&self, key: impl ToArg, count: i64, value: impl ToArg) -> Result<i64> {
        self.run(Command::new("LREM").arg(key).arg(count).arg(value))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/lset/>
    pub async fn lset(&self, key: impl ToArg, index: i64, value: impl ToArg) -> Result<()> {
        self.run(Command::new("LSET").arg(key).arg(index).arg(value))
            .await?
            .ok()
    }

    /// Keeps only the elements between `start` and `stop`, both inclusive.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/ltrim/>
    pub async fn ltrim(&self, key: impl ToArg, start: i64, stop: i64) -> Result<()> {
        self.run(Command::new("LTRIM").arg(key).arg(start).arg(stop))
            .await?
            .ok()
    }
}
