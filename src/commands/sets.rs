use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::error::UsageError;
use crate::options::ScanOptions;
use crate::reply::NullString;
use crate::scan::{Scan, SetMembers};
use crate::Result;

impl Connection {
    /// Returns the number of members that were not already in the set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sadd/>
    pub async fn sadd<M: ToArg>(&self, key: impl ToArg, members: &[M]) -> Result<i64> {
        self.run(Command::new("SADD").arg(key).args(members))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/srem/>
    pub async fn srem<M: ToArg>(&self, key: impl ToArg, members: &[M]) -> Result<i64> {
        self.run(Command::new("SREM").arg(key).args(members))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/smembers/>
    pub async fn smembers(&self, key: impl ToArg) -> Result<Vec<String>> {
        self.run(Command::new("SMEMBERS").arg(key))
            .await?
            .as_string_sequence()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sismember/>
    pub async fn sismember(&self, key: impl ToArg, member: impl ToArg) -> Result<bool> {
        self.run(Command::new("SISMEMBER").arg(key).arg(member))
            .await?
            .as_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/scard/>
    pub async fn scard(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("SCARD").arg(key)).await?.as_integer()
    }

    /// Moves `member` from `source` to `destination`. `false` when it was not in `source`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/smove/>
    pub async fn smove(
        &self,
        source: impl ToArg,
        destination: impl ToArg,
        member: impl ToArg,
    ) -> Result<bool> {
        self.run(Command::new("SMOVE").arg(source).arg(destination).arg(member))
            .await?
            .as_bool()
    }

    /// Removes and returns a random member, absent when the set is empty.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/spop/>
    pub async fn spop(&self, key: impl ToArg) -> Result<NullString> {
        self.run(Command::new("SPOP").arg(key))
            .await?
            .as_optional_string()
    }

    /// Up to `count` distinct random members. A negative count allows repeats and always returns
    /// `-count` members of a non-empty set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/srandmember/>
    pub async fn srandmember(&self, key: impl ToArg, count: i64) -> Result<Vec<String>> {
        self.run(Command::new("SRANDMEMBER").arg(key).arg(count))
            .await?
            .as_string_sequence()
    }

    /// Members of the first set that are in none of the others.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sdiff/>
    pub async fn sdiff<K: ToArg>(&self, keys: &[K]) -> Result<Vec<String>> {
        self.set_algebra("SDIFF", keys).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/sinter/>
    pub async fn sinter<K: ToArg>(&self, keys: &[K]) -> Result<Vec<String>> {
        self.set_algebra("SINTER", keys).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/sunion/>
    pub async fn sunion<K: ToArg>(&self, keys: &[K]) -> Result<Vec<String>> {
        self.set_algebra("SUNION", keys).await
    }

    /// Stores the result of [`Connection::sdiff`] at `destination` and returns its size.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sdiffstore/>
    pub async fn sdiff_store<K: ToArg>(&self, destination: impl ToArg, keys: &[K]) -> Result<i64> {
        self.set_algebra_store("SDIFFSTORE", destination, keys).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/sinterstore/>
    pub async fn sinter_store<K: ToArg>(&self, destination: impl ToArg, keys: &[K]) -> Result<i64> {
        self.set_algebra_store("SINTERSTORE", destination, keys).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/sunionstore/>
    pub async fn sunion_store<K: ToArg>(&self, destination: impl ToArg, keys: &[K]) -> Result<i64> {
        self.set_algebra_store("SUNIONSTORE", destination, keys).await
    }

    async fn set_algebra<K: ToArg>(&self, name: &'static str, keys: &[K]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Err(UsageError::NoKeys(name).into());
        }
        self.run(Command::new(name).args(keys))
            .await?
            .as_string_sequence()
    }

    async fn set_algebra_store<K: ToArg>(
        &self,
        name: &'static str,
        destination: impl ToArg,
        keys: &[K],
    ) -> Result<i64> {
        if keys.is_empty() {
            return Err(UsageError::NoKeys(name).into());
        }
        self.run(Command::new(name).arg(destination).args(keys))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/sscan/>
    pub fn sscan(
        &self,
        key: impl ToArg,
        options: &[ScanOptions],
    ) -> Result<Scan<'_, Connection, SetMembers>> {
        Scan::set(self, key, options)
    }
}
