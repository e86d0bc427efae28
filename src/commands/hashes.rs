use std::collections::HashMap;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::options::ScanOptions;
use crate::reply::NullString;
use crate::scan::{HashEntries, Scan};
use crate::Result;

impl Connection {
    /// `true` when `field` is new, `false` when an existing value was overwritten.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hset/>
    pub async fn hset(&self, key: impl ToArg, field: impl ToArg, value: impl ToArg) -> Result<bool> {
        self.run(Command::new("HSET").arg(key).arg(field).arg(value))
            .await?
            .as_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hget/>
    pub async fn hget(&self, key: impl ToArg, field: impl ToArg) -> Result<NullString> {
        self.run(Command::new("HGET").arg(key).arg(field))
            .await?
            .as_optional_string()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hgetall/>
    pub async fn hget_all(&self, key: impl ToArg) -> Result<HashMap<String, String>> {
        self.run(Command::new("HGETALL").arg(key))
            .await?
            .as_string_value_map()
    }

    /// Returns the number of fields removed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hdel/>
    pub async fn hdel<F: ToArg>(&self, key: impl ToArg, fields: &[F]) -> Result<i64> {
        self.run(Command::new("HDEL").arg(key).args(fields))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hexists/>
    pub async fn hexists(&self, key: impl ToArg, field: impl ToArg) -> Result<bool> {
        self.run(Command::new("HEXISTS").arg(key).arg(field))
            .await?
            .as_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hkeys/>
    pub async fn hkeys(&self, key: impl ToArg) -> Result<Vec<String>> {
        self.run(Command::new("HKEYS").arg(key))
            .await?
            .as_string_sequence()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hlen/>
    pub async fn hlen(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("HLEN").arg(key)).await?.as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hmget/>
    pub async fn hmget<F: ToArg>(&self, key: impl ToArg, fields: &[F]) -> Result<Vec<NullString>> {
        self.run(Command::new("HMGET").arg(key).args(fields))
            .await?
            .as_optional_string_sequence()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hincrby/>
    pub async fn hincr_by(&self, key: impl ToArg, field: impl ToArg, increment: i64) -> Result<i64> {
        self.run(Command::new("HINCRBY").arg(key).arg(field).arg(increment))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hincrbyfloat/>
    pub async fn hincr_by_float(
        &self,
        key: impl ToArg,
        field: impl ToArg,
        increment: f64,
    ) -> Result<f64> {
        self.run(Command::new("HINCRBYFLOAT").arg(key).arg(field).arg(increment))
            .await?
            .as_float()
    }

    /// Sets `field` only if it does not exist yet. `true` when the value was written.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hsetnx/>
    pub async fn hsetnx(&self, key: impl ToArg, field: impl ToArg, value: impl ToArg) -> Result<bool> {
        self.run(Command::new("HSETNX").arg(key).arg(field).arg(value))
            .await?
            .as_bool()
    }

    /// Sets several fields at once.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hmset/>
    pub async fn hmset<F: ToArg, V: ToArg>(&self, key: impl ToArg, pairs: &[(F, V)]) -> Result<()> {
        let cmd = pairs
            .iter()
            .fold(Command::new("HMSET").arg(key), |cmd, (field, value)| {
                cmd.arg(field).arg(value)
            });
        self.run(cmd).await?.ok()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hvals/>
    pub async fn hvals(&self, key: impl ToArg) -> Result<Vec<String>> {
        self.run(Command::new("HVALS").arg(key))
            .await?
            .as_string_sequence()
    }

    /// Length of the value stored at `field`, 0 when the field or the key is missing.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hstrlen/>
    pub async fn hstrlen(&self, key: impl ToArg, field: impl ToArg) -> Result<i64> {
        self.run(Command::new("HSTRLEN").arg(key).arg(field))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/hscan/>
    pub fn hscan(
        &self,
        key: impl ToArg,
        options: &[ScanOptions],
    ) -> Result<Scan<'_, Connection, HashEntries>> {
        Scan::hash(self, key, options)
    }
}
