use std::time::Duration;

use bytes::Bytes;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::options::ScanOptions;
use crate::scan::{Keys, Scan};
use crate::Result;

impl Connection {
    /// Number of `keys` that exist. A key given twice is counted twice.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/exists/>
    pub async fn exists<K: ToArg>(&self, keys: &[K]) -> Result<i64> {
        self.run(Command::new("EXISTS").args(keys)).await?.as_integer()
    }

    /// Removes `keys`, returning how many were removed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/del/>
    pub async fn del<K: ToArg>(&self, keys: &[K]) -> Result<i64> {
        self.run(Command::new("DEL").args(keys)).await?.as_integer()
    }

    /// Sets a timeout on `key`, truncated to whole seconds. `false` when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/expire/>
    pub async fn expire(&self, key: impl ToArg, timeout: Duration) -> Result<bool> {
        self.run(Command::new("EXPIRE").arg(key).arg(timeout.as_secs()))
            .await?
            .as_bool()
    }

    /// Ref: <https://redis.io/docs/latest/commands/persist/>
    pub async fn persist(&self, key: impl ToArg) -> Result<bool> {
        self.run(Command::new("PERSIST").arg(key)).await?.as_bool()
    }

    /// Remaining time to live. `None` for a key without expiry, [`crate::Error::KeyNotExist`] for
    /// a missing key.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/ttl/>
    pub async fn ttl(&self, key: impl ToArg) -> Result<Option<Duration>> {
        self.run(Command::new("TTL").arg(key)).await?.as_ttl()
    }

    /// Like [`Connection::ttl`] with millisecond precision.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pttl/>
    pub async fn pttl(&self, key: impl ToArg) -> Result<Option<Duration>> {
        self.run(Command::new("PTTL").arg(key)).await?.as_pttl()
    }

    /// The type name of the value at `key`, `none` when it does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/type/>
    pub async fn key_type(&self, key: impl ToArg) -> Result<String> {
        self.run(Command::new("TYPE").arg(key)).await?.as_string()
    }

    /// Serialized value of `key`, `None` when it does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/dump/>
    pub async fn dump(&self, key: impl ToArg) -> Result<Option<Bytes>> {
        self.run(Command::new("DUMP").arg(key)).await?.as_bytes()
    }

    /// Recreates `key` from a [`Connection::dump`] payload. A zero `ttl` means no expiry.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/restore/>
    pub async fn restore(&self, key: impl ToArg, ttl: Duration, payload: &[u8]) -> Result<()> {
        let cmd = Command::new("RESTORE")
            .arg(key)
            .arg(ttl.as_millis() as u64)
            .arg(payload);
        self.run(cmd).await?.ok()
    }

    /// Starts a cursor scan over the keys of the current database.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/scan/>
    pub fn scan(&self, options: &[ScanOptions]) -> Result<Scan<'_, Connection, Keys>> {
        Scan::keys(self, options)
    }
}
