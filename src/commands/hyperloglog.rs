use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::error::UsageError;
use crate::Result;

impl Connection {
    /// `true` when the estimated cardinality changed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pfadd/>
    pub async fn pf_add<E: ToArg>(&self, key: impl ToArg, elements: &[E]) -> Result<bool> {
        self.run(Command::new("PFADD").arg(key).args(elements))
            .await?
            .as_bool()
    }

    /// Approximate cardinality of the union of `keys`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pfcount/>
    pub async fn pf_count<K: ToArg>(&self, keys: &[K]) -> Result<i64> {
        if keys.is_empty() {
            return Err(UsageError::NoKeys("PFCOUNT").into());
        }
        self.run(Command::new("PFCOUNT").args(keys))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/pfmerge/>
    pub async fn pf_merge<K: ToArg>(&self, destination: impl ToArg, sources: &[K]) -> Result<()> {
        self.run(Command::new("PFMERGE").arg(destination).args(sources))
            .await?
            .ok()
    }
}
