use std::collections::HashMap;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::Result;

impl Connection {
    /// Returns the number of clients that received the message.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/publish/>
    pub async fn publish(&self, channel: impl ToArg, message: impl ToArg) -> Result<i64> {
        self.run(Command::new("PUBLISH").arg(channel).arg(message))
            .await?
            .as_integer()
    }

    /// Channels with at least one subscriber, optionally filtered by a glob pattern.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pubsub-channels/>
    pub async fn pubsub_channels(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        let cmd = Command::new("PUBSUB").arg("CHANNELS");
        let cmd = match pattern {
            Some(pattern) => cmd.arg(pattern),
            None => cmd,
        };
        self.run(cmd).await?.as_string_sequence()
    }

    /// Subscriber count per channel.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pubsub-numsub/>
    pub async fn pubsub_numsub<C: ToArg>(&self, channels: &[C]) -> Result<HashMap<String, i64>> {
        self.run(Command::new("PUBSUB").arg("NUMSUB").args(channels))
            .await?
            .as_string_integer_map()
    }

    /// Number of pattern subscriptions across all clients.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/pubsub-numpat/>
    pub async fn pubsub_numpat(&self) -> Result<i64> {
        self.run(Command::new("PUBSUB").arg("NUMPAT"))
            .await?
            .as_integer()
    }
}
