use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::Result;

impl Connection {
    /// Ref: <https://redis.io/docs/latest/commands/auth/>
    pub async fn auth(&self, password: impl ToArg) -> Result<()> {
        self.run(Command::new("AUTH").arg(password)).await?.ok()
    }

    /// Ref: <https://redis.io/docs/latest/commands/echo/>
    pub async fn echo(&self, message: impl ToArg) -> Result<String> {
        self.run(Command::new("ECHO").arg(message)).await?.as_string()
    }

    /// Returns `PONG`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/ping/>
    pub async fn ping(&self) -> Result<String> {
        self.run(Command::new("PING")).await?.as_string()
    }

    /// Switches the logical database used by every clone of this connection.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/select/>
    pub async fn select(&self, index: i64) -> Result<()> {
        self.run(Command::new("SELECT").arg(index)).await?.ok()
    }

    /// Asks the server to close the connection. Later commands fail with an I/O error.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/quit/>
    pub async fn quit(&self) -> Result<()> {
        self.run(Command::new("QUIT")).await?.ok()
    }

    /// Ref: <https://redis.io/docs/latest/commands/flushdb/>
    pub async fn flush_db(&self) -> Result<()> {
        self.run(Command::new("FLUSHDB")).await?.ok()
    }
}
