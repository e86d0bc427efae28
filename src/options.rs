//! Optional argument groups accepted by some commands.
//!
//! Commands take them as a slice so that "no options" needs no placeholder; more than one value
//! is rejected before anything is sent.

use std::time::Duration;

use crate::command::Command;
use crate::error::UsageError;

/// Returns the only element of `options`, `None` for an empty slice, and a usage error otherwise.
pub fn single<T>(options: &[T]) -> Result<Option<&T>, UsageError> {
    match options {
        [] => Ok(None),
        [option] => Ok(Some(option)),
        _ => Err(UsageError::TooManyOptions(options.len())),
    }
}

/// `MATCH` / `COUNT` for the SCAN family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOptions {
    pub pattern: Option<String>,
    /// A hint for how many elements a page should hold; the server may return more or fewer.
    pub count: Option<u64>,
}

impl ScanOptions {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            count: None,
        }
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn apply(&self, mut cmd: Command) -> Command {
        if let Some(pattern) = &self.pattern {
            cmd = cmd.arg("MATCH").arg(pattern);
        }
        if let Some(count) = self.count {
            cmd = cmd.arg("COUNT").arg(count);
        }
        cmd
    }
}

/// `SET key value [PX milliseconds] [NX|XX]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    /// Ignored below one millisecond.
    pub expire: Option<Duration>,
    /// Only set the key if it does not already exist.
    pub nx: bool,
    /// Only set the key if it already exists.
    pub xx: bool,
}

impl SetOptions {
    pub(crate) fn apply(&self, mut cmd: Command) -> Result<Command, UsageError> {
        if self.nx && self.xx {
            return Err(UsageError::ConflictingOptions);
        }

        if let Some(expire) = self.expire.filter(|e| *e >= Duration::from_millis(1)) {
            cmd = cmd.arg("PX").arg(expire.as_millis() as u64);
        }

        Ok(cmd.arg_if(self.nx, "NX").arg_if(self.xx, "XX"))
    }
}

/// `LIMIT offset count` for range queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitOptions {
    pub offset: i64,
    pub count: i64,
}

impl LimitOptions {
    pub(crate) fn apply(&self, cmd: Command) -> Command {
        cmd.arg("LIMIT").arg(self.offset).arg(self.count)
    }
}
