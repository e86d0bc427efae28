//! Connection settings.

use std::time::Duration;

use crate::reader::{DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LINE_LEN};

pub const DEFAULT_ADDR: &str = "127.0.0.1:6379";
/// Pending events a subscription queue holds before the receive task blocks.
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// `host:port` of the server.
    pub addr: String,

    /// Upper bound for establishing the TCP connection. `None` waits as long as the OS does.
    pub connect_timeout: Option<Duration>,

    /// Capacity of each subscription's delivery queue. A full queue stalls the receive task, and
    /// with it every subscription on the connection.
    pub subscription_capacity: usize,

    /// Deepest array nesting accepted from the server.
    pub max_depth: usize,

    /// Largest bulk string accepted from the server, in bytes.
    pub max_bulk_len: usize,

    /// Longest simple string, error or length line accepted from the server, in bytes.
    pub max_line_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            connect_timeout: Some(Duration::from_secs(1)),
            subscription_capacity: DEFAULT_SUBSCRIPTION_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl Config {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn subscription_capacity(mut self, capacity: usize) -> Self {
        // tokio's bounded channel panics on a zero capacity.
        self.subscription_capacity = capacity.max(1);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_bulk_len(mut self, len: usize) -> Self {
        self.max_bulk_len = len;
        self
    }

    pub fn max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }
}
