//! An asynchronous client for servers speaking RESP2, the Redis serialization protocol.
//!
//! ```no_run
//! # async fn demo() -> respire::Result<()> {
//! let conn = respire::Connection::connect("127.0.0.1:6379").await?;
//! conn.set("greeting", "hello", &[]).await?;
//! assert_eq!(conn.get("greeting").await?.into_option().as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod command;
pub mod commands;
pub mod config;
pub mod connection;
mod convert;
mod decoder;
pub mod error;
pub mod options;
pub mod pubsub;
pub mod reader;
pub mod reply;
pub mod scan;

pub use codec::encode;
pub use command::{Command, ToArg};
pub use commands::bits::{BitField, BitFieldType, BitOp, Overflow};
pub use commands::geo::GeoUnit;
pub use commands::lists::InsertPosition;
pub use commands::sorted_sets::Aggregate;
pub use config::Config;
pub use connection::{Connection, Execute};
pub use error::{Error, ProtocolError, UsageError};
pub use options::{LimitOptions, ScanOptions, SetOptions};
pub use pubsub::{Event, Message, Subscription, TopicKind};
pub use reply::{GeoPoint, NullString, Reply, SortedSetEntry};
pub use scan::{Cursor, Scan};

pub type Result<T> = std::result::Result<T, Error>;
