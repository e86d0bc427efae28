//! Typed wrappers over [`Connection::run`](crate::Connection::run), grouped by command family.
//!
//! Each wrapper builds one command and projects the reply through a single accessor, so a `-`
//! reply always surfaces as [`Error::Server`](crate::Error::Server).

pub mod bits;
pub mod connection;
pub mod geo;
pub mod hashes;
pub mod hyperloglog;
pub mod keys;
pub mod lists;
pub mod pubsub;
pub mod sets;
pub mod sorted_sets;
pub mod strings;
