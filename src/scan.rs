//! Cursor-based iteration over the SCAN family.

use std::marker::PhantomData;

use bytes::Bytes;
use tracing::debug;

use crate::command::{Command, ToArg};
use crate::connection::Execute;
use crate::convert::mismatch;
use crate::error::{Error, ProtocolError};
use crate::options::{single, ScanOptions};
use crate::reply::{Reply, SortedSetEntry};
use crate::Result;

/// Which command a [`Scan`] issues and how it reads a page.
pub trait ScanKind {
    type Item;
    const COMMAND: &'static str;

    fn decode_page(page: Reply) -> Result<Vec<Self::Item>>;
}

/// `SCAN`: key names.
#[derive(Debug)]
pub enum Keys {}

/// `SSCAN`: set members.
#[derive(Debug)]
pub enum SetMembers {}

/// `HSCAN`: field/value pairs.
#[derive(Debug)]
pub enum HashEntries {}

/// `ZSCAN`: members with their scores.
#[derive(Debug)]
pub enum SortedSetEntries {}

impl ScanKind for Keys {
    type Item = String;
    const COMMAND: &'static str = "SCAN";

    fn decode_page(page: Reply) -> Result<Vec<String>> {
        page.as_string_sequence()
    }
}

impl ScanKind for SetMembers {
    type Item = String;
    const COMMAND: &'static str = "SSCAN";

    fn decode_page(page: Reply) -> Result<Vec<String>> {
        page.as_string_sequence()
    }
}

impl ScanKind for HashEntries {
    type Item = (String, String);
    const COMMAND: &'static str = "HSCAN";

    fn decode_page(page: Reply) -> Result<Vec<(String, String)>> {
        page.as_pairs()
    }
}

impl ScanKind for SortedSetEntries {
    type Item = SortedSetEntry;
    const COMMAND: &'static str = "ZSCAN";

    fn decode_page(page: Reply) -> Result<Vec<SortedSetEntry>> {
        page.as_sorted_set_sequence(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cursor {
    NotStarted,
    InProgress(u64),
    Exhausted,
}

/// One scan session.
///
/// Every item fetched is kept, so [`Scan::all`] can return the whole session even after pages
/// were consumed through [`Scan::next`].
pub struct Scan<'a, E: ?Sized, K: ScanKind> {
    executor: &'a E,
    key: Option<Bytes>,
    options: Option<ScanOptions>,
    cursor: Cursor,
    items: Vec<K::Item>,
    // Items already handed to an `each` callback.
    delivered: usize,
    kind: PhantomData<K>,
}

impl<'a, E: Execute + ?Sized> Scan<'a, E, Keys> {
    /// Iterates over the keys of the current database.
    pub fn keys(executor: &'a E, options: &[ScanOptions]) -> Result<Self> {
        Scan::start(executor, None, options)
    }
}

impl<'a, E: Execute + ?Sized> Scan<'a, E, SetMembers> {
    pub fn set(executor: &'a E, key: impl ToArg, options: &[ScanOptions]) -> Result<Self> {
        Scan::start(executor, Some(key.to_arg()), options)
    }
}

impl<'a, E: Execute + ?Sized> Scan<'a, E, HashEntries> {
    pub fn hash(executor: &'a E, key: impl ToArg, options: &[ScanOptions]) -> Result<Self> {
        Scan::start(executor, Some(key.to_arg()), options)
    }
}

impl<'a, E: Execute + ?Sized> Scan<'a, E, SortedSetEntries> {
    pub fn sorted_set(
        executor: &'a E,
        key: impl ToArg,
        options: &[ScanOptions],
    ) -> Result<Self> {
        Scan::start(executor, Some(key.to_arg()), options)
    }
}

impl<'a, E: Execute + ?Sized, K: ScanKind> Scan<'a, E, K> {
    fn start(executor: &'a E, key: Option<Bytes>, options: &[ScanOptions]) -> Result<Self> {
        let options = single(options)?.cloned();

        Ok(Scan {
            executor,
            key,
            options,
            cursor: Cursor::NotStarted,
            items: Vec::new(),
            delivered: 0,
            kind: PhantomData,
        })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Fetches the next page and returns it.
    ///
    /// Fails with [`Error::IteratorEnd`] once the server has returned cursor 0.
    pub async fn next(&mut self) -> Result<&[K::Item]> {
        let cursor = match self.cursor {
            Cursor::Exhausted => return Err(Error::IteratorEnd),
            Cursor::NotStarted => 0,
            Cursor::InProgress(cursor) => cursor,
        };

        let mut cmd = Command::new(K::COMMAND);
        if let Some(key) = &self.key {
            cmd = cmd.arg(key);
        }
        cmd = cmd.arg(cursor);
        if let Some(options) = &self.options {
            cmd = options.apply(cmd);
        }

        let reply = self.executor.execute(cmd).await?;
        let (next, page) = split_reply(reply)?;
        let page = K::decode_page(page)?;

        debug!(command = K::COMMAND, cursor, next, items = page.len(), "scan page");

        self.cursor = if next == 0 {
            Cursor::Exhausted
        } else {
            Cursor::InProgress(next)
        };

        let start = self.items.len();
        self.items.extend(page);
        Ok(&self.items[start..])
    }

    /// Fetches every remaining page and returns everything the session has seen.
    pub async fn all(&mut self) -> Result<&[K::Item]> {
        loop {
            match self.next().await {
                Ok(_) => {}
                Err(Error::IteratorEnd) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(&self.items)
    }

    /// Calls `f` with the session-wide index of every item not handed out before, fetching pages
    /// as needed. The first error, from the server or from `f`, stops the iteration.
    pub async fn each<F, Failure>(&mut self, mut f: F) -> std::result::Result<(), Failure>
    where
        F: FnMut(usize, &K::Item) -> std::result::Result<(), Failure>,
        Failure: From<Error>,
    {
        loop {
            while self.delivered < self.items.len() {
                let index = self.delivered;
                self.delivered += 1;
                f(index, &self.items[index])?;
            }

            match self.next().await {
                Ok(_) => {}
                Err(Error::IteratorEnd) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Everything fetched so far.
    pub fn items(&self) -> &[K::Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<K::Item> {
        self.items
    }
}

/// Splits a `[cursor, page]` reply.
fn split_reply(reply: Reply) -> Result<(u64, Reply)> {
    let reply = reply.into_result()?;
    let actual = mismatch("[cursor, page]", &reply);

    let mut items = match reply {
        Reply::Array(items) if items.len() == 2 => items.into_iter(),
        _ => return Err(actual),
    };

    let (Some(cursor), Some(page)) = (items.next(), items.next()) else {
        return Err(actual);
    };

    let cursor = cursor.as_string()?;
    let cursor = cursor
        .parse::<u64>()
        .map_err(|_| ProtocolError::InvalidNumber(cursor.clone()))?;

    Ok((cursor, page))
}
