//! Typed projections of a [`Reply`].
//!
//! Every accessor forwards a [`Reply::Error`] as [`Error::Server`] before looking at anything
//! else, so a failed command never turns into a default value.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use itertools::Itertools;

use crate::error::{Error, ProtocolError};
use crate::reply::{GeoPoint, NullString, Reply, SortedSetEntry};
use crate::Result;

impl Reply {
    /// Turns an error reply into `Err`, passing every other reply through.
    pub fn into_result(self) -> Result<Reply> {
        match self {
            Reply::Error(msg) => Err(Error::Server(msg)),
            reply => Ok(reply),
        }
    }

    /// For status replies such as `+OK`: anything but an error is success.
    pub fn ok(self) -> Result<()> {
        self.into_result().map(|_| ())
    }

    pub fn as_integer(self) -> Result<i64> {
        match self.into_result()? {
            Reply::Integer(i) => Ok(i),
            reply => Err(mismatch("integer", &reply)),
        }
    }

    /// Redis booleans are integers, and only `1` means true.
    pub fn as_bool(self) -> Result<bool> {
        Ok(matches!(self.into_result()?, Reply::Integer(1)))
    }

    pub fn as_optional_string(self) -> Result<NullString> {
        match self.into_result()? {
            Reply::Null => Ok(NullString::absent()),
            Reply::Simple(s) => Ok(NullString::present(s)),
            Reply::Bulk(bytes) => Ok(NullString::present(utf8(bytes)?)),
            reply => Err(mismatch("string or null", &reply)),
        }
    }

    pub fn as_string(self) -> Result<String> {
        match self.into_result()? {
            Reply::Simple(s) => Ok(s),
            Reply::Bulk(bytes) => utf8(bytes),
            reply => Err(mismatch("string", &reply)),
        }
    }

    /// Binary-safe string access, `None` for the null bulk string.
    pub fn as_bytes(self) -> Result<Option<Bytes>> {
        match self.into_result()? {
            Reply::Null => Ok(None),
            Reply::Bulk(bytes) => Ok(Some(bytes)),
            Reply::Simple(s) => Ok(Some(Bytes::from(s))),
            reply => Err(mismatch("bulk string or null", &reply)),
        }
    }

    pub fn as_array(self) -> Result<Vec<Reply>> {
        match self.into_result()? {
            Reply::Array(replies) => Ok(replies),
            reply => Err(mismatch("array", &reply)),
        }
    }

    pub fn as_string_sequence(self) -> Result<Vec<String>> {
        self.as_array()?.into_iter().map(Reply::as_string).collect()
    }

    /// Like [`Reply::as_string_sequence`], with `nil` elements kept as absent entries.
    pub fn as_optional_string_sequence(self) -> Result<Vec<NullString>> {
        self.as_array()?
            .into_iter()
            .map(Reply::as_optional_string)
            .collect()
    }

    /// Flat `key, value, key, value, ...` arrays, in server order.
    pub fn as_pairs(self) -> Result<Vec<(String, String)>> {
        let replies = self.as_array()?;
        if replies.len() % 2 != 0 {
            return Err(ProtocolError::OddLength(replies.len()).into());
        }

        replies
            .into_iter()
            .tuples()
            .map(|(key, value)| -> Result<(String, String)> {
                Ok((key.as_string()?, value.as_string()?))
            })
            .collect()
    }

    pub fn as_string_value_map(self) -> Result<HashMap<String, String>> {
        Ok(self.as_pairs()?.into_iter().collect())
    }

    /// Flat `name, integer` arrays such as the reply of `PUBSUB NUMSUB`.
    pub fn as_string_integer_map(self) -> Result<HashMap<String, i64>> {
        let replies = self.as_array()?;
        if replies.len() % 2 != 0 {
            return Err(ProtocolError::OddLength(replies.len()).into());
        }

        replies
            .into_iter()
            .tuples()
            .map(|(name, count)| -> Result<(String, i64)> {
                Ok((name.as_string()?, count.as_integer()?))
            })
            .collect()
    }

    /// Floats travel as bulk strings. A malformed number is an error, never zero.
    pub fn as_float(self) -> Result<f64> {
        match self.into_result()? {
            Reply::Integer(i) => Ok(i as f64),
            Reply::Simple(s) => parse_float(&s),
            Reply::Bulk(bytes) => parse_float(&utf8(bytes)?),
            reply => Err(mismatch("float", &reply)),
        }
    }

    pub fn as_optional_float(self) -> Result<Option<f64>> {
        match self.into_result()? {
            Reply::Null => Ok(None),
            reply => reply.as_float().map(Some),
        }
    }

    /// Integers with `nil` holes, such as the reply of `BITFIELD` after an `OVERFLOW FAIL`.
    pub fn as_optional_integer_sequence(self) -> Result<Vec<Option<i64>>> {
        self.as_array()?
            .into_iter()
            .map(|reply| match reply.into_result()? {
                Reply::Null => Ok(None),
                reply => reply.as_integer().map(Some),
            })
            .collect()
    }

    /// The `[key, element]` reply of the blocking pops, `None` once the timeout ran out. The
    /// timeout arrives as a null array, which decodes as an empty one.
    pub fn as_optional_pair(self) -> Result<Option<(String, String)>> {
        let replies = match self.into_result()? {
            Reply::Null => return Ok(None),
            Reply::Array(replies) if replies.is_empty() => return Ok(None),
            Reply::Array(replies) if replies.len() == 2 => replies,
            reply => return Err(mismatch("pair or null", &reply)),
        };

        let (key, value) = replies
            .into_iter()
            .collect_tuple()
            .ok_or_else(|| mismatch("pair or null", &Reply::Null))?;
        Ok(Some((key.as_string()?, value.as_string()?)))
    }

    /// Sorted-set members, optionally interleaved with their scores. Without scores every entry
    /// gets a score of `0`.
    pub fn as_sorted_set_sequence(self, with_scores: bool) -> Result<Vec<SortedSetEntry>> {
        if !with_scores {
            return self
                .as_string_sequence()?
                .into_iter()
                .map(|member| Ok(SortedSetEntry { member, score: 0.0 }))
                .collect();
        }

        let replies = self.as_array()?;
        if replies.len() % 2 != 0 {
            return Err(ProtocolError::OddLength(replies.len()).into());
        }

        replies
            .into_iter()
            .tuples()
            .map(|(member, score)| -> Result<SortedSetEntry> {
                Ok(SortedSetEntry {
                    member: member.as_string()?,
                    score: score.as_float()?,
                })
            })
            .collect()
    }

    /// `ZRANK`-style replies, where `nil` means the member is missing.
    pub fn as_rank_or_not_found(self) -> Result<i64> {
        match self.into_result()? {
            Reply::Null => Err(Error::KeyNotExist),
            reply => reply.as_integer(),
        }
    }

    /// `TTL` replies: `-2` is a missing key, `-1` a key without expiry.
    pub fn as_ttl(self) -> Result<Option<Duration>> {
        self.as_ttl_in(Duration::from_secs)
    }

    /// `PTTL` replies, in milliseconds.
    pub fn as_pttl(self) -> Result<Option<Duration>> {
        self.as_ttl_in(Duration::from_millis)
    }

    fn as_ttl_in(self, unit: fn(u64) -> Duration) -> Result<Option<Duration>> {
        match self.as_integer()? {
            -2 => Err(Error::KeyNotExist),
            -1 => Ok(None),
            n if n >= 0 => Ok(Some(unit(n as u64))),
            n => Err(ProtocolError::InvalidNumber(n.to_string()).into()),
        }
    }

    /// `GEOPOS` replies: one `[longitude, latitude]` pair per requested member, `nil` when the
    /// member is missing.
    pub fn as_geo_points(self) -> Result<Vec<Option<GeoPoint>>> {
        self.as_array()?
            .into_iter()
            .map(|position| -> Result<Option<GeoPoint>> {
                let coordinates = match position.into_result()? {
                    Reply::Null => return Ok(None),
                    Reply::Array(coordinates) if coordinates.is_empty() => return Ok(None),
                    Reply::Array(coordinates) => coordinates,
                    reply => return Err(mismatch("coordinate pair or null", &reply)),
                };

                let (longitude, latitude) = coordinates
                    .into_iter()
                    .collect_tuple()
                    .ok_or_else(|| mismatch("coordinate pair", &Reply::Null))?;

                Ok(Some(GeoPoint {
                    longitude: longitude.as_float()?,
                    latitude: latitude.as_float()?,
                    member: None,
                }))
            })
            .collect()
    }
}

pub(crate) fn mismatch(expected: &'static str, actual: &Reply) -> Error {
    ProtocolError::UnexpectedReply {
        expected,
        actual: actual.kind().to_string(),
    }
    .into()
}

fn utf8(bytes: Bytes) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8.into())
}

fn parse_float(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| ProtocolError::InvalidNumber(s.to_string()).into())
}
