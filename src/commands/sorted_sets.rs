use strum_macros::Display;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::error::UsageError;
use crate::options::{single, LimitOptions, ScanOptions};
use crate::reply::SortedSetEntry;
use crate::scan::{Scan, SortedSetEntries};
use crate::Result;

/// How `ZUNIONSTORE` and `ZINTERSTORE` combine the scores of a member found in several sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Connection {
    /// Adds `(score, member)` pairs, returning how many members are new.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zadd/>
    pub async fn zadd<M: ToArg>(&self, key: impl ToArg, members: &[(f64, M)]) -> Result<i64> {
        let cmd = members
            .iter()
            .fold(Command::new("ZADD").arg(key), |cmd, (score, member)| {
                cmd.arg(score).arg(member)
            });
        self.run(cmd).await?.as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zcard/>
    pub async fn zcard(&self, key: impl ToArg) -> Result<i64> {
        self.run(Command::new("ZCARD").arg(key)).await?.as_integer()
    }

    /// `None` when the member or the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zscore/>
    pub async fn zscore(&self, key: impl ToArg, member: impl ToArg) -> Result<Option<f64>> {
        self.run(Command::new("ZSCORE").arg(key).arg(member))
            .await?
            .as_optional_float()
    }

    /// Returns the new score.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zincrby/>
    pub async fn zincr_by(&self, key: impl ToArg, increment: f64, member: impl ToArg) -> Result<f64> {
        self.run(Command::new("ZINCRBY").arg(key).arg(increment).arg(member))
            .await?
            .as_float()
    }

    /// Zero-based rank by ascending score. Fails with [`crate::Error::KeyNotExist`] when the
    /// member is missing.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrank/>
    pub async fn zrank(&self, key: impl ToArg, member: impl ToArg) -> Result<i64> {
        self.run(Command::new("ZRANK").arg(key).arg(member))
            .await?
            .as_rank_or_not_found()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrank/>
    pub async fn zrevrank(&self, key: impl ToArg, member: impl ToArg) -> Result<i64> {
        self.run(Command::new("ZREVRANK").arg(key).arg(member))
            .await?
            .as_rank_or_not_found()
    }

    /// Members ranked `start..=stop` by ascending score. Without `with_scores` every score is 0.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrange/>
    pub async fn zrange(
        &self,
        key: impl ToArg,
        start: i64,
        stop: i64,
        with_scores: bool,
    ) -> Result<Vec<SortedSetEntry>> {
        let cmd = Command::new("ZRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .arg_if(with_scores, "WITHSCORES");
        self.run(cmd).await?.as_sorted_set_sequence(with_scores)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrange/>
    pub async fn zrevrange(
        &self,
        key: impl ToArg,
        start: i64,
        stop: i64,
        with_scores: bool,
    ) -> Result<Vec<SortedSetEntry>> {
        let cmd = Command::new("ZREVRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .arg_if(with_scores, "WITHSCORES");
        self.run(cmd).await?.as_sorted_set_sequence(with_scores)
    }

    /// Members with a score between `min` and `max`. Bounds are sent verbatim, so `-inf`, `+inf`
    /// and exclusive bounds such as `(9` work.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrangebyscore/>
    pub async fn zrange_by_score(
        &self,
        key: impl ToArg,
        min: impl ToArg,
        max: impl ToArg,
        with_scores: bool,
        limit: &[LimitOptions],
    ) -> Result<Vec<SortedSetEntry>> {
        let mut cmd = Command::new("ZRANGEBYSCORE")
            .arg(key)
            .arg(min)
            .arg(max)
            .arg_if(with_scores, "WITHSCORES");
        if let Some(limit) = single(limit)? {
            cmd = limit.apply(cmd);
        }
        self.run(cmd).await?.as_sorted_set_sequence(with_scores)
    }

    /// The descending counterpart of [`Connection::zrange_by_score`]. Note that `max` comes
    /// first.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrevrangebyscore/>
    pub async fn zrevrange_by_score(
        &self,
        key: impl ToArg,
        max: impl ToArg,
        min: impl ToArg,
        with_scores: bool,
        limit: &[LimitOptions],
    ) -> Result<Vec<SortedSetEntry>> {
        let mut cmd = Command::new("ZREVRANGEBYSCORE")
            .arg(key)
            .arg(max)
            .arg(min)
            .arg_if(with_scores, "WITHSCORES");
        if let Some(limit) = single(limit)? {
            cmd = limit.apply(cmd);
        }
        self.run(cmd).await?.as_sorted_set_sequence(with_scores)
    }

    /// Members between `min` and `max` in lexicographical order, for sets whose members all share
    /// one score. Bounds take the `[a`, `(a`, `-` and `+` forms.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrangebylex/>
    pub async fn zrange_by_lex(
        &self,
        key: impl ToArg,
        min: impl ToArg,
        max: impl ToArg,
        limit: &[LimitOptions],
    ) -> Result<Vec<String>> {
        let mut cmd = Command::new("ZRANGEBYLEX").arg(key).arg(min).arg(max);
        if let Some(limit) = single(limit)? {
            cmd = limit.apply(cmd);
        }
        self.run(cmd).await?.as_string_sequence()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zlexcount/>
    pub async fn zlex_count(&self, key: impl ToArg, min: impl ToArg, max: impl ToArg) -> Result<i64> {
        self.run(Command::new("ZLEXCOUNT").arg(key).arg(min).arg(max))
            .await?
            .as_integer()
    }

    /// Members with a score between `min` and `max`, bounds as in
    /// [`Connection::zrange_by_score`].
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zcount/>
    pub async fn zcount(&self, key: impl ToArg, min: impl ToArg, max: impl ToArg) -> Result<i64> {
        self.run(Command::new("ZCOUNT").arg(key).arg(min).arg(max))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrem/>
    pub async fn zrem<M: ToArg>(&self, key: impl ToArg, members: &[M]) -> Result<i64> {
        self.run(Command::new("ZREM").arg(key).args(members))
            .await?
            .as_integer()
    }

    /// Removes the members ranked `start..=stop`, returning how many were removed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zremrangebyrank/>
    pub async fn zrem_range_by_rank(&self, key: impl ToArg, start: i64, stop: i64) -> Result<i64> {
        self.run(Command::new("ZREMRANGEBYRANK").arg(key).arg(start).arg(stop))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zremrangebyscore/>
    pub async fn zrem_range_by_score(
        &self,
        key: impl ToArg,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<i64> {
        self.run(Command::new("ZREMRANGEBYSCORE").arg(key).arg(min).arg(max))
            .await?
            .as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zremrangebylex/>
    pub async fn zrem_range_by_lex(
        &self,
        key: impl ToArg,
        min: impl ToArg,
        max: impl ToArg,
    ) -> Result<i64> {
        self.run(Command::new("ZREMRANGEBYLEX").arg(key).arg(min).arg(max))
            .await?
            .as_integer()
    }

    /// Stores the union of `keys` at `destination` and returns its size. Each set's scores are
    /// multiplied by its weight first; no weights means 1 for every set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zunionstore/>
    pub async fn zunion_store<K: ToArg>(
        &self,
        destination: impl ToArg,
        keys: &[K],
        weights: &[f64],
        aggregate: Aggregate,
    ) -> Result<i64> {
        let cmd = combine("ZUNIONSTORE", destination, keys, weights, aggregate)?;
        self.run(cmd).await?.as_integer()
    }

    /// Like [`Connection::zunion_store`], keeping only members present in every set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zinterstore/>
    pub async fn zinter_store<K: ToArg>(
        &self,
        destination: impl ToArg,
        keys: &[K],
        weights: &[f64],
        aggregate: Aggregate,
    ) -> Result<i64> {
        let cmd = combine("ZINTERSTORE", destination, keys, weights, aggregate)?;
        self.run(cmd).await?.as_integer()
    }

    /// Ref: <https://redis.io/docs/latest/commands/zscan/>
    pub fn zscan(
        &self,
        key: impl ToArg,
        options: &[ScanOptions],
    ) -> Result<Scan<'_, Connection, SortedSetEntries>> {
        Scan::sorted_set(self, key, options)
    }
}

fn combine<K: ToArg>(
    name: &'static str,
    destination: impl ToArg,
    keys: &[K],
    weights: &[f64],
    aggregate: Aggregate,
) -> std::result::Result<Command, UsageError> {
    if keys.is_empty() {
        return Err(UsageError::NoKeys(name));
    }
    if !weights.is_empty() && weights.len() != keys.len() {
        return Err(UsageError::WeightsMismatch {
            keys: keys.len(),
            weights: weights.len(),
        });
    }

    let mut cmd = Command::new(name).arg(destination).arg(keys.len()).args(keys);
    if !weights.is_empty() {
        cmd = cmd.arg("WEIGHTS").args(weights);
    }
    Ok(cmd.arg("AGGREGATE").arg(aggregate.to_string()))
}
