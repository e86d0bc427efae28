use strum_macros::Display;

use crate::command::{Command, ToArg};
use crate::connection::Connection;
use crate::error::UsageError;
use crate::reply::{GeoPoint, NullString};
use crate::Result;

/// Distance unit accepted by `GEODIST`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum GeoUnit {
    #[default]
    #[strum(serialize = "m")]
    Meters,
    #[strum(serialize = "km")]
    Kilometers,
    #[strum(serialize = "mi")]
    Miles,
    #[strum(serialize = "ft")]
    Feet,
}

impl Connection {
    /// Adds members at the given positions, returning how many are new. Every point must name
    /// its member; nothing is sent otherwise.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/geoadd/>
    pub async fn geo_add(&self, key: impl ToArg, points: &[GeoPoint]) -> Result<i64> {
        let mut cmd = Command::new("GEOADD").arg(key);
        for point in points {
            let member = point.member.as_ref().ok_or(UsageError::MissingMember)?;
            cmd = cmd.arg(point.longitude).arg(point.latitude).arg(member);
        }
        self.run(cmd).await?.as_integer()
    }

    /// Positions of `members`, `None` for members that are not in the set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/geopos/>
    pub async fn geo_pos(&self, key: impl ToArg, members: &[&str]) -> Result<Vec<Option<GeoPoint>>> {
        let points = self
            .run(Command::new("GEOPOS").arg(key).args(members))
            .await?
            .as_geo_points()?;

        Ok(points
            .into_iter()
            .zip(members)
            .map(|(point, member)| {
                point.map(|point| GeoPoint {
                    member: Some(member.to_string()),
                    ..point
                })
            })
            .collect())
    }

    /// Distance between two members, `None` if either is missing.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/geodist/>
    pub async fn geo_dist(
        &self,
        key: impl ToArg,
        from: impl ToArg,
        to: impl ToArg,
        unit: GeoUnit,
    ) -> Result<Option<f64>> {
        let cmd = Command::new("GEODIST")
            .arg(key)
            .arg(from)
            .arg(to)
            .arg(unit.to_string());
        self.run(cmd).await?.as_optional_float()
    }

    /// Geohash strings of `members`, absent for members that are not in the set.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/geohash/>
    pub async fn geo_hash<M: ToArg>(&self, key: impl ToArg, members: &[M]) -> Result<Vec<NullString>> {
        self.run(Command::new("GEOHASH").arg(key).args(members))
            .await?
            .as_optional_string_sequence()
    }
}
