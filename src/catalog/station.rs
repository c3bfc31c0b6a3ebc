//! Station identity and metadata, plus the spatial-index impls that let the
//! catalog keep stations in an `rstar` R-tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLon;

/// A station id that failed to parse.
#[derive(Debug, Error)]
#[error("'{0}' is not a USAF-WBAN station id")]
pub struct ParseStationIdError(pub String);

/// Composite station key: six-digit USAF site id plus five-digit WBAN
/// sub-identifier, rendered `"xxxxxx-xxxxx"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId {
    usaf: String,
    wban: String,
}

impl StationId {
    /// Builds an id from its two parts, enforcing the fixed digit widths.
    pub fn new(usaf: &str, wban: &str) -> Result<Self, ParseStationIdError> {
        let ok = usaf.len() == 6
            && wban.len() == 5
            && usaf.bytes().all(|b| b.is_ascii_digit())
            && wban.bytes().all(|b| b.is_ascii_digit());
        if !ok {
            return Err(ParseStationIdError(format!("{usaf}-{wban}")));
        }
        Ok(Self {
            usaf: usaf.to_string(),
            wban: wban.to_string(),
        })
    }

    pub fn usaf(&self) -> &str {
        &self.usaf
    }

    pub fn wban(&self) -> &str {
        &self.wban
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.usaf, self.wban)
    }
}

impl FromStr for StationId {
    type Err = ParseStationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (usaf, wban) = s
            .split_once('-')
            .ok_or_else(|| ParseStationIdError(s.to_string()))?;
        Self::new(usaf, wban).map_err(|_| ParseStationIdError(s.to_string()))
    }
}

/// The inclusive interval a station was active, per the history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ActiveSpan {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the whole `[start, end]` interval lies inside the span.
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= start && end <= self.end
    }
}

/// One ground station from the history file. Read-only after catalog load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    /// Display name, as printed in the history file.
    pub name: String,
    /// Region (US state) code, when listed.
    pub region: Option<String>,
    pub location: LatLon,
    pub active: ActiveSpan,
}

impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.0, self.location.1])
    }
}

impl PointDistance for Station {
    /// Squared Euclidean distance in degree space. Used only to order R-tree
    /// traversal; real ranking always goes through
    /// [`crate::geo::distance_miles`].
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.0 - point[0];
        let dy = self.location.1 - point[1];
        dx * dx + dy * dy
    }
}
