//! Query value types: what to look up, where, over which dates, and how to
//! behave when a field cannot be resolved.
//!
//! A [`Query`] is immutable once built. Validation happens before any fetch
//! work begins, with a specific diagnosis per defect.

use std::fmt;
use std::str::FromStr;

use bon::Builder;
use chrono::NaiveDate;
use thiserror::Error;

use crate::fields::FieldCode;
use crate::geo::LatLon;

/// A rejected query, diagnosed before any fetch work starts.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown field name '{0}'")]
    UnknownField(String),

    #[error("a query must request at least one field")]
    EmptyFields,

    #[error("end date {end} precedes start date {start}")]
    InvertedDates { start: NaiveDate, end: NaiveDate },

    #[error("'{0}' is not a YYYYMMDD date")]
    BadDate(String),

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeRange(f64),

    #[error("'{0}' is not a 'lat,lon' coordinate pair")]
    BadLocation(String),

    #[error("'{0}' is not a granularity (expected 'hourly' or 'daily')")]
    BadGranularity(String),

    #[error("malformed batch line '{0}' (expected name|dates|lat,lon|fields[|granularity])")]
    MalformedBatchLine(String),
}

/// A closed date interval. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Builds a span, rejecting inverted bounds. `start == end` is a
    /// single-day span.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if end < start {
            return Err(QueryError::InvertedDates { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYYMMDD` (single day) or `YYYYMMDD,YYYYMMDD` (inclusive
    /// start and end).
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        match s.split_once(',') {
            Some((a, b)) => Self::new(parse_date(a)?, parse_date(b)?),
            None => {
                let day = parse_date(s)?;
                Self::new(day, day)
            }
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the span, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.succ_opt().filter(|next| *next <= end)
        })
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, QueryError> {
    let trimmed = s.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QueryError::BadDate(trimmed.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .map_err(|_| QueryError::BadDate(trimmed.to_string()))
}

/// The temporal grain of assembled rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One row per observed (date, hour).
    #[default]
    Hourly,
    /// One row per date; numeric fields averaged over the day.
    Daily,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Hourly => f.write_str("hourly"),
            Granularity::Daily => f.write_str("daily"),
        }
    }
}

impl FromStr for Granularity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Granularity::Hourly),
            "daily" => Ok(Granularity::Daily),
            _ => Err(QueryError::BadGranularity(s.trim().to_string())),
        }
    }
}

/// What to do when no qualifying station exists for some (epoch, field).
///
/// Declared on the query before execution starts; a concurrent batch cannot
/// stop to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Proceed; the affected (date, field) pairs stay missing and the query
    /// reports partial success.
    #[default]
    MarkMissing,
    /// Fail the whole batch before any raw data is fetched.
    AbortBatch,
}

/// One request for an assembled time series at a point location.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use noaahist::{DateSpan, FieldCode, Granularity, LatLon, Query};
///
/// let span = DateSpan::new(
///     NaiveDate::from_ymd_opt(2013, 6, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2013, 6, 30).unwrap(),
/// ).unwrap();
///
/// let query = Query::builder()
///     .name("golden_gate")
///     .location(LatLon(37.8199, -122.4783))
///     .span(span)
///     .fields(vec![FieldCode::Temp, FieldCode::Spd])
///     .granularity(Granularity::Daily)
///     .build();
///
/// assert!(query.validate().is_ok());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct Query {
    /// Display name carried onto every output row. Defaults to empty.
    #[builder(into, default)]
    pub name: String,
    /// The point the time series should describe.
    pub location: LatLon,
    /// Inclusive date interval.
    pub span: DateSpan,
    /// Requested fields; must be non-empty.
    pub fields: Vec<FieldCode>,
    /// Output grain. Defaults to hourly.
    #[builder(default)]
    pub granularity: Granularity,
    /// Unresolved-field behavior. Defaults to mark-missing.
    #[builder(default)]
    pub unresolved: UnresolvedPolicy,
    /// Emit a per-(field, station) coverage report alongside the rows.
    #[builder(default)]
    pub coverage_report: bool,
}

impl Query {
    /// Checks the query before any resolution or fetch work.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.fields.is_empty() {
            return Err(QueryError::EmptyFields);
        }
        let LatLon(lat, lon) = self.location;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(QueryError::LatitudeRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(QueryError::LongitudeRange(lon));
        }
        Ok(())
    }

    /// Parses one pipe-delimited batch input line:
    /// `name|date_or_start,end|lat,lon|field1,field2,...[|granularity]`.
    pub fn parse_batch_line(line: &str) -> Result<Self, QueryError> {
        let parts: Vec<&str> = line.trim().split('|').collect();
        if !(4..=5).contains(&parts.len()) {
            return Err(QueryError::MalformedBatchLine(line.trim().to_string()));
        }

        let name = parts[0].trim();
        if name.is_empty() {
            return Err(QueryError::MalformedBatchLine(line.trim().to_string()));
        }
        let span = DateSpan::parse(parts[1])?;
        let location = parse_location(parts[2])?;
        let fields = parts[3]
            .split(',')
            .map(str::parse::<FieldCode>)
            .collect::<Result<Vec<_>, _>>()?;
        let granularity = match parts.get(4) {
            Some(g) => g.parse::<Granularity>()?,
            None => Granularity::default(),
        };

        let query = Query::builder()
            .name(name)
            .location(location)
            .span(span)
            .fields(fields)
            .granularity(granularity)
            .build();
        query.validate()?;
        Ok(query)
    }
}

fn parse_location(s: &str) -> Result<LatLon, QueryError> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| QueryError::BadLocation(s.trim().to_string()))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| QueryError::BadLocation(s.trim().to_string()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| QueryError::BadLocation(s.trim().to_string()))?;
    Ok(LatLon(lat, lon))
}
