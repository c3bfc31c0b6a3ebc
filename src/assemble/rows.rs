//! Unified rows: raw per-station lines reassembled into the query's output
//! grain.
//!
//! Hourly rows for the same (date, hour) may arrive from several fetch units
//! because different fields resolved to different stations; merging is
//! strictly augmenting, a field already present is never overwritten. Daily
//! rows average each numeric field over the date's present observations.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::assemble::record::ObservationRecord;
use crate::catalog::StationId;
use crate::fields::FieldCode;
use crate::geo::LatLon;
use crate::plan::FetchUnit;
use crate::query::{Granularity, Query};
use crate::resolve::Assignment;

/// One assembled output row at the query's granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRow {
    /// The query's display name.
    pub name: String,
    /// The query's location, not the station's.
    pub location: LatLon,
    pub date: NaiveDate,
    /// Populated at hourly granularity only.
    pub hour: Option<u32>,
    /// Decoded values, keyed in canonical field order. Fields whose decode
    /// produced nothing are absent.
    pub values: BTreeMap<FieldCode, String>,
    /// Stations that contributed a value to this row, with their distance
    /// from the query location in statute miles.
    pub contributors: BTreeMap<StationId, f64>,
}

#[derive(Debug, Default)]
struct DayAccum {
    /// Per-field running (sum, count) over the day's parseable values.
    sums: BTreeMap<FieldCode, (f64, u32)>,
    contributors: BTreeMap<StationId, f64>,
}

/// Accumulates fetched archives into unified rows for one query.
pub(crate) struct RowAssembler<'a> {
    name: String,
    location: LatLon,
    granularity: Granularity,
    assignment: &'a Assignment,
    hourly: BTreeMap<(NaiveDate, u32), UnifiedRow>,
    daily: BTreeMap<NaiveDate, DayAccum>,
}

impl<'a> RowAssembler<'a> {
    pub fn new(query: &Query, assignment: &'a Assignment) -> Self {
        Self {
            name: query.name.clone(),
            location: query.location,
            granularity: query.granularity,
            assignment,
            hourly: BTreeMap::new(),
            daily: BTreeMap::new(),
        }
    }

    /// Folds one fetched archive into the rows, keeping only the dates and
    /// (date, field) pairs this unit was planned for.
    pub fn absorb(&mut self, unit: &FetchUnit, lines: &[String]) {
        let distance = self
            .assignment
            .chosen(&unit.station)
            .map(|c| c.distance_mi)
            .unwrap_or_default();

        for line in lines {
            let record = ObservationRecord::new(line);
            let Some((date, hour)) = record.timestamp() else {
                continue;
            };
            if !unit.dates.contains(&date) {
                continue;
            }

            for &field in &unit.fields {
                if self.assignment.station_for(date, field) != Some(&unit.station) {
                    continue;
                }
                let Some(value) = record.value(field) else {
                    continue;
                };
                match self.granularity {
                    Granularity::Hourly => {
                        self.record_hourly(date, hour, field, value, &unit.station, distance)
                    }
                    Granularity::Daily => {
                        self.record_daily(date, field, value, &unit.station, distance)
                    }
                }
            }
        }
    }

    fn record_hourly(
        &mut self,
        date: NaiveDate,
        hour: u32,
        field: FieldCode,
        value: String,
        station: &StationId,
        distance: f64,
    ) {
        let row = self.hourly.entry((date, hour)).or_insert_with(|| UnifiedRow {
            name: self.name.clone(),
            location: self.location,
            date,
            hour: Some(hour),
            values: BTreeMap::new(),
            contributors: BTreeMap::new(),
        });
        if row.values.contains_key(&field) {
            return;
        }
        row.values.insert(field, value);
        row.contributors.insert(station.clone(), distance);
    }

    fn record_daily(
        &mut self,
        date: NaiveDate,
        field: FieldCode,
        value: String,
        station: &StationId,
        distance: f64,
    ) {
        // Averaging is undefined for code-valued fields.
        if !field.is_numeric() {
            return;
        }
        // A window that decodes but does not parse numerically is excluded
        // from the average, not zeroed.
        let Ok(parsed) = value.parse::<f64>() else {
            return;
        };
        let accum = self.daily.entry(date).or_default();
        let (sum, count) = accum.sums.entry(field).or_insert((0.0, 0));
        *sum += parsed;
        *count += 1;
        accum.contributors.insert(station.clone(), distance);
    }

    /// All assembled rows, ordered by (date, hour).
    pub fn finish(self) -> Vec<UnifiedRow> {
        match self.granularity {
            Granularity::Hourly => self.hourly.into_values().collect(),
            Granularity::Daily => self
                .daily
                .into_iter()
                .map(|(date, accum)| UnifiedRow {
                    name: self.name.clone(),
                    location: self.location,
                    date,
                    hour: None,
                    values: accum
                        .sums
                        .into_iter()
                        .map(|(field, (sum, count))| {
                            (field, format!("{:.1}", sum / f64::from(count)))
                        })
                        .collect(),
                    contributors: accum.contributors,
                })
                .collect(),
        }
    }
}
