//! Fetch planning: collapsing an assignment into the minimal set of
//! station-year pulls.
//!
//! The raw-line source prices a fetch per (station, year) no matter how many
//! dates or fields are drawn from it, so every (date, field) entry sharing a
//! station and year folds into one unit.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::catalog::StationId;
use crate::fields::FieldCode;
use crate::resolve::Assignment;

/// One (station, year) raw-data pull: the exact dates needed from it and
/// every field the query draws from this station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchUnit {
    pub station: StationId,
    pub year: i32,
    pub dates: BTreeSet<NaiveDate>,
    pub fields: BTreeSet<FieldCode>,
}

/// Groups an assignment into fetch units, sorted by (station, year).
pub fn build_fetch_plan(assignment: &Assignment) -> Vec<FetchUnit> {
    // A station's field list spans the whole query, not just one year.
    let mut station_fields: BTreeMap<&StationId, BTreeSet<FieldCode>> = BTreeMap::new();
    for (_, field, id) in assignment.entries() {
        station_fields.entry(id).or_default().insert(field);
    }

    let mut units: BTreeMap<(StationId, i32), FetchUnit> = BTreeMap::new();
    for (date, _, id) in assignment.entries() {
        let key = (id.clone(), date.year());
        units
            .entry(key)
            .or_insert_with(|| FetchUnit {
                station: id.clone(),
                year: date.year(),
                dates: BTreeSet::new(),
                fields: station_fields.get(id).cloned().unwrap_or_default(),
            })
            .dates
            .insert(date);
    }
    units.into_values().collect()
}
