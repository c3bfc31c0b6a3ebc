//! The resolution result: which station serves each (date, field) pair, the
//! metadata of every chosen station, and which pairs stayed unresolved.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::catalog::{Station, StationId};
use crate::fields::FieldCode;

/// Metadata of a station the resolver picked at least once.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenStation {
    pub id: StationId,
    pub name: String,
    /// Great-circle distance from the query location, statute miles.
    pub distance_mi: f64,
}

/// One contiguous run of dates a single station served a single field, for
/// the coverage report.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSpan {
    pub query: String,
    pub field: FieldCode,
    pub station: StationId,
    pub station_name: String,
    pub distance_mi: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The (date, field) → station map for one query. Immutable once resolution
/// completes; re-derivable from the same catalog, year index and query.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    by_date_field: BTreeMap<(NaiveDate, FieldCode), StationId>,
    chosen: BTreeMap<StationId, ChosenStation>,
    unresolved: BTreeSet<(NaiveDate, FieldCode)>,
}

impl Assignment {
    pub(crate) fn assign(&mut self, date: NaiveDate, field: FieldCode, station: &Station, distance_mi: f64) {
        self.by_date_field.insert((date, field), station.id.clone());
        self.chosen.entry(station.id.clone()).or_insert_with(|| ChosenStation {
            id: station.id.clone(),
            name: station.name.clone(),
            distance_mi,
        });
    }

    pub(crate) fn mark_unresolved(&mut self, date: NaiveDate, field: FieldCode) {
        self.unresolved.insert((date, field));
    }

    /// The station assigned to a (date, field) pair, if any.
    pub fn station_for(&self, date: NaiveDate, field: FieldCode) -> Option<&StationId> {
        self.by_date_field.get(&(date, field))
    }

    /// Metadata for a chosen station.
    pub fn chosen(&self, id: &StationId) -> Option<&ChosenStation> {
        self.chosen.get(id)
    }

    /// Every station chosen at least once, in id order.
    pub fn stations(&self) -> impl Iterator<Item = &ChosenStation> {
        self.chosen.values()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (NaiveDate, FieldCode, &StationId)> {
        self.by_date_field.iter().map(|(&(d, f), id)| (d, f, id))
    }

    pub fn unresolved_len(&self) -> usize {
        self.unresolved.len()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn first_unresolved(&self) -> Option<(NaiveDate, FieldCode)> {
        self.unresolved.iter().next().copied()
    }

    /// Collapses the per-date map into contiguous (field, station) date runs.
    pub fn coverage_spans(&self, query_name: &str) -> Vec<CoverageSpan> {
        let mut by_field: BTreeMap<FieldCode, Vec<(NaiveDate, &StationId)>> = BTreeMap::new();
        for (date, field, id) in self.entries() {
            by_field.entry(field).or_default().push((date, id));
        }

        let mut spans = Vec::new();
        for (field, dated) in by_field {
            // Entries arrive date-sorted from the BTreeMap.
            let mut run: Option<(NaiveDate, NaiveDate, &StationId)> = None;
            for (date, id) in dated {
                run = match run {
                    Some((start, end, run_id))
                        if run_id == id && end.succ_opt() == Some(date) =>
                    {
                        Some((start, date, run_id))
                    }
                    Some((start, end, run_id)) => {
                        spans.push(self.span_for(query_name, field, run_id, start, end));
                        Some((date, date, id))
                    }
                    None => Some((date, date, id)),
                };
            }
            if let Some((start, end, run_id)) = run {
                spans.push(self.span_for(query_name, field, run_id, start, end));
            }
        }
        spans
    }

    fn span_for(
        &self,
        query_name: &str,
        field: FieldCode,
        id: &StationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoverageSpan {
        let (station_name, distance_mi) = self
            .chosen
            .get(id)
            .map(|c| (c.name.clone(), c.distance_mi))
            .unwrap_or_default();
        CoverageSpan {
            query: query_name.to_string(),
            field,
            station: id.clone(),
            station_name,
            distance_mi,
            start,
            end,
        }
    }
}
